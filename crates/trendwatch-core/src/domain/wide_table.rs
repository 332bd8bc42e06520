//! Wide 형태 트렌드 테이블.
//!
//! 행 = 날짜, 열 = 요청한 키워드 + 마지막 `isPartial` 플래그 열.
//! 제공자는 데이터가 없는 기간에도 0을 채워 반환하므로 빈 셀은 존재하지 않습니다.

use chrono::NaiveDate;

use crate::error::{PipelineError, PipelineResult};

/// 부분 데이터 플래그 열 이름.
pub const PARTIAL_COLUMN: &str = "isPartial";

/// 날짜 하나에 대한 wide 행.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTrendRow {
    pub date: NaiveDate,
    /// 키워드 열 순서와 동일한 순서의 검색량
    pub values: Vec<i32>,
    /// 날짜 단위 부분 데이터 여부
    pub is_partial: bool,
}

/// 키워드별 열을 가진 wide 테이블.
///
/// 생성 시점에 형태 불변식(행마다 키워드 수만큼 값, 날짜 오름차순, 중복 없음)을 검증합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTrendTable {
    keywords: Vec<String>,
    rows: Vec<WideTrendRow>,
}

impl WideTrendTable {
    pub fn new(keywords: Vec<String>, rows: Vec<WideTrendRow>) -> PipelineResult<Self> {
        let mut table = Self::empty(keywords);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn empty(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            rows: Vec::new(),
        }
    }

    fn push_row(&mut self, row: WideTrendRow) -> PipelineResult<()> {
        if row.values.len() != self.keywords.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} 행의 값 개수({})가 키워드 수({})와 다릅니다",
                row.date,
                row.values.len(),
                self.keywords.len()
            )));
        }
        if let Some(last) = self.rows.last() {
            if row.date <= last.date {
                return Err(PipelineError::ShapeMismatch(format!(
                    "날짜가 증가하지 않습니다: {} 다음에 {}",
                    last.date, row.date
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// 다른 구간의 결과를 날짜 축으로 이어 붙입니다.
    ///
    /// 키워드 열이 같아야 하며, 붙일 테이블의 모든 날짜는 현재 마지막 날짜 이후여야 합니다.
    pub fn append(&mut self, other: WideTrendTable) -> PipelineResult<()> {
        if other.keywords != self.keywords {
            return Err(PipelineError::ShapeMismatch(format!(
                "키워드 열 불일치: {:?} vs {:?}",
                self.keywords, other.keywords
            )));
        }
        for row in other.rows {
            self.push_row(row)?;
        }
        Ok(())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn rows(&self) -> &[WideTrendRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 키워드 열 + 부분 데이터 플래그 열.
    pub fn column_count(&self) -> usize {
        self.keywords.len() + 1
    }

    /// 열 이름 목록 (마지막은 항상 `isPartial`).
    pub fn column_labels(&self) -> Vec<String> {
        self.keywords
            .iter()
            .cloned()
            .chain(std::iter::once(PARTIAL_COLUMN.to_string()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
