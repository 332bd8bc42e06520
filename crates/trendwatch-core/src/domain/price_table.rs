//! 주가 제공자가 반환하는 원본 테이블.
//!
//! 열 이름은 제공자 표기 그대로(`Open`, `Stock Splits` 등) 유지되며,
//! 정규화 단계에서 저장 스키마의 열 이름으로 매핑됩니다.

use chrono::{DateTime, FixedOffset};

use crate::error::{PipelineError, PipelineResult};

/// 타임스탬프 하나에 대한 원본 행.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceRow {
    /// 제공자 타임스탬프 (시간대 포함)
    pub timestamp: DateTime<FixedOffset>,
    /// 열 순서와 같은 순서의 값
    pub values: Vec<f64>,
}

/// 원본 주가 테이블.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceTable {
    columns: Vec<String>,
    rows: Vec<RawPriceRow>,
}

impl RawPriceTable {
    pub fn new(columns: Vec<String>, rows: Vec<RawPriceRow>) -> PipelineResult<Self> {
        if let Some(bad) = rows.iter().find(|r| r.values.len() != columns.len()) {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} 행의 값 개수({})가 열 개수({})와 다릅니다",
                bad.timestamp,
                bad.values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawPriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
