//! 저장소에 적재되는 long-form 레코드.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 일별 주가 레코드. 자연키는 `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량
    pub volume: i64,
    /// 배당금
    pub dividends: f64,
    /// 주식 분할 비율 (없으면 0)
    pub stock_splits: f64,
}

/// 일별 키워드 검색량 레코드. 자연키는 `(date, keyword)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    /// 날짜
    pub date: NaiveDate,
    /// 정규화된 키워드
    pub keyword: String,
    /// 제공자 기준 0~100 정규화 검색량
    pub daily_search_amount: i32,
    /// 해당 날짜의 데이터가 아직 확정되지 않았는지 여부
    pub is_partial: bool,
}

impl TrendRecord {
    /// 자연키 `(date, keyword)`.
    pub fn key(&self) -> (NaiveDate, &str) {
        (self.date, self.keyword.as_str())
    }
}
