//! 주가 조회 endpoint.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::DateRangeQuery;
use crate::error::{invalid_query, not_found, query_failed, ApiResult};
use crate::repository::{StockPriceRow, StockStatRow, StockTrendRepository};
use crate::state::AppState;

/// 열 단위 주가 응답.
///
/// 모든 배열은 같은 길이이며 같은 인덱스가 같은 거래일입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSeries {
    pub stock_date: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl StockSeries {
    pub fn from_rows(rows: Vec<StockPriceRow>) -> Self {
        let mut series = Self::default();
        for row in rows {
            series.stock_date.push(row.stock_date);
            series.open.push(row.open);
            series.high.push(row.high);
            series.low.push(row.low);
            series.close.push(row.close);
        }
        series
    }
}

/// 최신 주가와 전일 대비 변동률(%, 소수점 2자리).
///
/// 직전 값이 없거나 0이면 변동률은 `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockStat {
    pub stock_date: NaiveDate,
    pub open: f64,
    pub open_percentage: Option<f64>,
    pub close: f64,
    pub close_percentage: Option<f64>,
    pub low: f64,
    pub low_percentage: Option<f64>,
    pub high: f64,
    pub high_percentage: Option<f64>,
}

impl From<StockStatRow> for StockStat {
    fn from(row: StockStatRow) -> Self {
        Self {
            stock_date: row.stock_date,
            open: round2(row.open),
            open_percentage: percentage_change(row.open, row.previous_open),
            close: round2(row.close),
            close_percentage: percentage_change(row.close, row.previous_close),
            low: round2(row.low),
            low_percentage: percentage_change(row.low, row.previous_low),
            high: round2(row.high),
            high_percentage: percentage_change(row.high, row.previous_high),
        }
    }
}

/// `(current - previous) / previous * 100`, 소수점 2자리 반올림.
pub fn percentage_change(current: f64, previous: Option<f64>) -> Option<f64> {
    previous
        .filter(|p| *p != 0.0)
        .map(|p| round2((current - p) / p * 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 기간별 주가 조회.
///
/// GET /stock?start_date=&end_date=
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ApiResult<Json<StockSeries>> {
    let Query(query) = query.map_err(invalid_query)?;
    let (start, end) = query.resolve(Utc::now().date_naive());
    let rows = StockTrendRepository::find_range(&state.db_pool, start, end)
        .await
        .map_err(query_failed)?;

    Ok(Json(StockSeries::from_rows(rows)))
}

/// 최신 주가 통계 조회.
///
/// GET /stock/stat
pub async fn get_stock_stat(State(state): State<Arc<AppState>>) -> ApiResult<Json<StockStat>> {
    let row = StockTrendRepository::latest_with_previous(&state.db_pool)
        .await
        .map_err(query_failed)?
        .ok_or_else(|| not_found("저장된 주가 데이터가 없습니다"))?;

    Ok(Json(row.into()))
}

/// 주가 라우터 생성.
pub fn stock_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_stock))
        .route("/stat", get(get_stock_stat))
}
