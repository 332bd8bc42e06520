//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/stock` - 기간별 주가 (열 단위)
//! - `/stock/stat` - 최신 주가와 전일 대비 변동률
//! - `/keyword` - 기간별 키워드 검색량 (키워드별 열 단위)
//! - `/keyword/stat` - 키워드별 최신 검색량과 직전 값

pub mod health;
pub mod keyword;
pub mod stock;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use keyword::{keyword_router, KeywordSeries, KeywordStat};
pub use stock::{stock_router, StockSeries, StockStat};

use axum::Router;
use chrono::{Months, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

/// 기간 조회 파라미터 (`?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRangeQuery {
    /// 생략된 값을 채운 `(start, end)`.
    ///
    /// 기본값은 `[today - 1년, today]`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = self.start_date.unwrap_or_else(|| {
            today
                .checked_sub_months(Months::new(12))
                .unwrap_or(NaiveDate::MIN)
        });
        (start, self.end_date.unwrap_or(today))
    }
}

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/stock", stock_router())
        .nest("/keyword", keyword_router())
}
