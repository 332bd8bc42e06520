//! Repository pattern for database operations.
//!
//! 조회 SQL을 라우트 핸들러에서 분리합니다.
//! 모든 Repository는 static methods 패턴을 사용합니다.

pub mod kw_trend;
pub mod stock_trend;

pub use kw_trend::{KeywordStatRow, KeywordTrendRepository, KeywordTrendRow};
pub use stock_trend::{StockPriceRow, StockStatRow, StockTrendRepository};
