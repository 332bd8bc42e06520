//! 외부 데이터 소스와 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - Yahoo Finance 주가 소스, Google Trends 트렌드 소스
//! - 프록시 풀 로더와 엔드포인트별 HTTP 클라이언트
//! - 프록시 순환 재시도를 포함한 추출 단계
//! - PostgreSQL idempotent upsert 저장소 및 메모리 저장소

pub mod extractor;
pub mod provider;
pub mod storage;

pub use extractor::{extract_keyword_trends, extract_stock_history, MIN_PROXY_BACKOFF};
pub use provider::{
    GoogleTrendsClient, GoogleTrendsConfig, HttpSettings, PriceSource, ProxyPool, TrendSource,
    YahooPriceSource,
};
pub use storage::{Database, MemoryTrendStore, PgTrendStore, TrendStore};
