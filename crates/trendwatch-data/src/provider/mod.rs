//! 외부 데이터 소스.
//!
//! ## 주가
//! - `YahooPriceSource`: Yahoo Finance 차트 API, 티커 하나의 기간별 일봉
//!
//! ## 검색 트렌드
//! - `GoogleTrendsClient`: Google Trends 일 단위 관심도 (최대 90일 구간)
//!
//! ## 프록시
//! - `ProxyPool`: 프록시 목록 파일 로더
//! - `HttpSettings`: 엔드포인트별 HTTP 클라이언트 생성

pub mod google_trends;
pub mod proxy;
pub mod yahoo;

use async_trait::async_trait;
use trendwatch_core::{DateInterval, PipelineResult, ProxyEndpoint, RawPriceTable, WideTrendTable};

pub use google_trends::{GoogleTrendsClient, GoogleTrendsConfig};
pub use proxy::{HttpSettings, ProxyPool};
pub use yahoo::YahooPriceSource;

/// 주가 이력 소스.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// 소스 이름 (로그/에러 표기용).
    fn name(&self) -> &str;

    /// `ticker`의 `period`(예: "1d", "30d", "2y") 일봉 이력 조회.
    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        proxy: &ProxyEndpoint,
    ) -> PipelineResult<RawPriceTable>;
}

/// 키워드 검색 트렌드 소스.
///
/// 한 번의 호출은 하나의 구간만 조회하며, 구간 길이 제한은 호출자가 지킵니다.
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// 소스 이름 (로그/에러 표기용).
    fn name(&self) -> &str;

    /// `interval` 동안 `keywords`의 일별 관심도를 wide 테이블로 조회.
    async fn fetch_interval(
        &self,
        keywords: &[String],
        interval: &DateInterval,
        proxy: &ProxyEndpoint,
    ) -> PipelineResult<WideTrendTable>;
}
