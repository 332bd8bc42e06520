//! # Trendwatch Core
//!
//! 주가 및 키워드 검색 트렌드 파이프라인의 핵심 도메인 모델과 순수 알고리즘을 제공합니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 날짜 구간 분할 (외부 API 최대 조회 기간 대응)
//! - 주가/트렌드 레코드 및 wide 테이블 타입
//! - wide → long 형태 변환 (정규화)
//! - 순서가 있는 리소스 풀에 대한 재시도 정책
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod retry;

pub use config::DatabaseConfig;
pub use domain::*;
pub use error::{PipelineError, PipelineResult, Stage};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
pub use normalize::{normalize_column_name, normalize_stock_table, reshape_wide_to_long};
pub use retry::{try_in_order, PoolExhausted, RetryPolicy};

#[doc(hidden)]
pub use tracing;
