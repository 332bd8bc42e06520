//! 수집된 주가/키워드 트렌드 조회 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 읽기 전용 REST API (`/stock`, `/keyword` 및 각 `/stat`)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`config`]: 서버 설정 (환경 변수)
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`repository`]: SQL 조회
//! - [`routes`]: REST API 엔드포인트 및 응답 변환
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어 (메트릭, CORS)

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::{cors_layer, metrics_layer};
pub use routes::create_api_router;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
