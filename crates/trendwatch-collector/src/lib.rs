//! 주가 및 키워드 검색 트렌드 수집기.
//!
//! 이 crate는 API 서버와 독립적으로 실행되는 ETL 바이너리를 제공합니다:
//! - 주가 플로우: Yahoo Finance 일봉 → `stock_trend`
//! - 키워드 플로우: Google Trends 일별 관심도 → `kw_trend`
//! - 작업 단위 재시도와 데몬 모드 스케줄링

pub mod config;
pub mod flow;
pub mod pipeline;
pub mod scheduler;
pub mod stats;

pub use config::CollectorConfig;
pub use flow::{FlowJob, FlowKind, FlowRun, FlowState};
pub use pipeline::{Pipeline, PipelineSettings};
pub use stats::{FlowReport, ScheduleSummary};
