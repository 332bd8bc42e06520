//! 저장소.
//!
//! - `postgres`: 연결 풀, 마이그레이션, 상태 확인
//! - `loader`: 자연키 기반 idempotent upsert
//! - `memory`: 메모리 저장소 (dry-run, 테스트)

pub mod loader;
pub mod memory;
pub mod postgres;

pub use loader::{upsert_statement, PgTrendStore, TableSpec, TrendStore, UpsertRow, KW_TREND, STOCK_TREND};
pub use memory::MemoryTrendStore;
pub use postgres::Database;
