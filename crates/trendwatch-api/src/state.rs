//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 연결 풀은 시작 시 한 번 만들어 주입하며, 각 요청은 필요한 동안만
//! 풀에서 연결을 빌려 씁니다.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀
    pub db_pool: PgPool,
    /// API 버전
    pub version: String,
    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// `SELECT 1`로 데이터베이스 연결 확인.
    pub async fn is_db_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

/// 연결되지 않는 풀을 가진 테스트용 상태.
///
/// 쿼리는 짧은 타임아웃 뒤 실패하므로 에러 경로 검증에 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("trendwatch")
        .database("trendwatch_test");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy_with(options);

    AppState::new(pool)
}
