//! PostgreSQL 연결 관리.

use sqlx::PgPool;
use tracing::info;
use trendwatch_core::{DatabaseConfig, PipelineError, PipelineResult};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 설정으로 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> PipelineResult<Self> {
        info!(
            target_db = %config.display_target(),
            connection_id = config.connection_id.as_deref().unwrap_or("-"),
            max_connections = config.max_connections,
            "데이터베이스 연결 중"
        );

        let pool = config.connect().await.map_err(|e| {
            PipelineError::StoreWriteFailure(format!("데이터베이스 연결 실패: {e}"))
        })?;

        info!("데이터베이스 연결 완료");
        Ok(Self { pool })
    }

    /// 기존 풀 재사용.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `migrations/` 스키마 적용.
    pub async fn migrate(&self) -> PipelineResult<()> {
        info!("마이그레이션 실행 중");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PipelineError::StoreWriteFailure(format!("마이그레이션 실패: {e}")))?;

        info!("마이그레이션 완료");
        Ok(())
    }

    /// `SELECT 1` 상태 확인.
    pub async fn health_check(&self) -> PipelineResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// 풀 종료 (대기 중인 연결 반납 후).
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
