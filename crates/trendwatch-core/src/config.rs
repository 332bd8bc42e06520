//! 데이터베이스 설정.
//!
//! API 서버와 수집기가 같은 설정을 공유합니다.
//!
//! # 환경변수
//!
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`
//! - `DB_MAX_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT_SECS`
//! - `DATABASE_URL`: 설정 시 개별 항목보다 우선
//! - `DATABASE_CONN_ID`: 연결 식별자 (PostgreSQL `application_name`으로 전달)

use serde::Deserialize;

/// 데이터베이스 연결 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 호스트
    #[serde(default = "default_host")]
    pub host: String,
    /// 포트
    #[serde(default = "default_port")]
    pub port: u16,
    /// 사용자
    #[serde(default = "default_user")]
    pub user: String,
    /// 비밀번호
    #[serde(default)]
    pub password: String,
    /// 데이터베이스 이름
    #[serde(default = "default_name")]
    pub name: String,
    /// 풀의 최대 연결 수
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// 전체 연결 URL (개별 항목보다 우선)
    #[serde(skip)]
    pub url: Option<String>,
    /// 연결 식별자
    #[serde(skip)]
    pub connection_id: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5432
}
fn default_user() -> String {
    "postgres".to_string()
}
fn default_name() -> String {
    "trendwatch".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_acquire_timeout() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            name: default_name(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            url: None,
            connection_id: None,
        }
    }
}

impl DatabaseConfig {
    /// 환경변수에서 설정 로드.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut cfg: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("DB"))
            .build()?
            .try_deserialize()?;

        cfg.url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        cfg.connection_id = std::env::var("DATABASE_CONN_ID")
            .ok()
            .filter(|s| !s.is_empty());
        Ok(cfg)
    }

    /// 연결 식별자 지정.
    #[must_use]
    pub fn with_connection_id(mut self, id: impl Into<String>) -> Self {
        self.connection_id = Some(id.into());
        self
    }

    /// 연결 URL.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }

    /// 로그 출력용 연결 대상 (비밀번호 제외).
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name),
        }
    }

    /// sqlx 연결 옵션.
    #[cfg(feature = "sqlx-support")]
    pub fn connect_options(&self) -> Result<sqlx::postgres::PgConnectOptions, sqlx::Error> {
        use sqlx::postgres::PgConnectOptions;

        let options = match &self.url {
            Some(url) => url.parse::<PgConnectOptions>()?,
            None => PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.name),
        };

        Ok(match &self.connection_id {
            Some(id) => options.application_name(id),
            None => options,
        })
    }

    /// 연결 풀 생성.
    #[cfg(feature = "sqlx-support")]
    pub async fn connect(&self) -> Result<sqlx::PgPool, sqlx::Error> {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(self.acquire_timeout_secs))
            .connect_with(self.connect_options()?)
            .await
    }
}
