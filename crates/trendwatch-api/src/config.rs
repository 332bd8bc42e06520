//! API 서버 설정.
//!
//! # 환경변수
//!
//! - `API_HOST`: 바인딩 호스트 (기본값: `127.0.0.1`)
//! - `API_PORT`: 바인딩 포트 (기본값: `7000`)
//! - `CLIENT_URL`: 허용할 프론트엔드 origin (포트 제외, 예: `http://localhost`)
//! - `API_REQUEST_TIMEOUT_SECS`: 요청 타임아웃 (기본값: 30)
//! - 데이터베이스: [`DatabaseConfig`] 참고

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use trendwatch_core::DatabaseConfig;

/// API 연결 식별자 기본값 (`DATABASE_CONN_ID` 미설정 시).
pub const DEFAULT_CONN_ID: &str = "trendwatch_api";

/// `CLIENT_URL` 미설정 시 허용 origin.
pub const DEFAULT_CLIENT_URL: &str = "http://localhost";

/// 설정 로드 에러.
#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("데이터베이스 설정 로드 실패: {0}")]
    Database(#[from] config::ConfigError),

    #[error("소켓 주소가 유효하지 않습니다 ({addr}): {source}")]
    InvalidAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// 서버 설정.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// CORS 허용 origin (임의 포트 허용)
    pub client_url: String,
    /// 요청 타임아웃
    pub request_timeout: Duration,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7000,
            client_url: DEFAULT_CLIENT_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            database: DatabaseConfig::default().with_connection_id(DEFAULT_CONN_ID),
        }
    }
}

impl ApiConfig {
    /// 환경 변수에서 설정 로드.
    pub fn from_env() -> Result<Self, ApiConfigError> {
        let mut database = DatabaseConfig::from_env()?;
        if database.connection_id.is_none() {
            database = database.with_connection_id(DEFAULT_CONN_ID);
        }

        let client_url = match std::env::var("CLIENT_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => {
                tracing::warn!(
                    default = DEFAULT_CLIENT_URL,
                    "CLIENT_URL not set, using default origin"
                );
                DEFAULT_CLIENT_URL.to_string()
            }
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7000),
            client_url,
            request_timeout: Duration::from_secs(
                std::env::var("API_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            database,
        })
    }

    /// 소켓 주소 반환.
    pub fn socket_addr(&self) -> Result<SocketAddr, ApiConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|source| ApiConfigError::InvalidAddr { addr, source })
    }
}
