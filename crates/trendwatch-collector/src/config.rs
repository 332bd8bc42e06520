//! 환경변수 기반 설정 모듈.

use std::path::PathBuf;
use std::time::Duration;

use trendwatch_core::{DatabaseConfig, PipelineError, PipelineResult, RetryPolicy, DEFAULT_WINDOW_DAYS};
use trendwatch_data::{GoogleTrendsConfig, HttpSettings, MIN_PROXY_BACKOFF};

/// 수집기 연결 식별자 기본값 (`DATABASE_CONN_ID` 미설정 시).
pub const DEFAULT_CONN_ID: &str = "trendwatch_collector";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 주가 플로우 설정
    pub stock: StockFlowConfig,
    /// 키워드 트렌드 플로우 설정
    pub trends: TrendFlowConfig,
    /// 프록시 설정
    pub proxy: ProxyConfig,
    /// 외부 API 타임아웃
    pub http: HttpSettings,
    /// 작업 단위 재시도 정책
    pub retry: RetryPolicy,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 주가 플로우 설정
#[derive(Debug, Clone)]
pub struct StockFlowConfig {
    /// 티커 (예: "PHN.MI")
    pub ticker: String,
    /// 조회 기간 (예: "1d", "30d", "2y")
    pub period: String,
}

/// 키워드 트렌드 플로우 설정
#[derive(Debug, Clone)]
pub struct TrendFlowConfig {
    /// 조회 키워드
    pub keywords: Vec<String>,
    /// 지역 코드
    pub geo: String,
    /// 인터페이스 언어
    pub hl: String,
    /// 분 단위 시간대 오프셋
    pub tz: i32,
    /// 한 번에 조회할 최대 일수
    pub window_days: u32,
    /// 정기 실행 시 오늘로부터 거슬러 올라갈 일수
    pub lookback_days: u32,
}

/// 프록시 설정
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// 프록시 목록 파일 (없으면 직접 연결)
    pub file: Option<PathBuf>,
    /// 프록시 사이 대기 (밀리초)
    pub backoff_ms: u64,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    ///
    /// `.env` 로드는 호출하는 바이너리가 담당합니다.
    pub fn from_env() -> PipelineResult<Self> {
        let mut database = DatabaseConfig::from_env()
            .map_err(|e| PipelineError::Config(format!("데이터베이스 설정 로드 실패: {e}")))?;
        if database.connection_id.is_none() {
            database = database.with_connection_id(DEFAULT_CONN_ID);
        }

        let config = Self {
            database,
            stock: StockFlowConfig {
                ticker: env_var_string("STOCK_TICKER", "PHN.MI"),
                period: env_var_string("STOCK_PERIOD", "1d"),
            },
            trends: TrendFlowConfig {
                keywords: parse_keywords(&env_var_string(
                    "TREND_KEYWORDS",
                    "cetilar,ultramag,sideral,apportal",
                )),
                geo: env_var_string("TREND_GEO", "IT"),
                hl: env_var_string("TREND_HL", "it-IT"),
                tz: env_var_parse("TREND_TZ", 120),
                window_days: env_var_parse("TREND_WINDOW_DAYS", DEFAULT_WINDOW_DAYS),
                lookback_days: env_var_parse("TREND_LOOKBACK_DAYS", 1),
            },
            proxy: ProxyConfig {
                file: std::env::var("PROXY_FILE")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
                backoff_ms: env_var_parse("PROXY_BACKOFF_MS", 1_000),
            },
            http: HttpSettings::new(
                Duration::from_secs(env_var_parse("HTTP_CONNECT_TIMEOUT_SECS", 15)),
                Duration::from_secs(env_var_parse("HTTP_READ_TIMEOUT_SECS", 30)),
            ),
            retry: RetryPolicy::new(
                env_var_parse("FLOW_MAX_RETRIES", 3),
                Duration::from_secs(env_var_parse("FLOW_RETRY_DELAY_SECS", 300)),
            ),
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 360),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> PipelineResult<()> {
        if self.stock.ticker.trim().is_empty() {
            return Err(PipelineError::Config("STOCK_TICKER가 비어 있습니다".to_string()));
        }
        if self.trends.keywords.is_empty() {
            return Err(PipelineError::Config("TREND_KEYWORDS가 비어 있습니다".to_string()));
        }
        if self.trends.window_days == 0 {
            return Err(PipelineError::Config(
                "TREND_WINDOW_DAYS는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.daemon.interval_minutes == 0 {
            return Err(PipelineError::Config(
                "DAEMON_INTERVAL_MINUTES는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl TrendFlowConfig {
    /// Google Trends 요청 파라미터
    pub fn google_trends(&self) -> GoogleTrendsConfig {
        GoogleTrendsConfig {
            hl: self.hl.clone(),
            tz: self.tz,
            geo: self.geo.clone(),
            ..Default::default()
        }
    }
}

impl ProxyConfig {
    /// 프록시 사이 대기 시간 (최소 1초)
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms).max(MIN_PROXY_BACKOFF)
    }
}

impl DaemonConfig {
    /// 플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 쉼표로 구분된 키워드 목록 파싱 (공백 제거, 빈 항목 무시)
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수 문자열 (비어 있으면 기본값)
fn env_var_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
