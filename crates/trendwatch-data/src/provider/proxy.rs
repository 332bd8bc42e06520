//! 프록시 풀 및 HTTP 클라이언트 설정.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use trendwatch_core::{PipelineError, PipelineResult, ProxyEndpoint};

/// 순서가 있는 프록시 엔드포인트 목록.
///
/// 읽기 전용이며 실행마다 앞에서부터 순서대로 소비됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
}

impl ProxyPool {
    /// 직접 연결 하나만 가진 풀.
    pub fn direct() -> Self {
        Self {
            endpoints: vec![ProxyEndpoint::Direct],
        }
    }

    /// 프록시 목록 텍스트 파싱 (한 줄에 `host:port` 하나).
    pub fn from_lines(content: &str) -> Self {
        Self {
            endpoints: content.lines().filter_map(ProxyEndpoint::parse_line).collect(),
        }
    }

    /// 프록시 목록 파일 로드.
    pub async fn from_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::Config(format!("프록시 파일 읽기 실패 ({}): {e}", path.display()))
        })?;

        let pool = Self::from_lines(&content);
        if pool.is_empty() {
            warn!(path = %path.display(), "프록시 파일이 비어 있습니다");
        } else {
            info!(path = %path.display(), count = pool.len(), "프록시 목록 로드");
        }
        Ok(pool)
    }

    /// 파일 경로가 있으면 파일에서, 없으면 직접 연결 풀.
    pub async fn load(path: Option<&Path>) -> PipelineResult<Self> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => Ok(Self::direct()),
        }
    }

    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// 외부 API 호출용 HTTP 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// 연결 타임아웃
    pub connect_timeout: Duration,
    /// 요청 전체 타임아웃
    pub read_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpSettings {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    /// `proxy`를 경유하는 reqwest 프록시 설정 (직접 연결이면 `None`).
    pub fn reqwest_proxy(proxy: &ProxyEndpoint) -> PipelineResult<Option<reqwest::Proxy>> {
        proxy
            .url()
            .map(|url| {
                reqwest::Proxy::all(url)
                    .map_err(|e| PipelineError::Config(format!("잘못된 프록시 URL ({url}): {e}")))
            })
            .transpose()
    }

    /// `proxy`를 경유하는 HTTP 클라이언트 생성.
    ///
    /// 쿠키 저장소를 켜서 같은 클라이언트로 이어지는 요청이 세션 쿠키를 공유합니다.
    pub fn client_for(&self, proxy: &ProxyEndpoint) -> PipelineResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.read_timeout)
            .cookie_store(true);

        builder = match Self::reqwest_proxy(proxy)? {
            Some(p) => builder.proxy(p),
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| PipelineError::Config(format!("HTTP 클라이언트 생성 실패: {e}")))
    }
}
