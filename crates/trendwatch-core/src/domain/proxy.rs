//! 프록시 엔드포인트.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 외부 API 호출 시 사용할 네트워크 경로.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProxyEndpoint {
    /// 프록시 없이 직접 연결
    Direct,
    /// HTTP(S) 프록시 URL (예: `https://10.0.0.1:8080`)
    Http(String),
}

impl ProxyEndpoint {
    /// 프록시 목록 파일의 한 줄을 엔드포인트로 변환합니다.
    ///
    /// 스킴이 없으면 `https://`를 붙입니다. 빈 줄은 `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        if trimmed.contains("://") {
            Some(Self::Http(trimmed.to_string()))
        } else {
            Some(Self::Http(format!("https://{trimmed}")))
        }
    }

    /// 프록시 URL (직접 연결이면 `None`).
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Direct => None,
            Self::Http(url) => Some(url),
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Http(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_adds_scheme() {
        assert_eq!(
            ProxyEndpoint::parse_line("10.0.0.1:8080"),
            Some(ProxyEndpoint::Http("https://10.0.0.1:8080".to_string()))
        );
        assert_eq!(
            ProxyEndpoint::parse_line(" http://proxy.local:3128 "),
            Some(ProxyEndpoint::Http("http://proxy.local:3128".to_string()))
        );
    }

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert_eq!(ProxyEndpoint::parse_line(""), None);
        assert_eq!(ProxyEndpoint::parse_line("   "), None);
        assert_eq!(ProxyEndpoint::parse_line("# office proxy"), None);
    }
}
