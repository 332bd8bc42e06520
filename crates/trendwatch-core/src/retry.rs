//! 재시도 정책.
//!
//! - [`try_in_order`]: 순서가 있는 리소스 풀(프록시 목록 등)을 앞에서부터 하나씩 시도
//! - [`RetryPolicy`]: 실행 단위(작업 레벨) 재시도 횟수와 지연

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// 풀의 모든 리소스가 실패함.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolExhausted {
    /// 시도한 리소스 수
    pub attempts: usize,
    /// 마지막 시도의 에러 메시지 (풀이 비어 있으면 `None`)
    pub last_error: Option<String>,
}

/// `resources`를 순서대로 하나씩 `attempt`에 넘겨 처음 성공한 결과를 반환합니다.
///
/// 실패할 때마다 경고 로그를 남기고, 다음 시도 전에 `backoff`만큼 대기합니다.
/// 구체적인 리소스 표현(프록시 URL 등)과 무관한 순수 정책입니다.
pub async fn try_in_order<R, T, E, F, Fut>(
    resources: &[R],
    backoff: Duration,
    mut attempt: F,
) -> Result<T, PoolExhausted>
where
    R: Clone + Display,
    E: Display,
    F: FnMut(R) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for (idx, resource) in resources.iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(backoff).await;
        }

        match attempt(resource.clone()).await {
            Ok(value) => {
                debug!(resource = %resource, attempt = idx + 1, "시도 성공");
                return Ok(value);
            }
            Err(e) => {
                warn!(
                    resource = %resource,
                    attempt = idx + 1,
                    remaining = resources.len() - idx - 1,
                    error = %e,
                    "시도 실패, 다음 리소스로 재시도"
                );
                last_error = Some(e.to_string());
            }
        }
    }

    Err(PoolExhausted {
        attempts: resources.len(),
        last_error,
    })
}

/// 실행 단위 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도 이후 최대 재시도 횟수
    pub max_retries: u32,
    /// 재시도 사이 고정 지연
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5 * 60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// 재시도 없이 한 번만 실행.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// 첫 시도를 포함한 최대 시도 횟수.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}
