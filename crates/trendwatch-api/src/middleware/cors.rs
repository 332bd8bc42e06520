//! CORS 설정.
//!
//! 설정된 origin(`CLIENT_URL`)에 임의의 포트가 붙은 요청만 허용합니다.
//! 예: `CLIENT_URL=http://localhost` → `http://localhost:5173` 허용.
//! 자격 증명을 허용하므로 메서드/헤더는 와일드카드 대신 요청 값을 그대로 돌려줍니다.

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// `origin`이 `client_url` + `:<port>` 형태인지 확인.
pub fn origin_allowed(client_url: &str, origin: &str) -> bool {
    origin
        .strip_prefix(client_url)
        .and_then(|rest| rest.strip_prefix(':'))
        .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
}

/// CORS 미들웨어 구성.
pub fn cors_layer(client_url: &str) -> CorsLayer {
    let client_url = client_url.to_string();
    tracing::info!(origin = %client_url, "CORS configured (any port)");

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| origin_allowed(&client_url, origin))
            },
        ))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
