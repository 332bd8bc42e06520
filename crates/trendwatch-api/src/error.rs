//! API 에러 응답 타입.
//!
//! 모든 엔드포인트에서 같은 JSON 형식으로 에러를 반환합니다.
//!
//! | 상황 | 상태 코드 | code |
//! |---|---|---|
//! | 쿼리 파라미터 형식 오류 | 400 | `INVALID_QUERY` |
//! | SQL 실행 실패 | 400 | `QUERY_FAILED` |
//! | 통계 대상 행 없음 | 404 | `NOT_FOUND` |
//! | 조회 결과 형태 불일치 | 500 | `SHAPE_MISMATCH` |

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "QUERY_FAILED",
///   "message": "relation \"stock_trend\" does not exist",
///   "timestamp": 1756800000
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "QUERY_FAILED", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 쿼리 문자열 파싱 실패 → 400.
///
/// axum 기본 거부 응답(평문) 대신 공통 JSON 형식으로 감쌉니다.
pub fn invalid_query(rejection: QueryRejection) -> (StatusCode, Json<ApiErrorResponse>) {
    let message = rejection.body_text();
    tracing::debug!(error = %message, "invalid query string");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("INVALID_QUERY", message)),
    )
}

/// SQL 실행 실패 → 400.
///
/// 데이터베이스가 보낸 에러 메시지를 그대로 전달합니다.
pub fn query_failed(err: sqlx::Error) -> (StatusCode, Json<ApiErrorResponse>) {
    let message = match &err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    };
    tracing::warn!(error = %message, "query failed");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("QUERY_FAILED", message)),
    )
}

/// 조회 대상 없음 → 404.
pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse::new("NOT_FOUND", message)),
    )
}

/// 조회 결과 형태 불일치 → 500.
pub fn shape_mismatch(
    message: impl Into<String>,
    details: Value,
) -> (StatusCode, Json<ApiErrorResponse>) {
    let body = ApiErrorResponse::with_details("SHAPE_MISMATCH", message, details);
    tracing::error!(error = %body, "response shape mismatch");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("QUERY_FAILED", "syntax error");
        assert_eq!(error.code, "QUERY_FAILED");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
    }

    #[test]
    fn test_json_skips_empty_details() {
        let error = ApiErrorResponse::new("NOT_FOUND", "no rows");
        let json = serde_json::to_value(&error).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["message"], "no rows");
    }

    #[test]
    fn test_query_failed_is_bad_request() {
        let (status, Json(body)) = query_failed(sqlx::Error::RowNotFound);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "QUERY_FAILED");
        assert!(!body.message.is_empty());
    }

    #[test]
    fn test_shape_mismatch_carries_details() {
        let (status, Json(body)) =
            shape_mismatch("length differs", serde_json::json!({"keyword": "cetilar"}));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.details.unwrap()["keyword"], "cetilar");
    }
}
