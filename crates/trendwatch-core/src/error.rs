//! 파이프라인 에러 타입.
//!
//! 추출 → 변환 → 적재 각 단계에서 발생하는 에러를 정의합니다.
//! 실행 내부에서 복구되는 것은 `ExtractionFailure`(다음 프록시로 재시도)뿐이며,
//! 나머지는 실행을 중단시키고 오케스트레이터의 작업 단위 재시도에 맡깁니다.

use std::fmt;

use thiserror::Error;

/// 파이프라인 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 외부 소스에서 데이터 추출
    Extracting,
    /// wide → long 변환 및 컬럼 정규화
    Transforming,
    /// 저장소 upsert
    Loading,
}

impl Stage {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Loading => "loading",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파이프라인 에러.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 잘못된 날짜 구간 (lower > upper, window == 0 등)
    #[error("잘못된 날짜 구간: {0}")]
    InvalidRange(String),

    /// 단일 소스/프록시 시도 실패 (다음 프록시로 재시도 가능)
    #[error("추출 실패 ({source_name}): {message}")]
    ExtractionFailure {
        /// 데이터 소스 이름 (예: "google_trends", "yahoo")
        source_name: String,
        /// 실패 사유
        message: String,
    },

    /// 특정 구간에 대해 모든 프록시가 실패
    #[error("모든 프록시 실패 (구간 {interval}, {attempts}회 시도): {last_error}")]
    AllProxiesExhausted {
        /// 실패한 날짜 구간
        interval: String,
        /// 시도 횟수
        attempts: usize,
        /// 마지막 시도의 에러 메시지
        last_error: String,
    },

    /// 정규화 불변식 위반 (상위 스키마 변경 징후)
    #[error("형태 불일치: {0}")]
    ShapeMismatch(String),

    /// 저장소 쓰기 실패
    #[error("저장 실패: {0}")]
    StoreWriteFailure(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 단계 사이에서 실행이 취소됨
    #[error("실행 취소: {0}")]
    Cancelled(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// 추출 실패 에러 생성.
    pub fn extraction(source_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ExtractionFailure {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// 실행 내부에서 복구 가능한 에러인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ExtractionFailure { .. })
    }

    /// 에러가 발생한 파이프라인 단계.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidRange(_)
            | Self::ExtractionFailure { .. }
            | Self::AllProxiesExhausted { .. } => Some(Stage::Extracting),
            Self::ShapeMismatch(_) => Some(Stage::Transforming),
            Self::StoreWriteFailure(_) => Some(Stage::Loading),
            Self::Config(_) | Self::Cancelled(_) => None,
        }
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => Self::StoreWriteFailure(db_err.message().to_string()),
            other => Self::StoreWriteFailure(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::ShapeMismatch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_extraction_failure_is_recoverable() {
        assert!(PipelineError::extraction("google_trends", "429").is_recoverable());
        assert!(!PipelineError::ShapeMismatch("x".into()).is_recoverable());
        assert!(!PipelineError::AllProxiesExhausted {
            interval: "2025-01-01..2025-01-02".into(),
            attempts: 2,
            last_error: "timeout".into(),
        }
        .is_recoverable());
    }

    #[test]
    fn test_stage_classification() {
        assert_eq!(
            PipelineError::InvalidRange("x".into()).stage(),
            Some(Stage::Extracting)
        );
        assert_eq!(
            PipelineError::ShapeMismatch("x".into()).stage(),
            Some(Stage::Transforming)
        );
        assert_eq!(
            PipelineError::StoreWriteFailure("x".into()).stage(),
            Some(Stage::Loading)
        );
        assert_eq!(PipelineError::Cancelled("x".into()).stage(), None);
    }
}
