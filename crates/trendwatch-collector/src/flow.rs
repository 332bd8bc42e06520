//! 플로우 종류와 실행 상태 머신.
//!
//! ```text
//! Idle → Extracting → Transforming → Loading → Succeeded
//!            │             │            │
//!            └─────────────┴────────────┴──→ Failed ──→ Extracting (재시도)
//!            │             │                   └──────→ GaveUp
//!            └─────────────┴──→ Cancelled
//! ```

use std::fmt;

use chrono::NaiveDate;
use trendwatch_core::{DateInterval, PipelineError, PipelineResult};

use crate::config::CollectorConfig;

/// 독립적으로 스케줄되는 플로우.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// 일별 주가
    Stock,
    /// 키워드 검색 트렌드
    KeywordTrend,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock_flow",
            Self::KeywordTrend => "kws_flow",
        }
    }

    pub fn all() -> [FlowKind; 2] {
        [Self::Stock, Self::KeywordTrend]
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 실행 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Succeeded,
    /// 시도 실패 (재시도 대기)
    Failed,
    /// 재시도 예산 소진 (운영자 확인 필요)
    GaveUp,
    /// 단계 사이에서 중단됨
    Cancelled,
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::GaveUp => "gave_up",
            Self::Cancelled => "cancelled",
        }
    }

    /// 더 이상 전이가 없는 상태.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::GaveUp | Self::Cancelled)
    }

    /// 허용된 전이인지 확인.
    pub fn can_transition_to(&self, next: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (Idle, Extracting)
                | (Extracting, Transforming)
                | (Extracting, Failed)
                | (Extracting, Cancelled)
                | (Transforming, Loading)
                | (Transforming, Failed)
                | (Transforming, Cancelled)
                | (Loading, Succeeded)
                | (Loading, Failed)
                | (Failed, Extracting)
                | (Failed, GaveUp)
                | (Failed, Cancelled)
        )
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 한 번의 스케줄 실행 (재시도 포함) 상태 추적.
#[derive(Debug, Clone)]
pub struct FlowRun {
    kind: FlowKind,
    state: FlowState,
    history: Vec<FlowState>,
}

impl FlowRun {
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            state: FlowState::Idle,
            history: vec![FlowState::Idle],
        }
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// 지나온 상태 (현재 상태 포함).
    pub fn history(&self) -> &[FlowState] {
        &self.history
    }

    /// 상태 전이. 허용되지 않은 전이는 에러.
    pub fn advance(&mut self, next: FlowState) -> PipelineResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::Config(format!(
                "{}: 허용되지 않은 상태 전이 {} → {}",
                self.kind, self.state, next
            )));
        }
        tracing::debug!(flow = %self.kind, from = %self.state, to = %next, "상태 전이");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// 에러 종류에 맞는 실패 상태로 전이 (취소 → Cancelled, 그 외 → Failed).
    ///
    /// 적재 중에는 취소 상태로 갈 수 없으므로 취소 에러도 `Failed`로 기록됩니다.
    pub fn fail_with(&mut self, err: &PipelineError) -> PipelineResult<()> {
        let next = match err {
            PipelineError::Cancelled(_) if self.state.can_transition_to(FlowState::Cancelled) => {
                FlowState::Cancelled
            }
            _ => FlowState::Failed,
        };
        self.advance(next)
    }
}

/// 실행할 작업 단위.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowJob {
    /// `period` 동안의 주가
    Stock { period: String },
    /// `range` 동안의 키워드 트렌드 (구간 분할 후 조회)
    KeywordTrend { range: DateInterval },
}

impl FlowJob {
    pub fn kind(&self) -> FlowKind {
        match self {
            Self::Stock { .. } => FlowKind::Stock,
            Self::KeywordTrend { .. } => FlowKind::KeywordTrend,
        }
    }

    /// 정기 실행용 작업: 주가는 설정된 기간, 트렌드는 `today` 기준 최근 구간.
    pub fn scheduled(kind: FlowKind, config: &CollectorConfig, today: NaiveDate) -> PipelineResult<Self> {
        Ok(match kind {
            FlowKind::Stock => Self::Stock {
                period: config.stock.period.clone(),
            },
            FlowKind::KeywordTrend => Self::KeywordTrend {
                range: DateInterval::trailing(today, config.trends.lookback_days)?,
            },
        })
    }
}

impl fmt::Display for FlowJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stock { period } => write!(f, "{} period={period}", self.kind()),
            Self::KeywordTrend { range } => write!(f, "{} range={range}", self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut run = FlowRun::new(FlowKind::Stock);
        for next in [
            FlowState::Extracting,
            FlowState::Transforming,
            FlowState::Loading,
            FlowState::Succeeded,
        ] {
            run.advance(next).unwrap();
        }
        assert!(run.state().is_terminal());
        assert_eq!(run.history().len(), 5);
    }

    #[test]
    fn test_retry_then_give_up() {
        let mut run = FlowRun::new(FlowKind::KeywordTrend);
        run.advance(FlowState::Extracting).unwrap();
        run.fail_with(&PipelineError::extraction("x", "429")).unwrap();
        run.advance(FlowState::Extracting).unwrap();
        run.advance(FlowState::Failed).unwrap();
        run.advance(FlowState::GaveUp).unwrap();
        assert_eq!(run.state(), FlowState::GaveUp);
    }

    #[test]
    fn test_loading_cannot_be_cancelled() {
        assert!(!FlowState::Loading.can_transition_to(FlowState::Cancelled));
        assert!(FlowState::Transforming.can_transition_to(FlowState::Cancelled));

        let mut run = FlowRun::new(FlowKind::Stock);
        assert!(run.advance(FlowState::Loading).is_err());
        assert_eq!(run.state(), FlowState::Idle);
    }

    #[test]
    fn test_fail_with_cancelled() {
        let mut run = FlowRun::new(FlowKind::Stock);
        run.advance(FlowState::Extracting).unwrap();
        run.fail_with(&PipelineError::Cancelled("shutdown".into())).unwrap();
        assert_eq!(run.state(), FlowState::Cancelled);
    }

    #[test]
    fn test_fail_with_cancelled_during_loading() {
        let mut run = FlowRun::new(FlowKind::Stock);
        for state in [FlowState::Extracting, FlowState::Transforming, FlowState::Loading] {
            run.advance(state).unwrap();
        }
        run.fail_with(&PipelineError::Cancelled("pool closed".into())).unwrap();
        assert_eq!(run.state(), FlowState::Failed);
        run.advance(FlowState::GaveUp).unwrap();
    }
}
