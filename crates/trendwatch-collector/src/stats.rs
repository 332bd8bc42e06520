//! 플로우 실행 통계.

use std::time::Duration;

use serde::Serialize;

use crate::flow::{FlowKind, FlowState};

/// 한 번의 스케줄 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    /// 플로우 종류
    pub flow: &'static str,
    /// 최종 상태
    pub final_state: &'static str,
    /// 시도 횟수 (첫 시도 포함)
    pub attempts: u32,
    /// 추출한 행 수 (wide/원본 테이블 기준)
    pub rows_extracted: usize,
    /// 정규화된 레코드 수
    pub records_normalized: usize,
    /// 저장소에 기록된 행 수
    pub rows_written: u64,
    /// 마지막 에러 메시지
    pub last_error: Option<String>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

/// 성공한 시도의 단계별 건수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub rows_extracted: usize,
    pub records_normalized: usize,
    pub rows_written: u64,
}

impl FlowReport {
    /// 새 통계 객체 생성
    pub fn new(kind: FlowKind) -> Self {
        Self {
            flow: kind.as_str(),
            final_state: FlowState::Idle.as_str(),
            attempts: 0,
            rows_extracted: 0,
            records_normalized: 0,
            rows_written: 0,
            last_error: None,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record_counts(&mut self, counts: StageCounts) {
        self.rows_extracted = counts.rows_extracted;
        self.records_normalized = counts.records_normalized;
        self.rows_written = counts.rows_written;
    }

    pub fn succeeded(&self) -> bool {
        self.final_state == FlowState::Succeeded.as_str()
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        if self.succeeded() {
            tracing::info!(
                flow = self.flow,
                state = self.final_state,
                attempts = self.attempts,
                rows_extracted = self.rows_extracted,
                records_normalized = self.records_normalized,
                rows_written = self.rows_written,
                elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
                "플로우 완료"
            );
        } else {
            tracing::error!(
                flow = self.flow,
                state = self.final_state,
                attempts = self.attempts,
                last_error = self.last_error.as_deref().unwrap_or("-"),
                elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
                "플로우 실패"
            );
        }
    }
}

/// 스케줄 루프 누적 요약.
///
/// 데몬은 무기한 실행되므로 보고서를 쌓지 않고 횟수와 마지막 보고서만 유지합니다.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSummary {
    pub runs: usize,
    pub succeeded: usize,
    pub last: Option<FlowReport>,
}

impl ScheduleSummary {
    pub fn record(&mut self, report: FlowReport) {
        self.runs += 1;
        if report.succeeded() {
            self.succeeded += 1;
        }
        self.last = Some(report);
    }

    pub fn failed(&self) -> usize {
        self.runs - self.succeeded
    }
}
