//! 데몬 모드 스케줄러.
//!
//! 플로우마다 별도 태스크와 별도 주기를 가지므로 한 플로우의 실패나 지연이
//! 다른 플로우를 막지 않습니다. 같은 플로우는 이전 실행이 끝난 뒤에만 다음
//! 틱을 처리하며, 밀린 틱은 건너뜁니다.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use trendwatch_core::RetryPolicy;

use crate::config::CollectorConfig;
use crate::flow::{FlowJob, FlowKind};
use crate::pipeline::Pipeline;
use crate::stats::ScheduleSummary;

/// 플로우 하나의 주기 실행 루프.
///
/// `cancel`이 취소되면 진행 중인 실행을 마무리하고 반환합니다.
/// 반환값은 실행 횟수와 마지막 보고서를 담은 요약입니다.
pub async fn schedule_flow(
    pipeline: Arc<Pipeline>,
    config: Arc<CollectorConfig>,
    kind: FlowKind,
    every: Duration,
    policy: RetryPolicy,
    cancel: CancellationToken,
) -> ScheduleSummary {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut summary = ScheduleSummary::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(flow = %kind, "종료 신호 수신, 스케줄 중단");
                break;
            }
            _ = interval.tick() => {
                let job = match FlowJob::scheduled(kind, &config, Utc::now().date_naive()) {
                    Ok(job) => job,
                    Err(e) => {
                        error!(flow = %kind, error = %e, "작업 생성 실패");
                        continue;
                    }
                };

                let report = pipeline.run_flow(&job, policy, &cancel).await;
                report.log_summary();
                summary.record(report);

                info!(
                    flow = %kind,
                    next_in_minutes = every.as_secs() / 60,
                    "다음 실행 대기"
                );
            }
        }
    }

    summary
}

/// 모든 플로우를 각각의 태스크로 시작합니다.
pub fn spawn_all(
    pipeline: Arc<Pipeline>,
    config: Arc<CollectorConfig>,
    cancel: CancellationToken,
) -> Vec<(FlowKind, JoinHandle<ScheduleSummary>)> {
    let every = config.daemon.interval();
    let policy = config.retry;

    FlowKind::all()
        .into_iter()
        .map(|kind| {
            let handle = tokio::spawn(schedule_flow(
                pipeline.clone(),
                config.clone(),
                kind,
                every,
                policy,
                cancel.clone(),
            ));
            (kind, handle)
        })
        .collect()
}
