//! 플로우 오케스트레이터.
//!
//! 추출 → 변환 → 적재를 순서대로 실행합니다. 각 단계는 이전 단계의 전체 출력에
//! 의존하므로 단계 사이 병렬 처리는 없습니다.
//!
//! - 실행 내부 복구는 프록시 순환뿐이며, 그 외 에러는 시도 전체를 실패시킵니다.
//! - 실패한 시도는 [`RetryPolicy`]에 따라 고정 지연 후 처음부터 다시 실행됩니다.
//! - 취소 토큰은 추출/변환 중에만 반영됩니다. 적재는 트랜잭션 단위로 끝까지 실행됩니다.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use trendwatch_core::{
    flow_span, normalize_stock_table, partition, reshape_wide_to_long, PipelineError,
    PipelineResult, RawPriceTable, RetryPolicy, StockRecord, TrendRecord, WideTrendTable,
};
use trendwatch_data::{
    extract_keyword_trends, extract_stock_history, PriceSource, ProxyPool, TrendSource, TrendStore,
};

use crate::config::CollectorConfig;
use crate::flow::{FlowJob, FlowRun, FlowState};
use crate::stats::{FlowReport, StageCounts};

/// 오케스트레이터 실행 파라미터.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 주가 티커
    pub ticker: String,
    /// 트렌드 키워드
    pub keywords: Vec<String>,
    /// 트렌드 구간 최대 일수
    pub window_days: u32,
    /// 프록시 사이 대기
    pub proxy_backoff: std::time::Duration,
}

impl From<&CollectorConfig> for PipelineSettings {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            ticker: config.stock.ticker.clone(),
            keywords: config.trends.keywords.clone(),
            window_days: config.trends.window_days,
            proxy_backoff: config.proxy.backoff(),
        }
    }
}

enum Extracted {
    Stock(RawPriceTable),
    Trends(WideTrendTable),
}

impl Extracted {
    fn rows(&self) -> usize {
        match self {
            Self::Stock(table) => table.len(),
            Self::Trends(table) => table.row_count(),
        }
    }
}

enum Normalized {
    Stock(Vec<StockRecord>),
    Trends(Vec<TrendRecord>),
}

impl Normalized {
    fn len(&self) -> usize {
        match self {
            Self::Stock(records) => records.len(),
            Self::Trends(records) => records.len(),
        }
    }
}

/// 주가/트렌드 ETL 파이프라인.
///
/// 실행 간 상태를 갖지 않으므로 여러 플로우 태스크가 `Arc`로 공유합니다.
pub struct Pipeline {
    prices: Arc<dyn PriceSource>,
    trends: Arc<dyn TrendSource>,
    store: Arc<dyn TrendStore>,
    proxies: ProxyPool,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        trends: Arc<dyn TrendSource>,
        store: Arc<dyn TrendStore>,
        proxies: ProxyPool,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            prices,
            trends,
            store,
            proxies,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    async fn extract(&self, job: &FlowJob) -> PipelineResult<Extracted> {
        let proxies = self.proxies.endpoints();
        let backoff = self.settings.proxy_backoff;

        match job {
            FlowJob::Stock { period } => extract_stock_history(
                self.prices.as_ref(),
                &self.settings.ticker,
                period,
                proxies,
                backoff,
            )
            .await
            .map(Extracted::Stock),
            FlowJob::KeywordTrend { range } => {
                let intervals = partition(range.lower(), range.upper(), self.settings.window_days)?;
                extract_keyword_trends(
                    self.trends.as_ref(),
                    &self.settings.keywords,
                    &intervals,
                    proxies,
                    backoff,
                )
                .await
                .map(Extracted::Trends)
            }
        }
    }

    fn transform(extracted: &Extracted) -> PipelineResult<Normalized> {
        match extracted {
            Extracted::Stock(table) => normalize_stock_table(table).map(Normalized::Stock),
            Extracted::Trends(table) => reshape_wide_to_long(table).map(Normalized::Trends),
        }
    }

    async fn load(&self, normalized: &Normalized) -> PipelineResult<u64> {
        match normalized {
            Normalized::Stock(records) => self.store.upsert_stock(records).await,
            Normalized::Trends(records) => self.store.upsert_trends(records).await,
        }
    }

    /// 한 번의 시도: 추출 → 변환 → 적재.
    ///
    /// 실패 시 `run`은 `Failed` 또는 `Cancelled` 상태로 끝납니다.
    pub async fn run_once(
        &self,
        job: &FlowJob,
        run: &mut FlowRun,
        cancel: &CancellationToken,
    ) -> PipelineResult<StageCounts> {
        let result = self.run_stages(job, run, cancel).await;
        if let Err(e) = &result {
            if !run.state().is_terminal() && run.state() != FlowState::Failed {
                run.fail_with(e)?;
            }
        }
        result
    }

    async fn run_stages(
        &self,
        job: &FlowJob,
        run: &mut FlowRun,
        cancel: &CancellationToken,
    ) -> PipelineResult<StageCounts> {
        run.advance(FlowState::Extracting)?;
        let extracted = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PipelineError::Cancelled("추출 중 종료 요청".to_string()));
            }
            result = self.extract(job) => result?,
        };
        info!(rows = extracted.rows(), "추출 완료");

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled("변환 전 종료 요청".to_string()));
        }
        run.advance(FlowState::Transforming)?;
        let normalized = Self::transform(&extracted)?;
        info!(records = normalized.len(), "변환 완료");

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled("적재 전 종료 요청".to_string()));
        }
        run.advance(FlowState::Loading)?;
        let written = self.load(&normalized).await?;
        run.advance(FlowState::Succeeded)?;

        Ok(StageCounts {
            rows_extracted: extracted.rows(),
            records_normalized: normalized.len(),
            rows_written: written,
        })
    }

    /// 재시도 정책을 적용해 작업 하나를 끝까지 실행합니다.
    ///
    /// 결과는 항상 보고서로 반환되며, 최종 상태는 `Succeeded`, `GaveUp`, `Cancelled` 중 하나입니다.
    pub async fn run_flow(
        &self,
        job: &FlowJob,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> FlowReport {
        let started = Instant::now();
        let kind = job.kind();
        let mut run = FlowRun::new(kind);
        let mut report = FlowReport::new(kind);

        info!(job = %job, max_attempts = policy.max_attempts(), "플로우 시작");

        for attempt in 1..=policy.max_attempts() {
            report.attempts = attempt;

            let outcome = self
                .run_once(job, &mut run, cancel)
                .instrument(flow_span!(kind, attempt))
                .await;

            match outcome {
                Ok(counts) => {
                    report.record_counts(counts);
                    report.last_error = None;
                    break;
                }
                Err(e) => {
                    report.last_error = Some(e.to_string());
                    if run.state() == FlowState::Cancelled {
                        warn!(flow = %kind, attempt, error = %e, "플로우 취소");
                        break;
                    }

                    error!(
                        flow = %kind,
                        attempt,
                        stage = e.stage().map_or("-", |s| s.as_str()),
                        error = %e,
                        "플로우 시도 실패"
                    );

                    if attempt == policy.max_attempts() {
                        if let Err(transition) = run.advance(FlowState::GaveUp) {
                            error!(flow = %kind, state = %run.state(), error = %transition, "포기 상태 전이 실패");
                        }
                        break;
                    }

                    info!(flow = %kind, delay_secs = policy.delay.as_secs(), "재시도 대기");
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            if let Err(transition) = run.advance(FlowState::Cancelled) {
                                error!(flow = %kind, state = %run.state(), error = %transition, "취소 상태 전이 실패");
                            }
                            break;
                        }
                        _ = tokio::time::sleep(policy.delay) => {}
                    }
                }
            }
        }

        report.final_state = run.state().as_str();
        report.elapsed = started.elapsed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use trendwatch_core::{DateInterval, ProxyEndpoint, RawPriceRow, WideTrendRow};
    use trendwatch_data::MemoryTrendStore;

    /// 처음 `failures`번 실패한 뒤 성공하는 주가 소스.
    struct FlakyPrices {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for FlakyPrices {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch_history(
            &self,
            _ticker: &str,
            _period: &str,
            _proxy: &ProxyEndpoint,
        ) -> PipelineResult<RawPriceTable> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(PipelineError::extraction("flaky", "timeout"));
            }
            RawPriceTable::new(
                ["Open", "High", "Low", "Close", "Volume"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                vec![RawPriceRow {
                    timestamp: DateTime::parse_from_rfc3339("2025-09-01T09:00:00+02:00").unwrap(),
                    values: vec![5.0, 5.5, 4.9, 5.2, 1000.0],
                }],
            )
        }
    }

    struct FixedTrends;

    #[async_trait]
    impl TrendSource for FixedTrends {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_interval(
            &self,
            keywords: &[String],
            interval: &DateInterval,
            _proxy: &ProxyEndpoint,
        ) -> PipelineResult<WideTrendTable> {
            WideTrendTable::new(
                keywords.to_vec(),
                vec![WideTrendRow {
                    date: interval.lower(),
                    values: vec![7; keywords.len()],
                    is_partial: true,
                }],
            )
        }
    }

    fn pipeline(prices: FlakyPrices, store: Arc<MemoryTrendStore>) -> Pipeline {
        Pipeline::new(
            Arc::new(prices),
            Arc::new(FixedTrends),
            store,
            ProxyPool::direct(),
            PipelineSettings {
                ticker: "PHN.MI".into(),
                keywords: vec!["Cetilar".into(), "Sideral".into()],
                window_days: 90,
                proxy_backoff: Duration::from_secs(1),
            },
        )
    }

    /// 적재 중 종료 요청으로 커넥션 풀이 닫힌 저장소.
    struct ClosingStore;

    #[async_trait]
    impl TrendStore for ClosingStore {
        async fn upsert_stock(&self, _records: &[StockRecord]) -> PipelineResult<u64> {
            Err(PipelineError::Cancelled("pool closed".into()))
        }

        async fn upsert_trends(&self, _records: &[TrendRecord]) -> PipelineResult<u64> {
            Err(PipelineError::Cancelled("pool closed".into()))
        }
    }

    fn flaky(failures: usize) -> FlakyPrices {
        FlakyPrices {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stock_flow_retries_then_succeeds() {
        let store = Arc::new(MemoryTrendStore::new());
        let pipeline = pipeline(flaky(2), store.clone());
        let job = FlowJob::Stock { period: "1d".into() };

        let report = pipeline
            .run_flow(&job, RetryPolicy::new(3, Duration::from_secs(300)), &CancellationToken::new())
            .await;

        assert!(report.succeeded());
        assert_eq!(report.attempts, 3);
        assert_eq!(report.rows_written, 1);
        assert_eq!(store.stock_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stock_flow_gives_up() {
        let store = Arc::new(MemoryTrendStore::new());
        let pipeline = pipeline(flaky(usize::MAX), store.clone());
        let job = FlowJob::Stock { period: "1d".into() };

        let report = pipeline
            .run_flow(&job, RetryPolicy::new(1, Duration::from_secs(5)), &CancellationToken::new())
            .await;

        assert_eq!(report.final_state, "gave_up");
        assert_eq!(report.attempts, 2);
        assert!(report.last_error.unwrap().contains("모든 프록시 실패"));
        assert_eq!(store.stock_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_error_during_loading_gives_up() {
        let pipeline = Pipeline::new(
            Arc::new(flaky(0)),
            Arc::new(FixedTrends),
            Arc::new(ClosingStore),
            ProxyPool::direct(),
            PipelineSettings {
                ticker: "PHN.MI".into(),
                keywords: vec!["Cetilar".into()],
                window_days: 90,
                proxy_backoff: Duration::from_secs(1),
            },
        );

        let report = pipeline
            .run_flow(
                &FlowJob::Stock { period: "1d".into() },
                RetryPolicy::no_retry(),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.final_state, FlowState::GaveUp.as_str());
        assert_eq!(report.attempts, 1);
        assert!(report.last_error.unwrap().contains("pool closed"));
    }

    #[tokio::test]
    async fn test_keyword_flow_writes_long_records() {
        let store = Arc::new(MemoryTrendStore::new());
        let pipeline = pipeline(flaky(0), store.clone());
        let range = DateInterval::new(
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
        )
        .unwrap();

        let report = pipeline
            .run_flow(
                &FlowJob::KeywordTrend { range },
                RetryPolicy::no_retry(),
                &CancellationToken::new(),
            )
            .await;

        assert!(report.succeeded());
        assert_eq!(report.rows_extracted, 1);
        assert_eq!(report.records_normalized, 2);
        let rows = store.trend_rows().await;
        assert_eq!(rows[0].keyword, "cetilar");
        assert!(rows.iter().all(|r| r.is_partial));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_writes_nothing() {
        let store = Arc::new(MemoryTrendStore::new());
        let pipeline = pipeline(flaky(0), store.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = pipeline
            .run_flow(&FlowJob::Stock { period: "1d".into() }, RetryPolicy::default(), &cancel)
            .await;

        assert_eq!(report.final_state, "cancelled");
        assert_eq!(report.attempts, 1);
        assert_eq!(store.stock_count().await, 0);
    }
}
