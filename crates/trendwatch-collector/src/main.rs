//! 주가/키워드 트렌드 수집기 CLI.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use trendwatch_collector::{
    scheduler, CollectorConfig, FlowJob, FlowKind, FlowReport, Pipeline, PipelineSettings,
};
use trendwatch_core::{init_logging, DateInterval, LogConfig};
use trendwatch_data::{
    Database, GoogleTrendsClient, MemoryTrendStore, PgTrendStore, ProxyPool, TrendStore,
    YahooPriceSource,
};

#[derive(Parser)]
#[command(name = "trendwatch-collector")]
#[command(about = "Stock price & keyword trend collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error). RUST_LOG가 있으면 무시
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// 데이터베이스 대신 메모리 저장소에 적재 (건수만 확인)
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 주가 플로우 1회 실행
    CollectStock {
        /// 조회 기간 (예: 1d, 30d, 2y). 기본값: STOCK_PERIOD
        #[arg(long)]
        period: Option<String>,
    },

    /// 키워드 트렌드 플로우 1회 실행 (90일 초과 구간은 자동 분할)
    CollectTrends {
        /// 시작일 (YYYY-MM-DD). 기본값: 종료일 - TREND_LOOKBACK_DAYS
        #[arg(long)]
        start: Option<NaiveDate>,
        /// 종료일 (YYYY-MM-DD). 기본값: 오늘 (UTC)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// 두 플로우를 동시에 1회 실행
    RunAll,

    /// 데몬 모드: 플로우별로 주기 실행
    Daemon,

    /// 스키마 마이그레이션 적용
    Migrate,
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let mut log_config = LogConfig::from_env();
    if std::env::var("RUST_LOG").map_or(true, |v| v.is_empty()) {
        log_config.level = format!("{},sqlx=warn", cli.log_level);
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {e}"))
}

fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 진행 중인 단계 이후 중단");
            trigger.cancel();
        }
    });
    cancel
}

fn ensure_succeeded(reports: &[&FlowReport]) -> anyhow::Result<()> {
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| !r.succeeded())
        .map(|r| r.flow)
        .collect();
    if !failed.is_empty() {
        bail!("플로우 실패: {}", failed.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli)?;

    tracing::info!(dry_run = cli.dry_run, "Trendwatch Collector 시작");

    let config = Arc::new(CollectorConfig::from_env()?);
    tracing::debug!(
        database = %config.database.display_target(),
        ticker = %config.stock.ticker,
        keywords = ?config.trends.keywords,
        "설정 로드 완료"
    );

    if let Commands::Migrate = cli.command {
        if cli.dry_run {
            tracing::warn!("dry-run 모드에서는 마이그레이션을 건너뜁니다");
            return Ok(());
        }
        let db = Database::connect(&config.database).await?;
        db.migrate().await?;
        db.close().await;
        return Ok(());
    }

    // 저장소
    let memory = cli.dry_run.then(|| Arc::new(MemoryTrendStore::new()));
    let database = if cli.dry_run {
        None
    } else {
        Some(Database::connect(&config.database).await?)
    };
    let store: Arc<dyn TrendStore> = match (&memory, &database) {
        (Some(memory), _) => memory.clone(),
        (None, Some(db)) => Arc::new(PgTrendStore::new(db.pool().clone())),
        (None, None) => bail!("저장소를 구성할 수 없습니다"),
    };

    // 소스와 프록시
    let proxies = ProxyPool::load(config.proxy.file.as_deref())
        .await
        .context("프록시 목록 로드 실패")?;
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(YahooPriceSource::new(config.http)),
        Arc::new(GoogleTrendsClient::new(config.trends.google_trends(), config.http)),
        store,
        proxies,
        PipelineSettings::from(config.as_ref()),
    ));

    let cancel = shutdown_token();
    let today = Utc::now().date_naive();

    let outcome = match cli.command {
        Commands::CollectStock { period } => {
            let job = FlowJob::Stock {
                period: period.unwrap_or_else(|| config.stock.period.clone()),
            };
            let report = pipeline.run_flow(&job, config.retry, &cancel).await;
            report.log_summary();
            ensure_succeeded(&[&report])
        }
        Commands::CollectTrends { start, end } => {
            let end = end.unwrap_or(today);
            let range = match start {
                Some(start) => DateInterval::new(start, end)?,
                None => DateInterval::trailing(end, config.trends.lookback_days)?,
            };
            let job = FlowJob::KeywordTrend { range };
            let report = pipeline.run_flow(&job, config.retry, &cancel).await;
            report.log_summary();
            ensure_succeeded(&[&report])
        }
        Commands::RunAll => {
            tracing::info!("=== 전체 플로우 시작 ===");
            let stock_job = FlowJob::scheduled(FlowKind::Stock, &config, today)?;
            let trend_job = FlowJob::scheduled(FlowKind::KeywordTrend, &config, today)?;

            let (stock, trends) = tokio::join!(
                pipeline.run_flow(&stock_job, config.retry, &cancel),
                pipeline.run_flow(&trend_job, config.retry, &cancel),
            );
            stock.log_summary();
            trends.log_summary();
            tracing::info!("=== 전체 플로우 완료 ===");
            ensure_succeeded(&[&stock, &trends])
        }
        Commands::Daemon => {
            tracing::info!(
                interval_minutes = config.daemon.interval_minutes,
                max_retries = config.retry.max_retries,
                "=== 데몬 모드 시작 ==="
            );
            for (kind, handle) in scheduler::spawn_all(pipeline.clone(), config.clone(), cancel.clone()) {
                match handle.await {
                    Ok(summary) => tracing::info!(
                        flow = %kind,
                        runs = summary.runs,
                        succeeded = summary.succeeded,
                        failed = summary.failed(),
                        last_state = summary.last.as_ref().map(|r| r.final_state).unwrap_or("-"),
                        "스케줄 종료"
                    ),
                    Err(e) => tracing::error!(flow = %kind, error = %e, "스케줄 태스크 비정상 종료"),
                }
            }
            Ok(())
        }
        Commands::Migrate => Ok(()),
    };

    if let Some(memory) = &memory {
        tracing::info!(
            stock_rows = memory.stock_count().await,
            trend_rows = memory.trend_count().await,
            "dry-run 결과 (메모리 저장소)"
        );
    }
    if let Some(db) = &database {
        db.close().await;
    }

    tracing::info!("Trendwatch Collector 종료");
    outcome
}
