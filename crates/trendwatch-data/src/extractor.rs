//! 추출 단계.
//!
//! 구간마다 프록시 풀을 앞에서부터 순서대로 시도하고, 성공한 구간 결과를
//! 날짜 축으로 이어 붙입니다. 한 구간이라도 모든 프록시가 실패하면
//! 앞선 구간 결과까지 버리고 실행 전체가 실패합니다.

use std::time::Duration;

use tracing::{info, instrument};
use trendwatch_core::{
    try_in_order, DateInterval, PipelineError, PipelineResult, PoolExhausted, ProxyEndpoint,
    RawPriceTable, WideTrendTable,
};

use crate::provider::{PriceSource, TrendSource};

/// 프록시 사이 최소 대기 시간. 이보다 짧은 `backoff`는 이 값으로 올립니다.
pub const MIN_PROXY_BACKOFF: Duration = Duration::from_secs(1);

fn exhausted(scope: String, e: PoolExhausted) -> PipelineError {
    PipelineError::AllProxiesExhausted {
        interval: scope,
        attempts: e.attempts,
        last_error: e
            .last_error
            .unwrap_or_else(|| "프록시 목록이 비어 있습니다".to_string()),
    }
}

/// 키워드 트렌드 추출.
///
/// `intervals`는 분할기가 만든 연속 구간이어야 합니다.
#[instrument(skip_all, fields(source = source.name(), keywords = keywords.len(), intervals = intervals.len()))]
pub async fn extract_keyword_trends<S>(
    source: &S,
    keywords: &[String],
    intervals: &[DateInterval],
    proxies: &[ProxyEndpoint],
    backoff: Duration,
) -> PipelineResult<WideTrendTable>
where
    S: TrendSource + ?Sized,
{
    let backoff = backoff.max(MIN_PROXY_BACKOFF);
    let mut table = WideTrendTable::empty(keywords.to_vec());

    for interval in intervals {
        let part = try_in_order(proxies, backoff, |proxy| async move {
            source.fetch_interval(keywords, interval, &proxy).await
        })
        .await
        .map_err(|e| exhausted(interval.to_string(), e))?;

        info!(interval = %interval, rows = part.row_count(), "구간 추출 완료");
        table.append(part)?;
    }

    Ok(table)
}

/// 주가 이력 추출 (구간 분할 없음).
#[instrument(skip_all, fields(source = source.name(), ticker = %ticker, period = %period))]
pub async fn extract_stock_history<S>(
    source: &S,
    ticker: &str,
    period: &str,
    proxies: &[ProxyEndpoint],
    backoff: Duration,
) -> PipelineResult<RawPriceTable>
where
    S: PriceSource + ?Sized,
{
    let backoff = backoff.max(MIN_PROXY_BACKOFF);
    let table = try_in_order(proxies, backoff, |proxy| async move {
        source.fetch_history(ticker, period, &proxy).await
    })
    .await
    .map_err(|e| exhausted(format!("{ticker} period={period}"), e))?;

    info!(rows = table.len(), "주가 이력 추출 완료");
    Ok(table)
}
