//! Yahoo Finance 주가 소스.
//!
//! 일봉 OHLCV에 배당/분할 이벤트를 거래소 현지 날짜 기준으로 병합해
//! 제공자 열 이름 그대로의 [`RawPriceTable`]을 만듭니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use tracing::debug;
use trendwatch_core::{PipelineError, PipelineResult, ProxyEndpoint, RawPriceRow, RawPriceTable};
use yahoo_finance_api as yahoo;

use super::proxy::HttpSettings;
use super::PriceSource;

const SOURCE_NAME: &str = "yahoo";

/// 제공자 열 이름 (정규화 전).
pub const PRICE_COLUMNS: [&str; 7] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Dividends",
    "Stock Splits",
];

/// 일봉 한 개.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DailyBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Yahoo Finance 차트 API 소스.
#[derive(Debug, Clone, Default)]
pub struct YahooPriceSource {
    settings: HttpSettings,
}

impl YahooPriceSource {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }

    fn connector(&self, proxy: &ProxyEndpoint) -> PipelineResult<yahoo::YahooConnector> {
        let mut builder = yahoo::YahooConnector::builder().timeout(self.settings.read_timeout);
        if let Some(p) = HttpSettings::reqwest_proxy(proxy)? {
            builder = builder.proxy(p);
        }
        builder
            .build()
            .map_err(|e| PipelineError::extraction(SOURCE_NAME, format!("커넥터 생성 실패: {e}")))
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        period: &str,
        proxy: &ProxyEndpoint,
    ) -> PipelineResult<RawPriceTable> {
        let connector = self.connector(proxy)?;

        debug!(ticker, period, proxy = %proxy, "Yahoo Finance API 호출");

        let response = connector
            .get_quote_range(ticker, "1d", period)
            .await
            .map_err(|e| PipelineError::extraction(SOURCE_NAME, format!("{ticker}: {e}")))?;

        let bars: Vec<DailyBar> = response
            .quotes()
            .map_err(|e| PipelineError::extraction(SOURCE_NAME, format!("Quote 파싱 오류: {e}")))?
            .iter()
            .map(|q| DailyBar {
                timestamp: q.timestamp as i64,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume as f64,
            })
            .collect();

        // 이벤트가 없는 기간에는 배당/분할 섹션 자체가 없을 수 있음
        let dividends: Vec<(i64, f64)> = match response.dividends() {
            Ok(items) => items.iter().map(|d| (d.date as i64, d.amount as f64)).collect(),
            Err(e) => {
                debug!(ticker, error = %e, "배당 이벤트 없음");
                Vec::new()
            }
        };
        let splits: Vec<(i64, f64)> = match response.splits() {
            Ok(items) => items
                .iter()
                .filter(|s| s.denominator as f64 != 0.0)
                .map(|s| (s.date as i64, s.numerator as f64 / s.denominator as f64))
                .collect(),
            Err(e) => {
                debug!(ticker, error = %e, "분할 이벤트 없음");
                Vec::new()
            }
        };

        let offset = match response.metadata() {
            Ok(meta) => exchange_offset(meta.gmtoffset),
            Err(e) => {
                debug!(ticker, error = %e, "메타데이터 없음, UTC 기준 날짜 사용");
                exchange_offset(0)
            }
        };

        let table = assemble_price_table(&bars, &dividends, &splits, offset)?;
        debug!(ticker, rows = table.len(), "Yahoo Finance 응답 수신");
        Ok(table)
    }
}

/// 거래소 UTC 오프셋(초). 범위를 벗어나면 UTC.
pub(crate) fn exchange_offset(gmtoffset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(gmtoffset_secs).unwrap_or_else(|| Utc.fix())
}

fn local_timestamp(secs: i64, offset: FixedOffset) -> PipelineResult<DateTime<FixedOffset>> {
    offset
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| PipelineError::ShapeMismatch(format!("잘못된 타임스탬프: {secs}")))
}

/// 이벤트 타임스탬프를 거래소 현지 날짜별 값으로 합산.
fn events_by_date(
    events: &[(i64, f64)],
    offset: FixedOffset,
) -> PipelineResult<HashMap<NaiveDate, f64>> {
    let mut by_date = HashMap::new();
    for &(ts, value) in events {
        *by_date
            .entry(local_timestamp(ts, offset)?.date_naive())
            .or_insert(0.0) += value;
    }
    Ok(by_date)
}

/// 일봉과 이벤트를 날짜 순 [`RawPriceTable`]로 조립합니다.
///
/// 타임스탬프는 `offset`(거래소 시간대)으로 변환되므로 이후 정규화 단계의
/// 날짜 추출도 거래소 현지 날짜를 따릅니다.
pub(crate) fn assemble_price_table(
    bars: &[DailyBar],
    dividends: &[(i64, f64)],
    splits: &[(i64, f64)],
    offset: FixedOffset,
) -> PipelineResult<RawPriceTable> {
    let dividends = events_by_date(dividends, offset)?;
    let splits = events_by_date(splits, offset)?;

    let mut rows = bars
        .iter()
        .map(|bar| {
            let ts = local_timestamp(bar.timestamp, offset)?;
            let day = ts.date_naive();
            Ok(RawPriceRow {
                timestamp: ts,
                values: vec![
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    dividends.get(&day).copied().unwrap_or(0.0),
                    splits.get(&day).copied().unwrap_or(0.0),
                ],
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    rows.sort_by_key(|r| r.timestamp);

    RawPriceTable::new(PRICE_COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}
