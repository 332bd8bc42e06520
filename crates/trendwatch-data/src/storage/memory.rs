//! 메모리 저장소.
//!
//! PostgreSQL 저장소와 같은 자연키/덮어쓰기 규칙을 따릅니다.
//! `--dry-run` 실행과 테스트에서 사용합니다.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use trendwatch_core::{PipelineResult, StockRecord, TrendRecord};

use super::loader::TrendStore;

/// 자연키로 정렬된 메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryTrendStore {
    stock: RwLock<BTreeMap<NaiveDate, StockRecord>>,
    trends: RwLock<BTreeMap<(NaiveDate, String), TrendRecord>>,
}

impl MemoryTrendStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 주가 레코드 (날짜 순).
    pub async fn stock_rows(&self) -> Vec<StockRecord> {
        self.stock.read().await.values().cloned().collect()
    }

    /// 저장된 트렌드 레코드 (날짜, 키워드 순).
    pub async fn trend_rows(&self) -> Vec<TrendRecord> {
        self.trends.read().await.values().cloned().collect()
    }

    pub async fn stock_count(&self) -> usize {
        self.stock.read().await.len()
    }

    pub async fn trend_count(&self) -> usize {
        self.trends.read().await.len()
    }
}

#[async_trait]
impl TrendStore for MemoryTrendStore {
    async fn upsert_stock(&self, records: &[StockRecord]) -> PipelineResult<u64> {
        let mut stock = self.stock.write().await;
        for record in records {
            stock.insert(record.date, record.clone());
        }
        Ok(records.len() as u64)
    }

    async fn upsert_trends(&self, records: &[TrendRecord]) -> PipelineResult<u64> {
        let mut trends = self.trends.write().await;
        for record in records {
            trends.insert((record.date, record.keyword.clone()), record.clone());
        }
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend(day: u32, keyword: &str, amount: i32) -> TrendRecord {
        TrendRecord {
            date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            keyword: keyword.to_string(),
            daily_search_amount: amount,
            is_partial: false,
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_is_idempotent() {
        let store = MemoryTrendStore::new();
        let records = vec![trend(1, "cetilar", 10), trend(1, "sideral", 20), trend(2, "cetilar", 12)];

        store.upsert_trends(&records).await.unwrap();
        let once = store.trend_rows().await;
        store.upsert_trends(&records).await.unwrap();

        assert_eq!(store.trend_count().await, 3);
        assert_eq!(store.trend_rows().await, once);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let store = MemoryTrendStore::new();
        store.upsert_trends(&[trend(1, "cetilar", 10)]).await.unwrap();

        let mut changed = trend(1, "cetilar", 99);
        changed.is_partial = true;
        store.upsert_trends(&[changed.clone()]).await.unwrap();

        assert_eq!(store.trend_rows().await, vec![changed]);
    }

    #[tokio::test]
    async fn test_stock_keyed_by_date() {
        let store = MemoryTrendStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let mut record = StockRecord {
            date,
            open: 5.0,
            high: 5.5,
            low: 4.8,
            close: 5.2,
            volume: 10_000,
            dividends: 0.0,
            stock_splits: 0.0,
        };

        store.upsert_stock(&[record.clone()]).await.unwrap();
        record.close = 5.3;
        store.upsert_stock(&[record.clone()]).await.unwrap();

        assert_eq!(store.stock_rows().await, vec![record]);
    }
}
