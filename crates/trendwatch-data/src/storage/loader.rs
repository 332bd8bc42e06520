//! Idempotent 적재.
//!
//! 레코드마다 `INSERT ... ON CONFLICT (자연키) DO UPDATE SET`을 실행해
//! 키가 아닌 모든 열을 새 값으로 덮어씁니다. 같은 입력을 여러 번 적재해도
//! 저장소 상태는 한 번 적재한 것과 같습니다.
//!
//! 한 번의 적재는 하나의 트랜잭션으로 실행되며, 어느 한 행이라도 실패하면
//! 전체가 롤백됩니다.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use sqlx::PgPool;
use tracing::{debug, info};
use trendwatch_core::{PipelineError, PipelineResult, StockRecord, TrendRecord};

/// upsert 대상 테이블 정의.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// 테이블 이름
    pub name: &'static str,
    /// 바인딩 순서대로의 열 목록
    pub columns: &'static [&'static str],
    /// 충돌 판정 키 (유니크 제약과 일치해야 함)
    pub conflict_keys: &'static [&'static str],
}

/// 일별 주가 테이블.
pub const STOCK_TREND: TableSpec = TableSpec {
    name: "stock_trend",
    columns: &[
        "stock_date",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "dividends",
        "stock_splits",
    ],
    conflict_keys: &["stock_date"],
};

/// 일별 키워드 검색량 테이블.
pub const KW_TREND: TableSpec = TableSpec {
    name: "kw_trend",
    columns: &["kw_date", "keyword", "daily_search_amount", "is_partial"],
    conflict_keys: &["kw_date", "keyword"],
};

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

/// 위치 파라미터(`$1..$n`)를 사용하는 upsert 문 생성.
///
/// 키가 아닌 열이 없으면 `DO NOTHING`으로 끝납니다.
///
/// ```
/// use trendwatch_data::storage::{upsert_statement, KW_TREND};
///
/// let sql = upsert_statement(&KW_TREND).unwrap();
/// assert!(sql.contains("ON CONFLICT (kw_date, keyword) DO UPDATE SET"));
/// ```
pub fn upsert_statement(table: &TableSpec) -> PipelineResult<String> {
    let invalid = std::iter::once(table.name)
        .chain(table.columns.iter().copied())
        .find(|name| !is_identifier(name));
    if let Some(name) = invalid {
        return Err(PipelineError::Config(format!("잘못된 SQL 식별자: {name:?}")));
    }
    if table.columns.is_empty() {
        return Err(PipelineError::Config(format!("{}: 열 목록이 비어 있습니다", table.name)));
    }
    if table.conflict_keys.is_empty() {
        return Err(PipelineError::Config(format!("{}: 충돌 키가 없습니다", table.name)));
    }
    if let Some(key) = table
        .conflict_keys
        .iter()
        .find(|k| !table.columns.contains(*k))
    {
        return Err(PipelineError::Config(format!(
            "{}: 충돌 키 {key}가 열 목록에 없습니다",
            table.name
        )));
    }

    let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = table
        .columns
        .iter()
        .filter(|c| !table.conflict_keys.contains(*c))
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();

    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        table.name,
        table.columns.join(", "),
        placeholders.join(", "),
        table.conflict_keys.join(", "),
        action
    ))
}

/// 테이블 한 행으로 적재되는 레코드.
pub trait UpsertRow: Send + Sync {
    /// 대상 테이블.
    const TABLE: TableSpec;

    /// `TABLE.columns` 순서대로 값을 바인딩합니다.
    fn bind_to<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;
}

impl UpsertRow for StockRecord {
    const TABLE: TableSpec = STOCK_TREND;

    fn bind_to<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.date)
            .bind(self.open)
            .bind(self.high)
            .bind(self.low)
            .bind(self.close)
            .bind(self.volume)
            .bind(self.dividends)
            .bind(self.stock_splits)
    }
}

impl UpsertRow for TrendRecord {
    const TABLE: TableSpec = KW_TREND;

    fn bind_to<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.date)
            .bind(self.keyword.as_str())
            .bind(self.daily_search_amount)
            .bind(self.is_partial)
    }
}

/// 정규화된 레코드 저장소.
#[async_trait]
pub trait TrendStore: Send + Sync {
    /// 주가 레코드 upsert. 기록된 행 수를 반환합니다.
    async fn upsert_stock(&self, records: &[StockRecord]) -> PipelineResult<u64>;

    /// 트렌드 레코드 upsert. 기록된 행 수를 반환합니다.
    async fn upsert_trends(&self, records: &[TrendRecord]) -> PipelineResult<u64>;
}

/// PostgreSQL 저장소.
#[derive(Debug, Clone)]
pub struct PgTrendStore {
    pool: PgPool,
}

impl PgTrendStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 레코드 전체를 한 트랜잭션으로 upsert.
    ///
    /// 에러가 나면 트랜잭션이 커밋되지 않은 채 drop되어 롤백됩니다.
    pub async fn upsert<R: UpsertRow>(&self, records: &[R]) -> PipelineResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = upsert_statement(&R::TABLE)?;
        debug!(table = R::TABLE.name, sql = %sql, "upsert 문 준비");

        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;
        for record in records {
            let result = record.bind_to(sqlx::query(&sql)).execute(&mut *tx).await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        info!(table = R::TABLE.name, rows = written, "upsert 완료");
        Ok(written)
    }
}

#[async_trait]
impl TrendStore for PgTrendStore {
    async fn upsert_stock(&self, records: &[StockRecord]) -> PipelineResult<u64> {
        self.upsert(records).await
    }

    async fn upsert_trends(&self, records: &[TrendRecord]) -> PipelineResult<u64> {
        self.upsert(records).await
    }
}
