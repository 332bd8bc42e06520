//! 키워드 검색량 조회 endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::DateRangeQuery;
use crate::error::{invalid_query, query_failed, shape_mismatch, ApiResult};
use crate::repository::{KeywordStatRow, KeywordTrendRepository, KeywordTrendRow};
use crate::state::AppState;

/// 한 키워드의 열 단위 검색량.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSeries {
    pub kw_date: Vec<NaiveDate>,
    pub daily_search_amount: Vec<i32>,
    pub is_partial: Vec<bool>,
}

impl KeywordSeries {
    /// 행을 추가합니다. 날짜는 키워드 안에서 엄격히 증가해야 합니다.
    fn push(&mut self, row: KeywordTrendRow) -> Result<(), DateOrderViolation> {
        if let Some(&previous) = self.kw_date.last() {
            if row.kw_date <= previous {
                return Err(DateOrderViolation {
                    keyword: row.keyword,
                    previous,
                    date: row.kw_date,
                });
            }
        }
        self.kw_date.push(row.kw_date);
        self.daily_search_amount.push(row.daily_search_amount);
        self.is_partial.push(row.is_partial);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.kw_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kw_date.is_empty()
    }
}

/// 한 키워드 안에서 날짜가 중복되거나 역순인 행.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOrderViolation {
    pub keyword: String,
    pub previous: NaiveDate,
    pub date: NaiveDate,
}

impl DateOrderViolation {
    fn details(&self) -> serde_json::Value {
        serde_json::json!({
            "keyword": self.keyword,
            "previous": self.previous,
            "date": self.date,
        })
    }
}

/// 키워드별로 행을 묶습니다. 행 순서는 유지됩니다.
///
/// 같은 키워드에서 날짜가 중복되거나 감소하면 첫 위반 행을 반환합니다.
pub fn group_by_keyword(
    rows: Vec<KeywordTrendRow>,
) -> Result<BTreeMap<String, KeywordSeries>, DateOrderViolation> {
    let mut grouped: BTreeMap<String, KeywordSeries> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.keyword.clone()).or_default().push(row)?;
    }
    Ok(grouped)
}

/// 키워드별 최신 검색량과 직전 값.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStat {
    pub kw_date: NaiveDate,
    pub daily_search_amount: i32,
    pub lagged_amount: Option<i32>,
}

fn stats_by_keyword(rows: Vec<KeywordStatRow>) -> BTreeMap<String, KeywordStat> {
    rows.into_iter()
        .map(|row| {
            (
                row.keyword,
                KeywordStat {
                    kw_date: row.kw_date,
                    daily_search_amount: row.daily_search_amount,
                    lagged_amount: row.lagged_amount,
                },
            )
        })
        .collect()
}

/// 기간별 키워드 검색량 조회.
///
/// GET /keyword?start_date=&end_date=
pub async fn get_keyword_trends(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> ApiResult<Json<BTreeMap<String, KeywordSeries>>> {
    let Query(query) = query.map_err(invalid_query)?;
    let (start, end) = query.resolve(Utc::now().date_naive());
    let rows = KeywordTrendRepository::find_range(&state.db_pool, start, end)
        .await
        .map_err(query_failed)?;

    let grouped = group_by_keyword(rows).map_err(|violation| {
        shape_mismatch("키워드 날짜가 중복되었거나 정렬되지 않았습니다", violation.details())
    })?;

    Ok(Json(grouped))
}

/// 키워드별 최신 통계 조회.
///
/// GET /keyword/stat
pub async fn get_keyword_stat(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<BTreeMap<String, KeywordStat>>> {
    let rows = KeywordTrendRepository::latest_per_keyword(&state.db_pool)
        .await
        .map_err(query_failed)?;

    Ok(Json(stats_by_keyword(rows)))
}

/// 키워드 라우터 생성.
pub fn keyword_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_keyword_trends))
        .route("/stat", get(get_keyword_stat))
}
