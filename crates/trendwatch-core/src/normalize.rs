//! 레코드 정규화.
//!
//! - 트렌드: wide 테이블(날짜 × 키워드)을 long-form `TrendRecord` 목록으로 변환
//! - 주가: 제공자 열 이름을 저장 스키마 열 이름으로 매핑하고 타임스탬프에서 날짜만 추출

use std::collections::{HashMap, HashSet};

use crate::domain::{RawPriceTable, StockRecord, TrendRecord, WideTrendTable};
use crate::error::{PipelineError, PipelineResult};

/// 열 이름 정규화: 앞뒤 공백 제거, 공백 → `_`, 소문자.
///
/// ```
/// use trendwatch_core::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Stock Splits "), "stock_splits");
/// assert_eq!(normalize_column_name("Cetilar"), "cetilar");
/// ```
pub fn normalize_column_name(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// wide 테이블을 long-form 레코드로 변환합니다.
///
/// 모든 행(날짜)과 키워드 열마다 레코드를 하나씩 만들고, `is_partial`은
/// 키워드와 무관하게 해당 행의 플래그를 그대로 복제합니다.
/// 출력 길이는 항상 `행 수 × 키워드 수`입니다.
pub fn reshape_wide_to_long(table: &WideTrendTable) -> PipelineResult<Vec<TrendRecord>> {
    let keywords: Vec<String> = table
        .keywords()
        .iter()
        .map(|k| normalize_column_name(k))
        .collect();

    let mut seen = HashSet::with_capacity(keywords.len());
    for keyword in &keywords {
        if keyword.is_empty() {
            return Err(PipelineError::ShapeMismatch("빈 키워드 열 이름".to_string()));
        }
        if !seen.insert(keyword.as_str()) {
            return Err(PipelineError::ShapeMismatch(format!(
                "정규화 후 중복된 키워드 열: {keyword}"
            )));
        }
    }

    let expected = table.row_count() * keywords.len();
    let mut records = Vec::with_capacity(expected);

    for row in table.rows() {
        for (keyword, value) in keywords.iter().zip(&row.values) {
            records.push(TrendRecord {
                date: row.date,
                keyword: keyword.clone(),
                daily_search_amount: *value,
                is_partial: row.is_partial,
            });
        }
    }

    if records.len() != expected {
        return Err(PipelineError::ShapeMismatch(format!(
            "변환 결과 {}건, 기대값 {}건",
            records.len(),
            expected
        )));
    }

    Ok(records)
}

const REQUIRED_PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// 원본 주가 테이블을 `StockRecord` 목록으로 변환합니다.
///
/// 열 이름은 [`normalize_column_name`]으로 정규화한 뒤 매핑합니다.
/// `dividends`, `stock_splits` 열이 없으면 0으로 채웁니다.
pub fn normalize_stock_table(table: &RawPriceTable) -> PipelineResult<Vec<StockRecord>> {
    let index: HashMap<String, usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| (normalize_column_name(c), i))
        .collect();

    let missing: Vec<&str> = REQUIRED_PRICE_COLUMNS
        .iter()
        .copied()
        .filter(|c| !index.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::ShapeMismatch(format!(
            "주가 테이블에 필수 열이 없습니다: {}",
            missing.join(", ")
        )));
    }

    let column = |name: &str| index.get(name).copied();
    let (open, high, low, close, volume) = (
        index["open"],
        index["high"],
        index["low"],
        index["close"],
        index["volume"],
    );
    let dividends = column("dividends");
    let stock_splits = column("stock_splits");

    table
        .rows()
        .iter()
        .map(|row| {
            let volume_value = row.values[volume];
            if !volume_value.is_finite() || volume_value < 0.0 {
                return Err(PipelineError::ShapeMismatch(format!(
                    "{} 거래량이 유효하지 않습니다: {}",
                    row.timestamp, volume_value
                )));
            }
            Ok(StockRecord {
                date: row.timestamp.date_naive(),
                open: row.values[open],
                high: row.values[high],
                low: row.values[low],
                close: row.values[close],
                volume: volume_value.round() as i64,
                dividends: dividends.map_or(0.0, |i| row.values[i]),
                stock_splits: stock_splits.map_or(0.0, |i| row.values[i]),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawPriceRow, WideTrendRow};
    use chrono::{DateTime, NaiveDate};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[test]
    fn test_reshape_two_dates_three_keywords() {
        let table = WideTrendTable::new(
            vec!["Cetilar".into(), "Ultra Mag".into(), "sideral".into()],
            vec![
                WideTrendRow {
                    date: date(1),
                    values: vec![10, 0, 55],
                    is_partial: false,
                },
                WideTrendRow {
                    date: date(2),
                    values: vec![12, 3, 60],
                    is_partial: true,
                },
            ],
        )
        .unwrap();

        let records = reshape_wide_to_long(&table).unwrap();

        assert_eq!(records.len(), 6);
        assert_eq!(records[1].keyword, "ultra_mag");
        assert_eq!(records[0].keyword, "cetilar");
        assert!(records
            .iter()
            .filter(|r| r.date == date(1))
            .all(|r| !r.is_partial));
        assert!(records
            .iter()
            .filter(|r| r.date == date(2))
            .all(|r| r.is_partial));
        assert_eq!(records[5].daily_search_amount, 60);
    }

    #[test]
    fn test_reshape_empty_table() {
        let table = WideTrendTable::empty(vec!["a".into()]);
        assert!(reshape_wide_to_long(&table).unwrap().is_empty());
    }

    #[test]
    fn test_reshape_rejects_colliding_keywords() {
        let table = WideTrendTable::new(
            vec!["Ultra Mag".into(), "ultra_mag".into()],
            vec![WideTrendRow {
                date: date(1),
                values: vec![1, 2],
                is_partial: false,
            }],
        )
        .unwrap();
        assert!(matches!(
            reshape_wide_to_long(&table),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }

    fn yahoo_columns() -> Vec<String> {
        ["Open", "High", "Low", "Close", "Volume", "Dividends", "Stock Splits"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_normalize_stock_table_drops_time_and_zone() {
        let ts = DateTime::parse_from_rfc3339("2025-09-02T23:30:00+02:00").unwrap();
        let table = RawPriceTable::new(
            yahoo_columns(),
            vec![RawPriceRow {
                timestamp: ts,
                values: vec![10.0, 11.0, 9.5, 10.5, 12345.0, 0.0, 0.0],
            }],
        )
        .unwrap();

        let records = normalize_stock_table(&table).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, date(2));
        assert_eq!(records[0].close, 10.5);
        assert_eq!(records[0].volume, 12345);
    }

    #[test]
    fn test_normalize_stock_table_missing_column() {
        let table = RawPriceTable::new(vec!["Open".into(), "Close".into()], vec![]).unwrap();
        assert!(matches!(
            normalize_stock_table(&table),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_normalize_stock_table_defaults_optional_columns() {
        let ts = DateTime::parse_from_rfc3339("2025-09-03T07:00:00+00:00").unwrap();
        let table = RawPriceTable::new(
            vec!["Open".into(), "High".into(), "Low".into(), "Close".into(), "Volume".into()],
            vec![RawPriceRow {
                timestamp: ts,
                values: vec![1.0, 2.0, 0.5, 1.5, 100.0],
            }],
        )
        .unwrap();

        let records = normalize_stock_table(&table).unwrap();
        assert_eq!(records[0].dividends, 0.0);
        assert_eq!(records[0].stock_splits, 0.0);
    }
}
