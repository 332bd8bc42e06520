//! 날짜 구간 및 구간 분할.
//!
//! Google Trends는 90일을 초과하는 구간에 대해 일 단위 데이터를 반환하지 않으므로,
//! 임의 구간을 최대 `window`일 길이의 연속된 하위 구간으로 나눠서 조회합니다.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// 외부 트렌드 API가 일 단위로 반환하는 최대 조회 일수.
pub const DEFAULT_WINDOW_DAYS: u32 = 90;

/// 양 끝을 포함하는 날짜 구간 (`lower <= upper`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    lower: NaiveDate,
    upper: NaiveDate,
}

impl DateInterval {
    /// 새 구간 생성. `lower > upper`이면 `InvalidRange`.
    pub fn new(lower: NaiveDate, upper: NaiveDate) -> PipelineResult<Self> {
        if lower > upper {
            return Err(PipelineError::InvalidRange(format!(
                "시작일({lower})이 종료일({upper})보다 늦습니다"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// 하루짜리 구간.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            lower: day,
            upper: day,
        }
    }

    /// `upper`로 끝나고 `lookback_days`일 전부터 시작하는 구간.
    pub fn trailing(upper: NaiveDate, lookback_days: u32) -> PipelineResult<Self> {
        let lower = upper
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .ok_or_else(|| {
                PipelineError::InvalidRange(format!("{upper}에서 {lookback_days}일 이전 날짜 계산 불가"))
            })?;
        Self::new(lower, upper)
    }

    pub fn lower(&self) -> NaiveDate {
        self.lower
    }

    pub fn upper(&self) -> NaiveDate {
        self.upper
    }

    /// 양 끝을 포함한 일수.
    pub fn days(&self) -> i64 {
        (self.upper - self.lower).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lower <= date && date <= self.upper
    }

    /// 트렌드 API timeframe 파라미터 (`"YYYY-MM-DD YYYY-MM-DD"`).
    pub fn timeframe(&self) -> String {
        format!(
            "{} {}",
            self.lower.format("%Y-%m-%d"),
            self.upper.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.lower, self.upper)
    }
}

/// `[lower, upper]`를 최대 `window`일 길이의 연속 하위 구간으로 분할합니다.
///
/// 반환되는 구간들은 겹치지 않고 빈틈 없이 이어지며, 마지막 구간의 종료일은
/// 항상 `upper`와 같습니다.
///
/// # Errors
///
/// `lower > upper`이거나 `window == 0`이면 `InvalidRange`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use trendwatch_core::partition;
///
/// let lower = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let upper = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
/// let intervals = partition(lower, upper, 90).unwrap();
/// assert_eq!(intervals.len(), 2);
/// assert_eq!(intervals[1].upper(), upper);
/// ```
pub fn partition(lower: NaiveDate, upper: NaiveDate, window: u32) -> PipelineResult<Vec<DateInterval>> {
    if window == 0 {
        return Err(PipelineError::InvalidRange(
            "구간 길이(window)는 1일 이상이어야 합니다".to_string(),
        ));
    }
    let full = DateInterval::new(lower, upper)?;

    if full.days() < i64::from(window) {
        return Ok(vec![full]);
    }

    let mut intervals = Vec::with_capacity((full.days() / i64::from(window) + 1) as usize);
    let mut cursor = lower;
    loop {
        let end = cursor
            .checked_add_days(Days::new(u64::from(window) - 1))
            .map_or(upper, |d| d.min(upper));
        intervals.push(DateInterval { lower: cursor, upper: end });

        match end.succ_opt() {
            Some(next) if next <= upper => cursor = next,
            _ => break,
        }
    }

    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_partition_single_day() {
        let d = date(2025, 8, 21);
        for window in [1, 7, 90] {
            let intervals = partition(d, d, window).unwrap();
            assert_eq!(intervals, vec![DateInterval::single(d)]);
        }
    }

    #[test]
    fn test_partition_two_windows() {
        let intervals = partition(date(2025, 1, 1), date(2025, 4, 15), 90).unwrap();

        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].lower(), date(2025, 1, 1));
        assert_eq!(intervals[0].upper(), date(2025, 3, 31));
        assert_eq!(intervals[0].days(), 90);
        assert_eq!(intervals[1].lower(), date(2025, 4, 1));
        assert_eq!(intervals[1].upper(), date(2025, 4, 15));
    }

    #[test]
    fn test_partition_shorter_than_window() {
        let intervals = partition(date(2025, 8, 27), date(2025, 9, 2), 90).unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].timeframe(), "2025-08-27 2025-09-02");
    }

    #[test]
    fn test_partition_exact_multiple() {
        // 180일 = 90일 구간 2개
        let lower = date(2025, 1, 1);
        let upper = lower + chrono::Duration::days(179);
        let intervals = partition(lower, upper, 90).unwrap();
        assert_eq!(intervals.len(), 2);
        assert!(intervals.iter().all(|i| i.days() == 90));
    }

    #[test]
    fn test_partition_rejects_inverted_range() {
        let err = partition(date(2025, 2, 1), date(2025, 1, 1), 90).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRange(_)));
    }

    #[test]
    fn test_partition_rejects_zero_window() {
        let d = date(2025, 1, 1);
        assert!(matches!(
            partition(d, d, 0),
            Err(PipelineError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_trailing_interval() {
        let interval = DateInterval::trailing(date(2025, 9, 2), 1).unwrap();
        assert_eq!(interval.lower(), date(2025, 9, 1));
        assert_eq!(interval.days(), 2);
    }

    proptest! {
        #[test]
        fn prop_partition_covers_range_exactly_once(
            start_offset in 0i64..20_000,
            span in 0i64..1_500,
            window in 1u32..400,
        ) {
            let lower = date(1990, 1, 1) + chrono::Duration::days(start_offset);
            let upper = lower + chrono::Duration::days(span);
            let intervals = partition(lower, upper, window).unwrap();

            prop_assert!(!intervals.is_empty());
            prop_assert_eq!(intervals[0].lower(), lower);
            prop_assert_eq!(intervals.last().unwrap().upper(), upper);

            let total: i64 = intervals.iter().map(|i| i.days()).sum();
            prop_assert_eq!(total, span + 1);

            for interval in &intervals {
                prop_assert!(interval.lower() <= interval.upper());
                prop_assert!(interval.days() <= i64::from(window));
            }
            for pair in intervals.windows(2) {
                prop_assert_eq!(pair[0].upper().succ_opt().unwrap(), pair[1].lower());
            }
        }
    }
}
