use crate::chart::ValueAtTime;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 算術平均。空なら None
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// 新しい順に並んだ値のうち先頭 `count` 件の平均
///
/// 件数が `count` に満たない場合はある分だけで平均する。
pub fn rolling_mean(newest_first: &[f64], count: usize) -> Option<f64> {
    let n = count.min(newest_first.len());
    mean(&newest_first[..n])
}

/// チャートページに添える要約値
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub last_time: NaiveDateTime,
    pub average_value: f64,
    pub average_count: usize,
}

impl Summary {
    /// 新しい順の系列から最新時刻と直近 `count` 件の平均を求める
    pub fn of(newest_first: &[ValueAtTime], count: usize) -> Option<Self> {
        let latest = newest_first.first()?;
        let values: Vec<f64> = newest_first.iter().map(|v| v.value).collect();
        let average_value = rolling_mean(&values, count)?;
        Some(Self {
            last_time: latest.time,
            average_value,
            average_count: count.min(values.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
        assert_eq!(rolling_mean(&[], 5), None);
    }

    #[test]
    fn test_rolling_mean_takes_newest() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0, 1000.0, 2000.0];
        assert_eq!(rolling_mean(&values, 5), Some(30.0));
    }

    #[test]
    fn test_rolling_mean_short_series() {
        assert_eq!(rolling_mean(&[3.0, 5.0], 5), Some(4.0));
    }

    #[test]
    fn test_summary_of_empty_is_none() {
        assert_eq!(Summary::of(&[], 5), None);
    }

    #[test]
    fn test_summary_uses_first_point_as_last_time() {
        let t = base_time();
        let points: Vec<ValueAtTime> = (0..8)
            .map(|i| ValueAtTime {
                time: t - Duration::minutes(i),
                value: i as f64,
            })
            .collect();

        let summary = Summary::of(&points, 5).unwrap();
        assert_eq!(summary.last_time, t);
        assert_eq!(summary.average_value, 2.0);
        assert_eq!(summary.average_count, 5);
    }

    proptest! {
        #[test]
        fn prop_mean_is_bounded(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let m = mean(&values).unwrap();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= min - 1e-6 && m <= max + 1e-6);
        }

        #[test]
        fn prop_rolling_mean_matches_prefix(
            values in prop::collection::vec(-1.0e3f64..1.0e3, 1..32),
            count in 1usize..10,
        ) {
            let n = count.min(values.len());
            let expected = values[..n].iter().sum::<f64>() / n as f64;
            let actual = rolling_mean(&values, count).unwrap();
            prop_assert!((actual - expected).abs() < 1e-9);
        }
    }
}
