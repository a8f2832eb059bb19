//! Range and time bucket partitioning

use crate::dates::{day_end, day_start};
use crate::{Result, ToolingError};
use chrono::{Duration, NaiveDateTime};

/// Split `[min, max)` into `partitions` equal-width labelled ranges
///
/// Every range is labelled `"start ~ end"` except the last, which is
/// labelled `">= start"`.
///
/// ```rust
/// use tooling::partition::range_partition;
///
/// let labels = range_partition(100.0, 4, 0.0);
/// assert_eq!(labels, ["0.0 ~ 25.0", "25.0 ~ 50.0", "50.0 ~ 75.0", ">= 75.0"]);
/// ```
pub fn range_partition(max: f64, partitions: usize, min: f64) -> Vec<String> {
    if partitions == 0 {
        return Vec::new();
    }

    let interval = (max - min) / partitions as f64;
    (0..partitions)
        .map(|i| {
            let start = min + interval * i as f64;
            if i + 1 < partitions {
                format!("{:.1} ~ {:.1}", start, min + interval * (i + 1) as f64)
            } else {
                format!(">= {:.1}", start)
            }
        })
        .collect()
}

/// Time buckets every `freq_secs` seconds covering whole days
///
/// Buckets start at midnight of the day `start` falls on and stop before
/// midnight of the day after `end`.
pub fn date_partition(freq_secs: i64, start: &str, end: &str, format: &str) -> Result<Vec<NaiveDateTime>> {
    if freq_secs <= 0 {
        return Err(ToolingError::Config(format!(
            "Partition frequency must be positive, got {}",
            freq_secs
        )));
    }

    let step = Duration::seconds(freq_secs);
    let stop = day_end(end, format)?;
    let mut cursor = day_start(start, format)?;
    let mut buckets = Vec::new();
    while cursor < stop {
        buckets.push(cursor);
        cursor += step;
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{parse_datetime, STD_DAY, STD_SECONDS};

    #[test]
    fn test_range_partition_with_min() {
        let labels = range_partition(10.0, 2, 4.0);
        assert_eq!(labels, ["4.0 ~ 7.0", ">= 7.0"]);
    }

    #[test]
    fn test_range_partition_last_is_open_despite_drift() {
        let labels = range_partition(10.0, 11, 0.0);
        assert_eq!(labels.len(), 11);
        assert_eq!(labels[9], "8.2 ~ 9.1");
        assert_eq!(labels[10], ">= 9.1");

        for (max, partitions, min) in [(10.0, 15, 0.0), (0.9, 3, 0.0), (3.3, 6, 0.0), (1.1, 13, 0.0)] {
            let labels = range_partition(max, partitions, min);
            assert_eq!(labels.len(), partitions);
            assert!(labels[partitions - 1].starts_with(">= "), "{:?}", labels);
            assert!(labels[..partitions - 1].iter().all(|l| l.contains(" ~ ")), "{:?}", labels);
        }
    }

    #[test]
    fn test_range_partition_zero() {
        assert!(range_partition(10.0, 0, 0.0).is_empty());
    }

    #[test]
    fn test_date_partition_hourly() {
        let buckets = date_partition(3600, "2024-03-01 13:20:00", "2024-03-01 18:00:00", STD_SECONDS).unwrap();
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[0], parse_datetime("2024-03-01", STD_DAY).unwrap());
        assert_eq!(buckets[23], parse_datetime("2024-03-01 23:00:00", STD_SECONDS).unwrap());
    }

    #[test]
    fn test_date_partition_rejects_zero_freq() {
        assert!(date_partition(0, "2024-03-01", "2024-03-02", STD_DAY).is_err());
    }
}
