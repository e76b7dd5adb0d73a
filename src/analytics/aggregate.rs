//! Roll-ups of raw click rows into the dashboard series and buckets.
//!
//! Percentages use largest-remainder apportionment on tenths of a percent,
//! so a non-empty bucket list always adds up to exactly 100.0.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::storage::ClickRow;
use crate::utils::device::DeviceType;

pub const TOP_BUCKETS: usize = 4;
pub const OTHER_LABEL: &str = "Other";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickPoint {
    /// YYYY-MM-DD
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoBucket {
    pub country: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceBucket {
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowserBucket {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

/// Percentages (one decimal) for `counts`; all zero when the total is zero
pub fn apportion_percentages(counts: &[u64]) -> Vec<f64> {
    const UNITS: u64 = 1000;

    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }

    let mut units: Vec<u64> = Vec::with_capacity(counts.len());
    let mut remainders: Vec<(usize, u64)> = Vec::with_capacity(counts.len());
    for (i, &count) in counts.iter().enumerate() {
        let scaled = count as u128 * UNITS as u128;
        units.push((scaled / total as u128) as u64);
        remainders.push((i, (scaled % total as u128) as u64));
    }

    let assigned: u64 = units.iter().sum();
    // 余数大的优先，余数相同按原顺序
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (i, _) in remainders.into_iter().take((UNITS - assigned) as usize) {
        units[i] += 1;
    }

    units.into_iter().map(|u| u as f64 / 10.0).collect()
}

/// First instant of the window covering the last `days` days, today inclusive
pub fn window_start(today: NaiveDate, days: u32) -> DateTime<Utc> {
    let first_day = today - Duration::days(i64::from(days.max(1)) - 1);
    first_day.and_time(NaiveTime::MIN).and_utc()
}

/// Zero-filled daily click series ending at `today`
pub fn daily_series(rows: &[ClickRow], days: u32, today: NaiveDate) -> Vec<ClickPoint> {
    let days = days.max(1);
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for row in rows {
        *per_day.entry(row.clicked_at.date_naive()).or_insert(0) += 1;
    }

    (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            ClickPoint {
                date: date.format("%Y-%m-%d").to_string(),
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Count by label, keep the top `TOP_BUCKETS`, fold the rest into "Other"
fn top_with_other<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut sorted: Vec<(&str, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let other: u64 = sorted.iter().skip(TOP_BUCKETS).map(|(_, c)| c).sum();
    let mut buckets: Vec<(String, u64)> = sorted
        .into_iter()
        .take(TOP_BUCKETS)
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    if other > 0 {
        buckets.push((OTHER_LABEL.to_string(), other));
    }
    buckets
}

fn country_label(country: Option<&str>) -> &str {
    country
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_COUNTRY)
}

pub fn geo_buckets(rows: &[ClickRow]) -> Vec<GeoBucket> {
    let buckets = top_with_other(rows.iter().map(|r| country_label(r.country.as_deref())));
    let counts: Vec<u64> = buckets.iter().map(|(_, c)| *c).collect();

    buckets
        .into_iter()
        .zip(apportion_percentages(&counts))
        .map(|((country, count), percentage)| GeoBucket {
            country,
            count,
            percentage,
        })
        .collect()
}

pub fn browser_buckets(rows: &[ClickRow]) -> Vec<BrowserBucket> {
    let buckets = top_with_other(rows.iter().map(|r| r.browser.as_str()));
    let counts: Vec<u64> = buckets.iter().map(|(_, c)| *c).collect();

    buckets
        .into_iter()
        .zip(apportion_percentages(&counts))
        .map(|((name, count), percentage)| BrowserBucket {
            name,
            count,
            percentage,
        })
        .collect()
}

/// Always Desktop, Mobile, Tablet in that order; unrecognized rows count as Desktop
pub fn device_buckets(rows: &[ClickRow]) -> Vec<DeviceBucket> {
    let mut counts = [0u64; 3];
    for row in rows {
        let device = row.device_type.parse().unwrap_or(DeviceType::Desktop);
        let index = DeviceType::ALL
            .iter()
            .position(|d| *d == device)
            .unwrap_or(0);
        counts[index] += 1;
    }

    DeviceType::ALL
        .into_iter()
        .zip(counts)
        .zip(apportion_percentages(&counts))
        .map(|((device_type, count), percentage)| DeviceBucket {
            device_type,
            count,
            percentage,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(day: u32, country: Option<&str>, device: &str, browser: &str) -> ClickRow {
        ClickRow {
            link_id: "l1".into(),
            clicked_at: Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap(),
            country: country.map(str::to_string),
            device_type: device.into(),
            browser: browser.into(),
        }
    }

    fn units_sum(percentages: &[f64]) -> i64 {
        percentages.iter().map(|p| (p * 10.0).round() as i64).sum()
    }

    #[test]
    fn test_apportion_sums_to_hundred() {
        let p = apportion_percentages(&[1, 1, 1]);
        assert_eq!(p, vec![33.4, 33.3, 33.3]);
        assert_eq!(units_sum(&p), 1000);

        let p = apportion_percentages(&[7, 3, 1, 1, 1, 1]);
        assert_eq!(units_sum(&p), 1000);

        assert_eq!(apportion_percentages(&[0, 0]), vec![0.0, 0.0]);
        assert!(apportion_percentages(&[]).is_empty());
    }

    #[test]
    fn test_apportion_single_bucket() {
        assert_eq!(apportion_percentages(&[42]), vec![100.0]);
    }

    #[test]
    fn test_daily_series_zero_fills() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let rows = vec![
            row(14, None, "Desktop", "Chrome"),
            row(16, None, "Desktop", "Chrome"),
            row(16, None, "Desktop", "Chrome"),
        ];

        let series = daily_series(&rows, 3, today);
        assert_eq!(
            series,
            vec![
                ClickPoint { date: "2026-10-14".into(), count: 1 },
                ClickPoint { date: "2026-10-15".into(), count: 0 },
                ClickPoint { date: "2026-10-16".into(), count: 2 },
            ]
        );
        assert_eq!(daily_series(&[], 30, today).len(), 30);
    }

    #[test]
    fn test_window_start() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            window_start(today, 7),
            Utc.with_ymd_and_hms(2026, 10, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            window_start(today, 1),
            Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_geo_top_four_plus_other() {
        let mut rows = Vec::new();
        for (country, n) in [("BR", 5), ("US", 4), ("PT", 3), ("DE", 2), ("FR", 1), ("JP", 1)] {
            for _ in 0..n {
                rows.push(row(16, Some(country), "Desktop", "Chrome"));
            }
        }
        rows.push(row(16, None, "Desktop", "Chrome"));

        let geo = geo_buckets(&rows);
        let labels: Vec<&str> = geo.iter().map(|b| b.country.as_str()).collect();
        assert_eq!(labels, vec!["BR", "US", "PT", "DE", "Other"]);
        assert_eq!(geo[4].count, 3);
        assert_eq!(
            units_sum(&geo.iter().map(|b| b.percentage).collect::<Vec<_>>()),
            1000
        );
    }

    #[test]
    fn test_unknown_country() {
        let rows = vec![row(16, None, "Mobile", "Safari"), row(16, Some(" "), "Mobile", "Safari")];
        let geo = geo_buckets(&rows);
        assert_eq!(geo.len(), 1);
        assert_eq!(geo[0].country, UNKNOWN_COUNTRY);
        assert_eq!(geo[0].percentage, 100.0);
    }

    #[test]
    fn test_device_buckets_always_three() {
        let empty = device_buckets(&[]);
        let types: Vec<DeviceType> = empty.iter().map(|b| b.device_type).collect();
        assert_eq!(types, DeviceType::ALL.to_vec());
        assert!(empty.iter().all(|b| b.count == 0 && b.percentage == 0.0));

        let rows = vec![
            row(16, None, "Mobile", "Safari"),
            row(16, None, "Mobile", "Safari"),
            row(16, None, "Tablet", "Safari"),
            row(16, None, "Desktop", "Firefox"),
        ];
        let buckets = device_buckets(&rows);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].percentage, 50.0);
        assert_eq!(buckets[2].percentage, 25.0);
    }

    #[test]
    fn test_browser_buckets() {
        let rows = vec![
            row(16, None, "Desktop", "Chrome"),
            row(16, None, "Desktop", "Chrome"),
            row(16, None, "Desktop", "Firefox"),
        ];
        let browsers = browser_buckets(&rows);
        assert_eq!(browsers[0].name, "Chrome");
        assert_eq!(browsers[0].percentage, 66.7);
        assert_eq!(browsers[1].percentage, 33.3);
    }

    #[test]
    fn test_bucket_json_shape() {
        let json = serde_json::to_value(device_buckets(&[])).unwrap();
        assert_eq!(json[0]["type"], "Desktop");
        assert_eq!(json[2]["type"], "Tablet");
    }
}
