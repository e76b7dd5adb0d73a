//! Analytics service layer
//!
//! 点击明细实时聚合：按链接、按账户、以及管理后台的全站统计。
//! 聚合在 Rust 侧完成（见 `crate::analytics::aggregate`），SQL 只负责按时间窗口取行，
//! 因此三种数据库后端行为一致。

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::analytics::aggregate::{
    browser_buckets, daily_series, device_buckets, geo_buckets, window_start,
};
use crate::analytics::{BrowserBucket, ClickPoint, DeviceBucket, GeoBucket};
use crate::errors::{CondensrError, Result};
use crate::storage::{ClickRow, Link, SeaOrmStorage, User};
use crate::system::host_stats::{HostSnapshot, host_snapshot};
use crate::utils::round2;

pub const DEFAULT_LINK_DAYS: u32 = 30;
pub const MAX_LINK_DAYS: u32 = 365;
/// 账户总览允许的时间窗口
pub const OVERVIEW_PERIODS: [u32; 4] = [7, 30, 90, 365];
pub const TOP_LINKS_LIMIT: u64 = 5;

/// Per-link analytics shown on the link detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAnalytics {
    pub days: u32,
    pub total_clicks: i64,
    pub period_clicks: u64,
    pub clicks_data: Vec<ClickPoint>,
    pub geo_data: Vec<GeoBucket>,
    pub device_data: Vec<DeviceBucket>,
    pub browser_data: Vec<BrowserBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLink {
    pub id: String,
    pub short_code: String,
    pub alias: Option<String>,
    pub original_url: String,
    pub clicks: i64,
}

impl From<Link> for TopLink {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            short_code: link.short_code,
            alias: link.alias,
            original_url: link.original_url,
            clicks: link.clicks,
        }
    }
}

/// Account-wide roll-up for the analytics page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOverview {
    pub days: u32,
    pub total_links: u64,
    pub total_clicks: u64,
    pub period_clicks: u64,
    pub clicks_data: Vec<ClickPoint>,
    pub geo_data: Vec<GeoBucket>,
    pub device_data: Vec<DeviceBucket>,
    pub browser_data: Vec<BrowserBucket>,
    pub top_links: Vec<TopLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_users: u64,
    pub total_links: u64,
    pub total_clicks: u64,
    pub active_links_today: u64,
    pub average_click_rate: f64,
    pub system_usage: HostSnapshot,
}

/// Series and buckets computed from one window of click rows
struct Breakdown {
    period_clicks: u64,
    clicks_data: Vec<ClickPoint>,
    geo_data: Vec<GeoBucket>,
    device_data: Vec<DeviceBucket>,
    browser_data: Vec<BrowserBucket>,
}

impl Breakdown {
    fn from_rows(rows: &[ClickRow], days: u32, today: NaiveDate) -> Self {
        Self {
            period_clicks: rows.len() as u64,
            clicks_data: daily_series(rows, days, today),
            geo_data: geo_buckets(rows),
            device_data: device_buckets(rows),
            browser_data: browser_buckets(rows),
        }
    }
}

/// Total clicks / total links, two decimals, zero without links
pub fn average_click_rate(total_clicks: u64, total_links: u64) -> f64 {
    if total_links == 0 {
        return 0.0;
    }
    round2(total_clicks as f64 / total_links as f64)
}

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    async fn breakdown(&self, link_ids: &[String], days: u32) -> Result<Breakdown> {
        let today = Utc::now().date_naive();
        let rows = self
            .storage
            .click_rows(Some(link_ids), window_start(today, days))
            .await?;
        debug!(
            "AnalyticsService: {} click rows for {} links over {} days",
            rows.len(),
            link_ids.len(),
            days
        );
        Ok(Breakdown::from_rows(&rows, days, today))
    }

    /// 单链接统计，`days` 缺省 30，允许 1..=365
    pub async fn link_analytics(&self, link: &Link, days: Option<u32>) -> Result<LinkAnalytics> {
        let days = days.unwrap_or(DEFAULT_LINK_DAYS);
        if days == 0 || days > MAX_LINK_DAYS {
            return Err(CondensrError::analytics_invalid_period(format!(
                "days must be between 1 and {}, got {}",
                MAX_LINK_DAYS, days
            )));
        }

        let b = self.breakdown(std::slice::from_ref(&link.id), days).await?;
        Ok(LinkAnalytics {
            days,
            total_clicks: link.clicks,
            period_clicks: b.period_clicks,
            clicks_data: b.clicks_data,
            geo_data: b.geo_data,
            device_data: b.device_data,
            browser_data: b.browser_data,
        })
    }

    /// 账户总览，`days` 只能是 7 / 30 / 90 / 365
    pub async fn account_overview(&self, owner: &User, days: Option<u32>) -> Result<AccountOverview> {
        let days = days.unwrap_or(DEFAULT_LINK_DAYS);
        if !OVERVIEW_PERIODS.contains(&days) {
            return Err(CondensrError::analytics_invalid_period(format!(
                "days must be one of 7, 30, 90, 365, got {}",
                days
            )));
        }

        let totals = self.storage.link_totals(Some(&owner.id)).await?;
        let link_ids = self.storage.link_ids_by_owner(&owner.id).await?;
        let b = self.breakdown(&link_ids, days).await?;
        let top_links = self
            .storage
            .top_links(Some(&owner.id), TOP_LINKS_LIMIT)
            .await?
            .into_iter()
            .map(TopLink::from)
            .collect();

        Ok(AccountOverview {
            days,
            total_links: totals.total_links,
            total_clicks: totals.total_clicks,
            period_clicks: b.period_clicks,
            clicks_data: b.clicks_data,
            geo_data: b.geo_data,
            device_data: b.device_data,
            browser_data: b.browser_data,
            top_links,
        })
    }

    /// 管理后台全站统计
    pub async fn system_stats(&self) -> Result<SystemStats> {
        let total_users = self.storage.count_users().await?;
        let totals = self.storage.link_totals(None).await?;
        let midnight = window_start(Utc::now().date_naive(), 1);
        let active_links_today = self.storage.links_clicked_since(midnight).await?;

        // sysinfo 会阻塞（CPU 采样），放到 blocking 线程
        let system_usage = tokio::task::spawn_blocking(host_snapshot)
            .await
            .map_err(|e| CondensrError::file_operation(format!("host snapshot failed: {}", e)))?;

        Ok(SystemStats {
            total_users,
            total_links: totals.total_links,
            total_clicks: totals.total_clicks,
            active_links_today,
            average_click_rate: average_click_rate(totals.total_clicks, totals.total_links),
            system_usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_click_rate() {
        assert_eq!(average_click_rate(0, 0), 0.0);
        assert_eq!(average_click_rate(10, 4), 2.5);
        assert_eq!(average_click_rate(10, 3), 3.33);
    }

    #[test]
    fn test_breakdown_empty_window() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let b = Breakdown::from_rows(&[], 7, today);
        assert_eq!(b.period_clicks, 0);
        assert_eq!(b.clicks_data.len(), 7);
        assert_eq!(b.clicks_data[6].date, "2026-10-16");
        assert!(b.geo_data.is_empty());
        assert_eq!(b.device_data.len(), 3);
        assert!(b.device_data.iter().all(|d| d.percentage == 0.0));
    }
}
