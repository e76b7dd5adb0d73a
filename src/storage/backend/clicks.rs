//! Click event persistence and the raw reads behind the aggregator

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use tracing::debug;

use super::{SeaOrmStorage, retry};
use crate::analytics::ClickSink;
use crate::errors::Result;
use crate::storage::models::{ClickRow, NewClickEvent};

use migration::entities::click_event;

/// SQLite caps bound parameters per statement; insert in chunks
const INSERT_CHUNK: usize = 500;

#[async_trait]
impl ClickSink for SeaOrmStorage {
    async fn write_events(&self, events: Vec<NewClickEvent>) -> anyhow::Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let total = events.len();
        let db = &self.db;

        let batches: Vec<Vec<click_event::ActiveModel>> = events
            .chunks(INSERT_CHUNK)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|event| click_event::ActiveModel {
                        link_id: Set(event.link_id.clone()),
                        clicked_at: Set(event.clicked_at),
                        country: Set(event.country.clone()),
                        device_type: Set(event.device.as_str().to_string()),
                        browser: Set(event.browser.clone()),
                        referrer: Set(event.referrer.clone()),
                        ip_hash: Set(event.ip_hash.clone()),
                        ..Default::default()
                    })
                    .collect()
            })
            .collect();

        // 全部分块在同一事务内提交，失败时整批回滚
        retry::with_retry("write_click_events", self.retry_config, || async {
            let txn = db.begin().await?;
            for models in &batches {
                click_event::Entity::insert_many(models.clone()).exec(&txn).await?;
            }
            txn.commit().await
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to insert click events: {}", e))?;

        debug!(
            "Click events flushed to {} database ({} records)",
            self.backend_name.to_uppercase(),
            total
        );
        Ok(())
    }
}

impl SeaOrmStorage {
    /// Clicks since `since` for the given links; `None` reads every link
    pub async fn click_rows(
        &self,
        link_ids: Option<&[String]>,
        since: DateTime<Utc>,
    ) -> Result<Vec<ClickRow>> {
        if link_ids.is_some_and(|ids| ids.is_empty()) {
            return Ok(Vec::new());
        }

        let db = &self.db;
        let rows: Vec<(String, DateTime<Utc>, Option<String>, String, String)> =
            retry::with_retry("click_rows", self.retry_config, || async {
                let mut query = click_event::Entity::find()
                    .select_only()
                    .column(click_event::Column::LinkId)
                    .column(click_event::Column::ClickedAt)
                    .column(click_event::Column::Country)
                    .column(click_event::Column::DeviceType)
                    .column(click_event::Column::Browser)
                    .filter(click_event::Column::ClickedAt.gte(since));
                if let Some(ids) = link_ids {
                    query = query.filter(click_event::Column::LinkId.is_in(ids.iter().cloned()));
                }
                query.into_tuple().all(db).await
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(link_id, clicked_at, country, device_type, browser)| ClickRow {
                    link_id,
                    clicked_at,
                    country,
                    device_type,
                    browser,
                },
            )
            .collect())
    }

    /// 自 `since` 起至少有一次点击的链接数
    pub async fn links_clicked_since(&self, since: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;
        let ids: Vec<String> = retry::with_retry("links_clicked_since", self.retry_config, || async {
            click_event::Entity::find()
                .select_only()
                .column(click_event::Column::LinkId)
                .filter(click_event::Column::ClickedAt.gte(since))
                .distinct()
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await?;

        Ok(ids.len() as u64)
    }

    pub(crate) async fn delete_click_events_for(&self, link_ids: &[String]) -> Result<u64> {
        if link_ids.is_empty() {
            return Ok(0);
        }

        let db = &self.db;
        let result = retry::with_retry("delete_click_events", self.retry_config, || async {
            click_event::Entity::delete_many()
                .filter(click_event::Column::LinkId.is_in(link_ids.iter().cloned()))
                .exec(db)
                .await
        })
        .await?;

        Ok(result.rows_affected)
    }
}
