//! Link queries and mutations

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ExprTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
    sea_query::{Expr, Func},
};
use tracing::{debug, info, warn};

use super::converters::{link_to_active_model, model_to_link};
use super::{SeaOrmStorage, contains_pattern, retry};
use crate::errors::{CondensrError, Result};
use crate::storage::models::{Link, LinkListQuery, LinkSortBy, LinkTotals, SortOrder};

use migration::entities::link;

#[derive(Debug, FromQueryResult)]
struct TotalsResult {
    total_links: i64,
    total_clicks: Option<i64>,
}

/// Result of claiming a link's public codes on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The generated shortCode is already some link's shortCode or alias
    ShortCodeTaken,
    AliasTaken,
}

/// Owner scope: `None` means every owner (admin views and system stats)
fn owner_condition(owner_id: Option<&str>) -> Condition {
    match owner_id {
        Some(owner) => Condition::all().add(link::Column::OwnerId.eq(owner)),
        None => Condition::all(),
    }
}

/// Case-insensitive substring match on destination, shortCode or alias
fn search_condition(search: &str) -> Condition {
    let pattern = contains_pattern(search);
    let lower_like =
        |col: link::Column| Expr::expr(Func::lower(Expr::col(col))).like(pattern.clone());

    Condition::any()
        .add(lower_like(link::Column::OriginalUrl))
        .add(lower_like(link::Column::ShortCode))
        .add(lower_like(link::Column::Alias))
}

/// shortCode 与 alias 共用一个命名空间
fn code_condition(code: &str, exclude_id: Option<&str>) -> Condition {
    let mut condition = Condition::all().add(
        Condition::any()
            .add(link::Column::ShortCode.eq(code))
            .add(link::Column::Alias.eq(code)),
    );
    if let Some(id) = exclude_id {
        condition = condition.add(link::Column::Id.ne(id));
    }
    condition
}

async fn code_taken_on<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    exclude_id: Option<&str>,
) -> std::result::Result<bool, DbErr> {
    let count = link::Entity::find()
        .filter(code_condition(code, exclude_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// UNIQUE 冲突来自 alias 列还是 short_code 列（各后端的报错都带列名或索引名）
fn unique_violation_on_alias(err: &DbErr) -> Option<bool> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail.contains("alias")),
        _ => None,
    }
}

impl SeaOrmStorage {
    /// Insert a link, re-checking both public codes inside the transaction.
    ///
    /// A code already used by another link (in either column) is reported as
    /// an [`InsertOutcome`] instead of an error.
    pub async fn insert_link(&self, link: &Link) -> Result<InsertOutcome> {
        let db = &self.db;
        let model = link_to_active_model(link, true);

        let outcome = retry::with_retry(
            &format!("insert_link({})", link.short_code),
            self.retry_config,
            || async {
                let txn = db.begin().await?;

                if code_taken_on(&txn, &link.short_code, None).await? {
                    return Ok(InsertOutcome::ShortCodeTaken);
                }
                if let Some(alias) = link.alias.as_deref()
                    && code_taken_on(&txn, alias, None).await?
                {
                    return Ok(InsertOutcome::AliasTaken);
                }

                if let Err(e) = model.clone().insert(&txn).await {
                    return match unique_violation_on_alias(&e) {
                        Some(true) => Ok(InsertOutcome::AliasTaken),
                        Some(false) => Ok(InsertOutcome::ShortCodeTaken),
                        None => Err(e),
                    };
                }

                txn.commit().await?;
                Ok(InsertOutcome::Inserted)
            },
        )
        .await
        .map_err(|e| CondensrError::database_operation(format!("创建链接失败: {}", e)))?;

        match outcome {
            InsertOutcome::Inserted => {
                self.invalidate_count_cache();
                info!("Link created: {} -> {}", link.short_code, link.original_url);
            }
            conflict => warn!("Link insert conflict for {}: {:?}", link.short_code, conflict),
        }
        Ok(outcome)
    }

    /// Whether `code` is already used as any link's shortCode or alias
    pub async fn code_taken(&self, code: &str, exclude_id: Option<&str>) -> Result<bool> {
        let db = &self.db;
        let taken = retry::with_retry("code_taken", self.retry_config, || async {
            code_taken_on(db, code, exclude_id).await
        })
        .await?;

        Ok(taken)
    }

    pub async fn find_link(&self, id: &str) -> Result<Option<Link>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("find_link({})", id), self.retry_config, || async {
            link::Entity::find_by_id(id).one(db).await
        })
        .await?;

        Ok(model.map(model_to_link))
    }

    /// Resolve a public code: shortCode first, then alias
    pub async fn find_link_by_code(&self, code: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let by_short_code = retry::with_retry("find_link_by_code", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::ShortCode.eq(code))
                .one(db)
                .await
        })
        .await?;

        if let Some(model) = by_short_code {
            return Ok(Some(model_to_link(model)));
        }

        let by_alias = retry::with_retry("find_link_by_alias", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::Alias.eq(code))
                .one(db)
                .await
        })
        .await?;

        Ok(by_alias.map(model_to_link))
    }

    /// 分页查询（带 COUNT 缓存），page 从 1 开始
    pub async fn list_links(
        &self,
        owner_id: Option<&str>,
        query: &LinkListQuery,
    ) -> Result<(Vec<Link>, u64)> {
        let db = &self.db;

        let mut condition = owner_condition(owner_id);
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            condition = condition.add(search_condition(search));
        }

        let cache_key = format!("count:o={:?}:s={:?}", owner_id, query.search);
        let total = match self.count_cache.get(&cache_key) {
            Some(cached) => {
                debug!("count cache hit: key={}, value={}", cache_key, cached);
                cached
            }
            None => {
                let count = retry::with_retry("list_links(count)", self.retry_config, || async {
                    link::Entity::find().filter(condition.clone()).count(db).await
                })
                .await?;
                self.count_cache.insert(cache_key, count);
                count
            }
        };

        let column = match query.sort_by {
            LinkSortBy::CreatedAt => link::Column::CreatedAt,
            LinkSortBy::Clicks => link::Column::Clicks,
            LinkSortBy::OriginalUrl => link::Column::OriginalUrl,
            LinkSortBy::ShortCode => link::Column::ShortCode,
        };
        let order = match query.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let page_index = query.page.saturating_sub(1);
        let models = retry::with_retry("list_links(data)", self.retry_config, || async {
            link::Entity::find()
                .filter(condition.clone())
                .order_by(column, order.clone())
                // 稳定排序
                .order_by(link::Column::Id, Order::Asc)
                .paginate(db, query.page_size)
                .fetch_page(page_index)
                .await
        })
        .await?;

        Ok((models.into_iter().map(model_to_link).collect(), total))
    }

    /// Persist the editable fields of an existing link (clicks untouched).
    ///
    /// The alias is re-checked against both code columns inside the transaction.
    pub async fn update_link(&self, link: &Link) -> Result<()> {
        let db = &self.db;
        let model = link_to_active_model(link, false);

        let updated = retry::with_retry(&format!("update_link({})", link.id), self.retry_config, || async {
            let txn = db.begin().await?;

            if let Some(alias) = link.alias.as_deref()
                && code_taken_on(&txn, alias, Some(&link.id)).await?
            {
                return Ok(false);
            }

            if let Err(e) = model.clone().update(&txn).await {
                return match unique_violation_on_alias(&e) {
                    Some(_) => Ok(false),
                    None => Err(e),
                };
            }

            txn.commit().await?;
            Ok(true)
        })
        .await
        .map_err(|e| CondensrError::database_operation(format!("更新链接失败: {}", e)))?;

        if !updated {
            return Err(CondensrError::link_alias_taken(format!(
                "Alias '{}' is already in use",
                link.alias.as_deref().unwrap_or_default()
            )));
        }

        // 搜索结果依赖 originalUrl / alias，缓存的 COUNT 需要失效
        self.invalidate_count_cache();
        info!("Link updated: {}", link.short_code);
        Ok(())
    }

    /// 原子自增点击数；达到 maxClicks 时不更新并返回 false
    pub async fn increment_clicks(&self, id: &str) -> Result<bool> {
        let db = &self.db;

        let result = retry::with_retry(&format!("increment_clicks({})", id), self.retry_config, || async {
            link::Entity::update_many()
                .col_expr(link::Column::Clicks, Expr::col(link::Column::Clicks).add(1))
                .filter(link::Column::Id.eq(id))
                .filter(
                    Condition::any()
                        .add(link::Column::MaxClicks.is_null())
                        .add(Expr::col(link::Column::Clicks).lt(Expr::col(link::Column::MaxClicks))),
                )
                .exec(db)
                .await
        })
        .await?;

        Ok(result.rows_affected == 1)
    }

    /// Delete links by id within an owner scope.
    ///
    /// Returns `(deleted, not_found)`; ids outside the scope count as not found.
    pub async fn delete_links(
        &self,
        owner_id: Option<&str>,
        ids: &[String],
    ) -> Result<(Vec<String>, Vec<String>)> {
        if ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let db = &self.db;
        let condition = owner_condition(owner_id).add(link::Column::Id.is_in(ids.iter().cloned()));

        let existing: Vec<String> = retry::with_retry("delete_links(find)", self.retry_config, || async {
            link::Entity::find()
                .select_only()
                .column(link::Column::Id)
                .filter(condition.clone())
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await?;

        let existing_set: HashSet<&String> = existing.iter().collect();
        let mut seen = HashSet::new();
        let not_found: Vec<String> = ids
            .iter()
            .filter(|id| !existing_set.contains(id) && seen.insert(id.as_str()))
            .cloned()
            .collect();

        if existing.is_empty() {
            return Ok((Vec::new(), not_found));
        }

        retry::with_retry("delete_links(exec)", self.retry_config, || async {
            link::Entity::delete_many()
                .filter(link::Column::Id.is_in(existing.iter().cloned()))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| CondensrError::database_operation(format!("批量删除失败: {}", e)))?;

        self.delete_click_events_for(&existing).await?;
        self.invalidate_count_cache();
        info!("Deleted {} links", existing.len());

        Ok((existing, not_found))
    }

    pub async fn link_ids_by_owner(&self, owner_id: &str) -> Result<Vec<String>> {
        let db = &self.db;
        let ids = retry::with_retry("link_ids_by_owner", self.retry_config, || async {
            link::Entity::find()
                .select_only()
                .column(link::Column::Id)
                .filter(link::Column::OwnerId.eq(owner_id))
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await?;
        Ok(ids)
    }

    /// Top links by clicks within an owner scope
    pub async fn top_links(&self, owner_id: Option<&str>, limit: u64) -> Result<Vec<Link>> {
        let db = &self.db;
        let condition = owner_condition(owner_id);

        let models = retry::with_retry("top_links", self.retry_config, || async {
            link::Entity::find()
                .filter(condition.clone())
                .order_by_desc(link::Column::Clicks)
                .order_by_desc(link::Column::CreatedAt)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_link).collect())
    }

    /// 链接总数与点击总数（SeaORM DSL 聚合查询）
    pub async fn link_totals(&self, owner_id: Option<&str>) -> Result<LinkTotals> {
        let db = &self.db;
        let condition = owner_condition(owner_id);

        let result = retry::with_retry("link_totals", self.retry_config, || async {
            link::Entity::find()
                .select_only()
                .column_as(link::Column::Id.count(), "total_links")
                .column_as(link::Column::Clicks.sum(), "total_clicks")
                .filter(condition.clone())
                .into_model::<TotalsResult>()
                .one(db)
                .await
        })
        .await?;

        Ok(result
            .map(|r| LinkTotals {
                total_links: Ord::max(r.total_links, 0) as u64,
                total_clicks: Ord::max(r.total_clicks.unwrap_or(0), 0) as u64,
            })
            .unwrap_or_default())
    }

    /// 每个用户的链接数
    pub async fn links_count_by_owner(&self) -> Result<HashMap<String, u64>> {
        let db = &self.db;
        let rows: Vec<(String, i64)> = retry::with_retry("links_count_by_owner", self.retry_config, || async {
            link::Entity::find()
                .select_only()
                .column(link::Column::OwnerId)
                .column_as(link::Column::Id.count(), "links_count")
                .group_by(link::Column::OwnerId)
                .into_tuple::<(String, i64)>()
                .all(db)
                .await
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|(owner, count)| (owner, Ord::max(count, 0) as u64))
            .collect())
    }
}
