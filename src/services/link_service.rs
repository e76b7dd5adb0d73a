//! Link management service
//!
//! Owner-scoped CRUD for links. Handlers pass the authenticated caller in;
//! admins may read and modify any link, everyone else only their own.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::config::LinksConfig;
use crate::errors::{CondensrError, Result};
use crate::services::{AnalyticsService, LinkAnalytics};
use crate::storage::{
    DeviceTargets, InsertOutcome, Link, LinkListQuery, LinkSortBy, OpenGraph, SeaOrmStorage,
    SortOrder, User, Utm,
};
use crate::utils::password::{hash_password, process_update_password};
use crate::utils::qr::qr_data_uri;
use crate::utils::time_parser::parse_expire_time;
use crate::utils::url_validator::validation_error_message;
use crate::utils::{generate_random_code, sanitize_alias, validate_metadata, validate_url};

/// 生成 shortCode 时的最大重试次数
const MAX_CODE_ATTEMPTS: usize = 8;

// ============ Request/Response DTOs ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateLinkRequest {
    pub original_url: String,
    pub alias: Option<String>,
    pub is_private: bool,
    pub password: Option<String>,
    /// RFC3339, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD` or relative (`7d`, `1h30m`)
    pub expires_at: Option<String>,
    pub max_clicks: Option<i64>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    /// JSON object, or a string holding one
    pub metadata: Option<Value>,
    pub utm: Utm,
    pub device_targets: DeviceTargets,
    pub open_graph: OpenGraph,
    pub generate_qr_code: bool,
}

/// Patch request: absent fields keep their value, `null` clears nullable ones
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateLinkRequest {
    pub original_url: Option<String>,
    #[serde(deserialize_with = "crate::services::nullable")]
    pub alias: Option<Option<String>>,
    pub is_private: Option<bool>,
    /// `""` removes the password
    pub password: Option<String>,
    #[serde(deserialize_with = "crate::services::nullable")]
    pub expires_at: Option<Option<String>>,
    #[serde(deserialize_with = "crate::services::nullable")]
    pub max_clicks: Option<Option<i64>>,
    pub tags: Option<Vec<String>>,
    #[serde(deserialize_with = "crate::services::nullable")]
    pub category: Option<Option<String>>,
    pub metadata: Option<Value>,
    pub utm: Option<Utm>,
    pub device_targets: Option<DeviceTargets>,
    pub open_graph: Option<OpenGraph>,
    /// `true` (re)generates the QR code, `false` removes it
    pub generate_qr_code: Option<bool>,
}

/// Raw list parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListLinksParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Link as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    #[serde(flatten)]
    pub link: Link,
    pub short_url: String,
    pub has_password: bool,
    pub is_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPage {
    pub links: Vec<LinkView>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDetail {
    pub link: LinkView,
    #[serde(flatten)]
    pub analytics: LinkAnalytics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasAvailability {
    pub alias: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResult {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
}

// ============ Field normalization ============

fn parse_sort_by(value: Option<&str>) -> Result<LinkSortBy> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(LinkSortBy::default()),
        Some("createdAt") => Ok(LinkSortBy::CreatedAt),
        Some("clicks") => Ok(LinkSortBy::Clicks),
        Some("originalUrl") => Ok(LinkSortBy::OriginalUrl),
        Some("shortCode") => Ok(LinkSortBy::ShortCode),
        Some(other) => Err(CondensrError::validation(format!(
            "Invalid sortBy '{}'. Valid: createdAt, clicks, originalUrl, shortCode",
            other
        ))),
    }
}

fn parse_sort_order(value: Option<&str>) -> Result<SortOrder> {
    match value.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(SortOrder::default()),
        Some("asc") => Ok(SortOrder::Asc),
        Some("desc") => Ok(SortOrder::Desc),
        Some(other) => Err(CondensrError::validation(format!(
            "Invalid sortOrder '{}'. Valid: asc, desc",
            other
        ))),
    }
}

fn check_url(url: &str) -> Result<()> {
    validate_url(url)
        .map(|_| ())
        .map_err(|e| CondensrError::link_invalid_url(format!("{}: {}", validation_error_message(&e), url)))
}

fn check_device_targets(targets: &DeviceTargets) -> Result<()> {
    targets
        .iter()
        .filter(|t| !t.is_empty())
        .try_for_each(check_url)
}

/// Sanitized alias; one that sanitizes to empty counts as absent
fn normalize_alias(alias: Option<&str>) -> Option<String> {
    alias.map(sanitize_alias).filter(|a| !a.is_empty())
}

/// Trimmed, de-duplicated, non-empty tags in input order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_metadata(value: Option<Value>) -> Result<Map<String, Value>> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::String(s)) => validate_metadata(&s),
        Some(_) => Err(CondensrError::link_invalid_metadata(
            "invalid metadata JSON: expected an object",
        )),
    }
}

/// 过期时间必须晚于当前时间
fn parse_expiry(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let expires_at =
        parse_expire_time(input, now).map_err(CondensrError::link_invalid_expire_time)?;
    if expires_at <= now {
        return Err(CondensrError::link_invalid_expire_time(format!(
            "expiresAt must be in the future: {}",
            expires_at.to_rfc3339()
        )));
    }
    Ok(expires_at)
}

fn alias_taken(alias: &str) -> CondensrError {
    CondensrError::link_alias_taken(format!("Alias '{}' is already in use", alias))
}

fn check_max_clicks(max_clicks: i64, current_clicks: i64) -> Result<()> {
    if max_clicks < 1 {
        return Err(CondensrError::validation("maxClicks must be at least 1"));
    }
    if max_clicks < current_clicks {
        return Err(CondensrError::validation(format!(
            "maxClicks ({}) cannot be below the current click count ({})",
            max_clicks, current_clicks
        )));
    }
    Ok(())
}

// ============ LinkService Implementation ============

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    analytics: Arc<AnalyticsService>,
    config: LinksConfig,
    public_base_url: String,
}

impl LinkService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        analytics: Arc<AnalyticsService>,
        config: LinksConfig,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            analytics,
            config,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.public_base_url, code)
    }

    pub fn view(&self, link: Link) -> LinkView {
        LinkView {
            short_url: self.short_url(link.public_code()),
            has_password: link.has_password(),
            is_expired: link.is_expired_at(Utc::now()),
            link,
        }
    }

    fn qr_code_for(&self, link: &Link) -> Result<String> {
        qr_data_uri(&self.short_url(link.public_code()), self.config.qr_size)
    }

    fn hash_link_password(&self, password: &str) -> Result<String> {
        hash_password(password).map_err(|e| {
            error!("Failed to hash link password: {}", e);
            CondensrError::password_hash(e.to_string())
        })
    }

    async fn ensure_alias_free(&self, alias: &str, exclude_id: Option<&str>) -> Result<()> {
        if self.storage.code_taken(alias, exclude_id).await? {
            return Err(alias_taken(alias));
        }
        Ok(())
    }

    async fn allocate_short_code(&self) -> Result<String> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_random_code(self.config.code_length);
            if !self.storage.code_taken(&code, None).await? {
                return Ok(code);
            }
            debug!("shortCode collision on attempt {}: {}", attempt, code);
        }
        Err(CondensrError::database_operation(format!(
            "Could not allocate a unique shortCode after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    /// 查找调用者可见的链接，他人的链接对非管理员表现为 404
    async fn find_visible(&self, caller: &User, id: &str) -> Result<Link> {
        self.storage
            .find_link(id)
            .await?
            .filter(|link| link.owner_id == caller.id || caller.is_admin())
            .ok_or_else(|| CondensrError::not_found(format!("Link '{}' not found", id)))
    }

    // ============ CRUD Operations ============

    pub async fn create_link(&self, owner: &User, req: CreateLinkRequest) -> Result<LinkView> {
        let original_url = req.original_url.trim().to_string();
        check_url(&original_url)?;
        check_device_targets(&req.device_targets)?;

        let alias = normalize_alias(req.alias.as_deref());
        if let Some(alias) = alias.as_deref() {
            self.ensure_alias_free(alias, None).await?;
        }

        let metadata = parse_metadata(req.metadata)?;

        let now = Utc::now();
        let expires_at = match req.expires_at.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_expiry(s, now)?),
            _ => None,
        };

        if let Some(max) = req.max_clicks {
            check_max_clicks(max, 0)?;
        }

        let password_hash = match req.password.as_deref() {
            Some(p) if !p.is_empty() => Some(self.hash_link_password(p)?),
            _ => None,
        };

        let short_code = self.allocate_short_code().await?;

        let mut link = Link {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner.id.clone(),
            original_url,
            short_code,
            alias,
            clicks: 0,
            max_clicks: req.max_clicks,
            password_hash,
            is_private: req.is_private,
            created_at: now,
            expires_at,
            qr_code: None,
            tags: normalize_tags(req.tags),
            category: normalize_optional(req.category),
            metadata,
            utm: req.utm,
            device_targets: req.device_targets,
            open_graph: req.open_graph,
        };

        // 预检查之后仍可能与并发请求冲突：别名冲突直接 409，shortCode 冲突换一个重试
        let mut regenerated = 0;
        loop {
            if req.generate_qr_code {
                link.qr_code = Some(self.qr_code_for(&link)?);
            }

            match self.storage.insert_link(&link).await? {
                InsertOutcome::Inserted => break,
                InsertOutcome::AliasTaken => {
                    return Err(alias_taken(link.alias.as_deref().unwrap_or_default()));
                }
                InsertOutcome::ShortCodeTaken if regenerated < MAX_CODE_ATTEMPTS => {
                    regenerated += 1;
                    debug!("shortCode {} lost a race, reallocating", link.short_code);
                    link.short_code = self.allocate_short_code().await?;
                }
                InsertOutcome::ShortCodeTaken => {
                    return Err(CondensrError::database_operation(format!(
                        "Could not allocate a unique shortCode after {} attempts",
                        MAX_CODE_ATTEMPTS
                    )));
                }
            }
        }

        info!(
            "LinkService: user {} created link '{}' -> '{}'",
            owner.id,
            link.public_code(),
            link.original_url
        );

        Ok(self.view(link))
    }

    pub async fn alias_available(&self, alias: &str) -> Result<AliasAvailability> {
        let alias = sanitize_alias(alias);
        if alias.is_empty() {
            return Ok(AliasAvailability {
                alias,
                available: false,
            });
        }
        let available = !self.storage.code_taken(&alias, None).await?;
        Ok(AliasAvailability { alias, available })
    }

    /// 列出调用者自己的链接
    pub async fn list_links(&self, owner: &User, params: ListLinksParams) -> Result<LinkPage> {
        let page = params.page.unwrap_or(1).max(1);
        let page_size = params
            .page_size
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size.max(1));

        let query = LinkListQuery {
            page,
            page_size,
            search: normalize_optional(params.search),
            sort_by: parse_sort_by(params.sort_by.as_deref())?,
            sort_order: parse_sort_order(params.sort_order.as_deref())?,
        };

        let (links, total) = self.storage.list_links(Some(&owner.id), &query).await?;

        Ok(LinkPage {
            links: links.into_iter().map(|l| self.view(l)).collect(),
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        })
    }

    pub async fn get_link(&self, caller: &User, id: &str, days: Option<u32>) -> Result<LinkDetail> {
        let link = self.find_visible(caller, id).await?;
        let analytics = self.analytics.link_analytics(&link, days).await?;
        Ok(LinkDetail {
            link: self.view(link),
            analytics,
        })
    }

    pub async fn update_link(
        &self,
        caller: &User,
        id: &str,
        req: UpdateLinkRequest,
    ) -> Result<LinkView> {
        let mut link = self.find_visible(caller, id).await?;
        let now = Utc::now();
        let mut public_code_changed = false;

        if let Some(url) = req.original_url {
            let url = url.trim().to_string();
            check_url(&url)?;
            link.original_url = url;
        }

        if let Some(targets) = req.device_targets {
            check_device_targets(&targets)?;
            link.device_targets = targets;
        }

        if let Some(alias) = req.alias {
            let alias = normalize_alias(alias.as_deref());
            if alias != link.alias {
                if let Some(new_alias) = alias.as_deref() {
                    self.ensure_alias_free(new_alias, Some(&link.id)).await?;
                }
                link.alias = alias;
                public_code_changed = true;
            }
        }

        if let Some(expires_at) = req.expires_at {
            link.expires_at = match expires_at.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => Some(parse_expiry(s, now)?),
                _ => None,
            };
        }

        if let Some(max_clicks) = req.max_clicks {
            if let Some(max) = max_clicks {
                check_max_clicks(max, link.clicks)?;
            }
            link.max_clicks = max_clicks;
        }

        link.password_hash =
            process_update_password(req.password.as_deref(), link.password_hash.take())?;

        if let Some(is_private) = req.is_private {
            link.is_private = is_private;
        }
        if let Some(tags) = req.tags {
            link.tags = normalize_tags(tags);
        }
        if let Some(category) = req.category {
            link.category = normalize_optional(category);
        }
        if req.metadata.is_some() {
            link.metadata = parse_metadata(req.metadata)?;
        }
        if let Some(utm) = req.utm {
            link.utm = utm;
        }
        if let Some(og) = req.open_graph {
            link.open_graph = og;
        }

        match req.generate_qr_code {
            Some(true) => link.qr_code = Some(self.qr_code_for(&link)?),
            Some(false) => link.qr_code = None,
            // 别名变了，已有二维码指向旧地址，需要重新生成
            None if public_code_changed && link.qr_code.is_some() => {
                link.qr_code = Some(self.qr_code_for(&link)?);
            }
            None => {}
        }

        self.storage.update_link(&link).await?;
        info!("LinkService: updated link '{}'", link.id);

        // 重新读取，拿到最新的点击数
        let fresh = self.storage.find_link(&link.id).await?;
        Ok(self.view(fresh.unwrap_or(link)))
    }

    pub async fn delete_link(&self, caller: &User, id: &str) -> Result<()> {
        let link = self.find_visible(caller, id).await?;
        let (deleted, _) = self
            .storage
            .delete_links(None, std::slice::from_ref(&link.id))
            .await?;
        if deleted.is_empty() {
            return Err(CondensrError::not_found(format!("Link '{}' not found", id)));
        }
        info!("LinkService: deleted link '{}'", id);
        Ok(())
    }

    /// 批量删除；不属于调用者的链接计入 notFound
    pub async fn bulk_delete(&self, caller: &User, ids: Vec<String>) -> Result<BulkDeleteResult> {
        if ids.is_empty() {
            return Err(CondensrError::validation("ids must not be empty"));
        }
        let scope = (!caller.is_admin()).then_some(caller.id.as_str());
        let (deleted, not_found) = self.storage.delete_links(scope, &ids).await?;
        info!(
            "LinkService: bulk delete by {}: {} deleted, {} not found",
            caller.id,
            deleted.len(),
            not_found.len()
        );
        Ok(BulkDeleteResult { deleted, not_found })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_fields() {
        assert_eq!(parse_sort_by(None).unwrap(), LinkSortBy::CreatedAt);
        assert_eq!(parse_sort_by(Some("clicks")).unwrap(), LinkSortBy::Clicks);
        assert!(parse_sort_by(Some("owner")).is_err());
        assert_eq!(parse_sort_order(Some("ASC")).unwrap(), SortOrder::Asc);
        assert_eq!(parse_sort_order(Some("")).unwrap(), SortOrder::Desc);
        assert!(parse_sort_order(Some("up")).is_err());
    }

    #[test]
    fn test_normalize_alias_and_tags() {
        assert_eq!(normalize_alias(Some("my promo!")), Some("mypromo".to_string()));
        assert_eq!(normalize_alias(Some("@@@")), None);
        assert_eq!(normalize_alias(None), None);
        assert_eq!(
            normalize_tags(vec![" a ".into(), "b".into(), "a".into(), "".into()]),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_parse_metadata_shapes() {
        assert!(parse_metadata(None).unwrap().is_empty());
        assert!(parse_metadata(Some(Value::String("{}".into()))).unwrap().is_empty());
        let map = parse_metadata(Some(serde_json::json!({"team": "growth"}))).unwrap();
        assert_eq!(map["team"], "growth");
        assert!(parse_metadata(Some(Value::String("{oops".into()))).is_err());
        assert!(parse_metadata(Some(serde_json::json!([1, 2]))).is_err());
    }

    #[test]
    fn test_check_max_clicks() {
        assert!(check_max_clicks(0, 0).is_err());
        assert!(check_max_clicks(5, 6).is_err());
        assert!(check_max_clicks(5, 5).is_ok());
    }

    #[test]
    fn test_parse_expiry_rejects_past() {
        let now = Utc::now();
        assert!(parse_expiry("2000-01-01", now).is_err());
        assert!(parse_expiry("1d", now).unwrap() > now);
        assert!(matches!(
            parse_expiry("soon", now),
            Err(CondensrError::LinkInvalidExpireTime(_))
        ));
    }

    #[test]
    fn test_update_request_null_vs_absent() {
        let req: UpdateLinkRequest =
            serde_json::from_str(r#"{"maxClicks": null, "category": "promo"}"#).unwrap();
        assert_eq!(req.max_clicks, Some(None));
        assert_eq!(req.category, Some(Some("promo".to_string())));
        assert_eq!(req.expires_at, None);
        assert_eq!(req.alias, None);
    }
}
