//! Alias resolution for `GET /{code}`
//!
//! 检查顺序：不存在 → 404，已过期 → 410，密码 → 401/403，
//! 点击上限（条件 UPDATE）→ 410。通过后按设备选择目标地址并附加 UTM 参数，
//! 点击事件交给 ClickRecorder 异步落库。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, trace};
use url::Url;

use crate::analytics::ClickRecorder;
use crate::errors::{CondensrError, Result};
use crate::storage::{Link, NewClickEvent, SeaOrmStorage, Utm};
use crate::utils::device::classify_user_agent;
use crate::utils::ip::hash_ip;
use crate::utils::password::verify_password;

/// What the redirect handler knows about the visitor
#[derive(Debug, Clone, Default)]
pub struct Visit {
    pub password: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
}

/// Append the link's UTM parameters; parameters already in the URL win
pub fn append_utm(destination: &str, utm: &Utm) -> String {
    let pairs = utm.pairs();
    if pairs.is_empty() {
        return destination.to_string();
    }

    let Ok(mut url) = Url::parse(destination) else {
        return destination.to_string();
    };

    let existing: HashSet<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    let missing: Vec<_> = pairs
        .into_iter()
        .filter(|(name, _)| !existing.contains(*name))
        .collect();
    if missing.is_empty() {
        return destination.to_string();
    }

    url.query_pairs_mut().extend_pairs(missing);
    url.to_string()
}

pub struct RedirectService {
    storage: Arc<SeaOrmStorage>,
    recorder: ClickRecorder,
    hash_ips: bool,
}

impl RedirectService {
    pub fn new(storage: Arc<SeaOrmStorage>, recorder: ClickRecorder, hash_ips: bool) -> Self {
        Self {
            storage,
            recorder,
            hash_ips,
        }
    }

    fn check_password(link: &Link, supplied: Option<&str>) -> Result<()> {
        let Some(hash) = link.password_hash.as_deref() else {
            return Ok(());
        };
        match supplied.filter(|p| !p.is_empty()) {
            None => Err(CondensrError::link_password_required(
                "This link is password protected",
            )),
            Some(password) if verify_password(password, hash)? => Ok(()),
            Some(_) => Err(CondensrError::link_password_incorrect("Incorrect password")),
        }
    }

    /// Resolve `code` and count the click; returns the redirect destination
    pub async fn resolve(&self, code: &str, visit: Visit) -> Result<String> {
        let link = self
            .storage
            .find_link_by_code(code)
            .await?
            .ok_or_else(|| CondensrError::not_found(format!("Short link '{}' not found", code)))?;

        let now = Utc::now();
        if link.is_expired_at(now) {
            debug!("Redirect refused, link expired: {}", code);
            return Err(CondensrError::link_expired(format!("Link '{}' has expired", code)));
        }

        Self::check_password(&link, visit.password.as_deref())?;

        if !self.storage.increment_clicks(&link.id).await? {
            debug!("Redirect refused, click limit reached: {}", code);
            return Err(CondensrError::link_click_limit_reached(format!(
                "Link '{}' reached its click limit",
                code
            )));
        }

        let client = classify_user_agent(visit.user_agent.as_deref().unwrap_or_default());
        let target = link
            .device_targets
            .for_device(client.device)
            .unwrap_or(link.original_url.as_str());
        let destination = append_utm(target, &link.utm);

        let ip_hash = visit
            .ip
            .as_deref()
            .filter(|_| self.hash_ips)
            .map(hash_ip);

        self.recorder.record(NewClickEvent {
            link_id: link.id.clone(),
            clicked_at: now,
            country: visit.country,
            device: client.device,
            browser: client.browser,
            referrer: visit.referrer.filter(|r| !r.is_empty()),
            ip_hash,
        });

        trace!("Redirect {} -> {} ({})", code, destination, client.device);
        Ok(destination)
    }
}
