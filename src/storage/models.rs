use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::device::DeviceType;

/// Link-level UTM parameters appended on redirect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utm {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl Utm {
    /// `(query name, value)` pairs for the parameters that are set
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("utm_source", &self.source),
            ("utm_medium", &self.medium),
            ("utm_campaign", &self.campaign),
            ("utm_term", &self.term),
            ("utm_content", &self.content),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_deref().filter(|s| !s.is_empty()).map(|v| (k, v)))
        .collect()
    }
}

/// Per-device destination overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTargets {
    pub mobile: Option<String>,
    pub tablet: Option<String>,
    pub desktop: Option<String>,
}

impl DeviceTargets {
    pub fn for_device(&self, device: DeviceType) -> Option<&str> {
        let target = match device {
            DeviceType::Mobile => &self.mobile,
            DeviceType::Tablet => &self.tablet,
            DeviceType::Desktop => &self.desktop,
        };
        target.as_deref().filter(|s| !s.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.mobile, &self.tablet, &self.desktop]
            .into_iter()
            .filter_map(|t| t.as_deref())
    }
}

/// Open Graph preview fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub og_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub owner_id: String,
    pub original_url: String,
    pub short_code: String,
    pub alias: Option<String>,
    pub clicks: i64,
    pub max_clicks: Option<i64>,
    /// Argon2 hash; never serialized
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub qr_code: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub metadata: Map<String, Value>,
    pub utm: Utm,
    pub device_targets: DeviceTargets,
    pub open_graph: OpenGraph,
}

impl Link {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// The code shown to users: alias when set, else shortCode
    pub fn public_code(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.short_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!(
                "Invalid user status: '{}'. Valid: active, suspended, inactive",
                s
            )),
        }
    }
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub roles: Vec<String>,
    pub status: UserStatus,
    pub custom_domain: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}

/// A click waiting to be written to `click_events`
#[derive(Debug, Clone, PartialEq)]
pub struct NewClickEvent {
    pub link_id: String,
    pub clicked_at: DateTime<Utc>,
    pub country: Option<String>,
    pub device: DeviceType,
    pub browser: String,
    pub referrer: Option<String>,
    pub ip_hash: Option<String>,
}

/// Columns of a stored click used by the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRow {
    pub link_id: String,
    pub clicked_at: DateTime<Utc>,
    pub country: Option<String>,
    pub device_type: String,
    pub browser: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkSortBy {
    #[default]
    CreatedAt,
    Clicks,
    OriginalUrl,
    ShortCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Normalized list query; page is 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkListQuery {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub sort_by: LinkSortBy,
    pub sort_order: SortOrder,
}

impl Default for LinkListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
            sort_by: LinkSortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkTotals {
    pub total_links: u64,
    pub total_clicks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link() -> Link {
        Link {
            id: "id".into(),
            owner_id: "owner".into(),
            original_url: "https://example.com".into(),
            short_code: "abc123".into(),
            alias: None,
            clicks: 0,
            max_clicks: None,
            password_hash: None,
            is_private: false,
            created_at: Utc::now(),
            expires_at: None,
            qr_code: None,
            tags: vec![],
            category: None,
            metadata: Map::new(),
            utm: Utm::default(),
            device_targets: DeviceTargets::default(),
            open_graph: OpenGraph::default(),
        }
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut l = link();
        assert!(!l.is_expired_at(now));

        l.expires_at = Some(now);
        assert!(l.is_expired_at(now));
        l.expires_at = Some(now + Duration::minutes(1));
        assert!(!l.is_expired_at(now));
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let mut l = link();
        l.password_hash = Some("$argon2id$secret".into());
        let json = serde_json::to_string(&l).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"shortCode\":\"abc123\""));
        assert!(json.contains("\"deviceTargets\""));
    }

    #[test]
    fn test_utm_pairs_skip_empty() {
        let utm = Utm {
            source: Some("newsletter".into()),
            medium: Some(String::new()),
            campaign: Some("spring".into()),
            ..Default::default()
        };
        assert_eq!(
            utm.pairs(),
            vec![("utm_source", "newsletter"), ("utm_campaign", "spring")]
        );
    }

    #[test]
    fn test_device_targets() {
        let targets = DeviceTargets {
            mobile: Some("https://m.example.com".into()),
            tablet: Some(String::new()),
            desktop: None,
        };
        assert_eq!(
            targets.for_device(DeviceType::Mobile),
            Some("https://m.example.com")
        );
        assert_eq!(targets.for_device(DeviceType::Tablet), None);
        assert_eq!(targets.for_device(DeviceType::Desktop), None);
    }

    #[test]
    fn test_user_status_parse() {
        assert_eq!("Suspended".parse::<UserStatus>(), Ok(UserStatus::Suspended));
        assert!("banned".parse::<UserStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&UserStatus::Inactive).unwrap(),
            "\"inactive\""
        );
    }
}
