//! Entity model <-> domain conversions
//!
//! Tags, metadata and roles are stored as JSON text columns.

use sea_orm::ActiveValue::{NotSet, Set};
use serde_json::{Map, Value};
use tracing::warn;

use crate::storage::models::{DeviceTargets, Link, OpenGraph, User, UserStatus, Utm};
use migration::entities::{link, user};

fn parse_json_list(raw: &str, column: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Invalid JSON list in column {}: {}", column, e);
        Vec::new()
    })
}

fn parse_json_object(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn to_json_text<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

pub fn model_to_link(model: link::Model) -> Link {
    Link {
        tags: parse_json_list(&model.tags, "links.tags"),
        metadata: parse_json_object(&model.metadata),
        id: model.id,
        owner_id: model.owner_id,
        original_url: model.original_url,
        short_code: model.short_code,
        alias: model.alias,
        clicks: model.clicks.max(0),
        max_clicks: model.max_clicks,
        password_hash: model.password,
        is_private: model.is_private,
        created_at: model.created_at,
        expires_at: model.expires_at,
        qr_code: model.qr_code,
        category: model.category,
        utm: Utm {
            source: model.utm_source,
            medium: model.utm_medium,
            campaign: model.utm_campaign,
            term: model.utm_term,
            content: model.utm_content,
        },
        device_targets: DeviceTargets {
            mobile: model.mobile_url,
            tablet: model.tablet_url,
            desktop: model.desktop_url,
        },
        open_graph: OpenGraph {
            title: model.og_title,
            description: model.og_description,
            image: model.og_image,
            og_type: model.og_type,
        },
    }
}

/// 构建 ActiveModel
///
/// 更新时不写 clicks 与 created_at，点击数只能通过条件自增修改。
pub fn link_to_active_model(link: &Link, is_new: bool) -> link::ActiveModel {
    link::ActiveModel {
        id: Set(link.id.clone()),
        owner_id: Set(link.owner_id.clone()),
        original_url: Set(link.original_url.clone()),
        short_code: Set(link.short_code.clone()),
        alias: Set(link.alias.clone()),
        clicks: if is_new { Set(link.clicks) } else { NotSet },
        max_clicks: Set(link.max_clicks),
        password: Set(link.password_hash.clone()),
        is_private: Set(link.is_private),
        created_at: if is_new { Set(link.created_at) } else { NotSet },
        expires_at: Set(link.expires_at),
        qr_code: Set(link.qr_code.clone()),
        tags: Set(to_json_text(&link.tags)),
        category: Set(link.category.clone()),
        metadata: Set(Value::Object(link.metadata.clone()).to_string()),
        utm_source: Set(link.utm.source.clone()),
        utm_medium: Set(link.utm.medium.clone()),
        utm_campaign: Set(link.utm.campaign.clone()),
        utm_term: Set(link.utm.term.clone()),
        utm_content: Set(link.utm.content.clone()),
        mobile_url: Set(link.device_targets.mobile.clone()),
        tablet_url: Set(link.device_targets.tablet.clone()),
        desktop_url: Set(link.device_targets.desktop.clone()),
        og_title: Set(link.open_graph.title.clone()),
        og_description: Set(link.open_graph.description.clone()),
        og_image: Set(link.open_graph.image.clone()),
        og_type: Set(link.open_graph.og_type.clone()),
    }
}

pub fn model_to_user(model: user::Model) -> User {
    User {
        roles: parse_json_list(&model.roles, "users.roles"),
        status: model.status.parse().unwrap_or_else(|e| {
            warn!("{}; treating user {} as inactive", e, model.id);
            UserStatus::Inactive
        }),
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        custom_domain: model.custom_domain,
        notifications_enabled: model.notifications_enabled,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn user_to_active_model(user: &User, is_new: bool) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(user.id.clone()),
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        roles: Set(to_json_text(&user.roles)),
        status: Set(user.status.as_str().to_string()),
        custom_domain: Set(user.custom_domain.clone()),
        notifications_enabled: Set(user.notifications_enabled),
        created_at: if is_new { Set(user.created_at) } else { NotSet },
        updated_at: Set(user.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::ActiveValue;

    fn link_model() -> link::Model {
        link::Model {
            id: "l1".into(),
            owner_id: "u1".into(),
            original_url: "https://example.com".into(),
            short_code: "abc123".into(),
            alias: Some("promo".into()),
            clicks: 4,
            max_clicks: Some(10),
            password: None,
            is_private: true,
            created_at: Utc::now(),
            expires_at: None,
            qr_code: None,
            tags: r#"["spring","sale"]"#.into(),
            category: Some("marketing".into()),
            metadata: r#"{"team":"growth"}"#.into(),
            utm_source: Some("newsletter".into()),
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
            mobile_url: Some("https://m.example.com".into()),
            tablet_url: None,
            desktop_url: None,
            og_title: Some("Title".into()),
            og_description: None,
            og_image: None,
            og_type: Some("website".into()),
        }
    }

    #[test]
    fn test_model_to_link() {
        let link = model_to_link(link_model());
        assert_eq!(link.tags, vec!["spring", "sale"]);
        assert_eq!(link.metadata.get("team"), Some(&Value::from("growth")));
        assert_eq!(link.utm.source.as_deref(), Some("newsletter"));
        assert_eq!(
            link.device_targets.mobile.as_deref(),
            Some("https://m.example.com")
        );
        assert_eq!(link.open_graph.og_type.as_deref(), Some("website"));
    }

    #[test]
    fn test_bad_json_columns_degrade_to_empty() {
        let mut model = link_model();
        model.tags = "not json".into();
        model.metadata = "[1]".into();
        let link = model_to_link(model);
        assert!(link.tags.is_empty());
        assert!(link.metadata.is_empty());
    }

    #[test]
    fn test_update_model_never_touches_clicks() {
        let link = model_to_link(link_model());
        let active = link_to_active_model(&link, false);
        assert!(matches!(active.clicks, ActiveValue::NotSet));
        assert!(matches!(active.created_at, ActiveValue::NotSet));

        let active = link_to_active_model(&link, true);
        assert_eq!(active.clicks, ActiveValue::Set(4));
    }

    #[test]
    fn test_user_round_trip() {
        let now = Utc::now();
        let model = user::Model {
            id: "u1".into(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$x".into(),
            roles: r#"["admin","user"]"#.into(),
            status: "suspended".into(),
            custom_domain: None,
            notifications_enabled: false,
            created_at: now,
            updated_at: now,
        };
        let user = model_to_user(model);
        assert!(user.is_admin());
        assert_eq!(user.status, UserStatus::Suspended);
        assert!(!user.notifications_enabled);

        let active = user_to_active_model(&user, true);
        assert_eq!(
            active.roles,
            ActiveValue::Set(r#"["admin","user"]"#.to_string())
        );
    }
}
