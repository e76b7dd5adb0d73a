//! Accounts: registration, login, profile and the admin user list

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{CondensrError, Result};
use crate::storage::{ROLE_ADMIN, ROLE_USER, SeaOrmStorage, User, UserStatus};
use crate::utils::password::{hash_password, verify_password};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `null` or `""` clears the custom domain
    #[serde(deserialize_with = "crate::services::nullable")]
    pub custom_domain: Option<Option<String>>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRolesRequest {
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub links_count: u64,
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        });
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(CondensrError::validation(format!(
            "Invalid email address: '{}'",
            email
        )));
    }
    Ok(email)
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CondensrError::validation("Name must not be empty"));
    }
    Ok(name.to_string())
}

fn check_new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CondensrError::user_weak_password(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Roles are a subset of {admin, user}; `user` is always present
fn normalize_roles(roles: &[String]) -> Result<Vec<String>> {
    let mut admin = false;
    for role in roles {
        match role.trim().to_lowercase().as_str() {
            ROLE_ADMIN => admin = true,
            ROLE_USER => {}
            other => {
                return Err(CondensrError::validation(format!(
                    "Unknown role '{}'. Valid: admin, user",
                    other
                )));
            }
        }
    }

    let mut normalized = Vec::with_capacity(2);
    if admin {
        normalized.push(ROLE_ADMIN.to_string());
    }
    normalized.push(ROLE_USER.to_string());
    Ok(normalized)
}

fn active_admin(user: &User) -> bool {
    user.is_admin() && user.status == UserStatus::Active
}

pub struct UserService {
    storage: Arc<SeaOrmStorage>,
}

impl UserService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn hash(password: &str) -> Result<String> {
        hash_password(password).map_err(|e| CondensrError::password_hash(e.to_string()))
    }

    async fn find_required(&self, id: &str) -> Result<User> {
        self.storage
            .find_user(id)
            .await?
            .ok_or_else(|| CondensrError::not_found(format!("User '{}' not found", id)))
    }

    async fn links_count(&self, user_id: &str) -> Result<u64> {
        Ok(self.storage.link_ids_by_owner(user_id).await?.len() as u64)
    }

    pub async fn view(&self, user: User) -> Result<UserView> {
        let links_count = self.links_count(&user.id).await?;
        Ok(UserView { user, links_count })
    }

    /// 第一个注册的用户自动成为管理员
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        let name = normalize_name(&req.name)?;
        let email = normalize_email(&req.email)?;
        check_new_password(&req.password)?;

        if self.storage.find_user_by_email(&email).await?.is_some() {
            return Err(CondensrError::user_email_taken(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let roles = if self.storage.count_users().await? == 0 {
            vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()]
        } else {
            vec![ROLE_USER.to_string()]
        };

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            password_hash: Self::hash(&req.password)?,
            roles,
            status: UserStatus::Active,
            custom_domain: None,
            notifications_enabled: true,
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_user(&user).await?;
        info!("UserService: registered {} (admin: {})", user.email, user.is_admin());
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<User> {
        let email = req.email.trim().to_lowercase();
        let user = self.storage.find_user_by_email(&email).await?;

        let Some(user) = user else {
            info!("Login failed: unknown email {}", email);
            return Err(CondensrError::auth_failed("Invalid email or password"));
        };

        if !verify_password(&req.password, &user.password_hash)? {
            info!("Login failed: wrong password for {}", email);
            return Err(CondensrError::auth_failed("Invalid email or password"));
        }

        if user.status != UserStatus::Active {
            warn!("Login refused for {} account {}", user.status, email);
            return Err(CondensrError::user_inactive(format!(
                "Account is {}",
                user.status
            )));
        }

        info!("User logged in: {}", email);
        Ok(user)
    }

    /// Reload the token subject; status changes apply on the next request
    pub async fn authenticate(&self, user_id: &str) -> Result<User> {
        let user = self
            .storage
            .find_user(user_id)
            .await?
            .ok_or_else(|| CondensrError::token_invalid("Token subject no longer exists"))?;
        if user.status != UserStatus::Active {
            return Err(CondensrError::user_inactive(format!(
                "Account is {}",
                user.status
            )));
        }
        Ok(user)
    }

    pub async fn update_profile(&self, user: &User, req: ProfileUpdateRequest) -> Result<UserView> {
        let mut updated = user.clone();

        if let Some(name) = req.name.as_deref() {
            updated.name = normalize_name(name)?;
        }

        if let Some(email) = req.email.as_deref() {
            let email = normalize_email(email)?;
            if email != updated.email {
                if self.storage.find_user_by_email(&email).await?.is_some() {
                    return Err(CondensrError::user_email_taken(format!(
                        "Email '{}' is already registered",
                        email
                    )));
                }
                updated.email = email;
            }
        }

        if let Some(domain) = req.custom_domain {
            updated.custom_domain = domain
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty());
        }

        if let Some(enabled) = req.notifications_enabled {
            updated.notifications_enabled = enabled;
        }

        updated.updated_at = Utc::now();
        self.storage.update_user(&updated).await?;
        info!("UserService: profile updated for {}", updated.id);
        self.view(updated).await
    }

    pub async fn change_password(&self, user: &User, req: ChangePasswordRequest) -> Result<()> {
        if !verify_password(&req.current_password, &user.password_hash)? {
            return Err(CondensrError::auth_failed("Current password is incorrect"));
        }
        check_new_password(&req.new_password)?;
        if req.new_password != req.confirm_password {
            return Err(CondensrError::validation(
                "New password and confirmation do not match",
            ));
        }

        let mut updated = user.clone();
        updated.password_hash = Self::hash(&req.new_password)?;
        updated.updated_at = Utc::now();
        self.storage.update_user(&updated).await?;
        info!("UserService: password changed for {}", user.id);
        Ok(())
    }

    /// 删除账户及其全部链接；最后一个有效管理员不能删除自己
    pub async fn delete_account(&self, user: &User) -> Result<()> {
        if active_admin(user) {
            let admins = self
                .storage
                .list_users(None)
                .await?
                .iter()
                .filter(|u| active_admin(u))
                .count();
            if admins <= 1 {
                return Err(CondensrError::forbidden(
                    "The last active admin cannot delete their account",
                ));
            }
        }

        let links = self.storage.delete_user_cascade(&user.id).await?;
        info!("UserService: deleted account {} with {} links", user.id, links);
        Ok(())
    }

    pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserView>> {
        let users = self.storage.list_users(search).await?;
        let counts = self.storage.links_count_by_owner().await?;
        Ok(users
            .into_iter()
            .map(|user| {
                let links_count = counts.get(&user.id).copied().unwrap_or(0);
                UserView { user, links_count }
            })
            .collect())
    }

    pub async fn set_status(&self, actor: &User, id: &str, status: UserStatus) -> Result<UserView> {
        if actor.id == id {
            return Err(CondensrError::forbidden("You cannot change your own status"));
        }
        let mut user = self.find_required(id).await?;
        user.status = status;
        user.updated_at = Utc::now();
        self.storage.update_user(&user).await?;
        info!("Admin {} set status of {} to {}", actor.id, id, status);
        self.view(user).await
    }

    pub async fn set_roles(&self, actor: &User, id: &str, roles: &[String]) -> Result<UserView> {
        let roles = normalize_roles(roles)?;
        if actor.id == id && !roles.iter().any(|r| r == ROLE_ADMIN) {
            return Err(CondensrError::forbidden(
                "You cannot remove your own admin role",
            ));
        }
        let mut user = self.find_required(id).await?;
        user.roles = roles;
        user.updated_at = Utc::now();
        self.storage.update_user(&user).await?;
        info!("Admin {} set roles of {} to {:?}", actor.id, id, user.roles);
        self.view(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("ana").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ana@example").is_err());
        assert!(normalize_email("a b@example.com").is_err());
    }

    #[test]
    fn test_normalize_roles() {
        assert_eq!(
            normalize_roles(&["Admin".into()]).unwrap(),
            vec!["admin".to_string(), "user".to_string()]
        );
        assert_eq!(normalize_roles(&[]).unwrap(), vec!["user".to_string()]);
        assert!(normalize_roles(&["root".into()]).is_err());
    }

    #[test]
    fn test_profile_request_null_domain() {
        let req: ProfileUpdateRequest =
            serde_json::from_str(r#"{"customDomain": null, "notificationsEnabled": false}"#).unwrap();
        assert_eq!(req.custom_domain, Some(None));
        assert_eq!(req.notifications_enabled, Some(false));

        let req: ProfileUpdateRequest = serde_json::from_str(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(req.custom_domain, None);
    }

    #[test]
    fn test_password_length() {
        assert!(matches!(
            check_new_password("short"),
            Err(CondensrError::UserWeakPassword(_))
        ));
        assert!(check_new_password("long enough").is_ok());
    }
}
