//! 密码工具模块
//!
//! Argon2id 哈希与验证，以及创建链接表单使用的密码强度评估

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;

/// 密码哈希错误
#[derive(Debug)]
pub enum PasswordError {
    HashError(String),
    VerifyError(String),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashError(msg) => write!(f, "Password hash error: {}", msg),
            Self::VerifyError(msg) => write!(f, "Password verify error: {}", msg),
        }
    }
}

impl std::error::Error for PasswordError {}

/// 对密码进行 Argon2id 哈希
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// 验证密码是否匹配哈希
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 处理更新请求中的链接密码
///
/// - `None`：保留原密码
/// - 空字符串：移除密码
/// - 其他：重新哈希
pub fn process_update_password(
    new_password: Option<&str>,
    existing_password: Option<String>,
) -> Result<Option<String>, PasswordError> {
    match new_password {
        Some(pwd) if !pwd.is_empty() => hash_password(pwd).map(Some),
        Some(_) => Ok(None),
        None => Ok(existing_password),
    }
}

/// Link password strength shown next to the password field.
///
/// The labels are part of the dashboard contract and stay in Portuguese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PasswordStrength {
    #[serde(rename = "Fraca")]
    Weak,
    #[serde(rename = "Média")]
    Medium,
    #[serde(rename = "Boa")]
    Good,
    #[serde(rename = "Forte")]
    Strong,
}

impl PasswordStrength {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weak => "Fraca",
            Self::Medium => "Média",
            Self::Good => "Boa",
            Self::Strong => "Forte",
        }
    }
}

impl std::fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 按字符数评估强度：<4 Fraca，<6 Média，<8 Boa，其余 Forte
pub fn password_strength(password: &str) -> PasswordStrength {
    match password.chars().count() {
        0..=3 => PasswordStrength::Weak,
        4..=5 => PasswordStrength::Medium,
        6..=7 => PasswordStrength::Good,
        _ => PasswordStrength::Strong,
    }
}
