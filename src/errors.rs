use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum CondensrError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Serialization(String),
    Validation(String),
    NotFound(String),
    // 链接
    LinkInvalidUrl(String),
    LinkAliasTaken(String),
    LinkInvalidExpireTime(String),
    LinkInvalidMetadata(String),
    LinkExpired(String),
    LinkClickLimitReached(String),
    LinkPasswordRequired(String),
    LinkPasswordIncorrect(String),
    PasswordHash(String),
    // 用户与认证
    AuthFailed(String),
    TokenInvalid(String),
    Forbidden(String),
    UserEmailTaken(String),
    UserInactive(String),
    UserWeakPassword(String),
    // 统计
    AnalyticsInvalidPeriod(String),
}

impl CondensrError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            CondensrError::DatabaseConfig(_) => "E001",
            CondensrError::DatabaseConnection(_) => "E002",
            CondensrError::DatabaseOperation(_) => "E003",
            CondensrError::FileOperation(_) => "E004",
            CondensrError::Serialization(_) => "E005",
            CondensrError::Validation(_) => "E006",
            CondensrError::NotFound(_) => "E007",
            CondensrError::LinkInvalidUrl(_) => "E010",
            CondensrError::LinkAliasTaken(_) => "E011",
            CondensrError::LinkInvalidExpireTime(_) => "E012",
            CondensrError::LinkInvalidMetadata(_) => "E013",
            CondensrError::LinkExpired(_) => "E014",
            CondensrError::LinkClickLimitReached(_) => "E015",
            CondensrError::LinkPasswordRequired(_) => "E016",
            CondensrError::LinkPasswordIncorrect(_) => "E017",
            CondensrError::PasswordHash(_) => "E018",
            CondensrError::AuthFailed(_) => "E020",
            CondensrError::TokenInvalid(_) => "E021",
            CondensrError::Forbidden(_) => "E022",
            CondensrError::UserEmailTaken(_) => "E023",
            CondensrError::UserInactive(_) => "E024",
            CondensrError::UserWeakPassword(_) => "E025",
            CondensrError::AnalyticsInvalidPeriod(_) => "E030",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            CondensrError::DatabaseConfig(_) => "Database Configuration Error",
            CondensrError::DatabaseConnection(_) => "Database Connection Error",
            CondensrError::DatabaseOperation(_) => "Database Operation Error",
            CondensrError::FileOperation(_) => "File Operation Error",
            CondensrError::Serialization(_) => "Serialization Error",
            CondensrError::Validation(_) => "Validation Error",
            CondensrError::NotFound(_) => "Resource Not Found",
            CondensrError::LinkInvalidUrl(_) => "Invalid URL",
            CondensrError::LinkAliasTaken(_) => "Alias Unavailable",
            CondensrError::LinkInvalidExpireTime(_) => "Invalid Expiration Time",
            CondensrError::LinkInvalidMetadata(_) => "Invalid Metadata",
            CondensrError::LinkExpired(_) => "Link Expired",
            CondensrError::LinkClickLimitReached(_) => "Click Limit Reached",
            CondensrError::LinkPasswordRequired(_) => "Password Required",
            CondensrError::LinkPasswordIncorrect(_) => "Incorrect Password",
            CondensrError::PasswordHash(_) => "Password Hash Error",
            CondensrError::AuthFailed(_) => "Authentication Failed",
            CondensrError::TokenInvalid(_) => "Invalid Token",
            CondensrError::Forbidden(_) => "Forbidden",
            CondensrError::UserEmailTaken(_) => "Email Already Registered",
            CondensrError::UserInactive(_) => "Account Not Active",
            CondensrError::UserWeakPassword(_) => "Weak Password",
            CondensrError::AnalyticsInvalidPeriod(_) => "Invalid Analytics Period",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            CondensrError::DatabaseConfig(msg)
            | CondensrError::DatabaseConnection(msg)
            | CondensrError::DatabaseOperation(msg)
            | CondensrError::FileOperation(msg)
            | CondensrError::Serialization(msg)
            | CondensrError::Validation(msg)
            | CondensrError::NotFound(msg)
            | CondensrError::LinkInvalidUrl(msg)
            | CondensrError::LinkAliasTaken(msg)
            | CondensrError::LinkInvalidExpireTime(msg)
            | CondensrError::LinkInvalidMetadata(msg)
            | CondensrError::LinkExpired(msg)
            | CondensrError::LinkClickLimitReached(msg)
            | CondensrError::LinkPasswordRequired(msg)
            | CondensrError::LinkPasswordIncorrect(msg)
            | CondensrError::PasswordHash(msg)
            | CondensrError::AuthFailed(msg)
            | CondensrError::TokenInvalid(msg)
            | CondensrError::Forbidden(msg)
            | CondensrError::UserEmailTaken(msg)
            | CondensrError::UserInactive(msg)
            | CondensrError::UserWeakPassword(msg)
            | CondensrError::AnalyticsInvalidPeriod(msg) => msg,
        }
    }

    /// HTTP status used when this error reaches an API handler
    pub fn http_status(&self) -> StatusCode {
        match self {
            CondensrError::Validation(_)
            | CondensrError::LinkInvalidUrl(_)
            | CondensrError::LinkInvalidExpireTime(_)
            | CondensrError::LinkInvalidMetadata(_)
            | CondensrError::UserWeakPassword(_)
            | CondensrError::AnalyticsInvalidPeriod(_) => StatusCode::BAD_REQUEST,
            CondensrError::NotFound(_) => StatusCode::NOT_FOUND,
            CondensrError::LinkAliasTaken(_) | CondensrError::UserEmailTaken(_) => {
                StatusCode::CONFLICT
            }
            CondensrError::LinkExpired(_) | CondensrError::LinkClickLimitReached(_) => {
                StatusCode::GONE
            }
            CondensrError::LinkPasswordRequired(_)
            | CondensrError::AuthFailed(_)
            | CondensrError::TokenInvalid(_) => StatusCode::UNAUTHORIZED,
            CondensrError::LinkPasswordIncorrect(_)
            | CondensrError::Forbidden(_)
            | CondensrError::UserInactive(_) => StatusCode::FORBIDDEN,
            CondensrError::DatabaseConfig(_)
            | CondensrError::DatabaseConnection(_)
            | CondensrError::DatabaseOperation(_)
            | CondensrError::FileOperation(_)
            | CondensrError::Serialization(_)
            | CondensrError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端输出）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for CondensrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CondensrError {}

// 便捷的构造函数
impl CondensrError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        CondensrError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        CondensrError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        CondensrError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        CondensrError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        CondensrError::Serialization(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        CondensrError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        CondensrError::NotFound(msg.into())
    }

    pub fn link_invalid_url<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkInvalidUrl(msg.into())
    }

    pub fn link_alias_taken<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkAliasTaken(msg.into())
    }

    pub fn link_invalid_expire_time<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkInvalidExpireTime(msg.into())
    }

    pub fn link_invalid_metadata<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkInvalidMetadata(msg.into())
    }

    pub fn link_expired<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkExpired(msg.into())
    }

    pub fn link_click_limit_reached<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkClickLimitReached(msg.into())
    }

    pub fn link_password_required<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkPasswordRequired(msg.into())
    }

    pub fn link_password_incorrect<T: Into<String>>(msg: T) -> Self {
        CondensrError::LinkPasswordIncorrect(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        CondensrError::PasswordHash(msg.into())
    }

    pub fn auth_failed<T: Into<String>>(msg: T) -> Self {
        CondensrError::AuthFailed(msg.into())
    }

    pub fn token_invalid<T: Into<String>>(msg: T) -> Self {
        CondensrError::TokenInvalid(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        CondensrError::Forbidden(msg.into())
    }

    pub fn user_email_taken<T: Into<String>>(msg: T) -> Self {
        CondensrError::UserEmailTaken(msg.into())
    }

    pub fn user_inactive<T: Into<String>>(msg: T) -> Self {
        CondensrError::UserInactive(msg.into())
    }

    pub fn user_weak_password<T: Into<String>>(msg: T) -> Self {
        CondensrError::UserWeakPassword(msg.into())
    }

    pub fn analytics_invalid_period<T: Into<String>>(msg: T) -> Self {
        CondensrError::AnalyticsInvalidPeriod(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for CondensrError {
    fn from(err: sea_orm::DbErr) -> Self {
        CondensrError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for CondensrError {
    fn from(err: std::io::Error) -> Self {
        CondensrError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CondensrError {
    fn from(err: serde_json::Error) -> Self {
        CondensrError::Serialization(err.to_string())
    }
}

impl From<crate::utils::password::PasswordError> for CondensrError {
    fn from(err: crate::utils::password::PasswordError) -> Self {
        CondensrError::PasswordHash(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CondensrError>;
