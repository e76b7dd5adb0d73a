//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::CondensrError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 链接错误
/// - 4000-4099: 用户错误
/// - 6000-6099: Analytics 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,

    // 链接错误 3000-3099
    LinkAliasTaken = 3001,
    LinkInvalidUrl = 3002,
    LinkInvalidExpireTime = 3003,
    LinkPasswordHashError = 3004,
    LinkInvalidMetadata = 3005,
    LinkExpired = 3006,
    LinkClickLimitReached = 3007,
    LinkPasswordRequired = 3008,
    LinkPasswordIncorrect = 3009,

    // 用户错误 4000-4099
    UserEmailTaken = 4000,
    UserInactive = 4001,
    UserWeakPassword = 4002,

    // Analytics 错误 6000-6099
    AnalyticsInvalidPeriod = 6002,
}

impl From<&CondensrError> for ErrorCode {
    fn from(err: &CondensrError) -> Self {
        match err {
            CondensrError::Validation(_) => ErrorCode::BadRequest,
            CondensrError::NotFound(_) => ErrorCode::NotFound,
            CondensrError::Forbidden(_) => ErrorCode::Forbidden,
            CondensrError::DatabaseConnection(_) => ErrorCode::ServiceUnavailable,
            CondensrError::DatabaseConfig(_)
            | CondensrError::DatabaseOperation(_)
            | CondensrError::FileOperation(_)
            | CondensrError::Serialization(_) => ErrorCode::InternalServerError,

            CondensrError::AuthFailed(_) => ErrorCode::AuthFailed,
            CondensrError::TokenInvalid(_) => ErrorCode::TokenInvalid,

            CondensrError::LinkAliasTaken(_) => ErrorCode::LinkAliasTaken,
            CondensrError::LinkInvalidUrl(_) => ErrorCode::LinkInvalidUrl,
            CondensrError::LinkInvalidExpireTime(_) => ErrorCode::LinkInvalidExpireTime,
            CondensrError::PasswordHash(_) => ErrorCode::LinkPasswordHashError,
            CondensrError::LinkInvalidMetadata(_) => ErrorCode::LinkInvalidMetadata,
            CondensrError::LinkExpired(_) => ErrorCode::LinkExpired,
            CondensrError::LinkClickLimitReached(_) => ErrorCode::LinkClickLimitReached,
            CondensrError::LinkPasswordRequired(_) => ErrorCode::LinkPasswordRequired,
            CondensrError::LinkPasswordIncorrect(_) => ErrorCode::LinkPasswordIncorrect,

            CondensrError::UserEmailTaken(_) => ErrorCode::UserEmailTaken,
            CondensrError::UserInactive(_) => ErrorCode::UserInactive,
            CondensrError::UserWeakPassword(_) => ErrorCode::UserWeakPassword,

            CondensrError::AnalyticsInvalidPeriod(_) => ErrorCode::AnalyticsInvalidPeriod,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::LinkAliasTaken).unwrap(),
            "3001"
        );
    }

    #[test]
    fn test_groups_by_thousands() {
        let cases = [
            (CondensrError::validation("x"), 1),
            (CondensrError::token_invalid("x"), 2),
            (CondensrError::link_expired("x"), 3),
            (CondensrError::user_email_taken("x"), 4),
            (CondensrError::analytics_invalid_period("x"), 6),
        ];
        for (err, group) in cases {
            assert_eq!(ErrorCode::from(&err) as i32 / 1000, group, "{:?}", err);
        }
    }
}
