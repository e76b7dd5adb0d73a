pub mod alias;
pub mod device;
pub mod ip;
pub mod metadata;
pub mod password;
pub mod qr;
pub mod time_parser;
pub mod url_validator;

pub use alias::{sanitize_alias, suggest_alias};
pub use metadata::validate_metadata;
pub use password::{PasswordStrength, password_strength};
pub use url_validator::validate_url;

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    // 随机选择字母和数字
    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// Round to one decimal place, the precision used for bucket percentages
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_code() {
        let code = generate_random_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_random_code(16), generate_random_code(16));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
