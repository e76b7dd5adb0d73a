//! Alias helpers: sanitizing user input and suggesting an alias from a URL

use url::Url;

use super::generate_random_code;

const SUGGESTED_ALIAS_MAX_LEN: usize = 20;
const RANDOM_ALIAS_LEN: usize = 8;

/// Keep only `[a-zA-Z0-9-]`
pub fn sanitize_alias(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// 从目标地址生成别名建议
///
/// host（去掉 `www.`）与非空路径段用 `-` 连接，截断到 20 个字符后清洗并转小写。
/// 结果为空（或 URL 无法解析）时返回 8 位随机别名。
pub fn suggest_alias(url: &str) -> String {
    let suggestion = Url::parse(url.trim())
        .ok()
        .and_then(|parsed| {
            let host = parsed.host_str()?.trim_start_matches("www.").to_string();
            let mut parts = vec![host];
            if let Some(segments) = parsed.path_segments() {
                parts.extend(segments.filter(|s| !s.is_empty()).map(str::to_string));
            }
            let joined: String = parts
                .join("-")
                .chars()
                .take(SUGGESTED_ALIAS_MAX_LEN)
                .collect();
            Some(sanitize_alias(&joined).to_lowercase())
        })
        .unwrap_or_default();

    if suggestion.is_empty() {
        generate_random_code(RANDOM_ALIAS_LEN).to_lowercase()
    } else {
        suggestion
    }
}
