//! 客户端 IP 与地区提取
//!
//! 连接来自私有地址（反向代理）时信任 X-Forwarded-For / X-Real-IP，
//! 否则使用连接地址，防止伪造。

use std::net::IpAddr;

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10
        }
    }
}

/// 从 HttpRequest 提取真实客户端 IP
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let forwarded = extract_forwarded_ip_from_headers(req.headers());

    let Some(peer) = req.peer_addr() else {
        return forwarded;
    };

    if is_private_or_local(&peer.ip())
        && let Some(real_ip) = forwarded
    {
        debug!("Proxy at {} forwarded client {}", peer.ip(), real_ip);
        return Some(real_ip);
    }

    Some(peer.ip().to_string())
}

/// 从请求头提取转发的 IP（X-Forwarded-For 优先，其次 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Visitor country from the edge header (`XX` means unknown to Cloudflare)
pub fn extract_country(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("xx"))
}

/// xxHash64 of the address, 16 hex chars
#[inline]
pub fn hash_ip(ip: &str) -> String {
    format!("{:016x}", xxh64(ip.as_bytes(), 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                HeaderName::from_static(k),
                HeaderValue::from_static(v),
            );
        }
        map
    }

    #[test]
    fn test_is_private_or_local() {
        assert!(is_private_or_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"fd00::1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(
            &"2001:4860:4860::8888".parse().unwrap()
        ));
    }

    #[test]
    fn test_forwarded_ip_prefers_first_hop() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.2"),
            ("x-real-ip", "198.51.100.1"),
        ]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&map).as_deref(),
            Some("203.0.113.9")
        );

        let map = headers(&[("x-real-ip", "198.51.100.1")]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&map).as_deref(),
            Some("198.51.100.1")
        );
    }

    #[test]
    fn test_extract_country() {
        let map = headers(&[("cf-ipcountry", "BR")]);
        assert_eq!(extract_country(&map, "CF-IPCountry").as_deref(), Some("BR"));

        let map = headers(&[("cf-ipcountry", "XX")]);
        assert!(extract_country(&map, "CF-IPCountry").is_none());
        assert!(extract_country(&HeaderMap::new(), "CF-IPCountry").is_none());
    }

    #[test]
    fn test_hash_ip_is_stable() {
        assert_eq!(hash_ip("1.2.3.4"), hash_ip("1.2.3.4"));
        assert_ne!(hash_ip("1.2.3.4"), hash_ip("1.2.3.5"));
        assert_eq!(hash_ip("1.2.3.4").len(), 16);
    }
}
