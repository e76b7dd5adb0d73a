//! Device class and browser detection from the User-Agent header

use serde::{Deserialize, Serialize};
use woothee::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    /// Bucket order used by every device breakdown
    pub const ALL: [DeviceType; 3] = [DeviceType::Desktop, DeviceType::Mobile, DeviceType::Tablet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Mobile => "Mobile",
            Self::Tablet => "Tablet",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            _ => Err(format!(
                "Invalid device type: '{}'. Valid: Desktop, Mobile, Tablet",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub device: DeviceType,
    pub browser: String,
}

pub const UNKNOWN_BROWSER: &str = "Unknown";

/// 解析 UA，得到设备类型与浏览器名称
///
/// woothee 不区分平板，iPad 与不带 `Mobile` 标记的 Android 归为 Tablet。
pub fn classify_user_agent(user_agent: &str) -> ClientInfo {
    let parser = Parser::new();
    let Some(result) = parser.parse(user_agent) else {
        return ClientInfo {
            device: DeviceType::Desktop,
            browser: UNKNOWN_BROWSER.to_string(),
        };
    };

    let is_tablet = result.os == "iPad"
        || user_agent.contains("Tablet")
        || (user_agent.contains("Android") && !user_agent.contains("Mobile"));

    let device = if is_tablet {
        DeviceType::Tablet
    } else {
        match result.category {
            "smartphone" | "mobilephone" => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        }
    };

    let browser = if result.name.is_empty() || result.name == "UNKNOWN" {
        UNKNOWN_BROWSER.to_string()
    } else {
        result.name.to_string()
    };

    ClientInfo { device, browser }
}
