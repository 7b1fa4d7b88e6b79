use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingSystem {
    Android,
    #[serde(rename = "iOS")]
    Ios,
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    Chrome,
    Edge,
    Safari,
    Firefox,
    Opera,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub operating_system: OperatingSystem,
    pub browser: Browser,
}

struct Patterns {
    mobile: Regex,
    android: Regex,
    ios: Regex,
    windows: Regex,
    mac: Regex,
    linux: Regex,
    edge: Regex,
    opera: Regex,
    chrome: Regex,
    firefox: Regex,
    safari: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        mobile: Regex::new(r"(?i)mobi|android|iphone|ipad|ipod").expect("regex"),
        android: Regex::new(r"(?i)android").expect("regex"),
        ios: Regex::new(r"(?i)iphone|ipad|ipod").expect("regex"),
        windows: Regex::new(r"(?i)windows").expect("regex"),
        mac: Regex::new(r"(?i)macintosh|mac os x").expect("regex"),
        linux: Regex::new(r"(?i)linux").expect("regex"),
        edge: Regex::new(r"(?i)\bedg(e|a|ios)?/").expect("regex"),
        opera: Regex::new(r"(?i)\bopr/|\bopera").expect("regex"),
        chrome: Regex::new(r"(?i)\bchrome/|\bcrios/").expect("regex"),
        firefox: Regex::new(r"(?i)\bfirefox/|\bfxios/").expect("regex"),
        safari: Regex::new(r"(?i)\bsafari/").expect("regex"),
    })
}

/// Classifies a user-agent string. Checks are ordered and mutually
/// exclusive: Android before Linux, iOS before macOS, Edge and Opera before
/// Chrome, Safari only once Chrome is ruled out.
pub fn classify(user_agent: &str) -> DeviceInfo {
    let p = patterns();

    let device_type = if p.mobile.is_match(user_agent) {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    };

    let operating_system = if p.android.is_match(user_agent) {
        OperatingSystem::Android
    } else if p.ios.is_match(user_agent) {
        OperatingSystem::Ios
    } else if p.windows.is_match(user_agent) {
        OperatingSystem::Windows
    } else if p.mac.is_match(user_agent) {
        OperatingSystem::MacOs
    } else if p.linux.is_match(user_agent) {
        OperatingSystem::Linux
    } else {
        OperatingSystem::Unknown
    };

    let browser = if p.edge.is_match(user_agent) {
        Browser::Edge
    } else if p.opera.is_match(user_agent) {
        Browser::Opera
    } else if p.chrome.is_match(user_agent) {
        Browser::Chrome
    } else if p.firefox.is_match(user_agent) {
        Browser::Firefox
    } else if p.safari.is_match(user_agent) {
        Browser::Safari
    } else {
        Browser::Unknown
    };

    DeviceInfo {
        device_type,
        operating_system,
        browser,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.2792.79";
    const OPERA_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36 OPR/114.0.0.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Mobile Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0";

    #[test]
    fn edge_and_opera_win_over_chrome() {
        assert_eq!(classify(EDGE_WINDOWS).browser, Browser::Edge);
        assert_eq!(classify(OPERA_MAC).browser, Browser::Opera);
        assert_eq!(classify(CHROME_WINDOWS).browser, Browser::Chrome);
    }

    #[test]
    fn safari_only_without_chrome() {
        let info = classify(SAFARI_IPHONE);
        assert_eq!(info.browser, Browser::Safari);
        assert_eq!(info.operating_system, OperatingSystem::Ios);
        assert_eq!(info.device_type, DeviceType::Mobile);
    }

    #[test]
    fn android_is_not_reported_as_linux() {
        let info = classify(CHROME_ANDROID);
        assert_eq!(info.operating_system, OperatingSystem::Android);
        assert_eq!(info.browser, Browser::Chrome);
        assert_eq!(info.device_type, DeviceType::Mobile);
    }

    #[test]
    fn desktop_platforms() {
        let linux = classify(FIREFOX_LINUX);
        assert_eq!(linux.operating_system, OperatingSystem::Linux);
        assert_eq!(linux.browser, Browser::Firefox);
        assert_eq!(linux.device_type, DeviceType::Desktop);
        assert_eq!(classify(OPERA_MAC).operating_system, OperatingSystem::MacOs);
        assert_eq!(classify(CHROME_WINDOWS).operating_system, OperatingSystem::Windows);
    }

    #[test]
    fn unrecognized_agent_is_unknown_desktop() {
        let info = classify("curl/8.5.0");
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.operating_system, OperatingSystem::Unknown);
        assert_eq!(info.browser, Browser::Unknown);
    }

    #[test]
    fn labels_serialize_to_closed_vocabulary() {
        assert_eq!(serde_json::to_string(&OperatingSystem::Ios).expect("json"), "\"iOS\"");
        assert_eq!(serde_json::to_string(&OperatingSystem::MacOs).expect("json"), "\"macOS\"");
        assert_eq!(serde_json::to_string(&Browser::Unknown).expect("json"), "\"unknown\"");
        assert_eq!(serde_json::to_string(&DeviceType::Desktop).expect("json"), "\"desktop\"");
    }
}
