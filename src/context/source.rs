use serde::{Deserialize, Serialize};

use super::device::{classify, Browser, DeviceType, OperatingSystem};
use crate::navigation::Location;
use crate::util::text::non_blank;

pub const SOURCE_PARAMS: &[&str] = &["source", "utm_source"];

/// Where a vote came from and what it was cast on. Every field is optional;
/// absent fields are omitted from the wire and from the persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<OperatingSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<Browser>,
}

impl SourceContext {
    /// Values derivable from the current location and user agent, with no
    /// stored fallback applied.
    pub fn derive(location: &Location, user_agent: Option<&str>) -> Self {
        let source = SOURCE_PARAMS
            .iter()
            .find_map(|name| non_blank(location.query_param(name)));
        let device = non_blank(user_agent).map(|ua| classify(&ua));
        Self {
            source,
            country: non_blank(location.query_param("country")),
            state: non_blank(location.query_param("state")),
            city: non_blank(location.query_param("city")),
            device_type: device.map(|d| d.device_type),
            operating_system: device.map(|d| d.operating_system),
            browser: device.map(|d| d.browser),
        }
    }

    /// Fresh values win wherever they are present; everything else keeps the
    /// stored value.
    pub fn merged_over(self, stored: &SourceContext) -> SourceContext {
        SourceContext {
            source: self.source.or_else(|| stored.source.clone()),
            country: self.country.or_else(|| stored.country.clone()),
            state: self.state.or_else(|| stored.state.clone()),
            city: self.city.or_else(|| stored.city.clone()),
            device_type: self.device_type.or(stored.device_type),
            operating_system: self.operating_system.or(stored.operating_system),
            browser: self.browser.or(stored.browser),
        }
    }
}
