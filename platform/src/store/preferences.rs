use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User preferences persisted between runs.
///
/// Keys this crate does not know about are kept untouched so files written by
/// other front ends survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_area_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_area_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_title: Option<String>,
    /// Persist the session after a successful login
    #[serde(default = "default_auto_save_cookies")]
    pub auto_save_cookies: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_auto_save_cookies() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            last_area_theme: None,
            last_area_name: None,
            last_title: None,
            auto_save_cookies: default_auto_save_cookies(),
            extra: Map::new(),
        }
    }
}
