use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cookie name holding the logged in user's id.
pub const USER_ID_COOKIE: &str = "DedeUserID";
/// Cookie name holding the CSRF token expected by every form post.
pub const CSRF_COOKIE: &str = "bili_jct";

/// Cookie name to value mapping, as captured from the login response.
pub type Cookies = BTreeMap<String, String>;

/// Credentials of an authenticated streamer.
///
/// A [Session] only exists fully populated: there is no way to build one
/// without a room id and a csrf token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque cookies issued by the platform
    pub cookies: Cookies,
    /// The live room bound to the user
    pub room_id: u64,
    /// CSRF token sent alongside every form post
    pub csrf: String,
}

impl Session {
    pub fn new(cookies: Cookies, room_id: u64, csrf: impl Into<String>) -> Self {
        Session {
            cookies,
            room_id,
            csrf: csrf.into(),
        }
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        cookies_to_string(&self.cookies)
    }
}

/// Joins cookies as `key=value` pairs separated by `; `.
pub fn cookies_to_string(cookies: &Cookies) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<String>>()
        .join("; ")
}

/// Parses a `key=value; key2=value2` string. Items without `=` are skipped.
pub fn cookies_from_str(raw: &str) -> Cookies {
    raw.split(';')
        .filter_map(|item| {
            let (name, value) = item.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// On-disk shape of a [Session].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub room_id: u64,
    pub cookies: String,
    pub csrf: String,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        SessionRecord {
            room_id: session.room_id,
            cookies: session.cookie_header(),
            csrf: session.csrf.clone(),
        }
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = String;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        let cookies = cookies_from_str(&record.cookies);

        if cookies.is_empty() {
            return Err("no cookies".into());
        }
        if record.csrf.is_empty() {
            return Err("no csrf token".into());
        }
        if record.room_id == 0 {
            return Err("no room id".into());
        }

        Ok(Session::new(cookies, record.room_id, record.csrf))
    }
}
