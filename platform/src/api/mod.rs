use async_trait::async_trait;

use crate::{
    catalog::Theme,
    error::ApiError,
    session::{Cookies, QrChallenge, QrPoll, Session},
};

pub use self::http::{
    ClientConfig, Endpoints, HttpLiveApi, DEFAULT_REQUEST_TIMEOUT, LIVE_BASE, PASSPORT_BASE,
};

mod envelope;
mod http;

/// Longest title, in characters, the platform accepts.
pub const MAX_TITLE_CHARS: usize = 20;

/// Where to push the stream once a broadcast has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    pub server_address: String,
    pub stream_key: String,
}

/// Operations against the live streaming platform.
///
/// Implementations hold no session state: credentials are passed to every
/// authenticated call. Failures are always returned, never panicked.
#[async_trait]
pub trait LiveApi: Send + Sync {
    /// Requests a new QR login challenge.
    async fn issue_qr_challenge(&self) -> Result<QrChallenge, ApiError>;

    /// Asks for the current status of a QR challenge.
    async fn poll_qr_status(&self, qr_key: &str) -> Result<QrPoll, ApiError>;

    /// Looks up the live room of the user the cookies belong to.
    async fn resolve_room_identity(&self, cookies: &Cookies) -> Result<u64, ApiError>;

    /// Downloads the full category taxonomy.
    async fn fetch_categories(&self, session: &Session) -> Result<Vec<Theme>, ApiError>;

    /// Starts a broadcast in `category_id`.
    async fn start_broadcast(
        &self,
        session: &Session,
        category_id: u32,
    ) -> Result<StreamEndpoint, ApiError>;

    async fn stop_broadcast(&self, session: &Session) -> Result<(), ApiError>;

    /// Changes the room title. Titles over [MAX_TITLE_CHARS] are refused locally.
    async fn update_title(&self, session: &Session, title: &str) -> Result<(), ApiError>;
}

/// Refuses titles the platform would reject for their length.
pub fn validate_title(title: &str) -> Result<(), ApiError> {
    let length = title.chars().count();

    if length > MAX_TITLE_CHARS {
        return Err(ApiError::Validation(format!(
            "title is {length} characters long, at most {MAX_TITLE_CHARS} are allowed"
        )));
    }

    Ok(())
}
