use std::time::Instant;

use super::credentials::Cookies;

/// Status codes carried in the `data.code` field of a QR poll response.
pub mod codes {
    pub const CONFIRMED: i64 = 0;
    pub const EXPIRED: i64 = 86038;
    pub const SCANNED: i64 = 86090;
    pub const PENDING: i64 = 86101;
}

/// A freshly issued QR login challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrChallenge {
    /// Key identifying the challenge when polling
    pub qr_key: String,
    /// URL to encode into the QR code
    pub url: String,
}

/// Outcome of a single QR status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum QrPoll {
    /// Nobody has scanned the code yet
    Pending,
    /// Scanned on a phone, waiting for the user to confirm
    Scanned,
    /// Confirmed; carries the cookies set by the response
    Confirmed(Cookies),
    /// The challenge timed out on the platform side
    Expired,
    /// The poll itself failed or returned something unexpected
    RequestError(String),
}

impl QrPoll {
    /// Maps a platform status code to an outcome. Unknown codes are errors.
    pub fn from_code(code: i64, cookies: Cookies) -> Self {
        match code {
            codes::CONFIRMED if cookies.is_empty() => {
                QrPoll::RequestError("login confirmed without any cookies".into())
            }
            codes::CONFIRMED => QrPoll::Confirmed(cookies),
            codes::EXPIRED => QrPoll::Expired,
            codes::SCANNED => QrPoll::Scanned,
            codes::PENDING => QrPoll::Pending,
            other => QrPoll::RequestError(format!("unknown login status code {other}")),
        }
    }

    /// Whether polling has to stop after this outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QrPoll::Confirmed(_) | QrPoll::Expired | QrPoll::RequestError(_)
        )
    }

    pub fn status(&self) -> QrStatus {
        match self {
            QrPoll::Pending => QrStatus::Pending,
            QrPoll::Scanned => QrStatus::Scanned,
            QrPoll::Confirmed(_) => QrStatus::Confirmed,
            QrPoll::Expired => QrStatus::Expired,
            QrPoll::RequestError(_) => QrStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrStatus {
    Pending,
    Scanned,
    Confirmed,
    Expired,
    Failed,
}

/// Identifies the polling task bound to one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollTicket(pub(crate) u64);

/// A QR login in progress. Lives only as long as the login page does.
#[derive(Debug, Clone)]
pub struct QrLoginAttempt {
    pub challenge: QrChallenge,
    pub issued_at: Instant,
    pub status: QrStatus,
    pub ticket: PollTicket,
}

impl QrLoginAttempt {
    pub fn new(challenge: QrChallenge, ticket: PollTicket) -> Self {
        QrLoginAttempt {
            challenge,
            issued_at: Instant::now(),
            status: QrStatus::Pending,
            ticket,
        }
    }
}
