pub use self::{
    credentials::{
        cookies_from_str, cookies_to_string, Cookies, Session, SessionRecord, CSRF_COOKIE,
        USER_ID_COOKIE,
    },
    login::{codes, PollTicket, QrChallenge, QrLoginAttempt, QrPoll, QrStatus},
    manager::{redact, BroadcastState, LoginProgress, LoginState, SessionManager},
    schedule::{PollSchedule, DEFAULT_POLL_INTERVAL},
};

mod credentials;
mod login;
mod manager;
mod schedule;
