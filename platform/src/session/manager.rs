use tracing::{debug, info, warn};

use super::{
    credentials::{Cookies, Session, CSRF_COOKIE},
    login::{PollTicket, QrChallenge, QrLoginAttempt, QrPoll, QrStatus},
};
use crate::{
    api::{validate_title, LiveApi, StreamEndpoint},
    catalog::Theme,
    error::ApiError,
    store::Store,
};

/// Where the login workflow currently stands.
#[derive(Debug, Clone)]
pub enum LoginState {
    LoggedOut,
    /// A QR code is on screen and being polled
    AwaitingScan(QrLoginAttempt),
    /// Cookies were captured, the room is being resolved
    Authenticating,
    LoggedIn,
    /// The QR code timed out; a new login has to be started
    Expired,
}

/// What a poll did to the login workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginProgress {
    /// Nothing scanned yet, keep polling
    Waiting,
    /// Scanned, waiting for confirmation on the phone, keep polling
    Scanned,
    /// Logged in to the given room, stop polling
    LoggedIn { room_id: u64 },
    /// The QR code expired, stop polling
    Expired,
    /// The login failed, stop polling
    Failed(String),
    /// The ticket is not the current one; the result was discarded
    Stale,
}

impl LoginProgress {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoginProgress::Waiting | LoginProgress::Scanned)
    }
}

/// Streaming endpoint of the running broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastState {
    pub active: bool,
    pub server_address: Option<String>,
    pub stream_key: Option<String>,
}

/// Owns the login workflow, the session credentials and the broadcast state.
///
/// All transitions happen through `&mut self`, the owner is expected to drive
/// it from a single task.
pub struct SessionManager<A: LiveApi> {
    api: A,
    store: Store,
    state: LoginState,
    session: Option<Session>,
    broadcast: BroadcastState,
    next_ticket: u64,
    auto_save: bool,
}

fn not_logged_in() -> ApiError {
    ApiError::Validation("not logged in".into())
}

/// Shortens secrets before they reach a log line.
pub fn redact(secret: &str) -> String {
    let mut chars = secret.chars();
    let shown: String = chars.by_ref().take(10).collect();

    if chars.next().is_some() {
        format!("{shown}...")
    } else {
        shown
    }
}

impl<A: LiveApi> SessionManager<A> {
    pub fn new(api: A, store: Store) -> Self {
        SessionManager {
            api,
            store,
            state: LoginState::LoggedOut,
            session: None,
            broadcast: BroadcastState::default(),
            next_ticket: 0,
            auto_save: true,
        }
    }

    /// Whether a completed login is written to the session file.
    pub fn set_auto_save(&mut self, auto_save: bool) {
        self.auto_save = auto_save;
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn broadcast(&self) -> &BroadcastState {
        &self.broadcast
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Picks up the session saved by a previous run.
    ///
    /// A broken session file is removed. Returns the restored room id.
    pub fn restore(&mut self) -> Option<u64> {
        match self.store.load_session() {
            Ok(Some(session)) => {
                let room_id = session.room_id;
                info!(room_id, "restored saved session");

                self.session = Some(session);
                self.state = LoginState::LoggedIn;
                Some(room_id)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "discarding unreadable session file");
                if let Err(err) = self.store.clear_session() {
                    warn!(error = %err, "could not remove session file");
                }
                None
            }
        }
    }

    /// Requests a QR code and enters [LoginState::AwaitingScan].
    ///
    /// The returned ticket has to be passed to [SessionManager::poll_login]
    /// on every tick of the polling schedule.
    pub async fn begin_login(&mut self) -> Result<(QrChallenge, PollTicket), ApiError> {
        if self.is_authenticated() {
            return Err(ApiError::Validation("already logged in".into()));
        }

        let challenge = self.api.issue_qr_challenge().await?;

        self.next_ticket += 1;
        let ticket = PollTicket(self.next_ticket);
        self.state = LoginState::AwaitingScan(QrLoginAttempt::new(challenge.clone(), ticket));

        info!(qr_key = %challenge.qr_key, "waiting for qr scan");
        Ok((challenge, ticket))
    }

    /// Drops the login attempt; results of in-flight polls are discarded.
    pub fn cancel_login(&mut self) {
        if matches!(
            self.state,
            LoginState::AwaitingScan(_) | LoginState::Expired
        ) {
            debug!("login attempt cancelled");
            self.state = LoginState::LoggedOut;
        }
    }

    fn is_current(&self, ticket: PollTicket) -> bool {
        matches!(&self.state, LoginState::AwaitingScan(attempt) if attempt.ticket == ticket)
    }

    /// Polls the QR status once and applies the outcome.
    pub async fn poll_login(&mut self, ticket: PollTicket) -> LoginProgress {
        let qr_key = match &self.state {
            LoginState::AwaitingScan(attempt) if attempt.ticket == ticket => {
                attempt.challenge.qr_key.clone()
            }
            _ => return LoginProgress::Stale,
        };

        let poll = self
            .api
            .poll_qr_status(&qr_key)
            .await
            .unwrap_or_else(|err| QrPoll::RequestError(err.to_string()));

        self.apply_poll(ticket, poll).await
    }

    /// Applies a poll outcome fetched for `ticket`.
    ///
    /// Outcomes for a cancelled or superseded ticket change nothing.
    pub async fn apply_poll(&mut self, ticket: PollTicket, poll: QrPoll) -> LoginProgress {
        if !self.is_current(ticket) {
            debug!(?ticket, "discarding stale poll result");
            return LoginProgress::Stale;
        }

        if let LoginState::AwaitingScan(attempt) = &mut self.state {
            attempt.status = poll.status();
        }

        match poll {
            QrPoll::Pending => LoginProgress::Waiting,
            QrPoll::Scanned => LoginProgress::Scanned,
            QrPoll::Expired => {
                info!("qr code expired");
                self.state = LoginState::Expired;
                LoginProgress::Expired
            }
            QrPoll::RequestError(reason) => {
                warn!(%reason, "qr login failed");
                self.state = LoginState::LoggedOut;
                LoginProgress::Failed(reason)
            }
            QrPoll::Confirmed(cookies) => self.complete_login(cookies).await,
        }
    }

    /// Turns captured cookies into a session. Nothing is kept on failure.
    async fn complete_login(&mut self, cookies: Cookies) -> LoginProgress {
        self.state = LoginState::Authenticating;

        let room_id = match self.api.resolve_room_identity(&cookies).await {
            Ok(room_id) => room_id,
            Err(err) => {
                warn!(error = %err, "could not resolve the live room");
                self.state = LoginState::LoggedOut;
                return LoginProgress::Failed(format!("could not resolve the live room: {err}"));
            }
        };
        let Some(csrf) = cookies.get(CSRF_COOKIE).cloned() else {
            warn!("login cookies carry no csrf token");
            self.state = LoginState::LoggedOut;
            return LoginProgress::Failed(format!("no {CSRF_COOKIE} cookie after login"));
        };

        let session = Session::new(cookies, room_id, csrf);
        if self.auto_save {
            if let Err(err) = self.store.save_session(&session) {
                warn!(error = %err, "could not persist the session");
            }
        }

        info!(room_id, csrf = %redact(&session.csrf), "logged in");
        self.session = Some(session);
        self.state = LoginState::LoggedIn;

        LoginProgress::LoggedIn { room_id }
    }

    /// Forgets the session and the broadcast. Safe to call at any time.
    pub fn logout(&mut self) {
        let was_logged_in = self.session.take().is_some();
        self.broadcast = BroadcastState::default();
        self.state = LoginState::LoggedOut;

        if let Err(err) = self.store.clear_session() {
            warn!(error = %err, "could not remove session file");
        }
        if let Err(err) = self.store.clear_stream_credentials() {
            warn!(error = %err, "could not remove stream credentials file");
        }

        if was_logged_in {
            info!("logged out");
        }
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Theme>, ApiError> {
        let session = self.session.as_ref().ok_or_else(not_logged_in)?;

        self.api.fetch_categories(session).await
    }

    pub async fn update_title(&self, title: &str) -> Result<(), ApiError> {
        validate_title(title)?;
        let session = self.session.as_ref().ok_or_else(not_logged_in)?;

        self.api.update_title(session, title).await
    }

    /// Starts broadcasting in `category_id`.
    ///
    /// A credential rejection logs the user out before the error is returned.
    pub async fn start_broadcast(&mut self, category_id: u32) -> Result<StreamEndpoint, ApiError> {
        let session = self.session.as_ref().ok_or_else(not_logged_in)?;
        if self.broadcast.active {
            return Err(ApiError::Validation("already broadcasting".into()));
        }

        let endpoint = match self.api.start_broadcast(session, category_id).await {
            Ok(endpoint) => endpoint,
            Err(err) if err.is_credential() => {
                warn!(error = %err, "session rejected, logging out");
                self.logout();
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        self.broadcast = BroadcastState {
            active: true,
            server_address: Some(endpoint.server_address.clone()),
            stream_key: Some(endpoint.stream_key.clone()),
        };
        if let Err(err) = self
            .store
            .save_stream_credentials(&endpoint.server_address, &endpoint.stream_key)
        {
            warn!(error = %err, "could not write stream credentials file");
        }

        info!(
            server = %endpoint.server_address,
            key = %redact(&endpoint.stream_key),
            "broadcast is live"
        );
        Ok(endpoint)
    }

    pub async fn stop_broadcast(&mut self) -> Result<(), ApiError> {
        let session = self.session.as_ref().ok_or_else(not_logged_in)?;

        self.api.stop_broadcast(session).await?;

        self.broadcast = BroadcastState::default();
        if let Err(err) = self.store.clear_stream_credentials() {
            warn!(error = %err, "could not remove stream credentials file");
        }

        Ok(())
    }

    /// Status of the login attempt on screen, if any.
    pub fn qr_status(&self) -> Option<QrStatus> {
        match &self.state {
            LoginState::AwaitingScan(attempt) => Some(attempt.status),
            LoginState::Expired => Some(QrStatus::Expired),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;

    use super::*;
    use crate::session::{codes, USER_ID_COOKIE};

    /// Scripted [LiveApi] returning canned answers and counting calls.
    #[derive(Default)]
    struct FakeApi {
        polls: Mutex<VecDeque<Result<QrPoll, ApiError>>>,
        room: Mutex<Option<Result<u64, ApiError>>>,
        start: Mutex<Option<Result<StreamEndpoint, ApiError>>>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeApi {
        fn with_polls(polls: Vec<Result<QrPoll, ApiError>>) -> Self {
            FakeApi {
                polls: Mutex::new(polls.into()),
                room: Mutex::new(Some(Ok(5440))),
                ..Default::default()
            }
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LiveApi for FakeApi {
        async fn issue_qr_challenge(&self) -> Result<QrChallenge, ApiError> {
            self.hit();
            Ok(QrChallenge {
                qr_key: "key-1".into(),
                url: "https://example.com/qr?key-1".into(),
            })
        }

        async fn poll_qr_status(&self, _qr_key: &str) -> Result<QrPoll, ApiError> {
            self.hit();
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(QrPoll::Pending))
        }

        async fn resolve_room_identity(&self, _cookies: &Cookies) -> Result<u64, ApiError> {
            self.hit();
            self.room
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(ApiError::NotFound("room".into())))
        }

        async fn fetch_categories(&self, _session: &Session) -> Result<Vec<Theme>, ApiError> {
            self.hit();
            Ok(vec![])
        }

        async fn start_broadcast(
            &self,
            _session: &Session,
            _category_id: u32,
        ) -> Result<StreamEndpoint, ApiError> {
            self.hit();
            self.start
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(ApiError::Network("unscripted".into())))
        }

        async fn stop_broadcast(&self, _session: &Session) -> Result<(), ApiError> {
            self.hit();
            Ok(())
        }

        async fn update_title(&self, _session: &Session, _title: &str) -> Result<(), ApiError> {
            self.hit();
            Ok(())
        }
    }

    fn login_cookies() -> Cookies {
        [
            (USER_ID_COOKIE, "1024"),
            ("SESSDATA", "sess"),
            (CSRF_COOKIE, "csrf-token-value"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn manager(api: FakeApi) -> (tempfile::TempDir, SessionManager<FakeApi>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        (dir, SessionManager::new(api, store))
    }

    async fn logged_in(api: FakeApi) -> (tempfile::TempDir, SessionManager<FakeApi>) {
        let (dir, mut manager) = manager(api);
        let (_, ticket) = manager.begin_login().await.unwrap();
        let progress = manager
            .apply_poll(ticket, QrPoll::Confirmed(login_cookies()))
            .await;
        assert_eq!(progress, LoginProgress::LoggedIn { room_id: 5440 });

        (dir, manager)
    }

    #[test]
    fn test_redact_marks_only_real_truncation() {
        assert_eq!(redact("0123456789abcdef"), "0123456789...");
        assert_eq!(redact("0123456789"), "0123456789");
        assert_eq!(redact("密钥"), "密钥");
    }

    #[tokio::test]
    async fn test_full_login_persists_the_session() {
        let api = FakeApi::with_polls(vec![
            Ok(QrPoll::Pending),
            Ok(QrPoll::Scanned),
            Ok(QrPoll::Confirmed(login_cookies())),
        ]);
        let (_dir, mut manager) = manager(api);

        let (challenge, ticket) = manager.begin_login().await.unwrap();
        assert_eq!(challenge.qr_key, "key-1");
        assert_eq!(manager.qr_status(), Some(QrStatus::Pending));

        assert_eq!(manager.poll_login(ticket).await, LoginProgress::Waiting);
        assert_eq!(manager.poll_login(ticket).await, LoginProgress::Scanned);
        assert_eq!(manager.qr_status(), Some(QrStatus::Scanned));
        assert_eq!(
            manager.poll_login(ticket).await,
            LoginProgress::LoggedIn { room_id: 5440 }
        );

        assert!(manager.is_authenticated());
        let session = manager.session().unwrap();
        assert_eq!(session.csrf, "csrf-token-value");
        assert_eq!(manager.store().load_session().unwrap().as_ref(), Some(session));

        // the ticket is spent once logged in
        assert_eq!(manager.poll_login(ticket).await, LoginProgress::Stale);
    }

    #[tokio::test]
    async fn test_expiry_and_request_errors_are_terminal() {
        let api = FakeApi::with_polls(vec![
            Ok(QrPoll::from_code(codes::EXPIRED, Cookies::new())),
            Err(ApiError::Network("connection reset".into())),
        ]);
        let (_dir, mut manager) = manager(api);

        let (_, ticket) = manager.begin_login().await.unwrap();
        let progress = manager.poll_login(ticket).await;
        assert_eq!(progress, LoginProgress::Expired);
        assert!(progress.is_terminal());
        assert!(matches!(manager.state(), LoginState::Expired));
        // no further poll reaches the api once expired
        let calls = manager.api.calls.load(Ordering::SeqCst);
        assert_eq!(manager.poll_login(ticket).await, LoginProgress::Stale);
        assert_eq!(manager.api.calls.load(Ordering::SeqCst), calls);

        let (_, ticket) = manager.begin_login().await.unwrap();
        let progress = manager.poll_login(ticket).await;
        assert!(matches!(progress, LoginProgress::Failed(_)));
        assert!(matches!(manager.state(), LoginState::LoggedOut));
    }

    #[tokio::test]
    async fn test_room_resolution_failure_keeps_nothing() {
        let api = FakeApi::with_polls(vec![Ok(QrPoll::Confirmed(login_cookies()))]);
        *api.room.lock().unwrap() = Some(Err(ApiError::NotFound("no room".into())));
        let (_dir, mut manager) = manager(api);

        let (_, ticket) = manager.begin_login().await.unwrap();
        let progress = manager.poll_login(ticket).await;

        assert!(matches!(progress, LoginProgress::Failed(_)));
        assert!(!manager.is_authenticated());
        assert!(matches!(manager.state(), LoginState::LoggedOut));
        assert_eq!(manager.store().load_session().unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_csrf_cookie_fails_the_login() {
        let api = FakeApi::with_polls(vec![]);
        let (_dir, mut manager) = manager(api);
        let mut cookies = login_cookies();
        cookies.remove(CSRF_COOKIE);

        let (_, ticket) = manager.begin_login().await.unwrap();
        let progress = manager.apply_poll(ticket, QrPoll::Confirmed(cookies)).await;

        assert!(matches!(progress, LoginProgress::Failed(_)));
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_result_for_cancelled_ticket_is_ignored() {
        let (_dir, mut manager) = manager(FakeApi::with_polls(vec![]));

        let (_, ticket) = manager.begin_login().await.unwrap();
        manager.cancel_login();

        let progress = manager
            .apply_poll(ticket, QrPoll::Confirmed(login_cookies()))
            .await;
        assert_eq!(progress, LoginProgress::Stale);
        assert!(!manager.is_authenticated());

        // a superseded ticket is just as dead
        let (_, first) = manager.begin_login().await.unwrap();
        let (_, second) = manager.begin_login().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(
            manager.apply_poll(first, QrPoll::Expired).await,
            LoginProgress::Stale
        );
        assert!(matches!(manager.state(), LoginState::AwaitingScan(_)));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (_dir, mut manager) = logged_in(FakeApi::with_polls(vec![])).await;

        manager.logout();
        assert!(!manager.is_authenticated());
        assert_eq!(manager.store().load_session().unwrap(), None);

        manager.logout();
        assert!(!manager.is_authenticated());
        assert!(matches!(manager.state(), LoginState::LoggedOut));
        assert_eq!(manager.broadcast(), &BroadcastState::default());
    }

    #[tokio::test]
    async fn test_credential_rejection_logs_out() {
        let api = FakeApi::with_polls(vec![]);
        *api.start.lock().unwrap() = Some(Err(ApiError::from_platform(
            60024,
            "主播身份校验失败",
        )));
        let (_dir, mut manager) = logged_in(api).await;

        let err = manager.start_broadcast(86).await.unwrap_err();

        assert!(err.is_credential());
        assert!(!manager.is_authenticated());
        assert_eq!(manager.store().load_session().unwrap(), None);
    }

    #[tokio::test]
    async fn test_other_start_failures_keep_the_session() {
        let api = FakeApi::with_polls(vec![]);
        *api.start.lock().unwrap() = Some(Err(ApiError::from_platform(60009, "分区不存在")));
        let (_dir, mut manager) = logged_in(api).await;

        assert!(manager.start_broadcast(1).await.is_err());
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_start_then_stop_broadcast() {
        let api = FakeApi::with_polls(vec![]);
        *api.start.lock().unwrap() = Some(Ok(StreamEndpoint {
            server_address: "rtmp://push.example.com/live/".into(),
            stream_key: "?streamname=live_1&key=abc".into(),
        }));
        let (dir, mut manager) = logged_in(api).await;
        let credentials_file = dir.path().join(crate::store::STREAM_CREDENTIALS_FILE);

        manager.start_broadcast(86).await.unwrap();
        assert!(manager.broadcast().active);
        assert_eq!(
            manager.broadcast().stream_key.as_deref(),
            Some("?streamname=live_1&key=abc")
        );
        assert!(credentials_file.exists());
        assert!(matches!(
            manager.start_broadcast(86).await,
            Err(ApiError::Validation(_))
        ));

        manager.stop_broadcast().await.unwrap();
        assert_eq!(manager.broadcast(), &BroadcastState::default());
        assert!(!credentials_file.exists());
    }

    #[tokio::test]
    async fn test_long_title_never_reaches_the_api() {
        let (_dir, manager) = logged_in(FakeApi::with_polls(vec![])).await;
        let calls = manager.api.calls.load(Ordering::SeqCst);

        let result = manager.update_title(&"长".repeat(21)).await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(manager.api.calls.load(Ordering::SeqCst), calls);
        assert!(manager.update_title("今晚打排位").await.is_ok());
    }

    #[tokio::test]
    async fn test_restore_discards_broken_session_file() {
        let (dir, mut manager) = manager(FakeApi::default());
        std::fs::write(dir.path().join(crate::store::SESSION_FILE), "{not json").unwrap();

        assert_eq!(manager.restore(), None);
        assert!(!manager.is_authenticated());
        assert!(!dir.path().join(crate::store::SESSION_FILE).exists());
    }

    #[tokio::test]
    async fn test_restore_picks_up_saved_session() {
        let (dir, _) = logged_in(FakeApi::with_polls(vec![])).await;
        let store = Store::open(dir.path()).unwrap();
        let mut manager = SessionManager::new(FakeApi::default(), store);

        assert_eq!(manager.restore(), Some(5440));
        assert!(manager.is_authenticated());
        assert!(matches!(manager.state(), LoginState::LoggedIn));
    }
}
