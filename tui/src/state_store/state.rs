use circular_queue::CircularQueue;
use platform::session::BroadcastState;

const MAX_LOG_LINES_TO_STORE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A line of the in-app log pane
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    Idle,
    /// A QR code has been asked for
    Requesting,
    AwaitingScan { url: String, scanned: bool },
    Expired,
    Failed { reason: String },
    LoggedIn { room_id: u64 },
}

/// State holds the state of the application
#[derive(Debug, Clone)]
pub struct State {
    pub login_status: LoginStatus,
    /// Theme names in catalog order
    pub themes: Vec<String>,
    /// Theme the category picker shows
    pub active_theme: Option<String>,
    /// Categories of the active theme, narrowed down by the search query
    pub categories: Vec<String>,
    pub search_query: String,
    /// Category the next broadcast starts in
    pub selected_category: Option<String>,
    /// Title pushed to the room before going live
    pub title: String,
    pub broadcast: BroadcastState,
    /// History of user facing events
    pub logs: CircularQueue<LogLine>,
    /// Seconds since the broadcast started
    pub live_timer: usize,
}

impl Default for State {
    fn default() -> Self {
        State {
            login_status: LoginStatus::Idle,
            themes: vec![],
            active_theme: None,
            categories: vec![],
            search_query: String::new(),
            selected_category: None,
            title: String::new(),
            broadcast: BroadcastState::default(),
            logs: CircularQueue::with_capacity(MAX_LOG_LINES_TO_STORE),
            live_timer: 0,
        }
    }
}

impl State {
    pub fn is_logged_in(&self) -> bool {
        matches!(self.login_status, LoginStatus::LoggedIn { .. })
    }

    pub fn mark_login_request_start(&mut self) {
        self.login_status = LoginStatus::Requesting;
    }

    pub fn push_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.logs.push(LogLine {
            level,
            message: message.into(),
        });
    }

    pub fn tick_timer(&mut self) {
        if self.broadcast.active {
            self.live_timer += 1;
        }
    }
}
