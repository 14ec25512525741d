use std::time::Duration;

use arboard::Clipboard;
use platform::{
    api::LiveApi,
    catalog::CategoryCatalog,
    session::{redact, LoginProgress, PollSchedule, PollTicket, SessionManager},
    store::Preferences,
};
use tracing::{error, info, warn};

use super::{
    action::Action,
    state::{LogLevel, LoginStatus, State},
};

/// Drives the session manager from UI actions and keeps the [State] snapshot
/// in sync with it.
///
/// Owned by the state store loop; every transition happens on that task.
pub struct Studio<A: LiveApi> {
    manager: SessionManager<A>,
    catalog: CategoryCatalog,
    preferences: Preferences,
    poll_interval: Duration,
    /// Pending login poll, present only while a QR code waits for a scan
    schedule: Option<PollSchedule>,
    clipboard: Option<Clipboard>,
    state: State,
}

impl<A: LiveApi> Studio<A> {
    pub fn new(
        manager: SessionManager<A>,
        catalog: CategoryCatalog,
        preferences: Preferences,
        poll_interval: Duration,
    ) -> Self {
        let last_theme = preferences.last_area_theme.clone();
        let last_category = preferences.last_area_name.clone();
        let last_title = preferences.last_title.clone();

        let mut studio = Studio {
            manager,
            catalog,
            preferences,
            poll_interval,
            schedule: None,
            clipboard: None,
            state: State::default(),
        };

        studio.state.title = last_title.unwrap_or_default();
        studio.sync_catalog_view(last_theme);
        if let Some(name) = last_category {
            if studio.state.categories.contains(&name) {
                studio.state.selected_category = Some(name);
            }
        }

        studio
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn schedule_mut(&mut self) -> Option<&mut PollSchedule> {
        self.schedule.as_mut()
    }

    fn report(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }

        self.state.push_log(level, message);
    }

    /// Picks up the session saved by a previous run.
    pub fn restore(&mut self) {
        if let Some(room_id) = self.manager.restore() {
            self.state.login_status = LoginStatus::LoggedIn { room_id };
            self.report(
                LogLevel::Info,
                format!("Restored the saved login for room {room_id}"),
            );
        }
    }

    pub fn mark_login_request_start(&mut self) {
        self.state.mark_login_request_start();
    }

    pub fn tick_timer(&mut self) {
        self.state.tick_timer();
    }

    pub async fn handle_action(&mut self, action: Action) {
        match action {
            Action::RequestLogin => self.request_login().await,
            Action::CancelLogin => self.cancel_login(),
            Action::Logout => self.logout(),
            Action::SelectTheme { theme } => self.show_theme(Some(theme)),
            Action::SearchCategories { query } => self.search_categories(query),
            Action::SelectCategory { name } => self.select_category(name),
            Action::UpdateTitle { title } => self.update_title(title).await,
            Action::ToggleBroadcast => self.toggle_broadcast().await,
            Action::CopyServerAddress => {
                let address = self.manager.broadcast().server_address.clone();
                self.copy("server address", address, false);
            }
            Action::CopyStreamKey => {
                let key = self.manager.broadcast().stream_key.clone();
                self.copy("stream key", key, true);
            }
            Action::Exit => self.save_preferences(),
        }
    }

    async fn request_login(&mut self) {
        self.schedule = None;

        match self.manager.begin_login().await {
            Ok((challenge, ticket)) => {
                self.schedule = Some(PollSchedule::new(ticket, self.poll_interval));
                self.state.login_status = LoginStatus::AwaitingScan {
                    url: challenge.url,
                    scanned: false,
                };
                self.report(
                    LogLevel::Info,
                    "Scan the QR code with the mobile app to log in".into(),
                );
            }
            Err(err) => {
                self.state.login_status = LoginStatus::Failed {
                    reason: err.to_string(),
                };
                self.report(LogLevel::Error, format!("Could not get a QR code: {err}"));
            }
        }
    }

    fn cancel_login(&mut self) {
        self.schedule = None;
        self.manager.cancel_login();

        if !self.state.is_logged_in() {
            self.state.login_status = LoginStatus::Idle;
        }
    }

    /// Runs one QR status poll for `ticket` and applies its outcome.
    pub async fn poll_login(&mut self, ticket: PollTicket) {
        let progress = self.manager.poll_login(ticket).await;

        if progress.is_terminal() && self.schedule.as_ref().map(PollSchedule::ticket) == Some(ticket)
        {
            self.schedule = None;
        }

        match progress {
            LoginProgress::Waiting | LoginProgress::Stale => (),
            LoginProgress::Scanned => {
                if let LoginStatus::AwaitingScan { scanned, .. } = &mut self.state.login_status {
                    if !*scanned {
                        *scanned = true;
                        self.report(
                            LogLevel::Info,
                            "QR code scanned, confirm the login on your phone".into(),
                        );
                    }
                }
            }
            LoginProgress::LoggedIn { room_id } => {
                self.state.login_status = LoginStatus::LoggedIn { room_id };
                let csrf = self
                    .manager
                    .session()
                    .map(|session| redact(&session.csrf))
                    .unwrap_or_default();
                self.report(
                    LogLevel::Info,
                    format!("Logged in, room {room_id}, csrf {csrf}"),
                );

                self.refresh_catalog().await;
            }
            LoginProgress::Expired => {
                self.state.login_status = LoginStatus::Expired;
                self.report(
                    LogLevel::Warn,
                    "The QR code expired, request a new one".into(),
                );
            }
            LoginProgress::Failed(reason) => {
                self.report(LogLevel::Error, format!("Login failed: {reason}"));
                self.state.login_status = LoginStatus::Failed { reason };
            }
        }
    }

    fn logout(&mut self) {
        self.schedule = None;
        self.manager.logout();

        self.state.login_status = LoginStatus::Idle;
        self.state.broadcast = self.manager.broadcast().clone();
        self.state.live_timer = 0;
        self.report(
            LogLevel::Info,
            "Logged out, the saved login and stream key were removed".into(),
        );
    }

    /// Downloads the category list, keeping the cached one on any failure.
    pub async fn refresh_catalog(&mut self) {
        self.report(LogLevel::Info, "Updating the category list...".into());

        let themes = match self.manager.fetch_categories().await {
            Ok(themes) => themes,
            Err(err) => {
                self.report(
                    LogLevel::Warn,
                    format!("Could not fetch the category list ({err}), using the cached one"),
                );
                return;
            }
        };

        match self.catalog.refresh(themes, self.manager.store()) {
            Ok(()) => {
                let current_theme = self.state.active_theme.clone();
                self.sync_catalog_view(current_theme);
                self.report(LogLevel::Info, "Category list updated".into());
            }
            Err(err) => self.report(
                LogLevel::Warn,
                format!("Could not save the category list ({err}), using the cached one"),
            ),
        }
    }

    /// Reloads the theme list, keeping `preferred_theme` when it still exists.
    fn sync_catalog_view(&mut self, preferred_theme: Option<String>) {
        self.state.themes = self.catalog.themes();

        let theme = preferred_theme
            .filter(|theme| self.state.themes.contains(theme))
            .or_else(|| self.state.themes.first().cloned());

        self.show_theme(theme);
    }

    fn show_theme(&mut self, theme: Option<String>) {
        if self.manager.broadcast().active {
            self.report(
                LogLevel::Warn,
                "The category can not be changed while live".into(),
            );
            return;
        }

        self.state.categories = theme
            .as_deref()
            .map(|theme| self.catalog.categories(theme))
            .unwrap_or_default();
        self.state.active_theme = theme;
        self.state.search_query.clear();

        let still_listed = self
            .state
            .selected_category
            .as_ref()
            .map(|name| self.state.categories.contains(name))
            .unwrap_or(false);
        if !still_listed {
            self.state.selected_category = None;
        }
    }

    fn search_categories(&mut self, query: String) {
        let Some(theme) = self.state.active_theme.as_deref() else {
            return;
        };

        self.state.categories = if query.is_empty() {
            self.catalog.categories(theme)
        } else {
            self.catalog
                .search(&query, theme)
                .into_iter()
                .map(|category| category.name.clone())
                .collect()
        };
        self.state.search_query = query;
    }

    fn select_category(&mut self, name: String) {
        if self.manager.broadcast().active {
            self.report(
                LogLevel::Warn,
                "The category can not be changed while live".into(),
            );
            return;
        }

        self.report(LogLevel::Info, format!("Category set to {name}"));
        self.state.selected_category = Some(name);
    }

    async fn update_title(&mut self, title: String) {
        let title = title.trim().to_string();
        if title.is_empty() {
            self.report(LogLevel::Info, "Title left unchanged (empty input)".into());
            return;
        }

        self.state.title = title.clone();
        if !self.manager.is_authenticated() {
            self.report(LogLevel::Warn, "Log in before changing the title".into());
            return;
        }

        match self.manager.update_title(&title).await {
            Ok(()) => {
                self.report(LogLevel::Info, format!("Title updated to {title}"));
                self.preferences.last_title = Some(title);
                self.write_preferences();
            }
            Err(err) => self.report(LogLevel::Error, format!("Could not update the title: {err}")),
        }
    }

    async fn toggle_broadcast(&mut self) {
        if !self.manager.is_authenticated() {
            self.report(LogLevel::Warn, "Log in before going live".into());
            return;
        }

        if self.manager.broadcast().active {
            self.stop_broadcast().await
        } else {
            self.start_broadcast().await
        }
    }

    async fn start_broadcast(&mut self) {
        let Some(name) = self.state.selected_category.clone() else {
            self.report(LogLevel::Warn, "Pick a category before going live".into());
            return;
        };
        let theme = self.state.active_theme.clone().unwrap_or_default();
        let Some(category_id) = self.catalog.lookup_id(&name, &theme) else {
            self.report(
                LogLevel::Error,
                format!("Could not find the id of category {name}"),
            );
            return;
        };

        let title = self.state.title.trim().to_string();
        if !title.is_empty() {
            match self.manager.update_title(&title).await {
                Ok(()) => {
                    self.report(LogLevel::Info, format!("Title set to {title}"));
                    self.preferences.last_title = Some(title);
                }
                Err(err) => self.report(
                    LogLevel::Warn,
                    format!("Could not set the title ({err}), going live anyway"),
                ),
            }
        }

        self.report(
            LogLevel::Info,
            format!("Going live in {name} (id {category_id})..."),
        );
        match self.manager.start_broadcast(category_id).await {
            Ok(endpoint) => {
                self.state.broadcast = self.manager.broadcast().clone();
                self.state.live_timer = 0;
                self.report(
                    LogLevel::Info,
                    format!(
                        "Live! Server {}, stream key {}",
                        endpoint.server_address,
                        redact(&endpoint.stream_key)
                    ),
                );
                self.save_preferences();
            }
            Err(err) if err.is_credential() => {
                self.state.login_status = LoginStatus::Idle;
                self.state.broadcast = self.manager.broadcast().clone();
                self.report(
                    LogLevel::Error,
                    format!("The login is no longer valid, log in again ({err})"),
                );
            }
            Err(err) => self.report(LogLevel::Error, format!("Could not go live: {err}")),
        }
    }

    async fn stop_broadcast(&mut self) {
        match self.manager.stop_broadcast().await {
            Ok(()) => {
                self.state.broadcast = self.manager.broadcast().clone();
                self.state.live_timer = 0;
                self.report(LogLevel::Info, "Broadcast stopped".into());
            }
            Err(err) => self.report(
                LogLevel::Error,
                format!("Could not stop the broadcast, stop it on the website: {err}"),
            ),
        }
    }

    fn copy(&mut self, what: &str, value: Option<String>, secret: bool) {
        let Some(value) = value else {
            self.report(
                LogLevel::Warn,
                format!("There is no {what} to copy, go live first"),
            );
            return;
        };

        match self.set_clipboard(&value) {
            Ok(()) => {
                let shown = if secret { redact(&value) } else { value };
                self.report(LogLevel::Info, format!("Copied the {what}: {shown}"));
            }
            Err(err) => self.report(LogLevel::Error, format!("Could not copy the {what}: {err}")),
        }
    }

    fn set_clipboard(&mut self, text: &str) -> Result<(), arboard::Error> {
        // the clipboard owns the copied text on some platforms, so it is kept around
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new()?);
        }

        match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(text),
            None => Ok(()),
        }
    }

    /// Remembers the current theme, category and title for the next run.
    pub fn save_preferences(&mut self) {
        self.preferences.last_area_theme = self.state.active_theme.clone();
        self.preferences.last_area_name = self.state.selected_category.clone();
        self.preferences.last_title = Some(self.state.title.clone());

        self.write_preferences();
    }

    fn write_preferences(&mut self) {
        if let Err(err) = self.manager.store().save_preferences(&self.preferences) {
            self.report(
                LogLevel::Warn,
                format!("Could not save the preferences: {err}"),
            );
        }
    }
}
