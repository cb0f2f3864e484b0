//! Application state management for the RepoMirror console.
//!
//! This module contains the `App` struct that owns the shell state (current
//! view, overlays, login form), the fetched dashboard data, the notification
//! queue and the background tasks that keep them current.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use repomirror_core::auth::{
    spawn_refresh_loop, AuthErrorKind, EndReason, MemoryStore, SessionEvent, SessionState,
    TokenStore,
};
use repomirror_core::cache::CacheManager;
use repomirror_core::dashboard::DashboardState;
use repomirror_core::models::{Activity, DashboardStats, Repository, SecurityStatus, UserProfile};
use repomirror_core::notifications::NotificationQueue;
use repomirror_core::{ApiClient, ApiError, Config};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// How often dashboard data and security status are re-fetched (5 minutes)
const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Repositories,
}

impl View {
    /// Tab order; the number key for a view is its position plus one
    pub const ALL: [View; 2] = [View::Dashboard, View::Repositories];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Repositories => "Repositories",
        }
    }

    /// Label shown in the tab bar, e.g. "[1] Dashboard"
    pub fn tab_label(&self) -> String {
        let key = View::ALL.iter().position(|v| v == self).unwrap_or(0) + 1;
        format!("[{}] {}", key, self.title())
    }

    /// Get the next view (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Repositories,
            View::Repositories => View::Dashboard,
        }
    }

    /// Get the previous view (wrapping around)
    pub fn prev(&self) -> Self {
        // Two views: prev and next coincide
        self.next()
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    ShowingHelp,
    ShowingSecurity,
    ShowingUserMenu,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Entries of the user menu, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMenuItem {
    Profile,
    Security,
    Logout,
}

impl UserMenuItem {
    pub const ALL: [UserMenuItem; 3] = [UserMenuItem::Profile, UserMenuItem::Security, UserMenuItem::Logout];

    pub fn label(&self) -> &'static str {
        match self {
            UserMenuItem::Profile => "Profile",
            UserMenuItem::Security => "Security settings",
            UserMenuItem::Logout => "Sign out",
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned fetch tasks.
enum FetchResult {
    User(UserProfile),
    Dashboard(DashboardStats, Vec<Activity>),
    Security(SecurityStatus),
    Repositories(Vec<Repository>),
    Failed { what: FetchKind, error: ApiError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    User,
    Dashboard,
    Security,
    Repositories,
}

impl FetchKind {
    fn label(&self) -> &'static str {
        match self {
            FetchKind::User => "user profile",
            FetchKind::Dashboard => "dashboard data",
            FetchKind::Security => "security status",
            FetchKind::Repositories => "repositories",
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub cache: Option<CacheManager>,
    session_events: broadcast::Receiver<SessionEvent>,
    token_refresh_task: JoinHandle<()>,

    // UI State
    pub state: AppState,
    pub current_view: View,
    pub user_menu_selection: usize,
    pub repository_selection: usize,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Fetched data
    pub user: Option<UserProfile>,
    pub dashboard: DashboardState,
    pub repositories: Vec<Repository>,
    pub security: SecurityStatus,
    pub notifications: NotificationQueue,
    pub last_updated: String,

    // Background task channel
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,
    last_poll: Option<Instant>,
}

impl App {
    /// Create a new application instance.
    ///
    /// `ephemeral` keeps session tokens in memory only, whatever the config
    /// says.
    pub fn new(ephemeral: bool) -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.api_base_url();
        debug!(%base_url, storage = ?config.token_storage, "Config loaded");

        let store: Arc<dyn TokenStore> = if ephemeral {
            Arc::new(MemoryStore::new())
        } else {
            config.token_store().context("Failed to open token store")?
        };
        let api = ApiClient::new(&base_url, store).context("Failed to build HTTP client")?;

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        let cache = match CacheManager::new(cache_dir) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "Cache unavailable");
                None
            }
        };

        Ok(Self::with_client(config, api, cache))
    }

    /// Assemble the app around an already built client. Spawns the token
    /// refresh loop, so it must run inside a tokio runtime.
    pub fn with_client(config: Config, api: ApiClient, cache: Option<CacheManager>) -> Self {
        let session_events = api.session().subscribe();
        let token_refresh_task = spawn_refresh_loop(api.session().clone());
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Get credentials from env vars or config
        let login_username = std::env::var("REPOMIRROR_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("REPOMIRROR_PASSWORD").unwrap_or_default();

        Self {
            config,
            api,
            cache,
            session_events,
            token_refresh_task,

            state: AppState::Normal,
            current_view: View::Dashboard,
            user_menu_selection: 0,
            repository_selection: 0,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            user: None,
            dashboard: DashboardState::default(),
            repositories: Vec::new(),
            security: SecurityStatus::default(),
            notifications: NotificationQueue::new(),
            last_updated: "never".to_string(),

            fetch_rx: rx,
            fetch_tx: tx,
            last_poll: None,
        }
    }

    /// Stop background work before exit
    pub fn shutdown(&self) {
        self.token_refresh_task.abort();
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.api.session().is_valid()
    }

    /// A complete record is stored, even if the access token has lapsed.
    /// The first request will refresh it.
    pub fn has_stored_session(&self) -> bool {
        self.api.session().state() == SessionState::Active
    }

    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.login_error = None;

        match self.api.login(&username, &password).await {
            Ok(_) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");
                self.refresh_all_background();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let user_message = match e.kind() {
                    AuthErrorKind::AuthenticationFailed => "Invalid username or password".to_string(),
                    AuthErrorKind::PermissionDenied => {
                        "This account is not allowed to sign in".to_string()
                    }
                    AuthErrorKind::TransportError => {
                        "Unable to connect to server. Please try again.".to_string()
                    }
                    AuthErrorKind::SessionExpired => format!("Login failed: {}", e),
                };
                self.login_error = Some(user_message);
                Err(e.into())
            }
        }
    }

    /// Sign out and return to the login form
    pub async fn logout(&mut self) {
        self.api.logout().await;
        self.user = None;

        if let Some(ref cache) = self.cache {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "Failed to clear cache on logout");
                self.notifications
                    .error("Error", "Could not remove cached data after signing out.");
            }
        }

        self.dashboard = DashboardState::default();
        self.repositories.clear();
        self.security = SecurityStatus::default();
        self.last_updated = "never".to_string();
        self.start_login();
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::LoggedIn | SessionEvent::Refreshed => {
                debug!(?event, "Session updated");
            }
            SessionEvent::Ended(EndReason::Expired) => {
                warn!("Session expired, returning to login");
                self.user = None;
                self.start_login();
                self.login_error = Some("Session expired. Please sign in again.".to_string());
            }
            SessionEvent::Ended(EndReason::LoggedOut) => {
                if self.state != AppState::LoggingIn {
                    self.start_login();
                }
            }
        }
    }

    // =========================================================================
    // User Menu
    // =========================================================================

    pub fn selected_menu_item(&self) -> UserMenuItem {
        UserMenuItem::ALL[self.user_menu_selection.min(UserMenuItem::ALL.len() - 1)]
    }

    pub async fn activate_menu_item(&mut self) {
        self.state = AppState::Normal;
        match self.selected_menu_item() {
            UserMenuItem::Profile => {
                self.notifications
                    .info("Coming soon", "Profile management will be available soon.");
            }
            UserMenuItem::Security => {
                self.notifications
                    .info("Coming soon", "Security settings will be available soon.");
            }
            UserMenuItem::Logout => self.logout().await,
        }
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Load the last fetched data so the dashboard has content behind the
    /// login form
    pub fn load_from_cache(&mut self) {
        let Some(ref cache) = self.cache else {
            return;
        };

        if let Ok(Some(stats)) = cache.load_stats() {
            let activities = cache
                .load_activities()
                .ok()
                .flatten()
                .map(|c| c.data)
                .unwrap_or_default();
            self.dashboard.apply_at(stats.data, activities, stats.cached_at);
        }

        if let Ok(Some(cached)) = cache.load_security() {
            self.security = cached.data;
        }

        if let Ok(Some(cached)) = cache.load_repositories() {
            self.repositories = cached.data;
        }

        self.last_updated = cache.last_updated();
    }

    // =========================================================================
    // Background Fetching
    // =========================================================================

    /// Kick off every fetch: profile, dashboard, security, repositories
    pub fn refresh_all_background(&mut self) {
        self.fetch_user_background();
        self.refresh_dashboard_background();
        self.check_security_background();
        self.refresh_repositories_background();
        self.last_poll = Some(Instant::now());
    }

    /// Refresh whatever the current view shows
    pub fn refresh_current_view(&mut self) {
        match self.current_view {
            View::Dashboard => self.refresh_dashboard_background(),
            View::Repositories => self.refresh_repositories_background(),
        }
    }

    pub fn fetch_user_background(&self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = match api.fetch_current_user().await {
                Ok(user) => FetchResult::User(user),
                Err(error) => FetchResult::Failed { what: FetchKind::User, error },
            };
            Self::send_result(&tx, result).await;
        });
    }

    pub fn refresh_dashboard_background(&self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = match api.fetch_dashboard().await {
                Ok((stats, activities)) => FetchResult::Dashboard(stats, activities),
                Err(error) => FetchResult::Failed { what: FetchKind::Dashboard, error },
            };
            Self::send_result(&tx, result).await;
        });
    }

    pub fn check_security_background(&self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = match api.fetch_security_status().await {
                Ok(status) => FetchResult::Security(status),
                Err(error) => FetchResult::Failed { what: FetchKind::Security, error },
            };
            Self::send_result(&tx, result).await;
        });
    }

    pub fn refresh_repositories_background(&self) {
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = match api.fetch_repositories().await {
                Ok(repos) => FetchResult::Repositories(repos),
                Err(error) => FetchResult::Failed { what: FetchKind::Repositories, error },
            };
            Self::send_result(&tx, result).await;
        });
    }

    async fn send_result(tx: &mpsc::Sender<FetchResult>, result: FetchResult) {
        if tx.send(result).await.is_err() {
            debug!("App dropped before fetch completed");
        }
    }

    /// Drain finished fetches and session events, expire notifications and
    /// start the periodic poll when it is due
    pub fn check_background_tasks(&mut self) {
        loop {
            match self.session_events.try_recv() {
                Ok(event) => self.handle_session_event(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed session events");
                }
                Err(_) => break,
            }
        }

        while let Ok(result) = self.fetch_rx.try_recv() {
            self.process_fetch_result(result);
        }

        self.notifications.prune_expired(Instant::now());

        let due = self
            .last_poll
            .map(|at| at.elapsed() >= POLL_INTERVAL)
            .unwrap_or(false);
        if due && self.state != AppState::LoggingIn && self.is_authenticated() {
            debug!("Periodic refresh");
            self.refresh_dashboard_background();
            self.check_security_background();
            self.last_poll = Some(Instant::now());
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::User(user) => {
                debug!(username = %user.username, "User profile loaded");
                self.user = Some(user);
            }
            FetchResult::Dashboard(stats, activities) => {
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.save_stats(&stats) {
                        warn!(error = %e, "Failed to cache stats");
                    }
                    if let Err(e) = cache.save_activities(&activities) {
                        warn!(error = %e, "Failed to cache activities");
                    }
                    self.last_updated = cache.last_updated();
                }
                self.dashboard.apply(stats, activities);
            }
            FetchResult::Security(status) => {
                if !status.is_secure {
                    self.notifications.warning(
                        "Security warning",
                        "Security problems detected. Press [s] for details.",
                    );
                }
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.save_security(&status) {
                        warn!(error = %e, "Failed to cache security status");
                    }
                }
                self.security = status;
            }
            FetchResult::Repositories(repos) => {
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.save_repositories(&repos) {
                        warn!(error = %e, "Failed to cache repositories");
                    }
                }
                self.repository_selection = self.repository_selection.min(repos.len().saturating_sub(1));
                self.repositories = repos;
            }
            FetchResult::Failed { what, error } => self.handle_fetch_error(what, error),
        }
    }

    fn handle_fetch_error(&mut self, what: FetchKind, error: ApiError) {
        error!(error = %error, what = what.label(), "Fetch failed");

        // The session manager has already announced the end of the session
        if error.is_session_expired() {
            return;
        }

        match what {
            // Without a profile the session is unusable
            FetchKind::User => {
                self.user = None;
                self.start_login();
            }
            FetchKind::Security | FetchKind::Dashboard | FetchKind::Repositories => {
                self.notifications.error(
                    "Error",
                    format!("Could not load {}: {}", what.label(), error),
                );
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn select_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn move_selection_up(&mut self) {
        if self.current_view == View::Repositories {
            self.repository_selection = self.repository_selection.saturating_sub(1);
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.current_view == View::Repositories && !self.repositories.is_empty() {
            self.repository_selection = (self.repository_selection + 1).min(self.repositories.len() - 1);
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use repomirror_core::auth::credentials::{ACCESS_TOKEN_KEY, EXPIRY_KEY, REFRESH_TOKEN_KEY};

    /// Nothing listens on port 9; every request fails to connect
    const DEAD_BACKEND: &str = "http://127.0.0.1:9";

    fn offline_app(store: Arc<MemoryStore>) -> App {
        let api = ApiClient::new(DEAD_BACKEND, store).unwrap();
        App::with_client(Config::default(), api, None)
    }

    /// `expiry_ms` is the stored expiry as epoch milliseconds
    fn store_record(store: &MemoryStore, expiry_ms: &str) {
        store.set(ACCESS_TOKEN_KEY, "access-1").unwrap();
        store.set(REFRESH_TOKEN_KEY, "refresh-1").unwrap();
        store.set(EXPIRY_KEY, expiry_ms).unwrap();
    }

    #[tokio::test]
    async fn test_session_expired_event_shows_login() {
        let mut app = offline_app(Arc::new(MemoryStore::new()));
        app.state = AppState::ShowingHelp;
        app.user = Some(UserProfile {
            username: "admin".into(),
            ..Default::default()
        });

        app.handle_session_event(SessionEvent::Ended(EndReason::Expired));

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.user.is_none());
        assert_eq!(
            app.login_error.as_deref(),
            Some("Session expired. Please sign in again.")
        );
        app.shutdown();
    }

    #[tokio::test]
    async fn test_failed_refresh_returns_to_login() {
        let store = Arc::new(MemoryStore::new());
        // Expires in 2100
        store_record(&store, "4102444800000");
        let mut app = offline_app(store.clone());
        assert!(app.is_authenticated());

        assert!(app.api.session().refresh().await.is_err());
        app.check_background_tasks();

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.login_error.is_some());
        assert!(!app.has_stored_session());
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
        app.shutdown();
    }

    #[tokio::test]
    async fn test_lapsed_access_token_still_counts_as_stored_session() {
        let store = Arc::new(MemoryStore::new());
        // Expired at 1970-01-01T00:00:01Z
        store_record(&store, "1000");
        let app = offline_app(store);

        assert!(!app.is_authenticated());
        assert!(app.has_stored_session());
        app.shutdown();
    }

    #[tokio::test]
    async fn test_no_stored_session() {
        let app = offline_app(Arc::new(MemoryStore::new()));
        assert!(!app.has_stored_session());
        app.shutdown();
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Dashboard.next(), View::Repositories);
        assert_eq!(View::Repositories.next(), View::Dashboard);
        assert_eq!(View::Dashboard.prev(), View::Repositories);
    }

    #[test]
    fn test_view_tab_labels() {
        let labels: Vec<String> = View::ALL.iter().map(|v| v.tab_label()).collect();
        assert_eq!(labels, vec!["[1] Dashboard", "[2] Repositories"]);
    }

    #[test]
    fn test_user_menu_order() {
        assert_eq!(UserMenuItem::ALL[0], UserMenuItem::Profile);
        assert_eq!(UserMenuItem::ALL[2].label(), "Sign out");
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(0, '@'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(MAX_USERNAME_LENGTH, 'a'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, '!'));
        assert!(!can_add_password_char(0, '\t'));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'a'));
    }

    #[test]
    fn test_fetch_kind_labels() {
        assert_eq!(FetchKind::Dashboard.label(), "dashboard data");
        assert_eq!(FetchKind::Security.label(), "security status");
    }
}
