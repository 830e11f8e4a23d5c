//! Configuration module for Gridboard
//!
//! Two layers of persistence, separate from dashboard documents:
//!
//! - `config.toml` — server endpoints and engine defaults ([`AppConfig`])
//! - `app_state.json` — recent dashboards and UI preferences ([`AppState`])
//!
//! Both live in the platform-appropriate data directory:
//!
//! - **Linux**: `~/.local/share/dev.gridboard.gridboard-rs/`
//! - **macOS**: `~/Library/Application Support/dev.gridboard.gridboard-rs/`
//! - **Windows**: `%APPDATA%\dev.gridboard.gridboard-rs\`

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{GridboardError, Result};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.gridboard.gridboard-rs";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// App config filename
pub const APP_CONFIG_FILE: &str = "config.toml";

/// Maximum number of recent dashboards to remember
pub const MAX_RECENT_DASHBOARDS: usize = 10;

/// Default widget polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        GridboardError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            GridboardError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

// ==================== App Config ====================

/// Server endpoints and engine defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// REST API base URL
    pub api_base_url: String,

    /// Streaming (WebSocket) endpoint
    pub ws_url: String,

    /// Default widget polling interval in milliseconds
    pub poll_interval_ms: u64,

    /// Prefer the streaming channel over polling
    pub use_streaming: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            ws_url: "ws://localhost:8080/api/ws/plugins/telemetry".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            use_streaming: false,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GridboardError::Config(format!("Failed to read config: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| GridboardError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = app_data_dir().map(|d| d.join(APP_CONFIG_FILE)) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridboardError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| GridboardError::Config(format!("Failed to write config: {}", e)))
    }
}

// ==================== Recent Dashboards ====================

/// Information about a recently opened dashboard file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentDashboard {
    /// Path to the dashboard JSON file
    pub path: PathBuf,

    /// Dashboard title at the time it was opened
    pub title: String,

    /// Last opened timestamp (Unix seconds)
    pub last_opened: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl RecentDashboard {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            last_opened: unix_now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_opened = unix_now();
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

// ==================== App State ====================

/// UI preferences that persist across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPreferences {
    /// Enable dark mode
    #[serde(default = "default_true")]
    pub dark_mode: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

/// Persistent application state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Recently opened dashboard files
    #[serde(default)]
    pub recent_dashboards: Vec<RecentDashboard>,

    /// Path of the last opened dashboard (session restore)
    #[serde(default)]
    pub last_dashboard_path: Option<PathBuf>,

    /// UI preferences
    #[serde(default)]
    pub ui_preferences: UiPreferences,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            recent_dashboards: Vec::new(),
            last_dashboard_path: None,
            ui_preferences: UiPreferences::default(),
        }
    }
}

impl AppState {
    /// Load from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| GridboardError::Config(format!("Failed to read app state: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| GridboardError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = app_state_path() else {
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GridboardError::Config(format!("Failed to serialize app state: {}", e)))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| GridboardError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(APP_STATE_FILE))
    }

    /// Add or refresh a recent dashboard entry
    pub fn add_recent_dashboard(&mut self, path: impl AsRef<Path>, title: &str) {
        let path = path.as_ref().to_path_buf();
        self.recent_dashboards.retain(|d| d.path != path);
        self.recent_dashboards
            .insert(0, RecentDashboard::new(path.clone(), title));
        self.recent_dashboards.truncate(MAX_RECENT_DASHBOARDS);
        self.last_dashboard_path = Some(path);
    }

    /// Drop entries whose files no longer exist
    pub fn cleanup_missing(&mut self) {
        self.recent_dashboards.retain(|d| d.exists());
        if let Some(last) = &self.last_dashboard_path {
            if !last.exists() {
                self.last_dashboard_path = None;
            }
        }
    }

    /// The last opened dashboard path, if its file still exists
    pub fn get_last_dashboard(&self) -> Option<&Path> {
        self.last_dashboard_path
            .as_deref()
            .filter(|p| p.exists())
    }
}
