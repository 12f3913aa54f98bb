//! Configuration management for recordtip using the prefer crate.

use std::ops::Range;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{Placement, Size};

/// Columns of a results row that get the tooltip (description, class name, table).
pub const DEFAULT_ELIGIBLE_COLUMNS: Range<usize> = 1..4;

/// Timing and layout of the hover tooltip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct TooltipConfig {
    /// Pointer must rest on a cell this long before the tooltip shows.
    #[serde(default = "default_show_delay_ms")]
    #[prefer(default = "300")]
    pub show_delay_ms: u64,
    /// After showing, the tooltip ignores pointer movement for this long.
    #[serde(default = "default_freeze_duration_ms")]
    #[prefer(default = "3000")]
    pub freeze_duration_ms: u64,
    /// Grace period between leaving a cell and hiding the tooltip.
    #[serde(default = "default_hide_delay_ms")]
    #[prefer(default = "300")]
    pub hide_delay_ms: u64,
    /// Horizontal offset from the pointer.
    #[serde(default = "default_offset_x")]
    #[prefer(default = "5.0")]
    pub offset_x: f64,
    /// Vertical offset from the pointer.
    #[serde(default = "default_offset_y")]
    #[prefer(default = "15.0")]
    pub offset_y: f64,
    /// Gap to keep from a viewport edge the tooltip was pushed against.
    #[serde(default = "default_edge_margin")]
    #[prefer(default = "10.0")]
    pub edge_margin: f64,
    /// Size assumed before the surface has been measured.
    #[serde(default = "default_fallback_width")]
    #[prefer(default = "350.0")]
    pub fallback_width: f64,
    #[serde(default = "default_fallback_height")]
    #[prefer(default = "200.0")]
    pub fallback_height: f64,
}

fn default_show_delay_ms() -> u64 {
    300
}
fn default_freeze_duration_ms() -> u64 {
    3000
}
fn default_hide_delay_ms() -> u64 {
    300
}
fn default_offset_x() -> f64 {
    5.0
}
fn default_offset_y() -> f64 {
    15.0
}
fn default_edge_margin() -> f64 {
    10.0
}
fn default_fallback_width() -> f64 {
    350.0
}
fn default_fallback_height() -> f64 {
    200.0
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            show_delay_ms: default_show_delay_ms(),
            freeze_duration_ms: default_freeze_duration_ms(),
            hide_delay_ms: default_hide_delay_ms(),
            offset_x: default_offset_x(),
            offset_y: default_offset_y(),
            edge_margin: default_edge_margin(),
            fallback_width: default_fallback_width(),
            fallback_height: default_fallback_height(),
        }
    }
}

impl TooltipConfig {
    pub fn show_delay(&self) -> Duration {
        Duration::from_millis(self.show_delay_ms)
    }

    pub fn freeze_duration(&self) -> Duration {
        Duration::from_millis(self.freeze_duration_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            edge_margin: self.edge_margin,
        }
    }

    pub fn fallback_size(&self) -> Size {
        Size::new(self.fallback_width, self.fallback_height)
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the classification web application.
    pub endpoint: String,
    /// Path of the record details API below the endpoint.
    pub details_path: String,
    /// User agent for HTTP requests (None = default).
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Columns of each results row that get hover handling.
    pub eligible_columns: Range<usize>,
    /// Tooltip timing and layout.
    pub tooltip: TooltipConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000".to_string(),
            details_path: "api/record_details".to_string(),
            user_agent: None,
            request_timeout: 30,
            eligible_columns: DEFAULT_ELIGIBLE_COLUMNS,
            tooltip: TooltipConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings pointing at a custom endpoint.
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Default::default()
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the web application.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Record details API path.
    #[serde(default)]
    pub details_path: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Eligible columns as `[start, end)`.
    #[serde(default)]
    pub eligible_columns: Option<[usize; 2]>,
    /// Tooltip timing and layout.
    #[serde(default)]
    pub tooltip: TooltipConfig,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers recordtip config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("recordtip").await {
            Ok(pref_config) => {
                let endpoint: Option<String> = pref_config.get("endpoint").ok();
                let details_path: Option<String> = pref_config.get("details_path").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let eligible_columns: Option<[usize; 2]> = pref_config
                    .get::<Vec<usize>>("eligible_columns")
                    .ok()
                    .and_then(|v| v.try_into().ok());
                let tooltip: TooltipConfig = pref_config.get("tooltip").unwrap_or_default();

                Config {
                    endpoint,
                    details_path,
                    user_agent,
                    request_timeout,
                    eligible_columns,
                    tooltip,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref endpoint) = self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(ref path) = self.details_path {
            settings.details_path = path.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some([start, end]) = self.eligible_columns {
            if start < end {
                settings.eligible_columns = start..end;
            }
        }
        settings.tooltip = self.tooltip.clone();
    }
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}
