use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};
use std::time::Duration;

use crate::geometry::CellSize;
use crate::layout::LayoutMetrics;
use crate::scroll_task::RetryPolicy;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "fieldmark";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Terminal cell size in pixels, used to map page pixels to cells
    #[serde(default = "default_cell_width")]
    pub cell_width: u16,

    #[serde(default = "default_cell_height")]
    pub cell_height: u16,

    #[serde(default = "default_page_padding")]
    pub page_padding: f64,

    #[serde(default = "default_page_inset")]
    pub page_inset: f64,

    #[serde(default = "default_page_gap")]
    pub page_gap: f64,

    #[serde(default = "default_overlay_pad")]
    pub overlay_pad: f64,

    /// Overlay color for highlights that carry none: RRGGBB, #RRGGBB or rgb()
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,

    #[serde(default = "default_scroll_step")]
    pub scroll_step: f64,

    #[serde(default = "default_scroll_initial_delay_ms")]
    pub scroll_initial_delay_ms: u64,

    #[serde(default = "default_scroll_frame_ms")]
    pub scroll_frame_ms: u64,

    #[serde(default = "default_scroll_max_retries")]
    pub scroll_max_retries: u32,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cell_width() -> u16 {
    CellSize::default().width
}

fn default_cell_height() -> u16 {
    CellSize::default().height
}

fn default_page_padding() -> f64 {
    LayoutMetrics::default().padding
}

fn default_page_inset() -> f64 {
    LayoutMetrics::default().page_inset
}

fn default_page_gap() -> f64 {
    LayoutMetrics::default().page_gap
}

fn default_overlay_pad() -> f64 {
    crate::geometry::OVERLAY_PAD
}

fn default_highlight_color() -> String {
    "6366F1".to_string()
}

fn default_scroll_step() -> f64 {
    48.0
}

fn default_scroll_initial_delay_ms() -> u64 {
    RetryPolicy::default().initial_delay.as_millis() as u64
}

fn default_scroll_frame_ms() -> u64 {
    RetryPolicy::default().frame_interval.as_millis() as u64
}

fn default_scroll_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            log_level: default_log_level(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            page_padding: default_page_padding(),
            page_inset: default_page_inset(),
            page_gap: default_page_gap(),
            overlay_pad: default_overlay_pad(),
            highlight_color: default_highlight_color(),
            scroll_step: default_scroll_step(),
            scroll_initial_delay_ms: default_scroll_initial_delay_ms(),
            scroll_frame_ms: default_scroll_frame_ms(),
            scroll_max_retries: default_scroll_max_retries(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Replace the global settings with the contents of `path`. Unreadable or
/// malformed files are logged and leave the current settings in place.
pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!("log_level: \"{}\"\n", settings.log_level));
    content.push('\n');
    content.push_str(LAYOUT_TEMPLATE);
    content.push_str(&format!("cell_width: {}\n", settings.cell_width));
    content.push_str(&format!("cell_height: {}\n", settings.cell_height));
    content.push_str(&format!("page_padding: {}\n", settings.page_padding));
    content.push_str(&format!("page_inset: {}\n", settings.page_inset));
    content.push_str(&format!("page_gap: {}\n", settings.page_gap));
    content.push_str(&format!("overlay_pad: {}\n", settings.overlay_pad));
    content.push_str(&format!(
        "highlight_color: \"{}\"\n",
        settings.highlight_color
    ));
    content.push('\n');
    content.push_str(SCROLL_TEMPLATE);
    content.push_str(&format!("scroll_step: {}\n", settings.scroll_step));
    content.push_str(&format!(
        "scroll_initial_delay_ms: {}\n",
        settings.scroll_initial_delay_ms
    ));
    content.push_str(&format!("scroll_frame_ms: {}\n", settings.scroll_frame_ms));
    content.push_str(&format!(
        "scroll_max_retries: {}\n",
        settings.scroll_max_retries
    ));

    content
}

const LAYOUT_TEMPLATE: &str = r#"# ============================================================================
# Layout (all values in pixels)
# ============================================================================
# cell_width/cell_height: size of one terminal cell
# page_inset: width taken from the pane before pages are sized
# overlay_pad: extra space drawn around normalized highlights
"#;

const SCROLL_TEMPLATE: &str = r#"# ============================================================================
# Scrolling
# ============================================================================
# A selected highlight is looked up after scroll_initial_delay_ms, then once
# per scroll_frame_ms, at most scroll_max_retries more times.
"#;

// Public API for accessing settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Replace the global settings without touching the config file
pub fn set_settings(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn get_log_level() -> String {
    SETTINGS
        .read()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| default_log_level())
}

pub fn get_cell_size() -> CellSize {
    SETTINGS
        .read()
        .map(|s| CellSize::new(s.cell_width.max(1), s.cell_height.max(1)))
        .unwrap_or_default()
}

pub fn get_layout_metrics() -> LayoutMetrics {
    SETTINGS
        .read()
        .map(|s| LayoutMetrics {
            padding: s.page_padding.max(0.0),
            page_inset: s.page_inset.max(0.0),
            page_gap: s.page_gap.max(0.0),
            ..LayoutMetrics::default()
        })
        .unwrap_or_default()
}

pub fn get_overlay_pad() -> f64 {
    SETTINGS
        .read()
        .map(|s| s.overlay_pad)
        .unwrap_or_else(|_| default_overlay_pad())
}

pub fn get_highlight_color() -> String {
    SETTINGS
        .read()
        .map(|s| s.highlight_color.clone())
        .unwrap_or_else(|_| default_highlight_color())
}

pub fn get_scroll_step() -> f64 {
    SETTINGS
        .read()
        .map(|s| s.scroll_step)
        .unwrap_or_else(|_| default_scroll_step())
}

pub fn get_retry_policy() -> RetryPolicy {
    SETTINGS
        .read()
        .map(|s| RetryPolicy {
            initial_delay: Duration::from_millis(s.scroll_initial_delay_ms),
            frame_interval: Duration::from_millis(s.scroll_frame_ms.max(1)),
            max_retries: s.scroll_max_retries,
        })
        .unwrap_or_default()
}
