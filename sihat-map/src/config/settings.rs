//! Settings structs, one per `[section]` of the INI file.

use super::defaults::*;
use crate::fetch::DEFAULT_USER_AGENT;
use crate::geometry::LngLat;
use crate::interaction::PointerKind;
use std::fmt;
use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub data: DataSettings,
    pub http: HttpSettings,
    pub map: MapSettings,
    pub interaction: InteractionSettings,
    pub debug: DebugSettings,
    pub logging: LoggingSettings,
}

/// `[data]`: where datasets and assets are served from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSettings {
    /// Base URL joined to site-relative dataset paths; `None` uses them as-is
    pub base_url: Option<String>,
}

/// `[http]`
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    /// Request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
}

/// `[map]`
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub center: LngLat,
    pub zoom: f64,
    /// Layer ids or aliases shown after the style loads
    pub default_layers: Vec<String>,
    pub fit_padding: u32,
    pub fit_duration_ms: u64,
}

/// Pointer preference as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPreference {
    /// Hover popups enabled unless the device is touch-primary
    #[default]
    Auto,
    Fine,
    Coarse,
}

impl PointerPreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "fine" | "mouse" => Some(Self::Fine),
            "coarse" | "touch" => Some(Self::Coarse),
            _ => None,
        }
    }

    /// Concrete pointer kind. `Auto` resolves to fine: there is no touch
    /// screen to detect outside a browser.
    pub fn resolve(self) -> PointerKind {
        match self {
            Self::Coarse => PointerKind::Coarse,
            Self::Auto | Self::Fine => PointerKind::Fine,
        }
    }
}

impl fmt::Display for PointerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Fine => "fine",
            Self::Coarse => "coarse",
        })
    }
}

/// `[interaction]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionSettings {
    pub pointer: PointerPreference,
}

/// `[debug]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugSettings {
    /// Allow callers to obtain the raw engine handle
    pub expose_engine: bool,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            default_layers: DEFAULT_LAYERS.iter().map(|s| s.to_string()).collect(),
            fit_padding: DEFAULT_FIT_PADDING,
            fit_duration_ms: DEFAULT_FIT_DURATION_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            http: HttpSettings::default(),
            map: MapSettings::default(),
            interaction: InteractionSettings::default(),
            debug: DebugSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}
