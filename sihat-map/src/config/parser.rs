//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::MAX_INITIAL_ZOOM;
use super::file::ConfigFileError;
use super::settings::{ConfigFile, PointerPreference};
use crate::geometry::LngLat;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [data]
    if let Some(section) = ini.section(Some("data")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if v.is_empty() {
                config.data.base_url = None;
            } else if v.starts_with("http://") || v.starts_with("https://") {
                config.data.base_url = Some(v.trim_end_matches('/').to_string());
            } else {
                return Err(invalid(
                    "data",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
        }
    }

    // [http]
    if let Some(section) = ini.section(Some("http")) {
        if let Some(v) = section.get("timeout") {
            config.http.timeout = match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(invalid("http", "timeout", v, "must be a positive number of seconds")),
            };
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.http.user_agent = v.to_string();
            }
        }
    }

    // [map]
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = section.get("center") {
            config.map.center = parse_center(v)
                .ok_or_else(|| invalid("map", "center", v, "must be 'lng,lat' in degrees"))?;
        }
        if let Some(v) = section.get("zoom") {
            config.map.zoom = match v.trim().parse::<f64>() {
                Ok(z) if (0.0..=MAX_INITIAL_ZOOM).contains(&z) => z,
                _ => return Err(invalid("map", "zoom", v, "must be a number between 0 and 22")),
            };
        }
        if let Some(v) = section.get("default_layers") {
            config.map.default_layers = parse_list(v);
        }
        if let Some(v) = section.get("fit_padding") {
            config.map.fit_padding = v
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid("map", "fit_padding", v, "must be a whole number of pixels"))?;
        }
        if let Some(v) = section.get("fit_duration_ms") {
            config.map.fit_duration_ms = v
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid("map", "fit_duration_ms", v, "must be milliseconds"))?;
        }
    }

    // [interaction]
    if let Some(section) = ini.section(Some("interaction")) {
        if let Some(v) = section.get("pointer") {
            config.interaction.pointer = PointerPreference::parse(v)
                .ok_or_else(|| invalid("interaction", "pointer", v, "must be one of: auto, fine, coarse"))?;
        }
    }

    // [debug]
    if let Some(section) = ini.section(Some("debug")) {
        if let Some(v) = section.get("expose_engine") {
            config.debug.expose_engine = parse_bool(v);
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Comma-separated list, blanks dropped.
pub(super) fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_center(value: &str) -> Option<LngLat> {
    let (lng, lat) = value.split_once(',')?;
    let lng = lng.trim().parse::<f64>().ok()?;
    let lat = lat.trim().parse::<f64>().ok()?;
    ((-180.0..=180.0).contains(&lng) && (-90.0..=90.0).contains(&lat)).then(|| LngLat::new(lng, lat))
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
