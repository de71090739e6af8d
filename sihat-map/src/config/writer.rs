//! INI serialization: `ConfigFile` → commented INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let base_url = config.data.base_url.as_deref().unwrap_or("");
    let expose_engine = if config.debug.expose_engine {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[data]
; Base URL for site-relative dataset and icon paths such as /data/apotek.json.
; Leave empty to request the paths as written.
base_url = {}

[http]
; Request timeout in seconds
timeout = {}
user_agent = {}

[map]
; Initial view as lng,lat and zoom
center = {},{}
zoom = {}
; Layers shown once the map style has loaded (comma-separated ids)
default_layers = {}
; Padding (px) and animation duration (ms) when fitting a layer's bounds
fit_padding = {}
fit_duration_ms = {}

[interaction]
; Pointer type: auto, fine (mouse, hover popups) or coarse (touch, click only)
pointer = {}

[debug]
; Allow callers to obtain the raw map engine handle
expose_engine = {}

[logging]
file = {}
"#,
        base_url,
        config.http.timeout,
        config.http.user_agent,
        config.map.center.lng,
        config.map.center.lat,
        config.map.zoom,
        config.map.default_layers.join(", "),
        config.map.fit_padding,
        config.map.fit_duration_ms,
        config.interaction.pointer,
        expose_engine,
        config.logging.file.to_string_lossy(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.data.base_url = Some("https://sihat.example".into());
        config.map.default_layers = vec!["hospitals".into(), "elderly".into()];
        config.debug.expose_engine = true;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_written_config_is_commented() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("; Pointer type"));
        assert!(content.contains("default_layers = hospitals"));
        assert!(content.contains("pointer = auto"));
    }
}
