use std::env;
use std::fs;
use std::path::Path;

use fleetcfg_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<built-in reference catalog>".to_string());

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["FLEETCFG_LOGGING_LEVEL", "FLEETCFG_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["FLEETCFG_LOGGING_FORMAT", "FLEETCFG_LOG_FORMAT"]),
        ),
        render_line("catalog.path", &catalog_path, source("catalog.path", &["FLEETCFG_CATALOG_PATH"])),
        render_line(
            "pricing.currency",
            &config.pricing.currency,
            source("pricing.currency", &["FLEETCFG_PRICING_CURRENCY"]),
        ),
        render_line(
            "pricing.resolution_mode",
            config.pricing.resolution_mode.as_str(),
            source("pricing.resolution_mode", &["FLEETCFG_PRICING_RESOLUTION_MODE"]),
        ),
        render_line(
            "pricing.max_resolution_passes",
            &config.pricing.max_resolution_passes.to_string(),
            source("pricing.max_resolution_passes", &["FLEETCFG_PRICING_MAX_RESOLUTION_PASSES"]),
        ),
    ];

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
