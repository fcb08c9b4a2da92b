pub mod catalog;
pub mod config;
pub mod quote;
pub mod validate_catalog;

use fleetcfg_core::config::{AppConfig, LoadOptions};
use fleetcfg_core::Catalog;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn json<T: Serialize>(command: &str, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 4),
        }
    }
}

/// Loads config and the catalog it points at, mapping failures to the command's exit codes.
pub(crate) fn load_context(
    command: &str,
    options: LoadOptions,
) -> Result<(AppConfig, Catalog), CommandResult> {
    let config = AppConfig::load(options).map_err(|error| {
        warn!(
            event_name = "cli.config.invalid",
            command,
            error = %error,
            "configuration rejected"
        );
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })?;

    let catalog = Catalog::load_or_reference(config.catalog.path.as_deref()).map_err(|error| {
        warn!(
            event_name = "cli.catalog.load_failed",
            command,
            error = %error,
            "catalog could not be loaded"
        );
        CommandResult::failure(command, "catalog", format!("catalog issue: {error}"), 3)
    })?;

    info!(
        event_name = "cli.catalog.loaded",
        command,
        source = config
            .catalog
            .path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "reference".to_owned()),
        models = catalog.models().len(),
        "catalog loaded"
    );

    Ok((config, catalog))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
