use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::constraints::ResolutionMode;

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["fleetcfg.toml", "config/fleetcfg.toml"];

const MAX_RESOLUTION_PASSES_LIMIT: u32 = 16;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub catalog: CatalogConfig,
    pub pricing: PricingConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// TOML catalog to load instead of the built-in reference catalog.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub currency: String,
    pub resolution_mode: ResolutionStrategy,
    pub max_resolution_passes: u32,
}

impl PricingConfig {
    pub fn resolution_mode(&self) -> ResolutionMode {
        match self.resolution_mode {
            ResolutionStrategy::SinglePass => ResolutionMode::SinglePass,
            ResolutionStrategy::FixedPoint => {
                ResolutionMode::FixedPoint { max_passes: self.max_resolution_passes }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    SinglePass,
    FixedPoint,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SinglePass => "single_pass",
            Self::FixedPoint => "fixed_point",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub catalog_path: Option<PathBuf>,
    pub currency: Option<String>,
    pub resolution_mode: Option<ResolutionStrategy>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            catalog: CatalogConfig::default(),
            pricing: PricingConfig {
                currency: "USD".to_string(),
                resolution_mode: ResolutionStrategy::SinglePass,
                max_resolution_passes: 4,
            },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for ResolutionStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_pass" => Ok(Self::SinglePass),
            "fixed_point" => Ok(Self::FixedPoint),
            other => Err(ConfigError::Validation(format!(
                "unsupported resolution mode `{other}` (expected single_pass|fixed_point)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
            if let Some(resolution_mode) = pricing.resolution_mode {
                self.pricing.resolution_mode = resolution_mode;
            }
            if let Some(max_resolution_passes) = pricing.max_resolution_passes {
                self.pricing.max_resolution_passes = max_resolution_passes;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level =
            read_env("FLEETCFG_LOGGING_LEVEL").or_else(|| read_env("FLEETCFG_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FLEETCFG_LOGGING_FORMAT").or_else(|| read_env("FLEETCFG_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("FLEETCFG_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("FLEETCFG_PRICING_CURRENCY") {
            self.pricing.currency = value;
        }
        if let Some(value) = read_env("FLEETCFG_PRICING_RESOLUTION_MODE") {
            self.pricing.resolution_mode = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "FLEETCFG_PRICING_RESOLUTION_MODE".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("FLEETCFG_PRICING_MAX_RESOLUTION_PASSES") {
            self.pricing.max_resolution_passes =
                parse_u32("FLEETCFG_PRICING_MAX_RESOLUTION_PASSES", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(currency) = overrides.currency {
            self.pricing.currency = currency;
        }
        if let Some(resolution_mode) = overrides.resolution_mode {
            self.pricing.resolution_mode = resolution_mode;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)?;
        validate_catalog(&self.catalog)?;
        validate_pricing(&self.pricing)?;
        Ok(())
    }
}

/// The config file `load` would read: `explicit_path` when it exists, otherwise the first
/// of [`DEFAULT_CONFIG_PATHS`] present in the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(path) = &catalog.path {
        if !path.is_file() {
            return Err(ConfigError::Validation(format!(
                "catalog.path `{}` does not point to a file. Remove the setting to use the \
                 built-in catalog, or run `fleetcfg validate-catalog <path>` on your file",
                path.display()
            )));
        }
    }
    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let currency = pricing.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "pricing.currency must be a three-letter ISO 4217 code such as USD (got `{currency}`)"
        )));
    }

    if pricing.max_resolution_passes == 0
        || pricing.max_resolution_passes > MAX_RESOLUTION_PASSES_LIMIT
    {
        return Err(ConfigError::Validation(format!(
            "pricing.max_resolution_passes must be in range 1..={MAX_RESOLUTION_PASSES_LIMIT}"
        )));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    catalog: Option<CatalogPatch>,
    pricing: Option<PricingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    currency: Option<String>,
    resolution_mode: Option<ResolutionStrategy>,
    max_resolution_passes: Option<u32>,
}
