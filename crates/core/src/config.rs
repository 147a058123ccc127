use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::NotificationTimings;

pub const DEFAULT_PRODUCTS_URL: &str = "http://localhost:3001/products";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub products_url: String,
    /// Unset means the HTTP client default (no request timeout).
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub product_added_ms: u64,
    pub cart_ms: u64,
    pub failure_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub products_url: Option<String>,
    pub api_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
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
            api: ApiConfig { products_url: DEFAULT_PRODUCTS_URL.to_string(), timeout_secs: None },
            notifications: NotificationConfig {
                product_added_ms: 5_000,
                cart_ms: 3_000,
                failure_ms: 5_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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

impl NotificationConfig {
    pub fn timings(&self) -> NotificationTimings {
        NotificationTimings {
            product_added: Duration::from_millis(self.product_added_ms),
            cart_change: Duration::from_millis(self.cart_ms),
            failure: Duration::from_millis(self.failure_ms),
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
                options.config_path.unwrap_or_else(|| PathBuf::from("storefront.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(products_url) = api.products_url {
                self.api.products_url = products_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = Some(timeout_secs);
            }
        }

        if let Some(notifications) = patch.notifications {
            if let Some(product_added_ms) = notifications.product_added_ms {
                self.notifications.product_added_ms = product_added_ms;
            }
            if let Some(cart_ms) = notifications.cart_ms {
                self.notifications.cart_ms = cart_ms;
            }
            if let Some(failure_ms) = notifications.failure_ms {
                self.notifications.failure_ms = failure_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOREFRONT_API_PRODUCTS_URL") {
            self.api.products_url = value;
        }
        if let Some(value) = read_env("STOREFRONT_API_TIMEOUT_SECS") {
            self.api.timeout_secs = Some(parse_u64("STOREFRONT_API_TIMEOUT_SECS", &value)?);
        }

        if let Some(value) = read_env("STOREFRONT_NOTIFICATIONS_PRODUCT_ADDED_MS") {
            self.notifications.product_added_ms =
                parse_u64("STOREFRONT_NOTIFICATIONS_PRODUCT_ADDED_MS", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_NOTIFICATIONS_CART_MS") {
            self.notifications.cart_ms = parse_u64("STOREFRONT_NOTIFICATIONS_CART_MS", &value)?;
        }
        if let Some(value) = read_env("STOREFRONT_NOTIFICATIONS_FAILURE_MS") {
            self.notifications.failure_ms =
                parse_u64("STOREFRONT_NOTIFICATIONS_FAILURE_MS", &value)?;
        }

        let log_level =
            read_env("STOREFRONT_LOGGING_LEVEL").or_else(|| read_env("STOREFRONT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOREFRONT_LOGGING_FORMAT").or_else(|| read_env("STOREFRONT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(products_url) = overrides.products_url {
            self.api.products_url = products_url;
        }
        if let Some(timeout_secs) = overrides.api_timeout_secs {
            self.api.timeout_secs = Some(timeout_secs);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_notifications(&self.notifications)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("storefront.toml"), PathBuf::from("config/storefront.toml")]
        .into_iter()
        .find(|path| path.exists())
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

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let url = api.products_url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "api.products_url must start with http:// or https://".to_string(),
        ));
    }

    if let Some(timeout_secs) = api.timeout_secs {
        if timeout_secs == 0 || timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be in range 1..=300".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_notifications(notifications: &NotificationConfig) -> Result<(), ConfigError> {
    let fields = [
        ("notifications.product_added_ms", notifications.product_added_ms),
        ("notifications.cart_ms", notifications.cart_ms),
        ("notifications.failure_ms", notifications.failure_ms),
    ];

    for (name, value) in fields {
        if value == 0 || value > 600_000 {
            return Err(ConfigError::Validation(format!("{name} must be in range 1..=600000")));
        }
    }

    Ok(())
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

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    notifications: Option<NotificationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    products_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    product_added_ms: Option<u64>,
    cart_ms: Option<u64>,
    failure_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
