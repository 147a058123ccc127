use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;

use crate::commands::{load_config, CommandResult};

struct SourceLookup {
    file_path: Option<PathBuf>,
    file_doc: Option<Value>,
}

impl SourceLookup {
    fn detect() -> Self {
        let file_path = detect_config_path();
        let file_doc = load_config_file_doc(file_path.as_deref());
        Self { file_path, file_doc }
    }

    fn field_source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }

    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        render_line(key_path, value, self.field_source(key_path, env_keys))
    }
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let sources = SourceLookup::detect();

    let timeout =
        config.api.timeout_secs.map(|secs| secs.to_string()).unwrap_or_else(|| "<unset>".into());
    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        sources.line(
            "api.products_url",
            &config.api.products_url,
            &["STOREFRONT_API_PRODUCTS_URL"],
        ),
        sources.line("api.timeout_secs", &timeout, &["STOREFRONT_API_TIMEOUT_SECS"]),
        sources.line(
            "notifications.product_added_ms",
            &config.notifications.product_added_ms.to_string(),
            &["STOREFRONT_NOTIFICATIONS_PRODUCT_ADDED_MS"],
        ),
        sources.line(
            "notifications.cart_ms",
            &config.notifications.cart_ms.to_string(),
            &["STOREFRONT_NOTIFICATIONS_CART_MS"],
        ),
        sources.line(
            "notifications.failure_ms",
            &config.notifications.failure_ms.to_string(),
            &["STOREFRONT_NOTIFICATIONS_FAILURE_MS"],
        ),
        sources.line(
            "logging.level",
            &config.logging.level,
            &["STOREFRONT_LOGGING_LEVEL", "STOREFRONT_LOG_LEVEL"],
        ),
        sources.line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            &["STOREFRONT_LOGGING_FORMAT", "STOREFRONT_LOG_FORMAT"],
        ),
    ];

    CommandResult::success("config", lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("storefront.toml"), PathBuf::from("config/storefront.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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
