use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use storelens_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let line = |key: &str, value: &str, env_key: Option<&str>| {
        render_line(
            key,
            value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        )
    };

    let rfm = &config.analytics.rfm;
    let inventory = &config.analytics.inventory;
    let forecast = &config.analytics.forecast;
    let association = &config.analytics.association;

    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        line("database.url", &config.database.url, Some("STORELENS_DATABASE_URL")),
        line(
            "database.max_connections",
            &config.database.max_connections.to_string(),
            Some("STORELENS_DATABASE_MAX_CONNECTIONS"),
        ),
        line(
            "database.timeout_secs",
            &config.database.timeout_secs.to_string(),
            Some("STORELENS_DATABASE_TIMEOUT_SECS"),
        ),
        line(
            "analytics.rfm.lookback_days",
            &rfm.lookback_days.to_string(),
            Some("STORELENS_RFM_LOOKBACK_DAYS"),
        ),
        line(
            "analytics.rfm.strategy",
            &format!("{:?}", rfm.strategy),
            Some("STORELENS_RFM_STRATEGY"),
        ),
        line(
            "analytics.inventory.ordering_cost",
            &inventory.ordering_cost.to_string(),
            Some("STORELENS_INVENTORY_ORDERING_COST"),
        ),
        line(
            "analytics.inventory.holding_cost_rate",
            &inventory.holding_cost_rate.to_string(),
            Some("STORELENS_INVENTORY_HOLDING_COST_RATE"),
        ),
        line(
            "analytics.inventory.service_level",
            &inventory.service_level.to_string(),
            Some("STORELENS_INVENTORY_SERVICE_LEVEL"),
        ),
        line(
            "analytics.inventory.lead_time_days",
            &inventory.lead_time_days.to_string(),
            Some("STORELENS_INVENTORY_LEAD_TIME_DAYS"),
        ),
        line(
            "analytics.inventory.demand_window_days",
            &inventory.demand_window_days.to_string(),
            Some("STORELENS_INVENTORY_DEMAND_WINDOW_DAYS"),
        ),
        line(
            "analytics.inventory.abc_a_threshold",
            &inventory.abc_a_threshold.to_string(),
            None,
        ),
        line(
            "analytics.inventory.abc_b_threshold",
            &inventory.abc_b_threshold.to_string(),
            None,
        ),
        line(
            "analytics.forecast.horizon_days",
            &forecast.horizon_days.to_string(),
            Some("STORELENS_FORECAST_HORIZON_DAYS"),
        ),
        line(
            "analytics.forecast.max_horizon_days",
            &forecast.max_horizon_days.to_string(),
            None,
        ),
        line(
            "analytics.association.window_days",
            &association.window_days.to_string(),
            Some("STORELENS_ASSOCIATION_WINDOW_DAYS"),
        ),
        line(
            "analytics.association.co_purchase_limit",
            &association.co_purchase_limit.to_string(),
            None,
        ),
        line(
            "analytics.association.customer_overlap_limit",
            &association.customer_overlap_limit.to_string(),
            None,
        ),
        line("logging.level", &config.logging.level, Some("STORELENS_LOGGING_LEVEL")),
        line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            Some("STORELENS_LOGGING_FORMAT"),
        ),
    ];

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("storelens.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/storelens.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
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
