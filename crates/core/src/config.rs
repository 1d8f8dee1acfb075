use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rfm::SegmentStrategy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct AnalyticsConfig {
    pub rfm: RfmConfig,
    pub inventory: InventoryConfig,
    pub forecast: ForecastConfig,
    pub association: AssociationConfig,
}

#[derive(Clone, Debug)]
pub struct RfmConfig {
    /// Activity window in days; also the recency sentinel for customers with
    /// no purchase history.
    pub lookback_days: i64,
    pub strategy: SegmentStrategy,
}

#[derive(Clone, Debug)]
pub struct InventoryConfig {
    /// Fixed cost per purchase order, in currency units.
    pub ordering_cost: f64,
    /// Annual holding cost as a fraction of unit cost.
    pub holding_cost_rate: f64,
    /// Demand-coverage probability used for safety stock, in (0, 1).
    pub service_level: f64,
    pub lead_time_days: f64,
    /// Trailing window for demand estimation, a year by default so
    /// annual demand covers a full seasonal cycle.
    pub demand_window_days: i64,
    /// Cumulative stock-value share ceilings for ABC classes A and B, in
    /// percent.
    pub abc_a_threshold: f64,
    pub abc_b_threshold: f64,
}

#[derive(Clone, Debug)]
pub struct ForecastConfig {
    /// Default number of future days predicted when the caller does not ask
    /// for a specific horizon.
    pub horizon_days: u32,
    pub max_horizon_days: u32,
}

#[derive(Clone, Debug)]
pub struct AssociationConfig {
    pub window_days: i64,
    pub co_purchase_limit: usize,
    pub customer_overlap_limit: usize,
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
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub rfm_strategy: Option<SegmentStrategy>,
    pub forecast_horizon_days: Option<u32>,
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
            database: DatabaseConfig {
                url: "sqlite://storelens.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            analytics: AnalyticsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self { lookback_days: 365, strategy: SegmentStrategy::Precedence }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            ordering_cost: 50.0,
            holding_cost_rate: 0.20,
            service_level: 0.95,
            lead_time_days: 7.0,
            demand_window_days: 365,
            abc_a_threshold: 80.0,
            abc_b_threshold: 95.0,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { horizon_days: 30, max_horizon_days: 365 }
    }
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self { window_days: 90, co_purchase_limit: 5, customer_overlap_limit: 10 }
    }
}

impl std::str::FromStr for SegmentStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "precedence" => Ok(Self::Precedence),
            "composite" => Ok(Self::Composite),
            other => Err(ConfigError::Validation(format!(
                "unsupported rfm strategy `{other}` (expected precedence|composite)"
            ))),
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("storelens.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(analytics) = patch.analytics {
            if let Some(rfm) = analytics.rfm {
                if let Some(lookback_days) = rfm.lookback_days {
                    self.analytics.rfm.lookback_days = lookback_days;
                }
                if let Some(strategy) = rfm.strategy {
                    self.analytics.rfm.strategy = strategy;
                }
            }

            if let Some(inventory) = analytics.inventory {
                if let Some(ordering_cost) = inventory.ordering_cost {
                    self.analytics.inventory.ordering_cost = ordering_cost;
                }
                if let Some(holding_cost_rate) = inventory.holding_cost_rate {
                    self.analytics.inventory.holding_cost_rate = holding_cost_rate;
                }
                if let Some(service_level) = inventory.service_level {
                    self.analytics.inventory.service_level = service_level;
                }
                if let Some(lead_time_days) = inventory.lead_time_days {
                    self.analytics.inventory.lead_time_days = lead_time_days;
                }
                if let Some(demand_window_days) = inventory.demand_window_days {
                    self.analytics.inventory.demand_window_days = demand_window_days;
                }
                if let Some(abc_a_threshold) = inventory.abc_a_threshold {
                    self.analytics.inventory.abc_a_threshold = abc_a_threshold;
                }
                if let Some(abc_b_threshold) = inventory.abc_b_threshold {
                    self.analytics.inventory.abc_b_threshold = abc_b_threshold;
                }
            }

            if let Some(forecast) = analytics.forecast {
                if let Some(horizon_days) = forecast.horizon_days {
                    self.analytics.forecast.horizon_days = horizon_days;
                }
                if let Some(max_horizon_days) = forecast.max_horizon_days {
                    self.analytics.forecast.max_horizon_days = max_horizon_days;
                }
            }

            if let Some(association) = analytics.association {
                if let Some(window_days) = association.window_days {
                    self.analytics.association.window_days = window_days;
                }
                if let Some(co_purchase_limit) = association.co_purchase_limit {
                    self.analytics.association.co_purchase_limit = co_purchase_limit;
                }
                if let Some(customer_overlap_limit) = association.customer_overlap_limit {
                    self.analytics.association.customer_overlap_limit = customer_overlap_limit;
                }
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
        if let Some(value) = read_env("STORELENS_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("STORELENS_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("STORELENS_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("STORELENS_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("STORELENS_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STORELENS_RFM_LOOKBACK_DAYS") {
            self.analytics.rfm.lookback_days = parse_i64("STORELENS_RFM_LOOKBACK_DAYS", &value)?;
        }
        if let Some(value) = read_env("STORELENS_RFM_STRATEGY") {
            self.analytics.rfm.strategy = value.parse()?;
        }

        if let Some(value) = read_env("STORELENS_INVENTORY_ORDERING_COST") {
            self.analytics.inventory.ordering_cost =
                parse_f64("STORELENS_INVENTORY_ORDERING_COST", &value)?;
        }
        if let Some(value) = read_env("STORELENS_INVENTORY_HOLDING_COST_RATE") {
            self.analytics.inventory.holding_cost_rate =
                parse_f64("STORELENS_INVENTORY_HOLDING_COST_RATE", &value)?;
        }
        if let Some(value) = read_env("STORELENS_INVENTORY_SERVICE_LEVEL") {
            self.analytics.inventory.service_level =
                parse_f64("STORELENS_INVENTORY_SERVICE_LEVEL", &value)?;
        }
        if let Some(value) = read_env("STORELENS_INVENTORY_LEAD_TIME_DAYS") {
            self.analytics.inventory.lead_time_days =
                parse_f64("STORELENS_INVENTORY_LEAD_TIME_DAYS", &value)?;
        }
        if let Some(value) = read_env("STORELENS_INVENTORY_DEMAND_WINDOW_DAYS") {
            self.analytics.inventory.demand_window_days =
                parse_i64("STORELENS_INVENTORY_DEMAND_WINDOW_DAYS", &value)?;
        }

        if let Some(value) = read_env("STORELENS_FORECAST_HORIZON_DAYS") {
            self.analytics.forecast.horizon_days =
                parse_u32("STORELENS_FORECAST_HORIZON_DAYS", &value)?;
        }

        if let Some(value) = read_env("STORELENS_ASSOCIATION_WINDOW_DAYS") {
            self.analytics.association.window_days =
                parse_i64("STORELENS_ASSOCIATION_WINDOW_DAYS", &value)?;
        }

        let log_level =
            read_env("STORELENS_LOGGING_LEVEL").or_else(|| read_env("STORELENS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STORELENS_LOGGING_FORMAT").or_else(|| read_env("STORELENS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(rfm_strategy) = overrides.rfm_strategy {
            self.analytics.rfm.strategy = rfm_strategy;
        }
        if let Some(forecast_horizon_days) = overrides.forecast_horizon_days {
            self.analytics.forecast.horizon_days = forecast_horizon_days;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_analytics(&self.analytics)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("storelens.toml"), PathBuf::from("config/storelens.toml")]
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

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_analytics(analytics: &AnalyticsConfig) -> Result<(), ConfigError> {
    if analytics.rfm.lookback_days <= 0 {
        return Err(ConfigError::Validation(
            "analytics.rfm.lookback_days must be greater than zero".to_string(),
        ));
    }

    let inventory = &analytics.inventory;
    if inventory.ordering_cost <= 0.0 {
        return Err(ConfigError::Validation(
            "analytics.inventory.ordering_cost must be positive".to_string(),
        ));
    }
    if inventory.holding_cost_rate <= 0.0 || inventory.holding_cost_rate > 1.0 {
        return Err(ConfigError::Validation(
            "analytics.inventory.holding_cost_rate must be in range (0, 1]".to_string(),
        ));
    }
    if !(0.5..1.0).contains(&inventory.service_level) {
        return Err(ConfigError::Validation(
            "analytics.inventory.service_level must be in range [0.5, 1.0)".to_string(),
        ));
    }
    if inventory.lead_time_days <= 0.0 {
        return Err(ConfigError::Validation(
            "analytics.inventory.lead_time_days must be positive".to_string(),
        ));
    }
    if inventory.demand_window_days <= 0 {
        return Err(ConfigError::Validation(
            "analytics.inventory.demand_window_days must be greater than zero".to_string(),
        ));
    }
    let a = inventory.abc_a_threshold;
    let b = inventory.abc_b_threshold;
    if !(0.0 < a && a < b && b <= 100.0) {
        return Err(ConfigError::Validation(
            "analytics.inventory abc thresholds must satisfy 0 < a < b <= 100".to_string(),
        ));
    }

    let forecast = &analytics.forecast;
    if forecast.max_horizon_days == 0 {
        return Err(ConfigError::Validation(
            "analytics.forecast.max_horizon_days must be greater than zero".to_string(),
        ));
    }
    if forecast.horizon_days > forecast.max_horizon_days {
        return Err(ConfigError::Validation(format!(
            "analytics.forecast.horizon_days must not exceed max_horizon_days ({})",
            forecast.max_horizon_days
        )));
    }

    let association = &analytics.association;
    if association.window_days <= 0 {
        return Err(ConfigError::Validation(
            "analytics.association.window_days must be greater than zero".to_string(),
        ));
    }
    if association.co_purchase_limit == 0 || association.customer_overlap_limit == 0 {
        return Err(ConfigError::Validation(
            "analytics.association result limits must be greater than zero".to_string(),
        ));
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

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    analytics: Option<AnalyticsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyticsPatch {
    rfm: Option<RfmPatch>,
    inventory: Option<InventoryPatch>,
    forecast: Option<ForecastPatch>,
    association: Option<AssociationPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RfmPatch {
    lookback_days: Option<i64>,
    strategy: Option<SegmentStrategy>,
}

#[derive(Debug, Default, Deserialize)]
struct InventoryPatch {
    ordering_cost: Option<f64>,
    holding_cost_rate: Option<f64>,
    service_level: Option<f64>,
    lead_time_days: Option<f64>,
    demand_window_days: Option<i64>,
    abc_a_threshold: Option<f64>,
    abc_b_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ForecastPatch {
    horizon_days: Option<u32>,
    max_horizon_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AssociationPatch {
    window_days: Option<i64>,
    co_purchase_limit: Option<usize>,
    customer_overlap_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::rfm::SegmentStrategy;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_cleanly() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        ensure(config.analytics.rfm.lookback_days == 365, "default lookback should be a year")?;
        ensure(
            config.analytics.inventory.service_level == 0.95,
            "default service level should be 0.95",
        )?;
        ensure(
            config.analytics.inventory.demand_window_days == 365,
            "default demand window should be a year",
        )?;
        ensure(config.analytics.forecast.horizon_days == 30, "default horizon should be 30")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_STORELENS_DB", "sqlite://interpolated.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("storelens.toml");
            fs::write(
                &path,
                r#"
[database]
url = "${TEST_STORELENS_DB}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://interpolated.db",
                "database url should be interpolated from the environment",
            )
        })();

        clear_vars(&["TEST_STORELENS_DB"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STORELENS_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("STORELENS_FORECAST_HORIZON_DAYS", "60");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("storelens.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[analytics.forecast]
horizon_days = 45

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.analytics.forecast.horizon_days == 60,
                "env horizon should win over the file value",
            )
        })();

        clear_vars(&["STORELENS_DATABASE_URL", "STORELENS_FORECAST_HORIZON_DAYS"]);
        result
    }

    #[test]
    fn rfm_strategy_env_override_parses() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STORELENS_RFM_STRATEGY", "composite");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.analytics.rfm.strategy == SegmentStrategy::Composite,
                "strategy should be composite from env",
            )
        })();

        clear_vars(&["STORELENS_RFM_STRATEGY"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STORELENS_INVENTORY_SERVICE_LEVEL", "1.5");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("service_level")
            );
            ensure(has_message, "validation failure should mention service_level")
        })();

        clear_vars(&["STORELENS_INVENTORY_SERVICE_LEVEL"]);
        result
    }

    #[test]
    fn non_sqlite_database_url_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://elsewhere/db".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure for non-sqlite url".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("database.url")),
            "error should mention database.url",
        )
    }

    #[test]
    fn log_format_env_alias_is_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("STORELENS_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from the alias env var",
            )
        })();

        clear_vars(&["STORELENS_LOG_FORMAT"]);
        result
    }
}
