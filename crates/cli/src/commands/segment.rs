use chrono::Utc;
use storelens_core::config::{AppConfig, LoadOptions};
use storelens_core::rfm;
use storelens_db::{connect, SqlAnalyticsSource};
use tracing::info;
use uuid::Uuid;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "segment",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "segment",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let run_id = Uuid::new_v4().simple().to_string();
    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        info!(run_id = %run_id, command = "segment", "starting analytics run");
        let source = SqlAnalyticsSource::new(pool.clone());
        let report = rfm::run(&source, &config.analytics.rfm, Utc::now()).await;
        pool.close().await;

        let report = report.map_err(|error| ("data_access", error.to_string(), 5u8))?;
        serde_json::to_string_pretty(&report)
            .map_err(|error| ("serialization", error.to_string(), 6u8))
    });

    match result {
        Ok(json) => CommandResult::report(json),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("segment", error_class, message, exit_code)
        }
    }
}
