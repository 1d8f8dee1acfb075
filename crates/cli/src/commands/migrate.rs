use crate::commands::CommandResult;
use storelens_core::config::{AppConfig, LoadOptions};
use storelens_db::{connect, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
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
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let missing = migrations::missing_tables(&pool)
            .await
            .map_err(|error| ("schema_verification", error.to_string(), 5u8))?;
        pool.close().await;

        schema_status(&missing).map_err(|message| ("schema_verification", message, 5u8))
    });

    match result {
        Ok(message) => CommandResult::success("migrate", message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

/// Post-migration summary: every analytics table must exist once the
/// migrator has run.
fn schema_status(missing: &[String]) -> Result<String, String> {
    if missing.is_empty() {
        Ok(format!(
            "analytics schema is current; all {} tables present",
            migrations::ANALYTICS_TABLES.len()
        ))
    } else {
        Err(format!("schema incomplete after migrating: missing {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::schema_status;

    #[test]
    fn complete_schema_reports_every_table() {
        let message = schema_status(&[]).expect("schema should be complete");
        assert!(message.contains("all 5 tables"));
    }

    #[test]
    fn missing_tables_fail_with_their_names() {
        let missing = vec!["inventory".to_string(), "transactions".to_string()];
        let error = schema_status(&missing).unwrap_err();
        assert!(error.contains("inventory, transactions"));
    }
}
