use std::path::Path;

use crate::config_loader::{load_config, resolve_config_env_vars};

/// Load and sanity-check the configuration file without touching the
/// state store or any external source. Reports every problem found rather
/// than stopping at the first one.
pub async fn run(config_path: &Path) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let config = resolve_config_env_vars(config)?;

    let mut problems = Vec::new();

    if config.sources.is_empty() {
        problems.push("no sources configured".to_owned());
    }

    for source in &config.sources {
        if let Err(err) = source.validate_connection() {
            problems.push(format!("source {}: {err}", source.name));
        }
        if driftwatch_scheduler::parse_schedule(&source.schedule).is_err() {
            problems.push(format!("source {}: invalid schedule {:?}", source.name, source.schedule));
        }
    }

    for webhook in &config.alerting.webhooks {
        if let Err(err) = webhook.validate_url() {
            problems.push(format!("webhook {}: {err}", webhook.name));
        }
    }

    if problems.is_empty() {
        println!("configuration is valid: {} source(s), {} webhook(s)", config.sources.len(), config.alerting.webhooks.len());
        Ok(0)
    } else {
        for problem in &problems {
            eprintln!("error: {problem}");
        }
        Ok(1)
    }
}
