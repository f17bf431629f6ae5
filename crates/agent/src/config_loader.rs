use std::path::Path;

use driftwatch_core::{DriftwatchConfig, resolve_env_vars};

use crate::error::AgentError;

/// Load a driftwatch configuration file, dispatching on its extension:
/// `.yaml`/`.yml` via `serde_yaml_ng`, `.toml` via `toml`. Both deserialize
/// into the same [`DriftwatchConfig`].
pub fn load_config(path: &Path) -> Result<DriftwatchConfig, AgentError> {
    let text = std::fs::read_to_string(path).map_err(|source| AgentError::Read {
        path: path.display().to_string(),
        source,
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => serde_yaml_ng::from_str(&text).map_err(|source| AgentError::Yaml {
            path: path.display().to_string(),
            source,
        }),
        Some("toml") => toml::from_str(&text).map_err(|source| AgentError::Toml {
            path: path.display().to_string(),
            source,
        }),
        other => Err(AgentError::UnsupportedExtension(other.unwrap_or("").to_owned())),
    }
}

/// Resolve every `${VAR}` placeholder in `config`'s connection strings and
/// webhook URLs/secrets against the process environment, returning a new,
/// fully-resolved config ready to hand to a connector or the alerting
/// pipeline.
pub fn resolve_config_env_vars(mut config: DriftwatchConfig) -> Result<DriftwatchConfig, AgentError> {
    for source in &mut config.sources {
        source.connection = resolve_env_vars(&source.connection)?;
    }

    for webhook in &mut config.alerting.webhooks {
        webhook.url = resolve_env_vars(&webhook.url)?;
        webhook.secret = webhook.secret.as_deref().map(resolve_env_vars).transpose()?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(suffix: &str, contents: &str) -> tempfile_path::TempPath {
        tempfile_path::TempPath::with_contents(suffix, contents)
    }

    mod tempfile_path {
        use std::path::{Path, PathBuf};

        pub struct TempPath(PathBuf);

        impl TempPath {
            pub fn with_contents(suffix: &str, contents: &str) -> Self {
                let mut path = std::env::temp_dir();
                path.push(format!("driftwatch-test-{}-{suffix}", std::process::id()));
                std::fs::write(&path, contents).unwrap();
                Self(path)
            }
        }

        impl AsRef<Path> for TempPath {
            fn as_ref(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    const SAMPLE_YAML: &str = r#"
version: "1"
agent:
  id: test-agent
storage:
  backend: sqlite
  path: ./test.db
sources:
  - name: orders_daily
    connection: "postgres://${DB_HOST}/orders"
    query: "select count(*) as row_count from orders"
alerting:
  cooldown_minutes: 30
  webhooks:
    - name: slack
      url: "https://hooks.example.com/${WEBHOOK_PATH}"
"#;

    #[test]
    fn loads_yaml_config() {
        let path = write_temp("config.yaml", SAMPLE_YAML);
        let config = load_config(path.as_ref()).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.agent.id, "test-agent");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let path = write_temp("config.ini", SAMPLE_YAML);
        let result = load_config(path.as_ref());
        assert!(result.is_err());
    }

    #[test]
    fn resolve_env_vars_fills_in_placeholders() {
        // SAFETY: test-only env mutation, not run concurrently with reads of these vars.
        #[allow(unsafe_code)]
        unsafe {
            std::env::set_var("DB_HOST", "db.internal");
            std::env::set_var("WEBHOOK_PATH", "abc123");
        }

        let path = write_temp("config2.yaml", SAMPLE_YAML);
        let config = load_config(path.as_ref()).unwrap();
        let resolved = resolve_config_env_vars(config).unwrap();

        assert_eq!(resolved.sources[0].connection, "postgres://db.internal/orders");
        assert_eq!(resolved.alerting.webhooks[0].url, "https://hooks.example.com/abc123");

        #[allow(unsafe_code)]
        unsafe {
            std::env::remove_var("DB_HOST");
            std::env::remove_var("WEBHOOK_PATH");
        }
    }

    #[test]
    fn unresolved_var_is_an_error() {
        let path = write_temp("config3.yaml", SAMPLE_YAML);
        let config = load_config(path.as_ref()).unwrap();
        // DB_HOST/WEBHOOK_PATH are not guaranteed unset here if another test
        // ran first in the same process; exercise a var name that can't
        // plausibly be set instead.
        let mut config = config;
        config.sources[0].connection = "postgres://${DRIFTWATCH_TEST_UNSET_VAR}/orders".into();
        let result = resolve_config_env_vars(config);
        assert!(result.is_err());
    }
}
