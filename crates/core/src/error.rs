use thiserror::Error;

/// Errors raised while validating or resolving configuration values.
///
/// These are data-model-level errors: malformed connection strings,
/// unresolved environment variable placeholders. Backend-specific config
/// loading errors (bad YAML, missing file) are an external collaborator's
/// concern and are not represented here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A `${NAME}` placeholder referenced an environment variable that is
    /// not set.
    #[error("environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// A connection string or URL appears to embed plaintext credentials
    /// instead of deferring to an environment variable placeholder.
    #[error("value appears to contain inline credentials, use ${{VAR}} instead: {0}")]
    InlineCredentials(String),
}
