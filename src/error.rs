use thiserror::Error;

/// Unified error type for samba-updater operations
#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command `{command}` failed: {diagnostic}")]
    Command { command: String, diagnostic: String },

    #[error("Command `{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Signature verification failed for {file}: {diagnostic}")]
    Verification { file: String, diagnostic: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Aborted by operator: {0}")]
    Aborted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in samba-updater
pub type Result<T> = std::result::Result<T, UpdaterError>;

impl UpdaterError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        UpdaterError::Config(msg.into())
    }

    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        UpdaterError::Parse(msg.into())
    }

    /// Create an external command failure carrying the raw diagnostic
    pub fn command(command: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        UpdaterError::Command {
            command: command.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Create a signature verification failure
    pub fn verification(file: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        UpdaterError::Verification {
            file: file.into(),
            diagnostic: diagnostic.into(),
        }
    }

    /// Create an operator abort
    pub fn aborted(msg: impl Into<String>) -> Self {
        UpdaterError::Aborted(msg.into())
    }

    /// Whether this error stops the whole run rather than just the current package.
    ///
    /// Malformed versions, missing declarations, bad configuration and an
    /// operator abort are run-fatal. External command, network and signature
    /// failures only abandon the package being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            UpdaterError::Parse(_)
                | UpdaterError::Config(_)
                | UpdaterError::Toml(_)
                | UpdaterError::Aborted(_)
        )
    }
}
