use std::path::PathBuf;

use thiserror::Error;

/// Startup faults. Any of these aborts the session.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing config file {path} (run `barb init` to create a sample)")]
    Missing { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for `{field}` in {path}: {reason}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

/// Save faults. Logged by the caller; the in-memory state stays authoritative.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The oracle could not produce an answer (EOF, cancelled prompt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("prompt interrupted")]
pub struct Interrupted;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("no turn in progress")]
    NotInTurn,

    #[error("no attacks left this turn ({used}/{max})")]
    NoAttacksLeft { used: u32, max: u32 },

    #[error("bonus action already used this turn")]
    BonusActionUsed,

    #[error("{0} is not available right now")]
    Unavailable(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}
