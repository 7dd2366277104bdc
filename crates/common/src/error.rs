//! Error types for uirec

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the uirec Error
pub type Result<T> = std::result::Result<T, Error>;

/// uirec error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("Transient read failure on {path}: {reason}")]
    TransientRead { path: PathBuf, reason: String },

    #[error("Could not save credentials to {path}: {reason}")]
    CredentialPersist { path: PathBuf, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Extension service rejected the request ({status}): {body}")]
    RemoteRejection { status: u16, body: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Session error: {0}")]
    SessionState(String),

    #[error("Interactive input closed")]
    InputClosed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Error::MalformedRequest(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}
