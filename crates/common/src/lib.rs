//! uirec Common Library
//!
//! Shared configuration, error types and the script pipeline used by the
//! recording session and the command-line interface:
//!
//! ```text
//! raw codegen output ──► WaitAnalyzer::enhance ──► wrap ──► TransformedScript
//!                                                              │
//!                                     persist::save_script ◄───┘
//!                                              │
//!                                   ExtensionClient::extend_file
//!                                              │
//!                                    CredentialStore::get
//! ```

pub mod analyzer;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extend;
pub mod persist;
pub mod prompt;
pub mod transform;

// Re-export commonly used types
pub use analyzer::{HeuristicWaitAnalyzer, WaitAnalyzer};
pub use config::RecorderConfig;
pub use credentials::{CredentialStore, Credentials};
pub use error::{Error, Result};
pub use extend::ExtensionClient;
pub use prompt::{Prompter, ScriptedPrompter, StdinPrompter};
pub use transform::{ScriptTransformer, TransformedScript};

/// uirec version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path for per-user state
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".uirec")
}

/// Default config file path
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Default credential file path
pub fn default_credentials_path() -> std::path::PathBuf {
    default_store_path().join("credentials.json")
}
