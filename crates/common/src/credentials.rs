//! Local credential cache
//!
//! Credentials live in a small JSON file. Any failure to read it falls back
//! to prompting, and prompted credentials are written straight back. The
//! cache is a convenience, not a secret store.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::prompt::Prompter;

/// Identity sent with extension requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub token: String,
}

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cached credentials, or prompted ones if the cache is unusable
    pub async fn get(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        match self.load() {
            Ok(credentials) => Ok(credentials),
            Err(e) => {
                debug!("Credential cache unusable ({}), prompting", e);
                self.prompt(prompter).await
            }
        }
    }

    /// Ask for email and token, then write them through to the cache.
    ///
    /// A failed write is logged; the collected credentials are returned
    /// either way.
    pub async fn prompt(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        let email = ask_non_empty(prompter, "Email:").await?;
        let token = ask_non_empty(prompter, "Token:").await?;
        let credentials = Credentials { email, token };

        if let Err(e) = self.save(&credentials) {
            warn!("{}", e);
        }

        Ok(credentials)
    }

    /// Prompt for new credentials regardless of what is cached
    pub async fn update(&self, prompter: &mut dyn Prompter) -> Result<Credentials> {
        self.prompt(prompter).await
    }

    /// Read and parse the cache file
    pub fn load(&self) -> Result<Credentials> {
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let persist_err = |reason: String| Error::CredentialPersist {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(credentials)
            .map_err(|e| persist_err(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| persist_err(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .map_err(|e| persist_err(e.to_string()))?;
        }

        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}

async fn ask_non_empty(prompter: &mut dyn Prompter, question: &str) -> Result<String> {
    loop {
        let answer = prompter.ask(question).await?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}
