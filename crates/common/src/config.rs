//! Recorder configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Environment variable overriding the extension service URL
pub const SERVICE_URL_ENV: &str = "UIREC_SERVICE_URL";

/// Recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory holding the artifact file and saved scripts
    pub recordings_dir: PathBuf,

    /// Name of the artifact file the codegen tool writes into `recordings_dir`
    pub artifact_name: String,

    /// Base URL of the script extension service
    pub service_url: String,

    /// Credential cache location
    pub credentials_path: PathBuf,

    /// Editors tried in order after saving; `load` puts `$EDITOR` first
    pub editors: Vec<String>,

    /// Codegen launcher
    pub codegen: CodegenConfig,

    /// Interval between artifact existence checks
    pub poll_interval_ms: u64,

    /// Delay after launching codegen before `start` resolves
    pub settle_delay_ms: u64,

    /// Timeout for the extension request
    pub request_timeout_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("recordings"),
            artifact_name: ".uirec-codegen.js".to_string(),
            service_url: "https://localhost:8443".to_string(),
            credentials_path: crate::default_credentials_path(),
            editors: vec!["nano".to_string(), "vim".to_string(), "vi".to_string()],
            codegen: CodegenConfig::default(),
            poll_interval_ms: 500,
            settle_delay_ms: 1000,
            request_timeout_secs: 120,
        }
    }
}

/// How the codegen tool is launched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Program to execute
    pub program: String,

    /// Arguments placed before the codegen argument contract
    pub base_args: Vec<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            base_args: vec!["playwright".to_string(), "codegen".to_string()],
        }
    }
}

impl RecorderConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    /// Environment overrides (`UIREC_SERVICE_URL`, `EDITOR`) are applied last.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };

        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                config.service_url = url;
            }
        }
        if let Ok(editor) = std::env::var("EDITOR") {
            config.prefer_editor(&editor);
        }

        Ok(config)
    }

    /// Full path of the artifact file
    pub fn artifact_path(&self) -> PathBuf {
        self.recordings_dir.join(&self.artifact_name)
    }

    /// Move `editor` to the front of the editor candidates
    pub fn prefer_editor(&mut self, editor: &str) {
        let editor = editor.trim();
        if editor.is_empty() {
            return;
        }
        self.editors.retain(|e| e != editor);
        self.editors.insert(0, editor.to_string());
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = RecorderConfig::load(&tmp.path().join("absent.toml")).unwrap();

        assert_eq!(config.recordings_dir, PathBuf::from("recordings"));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.codegen.program, "npx");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "recordings_dir = \"out\"\n\n[codegen]\nprogram = \"playwright-cli\"\n",
        )
        .unwrap();

        let config = RecorderConfig::load(&path).unwrap();
        assert_eq!(config.recordings_dir, PathBuf::from("out"));
        assert_eq!(config.codegen.program, "playwright-cli");
        assert_eq!(config.codegen.base_args, vec!["playwright", "codegen"]);
        assert_eq!(config.artifact_path(), PathBuf::from("out/.uirec-codegen.js"));
    }

    #[test]
    fn test_prefer_editor_moves_to_front() {
        let mut config = RecorderConfig::default();
        config.prefer_editor("vim");
        assert_eq!(config.editors, vec!["vim", "nano", "vi"]);

        config.prefer_editor("code --wait");
        assert_eq!(config.editors[0], "code --wait");

        config.prefer_editor("  ");
        assert_eq!(config.editors.len(), 4);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = \"soon\"").unwrap();

        assert!(RecorderConfig::load(&path).is_err());
    }
}
