//! Terminal editor launcher

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

/// How the editing step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Editor exited with status zero
    Clean { editor: String },
    /// Editor exited with a non-zero status or a signal
    Errored { editor: String, code: Option<i32> },
    /// No candidate could be launched
    Unavailable { tried: Vec<String> },
}

impl EditOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, EditOutcome::Clean { .. })
    }
}

/// Open `path` in the first candidate editor that launches.
///
/// Candidates may carry arguments (`"code --wait"`). A candidate that fails
/// to launch falls through to the next one.
pub async fn open_in_editor(path: &Path, candidates: &[String]) -> EditOutcome {
    for candidate in candidates {
        let mut parts = candidate.split_whitespace();
        let Some(program) = parts.next() else {
            continue;
        };

        let spawned = Command::new(program)
            .args(parts)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                debug!("Editor {} failed to launch: {}", candidate, e);
                continue;
            }
        };

        info!("Editing {} with {}", path.display(), candidate);
        return match child.wait().await {
            Ok(status) if status.success() => EditOutcome::Clean {
                editor: candidate.clone(),
            },
            Ok(status) => EditOutcome::Errored {
                editor: candidate.clone(),
                code: status.code(),
            },
            Err(e) => {
                debug!("Waiting on editor {} failed: {}", candidate, e);
                EditOutcome::Errored {
                    editor: candidate.clone(),
                    code: None,
                }
            }
        };
    }

    EditOutcome::Unavailable {
        tried: candidates.to_vec(),
    }
}
