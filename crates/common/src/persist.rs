//! Collision-free persistence of recorded scripts

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{Error, Result};

/// Extension given to names entered without one
pub const DEFAULT_EXTENSION: &str = "spec.js";

/// Timestamped name used when none is given
pub fn default_script_name() -> String {
    format!(
        "recording-{}.{}",
        Local::now().format("%Y%m%d-%H%M%S"),
        DEFAULT_EXTENSION
    )
}

/// Normalize a user-supplied file name.
///
/// Only the final path component is kept so scripts always land in the
/// recordings directory. Names without an extension get [`DEFAULT_EXTENSION`].
pub fn normalize_name(name: &str) -> Result<String> {
    let file_name = Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidArgument(format!("not a file name: {:?}", name)))?;

    if Path::new(file_name).extension().is_some() {
        Ok(file_name.to_string())
    } else {
        Ok(format!("{}.{}", file_name, DEFAULT_EXTENSION))
    }
}

/// First path in `dir` named `name`, `stem-1.ext`, `stem-2.ext`, ... that
/// does not exist yet.
///
/// The stem is everything before the first dot so `login.spec.js` becomes
/// `login-1.spec.js`.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.find('.') {
        Some(0) | None => (name, ""),
        Some(idx) => (&name[..idx], &name[idx..]),
    };

    (1u32..)
        .map(|n| dir.join(format!("{}-{}{}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Write a script under a name that does not overwrite anything
pub fn save_script(dir: &Path, name: &str, code: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = unique_path(dir, &normalize_name(name)?);
    std::fs::write(&path, code)?;
    info!("Saved script to {}", path.display());
    Ok(path)
}
