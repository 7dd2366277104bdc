//! Extend Command

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use uirec_common::{CredentialStore, ExtensionClient, RecorderConfig, StdinPrompter};

use crate::output::print_success;

#[derive(Parser)]
pub struct ExtendArgs {
    /// Script to extend in place
    pub path: PathBuf,
}

pub async fn execute(args: ExtendArgs, config: RecorderConfig) -> Result<()> {
    if !args.path.is_file() {
        bail!("File not found: {}", args.path.display());
    }

    let store = CredentialStore::new(&config.credentials_path);
    let client = ExtensionClient::new(&config.service_url, config.request_timeout())?;

    client
        .extend_file(&args.path, &store, &mut StdinPrompter::new())
        .await
        .with_context(|| format!("{} was left unchanged", args.path.display()))?;

    print_success(&format!("Extended {}", args.path.display()));
    Ok(())
}
