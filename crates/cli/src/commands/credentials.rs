//! Credentials Command

use anyhow::Result;

use uirec_common::{CredentialStore, RecorderConfig, StdinPrompter};

use crate::output::print_success;

pub async fn execute(config: RecorderConfig) -> Result<()> {
    let store = CredentialStore::new(&config.credentials_path);
    let credentials = store.update(&mut StdinPrompter::new()).await?;

    print_success(&format!("Credentials updated for {}", credentials.email));
    Ok(())
}
