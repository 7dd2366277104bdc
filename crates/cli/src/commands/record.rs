//! Record Commands

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser};
use tracing::debug;

use uirec_common::persist;
use uirec_common::{
    CredentialStore, ExtensionClient, HeuristicWaitAnalyzer, RecorderConfig, ScriptTransformer,
    StdinPrompter,
};
use uirec_session::{
    CodegenOptions, EditOutcome, ExtendOutcome, Extension, FinishOptions, FinishedRecording,
    Session, Viewport,
};

use crate::output::{print_error, print_info, print_script, print_success, print_warning};

/// Page opened by the demo command
pub const DEMO_URL: &str = "https://demo.playwright.dev/todomvc";

#[derive(Parser)]
pub struct RecordArgs {
    /// Page to open when recording starts
    pub url: Option<String>,

    #[command(flatten)]
    pub options: RecordOptions,
}

#[derive(Parser)]
pub struct DemoArgs {
    #[command(flatten)]
    pub options: RecordOptions,
}

#[derive(Args, Debug, Clone)]
pub struct RecordOptions {
    /// Device to emulate, e.g. "iPhone 13"
    #[arg(short, long)]
    pub device: Option<String>,

    /// Viewport size as WIDTHxHEIGHT or WIDTH,HEIGHT
    #[arg(long, default_value = "1280,720")]
    pub viewport: Viewport,

    /// Language the codegen tool emits
    #[arg(short, long, default_value = "javascript")]
    pub target: String,

    /// File name to save the recording under
    #[arg(short, long)]
    pub output: Option<String>,

    /// Do not add wait statements to recorded code
    #[arg(long)]
    pub no_waits: bool,

    /// Skip the extension step after editing
    #[arg(long)]
    pub no_extend: bool,
}

enum RecordEnd {
    Exited(std::process::ExitStatus),
    Interrupted,
}

pub async fn execute(url: Option<String>, options: RecordOptions, config: RecorderConfig) -> Result<()> {
    let transformer = ScriptTransformer::new(Arc::new(HeuristicWaitAnalyzer::new()), !options.no_waits);
    let mut session = Session::new(config.clone(), transformer);

    let mut updates = session.on_update();
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            debug!("Captured {} line(s)", update.code.lines().count());
            for suggestion in &update.suggestions {
                print_info(suggestion);
            }
        }
    });

    let codegen = CodegenOptions {
        url,
        device: options.device.clone(),
        viewport: options.viewport,
        target: options.target.clone(),
    };

    print_info("Launching codegen...");
    session.start(&codegen).await?;
    print_info("Recording. Close the browser to finish, Ctrl-C to abort.");

    let end = tokio::select! {
        status = session.wait_for_exit() => RecordEnd::Exited(status?),
        _ = tokio::signal::ctrl_c() => RecordEnd::Interrupted,
    };

    let status = match end {
        RecordEnd::Exited(status) => status,
        RecordEnd::Interrupted => {
            let code = session.stop();
            let _ = printer.await;
            return flush_interrupted(&config, options.output.as_deref(), &code);
        }
    };
    // Exit closes the update channel; let queued suggestions print first
    let _ = printer.await;

    if !status.success() {
        print_warning(&format!("Codegen exited with {}", status));
    }

    let store = CredentialStore::new(&config.credentials_path);
    let client = ExtensionClient::new(&config.service_url, config.request_timeout())?;
    let extension = (!options.no_extend).then_some(Extension {
        client: &client,
        store: &store,
    });

    let mut prompter = StdinPrompter::new();
    let finished = tokio::select! {
        finished = session.finish(
            &mut prompter,
            FinishOptions {
                default_name: options.output.clone(),
                extension,
            },
        ) => finished?,
        _ = tokio::signal::ctrl_c() => {
            print_warning("Interrupted");
            return Ok(());
        }
    };

    match finished {
        Some(finished) => report(&finished),
        None => print_warning("Nothing was recorded"),
    }
    Ok(())
}

/// Save or print whatever was captured before the interrupt, without prompting
fn flush_interrupted(config: &RecorderConfig, output: Option<&str>, code: &str) -> Result<()> {
    if code.trim().is_empty() {
        print_warning("Interrupted before anything was recorded");
        return Ok(());
    }

    match output {
        Some(name) => {
            let path = persist::save_script(&config.recordings_dir, name, code)?;
            print_success(&format!("Interrupted, recording saved to {}", path.display()));
        }
        None => {
            print_warning("Interrupted, recording not saved:");
            print_script(code);
        }
    }
    Ok(())
}

fn report(finished: &FinishedRecording) {
    print_success(&format!("Saved {}", finished.path.display()));

    match &finished.edit {
        EditOutcome::Clean { .. } => {}
        EditOutcome::Errored { editor, code } => print_warning(&format!(
            "{} exited with {}; skipping extension",
            editor,
            code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string())
        )),
        EditOutcome::Unavailable { tried } => print_warning(&format!(
            "No editor could be launched (tried: {})",
            tried.join(", ")
        )),
    }

    match &finished.extension {
        ExtendOutcome::Skipped => {}
        ExtendOutcome::Extended => {
            print_success(&format!("Extended {}", finished.path.display()))
        }
        ExtendOutcome::Failed(e) => print_error(&format!(
            "Extension failed, {} was left unchanged: {}",
            finished.path.display(),
            e
        )),
    }
}
