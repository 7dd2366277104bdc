//! Codegen subprocess

use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::str::FromStr;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use uirec_common::config::CodegenConfig;
use uirec_common::{Error, Result};

/// Browser viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

impl FromStr for Viewport {
    type Err = Error;

    /// Accepts `WIDTHxHEIGHT` or `WIDTH,HEIGHT`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("invalid viewport {:?}", s));

        let (w, h) = s
            .split_once(['x', 'X', ','])
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(Self { width, height })
    }
}

/// What to record
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Page to open first
    pub url: Option<String>,

    /// Device to emulate
    pub device: Option<String>,

    pub viewport: Viewport,

    /// Language the codegen tool emits
    pub target: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            url: None,
            device: None,
            viewport: Viewport::default(),
            target: "javascript".to_string(),
        }
    }
}

impl CodegenOptions {
    /// Argument contract passed after the configured base arguments
    pub fn args(&self, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
            "--target".to_string(),
            self.target.clone(),
            "--viewport-size".to_string(),
            self.viewport.to_string(),
        ];

        if let Some(device) = &self.device {
            args.push("--device".to_string());
            args.push(device.clone());
        }

        if let Some(url) = &self.url {
            args.push(url.clone());
        }

        args
    }
}

/// Running codegen process
pub struct CodegenProcess {
    child: Child,
    program: String,
}

impl CodegenProcess {
    /// Launch codegen writing to `output`, sharing this terminal
    pub fn spawn(config: &CodegenConfig, options: &CodegenOptions, output: &Path) -> Result<Self> {
        let args = options.args(output);
        debug!("Launching {} {:?} {:?}", config.program, config.base_args, args);

        let child = Command::new(&config.program)
            .args(&config.base_args)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Launch {
                program: config.program.clone(),
                reason: e.to_string(),
            })?;

        info!("{} started (pid: {:?})", config.program, child.id());

        Ok(Self {
            child,
            program: config.program.clone(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Wait for the process to exit
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Force the process down without waiting
    pub fn kill(&mut self) {
        match self.child.start_kill() {
            Ok(()) => info!("Killed {} (pid: {:?})", self.program, self.child.id()),
            Err(e) => debug!("Codegen already gone: {}", e),
        }
    }
}
