//! Desktop input injection.
//!
//! The real injector runs one `xdotool`-compatible process per command. Any
//! spawn failure or non-zero exit is an error: once a command may have been
//! lost the desktop's button state can no longer be trusted.

use crate::command::{DesktopCommand, NOOP};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

#[async_trait]
pub trait Injector: Send {
    async fn inject(&mut self, command: &DesktopCommand) -> Result<()>;
}

/// Spawns `<program> <args...>` for every command.
#[derive(Debug, Clone)]
pub struct XdotoolInjector {
    program: String,
    dry_run: bool,
}

impl XdotoolInjector {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            dry_run: false,
        }
    }

    /// Log every command but never spawn anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    async fn run(&self, args: &[String]) -> Result<()> {
        log::info!("{}", args.join(" "));
        if self.dry_run || args.first().map(String::as_str) == Some(NOOP) {
            return Ok(());
        }
        let status = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("Failed to run {} {}", self.program, args.join(" ")))?;
        if !status.success() {
            bail!("{} {} exited with {}", self.program, args.join(" "), status);
        }
        Ok(())
    }
}

#[async_trait]
impl Injector for XdotoolInjector {
    async fn inject(&mut self, command: &DesktopCommand) -> Result<()> {
        self.run(&command.argv()).await
    }
}

/// Keeps every injected command in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingInjector {
    pub commands: Vec<DesktopCommand>,
}

#[cfg(test)]
#[async_trait]
impl Injector for RecordingInjector {
    async fn inject(&mut self, command: &DesktopCommand) -> Result<()> {
        self.commands.push(command.clone());
        Ok(())
    }
}
