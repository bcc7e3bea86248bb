//! termzoom — drive a desktop magnifier from a terminal.
//!
//! Usage:
//!   termzoom [OPTIONS]
//!
//! This program:
//! 1. Puts the terminal in raw mode with mouse reporting
//! 2. Decodes terminal mouse/keyboard input as it arrives
//! 3. Maps preview cells to desktop pixels under the current zoom and pan
//! 4. Replays the result as desktop input through `xdotool`
//! 5. Runs the compositor loop that keeps the magnified region up to date

mod command;
mod decoder;
mod event;
mod geometry;
mod inject;
mod logfile;
mod magnifier;
mod pan;
mod renderer;
mod session;
mod translate;
mod zoom;

use anyhow::{Context, Result};
use clap::Parser;
use geometry::ViewportGeometry;
use magnifier::{FollowCompositor, Magnifier};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Drive a desktop magnifier from a terminal: mouse and keyboard events are
/// replayed as desktop input.
#[derive(Parser, Debug)]
#[command(name = "termzoom", version, about)]
struct Cli {
    /// Desktop width in pixels.
    #[arg(long, default_value_t = 1600, value_parser = clap::value_parser!(u32).range(1..))]
    desktop_width: u32,

    /// Desktop height in pixels.
    #[arg(long, default_value_t = 1200, value_parser = clap::value_parser!(u32).range(1..))]
    desktop_height: u32,

    /// Diagnostic log, truncated at start.
    #[arg(long, default_value = "./input.log")]
    log_file: PathBuf,

    /// Input injection program (xdotool-compatible arguments).
    #[arg(long, default_value = "xdotool")]
    injector: String,

    /// Compositor ticks per second.
    #[arg(long, default_value_t = magnifier::DEFAULT_FPS, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// Log commands without running the injector.
    #[arg(long)]
    dry_run: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet { "warn" } else { "debug" };
    logfile::init(&cli.log_file, log_level)?;
    log::info!("Starting...");

    run(cli).await
}

/// Start the compositor, run the input loop, then shut down in order: stop
/// the compositor, wait for it, restore the terminal.
async fn run(cli: Cli) -> Result<()> {
    let (zoom_input, zoom_render) = zoom::ZoomState::split(cli.desktop_width, cli.desktop_height);

    let (term_width, term_height) =
        crossterm::terminal::size().context("Failed to get terminal size")?;
    let geometry =
        ViewportGeometry::fit(term_width, term_height, cli.desktop_width, cli.desktop_height);

    renderer::Renderer::init().context("Failed to set up terminal")?;
    // Guard to ensure cleanup on exit
    let _cleanup = CleanupGuard;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (notice_tx, notice_rx) = watch::channel(String::new());
    let render_task = Magnifier::new(FollowCompositor, zoom_render, cli.fps)
        .with_status_bar(renderer::StatusBar::new())
        .spawn(shutdown_rx, notice_rx);

    let injector = inject::XdotoolInjector::new(cli.injector).with_dry_run(cli.dry_run);
    let mut session = session::Session::new(geometry, zoom_input, injector, notice_tx);
    supervise(
        session.run(session::spawn_stdin_reader()),
        render_task,
        shutdown_tx,
    )
    .await
}

/// Run the input loop alongside the render task. Whichever ends first ends
/// both; the render task is always awaited before returning.
async fn supervise<F>(
    input: F,
    mut render_task: JoinHandle<Result<()>>,
    shutdown: watch::Sender<bool>,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let (result, rendered) = tokio::select! {
        result = input => (result, None),
        rendered = &mut render_task => (Ok(()), Some(rendered)),
    };
    match &result {
        Ok(()) => log::info!("Exiting"),
        Err(e) => log::error!("Exiting: {:#}", e),
    }

    let _ = shutdown.send(true);
    let rendered = match rendered {
        Some(rendered) => rendered,
        None => render_task.await,
    };
    let rendered = rendered
        .context("Render loop panicked")
        .and_then(|r| r.context("Render loop failed"));
    if let Err(e) = &rendered {
        log::error!("{:#}", e);
    }
    result.and(rendered)
}

/// Guard that ensures terminal cleanup on drop (normal exit or panic).
struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = renderer::Renderer::cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_until_shutdown(mut shutdown: watch::Receiver<bool>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            Ok(())
        })
    }

    async fn input_ends() -> Result<()> {
        Ok(())
    }

    async fn input_fails() -> Result<()> {
        anyhow::bail!("injector failed")
    }

    async fn render_fails() -> Result<()> {
        anyhow::bail!("status bar write failed")
    }

    async fn render_panics() -> Result<()> {
        panic!("compositor panicked")
    }

    #[tokio::test]
    async fn test_supervise_stops_render_when_input_ends() {
        let (tx, rx) = watch::channel(false);
        let render = render_until_shutdown(rx);
        supervise(input_ends(), render, tx).await.unwrap();
    }

    #[tokio::test]
    async fn test_supervise_reports_input_error_after_render_stops() {
        let (tx, rx) = watch::channel(false);
        let render = render_until_shutdown(rx);
        let err = supervise(input_fails(), render, tx)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("injector failed"));
    }

    #[tokio::test]
    async fn test_supervise_ends_input_when_render_fails() {
        let (tx, _rx) = watch::channel(false);
        let render = tokio::spawn(render_fails());
        let err = supervise(std::future::pending(), render, tx)
            .await
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Render loop failed"));
        assert!(msg.contains("status bar write failed"));
    }

    #[tokio::test]
    async fn test_supervise_reports_render_panic() {
        let (tx, _rx) = watch::channel(false);
        let render = tokio::spawn(render_panics());
        let err = supervise(std::future::pending(), render, tx)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Render loop panicked"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["termzoom"]);
        assert_eq!((cli.desktop_width, cli.desktop_height), (1600, 1200));
        assert_eq!(cli.log_file, PathBuf::from("./input.log"));
        assert_eq!(cli.injector, "xdotool");
        assert_eq!(cli.fps, 25);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_rejects_zero_desktop() {
        assert!(Cli::try_parse_from(["termzoom", "--desktop-width", "0"]).is_err());
        assert!(Cli::try_parse_from(["termzoom", "--fps", "0"]).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "termzoom",
            "--desktop-width",
            "1920",
            "--desktop-height",
            "1080",
            "--injector",
            "/usr/local/bin/xdotool",
            "--dry-run",
            "-q",
        ]);
        assert_eq!((cli.desktop_width, cli.desktop_height), (1920, 1080));
        assert_eq!(cli.injector, "/usr/local/bin/xdotool");
        assert!(cli.dry_run && cli.quiet);
    }
}
