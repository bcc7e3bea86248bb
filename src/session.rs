//! The input loop: raw bytes in, desktop commands out.
//!
//! Events are handled one at a time, in order. Decode errors and injection
//! failures end the session; unknown keys and sequences are only logged.

use crate::command::DesktopCommand;
use crate::decoder::{RawDecoder, ESC_TIMEOUT};
use crate::event::InputEvent;
use crate::geometry::ViewportGeometry;
use crate::inject::Injector;
use crate::translate::Translator;
use crate::zoom::ZoomInput;
use anyhow::{bail, Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use std::io::Read;
use tokio::sync::{mpsc, watch};

const COMMAND_HELP: &str = "termzoom: commands: '.' quit, '+'/'-' zoom, '^' literal Ctrl-^";

/// What the loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<I> {
    translator: Translator,
    zoom: ZoomInput,
    injector: I,
    command_pending: bool,
    notice: watch::Sender<String>,
}

impl<I: Injector> Session<I> {
    pub fn new(
        geometry: ViewportGeometry,
        zoom: ZoomInput,
        injector: I,
        notice: watch::Sender<String>,
    ) -> Self {
        Self {
            translator: Translator::new(geometry),
            zoom,
            injector,
            command_pending: false,
            notice,
        }
    }

    #[cfg(test)]
    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Recompute the preview geometry for a new terminal size.
    pub fn resize(&mut self, width: u16, height: u16) {
        let (desktop_w, desktop_h) = self.zoom.desktop_size();
        self.translator
            .set_geometry(ViewportGeometry::fit(width, height, desktop_w, desktop_h));
    }

    /// Run until input ends, the user quits, or something fatal happens.
    pub async fn run(&mut self, mut input: mpsc::Receiver<Vec<u8>>) -> Result<()> {
        let mut decoder = RawDecoder::new();
        let geometry = self.translator.geometry();
        let mut resize =
            ResizeWatcher::new((geometry.terminal_width, geometry.terminal_height))?;

        loop {
            let escape_pending = decoder.has_pending_escape();
            tokio::select! {
                chunk = input.recv() => {
                    let Some(chunk) = chunk else {
                        log::info!("input closed");
                        return Ok(());
                    };
                    log::trace!("raw input: \"{}\"", chunk.escape_ascii());
                    for event in decoder.feed(&chunk) {
                        if self.handle_event(event).await? == Flow::Quit {
                            return Ok(());
                        }
                    }
                    if !decoder.pending().is_empty() {
                        log::trace!("partial input retained: {:02x?}", decoder.pending());
                    }
                }
                _ = tokio::time::sleep(ESC_TIMEOUT), if escape_pending => {
                    if let Some(event) = decoder.flush_escape() {
                        if self.handle_event(event).await? == Flow::Quit {
                            return Ok(());
                        }
                    }
                }
                size = resize.changed() => {
                    let (width, height) = size?;
                    self.resize(width, height);
                }
            }
        }
    }

    /// Classify one event and inject whatever it translates to.
    pub async fn handle_event(&mut self, event: InputEvent) -> Result<Flow> {
        log::debug!("{}", event);
        match &event {
            InputEvent::Error(msg) => bail!("input stream out of sync: {}", msg),
            InputEvent::None => return Ok(Flow::Continue),
            InputEvent::Key { code, modifiers } => {
                if let Some(flow) = self.command_key(*code, *modifiers).await? {
                    return Ok(flow);
                }
            }
            InputEvent::Pointer(_) => {}
        }

        for command in self.translator.translate(&event, &self.zoom) {
            self.dispatch(&command).await?;
        }
        Ok(Flow::Continue)
    }

    /// Ctrl-^ command mode. `Some` when the key was consumed locally.
    async fn command_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<Option<Flow>> {
        let is_command_key =
            modifiers.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('^' | '6'));

        if !self.command_pending {
            if is_command_key {
                self.command_pending = true;
                self.set_notice(COMMAND_HELP);
                return Ok(Some(Flow::Continue));
            }
            return Ok(None);
        }

        self.command_pending = false;
        self.set_notice("");
        let command = match code {
            _ if is_command_key => DesktopCommand::SendKey("ctrl+asciicircum".into()),
            KeyCode::Char('^') => DesktopCommand::SendKey("ctrl+asciicircum".into()),
            KeyCode::Char('.') => {
                log::info!("quit requested");
                return Ok(Some(Flow::Quit));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => DesktopCommand::AdjustMagnification(1),
            KeyCode::Char('-') => DesktopCommand::AdjustMagnification(-1),
            _ => return Ok(None),
        };
        self.dispatch(&command).await?;
        Ok(Some(Flow::Continue))
    }

    async fn dispatch(&mut self, command: &DesktopCommand) -> Result<()> {
        if let DesktopCommand::AdjustMagnification(delta) = command {
            let mag = self.zoom.adjust_magnification(*delta);
            log::info!("magnification now {}", mag);
        }
        self.injector.inject(command).await
    }

    fn set_notice(&self, text: &str) {
        self.notice.send_replace(text.to_string());
    }
}

/// Spawn a thread that forwards raw stdin chunks. The channel closes on EOF
/// or a read error.
pub fn spawn_stdin_reader() -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin().lock();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("reading stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Reports terminal size changes: SIGWINCH on Unix, polling elsewhere.
struct ResizeWatcher {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
    #[cfg(not(unix))]
    ticker: tokio::time::Interval,
    last: (u16, u16),
}

impl ResizeWatcher {
    fn new(initial: (u16, u16)) -> Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            signal: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::window_change())
                .context("Failed to listen for terminal resizes")?,
            #[cfg(not(unix))]
            ticker: tokio::time::interval(std::time::Duration::from_millis(500)),
            last: initial,
        })
    }

    #[cfg(unix)]
    async fn wait(&mut self) {
        if self.signal.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    async fn wait(&mut self) {
        self.ticker.tick().await;
    }

    async fn changed(&mut self) -> Result<(u16, u16)> {
        loop {
            self.wait().await;
            let size = crossterm::terminal::size().context("Failed to get terminal size")?;
            if size != self.last {
                self.last = size;
                return Ok(size);
            }
        }
    }
}
