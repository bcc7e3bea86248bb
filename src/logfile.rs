//! Diagnostic log file.
//!
//! The terminal is busy showing the preview, so `env_logger` writes to a file
//! instead of stderr. The file is truncated at startup. A failed write ends
//! the process: the log is the only record of what was injected.

use crate::renderer::Renderer;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Open `path` for writing, truncating whatever was there.
pub fn open_truncated(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to truncate log file {}", path.display()))
}

/// Install the global logger writing to `path`. `RUST_LOG` overrides
/// `default_filter`.
pub fn init(path: &Path, default_filter: &str) -> Result<()> {
    let file = open_truncated(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(FailFast::new(file, path))))
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}

/// Writer that terminates the process on the first I/O error.
pub struct FailFast<W> {
    inner: W,
    path: PathBuf,
}

impl<W: Write> FailFast<W> {
    pub fn new(inner: W, path: &Path) -> Self {
        Self {
            inner,
            path: path.to_path_buf(),
        }
    }

    fn fail(&self, err: io::Error) -> ! {
        let _ = Renderer::cleanup();
        eprintln!("termzoom: writing log file {}: {}", self.path.display(), err);
        std::process::exit(1);
    }
}

impl<W: Write> Write for FailFast<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.write(buf) {
            Ok(n) => Ok(n),
            Err(e) => self.fail(e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.flush() {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }
}
