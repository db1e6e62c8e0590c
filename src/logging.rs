//! Diagnostics go through `tracing`; this installs the stderr subscriber.
//!
//! Log lines and the download progress bar share stderr. While a bar is registered in the
//! [`ProgressSlot`], each log line is written with the bar cleared and redrawn afterwards.

use anyhow::Context as _;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Handle to the progress bar currently drawn on stderr, if any.
#[derive(Clone, Default)]
pub struct ProgressSlot(Arc<Mutex<Option<ProgressBar>>>);

impl ProgressSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bar log lines must step around; `None` once it is finished.
    pub fn set(&self, bar: Option<ProgressBar>) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = bar;
        }
    }

    fn current(&self) -> Option<ProgressBar> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }

    /// Run `f` with the bar hidden, or directly when no bar is active.
    fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.current() {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }
}

/// Writer handed to the fmt layer for each event.
pub struct SuspendingWriter<W> {
    slot: ProgressSlot,
    inner: W,
}

impl<W: Write> Write for SuspendingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        self.slot.suspend(|| inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let inner = &mut self.inner;
        self.slot.suspend(|| inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> MakeWriter<'a> for ProgressSlot {
    type Writer = SuspendingWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendingWriter {
            slot: self.clone(),
            inner: io::stderr(),
        }
    }
}

/// `RUST_LOG` wins when set; otherwise `default_level` (e.g. "info").
pub fn init(default_level: &str, progress: &ProgressSlot) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(progress.clone())
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
