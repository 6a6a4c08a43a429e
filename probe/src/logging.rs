//! Diagnostic logging and transport-noise filtering
//!
//! The transport library reports some harmless conditions (most notably a
//! rejected session DELETE on teardown) as warnings. `OutputFilter` drops
//! those lines while the shared `LoggingState` is in its default quiet mode;
//! flipping the state to verbose lets everything through from the next event on.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use regex::RegexSet;
use tracing::Level;
use tracing_subscriber::{
    filter::filter_fn, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Known-benign transport diagnostics, matched case-insensitively
pub const DEFAULT_SUPPRESS_PATTERNS: &[&str] = &[
    r"(?i)session termination failed",
    r"(?i)fail(ed)? to delete session",
    r"(?i)error in post_writer",
    r"(?i)delete.*session.*\b400\b",
];

// ============================================================================
// LoggingState
// ============================================================================

/// Process-wide verbose/quiet switch.
///
/// Cloned into the main flow, the input listener and the tracing writer.
/// Lock-free: readers always see the latest toggle.
#[derive(Debug, Clone, Default)]
pub struct LoggingState {
    verbose: Arc<AtomicBool>,
}

impl LoggingState {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose: Arc::new(AtomicBool::new(verbose)),
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    /// Flip the mode and return the new value
    pub fn toggle(&self) -> bool {
        !self.verbose.fetch_xor(true, Ordering::Relaxed)
    }
}

// ============================================================================
// OutputFilter
// ============================================================================

/// `MakeWriter` that drops known-benign diagnostics while quiet
#[derive(Debug, Clone)]
pub struct OutputFilter {
    state: LoggingState,
    patterns: Arc<RegexSet>,
}

impl OutputFilter {
    /// Build a filter from regular expressions
    pub fn new<I, S>(state: LoggingState, patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            state,
            patterns: Arc::new(RegexSet::new(patterns)?),
        })
    }

    pub fn state(&self) -> &LoggingState {
        &self.state
    }

    /// Whether a rendered diagnostic should be hidden right now
    pub fn should_suppress(&self, text: &str) -> bool {
        !self.state.is_verbose() && self.patterns.is_match(text)
    }

    /// Wrap an arbitrary sink (stderr in production)
    pub fn writer_to<W: Write>(&self, inner: W) -> FilteredWriter<W> {
        FilteredWriter {
            filter: self.clone(),
            inner,
            buf: Vec::new(),
        }
    }
}

impl<'a> MakeWriter<'a> for OutputFilter {
    type Writer = FilteredWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer_to(io::stderr())
    }
}

/// Per-event writer. The formatted event is collected and then either
/// forwarded or dropped as a whole, so a match anywhere in a multi-line
/// record hides the entire record.
pub struct FilteredWriter<W: Write> {
    filter: OutputFilter,
    inner: W,
    buf: Vec<u8>,
}

impl<W: Write> FilteredWriter<W> {
    fn emit(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let suppress = self
            .filter
            .should_suppress(&String::from_utf8_lossy(&self.buf));
        if !suppress {
            self.inner.write_all(&self.buf)?;
            self.inner.flush()?;
        }
        self.buf.clear();
        Ok(())
    }
}

impl<W: Write> Write for FilteredWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit()
    }
}

impl<W: Write> Drop for FilteredWriter<W> {
    fn drop(&mut self) {
        let _ = self.emit();
    }
}

// ============================================================================
// Subscriber setup
// ============================================================================

fn base_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global tracing subscriber.
///
/// - Base level from `-v` count (default warn)
/// - Verbose mode additionally enables debug events, re-evaluated per event
/// - `LOG_FORMAT=json` switches to structured JSON lines
/// - Output goes to stderr through `filter`
pub fn init_tracing(filter: &OutputFilter, verbosity: u8) -> anyhow::Result<()> {
    let base = base_level(verbosity);
    let state = filter.state().clone();
    let level_filter = filter_fn(move |meta| {
        let ceiling = if state.is_verbose() {
            base.max(Level::DEBUG)
        } else {
            base
        };
        meta.level() <= &ceiling
    });

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(filter.clone())
                    .with_filter(level_filter),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(filter.clone())
                    .with_ansi(false)
                    .with_filter(level_filter),
            )
            .try_init()?;
    }

    Ok(())
}

/// Human-friendly duration for timing diagnostics: `350ms` or `2.41s`
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}
