//! Keyboard input
//!
//! A dedicated reader thread owns stdin for the whole run. While the main
//! flow is waiting for an answer, lines go to it; while it is busy (polling,
//! waiting out the grace period, connecting, running a tool) the only thing
//! a line can do is toggle transport logging with `v`.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::logging::LoggingState;
use crate::output::{OutputEvent, OutputWriter};

/// Line typed to toggle transport logging
pub const TOGGLE_COMMAND: &str = "v";

/// Where the interactive loop gets its answers
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator; `None` once input is closed
    async fn next_line(&mut self) -> Option<String>;
}

/// Announce the new logging mode
pub fn report_toggle(output: &dyn OutputWriter, verbose: bool) {
    let mode = if verbose { "shown" } else { "hidden" };
    output.write(OutputEvent::System(format!("[transport logs {}]", mode)));
}

/// stdin-backed line source with a background toggle listener
pub struct InputListener {
    lines: mpsc::UnboundedReceiver<String>,
    prompting: Arc<AtomicBool>,
}

impl InputListener {
    /// Start the reader thread on stdin.
    ///
    /// Runs on its own OS thread, outside the runtime; a blocking stdin read
    /// cannot be cancelled.
    pub fn spawn(state: LoggingState, output: Arc<dyn OutputWriter>) -> Self {
        Self::with_reader(BufReader::new(std::io::stdin()), state, output)
    }

    /// Start the reader thread on any line reader
    pub fn with_reader<R>(reader: R, state: LoggingState, output: Arc<dyn OutputWriter>) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let prompting = Arc::new(AtomicBool::new(false));
        let router = Router {
            prompting: prompting.clone(),
            lines: tx,
            state,
            output,
        };

        let spawned = std::thread::Builder::new()
            .name("stdin-listener".into())
            .spawn(move || {
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    if router.route(line) == Routed::Closed {
                        break;
                    }
                }
                tracing::debug!("stdin closed");
            });
        if let Err(e) = spawned {
            tracing::warn!("could not start input listener: {}", e);
        }

        Self {
            lines: rx,
            prompting,
        }
    }
}

/// What happened to one line read by the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routed {
    Delivered,
    Toggled,
    Ignored,
    /// Nobody is listening for lines any more
    Closed,
}

/// Sends a line to the waiting prompt, or treats it as a toggle while busy
struct Router {
    prompting: Arc<AtomicBool>,
    lines: mpsc::UnboundedSender<String>,
    state: LoggingState,
    output: Arc<dyn OutputWriter>,
}

impl Router {
    fn route(&self, line: String) -> Routed {
        if self.prompting.load(Ordering::SeqCst) {
            return match self.lines.send(line) {
                Ok(()) => Routed::Delivered,
                Err(_) => Routed::Closed,
            };
        }
        if line.trim().eq_ignore_ascii_case(TOGGLE_COMMAND) {
            report_toggle(self.output.as_ref(), self.state.toggle());
            Routed::Toggled
        } else {
            tracing::debug!("ignoring input while busy");
            Routed::Ignored
        }
    }
}

#[async_trait]
impl LineSource for InputListener {
    async fn next_line(&mut self) -> Option<String> {
        self.prompting.store(true, Ordering::SeqCst);
        let line = self.lines.recv().await;
        self.prompting.store(false, Ordering::SeqCst);
        line
    }
}

/// Pre-recorded answers, for tests and scripted runs
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    consumed: usize,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            consumed: 0,
        }
    }

    /// Lines handed out so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for ScriptedInput {
    async fn next_line(&mut self) -> Option<String> {
        let line = self.lines.pop_front()?;
        self.consumed += 1;
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::{HealthEndpoint, HealthProbe, ProbeOutcome};
    use crate::output::CaptureOutput;
    use std::io::{self, Read};
    use std::sync::mpsc as std_mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Blocking reader fed one line at a time, like a terminal
    struct FeedReader {
        lines: std_mpsc::Receiver<String>,
        pending: Vec<u8>,
        pos: usize,
    }

    impl Read for FeedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.pending.len() {
                match self.lines.recv() {
                    Ok(line) => {
                        self.pending = line.into_bytes();
                        self.pos = 0;
                    }
                    Err(_) => return Ok(0),
                }
            }
            let n = (self.pending.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn listen(
        state: &LoggingState,
        output: &CaptureOutput,
    ) -> (InputListener, std_mpsc::Sender<String>) {
        let (feed, lines) = std_mpsc::channel();
        let reader = BufReader::new(FeedReader {
            lines,
            pending: Vec::new(),
            pos: 0,
        });
        let listener = InputListener::with_reader(reader, state.clone(), Arc::new(output.clone()));
        (listener, feed)
    }

    fn shown(output: &CaptureOutput) -> usize {
        output.count(|e| matches!(e, OutputEvent::System(s) if s == "[transport logs shown]"))
    }

    /// Wait on the reader thread, in real time
    fn wait_for(condition: impl Fn() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("listener thread did not get there in time");
    }

    #[tokio::test]
    async fn test_toggle_while_busy() {
        let state = LoggingState::new(false);
        let output = CaptureOutput::new();
        let (_listener, feed) = listen(&state, &output);

        feed.send("v\n".into()).unwrap();
        wait_for(|| state.is_verbose());
        wait_for(|| shown(&output) == 1);

        feed.send(" V \n".into()).unwrap();
        wait_for(|| !state.is_verbose());
    }

    #[tokio::test]
    async fn test_lines_go_to_pending_prompt() {
        let state = LoggingState::new(false);
        let output = CaptureOutput::new();
        let (mut listener, feed) = listen(&state, &output);
        let prompting = listener.prompting.clone();

        let pending = tokio::spawn(async move {
            let line = listener.next_line().await;
            (listener, line)
        });
        while !prompting.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        // At a prompt, `v` is an answer like any other
        feed.send("v\n".into()).unwrap();

        let (listener, line) = pending.await.unwrap();
        assert_eq!(line.as_deref(), Some("v"));
        assert!(!state.is_verbose());
        assert!(!listener.prompting.load(Ordering::SeqCst));
        assert_eq!(shown(&output), 0);
    }

    #[tokio::test]
    async fn test_other_lines_dropped_while_busy() {
        let state = LoggingState::new(false);
        let output = CaptureOutput::new();
        let (mut listener, feed) = listen(&state, &output);

        feed.send("hello\n".into()).unwrap();
        feed.send("v\n".into()).unwrap();
        wait_for(|| state.is_verbose());

        let prompting = listener.prompting.clone();
        let pending = tokio::spawn(async move { listener.next_line().await });
        while !prompting.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        feed.send("2\n".into()).unwrap();
        assert_eq!(pending.await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_closed_reader_ends_input() {
        let state = LoggingState::new(false);
        let output = CaptureOutput::new();
        let (mut listener, feed) = listen(&state, &output);

        drop(feed);
        assert_eq!(listener.next_line().await, None);
    }

    /// Never ready; types `v` on the third poll and waits for the listener to act
    struct TogglingHealth {
        feed: Mutex<std_mpsc::Sender<String>>,
        state: LoggingState,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    #[async_trait]
    impl HealthEndpoint for TogglingHealth {
        async fn check(&self, _url: &str) -> Result<u16, String> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(tokio::time::Instant::now());
                calls.len()
            };
            if call == 3 {
                self.feed.lock().unwrap().send("v\n".into()).unwrap();
                wait_for(|| self.state.is_verbose());
            }
            Ok(503)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_mid_poll_keeps_attempts_and_timing() {
        let state = LoggingState::new(false);
        let output = CaptureOutput::new();
        let (_listener, feed) = listen(&state, &output);
        let health = Arc::new(TogglingHealth {
            feed: Mutex::new(feed),
            state: state.clone(),
            calls: Mutex::new(Vec::new()),
        });
        let probe = HealthProbe::new(health.clone(), Arc::new(output.clone()));

        let started = tokio::time::Instant::now();
        let outcome = probe
            .probe("http://h/health", 6, Duration::from_secs(5))
            .await;

        assert_eq!(outcome, ProbeOutcome::Unready { attempts: 6 });
        let offsets: Vec<u64> = health
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.duration_since(started).as_secs())
            .collect();
        assert_eq!(offsets, vec![0, 5, 10, 15, 20, 25]);
        assert!(state.is_verbose());
        assert_eq!(shown(&output), 1);
    }

    #[tokio::test]
    async fn test_scripted_input() {
        let mut input = ScriptedInput::new(["1", "r"]);
        assert_eq!(input.next_line().await.as_deref(), Some("1"));
        assert_eq!(input.next_line().await.as_deref(), Some("r"));
        assert_eq!(input.next_line().await, None);
        assert_eq!(input.consumed(), 2);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_report_toggle() {
        let output = CaptureOutput::new();
        report_toggle(&output, true);
        report_toggle(&output, false);
        assert_eq!(
            output.count(|e| matches!(e, OutputEvent::System(s) if s.contains("shown"))),
            1
        );
        assert_eq!(
            output.count(|e| matches!(e, OutputEvent::System(s) if s.contains("hidden"))),
            1
        );
    }
}
