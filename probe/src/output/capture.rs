//! In-memory output for tests and embedding

use std::sync::{Arc, Mutex, MutexGuard};

use super::{OutputEvent, OutputWriter, StepEvent};

/// Records every event; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct CaptureOutput {
    events: Arc<Mutex<Vec<OutputEvent>>>,
}

impl CaptureOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OutputEvent>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.lock().clone()
    }

    /// Only the connection step events, in order
    pub fn steps(&self) -> Vec<StepEvent> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                OutputEvent::Step(step) => Some(step.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&OutputEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(e)).count()
    }
}

impl OutputWriter for CaptureOutput {
    fn write(&self, event: OutputEvent) {
        self.lock().push(event);
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Phase, StepStatus};

    #[test]
    fn test_capture_shares_buffer() {
        let output = CaptureOutput::new();
        let clone = output.clone();

        clone.write(OutputEvent::Text("Hello".to_string()));
        clone.write(OutputEvent::Step(StepEvent::new(Phase::Wake, StepStatus::Skipped)));

        assert_eq!(output.events().len(), 2);
        assert_eq!(output.steps().len(), 1);
        assert_eq!(
            output.count(|e| matches!(e, OutputEvent::Text(s) if s == "Hello")),
            1
        );
    }
}
