//! Acknowledgement tracking for in-flight messages.
//!
//! Every message handed out by a reader carries a one-shot [`MessageAck`].
//! The shared [`AckTracker`] counts outstanding acks, latches the first
//! failure, and fires the reader's terminal callback exactly once: either
//! when end-of-input has been observed and the last ack resolves, or
//! immediately when the reader is closed before its input is exhausted.

use std::sync::{Arc, Mutex};

use crate::error::CodecError;

/// Callback invoked exactly once when a reader's lifecycle completes.
///
/// `None` means end-of-input was reached and every message was acked
/// positively; otherwise the argument is the first failure observed.
pub type TerminalFn = Box<dyn FnOnce(Option<CodecError>) + Send>;

/// Terminal result of a reader lifecycle, as seen by the upstream producer.
#[derive(Debug)]
pub enum TerminalOutcome {
    /// Every message was acknowledged positively.
    Success,
    /// The reader was closed before its input was exhausted.
    ShuttingDown,
    /// At least one message was rejected; holds the first error observed.
    Failed(CodecError),
}

impl From<Option<CodecError>> for TerminalOutcome {
    fn from(err: Option<CodecError>) -> Self {
        match err {
            None => TerminalOutcome::Success,
            Some(CodecError::ServiceShuttingDown) => TerminalOutcome::ShuttingDown,
            Some(err) => TerminalOutcome::Failed(err),
        }
    }
}

struct TrackerState {
    outstanding: usize,
    end_seen: bool,
    shut_down: bool,
    first_err: Option<CodecError>,
    terminal: Option<TerminalFn>,
}

/// Coordination point between a reader and its outstanding acks.
///
/// The tracker is the sole synchronization domain for acknowledgements:
/// acks may resolve from any thread, in any order, before or after the
/// reader is closed. The terminal callback runs outside the internal lock.
pub struct AckTracker {
    state: Mutex<TrackerState>,
}

impl AckTracker {
    /// Create a tracker that will deliver the terminal signal to `terminal`.
    pub fn new(terminal: TerminalFn) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TrackerState {
                outstanding: 0,
                end_seen: false,
                shut_down: false,
                first_err: None,
                terminal: Some(terminal),
            }),
        })
    }

    /// Register one outstanding message, returning its ack handle.
    pub fn register(self: &Arc<Self>) -> MessageAck {
        let mut state = self.state.lock().expect("ack tracker poisoned");
        state.outstanding += 1;
        drop(state);
        MessageAck {
            tracker: Arc::clone(self),
        }
    }

    /// Record that the codec observed end-of-input. Called exactly once
    /// per reader; if no acks are outstanding the terminal fires now.
    pub fn mark_end(&self) {
        let fire = {
            let mut state = self.state.lock().expect("ack tracker poisoned");
            if state.end_seen {
                None
            } else {
                state.end_seen = true;
                if state.outstanding == 0 {
                    let err = state.first_err.take();
                    state.terminal.take().map(|terminal| (terminal, err))
                } else {
                    None
                }
            }
        };
        if let Some((terminal, err)) = fire {
            terminal(err);
        }
    }

    /// Record that the reader was closed. If end-of-input has not been
    /// observed, the terminal fires immediately: with the latched real
    /// error if one exists, otherwise with `ServiceShuttingDown`. After
    /// end-of-input this is a no-op and outstanding acks resolve normally.
    pub fn shutdown(&self) {
        let fire = {
            let mut state = self.state.lock().expect("ack tracker poisoned");
            if state.shut_down {
                None
            } else {
                state.shut_down = true;
                if state.end_seen {
                    None
                } else {
                    let err = state
                        .first_err
                        .take()
                        .or(Some(CodecError::ServiceShuttingDown));
                    state.terminal.take().map(|terminal| (terminal, err))
                }
            }
        };
        if let Some((terminal, err)) = fire {
            terminal(err);
        }
    }

    fn resolve(&self, err: Option<CodecError>) {
        let fire = {
            let mut state = self.state.lock().expect("ack tracker poisoned");
            state.outstanding = state.outstanding.saturating_sub(1);
            if state.first_err.is_none()
                && let Some(err) = err
            {
                state.first_err = Some(err);
            }
            if state.outstanding == 0 && state.end_seen {
                let err = state.first_err.take();
                state.terminal.take().map(|terminal| (terminal, err))
            } else {
                None
            }
        };
        if let Some((terminal, err)) = fire {
            terminal(err);
        }
    }
}

/// One-shot acknowledgement handle for a single message.
///
/// Resolving consumes the handle, so a message cannot be acknowledged
/// twice. Handles are `Send` and may resolve from any thread, in any
/// order relative to other acks from the same reader.
pub struct MessageAck {
    tracker: Arc<AckTracker>,
}

impl std::fmt::Debug for MessageAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageAck").finish_non_exhaustive()
    }
}

impl MessageAck {
    /// Resolve with an optional error; `None` is a positive ack.
    pub fn resolve(self, err: Option<CodecError>) {
        self.tracker.resolve(err);
    }

    /// Acknowledge the message as successfully handled.
    pub fn success(self) {
        self.resolve(None);
    }

    /// Reject the message. The first rejection across all acks becomes
    /// the reader's terminal error.
    pub fn fail(self, err: CodecError) {
        self.resolve(Some(err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    type Captured = Arc<Mutex<Option<Option<CodecError>>>>;

    fn capture() -> (Captured, TerminalFn) {
        let cell: Captured = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&cell);
        let terminal = Box::new(move |err| {
            let mut slot = inner.lock().unwrap();
            assert!(slot.is_none(), "terminal fired twice");
            *slot = Some(err);
        });
        (cell, terminal)
    }

    fn fired(cell: &Captured) -> Option<Option<String>> {
        cell.lock()
            .unwrap()
            .as_ref()
            .map(|err| err.as_ref().map(|e| e.to_string()))
    }

    #[test]
    fn test_end_with_no_outstanding_fires_success() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        tracker.mark_end();
        assert_eq!(fired(&cell), Some(None));
    }

    #[test]
    fn test_shutdown_before_end_fires_shutting_down() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        tracker.shutdown();
        assert_eq!(fired(&cell), Some(Some("service shutting down".to_string())));
    }

    #[test]
    fn test_terminal_waits_for_outstanding_acks() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        let first = tracker.register();
        let second = tracker.register();
        tracker.mark_end();
        assert_eq!(fired(&cell), None);

        second.success();
        assert_eq!(fired(&cell), None);
        first.success();
        assert_eq!(fired(&cell), Some(None));
    }

    #[test]
    fn test_shutdown_after_end_lets_acks_resolve() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        let ack = tracker.register();
        tracker.mark_end();
        tracker.shutdown();
        assert_eq!(fired(&cell), None);

        ack.success();
        assert_eq!(fired(&cell), Some(None));
    }

    #[test]
    fn test_first_error_is_latched() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        let first = tracker.register();
        let second = tracker.register();
        let third = tracker.register();
        tracker.mark_end();

        first.fail(CodecError::Rejected {
            message: "first failure".to_string(),
        });
        second.fail(CodecError::Rejected {
            message: "second failure".to_string(),
        });
        third.success();
        assert_eq!(fired(&cell), Some(Some("first failure".to_string())));
    }

    #[test]
    fn test_shutdown_before_end_prefers_latched_error() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        let ack = tracker.register();
        ack.fail(CodecError::Rejected {
            message: "bad record".to_string(),
        });
        tracker.shutdown();
        assert_eq!(fired(&cell), Some(Some("bad record".to_string())));
    }

    #[test]
    fn test_parallel_acks() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        let acks: Vec<MessageAck> = (0..16).map(|_| tracker.register()).collect();
        tracker.mark_end();

        let handles: Vec<_> = acks
            .into_iter()
            .map(|ack| thread::spawn(move || ack.success()))
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(fired(&cell), Some(None));
    }

    #[test]
    fn test_late_acks_after_shutdown_are_noops() {
        let (cell, terminal) = capture();
        let tracker = AckTracker::new(terminal);
        let ack = tracker.register();
        tracker.shutdown();
        assert_eq!(fired(&cell), Some(Some("service shutting down".to_string())));

        // Terminal already delivered; the straggler must not re-fire it.
        ack.success();
        assert_eq!(fired(&cell), Some(Some("service shutting down".to_string())));
    }

    #[test]
    fn test_outcome_classification() {
        assert!(matches!(
            TerminalOutcome::from(None),
            TerminalOutcome::Success
        ));
        assert!(matches!(
            TerminalOutcome::from(Some(CodecError::ServiceShuttingDown)),
            TerminalOutcome::ShuttingDown
        ));
        assert!(matches!(
            TerminalOutcome::from(Some(CodecError::Rejected {
                message: "x".to_string()
            })),
            TerminalOutcome::Failed(_)
        ));
    }
}
