//! Cooperative pause/cancel signal polled by the runner at unit boundaries.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSignal {
    Run,
    Pause,
    Cancel,
}

/// Shared run signal for one job
///
/// Cancellation is sticky: once cancelled, `pause` and `resume` have no
/// effect. A unit already in flight is never interrupted; the signal is
/// only observed before the next unit starts.
#[derive(Debug, Clone)]
pub struct RunToken {
    sender: Arc<watch::Sender<RunSignal>>,
}

impl RunToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(RunSignal::Run);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn signal(&self) -> RunSignal {
        *self.sender.borrow()
    }

    pub fn pause(&self) {
        self.set(RunSignal::Pause);
    }

    pub fn resume(&self) {
        self.set(RunSignal::Run);
    }

    pub fn cancel(&self) {
        self.sender.send_replace(RunSignal::Cancel);
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal() == RunSignal::Cancel
    }

    /// Watch for signal changes, e.g. from a collaborator that wants to
    /// abandon a long page load early
    pub fn subscribe(&self) -> watch::Receiver<RunSignal> {
        self.sender.subscribe()
    }

    fn set(&self, signal: RunSignal) {
        self.sender.send_if_modified(|current| {
            if *current == RunSignal::Cancel || *current == signal {
                return false;
            }
            *current = signal;
            true
        });
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_and_resume() {
        let token = RunToken::new();
        assert_eq!(token.signal(), RunSignal::Run);

        token.pause();
        assert_eq!(token.signal(), RunSignal::Pause);

        token.resume();
        assert_eq!(token.signal(), RunSignal::Run);
    }

    #[test]
    fn test_cancel_is_sticky() {
        let token = RunToken::new();
        let shared = token.clone();

        shared.cancel();
        token.resume();
        token.pause();

        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let token = RunToken::new();
        let mut receiver = token.subscribe();

        token.pause();
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), RunSignal::Pause);
    }
}
