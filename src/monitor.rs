//! Directory change-notification subscription and event delivery.
//!
//! The platform watcher sits behind the [`ChangeSource`] trait; the core
//! only registers and deregisters. Registration failure is not fatal:
//! monitoring is simply disabled for that directory and a warning is
//! logged. Watcher callbacks deliver [`ChangeEvent`]s through an unbounded
//! channel; the owning thread is the sole consumer and applies them in
//! arrival order.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::Result;
use crate::types::{ChangeEvent, ShellIdentity};

/// Handle for an active change-notification subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A backend capable of delivering change notifications for a directory.
pub trait ChangeSource {
    /// Subscribes to change notifications for the directory identified by
    /// `directory`.
    fn register(&mut self, directory: &ShellIdentity) -> Result<SubscriptionId>;

    /// Cancels a subscription. Must tolerate handles that are already gone.
    fn unregister(&mut self, subscription: SubscriptionId);
}

/// Creates the channel pair used to deliver change events to the owning
/// thread.
pub fn event_channel() -> (Sender<ChangeEvent>, Receiver<ChangeEvent>) {
    unbounded()
}

/// Idempotent on/off toggle for monitoring one directory.
///
/// At most one subscription is held at a time; `start` on an active monitor
/// and `stop` on an inactive one are no-ops.
#[derive(Debug, Default)]
pub struct DirectoryMonitor {
    subscription: Option<SubscriptionId>,
}

impl DirectoryMonitor {
    /// Creates an inactive monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts monitoring `directory` through `source`.
    ///
    /// A registration failure leaves the monitor inactive; the view keeps
    /// working, it just stops receiving live updates for this directory.
    pub fn start(&mut self, source: &mut dyn ChangeSource, directory: &ShellIdentity) {
        if self.subscription.is_some() {
            return;
        }
        match source.register(directory) {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(error) => {
                log::warn!("couldn't monitor directory for changes: {error}");
            }
        }
    }

    /// Stops monitoring, if active.
    pub fn stop(&mut self, source: &mut dyn ChangeSource) {
        if let Some(subscription) = self.subscription.take() {
            source.unregister(subscription);
        }
    }

    /// Returns true while a subscription is held.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::error::ShellViewError;
    use crate::types::ChangeKind;

    #[derive(Default)]
    struct FakeSource {
        next_id: u64,
        active: Vec<SubscriptionId>,
        fail: bool,
    }

    impl ChangeSource for FakeSource {
        fn register(&mut self, _directory: &ShellIdentity) -> Result<SubscriptionId> {
            if self.fail {
                return Err(ShellViewError::Monitor("registration refused".into()));
            }
            self.next_id += 1;
            let id = SubscriptionId(self.next_id);
            self.active.push(id);
            Ok(id)
        }

        fn unregister(&mut self, subscription: SubscriptionId) {
            self.active.retain(|&id| id != subscription);
        }
    }

    fn dir() -> ShellIdentity {
        ShellIdentity::new(b"/watched".to_vec())
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut source = FakeSource::default();
        let mut monitor = DirectoryMonitor::new();

        monitor.start(&mut source, &dir());
        monitor.start(&mut source, &dir());
        assert!(monitor.is_active());
        assert_eq!(source.active.len(), 1);

        monitor.stop(&mut source);
        monitor.stop(&mut source);
        assert!(!monitor.is_active());
        assert!(source.active.is_empty());
    }

    #[test]
    fn registration_failure_leaves_monitor_inactive() {
        let mut source = FakeSource {
            fail: true,
            ..FakeSource::default()
        };
        let mut monitor = DirectoryMonitor::new();

        monitor.start(&mut source, &dir());
        assert!(!monitor.is_active());

        // A later retry against a working source succeeds.
        source.fail = false;
        monitor.start(&mut source, &dir());
        assert!(monitor.is_active());
    }

    #[test]
    fn channel_preserves_arrival_order() {
        let (tx, rx) = event_channel();
        for name in ["a", "b", "c"] {
            tx.send(ChangeEvent::new(
                ChangeKind::Created {
                    name: name.to_string(),
                },
                Utc::now(),
            ))
            .unwrap();
        }

        let received: Vec<String> = rx
            .try_iter()
            .map(|event| match event.kind {
                ChangeKind::Created { name } => name,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(received, vec!["a", "b", "c"]);
    }
}
