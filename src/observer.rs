//! Observer trait for task state changes.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::controller::WorkflowController::with_observer`] to be told about
//! every status transition and every published snapshot. A view re-renders
//! from the snapshot; a CLI drives a spinner from the transitions.
//!
//! # Example
//!
//! ```rust
//! use typeshift::{TaskSnapshot, WorkflowObserver};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     snapshots: AtomicUsize,
//! }
//!
//! impl WorkflowObserver for CountingObserver {
//!     fn on_snapshot(&self, _snapshot: &TaskSnapshot) {
//!         self.snapshots.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use crate::task::{TaskSnapshot, TaskStatus};
use std::sync::Arc;

/// Receives controller events.
///
/// Implementations must be `Send + Sync`; a controller shared between tasks
/// may publish from any of them. Methods are called after the controller's
/// lock is released, so an observer may call back into the controller.
pub trait WorkflowObserver: Send + Sync {
    /// Called when the task status changes.
    fn on_transition(&self, from: TaskStatus, to: TaskStatus) {
        let _ = (from, to);
    }

    /// Called after every operation that changed the task.
    fn on_snapshot(&self, snapshot: &TaskSnapshot) {
        let _ = snapshot;
    }
}

/// Observer that ignores every event. The default.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias for the type held by the controller.
pub type SharedObserver = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        transitions: Mutex<Vec<(TaskStatus, TaskStatus)>>,
        last: Mutex<Option<TaskSnapshot>>,
    }

    impl WorkflowObserver for RecordingObserver {
        fn on_transition(&self, from: TaskStatus, to: TaskStatus) {
            self.transitions.lock().unwrap().push((from, to));
        }

        fn on_snapshot(&self, snapshot: &TaskSnapshot) {
            *self.last.lock().unwrap() = Some(snapshot.clone());
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_transition(TaskStatus::Idle, TaskStatus::Ready);
        o.on_snapshot(&TaskSnapshot::default());
    }

    #[test]
    fn recording_observer_receives_events() {
        let o = RecordingObserver::default();
        o.on_transition(TaskStatus::Ready, TaskStatus::Converting);
        o.on_transition(TaskStatus::Converting, TaskStatus::Failed);
        o.on_snapshot(&TaskSnapshot::default());

        assert_eq!(
            *o.transitions.lock().unwrap(),
            vec![
                (TaskStatus::Ready, TaskStatus::Converting),
                (TaskStatus::Converting, TaskStatus::Failed)
            ]
        );
        assert!(o.last.lock().unwrap().is_some());
    }

    #[test]
    fn arc_dyn_observer_works() {
        let o: SharedObserver = Arc::new(NoopObserver);
        o.on_snapshot(&TaskSnapshot::default());
    }
}
