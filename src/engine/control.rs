//! Shared per-run state
//!
//! Cancellation, abort, the start time and the handle registry are the only
//! state shared between the session and its pumps. All of it sits behind one
//! mutex.

use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use crate::domain::errors::CompressionError;
use crate::ports::Cancellable;

#[derive(Default)]
struct SessionShared {
    running: bool,
    cancelled: bool,
    aborted: bool,
    started_at: Option<Instant>,
    handles: Vec<Weak<dyn Cancellable>>,
}

/// Cloneable view onto the shared run state
#[derive(Clone, Default)]
pub struct SessionControl {
    shared: Arc<Mutex<SessionShared>>,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a run as started; fails if one is already in progress
    pub fn begin(&self) -> Result<RunGuard, CompressionError> {
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| CompressionError::failed("session state poisoned"))?;
        if shared.running {
            return Err(CompressionError::failed("session already running"));
        }
        shared.running = true;
        shared.cancelled = false;
        shared.aborted = false;
        shared.started_at = Some(Instant::now());
        shared.handles.clear();
        Ok(RunGuard {
            control: self.clone(),
        })
    }

    /// Request cancellation and signal every registered handle
    pub fn cancel(&self) {
        let handles: Vec<Arc<dyn Cancellable>> = match self.shared.lock() {
            Ok(mut shared) => {
                if !shared.running || shared.cancelled {
                    return;
                }
                shared.cancelled = true;
                shared.handles.iter().filter_map(Weak::upgrade).collect()
            }
            Err(_) => return,
        };
        // signalled outside the lock
        for handle in handles {
            handle.cancel();
        }
    }

    /// Stop sibling pumps after a fatal failure
    pub fn abort(&self) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.aborted = true;
        }
    }

    /// Register a handle for cancellation propagation without taking ownership
    pub fn register(&self, handle: &Arc<dyn Cancellable>) {
        let cancelled = match self.shared.lock() {
            Ok(mut shared) => {
                shared.handles.push(Arc::downgrade(handle));
                shared.cancelled
            }
            Err(_) => false,
        };
        if cancelled {
            handle.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().map(|s| s.cancelled).unwrap_or(true)
    }

    /// Whether pumps should stop at their next readiness cycle
    pub fn should_stop(&self) -> bool {
        self.shared
            .lock()
            .map(|s| s.cancelled || s.aborted)
            .unwrap_or(true)
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().map(|s| s.running).unwrap_or(false)
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.shared.lock().ok().and_then(|s| s.started_at)
    }

    pub fn registered_handles(&self) -> usize {
        self.shared
            .lock()
            .map(|s| s.handles.iter().filter(|h| h.strong_count() > 0).count())
            .unwrap_or(0)
    }

    fn release(&self) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.running = false;
            shared.cancelled = false;
            shared.aborted = false;
            shared.started_at = None;
            shared.handles.clear();
        }
    }
}

/// Releases handles and clears cancellation when a run ends, on every path
pub struct RunGuard {
    control: SessionControl,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.control.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Flag(AtomicBool);

    impl Cancellable for Flag {
        fn cancel(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_single_flight() {
        let control = SessionControl::new();
        let guard = control.begin().unwrap();
        let err = control.begin().err().unwrap();
        assert_eq!(err, CompressionError::failed("session already running"));
        drop(guard);
        assert!(control.begin().is_ok());
    }

    #[test]
    fn test_cancel_signals_registered_handles() {
        let control = SessionControl::new();
        let _guard = control.begin().unwrap();
        let flag = Arc::new(Flag::default());
        let handle: Arc<dyn Cancellable> = flag.clone();
        control.register(&handle);

        control.cancel();
        control.cancel();

        assert!(control.is_cancelled());
        assert!(control.should_stop());
        assert!(flag.0.load(Ordering::SeqCst));
    }

    #[test]
    fn test_registry_does_not_own_handles() {
        let control = SessionControl::new();
        let _guard = control.begin().unwrap();
        let handle: Arc<dyn Cancellable> = Arc::new(Flag::default());
        control.register(&handle);
        assert_eq!(control.registered_handles(), 1);
        drop(handle);
        assert_eq!(control.registered_handles(), 0);
    }

    #[test]
    fn test_guard_clears_state() {
        let control = SessionControl::new();
        {
            let _guard = control.begin().unwrap();
            control.cancel();
            control.abort();
        }
        assert!(!control.is_running());
        assert!(!control.should_stop());
        assert!(control.started_at().is_none());
    }

    #[test]
    fn test_cancel_outside_run_is_ignored() {
        let control = SessionControl::new();
        control.cancel();
        assert!(!control.is_cancelled());
    }

    #[test]
    fn test_late_registration_after_cancel_is_signalled() {
        let control = SessionControl::new();
        let _guard = control.begin().unwrap();
        control.cancel();
        let flag = Arc::new(Flag::default());
        let handle: Arc<dyn Cancellable> = flag.clone();
        control.register(&handle);
        assert!(flag.0.load(Ordering::SeqCst));
    }
}
