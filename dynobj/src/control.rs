use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{ControlInput, DynObjID};

struct Shared<T> {
    value: T,
    open: AtomicBool,
    /// How many `SelfRef`s are alive.
    refs: Mutex<usize>,
    released: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    // A holder that panicked leaves nothing half-written behind; keep going.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A counted handle back to something owned elsewhere. The owner can see how many handles are
/// out and, when shutting down, wait for them to be dropped.
pub struct SelfRef<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SelfRef<T> {
    fn issue(shared: &Arc<Shared<T>>) -> SelfRef<T> {
        *lock(&shared.refs) += 1;
        SelfRef {
            shared: shared.clone(),
        }
    }

    /// False once the owner has started shutting down.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }
}

impl<T> Clone for SelfRef<T> {
    fn clone(&self) -> SelfRef<T> {
        SelfRef::issue(&self.shared)
    }
}

impl<T> Drop for SelfRef<T> {
    fn drop(&mut self) {
        let mut refs = lock(&self.shared.refs);
        *refs = refs.saturating_sub(1);
        self.shared.released.notify_all();
    }
}

impl<T> Deref for SelfRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.shared.value
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownResult {
    /// Every handle was dropped.
    Clean,
    /// Gave up waiting with this many handles still out.
    TimedOut { outstanding: usize },
}

/// The latest commands from external controllers, per object.
#[derive(Default)]
pub struct ControlTable {
    inputs: Mutex<BTreeMap<DynObjID, Vec<ControlInput>>>,
}

impl ControlTable {
    fn push(&self, obj: DynObjID, input: ControlInput) {
        lock(&self.inputs).entry(obj).or_default().push(input);
    }

    fn take(&self) -> BTreeMap<DynObjID, Vec<ControlInput>> {
        std::mem::take(&mut *lock(&self.inputs))
    }
}

impl SelfRef<ControlTable> {
    /// Queues a command for the next frame. Refused after shutdown starts.
    pub fn send(&self, obj: DynObjID, input: ControlInput) -> bool {
        if !self.is_open() {
            debug!("Control for {} after shutdown; dropping {:?}", obj, input);
            return false;
        }
        self.push(obj, input);
        true
    }
}

/// Where external controllers send commands. Controllers hold `SelfRef` handles, possibly on
/// other threads; the simulation drains the queued commands once per frame.
pub struct ExtControlRegistry {
    shared: Arc<Shared<ControlTable>>,
}

impl ExtControlRegistry {
    pub fn new() -> ExtControlRegistry {
        ExtControlRegistry {
            shared: Arc::new(Shared {
                value: ControlTable::default(),
                open: AtomicBool::new(true),
                refs: Mutex::new(0),
                released: Condvar::new(),
            }),
        }
    }

    /// None once shutdown has started.
    pub fn handle(&self) -> Option<SelfRef<ControlTable>> {
        if !self.shared.open.load(Ordering::Acquire) {
            return None;
        }
        Some(SelfRef::issue(&self.shared))
    }

    pub fn outstanding(&self) -> usize {
        *lock(&self.shared.refs)
    }

    /// Every command queued since the last call, in arrival order per object.
    pub fn take_inputs(&self) -> BTreeMap<DynObjID, Vec<ControlInput>> {
        self.shared.value.take()
    }

    /// Stops issuing handles and refuses new commands, then waits up to `timeout` for every
    /// outstanding handle to be dropped.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownResult {
        self.shared.open.store(false, Ordering::Release);
        let deadline = Instant::now() + timeout;
        let mut refs = lock(&self.shared.refs);
        while *refs > 0 {
            let now = Instant::now();
            if now >= deadline {
                warn!("Shutting down with {} control handles still out", *refs);
                return ShutdownResult::TimedOut { outstanding: *refs };
            }
            refs = match self.shared.released.wait_timeout(refs, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        ShutdownResult::Clean
    }
}

impl Default for ExtControlRegistry {
    fn default() -> ExtControlRegistry {
        ExtControlRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FollowerMode;

    #[test]
    fn handles_are_counted() {
        let registry = ExtControlRegistry::new();
        let a = registry.handle().unwrap();
        let b = a.clone();
        assert_eq!(registry.outstanding(), 2);
        assert!(b.send(DynObjID(3), ControlInput::Speed(2.0)));
        assert!(a.send(DynObjID(3), ControlInput::Mode(FollowerMode::FreeMotion)));
        drop(a);
        assert_eq!(registry.outstanding(), 1);

        let inputs = registry.take_inputs();
        assert_eq!(
            inputs[&DynObjID(3)],
            vec![
                ControlInput::Speed(2.0),
                ControlInput::Mode(FollowerMode::FreeMotion)
            ]
        );
        assert!(registry.take_inputs().is_empty());
        drop(b);
        assert_eq!(registry.shutdown(Duration::from_millis(10)), ShutdownResult::Clean);
    }

    #[test]
    fn shutdown_gives_up_on_held_handles() {
        let registry = ExtControlRegistry::new();
        let held = registry.handle().unwrap();
        assert_eq!(
            registry.shutdown(Duration::from_millis(20)),
            ShutdownResult::TimedOut { outstanding: 1 }
        );
        assert!(!held.is_open());
        assert!(!held.send(DynObjID(0), ControlInput::Speed(1.0)));
        assert!(registry.handle().is_none());
        assert!(registry.take_inputs().is_empty());
    }

    #[test]
    fn shutdown_waits_for_other_threads() {
        let registry = ExtControlRegistry::new();
        let handle = registry.handle().unwrap();
        std::thread::scope(|scope| {
            scope.spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                handle.send(DynObjID(1), ControlInput::Speed(5.0));
                drop(handle);
            });
            assert_eq!(registry.shutdown(Duration::from_secs(10)), ShutdownResult::Clean);
        });
        assert_eq!(registry.outstanding(), 0);
    }
}
