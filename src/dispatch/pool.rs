//! Private module for selective re-export.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use super::session::ClientSession;
use super::worker::Worker;

/// A fixed-size set of Worker slots, sized once at first allocation rather than resized under
/// load, and addressed through weak references so pressure drops naturally as clients close.
pub(crate) struct Pool<S: ClientSession> {
    slots: Vec<Mutex<Weak<Worker<S>>>>,
}

/// One process-wide table of lazily-materialized pools, keyed by client-session type: every
/// `SingleClient<S>` in the process shares the same `Pool<S>`, even though each keeps its own
/// private output queue and binding map. Type-erased because a `static` item can't itself be
/// generic over `S`.
static PROCESS_POOLS: OnceLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> = OnceLock::new();

impl<S: ClientSession> Pool<S> {
    /// `clamp(hardware_concurrency() * 5 / 4, 8, 1000)`.
    pub fn size_for_hardware() -> usize {
        (num_cpus::get() * 5 / 4).clamp(8, 1000)
    }

    pub fn new(size: usize) -> Self {
        Pool {
            slots: (0..size).map(|_| Mutex::new(Weak::new())).collect(),
        }
    }

    /// Returns the process-wide `Pool<S>`, materializing it (sized for hardware concurrency) on
    /// the first call for this `S` and handing out the same instance to every later caller for
    /// as long as the process runs.
    pub fn shared() -> Arc<Pool<S>> {
        let pools = PROCESS_POOLS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut pools = pools.lock();
        let entry = pools.entry(TypeId::of::<S>()).or_insert_with(|| {
            Arc::new(Pool::<S>::new(Pool::<S>::size_for_hardware())) as Arc<dyn Any + Send + Sync>
        });
        Arc::clone(entry)
            .downcast::<Pool<S>>()
            .unwrap_or_else(|_| unreachable!("process pool keyed by TypeId::of::<S>() held the wrong type"))
    }

    /// Returns the Worker with the smallest current use-count, materializing a fresh one in its
    /// slot if every client previously bound to it has gone. Ties break in favor of the first
    /// slot found.
    ///
    /// All slots are locked briefly while scanning for the minimum, held only for that critical
    /// section.
    pub fn acquire(&self) -> Arc<Worker<S>> {
        let mut guards: Vec<_> = self.slots.iter().map(Mutex::lock).collect();

        let mut best_idx = 0;
        let mut best_count = usize::MAX;
        for (idx, slot) in guards.iter().enumerate() {
            let count = slot.strong_count();
            if count < best_count {
                best_count = count;
                best_idx = idx;
                if count == 0 {
                    break;
                }
            }
        }

        if let Some(worker) = guards[best_idx].upgrade() {
            return worker;
        }
        let worker = Worker::spawn(format!("tdcore-dispatch-worker-{best_idx}"));
        *guards[best_idx] = Arc::downgrade(&worker);
        log::debug!("pool: materialized worker in slot {best_idx}");
        worker
    }

    #[cfg(test)]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::EchoSession;

    #[test]
    fn size_for_hardware_is_clamped() {
        let size = Pool::<EchoSession>::size_for_hardware();
        assert!((8..=1000).contains(&size));
    }

    #[test]
    fn shared_returns_the_same_pool_instance_every_call() {
        let a = Pool::<EchoSession>::shared();
        let b = Pool::<EchoSession>::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn acquire_reuses_workers_under_the_slot_count() {
        let pool = Pool::<EchoSession>::new(2);
        let mut workers = Vec::new();
        for _ in 0..5 {
            workers.push(pool.acquire());
        }
        // With only 2 slots and every Arc kept alive, acquisitions must land on at most 2
        // distinct Workers no matter how many times `acquire` is called.
        let distinct: std::collections::HashSet<_> =
            workers.iter().map(|w| Arc::as_ptr(w) as usize).collect();
        assert!(distinct.len() <= pool.slot_count());
    }
}
