// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Values produced in the background, in a slot that can be swapped
//!
//! A `Pending<T>` is filled once, by whoever is producing it, and read
//! by anyone willing to block until then.  A `Staged<T>` holds the
//! current `Pending<T>` and lets it be replaced (a reloaded image, say)
//! while readers are still waiting on the old one.
//!
//! A reader must never come away with the old value after the slot
//! has moved on, so every read is checked against a generation counter
//! that each replacement bumps.  If the counter or the slot changed
//! while the reader waited, the value is dropped and the read starts
//! over.  Replacements are rare, so this settles quickly.

use crate::error::{Result, SeamError};
use log::warn;
use parking_lot::{Condvar, Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

pub struct Pending<T> {
    slot: Mutex<Option<Result<Arc<T>>>>,
    filled: Condvar,
}

impl<T> Pending<T> {
    /// An empty slot.
    pub fn new() -> Arc<Self> {
        Arc::new(Pending {
            slot: Mutex::new(None),
            filled: Condvar::new(),
        })
    }

    /// A slot that is already filled.
    pub fn ready(value: T) -> Arc<Self> {
        let pending = Pending::new();
        pending.fulfil(Ok(value));
        pending
    }

    /// Fill the slot and wake every waiter.  Only the first call
    /// counts.
    pub fn fulfil(&self, value: Result<T>) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(value.map(Arc::new));
            self.filled.notify_all();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Block until the slot is filled.
    pub fn wait(&self) -> Result<Arc<T>> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.as_ref() {
                return value.clone();
            }
            self.filled.wait(&mut slot);
        }
    }

    /// Block until the slot is filled, then move the value out.  Later
    /// readers get an error rather than the value.
    pub fn take(&self) -> Result<Arc<T>> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.take() {
                *slot = Some(Err(SeamError::Resource("value already taken".to_string())));
                return value;
            }
            self.filled.wait(&mut slot);
        }
    }
}

/// Produce a value on a worker thread.  A panic in `produce` fills the
/// slot with an error rather than leaving waiters stranded.
pub fn spawn_pending<T, F>(name: &str, produce: F) -> Arc<Pending<T>>
where
    T: Send + Sync + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let pending = Pending::new();
    let worker = Arc::clone(&pending);
    let label = name.to_string();
    let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
        let value = catch_unwind(AssertUnwindSafe(produce))
            .unwrap_or_else(|_| Err(SeamError::Resource(format!("{} worker panicked", label))));
        worker.fulfil(value);
    });
    if let Err(err) = spawned {
        pending.fulfil(Err(SeamError::Resource(format!(
            "could not start {} worker: {}",
            name, err
        ))));
    }
    pending
}

pub struct Staged<T> {
    generation: AtomicU64,
    current: RwLock<Arc<Pending<T>>>,
}

impl<T> Staged<T> {
    pub fn new(pending: Arc<Pending<T>>) -> Self {
        Staged {
            generation: AtomicU64::new(0),
            current: RwLock::new(pending),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Swap in a new slot.  Readers waiting on the old one will read
    /// again.  Returns the new generation.
    pub fn replace(&self, pending: Arc<Pending<T>>) -> u64 {
        let mut current = self.current.write();
        *current = pending;
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The value in the current slot, as of when it arrived.
    pub fn get(&self) -> Result<Arc<T>> {
        loop {
            let generation = self.generation();
            let pending = Arc::clone(&self.current.read());
            let value = pending.wait();

            let unchanged = self.generation() == generation
                && Arc::ptr_eq(&pending, &self.current.read());
            if unchanged {
                return value;
            }
            warn!("staged value replaced while waiting (generation {}); reading again", generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn waits_for_the_value() {
        let staged = Arc::new(Staged::new(spawn_pending("answer", || {
            thread::sleep(Duration::from_millis(10));
            Ok(42)
        })));
        assert_eq!(*staged.get().unwrap(), 42);
        assert_eq!(staged.generation(), 0);
    }

    #[test]
    fn never_returns_a_superseded_value() {
        let stale = Pending::new();
        let staged = Arc::new(Staged::new(Arc::clone(&stale)));

        let reader = {
            let staged = Arc::clone(&staged);
            thread::spawn(move || staged.get())
        };
        thread::sleep(Duration::from_millis(10));
        assert_eq!(staged.replace(Pending::ready("fresh")), 1);
        stale.fulfil(Ok("stale"));

        assert_eq!(*reader.join().unwrap().unwrap(), "fresh");
    }

    #[test]
    fn errors_and_panics_reach_the_reader() {
        let failed: Staged<u8> = Staged::new(spawn_pending("broken", || {
            Err(SeamError::Resource("no pixels".to_string()))
        }));
        assert_eq!(
            failed.get().unwrap_err(),
            SeamError::Resource("no pixels".to_string())
        );

        let panicked: Staged<u8> = Staged::new(spawn_pending("panicky", || panic!("boom")));
        assert!(panicked.get().is_err());
    }

    #[test]
    fn first_fulfilment_wins() {
        let pending = Pending::new();
        pending.fulfil(Ok(1));
        pending.fulfil(Ok(2));
        assert!(pending.is_ready());
        assert_eq!(*pending.wait().unwrap(), 1);
    }

    #[test]
    fn taking_moves_the_value_out() {
        let pending = spawn_pending("owned", || {
            thread::sleep(Duration::from_millis(10));
            Ok(vec![1u8, 2, 3])
        });
        let value = pending.take().unwrap();
        assert_eq!(Arc::try_unwrap(value), Ok(vec![1, 2, 3]));
        assert_eq!(pending.take().unwrap_err().kind(), crate::error::ErrorKind::Resource);
        assert!(pending.wait().is_err());
    }
}
