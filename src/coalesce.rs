//! Call coalescing ("singleflight").
//!
//! A [`Coalescer`] makes sure that, for any key, at most one invocation of a
//! fetch function is running at a time. The first caller for a key becomes the
//! leader and runs the function; callers arriving while it runs park on a
//! condition variable and receive a clone of the leader's outcome, value or
//! error alike. Once the leader finishes the key is forgotten, so the next
//! caller starts a fresh execution.
//!
//! ```text
//!   caller A ──▶ claim "k" (leader) ──▶ run f ──▶ publish ──▶ Ok(v)
//!   caller B ──▶ "k" in flight ──▶ wait ─────────────────────▶ Ok(v)
//!   caller C ──▶ "k" in flight ──▶ wait ─────────────────────▶ Ok(v)
//!   caller D ─────────────────────────────────── (later) ──▶ claim "k" (leader)
//! ```

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

enum Outcome<T, E> {
    Done(Result<T, E>),
    Panicked,
}

struct CallState<T, E> {
    outcome: Option<Outcome<T, E>>,
    waiters: usize,
}

/// One in-flight execution shared by its leader and waiters.
struct Call<T, E> {
    state: Mutex<CallState<T, E>>,
    done: Condvar,
}

impl<T: Clone, E: Clone> Call<T, E> {
    fn new() -> Self {
        Call {
            state: Mutex::new(CallState {
                outcome: None,
                waiters: 0,
            }),
            done: Condvar::new(),
        }
    }

    fn wait(&self, key: &str) -> Result<T, E> {
        let mut state = self.state.lock();
        state.waiters += 1;
        while state.outcome.is_none() {
            self.done.wait(&mut state);
        }
        state.waiters -= 1;
        match state.outcome.as_ref() {
            Some(Outcome::Done(result)) => result.clone(),
            _ => panic!("coalesced call for key {key:?} panicked"),
        }
    }

    fn publish(&self, outcome: Outcome<T, E>) {
        self.state.lock().outcome = Some(outcome);
        self.done.notify_all();
    }
}

/// Deduplicates concurrent executions keyed by request identity.
///
/// # Examples
///
/// ```
/// use peercache::Coalescer;
///
/// let flights: Coalescer<u32, String> = Coalescer::new();
/// let v = flights.do_call("answer", || Ok(42));
/// assert_eq!(v, Ok(42));
/// assert_eq!(flights.in_flight(), 0);
/// ```
pub struct Coalescer<T, E> {
    calls: Mutex<HashMap<String, Arc<Call<T, E>>>>,
}

impl<T: Clone, E: Clone> Coalescer<T, E> {
    /// Creates a coalescer with nothing in flight.
    pub fn new() -> Self {
        Coalescer {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` for `key` unless a call for `key` is already running, in which
    /// case this blocks until that call finishes and returns its outcome.
    ///
    /// # Panics
    ///
    /// If the leader's `f` panics, the panic resumes in the leader and every
    /// waiter of that call panics as well; the key is released either way.
    pub fn do_call<F>(&self, key: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let call = {
            let mut calls = self.calls.lock();
            if let Some(existing) = calls.get(key) {
                let existing = Arc::clone(existing);
                drop(calls);
                return existing.wait(key);
            }
            let call = Arc::new(Call::new());
            calls.insert(key.to_string(), Arc::clone(&call));
            call
        };

        let result = panic::catch_unwind(AssertUnwindSafe(f));
        self.calls.lock().remove(key);

        match result {
            Ok(result) => {
                call.publish(Outcome::Done(result.clone()));
                result
            }
            Err(payload) => {
                call.publish(Outcome::Panicked);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Number of keys with a call currently running.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of callers parked on the running call for `key`.
    pub fn waiters(&self, key: &str) -> usize {
        let call = self.calls.lock().get(key).cloned();
        call.map_or(0, |c| c.state.lock().waiters)
    }
}

impl<T: Clone, E: Clone> Default for Coalescer<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Coalescer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coalescer")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}
