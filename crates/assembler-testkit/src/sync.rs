//! Synchronisation helper for proving lookups overlap in time

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Lets `parties` threads wait for each other, with a timeout.
///
/// Lookups that call [`arrive`](Self::arrive) only all succeed when they
/// run concurrently; sequential dispatch makes the first one time out.
pub struct Rendezvous {
    parties: usize,
    arrived: Mutex<usize>,
    all_arrived: Condvar,
}

impl Rendezvous {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            arrived: Mutex::new(0),
            all_arrived: Condvar::new(),
        }
    }

    /// Register arrival and wait for the other parties.
    ///
    /// Returns `false` if they did not all arrive within `timeout`.
    pub fn arrive(&self, timeout: Duration) -> bool {
        let mut arrived = self.arrived.lock();
        *arrived += 1;
        if *arrived >= self.parties {
            self.all_arrived.notify_all();
            return true;
        }
        while *arrived < self.parties {
            if self.all_arrived.wait_for(&mut arrived, timeout).timed_out() {
                return *arrived >= self.parties;
            }
        }
        true
    }
}
