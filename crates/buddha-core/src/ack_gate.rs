//! A reusable "wait for N acknowledgements" barrier.
//!
//! Replaces the raw semaphore Design Notes §9 flags as fragile (permits
//! left deliberately consumed across resume, coupling pause/resume
//! semantics to the stop path). `AckGate` is explicit instead: callers
//! `reset()` before a new pause/stop request and `wait_for(n)` after
//! issuing it; workers call `signal()` exactly once per acknowledgement.

use std::sync::{Condvar, Mutex};

pub struct AckGate {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl Default for AckGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AckGate {
    pub fn new() -> Self {
        AckGate { count: Mutex::new(0), condvar: Condvar::new() }
    }

    pub fn signal(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.condvar.notify_all();
    }

    /// Block until at least `n` acknowledgements have been signalled
    /// since the last `reset()`.
    pub fn wait_for(&self, n: usize) {
        let guard = self.count.lock().unwrap();
        let _unused = self.condvar.wait_while(guard, |count| *count < n).unwrap();
    }

    pub fn reset(&self) {
        *self.count.lock().unwrap() = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn wait_for_blocks_until_n_signals() {
        let gate = Arc::new(AckGate::new());
        let workers = 3;
        let mut handles = Vec::new();
        for _ in 0..workers {
            let gate = gate.clone();
            handles.push(std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                gate.signal();
            }));
        }
        gate.wait_for(workers);
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn reset_allows_reuse() {
        let gate = AckGate::new();
        gate.signal();
        gate.wait_for(1);
        gate.reset();
        gate.signal();
        gate.wait_for(1);
    }
}
