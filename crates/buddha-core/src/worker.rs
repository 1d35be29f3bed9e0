//! A single sampling worker: a plain control block (status + mutex +
//! condvar) plus a long-running `std::thread`. See spec.md §4.6 and
//! Design Notes §9 ("model each worker as a task plus a small control
//! block; avoid inheritance; use a plain struct").

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, trace};

use crate::ack_gate::AckGate;
use crate::complex::Complex64;
use crate::deposit::RawBuffer;
use crate::rng::WorkerRng;
use crate::sampler::metropolis;
use crate::view::ViewHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerStatus {
    Stop = 0,
    Pause = 1,
    Run = 2,
}

impl WorkerStatus {
    fn from_u8(v: u8) -> WorkerStatus {
        match v {
            0 => WorkerStatus::Stop,
            1 => WorkerStatus::Pause,
            _ => WorkerStatus::Run,
        }
    }
}

/// Shared control block for one worker. The accumulator is guarded by
/// its own mutex (locked by the owning worker for the duration of one
/// Metropolis batch, and briefly by the coordinator during reduce); the
/// status is a plain atomic so `flow()` checks inside the proposal loop
/// never contend with reduce.
struct WorkerInner {
    status: AtomicU8,
    accumulator: Mutex<RawBuffer>,
    sleep_lock: Mutex<()>,
    sleep_cv: Condvar,
}

#[derive(Clone)]
pub struct WorkerControl {
    inner: Arc<WorkerInner>,
}

impl WorkerControl {
    fn new(size: usize) -> Self {
        WorkerControl {
            inner: Arc::new(WorkerInner {
                status: AtomicU8::new(WorkerStatus::Stop as u8),
                accumulator: Mutex::new(vec![0u64; 3 * size]),
                sleep_lock: Mutex::new(()),
                sleep_cv: Condvar::new(),
            }),
        }
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.inner.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: WorkerStatus) {
        self.inner.status.store(status as u8, Ordering::Release);
        // Wake a worker parked in the pause wait loop; harmless no-op
        // otherwise.
        let _guard = self.inner.sleep_lock.lock().unwrap();
        self.inner.sleep_cv.notify_all();
    }

    pub fn pause(&self) {
        self.set_status(WorkerStatus::Pause);
    }

    pub fn resume(&self) {
        self.set_status(WorkerStatus::Run);
    }

    pub fn stop(&self) {
        self.set_status(WorkerStatus::Stop);
    }

    /// Add this worker's accumulator elementwise into `dest` (the
    /// coordinator's merged raw buffer). Invariant #2 of spec.md §8.
    pub fn add_into(&self, dest: &mut [u64]) {
        let acc = self.inner.accumulator.lock().unwrap();
        for (d, s) in dest.iter_mut().zip(acc.iter()) {
            *d += *s;
        }
    }

    pub fn reset_accumulator(&self, size: usize) {
        let mut acc = self.inner.accumulator.lock().unwrap();
        *acc = vec![0u64; 3 * size];
    }

    pub fn resize_accumulator(&self, size: usize) {
        let mut acc = self.inner.accumulator.lock().unwrap();
        acc.resize(3 * size, 0);
    }
}

pub struct WorkerHandle {
    pub control: WorkerControl,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn join(mut self) {
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

/// Spawn a worker thread in the `Stop` state. Call `control.resume()` to
/// start sampling.
pub fn spawn_worker(
    index: u64,
    base_seed: u64,
    view: ViewHandle,
    ack_gate: Arc<AckGate>,
) -> WorkerHandle {
    let size = view.current().size();
    let control = WorkerControl::new(size);
    let thread_control = control.clone();

    let thread = std::thread::Builder::new()
        .name(format!("buddha-worker-{index}"))
        .spawn(move || worker_loop(index, base_seed, view, thread_control, ack_gate))
        .expect("failed to spawn worker thread");

    WorkerHandle { control, thread: Some(thread) }
}

fn worker_loop(index: u64, base_seed: u64, view: ViewHandle, control: WorkerControl, ack_gate: Arc<AckGate>) {
    let mut rng = WorkerRng::new(base_seed, index);
    let mut sequence: Vec<Complex64> = Vec::new();
    let mut sequence_len = 0usize;

    loop {
        match control.status() {
            WorkerStatus::Run => {
                let snapshot = view.current();
                if sequence_len != snapshot.sequence_len() {
                    sequence_len = snapshot.sequence_len();
                    sequence = vec![Complex64::ZERO; sequence_len];
                }

                let inner = &control.inner;
                let mut acc = inner.accumulator.lock().unwrap();
                if acc.len() != 3 * snapshot.size() {
                    acc.resize(3 * snapshot.size(), 0);
                }
                let calculated =
                    metropolis(&snapshot, &mut rng, &mut sequence, &mut acc, || {
                        control.status() == WorkerStatus::Run
                    });
                trace!(target: "buddha.worker", index, calculated, "batch complete");
            }
            WorkerStatus::Pause => {
                debug!(target: "buddha.worker", index, "pausing");
                ack_gate.signal();
                let guard = control.inner.sleep_lock.lock().unwrap();
                let _ = control
                    .inner
                    .sleep_cv
                    .wait_while(guard, |_| control.status() == WorkerStatus::Pause)
                    .unwrap();
            }
            WorkerStatus::Stop => {
                debug!(target: "buddha.worker", index, "stopping");
                ack_gate.signal();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{IterWindow, ViewParams};
    use std::time::Duration;

    fn tiny_view() -> ViewParams {
        let w = [IterWindow::new(0, 50).unwrap(); 3];
        ViewParams::derive(-0.5, 0.0, 60.0, 8, 8, w).unwrap()
    }

    #[test]
    fn pause_then_stop_acknowledge_on_the_gate() {
        let view = ViewHandle::new(tiny_view());
        let gate = Arc::new(AckGate::new());
        let handle = spawn_worker(0, 1, view, gate.clone());
        handle.control.resume();

        std::thread::sleep(Duration::from_millis(20));
        handle.control.pause();
        gate.wait_for(1);
        gate.reset();

        handle.control.stop();
        gate.wait_for(1);
        handle.join();
    }

    #[test]
    fn accumulator_accumulates_while_running() {
        let view = ViewHandle::new(tiny_view());
        let gate = Arc::new(AckGate::new());
        let handle = spawn_worker(0, 7, view, gate.clone());
        handle.control.resume();
        std::thread::sleep(Duration::from_millis(50));
        handle.control.stop();
        gate.wait_for(1);

        let mut merged = vec![0u64; 3 * 8 * 8];
        handle.control.add_into(&mut merged);
        handle.join();
        assert!(merged.iter().any(|&v| v > 0));
    }
}
