//! Ties workers, view publishing, and the merged accumulator together.
//! See spec.md §4.7 and Design Notes §9.
//!
//! The coordinator itself is a plain, synchronously-callable struct —
//! `Host` (below) wraps it in a dedicated thread consuming a
//! `Command` queue and emitting `Event`s, matching how
//! `tools::bin::tournament` separates its worker-pool state from the
//! ticket/result channel plumbing around it.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{info, warn};

use crate::ack_gate::AckGate;
use crate::command::{Command, Event};
use crate::deposit::RawBuffer;
use crate::error::{CoreError, CoreResult};
use crate::tonemap::{tone_map, Frame, ToneMapConfig};
use crate::view::{ViewHandle, ViewParams};
use crate::worker::{spawn_worker, WorkerHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorStatus {
    Stop,
    Pause,
    Run,
}

pub struct Coordinator {
    status: CoordinatorStatus,
    view: ViewParams,
    view_handle: ViewHandle,
    worker_count: usize,
    workers: Vec<WorkerHandle>,
    merged: RawBuffer,
    frame: Option<Frame>,
    tone_map: ToneMapConfig,
    ack_gate: Arc<AckGate>,
    base_seed: u64,
    events: Sender<Event>,
}

impl Coordinator {
    pub fn new(
        initial_view: ViewParams,
        worker_count: usize,
        base_seed: u64,
        events: Sender<Event>,
    ) -> Self {
        let merged = vec![0u64; 3 * initial_view.size()];
        let view_handle = ViewHandle::new(initial_view.clone());
        Coordinator {
            status: CoordinatorStatus::Stop,
            view: initial_view,
            view_handle,
            worker_count,
            workers: Vec::new(),
            merged,
            frame: None,
            tone_map: ToneMapConfig::default(),
            ack_gate: Arc::new(AckGate::new()),
            base_seed,
            events,
        }
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }

    /// spec.md §4.7 `set`: reconfigure the view. Only clears accumulator
    /// contents when `pause_flag` is set, since zeroing a buffer a
    /// running worker holds the mutex for would race the worker's own
    /// reduce-time read (Design Notes §9's "Known hazard").
    pub fn set(&mut self, new_view: ViewParams, pause_flag: bool) {
        if pause_flag {
            self.pause_generators();
        }

        let dirty = self.view.invalidates_buffers(&new_view);
        let resized = self.view.dimensions_changed(&new_view);

        self.view = new_view.clone();
        self.view_handle.publish(new_view);

        if dirty && pause_flag {
            self.merged = vec![0u64; 3 * self.view.size()];
            for w in &self.workers {
                w.control.reset_accumulator(self.view.size());
            }
        } else if resized {
            // Can't safely clear without pausing, but the buffer size
            // invariant (len == 3 * width * height) must still hold.
            self.merged.resize(3 * self.view.size(), 0);
            for w in &self.workers {
                w.control.resize_accumulator(self.view.size());
            }
        }

        if pause_flag {
            self.resume_generators();
        }
        self.emit(Event::ViewApplied);
    }

    /// spec.md §4.7 `changeThreadNumber`: grow or shrink the worker
    /// vector. New workers are started immediately only if the
    /// coordinator is currently running; extras are stopped and
    /// acknowledged before being dropped.
    pub fn change_thread_number(&mut self, n: usize) {
        self.worker_count = n;
        if self.status == CoordinatorStatus::Stop {
            // No live threads exist yet; start_generators() will spawn
            // exactly `worker_count` of them.
            return;
        }

        match n.cmp(&self.workers.len()) {
            std::cmp::Ordering::Greater => {
                for i in self.workers.len()..n {
                    let handle = spawn_worker(
                        i as u64,
                        self.base_seed,
                        self.view_handle.clone(),
                        self.ack_gate.clone(),
                    );
                    match self.status {
                        CoordinatorStatus::Run => handle.control.resume(),
                        CoordinatorStatus::Pause => handle.control.pause(),
                        CoordinatorStatus::Stop => unreachable!(),
                    }
                    self.workers.push(handle);
                }
            }
            std::cmp::Ordering::Less => {
                let extra = self.workers.split_off(n);
                self.ack_gate.reset();
                for w in &extra {
                    w.control.stop();
                }
                self.ack_gate.wait_for(extra.len());
                for w in extra {
                    w.join();
                }
            }
            std::cmp::Ordering::Equal => {}
        }
    }

    pub fn start_generators(&mut self) {
        if self.status != CoordinatorStatus::Stop {
            return;
        }
        for i in 0..self.worker_count {
            let handle = spawn_worker(
                i as u64,
                self.base_seed,
                self.view_handle.clone(),
                self.ack_gate.clone(),
            );
            handle.control.resume();
            self.workers.push(handle);
        }
        self.status = CoordinatorStatus::Run;
        info!(target: "buddha.coordinator", workers = self.worker_count, "started");
        self.emit(Event::WorkersStarted);
    }

    pub fn stop_generators(&mut self) {
        if self.status == CoordinatorStatus::Stop {
            return;
        }
        let was_run = self.status == CoordinatorStatus::Run;
        self.ack_gate.reset();
        for w in &self.workers {
            w.control.stop();
        }
        if was_run {
            self.ack_gate.wait_for(self.workers.len());
        }
        for w in self.workers.drain(..) {
            w.join();
        }
        self.status = CoordinatorStatus::Stop;
        info!(target: "buddha.coordinator", "stopped");
        self.emit(Event::WorkersStopped);
    }

    pub fn pause_generators(&mut self) {
        if self.status != CoordinatorStatus::Run {
            return;
        }
        self.ack_gate.reset();
        for w in &self.workers {
            w.control.pause();
        }
        self.ack_gate.wait_for(self.workers.len());
        self.status = CoordinatorStatus::Pause;
    }

    pub fn resume_generators(&mut self) {
        if self.status != CoordinatorStatus::Pause {
            return;
        }
        for w in &self.workers {
            w.control.resume();
        }
        self.status = CoordinatorStatus::Run;
    }

    /// spec.md §4.7 `updateRgbImage`: reduce every worker's accumulator
    /// into `merged`, tone-map it, and emit the result.
    pub fn update_rgb_image(&mut self) {
        self.merged.iter_mut().for_each(|v| *v = 0);
        for w in &self.workers {
            w.control.add_into(&mut self.merged);
        }
        let frame = tone_map(&self.merged, &self.view, &self.tone_map);
        let frame = Arc::new(frame);
        self.frame = Some((*frame).clone());
        self.emit(Event::FrameReady(frame));
    }

    pub fn set_contrast(&mut self, contrast: u32) {
        self.tone_map.set_contrast(contrast);
    }

    pub fn set_lightness(&mut self, lightness: u32) {
        self.tone_map.set_lightness(lightness);
    }

    pub fn save_screenshot(&mut self, path: PathBuf) {
        match self.encode_screenshot(&path) {
            Ok(()) => self.emit(Event::ScreenshotSaved(path)),
            Err(e) => self.emit(Event::ScreenshotFailed(e.to_string())),
        }
    }

    fn encode_screenshot(&self, path: &PathBuf) -> CoreResult<()> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| CoreError::Encode("no frame rendered yet".to_string()))?;

        let mut rgb = Vec::with_capacity(frame.pixels.len() * 3);
        for &word in &frame.pixels {
            rgb.push(((word >> 16) & 0xFF) as u8);
            rgb.push(((word >> 8) & 0xFF) as u8);
            rgb.push((word & 0xFF) as u8);
        }

        image::save_buffer(path, &rgb, frame.width, frame.height, image::ColorType::Rgb8)
            .map_err(|e| match e {
                image::ImageError::IoError(source) => CoreError::Io { path: path.clone(), source },
                other => CoreError::Encode(other.to_string()),
            })
    }

    /// Dispatch one host `Command`, validating and rejecting malformed
    /// `Set` requests rather than propagating a `Result` through the
    /// event loop.
    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Set { center_re, center_im, scale, windows, width, height, pause } => {
                match ViewParams::derive(center_re, center_im, scale, width, height, windows) {
                    Ok(view) => self.set(view, pause),
                    Err(e) => {
                        warn!(target: "buddha.coordinator", error = %e, "rejected set command");
                        self.emit(Event::CommandRejected(e.to_string()));
                    }
                }
            }
            Command::Start => self.start_generators(),
            Command::Stop => self.stop_generators(),
            Command::Pause => self.pause_generators(),
            Command::Resume => self.resume_generators(),
            Command::ChangeThreads(n) => self.change_thread_number(n),
            Command::UpdateImage => self.update_rgb_image(),
            Command::SetContrast(c) => self.set_contrast(c),
            Command::SetLightness(l) => self.set_lightness(l),
            Command::SaveScreenshot(path) => self.save_screenshot(path),
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop_generators();
    }
}

/// Owns the coordinator's dedicated thread and the command queue feeding
/// it, so the host never touches worker state directly (spec.md §6).
pub struct Host {
    commands: Sender<Command>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Host {
    pub fn launch(initial_view: ViewParams, worker_count: usize, base_seed: u64) -> (Self, Receiver<Event>) {
        let (cmd_tx, cmd_rx) = unbounded::<Command>();
        let (evt_tx, evt_rx) = unbounded::<Event>();

        let thread = std::thread::Builder::new()
            .name("buddha-coordinator".to_string())
            .spawn(move || {
                let mut coordinator = Coordinator::new(initial_view, worker_count, base_seed, evt_tx);
                for cmd in cmd_rx.iter() {
                    coordinator.handle(cmd);
                }
            })
            .expect("failed to spawn coordinator thread");

        (Host { commands: cmd_tx, thread: Some(thread) }, evt_rx)
    }

    pub fn send(&self, cmd: Command) {
        let _ = self.commands.send(cmd);
    }

    /// Close the command queue and wait for the coordinator thread
    /// (and, transitively, all workers) to exit.
    pub fn shutdown(mut self) {
        drop(self.commands.clone());
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}
