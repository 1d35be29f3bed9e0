//! Host-facing command/event types. See spec.md §6.
//!
//! `Command`s are queued in and processed in order by the coordinator's
//! single serial consumer; `Event`s are emitted asynchronously back to
//! the host. Neither runs on the host's UI thread.

use std::path::PathBuf;
use std::sync::Arc;

use crate::tonemap::Frame;
use crate::view::IterWindow;

#[derive(Clone, Debug)]
pub enum Command {
    Set {
        center_re: f64,
        center_im: f64,
        scale: f64,
        windows: [IterWindow; 3],
        width: u32,
        height: u32,
        pause: bool,
    },
    Start,
    Stop,
    Pause,
    Resume,
    ChangeThreads(usize),
    UpdateImage,
    SetContrast(u32),
    SetLightness(u32),
    SaveScreenshot(PathBuf),
}

#[derive(Clone, Debug)]
pub enum Event {
    FrameReady(Arc<Frame>),
    WorkersStarted,
    WorkersStopped,
    ViewApplied,
    ScreenshotSaved(PathBuf),
    ScreenshotFailed(String),
    CommandRejected(String),
}
