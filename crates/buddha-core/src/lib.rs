//! Parallel Metropolis-Hastings Buddhabrot sampling engine.
//!
//! Samples escape orbits of the Mandelbrot iteration `z' = z^2 + c` with
//! a Metropolis-Hastings walk biased toward long orbits, deposits each
//! orbit's visited points into a three-channel hit-count buffer (one
//! channel per iteration-count window), and tone-maps the result into an
//! RGB frame. A coordinator owns a pool of worker threads and a
//! publish/subscribe view handle so the rendered region, iteration
//! windows, and worker count can change while sampling runs.

pub mod ack_gate;
pub mod command;
pub mod complex;
pub mod coordinator;
pub mod deposit;
pub mod error;
pub mod orbit;
pub mod rng;
pub mod sampler;
pub mod seed;
pub mod tonemap;
pub mod view;
pub mod worker;

pub use command::{Command, Event};
pub use complex::Complex64;
pub use coordinator::{Coordinator, CoordinatorStatus, Host};
pub use deposit::RawBuffer;
pub use error::{CoreError, CoreResult};
pub use tonemap::{Frame, ToneMapConfig};
pub use view::{IterWindow, ViewHandle, ViewParams};
pub use worker::{WorkerControl, WorkerHandle, WorkerStatus};
