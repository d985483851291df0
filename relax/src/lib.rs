//! ReLAX: a temporal + spatial denoiser for ray-traced diffuse and specular
//! illumination.
//!
//! Each frame, [`Viewport::denoise()`] snapshots the [`Config`] into
//! [`Settings`] and runs a fixed sequence of compute passes (prepass,
//! reprojection, disocclusion fix, history clamping, firefly suppression,
//! spatial variance estimation, à-trous filtering and split-screen) on a
//! [`FrameGraph`], threading the viewport's [`History`] from one frame into
//! the next.
//!
//! The graph is what actually executes passes; this crate ships two of them:
//! [`CpuGraph`] (a reference executor, handy for testing) and [`WgpuGraph`].

mod camera;
mod config;
mod frame_pool;
mod graph;
mod history;
pub mod pipeline;
mod settings;
mod utils;
mod viewport;

pub use relax_gpu as gpu;

pub use self::camera::*;
pub use self::config::*;
pub use self::frame_pool::*;
pub use self::graph::*;
pub use self::history::*;
pub use self::pipeline::{DenoiseFlags, DenoisedOutputs, FrameInputs};
pub use self::settings::*;
pub use self::viewport::*;
