//! Render worker core: everything the worker thread does that is not wgpu.
//!
//! The worker owns a [`WorkerState`] aggregate (camera, input, render config,
//! scene) and threads it explicitly through the message router and the frame
//! scheduler. GPU access sits behind [`GpuProvider`] and [`FrameTarget`] so the
//! whole loop runs headless in tests.
//!
//! # Invariants
//! - State has a single writer: the worker thread.
//! - Host messages are applied between frames, never during one.
//! - The uniform and entity layouts that size GPU buffers are the ones used to
//!   pack every write into them.
//! - After a capability failure no frame is ever submitted.

pub mod camera;
pub mod config;
pub mod frame;
pub mod handshake;
pub mod input;
pub mod router;
pub mod runtime;
pub mod scene;
pub mod scheduler;
pub mod state;

pub use camera::{CameraController, CameraState};
pub use config::RenderConfig;
pub use frame::FrameLayouts;
pub use handshake::{GpuProvider, Handshake, InitError, InitState, Outbox};
pub use input::InputState;
pub use router::{Routed, dispatch};
pub use runtime::{SKIP_BACKOFF, WorkerExit, WorkerOptions, run_worker};
pub use scene::{Scene, SceneEntity};
pub use scheduler::{
    Clock, FrameError, FrameScheduler, FrameTarget, ManualClock, RecordingTarget, StopToken,
    SystemClock,
};
pub use state::WorkerState;
