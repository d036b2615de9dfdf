//! wgpu backend for the render worker.
//!
//! [`WgpuProvider`] turns a handed-over surface into a [`GpuRenderer`]: it
//! requests adapter and device, compiles the shader, sizes the uniform and
//! entity buffers from the worker's layouts, and builds the pipeline. The
//! renderer draws one full-screen triangle strip per frame.
//!
//! # Invariants
//! - Buffer sizes come from the same `StructLayout`s the scheduler packs with.
//! - Layouts that exceed the device's binding limits are rejected at creation.
//! - The surface is owned by the renderer after hand-off.

mod device;
mod renderer;
mod shaders;

pub use device::{SurfaceHandoff, WgpuProvider};
pub use renderer::GpuRenderer;
pub use shaders::{BUILTIN_SHADER, ShaderSource};
