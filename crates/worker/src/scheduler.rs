use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use orbtrace_packer::LayoutError;

use crate::camera::CameraController;
use crate::config::RenderConfig;
use crate::frame::{FrameLayouts, entity_fields, uniform_fields};
use crate::state::WorkerState;

/// Millisecond time source for the frame loop.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic wall clock, zero at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deterministic clock that advances by a fixed interval on every read.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
    step: f64,
}

impl ManualClock {
    pub fn new(start_ms: f64, step_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
            step: step_ms,
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Shared flag that ends the frame loop at the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Errors from a single frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame was dropped; the next one may succeed.
    #[error("frame skipped: {0}")]
    Skipped(String),
    /// The device can no longer draw.
    #[error("device lost: {0}")]
    DeviceLost(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl FrameError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Where a frame's bytes and draw call go.
///
/// Buffer writes are queued; `present` encodes the full-screen pass, submits
/// it, and shows the result.
pub trait FrameTarget {
    fn write_uniforms(&mut self, bytes: &[u8]);
    fn write_entity(&mut self, offset: u64, bytes: &[u8]);
    fn present(&mut self, config: &RenderConfig) -> Result<(), FrameError>;
}

/// In-memory frame target holding the backing bytes of both buffers.
#[derive(Debug, Default, Clone)]
pub struct RecordingTarget {
    pub uniforms: Vec<u8>,
    pub entities: Vec<u8>,
    pub presents: u64,
    /// Error returned by the next `present` call, if any.
    pub fail_next: Option<String>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.uniforms.get(offset..offset + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn uniform_f32(&self, offset: usize) -> Option<f32> {
        self.uniform_u32(offset).map(f32::from_bits)
    }

    pub fn entity_f32(&self, offset: usize) -> Option<f32> {
        let bytes = self.entities.get(offset..offset + 4)?;
        Some(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl FrameTarget for RecordingTarget {
    fn write_uniforms(&mut self, bytes: &[u8]) {
        if self.uniforms.len() < bytes.len() {
            self.uniforms.resize(bytes.len(), 0);
        }
        self.uniforms[..bytes.len()].copy_from_slice(bytes);
    }

    fn write_entity(&mut self, offset: u64, bytes: &[u8]) {
        let start = offset as usize;
        let end = start + bytes.len();
        if self.entities.len() < end {
            self.entities.resize(end, 0);
        }
        self.entities[start..end].copy_from_slice(bytes);
    }

    fn present(&mut self, _config: &RenderConfig) -> Result<(), FrameError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(FrameError::Skipped(reason));
        }
        self.presents += 1;
        Ok(())
    }
}

/// Per-frame driver: integrate, pack, write, draw.
#[derive(Debug)]
pub struct FrameScheduler {
    layouts: FrameLayouts,
    controller: CameraController,
    previous_timestamp: Option<f64>,
    frames: u64,
    uniform_scratch: Vec<u8>,
    entity_scratch: Vec<u8>,
}

impl FrameScheduler {
    pub fn new(layouts: FrameLayouts, controller: CameraController) -> Self {
        let uniform_scratch = vec![0; layouts.uniform.size()];
        let entity_scratch = vec![0; layouts.entity.size()];
        Self {
            layouts,
            controller,
            previous_timestamp: None,
            frames: 0,
            uniform_scratch,
            entity_scratch,
        }
    }

    /// Set the baseline the first frame's elapsed time is measured from.
    pub fn start(&mut self, timestamp_ms: f64) {
        self.previous_timestamp = Some(timestamp_ms);
    }

    /// Frames stepped so far, including failed ones.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame at `timestamp_ms`.
    ///
    /// The timestamp becomes the next frame's baseline even when drawing
    /// fails, so a dropped frame does not make the camera jump.
    pub fn step<T: FrameTarget>(
        &mut self,
        state: &mut WorkerState,
        timestamp_ms: f64,
        target: &mut T,
    ) -> Result<(), FrameError> {
        let _span = tracing::trace_span!("frame", index = self.frames).entered();
        let elapsed = timestamp_ms - self.previous_timestamp.unwrap_or(timestamp_ms);
        self.previous_timestamp = Some(timestamp_ms);
        self.frames += 1;

        self.controller
            .integrate(&mut state.camera, &state.input, elapsed);

        self.layouts
            .uniform
            .pack_into(&uniform_fields(state), &mut self.uniform_scratch)?;
        target.write_uniforms(&self.uniform_scratch);

        for index in 0..state.scene.len() {
            let Some(entity) = state.scene.animated(index, timestamp_ms) else {
                continue;
            };
            self.layouts
                .entity
                .pack_into(&entity_fields(&entity), &mut self.entity_scratch)?;
            let offset = self.layouts.entity_offset(index)?;
            target.write_entity(offset, &self.entity_scratch);
        }

        tracing::trace!(elapsed, "frame packed");
        target.present(&state.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::uniform;

    fn scheduler() -> FrameScheduler {
        FrameScheduler::new(FrameLayouts::new().unwrap(), CameraController::default())
    }

    #[test]
    fn manual_clock_advances_per_read() {
        let clock = ManualClock::new(10.0, 5.0);
        assert_eq!(clock.now_ms(), 10.0);
        assert_eq!(clock.now_ms(), 15.0);
        assert_eq!(clock.now_ms(), 20.0);
    }

    #[test]
    fn stop_token_is_shared() {
        let token = StopToken::new();
        let other = token.clone();
        assert!(!other.is_stopped());
        token.stop();
        assert!(other.is_stopped());
    }

    #[test]
    fn first_frame_has_zero_elapsed_without_start() {
        let mut state = WorkerState::default();
        state.input.press("w");
        let mut target = RecordingTarget::new();
        scheduler().step(&mut state, 5000.0, &mut target).unwrap();
        assert_eq!(state.camera, crate::CameraState::default());
        assert_eq!(target.presents, 1);
    }

    #[test]
    fn elapsed_time_drives_camera() {
        let mut state = WorkerState::default();
        state.input.start_moving(orbtrace_protocol::Direction::Up);
        let mut sched = scheduler();
        sched.start(0.0);
        let mut target = RecordingTarget::new();
        sched.step(&mut state, 200.0, &mut target).unwrap();
        assert!((state.camera.position.z - 6.0).abs() < 1e-9);
        assert_eq!(target.uniform_f32(8), Some(6.0));
    }

    #[test]
    fn writes_every_entity_at_its_stride() {
        let mut state = WorkerState::default();
        let mut sched = scheduler();
        let mut target = RecordingTarget::new();
        sched.step(&mut state, 0.0, &mut target).unwrap();
        let stride = FrameLayouts::new().unwrap().entity.size();
        assert_eq!(target.entities.len(), stride * state.scene.len());
        for (i, base) in crate::scene::DEMO_SCENE.iter().enumerate() {
            assert_eq!(target.entity_f32(i * stride), Some(base.position.x));
            assert_eq!(target.entity_f32(i * stride + 16), Some(base.radius));
        }
    }

    #[test]
    fn uniform_record_reflects_config() {
        let mut state = WorkerState::default();
        state.config.max_bounces = 9;
        state.config.light_theme = true;
        state.config.surface_width = 320;
        let mut target = RecordingTarget::new();
        scheduler().step(&mut state, 0.0, &mut target).unwrap();
        let layout = FrameLayouts::new().unwrap().uniform;
        let at = |field| layout.offset(field).unwrap();
        assert_eq!(target.uniform_u32(at(uniform::MAX_BOUNCES)), Some(9));
        assert_eq!(target.uniform_u32(at(uniform::LIGHT_THEME)), Some(1));
        assert_eq!(target.uniform_f32(at(uniform::DIMENSIONS)), Some(320.0));
        assert_eq!(target.uniform_u32(at(uniform::ANTIALIASING_SAMPLES)), Some(2));
    }

    #[test]
    fn skipped_frame_still_advances_baseline() {
        let mut state = WorkerState::default();
        state.input.start_moving(orbtrace_protocol::Direction::Up);
        let mut sched = scheduler();
        sched.start(0.0);
        let mut target = RecordingTarget {
            fail_next: Some("timeout".into()),
            ..RecordingTarget::default()
        };
        let err = sched.step(&mut state, 100.0, &mut target).unwrap_err();
        assert!(!err.is_fatal());
        sched.step(&mut state, 200.0, &mut target).unwrap();
        assert!((state.camera.position.z - 6.0).abs() < 1e-9);
        assert_eq!(target.presents, 1);
        assert_eq!(sched.frames(), 2);
    }
}
