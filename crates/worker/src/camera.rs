use glam::{DVec2, DVec3};
use orbtrace_protocol::Direction;

use crate::config::RenderConfig;
use crate::input::InputState;

/// Radians per millisecond while a rotate key is held.
pub const ANGULAR_RATE: f64 = std::f64::consts::PI / 180.0 / 10.0;
/// World units per millisecond while a move key is held.
pub const LINEAR_RATE: f64 = 0.005;

/// Camera position and `(yaw, pitch)` rotation in radians.
///
/// Z is up. Yaw 0 looks along +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: DVec3,
    pub rotation: DVec2,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: DVec3::new(-5.0, 0.0, 5.0),
            rotation: DVec2::ZERO,
        }
    }
}

/// Integrates held keys and move directions into camera motion.
///
/// Motion is linear in elapsed time, so one long step equals several short
/// ones for constant input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    pub angular_rate: f64,
    pub linear_rate: f64,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            angular_rate: ANGULAR_RATE,
            linear_rate: LINEAR_RATE,
        }
    }
}

impl CameraController {
    /// Advance the camera by `elapsed_ms` of held input.
    ///
    /// Rotation is applied first; translation then uses the updated yaw.
    /// Held rotate keys resolve by priority (left over right, up over down);
    /// opposite move directions cancel.
    pub fn integrate(&self, camera: &mut CameraState, input: &InputState, elapsed_ms: f64) {
        let turn = self.angular_rate * elapsed_ms;
        camera.rotation.x += input.key_priority("ArrowLeft", "ArrowRight") * turn;
        camera.rotation.y += input.key_priority("ArrowUp", "ArrowDown") * turn;

        let step = self.linear_rate * elapsed_ms;
        let vertical = input.move_axis(Direction::Up, Direction::Down);
        let forward = input.move_axis(Direction::Forward, Direction::Backward);
        let strafe = input.move_axis(Direction::Left, Direction::Right);

        let (sin, cos) = camera.rotation.x.sin_cos();
        camera.position += DVec3::new(
            forward * cos - strafe * sin,
            forward * sin + strafe * cos,
            vertical,
        ) * step;
    }
}

/// Apply a pointer drag directly to the rotation, independent of frame time.
///
/// One surface height of drag turns the camera by twice the field of view.
pub fn apply_pointer_delta(camera: &mut CameraState, config: &RenderConfig, dx: f64, dy: f64) {
    if config.surface_height == 0 {
        return;
    }
    let height = f64::from(config.surface_height);
    camera.rotation.x += dx * config.pixel_ratio * 2.0 * config.field_of_view / height;
    camera.rotation.y += dy * config.pixel_ratio * 2.0 * config.field_of_view / height;
}
