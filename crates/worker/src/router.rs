use orbtrace_protocol::HostMessage;

use crate::camera::apply_pointer_delta;
use crate::state::WorkerState;

/// Outcome of routing one host message.
#[derive(Debug, PartialEq)]
pub enum Routed<S> {
    /// The message mutated worker state.
    Applied,
    /// The tag was unknown; nothing changed.
    Ignored,
    /// An `initialize` message; the surface is handed to the caller.
    Surface(S),
}

/// Apply one host message to the worker state.
///
/// Every tag maps to exactly one state mutation. `initialize` records the
/// pixel ratio and yields the surface; the handshake decides what to do with it.
pub fn dispatch<S>(state: &mut WorkerState, msg: HostMessage<S>) -> Routed<S> {
    tracing::debug!(kind = msg.kind(), "dispatch");
    match msg {
        HostMessage::Initialize {
            surface,
            pixel_ratio,
        } => {
            state.config.pixel_ratio = pixel_ratio;
            return Routed::Surface(surface);
        }
        HostMessage::Resize {
            width,
            height,
            pixel_ratio,
        } => {
            state.config.surface_width = width;
            state.config.surface_height = height;
            state.config.pixel_ratio = pixel_ratio;
        }
        HostMessage::Keydown { key } => state.input.press(key),
        HostMessage::Keyup { key } => state.input.release(&key),
        HostMessage::StartMoving { direction } => state.input.start_moving(direction),
        HostMessage::StopMoving { direction } => state.input.stop_moving(direction),
        HostMessage::PointerMoved { dx, dy } => {
            apply_pointer_delta(&mut state.camera, &state.config, dx, dy)
        }
        HostMessage::SetTheme { light_theme } => state.config.light_theme = light_theme,
        HostMessage::SetMaxBounces { max_bounces } => state.config.max_bounces = max_bounces,
        HostMessage::SetAntialiasingSamplesPerPixel {
            antialiasing_samples_per_pixel,
        } => state.config.antialiasing_samples = antialiasing_samples_per_pixel,
        HostMessage::SetFieldOfView { field_of_view } => {
            state.config.field_of_view = field_of_view
        }
        HostMessage::Unknown => {
            tracing::debug!("ignoring unknown message");
            return Routed::Ignored;
        }
    }
    Routed::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbtrace_protocol::{Detached, Direction};

    fn send(state: &mut WorkerState, msg: HostMessage) -> Routed<Detached> {
        dispatch(state, msg)
    }

    #[test]
    fn config_messages_update_config() {
        let mut state = WorkerState::default();
        send(&mut state, HostMessage::SetMaxBounces { max_bounces: 7 });
        send(&mut state, HostMessage::SetTheme { light_theme: true });
        send(
            &mut state,
            HostMessage::SetAntialiasingSamplesPerPixel {
                antialiasing_samples_per_pixel: 3,
            },
        );
        send(&mut state, HostMessage::SetFieldOfView { field_of_view: 1.0 });
        assert_eq!(state.config.max_bounces, 7);
        assert!(state.config.light_theme);
        assert_eq!(state.config.antialiasing_samples, 3);
        assert_eq!(state.config.field_of_view, 1.0);
    }

    #[test]
    fn resize_updates_dimensions_only() {
        let mut state = WorkerState::default();
        let camera = state.camera;
        send(
            &mut state,
            HostMessage::Resize {
                width: 640,
                height: 480,
                pixel_ratio: 2.0,
            },
        );
        assert_eq!(state.config.surface_width, 640);
        assert_eq!(state.config.surface_height, 480);
        assert_eq!(state.config.pixel_ratio, 2.0);
        assert_eq!(state.camera, camera);
    }

    #[test]
    fn input_messages_update_input() {
        let mut state = WorkerState::default();
        send(&mut state, HostMessage::Keydown { key: "ArrowLeft".into() });
        send(
            &mut state,
            HostMessage::StartMoving {
                direction: Direction::Up,
            },
        );
        assert!(state.input.is_pressed("ArrowLeft"));
        assert!(state.input.is_moving(Direction::Up));

        send(&mut state, HostMessage::Keyup { key: "ArrowLeft".into() });
        send(
            &mut state,
            HostMessage::StopMoving {
                direction: Direction::Up,
            },
        );
        assert!(!state.input.is_pressed("ArrowLeft"));
        assert!(!state.input.is_moving(Direction::Up));
    }

    #[test]
    fn pointer_moves_rotation_directly() {
        let mut state = WorkerState::default();
        state.config.surface_height = 1000;
        state.config.field_of_view = std::f64::consts::FRAC_PI_2;
        send(&mut state, HostMessage::PointerMoved { dx: 10.0, dy: 0.0 });
        assert!(state.camera.rotation.x > 0.0);
        assert_eq!(state.camera.rotation.y, 0.0);
    }

    #[test]
    fn initialize_yields_surface() {
        let mut state = WorkerState::default();
        let routed = dispatch(
            &mut state,
            HostMessage::Initialize {
                surface: "surface",
                pixel_ratio: 1.25,
            },
        );
        assert_eq!(routed, Routed::Surface("surface"));
        assert_eq!(state.config.pixel_ratio, 1.25);
    }

    #[test]
    fn unknown_is_ignored() {
        let mut state = WorkerState::default();
        let before = state.clone();
        assert_eq!(send(&mut state, HostMessage::Unknown), Routed::Ignored);
        assert_eq!(state, before);
    }
}
