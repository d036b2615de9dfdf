//! Translation of window input into host messages.

use orbtrace_protocol::{Direction, HostMessage};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::keyboard::{Key, NamedKey};

/// DOM-style name of a logical key, e.g. `ArrowLeft`, `w`, ` `.
pub fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_string()),
        Key::Named(NamedKey::Space) => Some(" ".to_owned()),
        Key::Named(named) => Some(format!("{named:?}")),
        _ => None,
    }
}

/// Message for a key press or release.
///
/// Movement keys become `start-moving` / `stop-moving`; everything else is
/// forwarded by name.
pub fn key_message<S>(name: &str, pressed: bool) -> HostMessage<S> {
    match Direction::for_key(&name.to_lowercase()) {
        Some(direction) if pressed => HostMessage::StartMoving { direction },
        Some(direction) => HostMessage::StopMoving { direction },
        None if pressed => HostMessage::Keydown {
            key: name.to_owned(),
        },
        None => HostMessage::Keyup {
            key: name.to_owned(),
        },
    }
}

/// Surface size after the resolution divisor, with the matching pixel ratio.
pub fn resize_message<S>(
    size: PhysicalSize<u32>,
    scale_factor: f64,
    divisor: u32,
) -> HostMessage<S> {
    let divisor = divisor.max(1);
    HostMessage::Resize {
        width: (size.width / divisor).max(1),
        height: (size.height / divisor).max(1),
        pixel_ratio: scale_factor / f64::from(divisor),
    }
}

/// Left-button drag tracking.
#[derive(Debug, Default)]
pub struct PointerDrag {
    dragging: bool,
    last: Option<PhysicalPosition<f64>>,
}

impl PointerDrag {
    pub fn set_pressed(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    /// Record a cursor position; returns the logical-pixel delta while dragging.
    pub fn moved(
        &mut self,
        position: PhysicalPosition<f64>,
        scale_factor: f64,
    ) -> Option<(f64, f64)> {
        let previous = self.last.replace(position);
        if !self.dragging {
            return None;
        }
        let previous = previous?;
        let scale = if scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Some((
            (position.x - previous.x) / scale,
            (position.y - previous.y) / scale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbtrace_protocol::Detached;

    #[test]
    fn named_keys_use_dom_names() {
        assert_eq!(
            key_name(&Key::Named(NamedKey::ArrowLeft)).as_deref(),
            Some("ArrowLeft")
        );
        assert_eq!(key_name(&Key::Named(NamedKey::Space)).as_deref(), Some(" "));
        assert_eq!(key_name(&Key::Character("w".into())).as_deref(), Some("w"));
    }

    #[test]
    fn movement_keys_become_move_messages() {
        assert_eq!(
            key_message::<Detached>("w", true),
            HostMessage::StartMoving {
                direction: Direction::Forward
            }
        );
        assert_eq!(
            key_message::<Detached>("Q", false),
            HostMessage::StopMoving {
                direction: Direction::Down
            }
        );
        assert_eq!(
            key_message::<Detached>("ArrowUp", true),
            HostMessage::Keydown {
                key: "ArrowUp".into()
            }
        );
        assert_eq!(
            key_message::<Detached>("ArrowUp", false),
            HostMessage::Keyup {
                key: "ArrowUp".into()
            }
        );
    }

    #[test]
    fn resize_applies_divisor() {
        let msg = resize_message::<Detached>(PhysicalSize::new(1280, 720), 2.0, 2);
        assert_eq!(
            msg,
            HostMessage::Resize {
                width: 640,
                height: 360,
                pixel_ratio: 1.0
            }
        );
        let zero = resize_message::<Detached>(PhysicalSize::new(0, 0), 1.0, 0);
        assert_eq!(
            zero,
            HostMessage::Resize {
                width: 1,
                height: 1,
                pixel_ratio: 1.0
            }
        );
    }

    #[test]
    fn drag_reports_logical_deltas() {
        let mut drag = PointerDrag::default();
        assert_eq!(drag.moved(PhysicalPosition::new(10.0, 10.0), 2.0), None);
        drag.set_pressed(true);
        assert_eq!(
            drag.moved(PhysicalPosition::new(30.0, 14.0), 2.0),
            Some((10.0, 2.0))
        );
        drag.set_pressed(false);
        assert_eq!(drag.moved(PhysicalPosition::new(50.0, 50.0), 2.0), None);
    }
}
