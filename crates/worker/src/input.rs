use std::collections::HashSet;

use orbtrace_protocol::Direction;

/// Keys currently held and move directions currently active.
///
/// Membership only; order and repeat counts are irrelevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pressed_keys: HashSet<String>,
    move_directions: HashSet<Direction>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: impl Into<String>) {
        self.pressed_keys.insert(key.into());
    }

    pub fn release(&mut self, key: &str) {
        self.pressed_keys.remove(key);
    }

    pub fn start_moving(&mut self, direction: Direction) {
        self.move_directions.insert(direction);
    }

    pub fn stop_moving(&mut self, direction: Direction) {
        self.move_directions.remove(&direction);
    }

    pub fn is_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    /// A direction is active from its button or its movement key.
    pub fn is_moving(&self, direction: Direction) -> bool {
        self.move_directions.contains(&direction) || self.is_pressed(direction.key())
    }

    /// +1 while `first` is held, else -1 while `second` is held, else 0.
    ///
    /// `first` wins when both are held.
    pub fn key_priority(&self, first: &str, second: &str) -> f64 {
        if self.is_pressed(first) {
            1.0
        } else if self.is_pressed(second) {
            -1.0
        } else {
            0.0
        }
    }

    /// Signed sum of two opposite directions; both held cancel out.
    pub fn move_axis(&self, positive: Direction, negative: Direction) -> f64 {
        axis(self.is_moving(positive), self.is_moving(negative))
    }
}

fn axis(positive: bool, negative: bool) -> f64 {
    f64::from(i8::from(positive) - i8::from(negative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        input.press("ArrowLeft");
        input.press("ArrowLeft");
        assert!(input.is_pressed("ArrowLeft"));
        input.release("ArrowLeft");
        assert!(!input.is_pressed("ArrowLeft"));
        input.release("never-pressed");
    }

    #[test]
    fn movement_key_counts_as_direction() {
        let mut input = InputState::new();
        input.press("w");
        assert!(input.is_moving(Direction::Forward));
        input.release("w");
        input.start_moving(Direction::Forward);
        assert!(input.is_moving(Direction::Forward));
        input.stop_moving(Direction::Forward);
        assert!(!input.is_moving(Direction::Forward));
    }

    #[test]
    fn opposite_directions_cancel_but_keys_take_priority() {
        let mut input = InputState::new();
        input.start_moving(Direction::Left);
        input.start_moving(Direction::Right);
        assert_eq!(input.move_axis(Direction::Left, Direction::Right), 0.0);

        input.press("ArrowDown");
        assert_eq!(input.key_priority("ArrowUp", "ArrowDown"), -1.0);
        input.press("ArrowUp");
        assert_eq!(input.key_priority("ArrowUp", "ArrowDown"), 1.0);
        input.release("ArrowUp");
        input.release("ArrowDown");
        assert_eq!(input.key_priority("ArrowUp", "ArrowDown"), 0.0);
    }
}
