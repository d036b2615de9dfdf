use serde::{Deserialize, Serialize};

/// A camera move direction, as sent by on-screen buttons or mapped keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Up,
        Direction::Down,
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Movement key bound to a direction (`q e w s a d`).
    pub fn for_key(key: &str) -> Option<Self> {
        match key {
            "q" => Some(Self::Down),
            "e" => Some(Self::Up),
            "w" => Some(Self::Forward),
            "s" => Some(Self::Backward),
            "a" => Some(Self::Left),
            "d" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Down => "q",
            Self::Up => "e",
            Self::Forward => "w",
            Self::Backward => "s",
            Self::Left => "a",
            Self::Right => "d",
        }
    }
}
