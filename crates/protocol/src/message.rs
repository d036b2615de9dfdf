use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Surface placeholder for messages that crossed the JSON wire.
///
/// A real surface can only be handed over in-process, so decoded
/// `initialize` messages carry this instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detached;

/// Host -> worker messages.
///
/// `S` is the surface type moved into the worker by `Initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase",
    bound(serialize = "", deserialize = "S: Default")
)]
pub enum HostMessage<S = Detached> {
    /// Hands the drawing surface to the worker. Sent exactly once.
    Initialize {
        #[serde(skip)]
        surface: S,
        pixel_ratio: f64,
    },
    Resize {
        width: u32,
        height: u32,
        pixel_ratio: f64,
    },
    Keydown {
        key: String,
    },
    Keyup {
        key: String,
    },
    StartMoving {
        direction: Direction,
    },
    StopMoving {
        direction: Direction,
    },
    /// Pointer drag delta in CSS/logical pixels.
    PointerMoved {
        #[serde(rename = "x", alias = "dx")]
        dx: f64,
        #[serde(rename = "y", alias = "dy")]
        dy: f64,
    },
    SetTheme {
        light_theme: bool,
    },
    SetMaxBounces {
        max_bounces: u32,
    },
    SetAntialiasingSamplesPerPixel {
        antialiasing_samples_per_pixel: u32,
    },
    /// Field of view in radians.
    SetFieldOfView {
        field_of_view: f64,
    },
    #[serde(other)]
    Unknown,
}

impl<S> HostMessage<S> {
    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Resize { .. } => "resize",
            Self::Keydown { .. } => "keydown",
            Self::Keyup { .. } => "keyup",
            Self::StartMoving { .. } => "start-moving",
            Self::StopMoving { .. } => "stop-moving",
            Self::PointerMoved { .. } => "pointer-moved",
            Self::SetTheme { .. } => "set-theme",
            Self::SetMaxBounces { .. } => "set-max-bounces",
            Self::SetAntialiasingSamplesPerPixel { .. } => "set-antialiasing-samples-per-pixel",
            Self::SetFieldOfView { .. } => "set-field-of-view",
            Self::Unknown => "unknown",
        }
    }

    /// Replace the surface payload, keeping every other message as is.
    ///
    /// Returns the old surface when the message was `Initialize`.
    pub fn with_surface<T>(self, surface: T) -> (HostMessage<T>, Option<S>) {
        match self {
            Self::Initialize {
                surface: old,
                pixel_ratio,
            } => (
                HostMessage::Initialize {
                    surface,
                    pixel_ratio,
                },
                Some(old),
            ),
            other => (other.without_surface(), None),
        }
    }

    /// Convert a message that carries no surface to another surface type.
    ///
    /// `Initialize` degrades to `Unknown`.
    fn without_surface<T>(self) -> HostMessage<T> {
        match self {
            Self::Initialize { .. } | Self::Unknown => HostMessage::Unknown,
            Self::Resize {
                width,
                height,
                pixel_ratio,
            } => HostMessage::Resize {
                width,
                height,
                pixel_ratio,
            },
            Self::Keydown { key } => HostMessage::Keydown { key },
            Self::Keyup { key } => HostMessage::Keyup { key },
            Self::StartMoving { direction } => HostMessage::StartMoving { direction },
            Self::StopMoving { direction } => HostMessage::StopMoving { direction },
            Self::PointerMoved { dx, dy } => HostMessage::PointerMoved { dx, dy },
            Self::SetTheme { light_theme } => HostMessage::SetTheme { light_theme },
            Self::SetMaxBounces { max_bounces } => HostMessage::SetMaxBounces { max_bounces },
            Self::SetAntialiasingSamplesPerPixel {
                antialiasing_samples_per_pixel,
            } => HostMessage::SetAntialiasingSamplesPerPixel {
                antialiasing_samples_per_pixel,
            },
            Self::SetFieldOfView { field_of_view } => HostMessage::SetFieldOfView { field_of_view },
        }
    }
}

/// Worker -> host notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WorkerMessage {
    /// No usable GPU adapter or device. Sent once; the worker stops.
    WebgpuUnsupported,
    /// Initialization finished and frames are being drawn.
    Ready,
    /// The device was lost after initialization; the worker stopped drawing.
    DeviceLost,
    #[serde(other)]
    Unknown,
}
