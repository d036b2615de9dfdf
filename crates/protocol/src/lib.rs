//! Message protocol between the host (window + input) and the render worker.
//!
//! Host messages are a closed tagged union. On the JSON wire the tag is the
//! `type` field in kebab-case and payload fields are camelCase. Tags this
//! build does not know decode to [`HostMessage::Unknown`] and are ignored by
//! the worker.
//!
//! # Invariants
//! - `initialize` is the only message that carries an owned surface; the
//!   surface never appears on the JSON wire.
//! - Messages on one channel are delivered in send order.

mod direction;
mod message;
mod wire;

pub use direction::Direction;
pub use message::{Detached, HostMessage, WorkerMessage};
pub use wire::{ProtocolError, decode_host, decode_worker, encode_host, encode_worker};
