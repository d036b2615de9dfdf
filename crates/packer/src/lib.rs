//! Struct Buffer Packer: padded byte layouts for GPU-visible structs.
//!
//! Every field is padded to the next power of two of its byte size and placed
//! at an offset aligned to that padded size. The struct's total size is
//! rounded up to a multiple of its largest padded field so it can be used as
//! an array stride.
//!
//! # Invariants
//! - Offsets never overlap and each is a multiple of its field's padded size.
//! - The layout that sizes a GPU allocation is the one used to pack its bytes.
//! - An empty layout has size 0.

mod field;
mod layout;

pub use field::{Encoded, FieldValue};
pub use layout::{FieldSlot, LayoutError, StructLayout, padded_size};
