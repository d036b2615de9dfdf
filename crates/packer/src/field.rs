/// A typed scalar or vector field destined for a GPU struct.
///
/// Vector components are 32-bit. Booleans travel as `U32` 0/1, matching how
/// shaders read them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    F32(f32),
    U32(u32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

impl FieldValue {
    pub fn flag(value: bool) -> Self {
        Self::U32(u32::from(value))
    }

    /// Little-endian encoding of the field, without padding.
    pub fn encode(&self) -> Encoded {
        let (words, count) = match *self {
            Self::F32(v) => ([v.to_bits(), 0, 0], 1),
            Self::U32(v) => ([v, 0, 0], 1),
            Self::Vec2([x, y]) => ([x.to_bits(), y.to_bits(), 0], 2),
            Self::Vec3([x, y, z]) => ([x.to_bits(), y.to_bits(), z.to_bits()], 3),
        };
        Encoded {
            words: words.map(u32::to_le),
            len: count * 4,
        }
    }
}

/// Encoded bytes of one [`FieldValue`].
#[derive(Debug, Clone, Copy)]
pub struct Encoded {
    words: [u32; 3],
    len: usize,
}

impl Encoded {
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }
}
