use crate::field::FieldValue;

/// Errors from layout computation and packing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("field {index} has zero size")]
    ZeroSizedField { index: usize },
    #[error("layout size overflows usize")]
    Overflow,
    #[error("expected {expected} fields, got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },
    #[error("field {index} is {actual} bytes, layout reserves a {expected}-byte field")]
    FieldSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("destination holds {capacity} bytes, layout needs {required}")]
    DestinationTooSmall { required: usize, capacity: usize },
    #[error("layout needs {required} bytes, capacity is {capacity}")]
    ExceedsCapacity { required: u64, capacity: u64 },
}

/// Round a field size up to the next power of two.
///
/// Returns `None` for zero-sized fields and on overflow.
pub fn padded_size(size: usize) -> Option<usize> {
    if size == 0 {
        return None;
    }
    size.checked_next_power_of_two()
}

/// Placement of one field inside a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub offset: usize,
    /// Unpadded size as declared.
    pub len: usize,
    /// Reserved span and alignment.
    pub padded: usize,
}

/// Byte layout of a GPU struct computed from its field sizes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructLayout {
    slots: Vec<FieldSlot>,
    size: usize,
}

impl StructLayout {
    /// Compute the layout for an ordered list of field byte-sizes.
    pub fn new(sizes: &[usize]) -> Result<Self, LayoutError> {
        let mut slots = Vec::with_capacity(sizes.len());
        let mut cursor = 0usize;
        let mut max_padded = 0usize;

        for (index, &len) in sizes.iter().enumerate() {
            let padded = match padded_size(len) {
                Some(p) => p,
                None if len == 0 => return Err(LayoutError::ZeroSizedField { index }),
                None => return Err(LayoutError::Overflow),
            };
            let offset = align_up(cursor, padded).ok_or(LayoutError::Overflow)?;
            cursor = offset.checked_add(padded).ok_or(LayoutError::Overflow)?;
            max_padded = max_padded.max(padded);
            slots.push(FieldSlot {
                offset,
                len,
                padded,
            });
        }

        let size = if max_padded == 0 {
            0
        } else {
            align_up(cursor, max_padded).ok_or(LayoutError::Overflow)?
        };

        Ok(Self { slots, size })
    }

    /// Total struct size in bytes; also the array element stride.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    /// Byte offset of field `index`.
    pub fn offset(&self, index: usize) -> Option<usize> {
        self.slots.get(index).map(|s| s.offset)
    }

    /// Size of a tightly strided array of `count` structs.
    pub fn array_size(&self, count: usize) -> Result<usize, LayoutError> {
        self.size.checked_mul(count).ok_or(LayoutError::Overflow)
    }

    /// Reject a layout (or array of `count` structs) that does not fit `capacity` bytes.
    pub fn check_capacity(&self, count: usize, capacity: u64) -> Result<u64, LayoutError> {
        let required = self.array_size(count)? as u64;
        if required > capacity {
            return Err(LayoutError::ExceedsCapacity { required, capacity });
        }
        Ok(required)
    }

    /// Serialize `values` into a fresh zero-padded buffer of `self.size()` bytes.
    pub fn pack(&self, values: &[FieldValue]) -> Result<Vec<u8>, LayoutError> {
        let mut out = vec![0u8; self.size];
        self.pack_into(values, &mut out)?;
        Ok(out)
    }

    /// Serialize `values` into the first `self.size()` bytes of `dst`.
    ///
    /// Padding between fields is zeroed.
    pub fn pack_into(&self, values: &[FieldValue], dst: &mut [u8]) -> Result<(), LayoutError> {
        if values.len() != self.slots.len() {
            return Err(LayoutError::FieldCountMismatch {
                expected: self.slots.len(),
                actual: values.len(),
            });
        }
        if dst.len() < self.size {
            return Err(LayoutError::DestinationTooSmall {
                required: self.size,
                capacity: dst.len(),
            });
        }
        for (index, (slot, value)) in self.slots.iter().zip(values).enumerate() {
            let encoded = value.encode();
            let bytes = encoded.as_bytes();
            if bytes.len() != slot.len {
                return Err(LayoutError::FieldSizeMismatch {
                    index,
                    expected: slot.len,
                    actual: bytes.len(),
                });
            }
        }

        dst[..self.size].fill(0);
        for (slot, value) in self.slots.iter().zip(values) {
            let end = slot.offset + slot.len;
            dst[slot.offset..end].copy_from_slice(value.encode().as_bytes());
        }
        Ok(())
    }
}

fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const F32: usize = 4;

    fn offsets(layout: &StructLayout) -> Vec<usize> {
        layout.slots().iter().map(|s| s.offset).collect()
    }

    fn camera_uniform_sizes() -> Vec<usize> {
        vec![3 * F32, 2 * F32, 2 * F32, F32, F32, F32, F32]
    }

    #[test]
    fn padded_size_rounds_up() {
        assert_eq!(padded_size(1), Some(1));
        assert_eq!(padded_size(4), Some(4));
        assert_eq!(padded_size(12), Some(16));
        assert_eq!(padded_size(0), None);
    }

    #[test]
    fn empty_layout_is_zero_sized() {
        let layout = StructLayout::new(&[]).unwrap();
        assert_eq!(layout.size(), 0);
        assert!(layout.slots().is_empty());
        assert_eq!(layout.pack(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_field_uses_its_padded_size() {
        assert_eq!(StructLayout::new(&[12]).unwrap().size(), 16);
        assert_eq!(StructLayout::new(&[4]).unwrap().size(), 4);
        assert_eq!(StructLayout::new(&[3]).unwrap().size(), 4);
    }

    #[test]
    fn camera_uniform_layout() {
        let layout = StructLayout::new(&camera_uniform_sizes()).unwrap();
        assert_eq!(offsets(&layout), vec![0, 16, 24, 32, 36, 40, 44]);
        assert_eq!(layout.size(), 48);
    }

    #[test]
    fn entity_record_aligns_trailing_vector() {
        let layout = StructLayout::new(&[3 * F32, F32, 3 * F32]).unwrap();
        assert_eq!(offsets(&layout), vec![0, 16, 32]);
        assert_eq!(layout.size(), 48);
        assert_eq!(layout.array_size(7).unwrap(), 336);
    }

    #[test]
    fn offsets_are_aligned_and_disjoint() {
        let cases: &[&[usize]] = &[
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &[12, 4, 12],
            &[4, 12, 4, 8, 2, 16, 1],
            &[64, 1, 64],
            &[3, 3, 3],
        ];
        for sizes in cases {
            let layout = StructLayout::new(sizes).unwrap();
            let slots = layout.slots();
            let mut sum_padded = 0;
            let mut max_padded = 0;
            for (i, slot) in slots.iter().enumerate() {
                assert_eq!(slot.offset % slot.padded, 0, "{sizes:?} field {i}");
                if let Some(next) = slots.get(i + 1) {
                    assert!(slot.offset + slot.padded <= next.offset, "{sizes:?}");
                }
                sum_padded += slot.padded;
                max_padded = max_padded.max(slot.padded);
            }
            assert!(layout.size() >= sum_padded, "{sizes:?}");
            assert_eq!(layout.size() % max_padded, 0, "{sizes:?}");
        }
    }

    #[test]
    fn zero_sized_field_is_rejected() {
        assert_eq!(
            StructLayout::new(&[4, 0]),
            Err(LayoutError::ZeroSizedField { index: 1 })
        );
    }

    #[test]
    fn pack_places_values_at_offsets() {
        let values = [
            FieldValue::Vec3([1.0, 2.0, 3.0]),
            FieldValue::F32(0.5),
            FieldValue::Vec3([4.0, 5.0, 6.0]),
        ];
        let layout = StructLayout::new(&[3 * F32, F32, 3 * F32]).unwrap();
        let bytes = layout.pack(&values).unwrap();
        assert_eq!(bytes.len(), 48);
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(&floats[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(floats[3], 0.0);
        assert_eq!(floats[4], 0.5);
        assert_eq!(&floats[5..8], &[0.0, 0.0, 0.0]);
        assert_eq!(&floats[8..11], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn pack_rejects_mismatched_values() {
        let layout = StructLayout::new(&[12, 4]).unwrap();
        assert_eq!(
            layout.pack(&[FieldValue::F32(1.0)]),
            Err(LayoutError::FieldCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            layout.pack(&[FieldValue::Vec2([0.0; 2]), FieldValue::F32(1.0)]),
            Err(LayoutError::FieldSizeMismatch {
                index: 0,
                expected: 12,
                actual: 8
            })
        );
    }

    #[test]
    fn pack_into_checks_destination() {
        let layout = StructLayout::new(&[4, 4]).unwrap();
        let mut small = [0u8; 4];
        assert_eq!(
            layout.pack_into(&[FieldValue::U32(1), FieldValue::U32(2)], &mut small),
            Err(LayoutError::DestinationTooSmall {
                required: 8,
                capacity: 4
            })
        );
    }

    #[test]
    fn capacity_check() {
        let layout = StructLayout::new(&[12, 4, 12]).unwrap();
        assert_eq!(layout.check_capacity(7, 1024), Ok(336));
        assert_eq!(
            layout.check_capacity(7, 256),
            Err(LayoutError::ExceedsCapacity {
                required: 336,
                capacity: 256
            })
        );
        assert_eq!(layout.array_size(usize::MAX), Err(LayoutError::Overflow));
    }
}
