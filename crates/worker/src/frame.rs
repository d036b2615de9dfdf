//! Uniform and per-entity record layouts shared by buffer allocation and writes.

use std::mem::size_of;

use orbtrace_packer::{FieldValue, LayoutError, StructLayout};

use crate::scene::SceneEntity;
use crate::state::WorkerState;

const F32: usize = size_of::<f32>();
const U32: usize = size_of::<u32>();

/// Field sizes of the uniform record, in shader declaration order.
pub const UNIFORM_FIELD_SIZES: [usize; 7] = [
    3 * F32, // camera: vec3<f32>
    2 * F32, // rotation: vec2<f32>
    2 * F32, // canvas_dimensions: vec2<f32>
    U32,     // light_theme: u32
    F32,     // fov_scale: f32
    U32,     // max_bounces: u32
    U32,     // antialiasing_samples: u32
];

/// Field indices into the uniform record.
pub mod uniform {
    pub const CAMERA: usize = 0;
    pub const ROTATION: usize = 1;
    pub const DIMENSIONS: usize = 2;
    pub const LIGHT_THEME: usize = 3;
    pub const FOV_SCALE: usize = 4;
    pub const MAX_BOUNCES: usize = 5;
    pub const ANTIALIASING_SAMPLES: usize = 6;
}

/// Field sizes of one entity record.
pub const ENTITY_FIELD_SIZES: [usize; 3] = [
    3 * F32, // position: vec3<f32>
    F32,     // radius: f32
    3 * F32, // color: vec3<f32>
];

/// Field indices into one entity record.
pub mod entity {
    pub const POSITION: usize = 0;
    pub const RADIUS: usize = 1;
    pub const COLOR: usize = 2;
}

/// The two layouts the worker writes through.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayouts {
    pub uniform: StructLayout,
    pub entity: StructLayout,
}

impl FrameLayouts {
    pub fn new() -> Result<Self, LayoutError> {
        Ok(Self {
            uniform: StructLayout::new(&UNIFORM_FIELD_SIZES)?,
            entity: StructLayout::new(&ENTITY_FIELD_SIZES)?,
        })
    }

    /// Byte offset of entity `index` in the storage buffer.
    pub fn entity_offset(&self, index: usize) -> Result<u64, LayoutError> {
        Ok(self.entity.array_size(index)? as u64)
    }

    /// Storage buffer size for `count` entities.
    pub fn entity_buffer_size(&self, count: usize) -> Result<u64, LayoutError> {
        Ok(self.entity.array_size(count)? as u64)
    }
}

/// Uniform record values for the current state.
pub fn uniform_fields(state: &WorkerState) -> [FieldValue; 7] {
    let camera = state.camera.position.as_vec3();
    let rotation = state.camera.rotation.as_vec2();
    let config = &state.config;
    [
        FieldValue::Vec3(camera.to_array()),
        FieldValue::Vec2(rotation.to_array()),
        FieldValue::Vec2([config.surface_width as f32, config.surface_height as f32]),
        FieldValue::flag(config.light_theme),
        FieldValue::F32(config.fov_scale() as f32),
        FieldValue::U32(config.max_bounces),
        FieldValue::U32(config.antialiasing_samples),
    ]
}

pub fn entity_fields(entity: &SceneEntity) -> [FieldValue; 3] {
    [
        FieldValue::Vec3(entity.position.to_array()),
        FieldValue::F32(entity.radius),
        FieldValue::Vec3(entity.color.to_array()),
    ]
}
