use glam::Vec3;

/// A sphere the external shader traces against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneEntity {
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec3,
}

impl SceneEntity {
    pub const fn new(position: [f32; 3], radius: f32, color: [f32; 3]) -> Self {
        Self {
            position: Vec3::from_array(position),
            radius,
            color: Vec3::from_array(color),
        }
    }
}

/// The built-in seven-sphere scene.
pub const DEMO_SCENE: [SceneEntity; 7] = [
    SceneEntity::new([0.0, 0.0, 4.0], 1.0, [1.0, 0.5, 0.5]),
    SceneEntity::new([2.0, 2.0, 4.0], 0.6, [0.5, 1.0, 0.5]),
    SceneEntity::new([2.0, -2.0, 5.0], 1.5, [0.5, 0.5, 1.0]),
    SceneEntity::new([-1.0, 0.0, 6.0], 1.1, [1.0, 1.0, 0.5]),
    SceneEntity::new([2.0, 1.0, 6.0], 0.8, [0.5, 1.0, 1.0]),
    SceneEntity::new([2.0, -1.0, 2.0], 0.9, [1.0, 0.5, 1.0]),
    SceneEntity::new([1.0, 0.0, 8.0], 1.4, [1.0, 1.0, 1.0]),
];

/// Fixed set of entities plus the session seed that drives their bobbing.
///
/// The entity count never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    entities: Vec<SceneEntity>,
    seed: u32,
}

impl Scene {
    pub fn new(entities: Vec<SceneEntity>, seed: u32) -> Self {
        Self { entities, seed }
    }

    pub fn demo(seed: u32) -> Self {
        Self::new(DEMO_SCENE.to_vec(), seed)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity `index` as it should be drawn at `timestamp_ms`.
    ///
    /// Depth oscillates with a per-entity frequency derived from the index,
    /// so no random state is shared between entities or frames.
    pub fn animated(&self, index: usize, timestamp_ms: f64) -> Option<SceneEntity> {
        let mut entity = *self.entities.get(index)?;
        let frequency = 1.0 + mulberry32(index as u32, self.seed);
        entity.position.z += ((timestamp_ms + 100.0) * frequency / 1000.0).sin() as f32;
        Some(entity)
    }
}

/// Mulberry32 hash of `index` offset by `seed`, mapped to `[0, 1)`.
pub fn mulberry32(index: u32, seed: u32) -> f64 {
    let mut t = index.wrapping_add(0x6d2b_79f5).wrapping_add(seed);
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    f64::from(t ^ (t >> 14)) / 4_294_967_296.0
}
