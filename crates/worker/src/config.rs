/// Render settings the host can change at runtime.
///
/// Read once per frame when the uniform record is packed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Vertical field of view in radians.
    pub field_of_view: f64,
    pub max_bounces: u32,
    /// Samples per pixel along each axis.
    pub antialiasing_samples: u32,
    pub pixel_ratio: f64,
    pub light_theme: bool,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            field_of_view: 50.0_f64.to_radians(),
            max_bounces: 5,
            antialiasing_samples: 2,
            pixel_ratio: 1.0,
            light_theme: false,
            surface_width: 0,
            surface_height: 0,
        }
    }
}

impl RenderConfig {
    /// Image-plane height at unit distance: `tan(fov / 2) * 2`.
    pub fn fov_scale(&self) -> f64 {
        (self.field_of_view / 2.0).tan() * 2.0
    }
}
