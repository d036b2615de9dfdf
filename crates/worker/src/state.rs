use crate::camera::CameraState;
use crate::config::RenderConfig;
use crate::input::InputState;
use crate::scene::Scene;

/// Everything the worker mutates between and during frames.
///
/// Owned by the worker thread and passed by reference to the router and the
/// scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerState {
    pub camera: CameraState,
    pub input: InputState,
    pub config: RenderConfig,
    pub scene: Scene,
}

impl WorkerState {
    pub fn new(config: RenderConfig, scene: Scene) -> Self {
        Self {
            camera: CameraState::default(),
            input: InputState::default(),
            config,
            scene,
        }
    }
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::new(RenderConfig::default(), Scene::demo(0))
    }
}
