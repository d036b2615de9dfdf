//! Headless replay of a JSON-lines host message script.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;

use anyhow::Context;
use orbtrace_protocol::{Detached, HostMessage, WorkerMessage, decode_host};
use orbtrace_worker::frame::{entity, uniform};
use orbtrace_worker::{
    FrameError, FrameLayouts, FrameTarget, GpuProvider, InitError, ManualClock, RecordingTarget,
    RenderConfig, Scene, StopToken, WorkerExit, WorkerOptions, WorkerState, run_worker,
};
use serde_json::{Value, json};

/// Recording target the caller can still read after the worker loop returns.
#[derive(Clone, Default)]
struct SharedTarget(Rc<RefCell<RecordingTarget>>);

impl FrameTarget for SharedTarget {
    fn write_uniforms(&mut self, bytes: &[u8]) {
        self.0.borrow_mut().write_uniforms(bytes);
    }

    fn write_entity(&mut self, offset: u64, bytes: &[u8]) {
        self.0.borrow_mut().write_entity(offset, bytes);
    }

    fn present(&mut self, config: &RenderConfig) -> Result<(), FrameError> {
        self.0.borrow_mut().present(config)
    }
}

/// Stands in for a GPU: every surface is accepted.
struct HeadlessProvider(SharedTarget);

impl GpuProvider for HeadlessProvider {
    type Surface = Detached;
    type Target = SharedTarget;

    fn acquire(
        &mut self,
        _surface: Detached,
        _state: &WorkerState,
        _layouts: &FrameLayouts,
    ) -> Result<SharedTarget, InitError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    pub frames: u64,
    pub interval_ms: f64,
    pub seed: u32,
}

/// Result of a replay run.
#[derive(Debug)]
pub struct ReplayReport {
    pub exit: WorkerExit,
    pub frames: u64,
    pub notifications: Vec<WorkerMessage>,
    pub target: RecordingTarget,
    pub layouts: FrameLayouts,
}

/// Parse a script: one JSON host message per line, blank and `#` lines skipped.
pub fn parse_script(script: &str) -> anyhow::Result<Vec<HostMessage<Detached>>> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| decode_host(line).with_context(|| format!("line {}", n + 1)))
        .collect()
}

/// Run `messages` through the worker core with a fixed frame interval.
///
/// An `initialize` is prepended when the script has none.
pub fn replay(
    mut messages: Vec<HostMessage<Detached>>,
    opts: ReplayOptions,
) -> anyhow::Result<ReplayReport> {
    if !messages
        .iter()
        .any(|m| matches!(m, HostMessage::Initialize { .. }))
    {
        messages.insert(
            0,
            HostMessage::Initialize {
                surface: Detached,
                pixel_ratio: 1.0,
            },
        );
    }

    let (tx, rx) = mpsc::channel();
    for msg in messages {
        tx.send(msg)?;
    }
    let (out_tx, out_rx) = mpsc::channel::<WorkerMessage>();

    let target = SharedTarget::default();
    let clock = ManualClock::new(0.0, opts.interval_ms);
    let mut state = WorkerState::new(RenderConfig::default(), Scene::demo(opts.seed));
    let exit = run_worker(
        rx,
        &out_tx,
        HeadlessProvider(target.clone()),
        &clock,
        &StopToken::new(),
        &mut state,
        WorkerOptions {
            max_frames: Some(opts.frames),
            ..WorkerOptions::default()
        },
    )?;
    drop(tx);

    let recording = target.0.borrow().clone();
    tracing::debug!(?exit, presents = recording.presents, "replay finished");
    Ok(ReplayReport {
        exit,
        frames: recording.presents,
        notifications: out_rx.try_iter().collect(),
        target: recording,
        layouts: FrameLayouts::new()?,
    })
}

impl ReplayReport {
    /// Decoded uniform record of the last frame.
    pub fn uniform_json(&self) -> Value {
        let layout = &self.layouts.uniform;
        let f32_at = |field: usize, component: usize| {
            layout
                .offset(field)
                .and_then(|o| self.target.uniform_f32(o + component * 4))
        };
        let u32_at = |field: usize| {
            layout
                .offset(field)
                .and_then(|o| self.target.uniform_u32(o))
        };

        json!({
            "camera": (0..3).map(|c| f32_at(uniform::CAMERA, c)).collect::<Vec<_>>(),
            "rotation": [f32_at(uniform::ROTATION, 0), f32_at(uniform::ROTATION, 1)],
            "canvasDimensions": [f32_at(uniform::DIMENSIONS, 0), f32_at(uniform::DIMENSIONS, 1)],
            "lightTheme": u32_at(uniform::LIGHT_THEME),
            "fovScale": f32_at(uniform::FOV_SCALE, 0),
            "maxBounces": u32_at(uniform::MAX_BOUNCES),
            "antialiasingSamples": u32_at(uniform::ANTIALIASING_SAMPLES),
        })
    }

    /// Decoded entity records of the last frame, in buffer order.
    pub fn entities_json(&self) -> Value {
        let layout = &self.layouts.entity;
        let stride = layout.size();
        let count = self.target.entities.len() / stride;
        let records: Vec<Value> = (0..count)
            .map(|i| {
                let f32_at = |field: usize, component: usize| {
                    layout
                        .offset(field)
                        .and_then(|o| self.target.entity_f32(i * stride + o + component * 4))
                };
                json!({
                    "position": (0..3).map(|c| f32_at(entity::POSITION, c)).collect::<Vec<_>>(),
                    "radius": f32_at(entity::RADIUS, 0),
                    "color": (0..3).map(|c| f32_at(entity::COLOR, c)).collect::<Vec<_>>(),
                })
            })
            .collect();
        Value::Array(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(frames: u64) -> ReplayOptions {
        ReplayOptions {
            frames,
            interval_ms: 100.0,
            seed: 0,
        }
    }

    #[test]
    fn script_skips_blank_and_comment_lines() {
        let script = "# setup\n{\"type\":\"set-max-bounces\",\"maxBounces\":3}\n\n";
        let msgs = parse_script(script).unwrap();
        assert_eq!(msgs, vec![HostMessage::SetMaxBounces { max_bounces: 3 }]);
    }

    #[test]
    fn malformed_line_names_its_number() {
        let err = parse_script("{\"type\":\"resize\"}\nnot json").unwrap_err();
        assert!(format!("{err:#}").contains("line 1"));
    }

    #[test]
    fn replay_applies_config_and_reports_ready() {
        let msgs = parse_script(
            r#"{"type":"set-max-bounces","maxBounces":7}
{"type":"resize","width":640,"height":480,"pixelRatio":1}"#,
        )
        .unwrap();
        let report = replay(msgs, opts(2)).unwrap();
        assert_eq!(report.exit, WorkerExit::FrameLimit);
        assert_eq!(report.frames, 2);
        assert_eq!(report.notifications, vec![WorkerMessage::Ready]);

        let uniform = report.uniform_json();
        assert_eq!(uniform["maxBounces"], json!(7));
        assert_eq!(uniform["canvasDimensions"], json!([640.0, 480.0]));
        assert_eq!(uniform["antialiasingSamples"], json!(2));
    }

    #[test]
    fn entity_report_decodes_every_record() {
        let report = replay(Vec::new(), opts(1)).unwrap();
        let entities = report.entities_json();
        let records = entities.as_array().unwrap();
        assert_eq!(records.len(), Scene::demo(0).len());
        for record in records {
            assert_eq!(record["position"].as_array().unwrap().len(), 3);
            assert!(record["radius"].as_f64().unwrap() > 0.0);
        }
    }

    #[test]
    fn held_direction_moves_camera() {
        let msgs = parse_script(r#"{"type":"start-moving","direction":"up"}"#).unwrap();
        let report = replay(msgs, opts(3)).unwrap();
        // baseline at t=0, frames at 100, 200, 300
        let z = report.uniform_json()["camera"][2].as_f64().unwrap();
        assert!((z - 6.5).abs() < 1e-5, "z = {z}");
    }
}
