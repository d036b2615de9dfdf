use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use anyhow::Result;
use clap::Parser;
use orbtrace_protocol::{HostMessage, WorkerMessage};
use orbtrace_worker::{
    Outbox, RenderConfig, Scene, StopToken, SystemClock, WorkerOptions, WorkerState, run_worker,
};
use orbtrace_worker_wgpu::{ShaderSource, SurfaceHandoff, WgpuProvider};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

mod input;

use input::{PointerDrag, key_message, key_name, resize_message};

const TITLE: &str = "orbtrace";

#[derive(Parser, Debug)]
#[command(name = "orbtrace-desktop", about = "Real-time sphere tracer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// WGSL shader with `vertex_main` / `fragment_main` (defaults to the bundled one)
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 50.0)]
    fov: f64,

    /// Maximum ray bounces
    #[arg(long, default_value_t = 5)]
    max_bounces: u32,

    /// Antialiasing samples per pixel along each axis
    #[arg(long, default_value_t = 2)]
    samples: u32,

    /// Use the light background theme
    #[arg(long)]
    light_theme: bool,

    /// Divide the surface resolution by this factor
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    resolution_divisor: u32,

    /// Animation seed (random when omitted)
    #[arg(long)]
    seed: Option<u32>,
}

impl Cli {
    /// Settings sent once after `initialize`.
    fn initial_config<S>(&self) -> Vec<HostMessage<S>> {
        vec![
            HostMessage::SetTheme {
                light_theme: self.light_theme,
            },
            HostMessage::SetMaxBounces {
                max_bounces: self.max_bounces,
            },
            HostMessage::SetAntialiasingSamplesPerPixel {
                antialiasing_samples_per_pixel: self.samples,
            },
            HostMessage::SetFieldOfView {
                field_of_view: self.fov.to_radians(),
            },
        ]
    }

    fn seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or(0)
        })
    }
}

/// Delivers worker notifications to the event loop as user events.
struct ProxyOutbox(EventLoopProxy<WorkerMessage>);

impl Outbox for ProxyOutbox {
    fn post(&self, msg: WorkerMessage) {
        if self.0.send_event(msg).is_err() {
            tracing::debug!(?msg, "event loop closed, notification dropped");
        }
    }
}

/// The running render worker thread.
struct WorkerHandle {
    tx: Sender<HostMessage<SurfaceHandoff>>,
    stop: StopToken,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    fn spawn(cli: &Cli, proxy: EventLoopProxy<WorkerMessage>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let stop = StopToken::new();
        let provider = WgpuProvider::new(
            cli.shader
                .clone()
                .map_or(ShaderSource::Builtin, ShaderSource::File),
        );
        let seed = cli.seed();
        let worker_stop = stop.clone();

        let thread = std::thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || {
                let outbox = ProxyOutbox(proxy);
                let mut state = WorkerState::new(RenderConfig::default(), Scene::demo(seed));
                match run_worker(
                    rx,
                    &outbox,
                    provider,
                    &SystemClock::new(),
                    &worker_stop,
                    &mut state,
                    WorkerOptions::default(),
                ) {
                    Ok(exit) => tracing::info!(?exit, "render worker exited"),
                    Err(err) => tracing::error!(%err, "render worker failed"),
                }
            })?;
        tracing::info!(seed, "render worker spawned");

        Ok(Self { tx, stop, thread })
    }

    fn send(&self, msg: HostMessage<SurfaceHandoff>) {
        let kind = msg.kind();
        if self.tx.send(msg).is_err() {
            tracing::debug!(kind, "render worker gone, message dropped");
        }
    }

    fn shutdown(self) {
        let Self { tx, stop, thread } = self;
        stop.stop();
        drop(tx);
        if thread.join().is_err() {
            tracing::error!("render worker panicked");
        }
    }
}

struct App {
    cli: Cli,
    proxy: EventLoopProxy<WorkerMessage>,
    window: Option<Arc<Window>>,
    worker: Option<WorkerHandle>,
    drag: PointerDrag,
    /// Set once the worker reports it cannot draw; input is no longer forwarded.
    halted: bool,
}

impl App {
    fn new(cli: Cli, proxy: EventLoopProxy<WorkerMessage>) -> Self {
        Self {
            cli,
            proxy,
            window: None,
            worker: None,
            drag: PointerDrag::default(),
            halted: false,
        }
    }

    fn send(&self, msg: HostMessage<SurfaceHandoff>) {
        if self.halted {
            return;
        }
        if let Some(worker) = &self.worker {
            worker.send(msg);
        }
    }

    fn halt(&mut self, reason: &str) {
        self.halted = true;
        if let Some(window) = &self.window {
            window.set_title(&format!("{TITLE} - {reason}"));
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let worker = WorkerHandle::spawn(&self.cli, self.proxy.clone())?;
        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        worker.send(HostMessage::Initialize {
            surface: SurfaceHandoff {
                instance,
                surface,
                width: size.width,
                height: size.height,
            },
            pixel_ratio: scale_factor,
        });
        for msg in self.cli.initial_config() {
            worker.send(msg);
        }
        let divisor = self.cli.resolution_divisor;
        worker.send(resize_message(size, scale_factor, divisor));

        self.window = Some(window);
        self.worker = Some(worker);
        Ok(())
    }
}

impl ApplicationHandler<WorkerMessage> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            tracing::error!("startup failed: {err:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let Some(window) = &self.window else {
                    return;
                };
                let divisor = self.cli.resolution_divisor;
                let msg = resize_message(size, window.scale_factor(), divisor);
                self.send(msg);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(name) = key_name(&logical_key) {
                    self.send(key_message(&name, state == ElementState::Pressed));
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.drag.set_pressed(state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let Some(window) = &self.window else {
                    return;
                };
                if let Some((dx, dy)) = self.drag.moved(position, window.scale_factor()) {
                    self.send(HostMessage::PointerMoved { dx, dy });
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: WorkerMessage) {
        match event {
            WorkerMessage::Ready => tracing::info!("render worker ready"),
            WorkerMessage::WebgpuUnsupported => {
                tracing::error!("GPU rendering is not supported on this system");
                self.halt("GPU unsupported");
            }
            WorkerMessage::DeviceLost => {
                tracing::error!("GPU device lost, rendering stopped");
                self.halt("device lost");
            }
            WorkerMessage::Unknown => tracing::debug!("unknown worker notification"),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("orbtrace-desktop starting");

    let event_loop = EventLoop::<WorkerMessage>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(cli, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    Ok(())
}
