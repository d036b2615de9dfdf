//! The worker thread's main routine.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use orbtrace_protocol::{HostMessage, WorkerMessage};

use crate::camera::CameraController;
use crate::frame::FrameLayouts;
use crate::handshake::{GpuProvider, Handshake, InitError, Outbox};
use crate::router::{Routed, dispatch};
use crate::scheduler::{Clock, FrameScheduler, StopToken};
use crate::state::WorkerState;

/// Pause after a skipped frame before trying again.
pub const SKIP_BACKOFF: Duration = Duration::from_millis(16);

/// Tunables for [`run_worker`].
#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub controller: CameraController,
    /// Stop after this many frames. `None` runs until stopped.
    pub max_frames: Option<u64>,
    /// Sleep applied after a skipped frame; zero disables it.
    pub skip_backoff: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            controller: CameraController::default(),
            max_frames: None,
            skip_backoff: SKIP_BACKOFF,
        }
    }
}

/// Why the frame loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The stop token was set.
    Stopped,
    /// The host dropped its end of the channel.
    Disconnected,
    /// A fatal frame error; `device-lost` was posted.
    DeviceLost,
    /// `max_frames` frames were drawn.
    FrameLimit,
}

/// Run the worker: handshake once, then draw until told to stop.
///
/// Host messages are drained between frames, so every change lands on a
/// frame boundary. Returns an error only when initialization fails.
pub fn run_worker<P, C, O>(
    inbox: Receiver<HostMessage<P::Surface>>,
    outbox: &O,
    mut provider: P,
    clock: &C,
    stop: &StopToken,
    state: &mut WorkerState,
    options: WorkerOptions,
) -> Result<WorkerExit, InitError>
where
    P: GpuProvider,
    C: Clock + ?Sized,
    O: Outbox + ?Sized,
{
    let layouts = FrameLayouts::new()?;
    let mut handshake = Handshake::new();

    let surface = match handshake.await_surface(&inbox, state) {
        Ok(surface) => surface,
        Err(InitError::Disconnected) => {
            tracing::info!("host disconnected before initialize");
            return Ok(WorkerExit::Disconnected);
        }
        Err(err) => return Err(err),
    };
    let acquired = handshake.acquire(&mut provider, surface, state, &layouts, outbox);
    tracing::debug!(state = ?handshake.state(), "handshake finished");
    let mut target = acquired?;

    let mut scheduler = FrameScheduler::new(layouts, options.controller);
    scheduler.start(clock.now_ms());

    loop {
        if stop.is_stopped() {
            tracing::info!(frames = scheduler.frames(), "render worker stopped");
            return Ok(WorkerExit::Stopped);
        }
        if !drain(&inbox, state) {
            tracing::info!(frames = scheduler.frames(), "host disconnected");
            return Ok(WorkerExit::Disconnected);
        }

        match scheduler.step(state, clock.now_ms(), &mut target) {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                tracing::error!(error = %err, "render loop halted");
                outbox.post(WorkerMessage::DeviceLost);
                return Ok(WorkerExit::DeviceLost);
            }
            Err(err) => {
                tracing::warn!(error = %err, "frame dropped");
                if !options.skip_backoff.is_zero() {
                    std::thread::sleep(options.skip_backoff);
                }
            }
        }

        if options.max_frames.is_some_and(|max| scheduler.frames() >= max) {
            return Ok(WorkerExit::FrameLimit);
        }
    }
}

/// Apply every queued message. Returns `false` once the host is gone.
fn drain<S>(inbox: &Receiver<HostMessage<S>>, state: &mut WorkerState) -> bool {
    loop {
        match inbox.try_recv() {
            Ok(msg) => {
                if let Routed::Surface(_) = dispatch(state, msg) {
                    tracing::warn!("initialize received after startup, ignoring surface");
                }
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}
