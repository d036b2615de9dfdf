//! Worker bring-up: wait for the surface, acquire a device, report the result.

use std::sync::mpsc::{Receiver, Sender};

use orbtrace_packer::LayoutError;
use orbtrace_protocol::{HostMessage, WorkerMessage};

use crate::frame::FrameLayouts;
use crate::router::{Routed, dispatch};
use crate::scheduler::FrameTarget;
use crate::state::WorkerState;

/// Where the worker is in its one-time initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    AwaitingSurface,
    AwaitingDevice,
    Ready,
    Unsupported,
}

/// Errors that end initialization.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(String),
    #[error("surface is not supported by the adapter")]
    IncompatibleSurface,
    #[error("shader could not be loaded: {0}")]
    Shader(String),
    #[error("buffer layout rejected: {0}")]
    Layout(#[from] LayoutError),
    #[error("host disconnected before sending initialize")]
    Disconnected,
    #[error("initialization already ran")]
    AlreadyInitialized,
}

impl InitError {
    /// The platform cannot run the renderer at all.
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::NoAdapter | Self::Device(_) | Self::IncompatibleSurface
        )
    }
}

/// Builds the GPU side of the worker from a handed-over surface.
pub trait GpuProvider {
    type Surface;
    type Target: FrameTarget;

    /// Acquire adapter and device, then build buffers sized from `layouts`,
    /// the pipeline and the bind group.
    fn acquire(
        &mut self,
        surface: Self::Surface,
        state: &WorkerState,
        layouts: &FrameLayouts,
    ) -> Result<Self::Target, InitError>;
}

/// Worker -> host notification channel.
pub trait Outbox {
    fn post(&self, msg: WorkerMessage);
}

impl Outbox for Sender<WorkerMessage> {
    fn post(&self, msg: WorkerMessage) {
        if self.send(msg).is_err() {
            tracing::debug!(?msg, "host gone, notification dropped");
        }
    }
}

/// One-shot initialization state machine.
#[derive(Debug)]
pub struct Handshake {
    state: InitState,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: InitState::Uninitialized,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    /// Block until the host sends `initialize` and return its surface.
    ///
    /// Messages that arrive first are applied to `worker` as usual.
    pub fn await_surface<S>(
        &mut self,
        inbox: &Receiver<HostMessage<S>>,
        worker: &mut WorkerState,
    ) -> Result<S, InitError> {
        if self.state != InitState::Uninitialized {
            return Err(InitError::AlreadyInitialized);
        }
        self.state = InitState::AwaitingSurface;
        tracing::debug!("waiting for surface");

        loop {
            let msg = inbox.recv().map_err(|_| InitError::Disconnected)?;
            if let Routed::Surface(surface) = dispatch(worker, msg) {
                self.state = InitState::AwaitingDevice;
                return Ok(surface);
            }
        }
    }

    /// Bring up the device on `surface` and tell the host how it went.
    ///
    /// A capability failure posts `webgpu-unsupported`; success posts `ready`.
    /// Either way the handshake is finished and is never re-entered.
    pub fn acquire<P, O>(
        &mut self,
        provider: &mut P,
        surface: P::Surface,
        worker: &WorkerState,
        layouts: &FrameLayouts,
        outbox: &O,
    ) -> Result<P::Target, InitError>
    where
        P: GpuProvider,
        O: Outbox + ?Sized,
    {
        if self.state != InitState::AwaitingDevice {
            return Err(InitError::AlreadyInitialized);
        }
        match provider.acquire(surface, worker, layouts) {
            Ok(target) => {
                self.state = InitState::Ready;
                tracing::info!("render worker ready");
                outbox.post(WorkerMessage::Ready);
                Ok(target)
            }
            Err(err) => {
                self.state = InitState::Unsupported;
                if err.is_capability_failure() {
                    tracing::error!(error = %err, "GPU unavailable");
                    outbox.post(WorkerMessage::WebgpuUnsupported);
                } else {
                    tracing::error!(error = %err, "render worker initialization failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::scheduler::RecordingTarget;
    use std::sync::mpsc;

    struct Provider(Option<InitError>);

    impl GpuProvider for Provider {
        type Surface = u8;
        type Target = RecordingTarget;

        fn acquire(
            &mut self,
            _surface: u8,
            _state: &WorkerState,
            _layouts: &FrameLayouts,
        ) -> Result<RecordingTarget, InitError> {
            match self.0.take() {
                Some(err) => Err(err),
                None => Ok(RecordingTarget::new()),
            }
        }
    }

    #[test]
    fn early_messages_apply_before_surface() {
        let (tx, rx) = mpsc::channel();
        tx.send(HostMessage::SetMaxBounces { max_bounces: 2 }).unwrap();
        tx.send(HostMessage::Initialize {
            surface: 7u8,
            pixel_ratio: 2.0,
        })
        .unwrap();
        let mut worker = WorkerState::default();
        let mut handshake = Handshake::new();
        assert_eq!(handshake.await_surface(&rx, &mut worker).unwrap(), 7);
        assert_eq!(handshake.state(), InitState::AwaitingDevice);
        assert_eq!(worker.config.max_bounces, 2);
        assert_eq!(worker.config.pixel_ratio, 2.0);
    }

    #[test]
    fn disconnect_before_initialize() {
        let (tx, rx) = mpsc::channel::<HostMessage<u8>>();
        drop(tx);
        let mut handshake = Handshake::new();
        let err = handshake
            .await_surface(&rx, &mut WorkerState::default())
            .unwrap_err();
        assert!(matches!(err, InitError::Disconnected));
    }

    #[test]
    fn success_posts_ready() {
        let (out_tx, out_rx) = mpsc::channel::<WorkerMessage>();
        let mut handshake = Handshake {
            state: InitState::AwaitingDevice,
        };
        let layouts = FrameLayouts::new().unwrap();
        let mut target = handshake
            .acquire(&mut Provider(None), 1, &WorkerState::default(), &layouts, &out_tx)
            .unwrap();
        assert_eq!(handshake.state(), InitState::Ready);
        assert_eq!(out_rx.try_recv().unwrap(), WorkerMessage::Ready);
        target.present(&RenderConfig::default()).unwrap();
    }

    #[test]
    fn capability_failure_posts_unsupported_once() {
        let (out_tx, out_rx) = mpsc::channel::<WorkerMessage>();
        let mut handshake = Handshake {
            state: InitState::AwaitingDevice,
        };
        let layouts = FrameLayouts::new().unwrap();
        let err = handshake
            .acquire(
                &mut Provider(Some(InitError::NoAdapter)),
                1,
                &WorkerState::default(),
                &layouts,
                &out_tx,
            )
            .unwrap_err();
        assert!(err.is_capability_failure());
        assert_eq!(handshake.state(), InitState::Unsupported);
        assert_eq!(
            out_rx.try_recv().unwrap(),
            WorkerMessage::WebgpuUnsupported
        );
        assert!(out_rx.try_recv().is_err());

        let again = handshake.acquire(
            &mut Provider(None),
            1,
            &WorkerState::default(),
            &layouts,
            &out_tx,
        );
        assert!(matches!(again, Err(InitError::AlreadyInitialized)));
    }

    #[test]
    fn shader_failure_is_not_reported_as_unsupported() {
        let (out_tx, out_rx) = mpsc::channel::<WorkerMessage>();
        let mut handshake = Handshake {
            state: InitState::AwaitingDevice,
        };
        let layouts = FrameLayouts::new().unwrap();
        let err = handshake
            .acquire(
                &mut Provider(Some(InitError::Shader("syntax".into()))),
                1,
                &WorkerState::default(),
                &layouts,
                &out_tx,
            )
            .unwrap_err();
        assert!(!err.is_capability_failure());
        assert!(out_rx.try_recv().is_err());
    }
}
