//! Exec session state machine.

use super::{ExecListener, ExecStatus};
use crate::error::{Error, TransportError};
use crate::transport::{Channel, Frame, StreamControl, StreamSink};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub(crate) const STOPPED_CODE: u16 = 1000;
pub(crate) const STOPPED_REASON: &str = "stopped by caller";

/// Lifecycle of an exec session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecState {
    Init = 0,
    Connecting = 1,
    Open = 2,
    Closed = 3,
    Failed = 4,
}

impl ExecState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Init,
            1 => Self::Connecting,
            2 => Self::Open,
            3 => Self::Closed,
            _ => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// One exec session. Receives transport events and forwards them to the
/// listener.
///
/// `terminated` is flipped exactly once by whichever of stop, peer close
/// or transport failure gets there first; only that path reaches the
/// listener's terminal callback. Listener callbacks run under `gate`, so
/// nothing reaches the listener after the terminal callback.
pub(crate) struct ExecSession {
    id: Uuid,
    target: String,
    listener: Arc<dyn ExecListener>,
    state: AtomicU8,
    terminated: AtomicBool,
    control: Mutex<Option<Box<dyn StreamControl>>>,
    gate: Mutex<()>,
    /// Thread currently holding `gate`, so a listener may stop the session
    /// from inside a callback
    gate_owner: Mutex<Option<ThreadId>>,
}

impl ExecSession {
    pub(crate) fn new(target: impl Into<String>, listener: Arc<dyn ExecListener>) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            target: target.into(),
            listener,
            state: AtomicU8::new(ExecState::Init as u8),
            terminated: AtomicBool::new(false),
            control: Mutex::new(None),
            gate: Mutex::new(()),
            gate_owner: Mutex::new(None),
        })
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn state(&self) -> ExecState {
        ExecState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: ExecState, to: ExecState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Init → Connecting`.
    pub(crate) fn begin(&self) -> bool {
        let started = self.transition(ExecState::Init, ExecState::Connecting);
        if started {
            info!(session = %self.id, "Exec connecting to {}", self.target);
        }
        started
    }

    /// Keep the transport control so that stop can close the stream. A
    /// session that already terminated closes it right away.
    pub(crate) fn attach(&self, control: Box<dyn StreamControl>) {
        let mut slot = self.control.lock().unwrap_or_else(|e| e.into_inner());
        if self.terminated.load(Ordering::Acquire) {
            drop(slot);
            control.close();
        } else {
            *slot = Some(control);
        }
    }

    /// Caller-initiated termination. Idempotent.
    pub(crate) fn stop(&self) {
        if self.close(STOPPED_CODE, STOPPED_REASON) {
            debug!(session = %self.id, "Exec stopped by caller");
        }
    }

    /// Deliver `on_close` if no terminal callback has fired yet.
    pub(crate) fn close(&self, code: u16, reason: &str) -> bool {
        self.gated(|| {
            if !self.claim_termination() {
                debug!(session = %self.id, "Ignoring close {} after termination", code);
                return false;
            }
            self.state.store(ExecState::Closed as u8, Ordering::Release);
            self.release_stream();
            info!(session = %self.id, "Exec closed: {} {}", code, reason);
            self.listener.on_close(code, reason);
            true
        })
    }

    /// Deliver `on_failure` if no terminal callback has fired yet.
    pub(crate) fn fail(&self, error: Error) -> bool {
        self.gated(|| {
            if !self.claim_termination() {
                debug!(session = %self.id, "Ignoring failure after termination: {}", error);
                return false;
            }
            self.state.store(ExecState::Failed as u8, Ordering::Release);
            self.release_stream();
            warn!(session = %self.id, "Exec failed: {}", error);
            self.listener.on_failure(&error);
            true
        })
    }

    /// Run `f` holding the callback gate. Re-entry from the owning thread
    /// runs `f` directly.
    fn gated<R>(&self, f: impl FnOnce() -> R) -> R {
        let me = thread::current().id();
        if *self.gate_owner.lock().unwrap_or_else(|e| e.into_inner()) == Some(me) {
            return f();
        }
        let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        *self.gate_owner.lock().unwrap_or_else(|e| e.into_inner()) = Some(me);
        let result = f();
        *self.gate_owner.lock().unwrap_or_else(|e| e.into_inner()) = None;
        result
    }

    fn claim_termination(&self) -> bool {
        self.terminated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release_stream(&self) {
        let control = self
            .control
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(control) = control {
            control.close();
        }
    }

    fn dispatch(&self, frame: Frame) {
        match frame.channel {
            Channel::Stdout => self.listener.on_stdout(&frame.payload),
            Channel::Stderr => self.listener.on_stderr(&frame.payload),
            Channel::Error => {
                let status = ExecStatus::parse(&frame.payload);
                debug!(session = %self.id, "Exec status: {:?}", status);
                self.listener.on_exec_error(&status);
            }
            Channel::Stdin | Channel::Resize => {
                warn!(session = %self.id, "Unexpected frame on {:?} channel", frame.channel);
            }
        }
    }
}

impl StreamSink for ExecSession {
    fn on_open(&self) {
        self.gated(|| {
            if self.terminated.load(Ordering::Acquire) {
                debug!(session = %self.id, "Handshake completed after termination");
                return;
            }
            if self.transition(ExecState::Connecting, ExecState::Open) {
                info!(session = %self.id, "Exec open on {}", self.target);
                self.listener.on_open();
            }
        })
    }

    fn on_frame(&self, frame: Frame) {
        self.gated(|| {
            if self.terminated.load(Ordering::Acquire) || self.state() != ExecState::Open {
                warn!(
                    session = %self.id,
                    "Dropping {:?} frame in state {:?}",
                    frame.channel,
                    self.state()
                );
                return;
            }
            self.dispatch(frame);
        })
    }

    fn on_closed(&self, code: u16, reason: String) {
        self.close(code, &reason);
    }

    fn on_failure(&self, error: TransportError) {
        self.fail(Error::Transport(error));
    }
}
