//! Run-wide cancellation coordination
//!
//! A single [`ShutdownSignal`] is shared by the scanner, every pipeline worker,
//! the interactive UI and the timeout task. Triggering it once (signal,
//! user quit or elapsed deadline) is observed by all of them: blocking code
//! polls the atomic flag, async code awaits [`ShutdownSignal::cancelled`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Why a run was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Signal or explicit user quit
    Interrupted,
    /// The configured overall timeout elapsed
    TimedOut,
}

impl CancelReason {
    fn code(self) -> u8 {
        match self {
            CancelReason::Interrupted => 1,
            CancelReason::TimedOut => 2,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CancelReason::Interrupted),
            2 => Some(CancelReason::TimedOut),
            _ => None,
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Interrupted => write!(f, "interrupted"),
            CancelReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Cloneable handle on the run's cancellation state
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: broadcast::Sender<()>,
    requested: Arc<AtomicBool>,
    reason: Arc<AtomicU8>,
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("requested", &self.is_requested())
            .field("reason", &self.reason())
            .finish()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(8);
        Self {
            tx,
            requested: Arc::new(AtomicBool::new(false)),
            reason: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Trigger cancellation. The first reason recorded wins.
    pub fn trigger(&self, reason: CancelReason) {
        let _ = self
            .reason
            .compare_exchange(0, reason.code(), Ordering::AcqRel, Ordering::Acquire);
        // Release pairs with the Acquire loads in is_requested()
        self.requested.store(true, Ordering::Release);
        let _ = self.tx.send(());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<CancelReason> {
        CancelReason::from_code(self.reason.load(Ordering::Acquire))
    }

    /// Raw flag for blocking APIs that poll an `AtomicBool` (gix interrupts)
    pub fn interrupt_flag(&self) -> &AtomicBool {
        &self.requested
    }

    /// Resolve once cancellation has been triggered
    pub async fn cancelled(&self) -> CancelReason {
        // Subscribe before checking the flag so a concurrent trigger is not missed
        let mut rx = self.tx.subscribe();
        loop {
            if self.is_requested() {
                return self.reason().unwrap_or(CancelReason::Interrupted);
            }
            match rx.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return self.reason().unwrap_or(CancelReason::Interrupted)
                }
            }
        }
    }

    /// Trigger [`CancelReason::TimedOut`] once `timeout` elapses
    ///
    /// The returned task finishes early if the run is cancelled for another reason.
    pub fn arm_timeout(&self, timeout: Duration) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    log::warn!("Overall timeout of {:?} elapsed, cancelling run", timeout);
                    signal.trigger(CancelReason::TimedOut);
                }
                _ = signal.cancelled() => {}
            }
        })
    }
}

/// Coordinates graceful shutdown across the application
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
}

impl ShutdownCoordinator {
    /// Create a coordinator and install process signal handlers
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> Self {
        let coordinator = Self {
            signal: ShutdownSignal::new(),
        };
        setup_signal_handlers(coordinator.signal.clone());
        coordinator
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn trigger_shutdown(&self) {
        self.signal.trigger(CancelReason::Interrupted);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.signal.is_requested()
    }
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(signal: ShutdownSignal) {
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }

        use std::sync::atomic::AtomicUsize;
        use tokio::signal::unix::{signal as unix_signal, SignalKind};
        let signal_count = Arc::new(AtomicUsize::new(0));
        let kinds = [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ];

        for kind in kinds {
            let signal = signal.clone();
            let sig_ctr = signal_count.clone();

            tokio::spawn(async move {
                if let Ok(mut sig) = unix_signal(kind) {
                    #[allow(clippy::never_loop)]
                    while sig.recv().await.is_some() {
                        let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                        signal.trigger(CancelReason::Interrupted);
                        if prev >= 1 {
                            // Second signal: stop waiting for in-flight network calls
                            std::process::exit(130);
                        }
                        break;
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.trigger(CancelReason::Interrupted);
            }
        });
    }
}
