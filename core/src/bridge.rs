//! # Interrupt Bridge
//!
//! Turns asynchronous interrupt notifications into a single cooperative
//! cancellation.
//!
//! Notifications travel over a bounded channel to one consumer task. The first
//! one moves the bridge from [`BridgeState::Armed`] to
//! [`BridgeState::CancelRequested`] and cancels the run's token. Everything
//! after that is drained and ignored. The bridge never stops the process, it
//! only asks the runner to wind down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use burrow_common::cancel::CancellationToken;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Capacity of the interrupt queue.
pub const INTERRUPT_QUEUE: usize = 8;

const ARMED: u8 = 0;
const CANCEL_REQUESTED: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Armed,
    CancelRequested,
}

#[derive(Debug)]
enum Event {
    Interrupt,
    Shutdown,
}

#[derive(Debug, Default)]
struct Shared {
    state: AtomicU8,
    transitions: AtomicUsize,
    observed: AtomicUsize,
}

impl Shared {
    fn state(&self) -> BridgeState {
        match self.state.load(Ordering::SeqCst) {
            ARMED => BridgeState::Armed,
            _ => BridgeState::CancelRequested,
        }
    }
}

/// Sending half handed to interrupt sources.
#[derive(Debug, Clone)]
pub struct InterruptNotifier {
    tx: mpsc::Sender<Event>,
}

impl InterruptNotifier {
    /// Queues one interrupt. Returns `false` once the bridge is gone.
    pub async fn notify(&self) -> bool {
        self.tx.send(Event::Interrupt).await.is_ok()
    }
}

/// Something that produces interrupt notifications, such as the terminal.
pub trait SignalSource: Send + Sync {
    /// Starts forwarding notifications until the returned task is aborted.
    fn attach(&self, notifier: InterruptNotifier) -> JoinHandle<()>;
}

/// Forwards Ctrl+C presses.
///
/// The handler is installed before `attach` returns, so a press that arrives
/// while the task is still being scheduled is queued instead of killing the
/// process.
pub struct CtrlC;

impl SignalSource for CtrlC {
    #[cfg(unix)]
    fn attach(&self, notifier: InterruptNotifier) -> JoinHandle<()> {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::interrupt()) {
            Ok(mut interrupts) => tokio::spawn(async move {
                while interrupts.recv().await.is_some() {
                    if !notifier.notify().await {
                        break;
                    }
                }
            }),
            Err(e) => {
                error!("unable to listen for interrupts: {e}");
                tokio::spawn(async {})
            }
        }
    }

    #[cfg(not(unix))]
    fn attach(&self, notifier: InterruptNotifier) -> JoinHandle<()> {
        match tokio::signal::windows::ctrl_c() {
            Ok(mut interrupts) => tokio::spawn(async move {
                while interrupts.recv().await.is_some() {
                    if !notifier.notify().await {
                        break;
                    }
                }
            }),
            Err(e) => {
                error!("unable to listen for interrupts: {e}");
                tokio::spawn(async {})
            }
        }
    }
}

/// Final state of a bridge after it was disarmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeReport {
    pub state: BridgeState,
    /// Number of `Armed -> CancelRequested` transitions, 0 or 1.
    pub transitions: usize,
    /// Interrupts that reached the consumer.
    pub observed: usize,
}

pub struct CancellationBridge;

impl CancellationBridge {
    /// Arms a bridge that cancels `token` on the first interrupt.
    ///
    /// `quiet` suppresses the termination notice.
    pub fn arm(token: CancellationToken, quiet: bool) -> BridgeHandle {
        let (tx, rx) = mpsc::channel(INTERRUPT_QUEUE);
        let shared = Arc::new(Shared::default());
        let consumer = tokio::spawn(consume(rx, shared.clone(), token.clone(), quiet));

        BridgeHandle {
            token,
            shared,
            notifier: InterruptNotifier { tx },
            consumer,
            listeners: Vec::new(),
        }
    }
}

async fn consume(
    mut rx: mpsc::Receiver<Event>,
    shared: Arc<Shared>,
    token: CancellationToken,
    quiet: bool,
) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::Shutdown => break,
            Event::Interrupt => {
                shared.observed.fetch_add(1, Ordering::SeqCst);
                let first = shared
                    .state
                    .compare_exchange(ARMED, CANCEL_REQUESTED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok();
                if !first {
                    debug!("interrupt ignored, cancellation already requested");
                    continue;
                }

                shared.transitions.fetch_add(1, Ordering::SeqCst);
                if !quiet {
                    warn!("Keyboard interrupt detected, terminating.");
                }
                token.cancel();
            }
        }
    }
}

/// A running bridge. Dropping it without [`BridgeHandle::disarm`] leaves the
/// consumer running until every notifier is gone.
pub struct BridgeHandle {
    token: CancellationToken,
    shared: Arc<Shared>,
    notifier: InterruptNotifier,
    consumer: JoinHandle<()>,
    listeners: Vec<JoinHandle<()>>,
}

impl BridgeHandle {
    pub fn notifier(&self) -> InterruptNotifier {
        self.notifier.clone()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn state(&self) -> BridgeState {
        self.shared.state()
    }

    pub fn transitions(&self) -> usize {
        self.shared.transitions.load(Ordering::SeqCst)
    }

    /// Connects a source of interrupts to this bridge.
    pub fn attach(&mut self, source: &dyn SignalSource) {
        self.listeners.push(source.attach(self.notifier()));
    }

    /// Stops all sources, lets queued interrupts drain and reports the result.
    pub async fn disarm(self) -> BridgeReport {
        for listener in &self.listeners {
            listener.abort();
        }
        // Queued behind every interrupt sent so far.
        let _ = self.notifier.tx.send(Event::Shutdown).await;
        if let Err(e) = self.consumer.await {
            error!("interrupt bridge stopped abnormally: {e}");
        }

        BridgeReport {
            state: self.shared.state(),
            transitions: self.shared.transitions.load(Ordering::SeqCst),
            observed: self.shared.observed.load(Ordering::SeqCst),
        }
    }
}
