//! The Sequent: one actor, one mailbox, one worker.
//!
//! A [`Sequent`] owns a state value and serializes every invocation
//! against it. Producers hold cheap clones of the handle; the state
//! itself lives inside a dedicated worker task and is never aliased.
//!
//! ```text
//!                          ┌──────────────────────────────┐
//! call() ──validate──►     │        SequentWorker         │
//!          enqueue ──────► │  mailbox ◄── Queue(cap 1)    │
//!                          │  kill    ◄── mpsc            │
//! terminate() ───────────► │      │                       │
//!                          │      ▼                       │
//!                          │  handler(&mut state, args)   │
//!                          │      │                       │
//!   reply ◄── oneshot ◄─── │      ▼                       │
//!                          │  supervisor.on_terminated()  │
//!                          └──────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! 1. [`Sequent::spawn`] creates the worker task (state `Running`)
//! 2. The worker drains the mailbox one request at a time
//! 3. Termination — explicit, handler fault, or all handles dropped —
//!    flips `running`, notifies the supervisor once, and purges the
//!    mailbox so pending callers unblock

use crate::request::{Reply, Request};
use crate::{MethodTable, Queue, SequentError, Supervisor, TerminateReason};
use sequent_types::SequentId;
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Spawn-time knobs for a [`Sequent`].
#[derive(Debug, Clone)]
pub struct SequentOptions {
    /// Mailbox capacity. The default of 1 makes producers serialize
    /// naturally: an enqueue waits until the worker has taken the
    /// previous request. Values below 1 are raised to 1.
    pub mailbox_capacity: usize,
}

impl Default for SequentOptions {
    fn default() -> Self {
        Self { mailbox_capacity: 1 }
    }
}

/// Handle to a running sequent.
///
/// Cheap to clone; all clones address the same worker. Dropping every
/// clone terminates the worker with [`TerminateReason::Detached`].
///
/// # Example
///
/// ```ignore
/// let table = MethodTable::builder()
///     .method("Public", &[ParamKind::Bool], &[ParamKind::Bool], |_state, args| args)
///     .build();
/// let sequent = Sequent::spawn(State::default(), table);
///
/// let result = sequent.call("Public", vec![json!(true)]).await?;
/// assert_eq!(result, vec![json!(true)]);
/// ```
pub struct Sequent<S: Send + 'static> {
    id: SequentId,
    table: Arc<MethodTable<S>>,
    queue: Queue<Request<S>>,
    kill: mpsc::Sender<String>,
    running: Arc<AtomicBool>,
}

impl<S: Send + 'static> Clone for Sequent<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            table: Arc::clone(&self.table),
            queue: self.queue.clone(),
            kill: self.kill.clone(),
            running: Arc::clone(&self.running),
        }
    }
}

impl<S: Send + 'static> std::fmt::Debug for Sequent<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequent")
            .field("id", &self.id)
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish()
    }
}

impl<S: Send + 'static> Sequent<S> {
    /// Spawns an unsupervised sequent with a default mailbox.
    ///
    /// Must be called from within a Tokio runtime; the worker is a
    /// spawned task.
    #[must_use]
    pub fn spawn(state: S, table: MethodTable<S>) -> Self {
        Self::spawn_with(state, table, None, SequentOptions::default())
    }

    /// Spawns a sequent whose termination is reported to `supervisor`.
    ///
    /// The supervisor link is non-owning; if the supervisor is dropped
    /// first, the notification is skipped.
    #[must_use]
    pub fn spawn_supervised(
        state: S,
        table: MethodTable<S>,
        supervisor: Weak<dyn Supervisor>,
    ) -> Self {
        Self::spawn_with(state, table, Some(supervisor), SequentOptions::default())
    }

    /// Spawns a sequent with explicit options.
    #[must_use]
    pub fn spawn_with(
        state: S,
        table: MethodTable<S>,
        supervisor: Option<Weak<dyn Supervisor>>,
        options: SequentOptions,
    ) -> Self {
        let capacity = options.mailbox_capacity.max(1);
        let queue = Queue::new(capacity).expect("mailbox capacity is at least one");
        let (kill_tx, kill_rx) = mpsc::channel(1);
        let running = Arc::new(AtomicBool::new(true));
        let id = SequentId::new();

        let worker = SequentWorker {
            id,
            state,
            queue: queue.clone(),
            kill_rx,
            running: Arc::clone(&running),
            supervisor,
        };
        tokio::spawn(worker.run());
        debug!(%id, capacity, "sequent spawned");

        Self {
            id,
            table: Arc::new(table),
            queue,
            kill: kill_tx,
            running,
        }
    }

    /// Stable identity of this sequent; never nil.
    #[must_use]
    pub fn id(&self) -> SequentId {
        self.id
    }

    /// Returns `true` while the sequent accepts requests.
    ///
    /// Monotonic: once `false`, it stays `false`.
    #[must_use]
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Synchronous request: runs the named method on the owned state and
    /// returns its result tuple.
    ///
    /// Resolution and argument validation happen in the caller's context
    /// before any mailbox interaction; the enqueue then waits for mailbox
    /// space, and the reply for the handler.
    ///
    /// # Errors
    ///
    /// - [`SequentError::UnknownMethod`] — name not in the table
    /// - [`SequentError::WrongArity`] / [`SequentError::NotAssignable`] —
    ///   argument validation failed
    /// - [`SequentError::Stopped`] — the sequent was already terminated
    /// - [`SequentError::Died`] — the sequent terminated before replying
    /// - [`SequentError::HandlerFailed`] — a fallible handler's error side
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Vec<Value>, SequentError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = self.new_request(name, args, Some(reply_tx))?;
        if !self.running() {
            return Err(SequentError::Stopped);
        }
        self.queue
            .enqueue(request)
            .await
            .map_err(|_| SequentError::Stopped)?;
        match reply_rx.await {
            Ok(Ok(values)) => Ok(values),
            Ok(Err(message)) => Err(SequentError::HandlerFailed(message)),
            Err(_) => Err(SequentError::Died),
        }
    }

    /// Fire-and-forget request: returns once the invocation is enqueued.
    ///
    /// Validation is identical to [`call`](Self::call); the handler's
    /// return tuple (or failure) is discarded.
    ///
    /// # Errors
    ///
    /// As for [`call`](Self::call), minus the reply-side errors.
    pub async fn cast(&self, name: &str, args: Vec<Value>) -> Result<(), SequentError> {
        let request = self.new_request(name, args, None)?;
        if !self.running() {
            return Err(SequentError::Stopped);
        }
        self.queue
            .enqueue(request)
            .await
            .map_err(|_| SequentError::Stopped)
    }

    /// Requests orderly shutdown.
    ///
    /// `running()` turns false immediately, so new requests are rejected
    /// with [`SequentError::Stopped`]; requests already in the mailbox are
    /// either processed or purged, depending on how the worker races the
    /// kill. The supervisor observes [`TerminateReason::Requested`] with
    /// the given reason. Terminating an already-dead sequent is a no-op.
    pub async fn terminate(&self, reason: impl Into<String>) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.kill.send(reason.into()).await;
    }

    fn new_request(
        &self,
        name: &str,
        args: Vec<Value>,
        reply: Option<oneshot::Sender<Reply>>,
    ) -> Result<Request<S>, SequentError> {
        let method = self
            .table
            .resolve(name)
            .ok_or_else(|| SequentError::UnknownMethod(name.to_string()))?;
        method.validate_args(&args)?;
        Ok(Request::new(Arc::clone(method), args, reply))
    }
}

/// The worker side: exclusive owner of the state.
struct SequentWorker<S: Send + 'static> {
    id: SequentId,
    state: S,
    queue: Queue<Request<S>>,
    kill_rx: mpsc::Receiver<String>,
    running: Arc<AtomicBool>,
    supervisor: Option<Weak<dyn Supervisor>>,
}

impl<S: Send + 'static> SequentWorker<S> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                kill = self.kill_rx.recv() => {
                    let reason = match kill {
                        Some(message) => TerminateReason::Requested(message),
                        None => TerminateReason::Detached,
                    };
                    self.running.store(false, Ordering::SeqCst);
                    self.shut_down(reason);
                    return;
                }

                request = self.queue.dequeue() => {
                    let Some(request) = request else {
                        // Stopped by our own termination path; the
                        // supervisor was already notified.
                        return;
                    };
                    if let Some(reason) = self.process(request) {
                        self.shut_down(reason);
                        return;
                    }
                }
            }
        }
    }

    /// Runs one request. Returns a termination reason when the handler
    /// faulted.
    fn process(&mut self, request: Request<S>) -> Option<TerminateReason> {
        let (method, args, reply) = request.into_parts();
        let outcome = catch_unwind(AssertUnwindSafe(|| method.invoke(&mut self.state, args)));
        match outcome {
            Ok(result) => {
                if let Some(reply) = reply {
                    // A caller that gave up waiting is not an error.
                    let _ = reply.send(result);
                }
                None
            }
            Err(payload) => {
                self.running.store(false, Ordering::SeqCst);
                drop(reply);
                let fault = panic_text(payload.as_ref());
                warn!(id = %self.id, method = %method.name(), %fault, "handler fault");
                Some(TerminateReason::Fault(fault))
            }
        }
    }

    /// Termination path: notify the supervisor, then purge the mailbox.
    ///
    /// The order matters — the supervisor must observe "child gone" before
    /// pending callers are unblocked by the purge.
    fn shut_down(&self, reason: TerminateReason) {
        if let Some(supervisor) = self.supervisor.as_ref().and_then(Weak::upgrade) {
            supervisor.on_terminated(reason.clone(), self.id);
        }
        self.queue.stop();
        debug!(id = %self.id, %reason, "sequent terminated");
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "handler panicked".to_string()
    }
}
