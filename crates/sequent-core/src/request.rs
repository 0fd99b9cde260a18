//! The queued unit of work.

use crate::queue::Message;
use crate::table::MethodDescriptor;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Outcome delivered on a call's reply channel: the handler's return
/// tuple, or the unwrapped error of a fallible handler.
pub(crate) type Reply = Result<Vec<Value>, String>;

/// A resolved, validated invocation waiting in the mailbox.
///
/// Calls carry a reply sender; casts do not. Dropping the sender without
/// sending is how the runtime signals `SequentError::Died` to a waiting
/// caller, so the purge path only has to drop it.
pub(crate) struct Request<S> {
    method: Arc<MethodDescriptor<S>>,
    args: Vec<Value>,
    reply: Option<oneshot::Sender<Reply>>,
}

impl<S> Request<S> {
    pub(crate) fn new(
        method: Arc<MethodDescriptor<S>>,
        args: Vec<Value>,
        reply: Option<oneshot::Sender<Reply>>,
    ) -> Self {
        Self { method, args, reply }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Arc<MethodDescriptor<S>>,
        Vec<Value>,
        Option<oneshot::Sender<Reply>>,
    ) {
        (self.method, self.args, self.reply)
    }
}

impl<S: Send + 'static> Message for Request<S> {
    fn purged(self) {
        debug!(method = %self.method.name(), "request purged before delivery");
        drop(self.reply);
    }
}
