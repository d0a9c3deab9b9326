//! # Actors
//!
//! An actor is any type implementing [`Actor`]: a single `receive` capability
//! invoked once per envelope, strictly one at a time, on the actor's own task.
//! The runtime keeps an [`ActorHandle`] per live actor in the registry; the
//! behavior itself is moved into the processing task at spawn time and is
//! never reachable from anywhere else.
//!
//! Handlers reach back into the runtime through the [`Context`] passed to
//! `receive`, which carries the owning [`Engine`] and the actor's own handle.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::engine::{Engine, StopHandle};
use crate::error::SpawnError;
use crate::message::Envelope;

/// Identity of an actor, unique within an engine's registry.
pub type ActorId = String;

/// Shared reference to a live (or stopping) actor.
pub type ActorRef = Arc<ActorHandle>;

/// The receive capability every actor implements.
///
/// `receive` is awaited to completion before the next envelope is dequeued,
/// so a slow handler stalls its own inbox and every sender blocked on it.
/// Sending to yourself from inside `receive` never completes, since the
/// only task that could accept the message is the one doing the sending.
#[async_trait]
pub trait Actor: Send + 'static {
    async fn receive(&mut self, ctx: &Context, envelope: Envelope);
}

/// Actor backed by a closure. See [`from_fn`].
pub struct FnActor<F> {
    f: F,
}

/// Wrap a synchronous closure as an actor.
pub fn from_fn<F>(f: F) -> FnActor<F>
where
    F: FnMut(&Context, Envelope) + Send + 'static,
{
    FnActor { f }
}

#[async_trait]
impl<F> Actor for FnActor<F>
where
    F: FnMut(&Context, Envelope) + Send + 'static,
{
    async fn receive(&mut self, ctx: &Context, envelope: Envelope) {
        (self.f)(ctx, envelope)
    }
}

impl<F> fmt::Debug for FnActor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnActor").finish_non_exhaustive()
    }
}

/// Runtime record for one actor.
pub struct ActorHandle {
    id: ActorId,
    /// Informational only; never traversed by the runtime.
    parent: Option<ActorId>,
    /// Sending half of the inbox. Taken (and so dropped) when the actor is stopped.
    inbox: Mutex<Option<flume::Sender<Envelope>>>,
    stopped: AtomicBool,
    completion: watch::Receiver<bool>,
}

impl ActorHandle {
    /// Build a handle together with the receiving half of its inbox and the
    /// sender side of its completion signal. Both belong to the processing task.
    pub(crate) fn new(
        id: ActorId,
        parent: Option<ActorId>,
    ) -> (Self, flume::Receiver<Envelope>, watch::Sender<bool>) {
        // Zero capacity: every send is a rendezvous with the processing task.
        let (inbox_tx, inbox_rx) = flume::bounded(0);
        let (done_tx, done_rx) = watch::channel(false);
        let handle = Self {
            id,
            parent,
            inbox: Mutex::new(Some(inbox_tx)),
            stopped: AtomicBool::new(false),
            completion: done_rx,
        };
        (handle, inbox_rx, done_tx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether a stop has been requested. The actor may still be draining.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Whether the processing task has fully exited.
    pub fn is_terminated(&self) -> bool {
        *self.completion.borrow()
    }

    pub(crate) fn inbox(&self) -> Option<flume::Sender<Envelope>> {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Set the stopped flag and close the inbox. Returns `false` if the flag
    /// was already set, in which case nothing is touched.
    pub(crate) fn close(&self) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        true
    }

    pub(crate) fn completion(&self) -> watch::Receiver<bool> {
        self.completion.clone()
    }
}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("stopped", &self.is_stopped())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// Runtime access for a handler: the engine plus the actor's own handle.
#[derive(Clone, Debug)]
pub struct Context {
    engine: Engine,
    myself: ActorRef,
}

impl Context {
    pub(crate) fn new(engine: Engine, myself: ActorRef) -> Self {
        Self { engine, myself }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn myself(&self) -> &ActorRef {
        &self.myself
    }

    pub fn id(&self) -> &str {
        self.myself.id()
    }

    /// Send to `target` with this actor as the sender.
    pub async fn send<M>(&self, target: &str, payload: M)
    where
        M: Any + Send + Sync,
    {
        self.engine.send(target, payload, Some(&self.myself)).await
    }

    /// Spawn an actor recording this one as its parent.
    pub fn spawn_child<A: Actor>(
        &self,
        id: impl Into<ActorId>,
        behavior: A,
    ) -> Result<ActorRef, SpawnError> {
        self.engine.spawn(id, behavior, Some(&self.myself))
    }

    pub fn stop(&self, target: &str) -> StopHandle {
        self.engine.stop(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_close_once() {
        let (handle, _rx, _done) = ActorHandle::new("x".to_string(), None);
        assert!(!handle.is_stopped());
        assert!(handle.inbox().is_some());

        assert!(handle.close());
        assert!(handle.is_stopped());
        assert!(handle.inbox().is_none());

        assert!(!handle.close());
    }

    #[test]
    fn test_close_disconnects_inbox() {
        let (handle, rx, _done) = ActorHandle::new("x".to_string(), None);
        assert!(!rx.is_disconnected());
        handle.close();
        assert!(rx.is_disconnected());
    }

    #[test]
    fn test_parent_and_completion() {
        let (handle, _rx, done) = ActorHandle::new("child".to_string(), Some("parent".to_string()));
        assert_eq!(handle.parent(), Some("parent"));
        assert!(!handle.is_terminated());
        done.send_replace(true);
        assert!(handle.is_terminated());
    }
}
