//! # Engine
//!
//! The engine owns the registry and drives every actor's lifecycle:
//!
//! - `spawn` registers a handle and starts a dedicated tokio task for it
//! - `send` resolves a target and hands the envelope over by rendezvous,
//!   falling back to the dead letter actor when the target is gone
//! - `stop` closes an inbox; the task drains it and exits
//! - `shutdown` stops everything, the dead letter actor last
//!
//! Each task runs `Started`, then every envelope in arrival order, then
//! `Stopped`, then removes itself from the registry and fires its completion
//! signal. Only that task ever touches the actor's behavior.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::actor::{Actor, ActorHandle, ActorId, ActorRef, Context};
use crate::config::EngineConfig;
use crate::dead_letter::{DeadLetter, DeadLetterLog};
use crate::error::{EngineError, SpawnError, StopError, TrySendError};
use crate::message::Envelope;
use crate::registry::Registry;

struct EngineInner {
    id: Uuid,
    config: EngineConfig,
    registry: Registry,
    dead_letters: DeadLetterLog,
    runtime: Handle,
    shutting_down: AtomicBool,
}

/// Entry point to the actor runtime. Cheap to clone; clones share state.
///
/// Call [`Engine::shutdown`] before dropping the last clone: live actor tasks
/// hold a clone of the engine themselves and stay parked until stopped.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.inner.id)
            .field("name", &self.inner.config.name)
            .field("actor_count", &self.inner.registry.len())
            .field("is_shutting_down", &self.is_shutting_down())
            .finish()
    }
}

impl Engine {
    /// Create an engine with the default configuration on the current tokio runtime.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let runtime = Handle::try_current()?;
        Self::with_runtime(config, runtime)
    }

    /// Create an engine whose actor tasks run on `runtime`.
    ///
    /// The dead letter actor is spawned before this returns; if that fails
    /// no engine is produced.
    pub fn with_runtime(config: EngineConfig, runtime: Handle) -> Result<Self, EngineError> {
        config.validate()?;

        let engine = Self {
            inner: Arc::new(EngineInner {
                id: Uuid::new_v4(),
                registry: Registry::new(config.dead_letter_id.clone()),
                dead_letters: DeadLetterLog::default(),
                config,
                runtime,
                shutting_down: AtomicBool::new(false),
            }),
        };

        let sink = DeadLetter::new(engine.inner.dead_letters.clone());
        engine
            .spawn(engine.inner.config.dead_letter_id.clone(), sink, None)
            .map_err(EngineError::DeadLetter)?;

        info!(
            engine = %engine.inner.id,
            name = %engine.inner.config.name,
            "Engine started"
        );
        Ok(engine)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Everything the dead letter actor has recorded.
    pub fn dead_letters(&self) -> &DeadLetterLog {
        &self.inner.dead_letters
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// Look up a live actor by identity.
    pub fn get_actor(&self, id: &str) -> Option<ActorRef> {
        self.inner.registry.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.registry.contains(id)
    }

    /// Identities of every registered actor except the dead letter actor.
    pub fn active_actors(&self) -> Vec<ActorId> {
        self.inner
            .registry
            .list_active()
            .iter()
            .map(|a| a.id().to_string())
            .collect()
    }

    /// Register `behavior` under `id` and start its processing task.
    ///
    /// The task delivers [`Started`](crate::message::Started) before
    /// accepting any message. On failure nothing is registered or started.
    pub fn spawn<A: Actor>(
        &self,
        id: impl Into<ActorId>,
        behavior: A,
        parent: Option<&ActorRef>,
    ) -> Result<ActorRef, SpawnError> {
        if self.is_shutting_down() {
            return Err(SpawnError::ShuttingDown);
        }

        let id = id.into();
        let (handle, inbox, done) = ActorHandle::new(id.clone(), parent.map(|p| p.id().to_string()));
        let handle = Arc::new(handle);

        if !self.inner.registry.register(&id, handle.clone()) {
            debug!(actor = %id, "Spawn rejected, identity in use");
            return Err(SpawnError::DuplicateIdentity(id));
        }

        let span = crate::actor_span!(type_name::<A>(), id.as_str(), engine = %self.inner.id);
        let ctx = Context::new(self.clone(), handle.clone());
        self.inner
            .runtime
            .spawn(run_actor(behavior, inbox, ctx, done).instrument(span));

        debug!(actor = %id, parent_actor = ?handle.parent(), "Actor spawned");
        Ok(handle)
    }

    /// Deliver `payload` to the actor registered as `target`.
    ///
    /// Suspends until the target's task takes the envelope. If the target is
    /// missing or already stopped the envelope goes to the dead letter actor
    /// instead, keeping its sender and original target. The caller is never
    /// told which of the two happened.
    pub async fn send<M>(&self, target: &str, payload: M, sender: Option<&ActorRef>)
    where
        M: Any + Send + Sync,
    {
        let envelope = Envelope::new(payload, sender.cloned(), target.to_string());
        match self.inner.registry.get(target) {
            Some(actor) => {
                if let Err(envelope) = push(&actor, envelope).await {
                    self.dead_letter(envelope).await;
                }
            }
            None => self.dead_letter(envelope).await,
        }
    }

    /// Like [`Engine::send`] but addressed by handle, skipping the registry lookup.
    pub async fn send_to<M>(&self, target: &ActorRef, payload: M, sender: Option<&ActorRef>)
    where
        M: Any + Send + Sync,
    {
        let envelope = Envelope::new(payload, sender.cloned(), target.id().to_string());
        if let Err(envelope) = push(target, envelope).await {
            self.dead_letter(envelope).await;
        }
    }

    /// Deliver `payload` only if `target` is idle and waiting for a message.
    ///
    /// Never blocks and never redirects to the dead letter actor.
    pub fn try_send<M>(
        &self,
        target: &str,
        payload: M,
        sender: Option<&ActorRef>,
    ) -> Result<(), TrySendError>
    where
        M: Any + Send + Sync,
    {
        let actor = self
            .inner
            .registry
            .get(target)
            .ok_or_else(|| TrySendError::NotFound(target.to_string()))?;
        let inbox = actor
            .inbox()
            .ok_or_else(|| TrySendError::Stopped(target.to_string()))?;

        let envelope = Envelope::new(payload, sender.cloned(), target.to_string());
        inbox.try_send(envelope).map_err(|e| match e {
            flume::TrySendError::Full(_) => TrySendError::NotReady(target.to_string()),
            flume::TrySendError::Disconnected(_) => TrySendError::Stopped(target.to_string()),
        })
    }

    async fn dead_letter(&self, envelope: Envelope) {
        let dead_letter_id = self.inner.config.dead_letter_id.as_str();
        let Some(sink) = self.inner.registry.get(dead_letter_id) else {
            error!(
                target_actor = envelope.target(),
                payload_type = envelope.payload_type(),
                "Dead letter actor unavailable, dropping message"
            );
            return;
        };

        if let Err(envelope) = push(&sink, envelope).await {
            error!(
                target_actor = envelope.target(),
                payload_type = envelope.payload_type(),
                "Dead letter actor stopped, dropping message"
            );
        }
    }

    /// Stop the actor registered as `target`.
    ///
    /// The returned handle resolves once the actor has drained its inbox,
    /// received `Stopped` and left the registry. A missing target yields an
    /// already-complete handle reporting [`StopError::NotFound`].
    pub fn stop(&self, target: &str) -> StopHandle {
        match self.inner.registry.get(target) {
            Some(actor) => self.stop_actor(&actor),
            None => {
                warn!(actor = target, "Stop requested for unknown actor");
                StopHandle::not_found(target)
            }
        }
    }

    /// Stop an actor by handle. Stopping twice is a reported no-op; the
    /// second handle still waits on the same completion.
    pub fn stop_actor(&self, actor: &ActorRef) -> StopHandle {
        if actor.close() {
            debug!(actor = actor.id(), "Actor inbox closed");
            StopHandle::new(actor, Ok(()))
        } else {
            warn!(actor = actor.id(), "Actor already stopped");
            StopHandle::new(actor, Err(StopError::AlreadyStopped(actor.id().to_string())))
        }
    }

    /// Stop every actor, wait for all of them, then stop the dead letter
    /// actor so that anything redirected during shutdown is still recorded.
    ///
    /// New spawns are refused from the moment this is called.
    pub async fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        info!(engine = %self.inner.id, "Engine shutting down");

        // Actors may spawn others while stopping; keep going until none are left.
        loop {
            let active = self.inner.registry.list_active();
            if active.is_empty() {
                break;
            }
            debug!(count = active.len(), "Stopping actors");
            let stops = active.iter().map(|actor| {
                actor.close();
                StopHandle::new(actor, Ok(())).wait()
            });
            join_all(stops).await;
        }

        if let Some(sink) = self.inner.registry.get(&self.inner.config.dead_letter_id) {
            self.stop_actor(&sink).wait().await;
        }

        info!(
            engine = %self.inner.id,
            dead_letters = self.inner.dead_letters.len(),
            "Engine shut down"
        );
    }
}

/// Hand `envelope` to `actor`'s task, giving it back if the inbox is closed.
async fn push(actor: &ActorHandle, envelope: Envelope) -> Result<(), Envelope> {
    let Some(inbox) = actor.inbox() else {
        return Err(envelope);
    };
    inbox
        .send_async(envelope)
        .await
        .map_err(|flume::SendError(envelope)| envelope)
}

/// Waitable result of a stop request.
#[derive(Debug)]
pub struct StopHandle {
    id: ActorId,
    completion: Option<watch::Receiver<bool>>,
    outcome: Result<(), StopError>,
}

impl StopHandle {
    fn new(actor: &ActorHandle, outcome: Result<(), StopError>) -> Self {
        Self {
            id: actor.id().to_string(),
            completion: Some(actor.completion()),
            outcome,
        }
    }

    fn not_found(id: &str) -> Self {
        Self {
            id: id.to_string(),
            completion: None,
            outcome: Err(StopError::NotFound(id.to_string())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `Ok` if this request closed the inbox, otherwise why it did nothing.
    pub fn outcome(&self) -> &Result<(), StopError> {
        &self.outcome
    }

    pub fn error(&self) -> Option<&StopError> {
        self.outcome.as_ref().err()
    }

    /// Whether the actor has fully exited (or never existed).
    pub fn is_complete(&self) -> bool {
        self.completion.as_ref().is_none_or(|rx| *rx.borrow())
    }

    /// Wait until the actor's task has exited.
    ///
    /// Awaiting this from inside the actor's own handler never completes.
    pub async fn wait(self) {
        if let Some(mut completion) = self.completion {
            // Err means the task is gone without signalling, which only
            // happens if the runtime itself was torn down.
            let _ = completion.wait_for(|done| *done).await;
        }
    }
}

/// Releases the actor's registry entry and completion signal when the
/// processing task ends, whether it returned normally or a handler panicked.
struct ExitGuard {
    engine: Engine,
    actor: ActorRef,
    done: watch::Sender<bool>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!(actor = self.actor.id(), "Actor handler panicked");
        }
        self.actor.close();
        if let Err(e) = self.engine.inner.registry.unregister(self.actor.id()) {
            warn!(actor = self.actor.id(), error = %e, "Unregister failed");
        }
        self.done.send_replace(true);
        crate::log_lifecycle!(self.actor.id(), "terminated");
    }
}

async fn run_actor<A: Actor>(
    mut behavior: A,
    inbox: flume::Receiver<Envelope>,
    ctx: Context,
    done: watch::Sender<bool>,
) {
    let id = ctx.id().to_string();
    let _guard = ExitGuard {
        engine: ctx.engine().clone(),
        actor: ctx.myself().clone(),
        done,
    };

    behavior.receive(&ctx, Envelope::started(id.clone())).await;
    crate::log_lifecycle!(id.as_str(), "started");

    // Ends once the handle's sender is taken and every in-flight send has landed.
    while let Ok(envelope) = inbox.recv_async().await {
        debug!(payload_type = envelope.payload_type(), sender = ?envelope.sender_id(), "Received");
        behavior.receive(&ctx, envelope).await;
    }

    behavior.receive(&ctx, Envelope::stopped(id.clone())).await;
    crate::log_lifecycle!(id.as_str(), "stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::from_fn;

    #[tokio::test]
    async fn test_new_engine_spawns_dead_letter() {
        let engine = Engine::new().unwrap();
        assert!(engine.contains("deadletter"));
        assert!(engine.active_actors().is_empty());
        engine.shutdown().await;
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn test_new_engine_requires_runtime() {
        assert!(matches!(Engine::new(), Err(EngineError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_dead_letter_id("");
        assert!(matches!(
            Engine::with_config(config),
            Err(EngineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_spawn_after_shutdown_is_refused() {
        let engine = Engine::new().unwrap();
        engine.shutdown().await;
        let result = engine.spawn("late", from_fn(|_, _| {}), None);
        assert_eq!(result.unwrap_err(), SpawnError::ShuttingDown);
    }

    #[tokio::test]
    async fn test_stop_unknown_actor_is_complete() {
        let engine = Engine::new().unwrap();
        let handle = engine.stop("ghost");
        assert!(handle.is_complete());
        assert_eq!(handle.error(), Some(&StopError::NotFound("ghost".to_string())));
        handle.wait().await;
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_after_shutdown_is_dropped() {
        let engine = Engine::new().unwrap();
        engine.shutdown().await;
        // no dead letter actor left; must return rather than hang
        engine.send("anyone", 1u8, None).await;
        assert!(engine.dead_letters().is_empty());
    }

    #[tokio::test]
    async fn test_custom_dead_letter_id() {
        let config = EngineConfig::default().with_dead_letter_id("lost");
        let engine = Engine::with_config(config).unwrap();
        assert!(engine.contains("lost"));
        assert!(!engine.contains("deadletter"));

        engine.send("nobody", "parcel", None).await;
        engine.shutdown().await;
        assert_eq!(engine.dead_letters().len(), 1);
    }
}
