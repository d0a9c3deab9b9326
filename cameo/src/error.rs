use thiserror::Error;

use crate::actor::ActorId;

/// Errors related to spawning actors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    #[error("Actor with identity already exists: {0}")]
    DuplicateIdentity(ActorId),
    #[error("Engine is shutting down")]
    ShuttingDown,
}

/// Outcome reported by a stop request that did not close an inbox.
///
/// These are never raised; callers find them on the returned
/// [`StopHandle`](crate::engine::StopHandle).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopError {
    #[error("Actor not found: {0}")]
    NotFound(ActorId),
    #[error("Actor already stopped: {0}")]
    AlreadyStopped(ActorId),
}

/// Errors related to registry bookkeeping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Actor {0} does not exist")]
    NotFound(ActorId),
}

/// Errors returned by the non-blocking send path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrySendError {
    #[error("Actor not found: {0}")]
    NotFound(ActorId),
    #[error("Actor inbox is closed: {0}")]
    Stopped(ActorId),
    #[error("Actor is not ready to receive: {0}")]
    NotReady(ActorId),
}

/// Errors related to engine configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Engine name must not be empty")]
    EmptyName,
    #[error("Dead letter identity must not be empty")]
    EmptyDeadLetterId,
}

/// Errors that prevent an engine from starting.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("Could not spawn dead letter actor: {0}")]
    DeadLetter(#[source] SpawnError),
}
