// cameo: a minimal in-process actor runtime
//
// Actors exchange messages through an `Engine`. Each actor owns its state and
// processes its inbox one envelope at a time on its own tokio task; sends are
// rendezvous hand-offs, and messages to unknown actors land in a dead letter
// actor instead of being lost.

pub mod actor;
pub mod config;
pub mod dead_letter;
pub mod engine;
pub mod error;
pub mod logging;
pub mod message;
pub mod registry;

// Re-export key types for easier usage
pub use actor::{Actor, ActorHandle, ActorId, ActorRef, Context, FnActor, from_fn};
pub use config::EngineConfig;
pub use dead_letter::{DeadLetter, DeadLetterLog};
pub use engine::{Engine, StopHandle};
pub use error::{ConfigError, EngineError, RegistryError, SpawnError, StopError, TrySendError};
pub use message::{Envelope, Payload, Started, Stopped};
pub use registry::Registry;

// Used by the exported logging macros.
#[doc(hidden)]
pub use tracing;
