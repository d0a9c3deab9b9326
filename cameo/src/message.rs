//! Message envelopes and lifecycle notifications.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::actor::{ActorId, ActorRef};

/// Type-erased message payload.
///
/// Payloads are shared, not copied, when an envelope is cloned (for example
/// when the dead letter log hands out a snapshot).
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Delivered to every actor once, before its first real message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    _private: (),
}

/// Delivered to every actor once, after its inbox is closed and drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    _private: (),
}

/// An immutable message wrapper: payload, optional sender and target identity.
#[derive(Clone)]
pub struct Envelope {
    payload: Payload,
    payload_type: &'static str,
    sender: Option<ActorRef>,
    target: ActorId,
}

impl Envelope {
    pub(crate) fn new<M>(payload: M, sender: Option<ActorRef>, target: ActorId) -> Self
    where
        M: Any + Send + Sync,
    {
        Self {
            payload: Arc::new(payload),
            payload_type: type_name::<M>(),
            sender,
            target,
        }
    }

    pub(crate) fn started(target: ActorId) -> Self {
        Self::new(Started { _private: () }, None, target)
    }

    pub(crate) fn stopped(target: ActorId) -> Self {
        Self::new(Stopped { _private: () }, None, target)
    }

    /// The raw payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Borrow the payload as `M` if that is what it holds.
    pub fn downcast_ref<M: Any>(&self) -> Option<&M> {
        self.payload.downcast_ref::<M>()
    }

    /// Whether the payload is of type `M`.
    pub fn is<M: Any>(&self) -> bool {
        self.payload.is::<M>()
    }

    /// Name of the payload's concrete type, captured when the envelope was built.
    pub fn payload_type(&self) -> &'static str {
        self.payload_type
    }

    /// Whether this is a lifecycle notification rather than a user message.
    pub fn is_lifecycle(&self) -> bool {
        self.is::<Started>() || self.is::<Stopped>()
    }

    /// The sending actor. `None` for lifecycle notifications and sends from
    /// outside any actor.
    pub fn sender(&self) -> Option<&ActorRef> {
        self.sender.as_ref()
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().map(|s| s.id())
    }

    /// Identity the message was addressed to. Preserved when the message is
    /// redirected to the dead letter actor.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("payload_type", &self.payload_type)
            .field("sender", &self.sender_id())
            .field("target", &self.target)
            .finish()
    }
}
