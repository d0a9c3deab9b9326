//! The dead letter actor absorbs messages whose target could not be resolved.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::warn;

use crate::actor::{Actor, Context};
use crate::message::Envelope;

/// Append-only record of undeliverable envelopes, in arrival order.
///
/// Shared between the dead letter actor (the only writer) and the engine,
/// which hands it out to readers. Never evicts.
#[derive(Clone, Debug, Default)]
pub struct DeadLetterLog {
    messages: Arc<Mutex<Vec<Envelope>>>,
}

impl DeadLetterLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Envelope>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, envelope: Envelope) {
        self.lock().push(envelope);
    }

    /// Snapshot of everything recorded so far.
    pub fn messages(&self) -> Vec<Envelope> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Actor that records every non-lifecycle envelope it receives.
#[derive(Debug)]
pub struct DeadLetter {
    log: DeadLetterLog,
}

impl DeadLetter {
    pub fn new(log: DeadLetterLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Actor for DeadLetter {
    async fn receive(&mut self, _ctx: &Context, envelope: Envelope) {
        if envelope.is_lifecycle() {
            return;
        }
        warn!(
            sender = envelope.sender_id().unwrap_or("<none>"),
            target_actor = envelope.target(),
            payload_type = envelope.payload_type(),
            "dead letter"
        );
        self.log.record(envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preserves_order() {
        let log = DeadLetterLog::default();
        assert!(log.is_empty());
        log.record(Envelope::new(1u32, None, "a".to_string()));
        log.record(Envelope::new(2u32, None, "b".to_string()));

        let messages = log.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(messages[0].downcast_ref::<u32>(), Some(&1));
        assert_eq!(messages[1].target(), "b");
    }

    #[test]
    fn test_clones_share_storage() {
        let log = DeadLetterLog::default();
        let reader = log.clone();
        log.record(Envelope::new("lost", None, "nobody".to_string()));
        assert_eq!(reader.len(), 1);
    }
}
