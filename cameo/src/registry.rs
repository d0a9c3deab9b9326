use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::actor::{ActorId, ActorRef};
use crate::error::RegistryError;

/// Concurrency-safe directory of live actors, keyed by identity.
///
/// An identity present here always refers to an actor whose task is running
/// or stopping. The task removes its own entry before signalling completion.
pub struct Registry {
    actors: RwLock<HashMap<ActorId, ActorRef>>,
    /// Identity excluded from [`Registry::list_active`].
    dead_letter_id: ActorId,
}

impl Registry {
    pub fn new(dead_letter_id: impl Into<ActorId>) -> Self {
        Self {
            actors: RwLock::new(HashMap::new()),
            dead_letter_id: dead_letter_id.into(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ActorId, ActorRef>> {
        self.actors.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ActorId, ActorRef>> {
        self.actors.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `actor` under `id` if the identity is free.
    pub(crate) fn register(&self, id: &str, actor: ActorRef) -> bool {
        let mut actors = self.write();
        if actors.contains_key(id) {
            return false;
        }
        actors.insert(id.to_string(), actor);
        true
    }

    pub(crate) fn unregister(&self, id: &str) -> Result<ActorRef, RegistryError> {
        self.write()
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<ActorRef> {
        self.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Snapshot of every registered actor except the dead letter actor.
    pub fn list_active(&self) -> Vec<ActorRef> {
        self.read()
            .iter()
            .filter(|(id, _)| **id != self.dead_letter_id)
            .map(|(_, actor)| actor.clone())
            .collect()
    }

    /// Snapshot of all registered identities, dead letter actor included.
    pub fn ids(&self) -> Vec<ActorId> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn dead_letter_id(&self) -> &str {
        &self.dead_letter_id
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("actor_count", &self.len())
            .field("dead_letter_id", &self.dead_letter_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorHandle;
    use std::sync::Arc;
    use std::thread;

    fn handle(id: &str) -> ActorRef {
        let (handle, _rx, _done) = ActorHandle::new(id.to_string(), None);
        Arc::new(handle)
    }

    #[test]
    fn test_register_and_get() {
        let registry = Registry::new("deadletter");
        assert!(registry.register("a", handle("a")));
        assert!(registry.contains("a"));
        assert_eq!(registry.get("a").map(|a| a.id().to_string()), Some("a".to_string()));
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn test_duplicate_register_keeps_original() {
        let registry = Registry::new("deadletter");
        let original = handle("a");
        assert!(registry.register("a", original.clone()));
        assert!(!registry.register("a", handle("a")));

        let found = registry.get("a").unwrap();
        assert!(Arc::ptr_eq(&found, &original));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = Registry::new("deadletter");
        registry.register("a", handle("a"));
        assert!(registry.unregister("a").is_ok());
        assert_eq!(
            registry.unregister("a").unwrap_err(),
            RegistryError::NotFound("a".to_string())
        );
        assert!(registry.is_empty());

        // identity is reusable once released
        assert!(registry.register("a", handle("a")));
    }

    #[test]
    fn test_list_active_excludes_dead_letter() {
        let registry = Registry::new("deadletter");
        registry.register("deadletter", handle("deadletter"));
        registry.register("a", handle("a"));
        registry.register("b", handle("b"));

        let mut active: Vec<_> = registry.list_active().iter().map(|a| a.id().to_string()).collect();
        active.sort();
        assert_eq!(active, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.ids().len(), 3);
    }

    #[test]
    fn test_concurrent_register_single_winner() {
        let registry = Arc::new(Registry::new("deadletter"));
        let winners: usize = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.register("contested", handle("contested")))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|t| t.join().unwrap() as usize)
            .sum();
        assert_eq!(winners, 1);
    }
}
