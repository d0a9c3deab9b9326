use crate::error::ConfigError;

pub const DEFAULT_ENGINE_NAME: &str = "cameo";
pub const DEFAULT_DEAD_LETTER_ID: &str = "deadletter";

/// Configuration for an [`Engine`](crate::engine::Engine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Name recorded on the engine's tracing span.
    pub name: String,

    /// Reserved identity under which the dead letter actor is spawned.
    pub dead_letter_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENGINE_NAME.to_string(),
            dead_letter_id: DEFAULT_DEAD_LETTER_ID.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_dead_letter_id(mut self, id: impl Into<String>) -> Self {
        self.dead_letter_id = id.into();
        self
    }

    /// Check the configuration before an engine is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.dead_letter_id.trim().is_empty() {
            return Err(ConfigError::EmptyDeadLetterId);
        }
        Ok(())
    }
}
