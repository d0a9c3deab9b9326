// Integration tests for error types in cameo::error

use cameo::error::*;

#[test]
fn test_spawn_error_display() {
    assert_eq!(
        SpawnError::DuplicateIdentity("baker".to_string()).to_string(),
        "Actor with identity already exists: baker"
    );
    assert_eq!(SpawnError::ShuttingDown.to_string(), "Engine is shutting down");
}

#[test]
fn test_stop_error_display() {
    assert_eq!(StopError::NotFound("baker".to_string()).to_string(), "Actor not found: baker");
    assert_eq!(
        StopError::AlreadyStopped("baker".to_string()).to_string(),
        "Actor already stopped: baker"
    );
}

#[test]
fn test_registry_error_display() {
    assert_eq!(
        RegistryError::NotFound("baker".to_string()).to_string(),
        "Actor baker does not exist"
    );
}

#[test]
fn test_try_send_error_display() {
    assert_eq!(TrySendError::NotFound("a".to_string()).to_string(), "Actor not found: a");
    assert_eq!(TrySendError::Stopped("a".to_string()).to_string(), "Actor inbox is closed: a");
    assert_eq!(
        TrySendError::NotReady("a".to_string()).to_string(),
        "Actor is not ready to receive: a"
    );
}

#[test]
fn test_engine_error_display() {
    let err = EngineError::from(ConfigError::EmptyDeadLetterId);
    assert_eq!(
        err.to_string(),
        "Invalid configuration: Dead letter identity must not be empty"
    );

    let err = EngineError::DeadLetter(SpawnError::ShuttingDown);
    assert_eq!(err.to_string(), "Could not spawn dead letter actor: Engine is shutting down");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_engine_error_outside_runtime() {
    let err = cameo::Engine::new().unwrap_err();
    assert!(err.to_string().starts_with("No tokio runtime available"));
}
