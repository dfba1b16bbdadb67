//! Error types for mutabakat-core

use thiserror::Error;

/// Top-level error type for mutabakat-core
#[derive(Error, Debug)]
pub enum MutabakatError {
    #[error("Push error: {0}")]
    Push(#[from] PushError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Live channel error: {0}")]
    Live(#[from] LiveError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures of an attempted push registration operation
///
/// "Not ready" conditions are not errors; see [`crate::push::Outcome`].
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Notification permission was denied")]
    PermissionDenied,

    #[error("Notification permission prompt was dismissed")]
    PermissionDismissed,

    #[error("Failed to register background worker: {0}")]
    WorkerRegistration(#[source] PlatformError),

    #[error("Failed to read existing push subscription: {0}")]
    SubscriptionLookup(#[source] PlatformError),

    #[error("Failed to create push subscription: {0}")]
    SubscriptionCreate(#[source] PlatformError),

    #[error("Registry request failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid server key: {0}")]
    InvalidServerKey(String),
}

/// Errors from the remote push registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid registry URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors from the live channel transport
#[derive(Error, Debug)]
pub enum LiveError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transport is closed")]
    Closed,

    #[error("Invalid live channel URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Origin scheme {0} cannot carry a live channel")]
    UnsupportedScheme(String),
}

/// Errors reported by a platform adapter (push, worker, notification or cache APIs)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Platform capability unavailable: {0}")]
    Unavailable(String),

    #[error("Platform operation failed: {0}")]
    Failed(String),
}

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_error_permission_denied_displays_correctly() {
        let error = PushError::PermissionDenied;
        assert!(error.to_string().contains("denied"));
    }

    #[test]
    fn push_error_wraps_platform_cause() {
        let error = PushError::SubscriptionCreate(PlatformError::Failed("quota".to_string()));
        assert!(error.to_string().contains("Failed to create push subscription"));
        assert!(error.to_string().contains("quota"));
    }

    #[test]
    fn registry_status_error_displays_correctly() {
        let error = RegistryError::Status {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert!(error.to_string().contains("503"));
        assert!(error.to_string().contains("maintenance"));
    }

    #[test]
    fn push_error_converts_from_registry_error() {
        let registry_error = RegistryError::Status {
            status: 500,
            message: String::new(),
        };
        let push_error: PushError = registry_error.into();
        assert!(matches!(push_error, PushError::Registry(_)));
    }

    #[test]
    fn mutabakat_error_converts_from_live_error() {
        let error: MutabakatError = LiveError::Closed.into();
        assert!(matches!(error, MutabakatError::Live(_)));
        assert!(error.to_string().contains("Live channel error"));
    }

    #[test]
    fn mutabakat_error_converts_from_platform_error() {
        let error: MutabakatError = PlatformError::Unavailable("push".to_string()).into();
        assert!(matches!(error, MutabakatError::Platform(_)));
    }
}
