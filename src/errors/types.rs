//! Error type definitions for listings synchronization
//!
//! A single enum covers every failure the engine can surface. Callers use the
//! classification helpers rather than matching on message text.

use thiserror::Error;

/// Top-level listings error type
#[derive(Error, Debug)]
pub enum ListingsError {
    /// Missing or invalid configuration (username, password, listings id, ...)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The listings service rejected the credentials or no token could be obtained
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Non-success HTTP status from the listings service
    #[error("HTTP error: {status} - {message}")]
    Transport { status: u16, message: String },

    /// Connection, TLS or timeout failure below the HTTP layer
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected JSON shape
    #[error("Failed to parse {context} response: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The service broke its own contract (e.g. a schedule references unknown program details)
    #[error("Service contract violated: {message}")]
    ServiceInvariant { message: String },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

impl ListingsError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a transport error for a non-success status
    pub fn transport<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create a parse error with the name of the payload being decoded
    pub fn parse<S: Into<String>>(context: S, source: serde_json::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a service invariant violation
    pub fn service_invariant<S: Into<String>>(message: S) -> Self {
        Self::ServiceInvariant {
            message: message.into(),
        }
    }

    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the error came from caller cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the listings service answered the token request with 400 (invalid credentials)
    pub fn is_auth_rejection(&self) -> bool {
        self.status() == Some(400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = ListingsError::transport(400, "Bad Request");
        assert_eq!(err.status(), Some(400));
        assert!(err.is_auth_rejection());
        assert!(!err.is_cancelled());

        let err = ListingsError::transport(503, "Service Unavailable");
        assert!(!err.is_auth_rejection());

        assert_eq!(ListingsError::configuration("missing").status(), None);
        assert!(ListingsError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_display_messages() {
        let err = ListingsError::transport(403, "Forbidden");
        assert_eq!(err.to_string(), "HTTP error: 403 - Forbidden");

        let err = ListingsError::configuration("Listings Id required");
        assert_eq!(err.to_string(), "Configuration error: Listings Id required");
    }
}
