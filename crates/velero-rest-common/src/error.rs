//! Error types for velero-rest
//!
//! Every failure a request can hit maps onto one variant here. The HTTP layer
//! decides the status code; these variants only carry what went wrong.

use thiserror::Error;

/// Main error type for velero-rest operations
#[derive(Debug, Error)]
pub enum Error {
    /// Client configuration could not be read; defaults are used instead
    #[error("error reading config file {path}: {message}")]
    ConfigLoad {
        /// Path of the config file
        path: String,
        /// Description of what failed
        message: String,
    },

    /// The Kubernetes client could not be constructed
    #[error("{message}")]
    ClientUnavailable {
        /// Description of what failed
        message: String,
    },

    /// Object lookup returned nothing
    #[error("{resource} \"{name}\" not found")]
    NotFound {
        /// Plural resource with group (e.g. "backups.velero.io")
        resource: String,
        /// Name of the missing object
        name: String,
    },

    /// The requested options were rejected
    #[error("{message}")]
    Validation {
        /// Description of what's invalid
        message: String,
    },

    /// The request body did not have the expected shape
    #[error("{message}")]
    MalformedRequest {
        /// Description of what failed to parse
        message: String,
    },

    /// Optimistic concurrency conflict on update
    #[error("{message}")]
    Conflict {
        /// Message returned by the API server
        message: String,
    },

    /// Kubernetes API error
    #[error("{source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Where the error occurred
        context: String,
    },
}

impl Error {
    /// Create a client-unavailable error
    pub fn client_unavailable(msg: impl Into<String>) -> Self {
        Self::ClientUnavailable {
            message: msg.into(),
        }
    }

    /// Create a not-found error in the API server's wording
    pub fn not_found(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            name: name.into(),
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: msg.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict {
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Map a kube error, turning HTTP 409 responses into [`Error::Conflict`]
    pub fn from_kube(source: kube::Error) -> Self {
        match source {
            kube::Error::Api(ae) if ae.code == 409 => Self::Conflict { message: ae.message },
            source => Self::Kube { source },
        }
    }

    /// Whether this is an optimistic concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Whether this is a missing-object error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Kube {
                source: kube::Error::Api(ae),
            } => ae.code == 404,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, reason: &str, message: &str) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn not_found_uses_api_server_wording() {
        let err = Error::not_found("backups.velero.io", "nightly");
        assert_eq!(err.to_string(), "backups.velero.io \"nightly\" not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = Error::validation("a lowercase RFC 1123 subdomain must consist of ...");
        assert_eq!(
            err.to_string(),
            "a lowercase RFC 1123 subdomain must consist of ..."
        );
    }

    #[test]
    fn kube_conflict_becomes_conflict() {
        let err = Error::from_kube(api_error(
            409,
            "Conflict",
            "the object has been modified; please apply your changes to the latest version",
        ));
        assert!(err.is_conflict());
        assert!(err.to_string().contains("has been modified"));
    }

    #[test]
    fn kube_not_found_is_detected() {
        let err = Error::from_kube(api_error(404, "NotFound", "pods \"web-0\" not found"));
        assert!(!err.is_conflict());
        assert!(err.is_not_found());
    }

    #[test]
    fn config_load_names_the_path() {
        let err = Error::ConfigLoad {
            path: "/home/me/.config/velero/config.json".to_string(),
            message: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().contains("/home/me/.config/velero/config.json"));
    }
}
