//! Error types for fabric service operations.
//!
//! Verification mismatches are never errors; they are accumulated as
//! findings. A pending identifier allocation is not an error either. The
//! variants here cover the cases where an operation cannot produce a result.

use std::io;
use thiserror::Error;

use netfabric_types::ModelError;

/// Process exit codes of the service binaries.
pub mod exit_code {
    /// The test action ran and reported findings.
    pub const FINDINGS: u8 = 1;
    /// Devices or the allocator store could not be reached.
    pub const TRANSPORT: u8 = 2;
    /// The request itself is invalid: intent model, configuration or input.
    pub const INVALID_REQUEST: u8 = 3;
    /// Any other failure.
    pub const INTERNAL: u8 = 4;
}

/// Result type alias for fabric service operations.
pub type FabricResult<T> = Result<T, FabricError>;

/// Errors that can occur during planning or verification.
#[derive(Debug, Error)]
pub enum FabricError {
    /// A topology element required by the operation is absent.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The intent snapshot violates a structural invariant.
    #[error("Invalid model for {field}: {message}")]
    InvalidModel {
        /// Model path of the offending element.
        field: String,
        /// Error message.
        message: String,
    },

    /// The identifier allocator store failed.
    #[error("Allocation '{allocation}' in pool '{pool}' failed: {message}")]
    Allocation {
        /// Pool name.
        pool: String,
        /// Allocation name.
        allocation: String,
        /// Error message.
        message: String,
    },

    /// A device could not be reached or its output could not be parsed.
    #[error("Transport failure on device '{device}': {message}")]
    Transport {
        /// Device name.
        device: String,
        /// Error message.
        message: String,
    },

    /// The wall-clock budget of a pass was exceeded.
    #[error("Operation timed out after {budget_secs}s")]
    Timeout {
        /// Budget in seconds.
        budget_secs: u64,
    },

    /// Engine configuration file could not be parsed.
    #[error("Failed to load config file {path}: {message}")]
    ConfigFile {
        /// Path of the file.
        path: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl From<ModelError> for FabricError {
    fn from(err: ModelError) -> Self {
        Self::InvalidModel {
            field: err.field,
            message: err.message,
        }
    }
}

impl FabricError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid model error.
    pub fn invalid_model(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an allocator store error.
    pub fn allocation(
        pool: impl Into<String>,
        allocation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Allocation {
            pool: pool.into(),
            allocation: allocation.into(),
            message: message.into(),
        }
    }

    /// Creates a device transport error.
    pub fn transport(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            device: device.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the operation could not check or apply the fabric at
    /// all, as opposed to finding something wrong with it.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FabricError::Transport { .. }
                | FabricError::Timeout { .. }
                | FabricError::Allocation { .. }
        )
    }

    /// Returns true if the request cannot succeed as given, whatever the
    /// state of the network.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            FabricError::Configuration { .. }
                | FabricError::InvalidModel { .. }
                | FabricError::ConfigFile { .. }
        )
    }

    /// Exit code a service binary reports for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_transport() {
            exit_code::TRANSPORT
        } else if self.is_invalid_request() {
            exit_code::INVALID_REQUEST
        } else {
            exit_code::INTERNAL
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FabricError::Allocation { .. }
                | FabricError::Transport { .. }
                | FabricError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FabricError::transport("sw1", "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport failure on device 'sw1': connection refused"
        );
    }

    #[test]
    fn test_allocation_error() {
        let err = FabricError::allocation("VPC-DOMAIN-ID-POOL-dc1", "SWITCH-PAIR-core", "store down");
        assert_eq!(
            err.to_string(),
            "Allocation 'SWITCH-PAIR-core' in pool 'VPC-DOMAIN-ID-POOL-dc1' failed: store down"
        );
    }

    #[test]
    fn test_from_model_error() {
        let err: FabricError = ModelError::new("switch-pair[core]", "bad").into();
        assert!(matches!(err, FabricError::InvalidModel { .. }));
        assert_eq!(err.to_string(), "Invalid model for switch-pair[core]: bad");
    }

    #[test]
    fn test_is_transport() {
        assert!(FabricError::transport("sw1", "unreachable").is_transport());
        assert!(FabricError::Timeout { budget_secs: 360 }.is_transport());
        assert!(!FabricError::configuration("no layer3 pair").is_transport());
        assert!(!FabricError::internal("bug").is_transport());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(FabricError::transport("sw1", "unreachable").exit_code(), exit_code::TRANSPORT);
        assert_eq!(FabricError::Timeout { budget_secs: 360 }.exit_code(), exit_code::TRANSPORT);
        assert_eq!(
            FabricError::configuration("no layer3 pair").exit_code(),
            exit_code::INVALID_REQUEST
        );
        assert_eq!(
            FabricError::invalid_model("switch-pair", "bad").exit_code(),
            exit_code::INVALID_REQUEST
        );
        assert_eq!(FabricError::internal("bug").exit_code(), exit_code::INTERNAL);
        assert_ne!(
            FabricError::configuration("no layer3 pair").exit_code(),
            exit_code::FINDINGS
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(FabricError::allocation("p", "a", "timeout").is_retryable());
        assert!(!FabricError::configuration("no layer3 pair").is_retryable());
        assert!(!FabricError::invalid_model("switch-pair", "bad").is_retryable());
    }
}
