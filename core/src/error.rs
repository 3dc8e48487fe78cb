//! Error types for the gateway clients.
//!
//! # Design
//! Usage errors are split out because they are raised while parsing command
//! arguments, before any request exists. Everything that can go wrong once a
//! request is on its way lands in `ClientError`, which the binaries map to a
//! process exit code.

use thiserror::Error;

/// Locally detected invalid input. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("invalid date '{value}': date parameter should be in format YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("invalid {field} '{value}': expected one of {}", .allowed.join(", "))]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },
}

/// Errors returned while executing a command.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// Connection refused, DNS, TLS, timeout and other network-level failures.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered with a non-success status outside the accepted-empty set.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response was expected to be JSON but could not be parsed.
    #[error("malformed response body: {0}")]
    MalformedResponse(String),

    #[error("field '{field}' is not valid base64: {reason}")]
    Decode { field: &'static str, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Process exit code for this error. Usage errors share clap's code.
    pub fn exit_code(&self) -> u8 {
        match self {
            ClientError::Usage(_) => 2,
            _ => 1,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Connection(_) | ClientError::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_exit_with_two() {
        let err = ClientError::from(UsageError::InvalidDate {
            value: "01.02.2020".to_string(),
        });
        assert_eq!(err.exit_code(), 2);
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_errors_exit_with_one() {
        let refused = ClientError::Connection("refused".to_string());
        let status = ClientError::Status {
            status: 500,
            body: String::new(),
        };
        assert_eq!(refused.exit_code(), 1);
        assert_eq!(status.exit_code(), 1);
        assert!(refused.is_transport());
        assert!(status.is_transport());
    }

    #[test]
    fn invalid_choice_lists_allowed_values() {
        let err = UsageError::InvalidChoice {
            field: "purpose",
            value: "fun".to_string(),
            allowed: &["EMERGENCY", "TREATMENT", "PATIENT"],
        };
        assert_eq!(
            err.to_string(),
            "invalid purpose 'fun': expected one of EMERGENCY, TREATMENT, PATIENT"
        );
    }
}
