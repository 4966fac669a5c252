use std::fmt;

use serde::{Deserialize, Serialize};

use super::api::ServerError;

/// Categories of record store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Non-success HTTP status
    Transport,
    /// Success status with a structured error list
    Backend,
    /// No response (connection, TLS, ...)
    Request,
    /// Response body could not be decoded
    Decode,
    /// Response decoded but lacked something the protocol requires
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Backend => write!(f, "backend"),
            ErrorKind::Request => write!(f, "request"),
            ErrorKind::Decode => write!(f, "decode"),
            ErrorKind::Protocol => write!(f, "protocol"),
        }
    }
}

/// Error raised by the record store client. Never retried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudKitError {
    Transport { status: u16, body: String },
    Backend { errors: Vec<ServerError> },
    Request { message: String },
    Decode { message: String, body: String },
    Protocol { message: String },
}

impl CloudKitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudKitError::Transport { .. } => ErrorKind::Transport,
            CloudKitError::Backend { .. } => ErrorKind::Backend,
            CloudKitError::Request { .. } => ErrorKind::Request,
            CloudKitError::Decode { .. } => ErrorKind::Decode,
            CloudKitError::Protocol { .. } => ErrorKind::Protocol,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CloudKitError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn request(err: &reqwest::Error) -> Self {
        CloudKitError::Request {
            message: err.to_string(),
        }
    }
}

impl fmt::Display for CloudKitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudKitError::Transport { status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {status}")
                } else {
                    write!(f, "HTTP {status}: {body}")
                }
            }
            CloudKitError::Backend { errors } => {
                write!(f, "CloudKit reported {} error(s)", errors.len())?;
                if let Some(first) = errors.first() {
                    write!(f, ": {}", first.server_error_code)?;
                    if let Some(reason) = &first.reason {
                        write!(f, " ({reason})")?;
                    }
                }
                Ok(())
            }
            CloudKitError::Request { message } => write!(f, "request failed: {message}"),
            CloudKitError::Decode { message, .. } => {
                write!(f, "failed to decode CloudKit response: {message}")
            }
            CloudKitError::Protocol { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CloudKitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_display_uses_first_error() {
        let err = CloudKitError::Backend {
            errors: vec![ServerError {
                server_error_code: "BAD_REQUEST".to_string(),
                reason: Some("unknown field".to_string()),
                record_name: None,
            }],
        };
        assert_eq!(
            err.to_string(),
            "CloudKit reported 1 error(s): BAD_REQUEST (unknown field)"
        );
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_transport_display() {
        let err = CloudKitError::Transport {
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP 503");
        assert_eq!(err.status(), Some(503));
    }
}
