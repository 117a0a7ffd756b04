use std::fmt;

use http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Dns,
    Tls,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Dns => "dns",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Inbound body unreadable or not the expected JSON.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// No HTTP response from the provider.
    #[error("transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },
    /// The provider answered with a non-2xx status.
    #[error("provider returned status {}: {body}", .status.as_u16())]
    Provider { status: StatusCode, body: String },
    /// A 2xx body that does not match the Messages schema.
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Status used when this error is answered on the compatibility path.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Transport {
                kind: TransportErrorKind::Timeout,
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Transport { .. } | GatewayError::Provider { .. } => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may reasonably try again. The gateway itself never
    /// retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport { .. } => true,
            GatewayError::Provider { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            GatewayError::BadRequest(_) | GatewayError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            GatewayError::bad_request("x").status(),
            StatusCode::BAD_REQUEST
        );
        let timeout = GatewayError::Transport {
            kind: TransportErrorKind::Timeout,
            message: "deadline".to_string(),
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        let refused = GatewayError::Transport {
            kind: TransportErrorKind::Connect,
            message: "refused".to_string(),
        };
        assert_eq!(refused.status(), StatusCode::BAD_GATEWAY);
        let overloaded = GatewayError::Provider {
            status: StatusCode::from_u16(529).unwrap(),
            body: "overloaded".to_string(),
        };
        assert_eq!(overloaded.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GatewayError::Decode("eof".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_name_the_kind() {
        let err = GatewayError::Provider {
            status: StatusCode::from_u16(529).unwrap(),
            body: r#"{"type":"error"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"provider returned status 529: {"type":"error"}"#
        );
        let err = GatewayError::Transport {
            kind: TransportErrorKind::Timeout,
            message: "operation timed out".to_string(),
        };
        assert_eq!(err.to_string(), "transport error (timeout): operation timed out");
    }

    #[test]
    fn retryable_kinds() {
        let provider = |code| GatewayError::Provider {
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        };
        assert!(provider(429).is_retryable());
        assert!(provider(529).is_retryable());
        assert!(!provider(400).is_retryable());
        assert!(!GatewayError::Decode(String::new()).is_retryable());
        assert!(!GatewayError::bad_request("x").is_retryable());
    }
}
