//! Client error types.

use bravia_protocol::ProtocolError;
use std::time::Duration;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("failed to connect to {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {addr} timed out after {timeout:?}")]
    DialTimeout { addr: String, timeout: Duration },

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("client closed")]
    Closed,
}

impl ClientError {
    /// Returns whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Dial { .. }
            | ClientError::DialTimeout { .. }
            | ClientError::Write(_)
            | ClientError::NotConnected
            | ClientError::ConnectionClosed
            | ClientError::Timeout => true,
            ClientError::Protocol(_) | ClientError::Closed => false,
        }
    }

    /// Returns whether the device answered with the all-`F` sentinel.
    pub fn is_device_error(&self) -> bool {
        matches!(self, ClientError::Protocol(ProtocolError::DeviceError(_)))
    }

    /// Returns whether the device answered with the all-`N` sentinel.
    pub fn is_not_available(&self) -> bool {
        matches!(self, ClientError::Protocol(ProtocolError::NotAvailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::NotConnected.is_retryable());
        assert!(ClientError::ConnectionClosed.is_retryable());
        assert!(!ClientError::Closed.is_retryable());
        assert!(
            !ClientError::Protocol(ProtocolError::DeviceError("FFFFFFFFFFFFFFFF".into()))
                .is_retryable()
        );
    }

    #[test]
    fn test_sentinel_classification() {
        let err: ClientError = ProtocolError::DeviceError("FFFFFFFFFFFFFFFF".into()).into();
        assert!(err.is_device_error());
        assert!(!err.is_not_available());

        let err: ClientError = ProtocolError::NotAvailable("NNNNNNNNNNNNNNNN".into()).into();
        assert!(err.is_not_available());
        assert!(!err.is_device_error());
    }

    #[test]
    fn test_display() {
        let err = ClientError::DialTimeout {
            addr: "10.0.0.5:20060".into(),
            timeout: Duration::from_secs(5),
        };
        assert!(err.to_string().contains("10.0.0.5:20060"));
        assert_eq!(ClientError::Timeout.to_string(), "request timeout");
    }
}
