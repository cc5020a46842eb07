//! Protocol error types.

use thiserror::Error;

/// Errors raised while framing, encoding or interpreting protocol messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid frame length: expected 24 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid frame marker: expected '*S', got {0:?}")]
    InvalidMarker([u8; 2]),

    #[error("invalid frame terminator: expected '\\n', got {0:#04x}")]
    InvalidTerminator(u8),

    #[error("unexpected frame kind: {0:#04x}")]
    UnexpectedFrameKind(u8),

    #[error("invalid command code: {0:?} (must be 4 ASCII bytes)")]
    InvalidCommand(String),

    #[error("parameter field too long: {len} bytes (max 16)")]
    ParametersTooLong { len: usize },

    #[error("value out of range: {0} (max 99999999)")]
    ValueOutOfRange(u32),

    /// The device answered with the all-`F` sentinel.
    #[error("device reported an error: {0}")]
    DeviceError(String),

    /// The device answered with the all-`N` sentinel.
    #[error("not available: {0}")]
    NotAvailable(String),

    #[error("unexpected parameter encoding: {0}")]
    UnexpectedParameters(String),
}

impl ProtocolError {
    /// Returns whether the error is a framing failure, i.e. the byte stream
    /// can no longer be trusted to be aligned on frame boundaries.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidLength(_)
                | ProtocolError::InvalidMarker(_)
                | ProtocolError::InvalidTerminator(_)
                | ProtocolError::UnexpectedFrameKind(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desync_classification() {
        assert!(ProtocolError::InvalidLength(23).is_desync());
        assert!(ProtocolError::InvalidMarker(*b"XX").is_desync());
        assert!(ProtocolError::InvalidTerminator(b'x').is_desync());
        assert!(ProtocolError::UnexpectedFrameKind(b'Z').is_desync());
        assert!(!ProtocolError::DeviceError("FFFFFFFFFFFFFFFF".into()).is_desync());
        assert!(!ProtocolError::ParametersTooLong { len: 17 }.is_desync());
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidLength(7);
        assert!(err.to_string().contains('7'));

        let err = ProtocolError::InvalidTerminator(0x41);
        assert!(err.to_string().contains("0x41"));

        let err = ProtocolError::ParametersTooLong { len: 20 };
        assert!(err.to_string().contains("20"));

        let err = ProtocolError::DeviceError("FFFFFFFFFFFFFFFF".into());
        assert!(err.to_string().contains("FFFFFFFFFFFFFFFF"));

        let err = ProtocolError::NotAvailable("NNNNNNNNNNNNNNNN".into());
        assert!(err.to_string().contains("NNNNNNNNNNNNNNNN"));
    }
}
