//! Fixed-length frame format.
//!
//! Every message, in both directions, is exactly 24 bytes:
//!
//! ```text
//! +--------+------+---------+------------------+------------+
//! | marker | kind | command | parameters       | terminator |
//! | "*S"   | 1    | 4 bytes | 16 bytes         | '\n'       |
//! +--------+------+---------+------------------+------------+
//!   0-1      2      3-6       7-22               23
//! ```

use crate::command::CommandCode;
use crate::error::ProtocolError;
use crate::params::{Parameters, PARAMS_LEN};
use bytes::{BufMut, BytesMut};
use std::fmt;

/// Total frame length in bytes.
pub const FRAME_LEN: usize = 24;

/// Marker opening every frame.
pub const MARKER: [u8; 2] = *b"*S";

/// Terminator closing every frame.
pub const TERMINATOR: u8 = b'\n';

const KIND_OFFSET: usize = 2;
const COMMAND_OFFSET: usize = 3;
const PARAMS_OFFSET: usize = 7;

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `C`: client changes a value on the device.
    Control,
    /// `E`: client queries a value.
    Enquiry,
    /// `A`: device replies to the outstanding request.
    Answer,
    /// `N`: device reports an unsolicited state change.
    Notify,
    /// Any other tag byte seen on the wire.
    Unknown(u8),
}

impl FrameKind {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'C' => FrameKind::Control,
            b'E' => FrameKind::Enquiry,
            b'A' => FrameKind::Answer,
            b'N' => FrameKind::Notify,
            other => FrameKind::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            FrameKind::Control => b'C',
            FrameKind::Enquiry => b'E',
            FrameKind::Answer => b'A',
            FrameKind::Notify => b'N',
            FrameKind::Unknown(other) => other,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", [self.as_byte()].escape_ascii())
    }
}

/// A single protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub command: CommandCode,
    pub parameters: Parameters,
}

impl Frame {
    pub fn new(kind: FrameKind, command: CommandCode, parameters: Parameters) -> Self {
        Self {
            kind,
            command,
            parameters,
        }
    }

    /// Creates a frame carrying a `#`-padded text parameter.
    pub fn text(kind: FrameKind, command: CommandCode, text: &str) -> Result<Self, ProtocolError> {
        Ok(Self::new(kind, command, Parameters::text(text)?))
    }

    /// Creates a frame carrying two 8-digit decimal fields.
    pub fn int_pair(
        kind: FrameKind,
        command: CommandCode,
        first: u32,
        second: u32,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::new(kind, command, Parameters::int_pair(first, second)?))
    }

    /// Creates a frame carrying a single integer.
    pub fn int(kind: FrameKind, command: CommandCode, value: u32) -> Result<Self, ProtocolError> {
        Ok(Self::new(kind, command, Parameters::int(value)?))
    }

    /// Creates a frame carrying a boolean.
    pub fn bool(kind: FrameKind, command: CommandCode, flag: bool) -> Self {
        Self::new(kind, command, Parameters::bool(flag))
    }

    /// Creates an enquiry with an empty parameter field.
    pub fn enquiry(command: CommandCode) -> Self {
        Self::new(FrameKind::Enquiry, command, Parameters::EMPTY)
    }

    /// Creates the connectivity notification emitted on connect/disconnect.
    pub fn connection(connected: bool) -> Self {
        Self::bool(FrameKind::Notify, CommandCode::CONNECTION, connected)
    }

    /// Encodes the frame into its 24-byte wire form.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(FRAME_LEN);
        buf.put_slice(&MARKER);
        buf.put_u8(self.kind.as_byte());
        buf.put_slice(self.command.as_bytes());
        buf.put_slice(self.parameters.as_bytes());
        buf.put_u8(TERMINATOR);
        buf
    }

    /// Decodes a frame from exactly 24 bytes.
    ///
    /// Only the length, marker and terminator are validated; an unknown
    /// kind tag decodes to [`FrameKind::Unknown`].
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() != FRAME_LEN {
            return Err(ProtocolError::InvalidLength(buf.len()));
        }
        if buf[..KIND_OFFSET] != MARKER {
            return Err(ProtocolError::InvalidMarker([buf[0], buf[1]]));
        }
        if buf[FRAME_LEN - 1] != TERMINATOR {
            return Err(ProtocolError::InvalidTerminator(buf[FRAME_LEN - 1]));
        }

        let mut command = [0u8; 4];
        command.copy_from_slice(&buf[COMMAND_OFFSET..PARAMS_OFFSET]);
        let mut parameters = [0u8; PARAMS_LEN];
        parameters.copy_from_slice(&buf[PARAMS_OFFSET..FRAME_LEN - 1]);

        Ok(Self {
            kind: FrameKind::from_byte(buf[KIND_OFFSET]),
            command: CommandCode::from_bytes(command),
            parameters: Parameters::from_bytes(parameters),
        })
    }

    /// Returns whether this is the connectivity pseudo-notification.
    pub fn is_connection(&self) -> bool {
        self.kind == FrameKind::Notify && self.command == CommandCode::CONNECTION
    }

    pub fn as_string(&self) -> Result<String, ProtocolError> {
        self.parameters.as_string()
    }

    pub fn as_int_pair(&self) -> Result<(u32, u32), ProtocolError> {
        self.parameters.as_int_pair()
    }

    pub fn as_int(&self) -> Result<u32, ProtocolError> {
        self.parameters.as_int()
    }

    pub fn as_bool(&self) -> Result<bool, ProtocolError> {
        self.parameters.as_bool()
    }

    pub fn as_error(&self) -> Result<(), ProtocolError> {
        self.parameters.as_error()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.command, self.parameters)
    }
}
