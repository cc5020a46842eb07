//! # bravia-protocol
//!
//! Wire protocol implementation for the display control protocol spoken over
//! TCP (port 20060 on the device).
//!
//! This crate provides:
//! - Fixed-length 24-byte framing with marker and terminator validation
//! - Parameter field encodings (text, integer pair, boolean) and accessors
//! - Command codes, input types and IR remote codes
//! - Typed decoding of unsolicited notifications

pub mod command;
pub mod error;
pub mod frame;
pub mod notification;
pub mod params;

pub use command::{CommandCode, InputType, IrCode};
pub use error::ProtocolError;
pub use frame::{Frame, FrameKind, FRAME_LEN, MARKER, TERMINATOR};
pub use notification::Notification;
pub use params::{Parameters, PARAMS_LEN};

/// Default TCP port of the device control service.
pub const DEFAULT_PORT: u16 = 20060;
