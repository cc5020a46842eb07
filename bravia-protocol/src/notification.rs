//! Typed view of unsolicited notifications.

use crate::command::{CommandCode, InputType};
use crate::error::ProtocolError;
use crate::frame::{Frame, FrameKind};
use std::fmt;

/// A decoded notify frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Connectivity to the device changed (`true` = connected).
    Connection(bool),
    Power(bool),
    AudioMute(bool),
    PictureMute(bool),
    Volume(u32),
    /// Active input changed; `input_type` is the raw code (see [`InputType`]).
    Input { input_type: u32, number: u32 },
    /// Any other notify frame, passed through untouched.
    Other(Frame),
}

impl Notification {
    /// Interprets a notify frame.
    ///
    /// Frames of another kind, or with an unlisted command, become
    /// [`Notification::Other`]; a listed command with a malformed parameter
    /// field is an error.
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        if frame.kind != FrameKind::Notify {
            return Ok(Notification::Other(*frame));
        }
        let notification = match frame.command {
            CommandCode::CONNECTION => Notification::Connection(frame.as_bool()?),
            CommandCode::POWER => Notification::Power(frame.as_bool()?),
            CommandCode::AUDIO_MUTE => Notification::AudioMute(frame.as_bool()?),
            CommandCode::PICTURE_MUTE => Notification::PictureMute(frame.as_bool()?),
            CommandCode::VOLUME => Notification::Volume(frame.as_int()?),
            CommandCode::INPUT => {
                let (input_type, number) = frame.as_int_pair()?;
                Notification::Input { input_type, number }
            }
            _ => Notification::Other(*frame),
        };
        Ok(notification)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Connection(true) => write!(f, "connected"),
            Notification::Connection(false) => write!(f, "disconnected"),
            Notification::Power(on) => write!(f, "power {}", on_off(*on)),
            Notification::AudioMute(on) => write!(f, "audio mute {}", on_off(*on)),
            Notification::PictureMute(on) => write!(f, "picture mute {}", on_off(*on)),
            Notification::Volume(volume) => write!(f, "volume {}", volume),
            Notification::Input { input_type, number } => {
                write!(f, "input {} {}", InputType::name_of(*input_type), number)
            }
            Notification::Other(frame) => write!(f, "{}", frame),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(wire: &[u8]) -> Notification {
        Notification::from_frame(&Frame::decode(wire).unwrap()).unwrap()
    }

    #[test]
    fn test_volume_notification() {
        assert_eq!(decode(b"*SNVOLU0000000000000025\n"), Notification::Volume(25));
    }

    #[test]
    fn test_input_notification() {
        let notification = decode(b"*SNINPT0000000100000003\n");
        assert_eq!(
            notification,
            Notification::Input {
                input_type: 1,
                number: 3
            }
        );
        assert_eq!(notification.to_string(), "input HDMI 3");
    }

    #[test]
    fn test_connection_notification() {
        let frame = Frame::connection(false);
        assert_eq!(
            Notification::from_frame(&frame).unwrap(),
            Notification::Connection(false)
        );
    }

    #[test]
    fn test_unlisted_command_passes_through() {
        let frame = Frame::decode(b"*SNSCENgeneral#########\n").unwrap();
        assert_eq!(
            Notification::from_frame(&frame).unwrap(),
            Notification::Other(frame)
        );
    }

    #[test]
    fn test_malformed_parameters_rejected() {
        let frame = Frame::decode(b"*SNPOWR0000000000000007\n").unwrap();
        assert!(matches!(
            Notification::from_frame(&frame),
            Err(ProtocolError::UnexpectedParameters(_))
        ));
    }

    #[test]
    fn test_answer_frames_are_other() {
        let frame = Frame::decode(b"*SAPOWR0000000000000001\n").unwrap();
        assert_eq!(
            Notification::from_frame(&frame).unwrap(),
            Notification::Other(frame)
        );
    }
}
