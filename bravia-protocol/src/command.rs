//! Command codes and static lookup tables.

use crate::error::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// A 4-byte command code such as `POWR` or `VOLU`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandCode([u8; 4]);

impl CommandCode {
    /// Sends codes of the remote controller.
    pub const IR_CODE: Self = Self(*b"IRCC");
    /// Power status (bool).
    pub const POWER: Self = Self(*b"POWR");
    /// Toggles the power status.
    pub const TOGGLE_POWER: Self = Self(*b"TPOW");
    /// Audio volume (int).
    pub const VOLUME: Self = Self(*b"VOLU");
    /// Audio mute (bool).
    pub const AUDIO_MUTE: Self = Self(*b"AMUT");
    /// Input type and number (int pair).
    pub const INPUT: Self = Self(*b"INPT");
    /// Picture mute (bool).
    pub const PICTURE_MUTE: Self = Self(*b"PMUT");
    /// Toggles the picture mute.
    pub const TOGGLE_PICTURE_MUTE: Self = Self(*b"TPMU");
    /// Broadcast IPv4 address of an interface (text).
    pub const BROADCAST_ADDRESS: Self = Self(*b"BADR");
    /// MAC address of an interface (text).
    pub const MAC_ADDRESS: Self = Self(*b"MADR");
    /// Scene setting (text).
    pub const SCENE: Self = Self(*b"SCEN");
    /// Reserved pseudo-command carrying connectivity changes (bool).
    ///
    /// The trailing NUL keeps it outside the device's command namespace.
    pub const CONNECTION: Self = Self(*b"tcp\0");

    /// Wraps raw bytes without validation.
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Returns the raw code bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl FromStr for CommandCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ProtocolError::InvalidCommand(s.to_string()))?;
        if !bytes.iter().all(u8::is_ascii_graphic) {
            return Err(ProtocolError::InvalidCommand(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandCode({})", self)
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// Input types carried in the first field of `INPT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    Hdmi,
    Component,
    ScreenMirroring,
}

impl InputType {
    /// Wire code of the input type.
    pub fn code(self) -> u32 {
        match self {
            InputType::Hdmi => 1,
            InputType::Component => 4,
            InputType::ScreenMirroring => 5,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(InputType::Hdmi),
            4 => Some(InputType::Component),
            5 => Some(InputType::ScreenMirroring),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            InputType::Hdmi => "HDMI",
            InputType::Component => "Component",
            InputType::ScreenMirroring => "Screen Mirroring",
        }
    }

    /// Name for a raw input code, `"Unknown"` when the code is not listed.
    pub fn name_of(code: u32) -> &'static str {
        Self::from_code(code).map_or("Unknown", Self::name)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InputType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hdmi" => Ok(InputType::Hdmi),
            "component" => Ok(InputType::Component),
            "mirror" | "screen-mirroring" | "screen_mirroring" => Ok(InputType::ScreenMirroring),
            other => other
                .parse::<u32>()
                .ok()
                .and_then(Self::from_code)
                .ok_or_else(|| ProtocolError::UnexpectedParameters(s.to_string())),
        }
    }
}

macro_rules! ir_codes {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// Remote-controller codes accepted by `IRCC`.
        ///
        /// Many of them produce no feedback from the device.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum IrCode {
            $($variant,)*
        }

        impl IrCode {
            /// Every known code, in ascending order.
            pub const ALL: &'static [IrCode] = &[$(IrCode::$variant,)*];

            pub fn code(self) -> u32 {
                match self {
                    $(IrCode::$variant => $code,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(IrCode::$variant => $name,)*
                }
            }

            pub fn from_code(code: u32) -> Option<Self> {
                Self::ALL.iter().copied().find(|ir| ir.code() == code)
            }
        }
    };
}

ir_codes! {
    Display = 5 => "display",
    Home = 6 => "home",
    Options = 7 => "options",
    Return = 8 => "return",
    Up = 9 => "up",
    Down = 10 => "down",
    Right = 11 => "right",
    Left = 12 => "left",
    Confirm = 13 => "confirm",
    Red = 14 => "red",
    Green = 15 => "green",
    Yellow = 16 => "yellow",
    Blue = 17 => "blue",
    Num1 = 18 => "num1",
    Num2 = 19 => "num2",
    Num3 = 20 => "num3",
    Num4 = 21 => "num4",
    Num5 = 22 => "num5",
    Num6 = 23 => "num6",
    Num7 = 24 => "num7",
    Num8 = 25 => "num8",
    Num9 = 26 => "num9",
    Num0 = 27 => "num0",
    VolumeUp = 30 => "volume-up",
    VolumeDown = 31 => "volume-down",
    Mute = 32 => "mute",
    ChannelUp = 33 => "channel-up",
    ChannelDown = 34 => "channel-down",
    Subtitle = 35 => "subtitle",
    Dot = 38 => "dot",
    PictureOff = 50 => "picture-off",
    Wide = 61 => "wide",
    Jump = 62 => "jump",
    SyncMenu = 76 => "sync-menu",
    Forward = 77 => "forward",
    Play = 78 => "play",
    Rewind = 79 => "rewind",
    Prev = 80 => "prev",
    Stop = 81 => "stop",
    Next = 82 => "next",
    Pause = 84 => "pause",
    FlashPlus = 86 => "flash-plus",
    FlashMinus = 87 => "flash-minus",
    TvPower = 98 => "tv-power",
    Audio = 99 => "audio",
    Input = 101 => "input",
    Sleep = 104 => "sleep",
    SleepTimer = 105 => "sleep-timer",
    PictureMode = 110 => "picture-mode",
    DemoSurround = 121 => "demo-surround",
    Hdmi1 = 124 => "hdmi1",
    Hdmi2 = 125 => "hdmi2",
    Hdmi3 = 126 => "hdmi3",
    Hdmi4 = 127 => "hdmi4",
    ActionMenu = 129 => "action-menu",
    Help = 130 => "help",
    Video2 = 208 => "video2",
}

impl fmt::Display for IrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IrCode {
    type Err = ProtocolError;

    /// Accepts either a name (`volume-up`) or a numeric code (`30`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|ir| ir.name() == lower)
            .or_else(|| lower.parse::<u32>().ok().and_then(Self::from_code))
            .ok_or_else(|| ProtocolError::UnexpectedParameters(s.to_string()))
    }
}
