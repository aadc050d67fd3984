use std::fmt;
use std::str::FromStr;

use padbus_bit_derive::Bit;
use padbus_bit_mask::{Bitable, Bitmask};

/// Digital buttons of an emulated Xbox 360 pad.
///
/// Bit positions match the XUSB report; bit 11 (`0x0800`) is reserved.
#[derive(Bit, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftShoulder,
    RightShoulder,
    Guide,
    A = 12,
    B,
    X,
    Y,
}

/// A set of pressed buttons.
pub type Buttons = Bitmask<Button>;

impl Button {
    /// XUSB bit of the button.
    #[inline]
    pub fn raw(self) -> u16 {
        // All bits are below 16, see the enum declaration.
        self.bit() as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::DpadUp => "dpad-up",
            Button::DpadDown => "dpad-down",
            Button::DpadLeft => "dpad-left",
            Button::DpadRight => "dpad-right",
            Button::Start => "start",
            Button::Back => "back",
            Button::LeftThumb => "left-thumb",
            Button::RightThumb => "right-thumb",
            Button::LeftShoulder => "left-shoulder",
            Button::RightShoulder => "right-shoulder",
            Button::Guide => "guide",
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown button: {0}")]
pub struct UnknownButton(pub String);

impl FromStr for Button {
    type Err = UnknownButton;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let alias = match normalized.as_str() {
            "up" => Some(Button::DpadUp),
            "down" => Some(Button::DpadDown),
            "left" => Some(Button::DpadLeft),
            "right" => Some(Button::DpadRight),
            "lb" => Some(Button::LeftShoulder),
            "rb" => Some(Button::RightShoulder),
            "ls" => Some(Button::LeftThumb),
            "rs" => Some(Button::RightThumb),
            _ => None,
        };
        alias
            .or_else(|| {
                Button::ALL
                    .iter()
                    .copied()
                    .find(|button| button.name() == normalized)
            })
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}
