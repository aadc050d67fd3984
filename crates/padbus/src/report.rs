use padbus_sys::XUSB_REPORT;

use crate::button::{Button, Buttons};

/// Input state of an Xbox 360 pad, pushed with [`Client::update`](crate::Client::update).
///
/// Converts to the driver's `XUSB_REPORT` without allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Report {
    pub buttons: Buttons,
    /// 0 (released) to 255 (fully pressed).
    pub left_trigger: u8,
    pub right_trigger: u8,
    /// Stick axes, 0 is center.
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

/// A single change applied to a [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Pressed(Button),
    Released(Button),
    LeftTrigger(u8),
    RightTrigger(u8),
    LeftStick(i16, i16),
    RightStick(i16, i16),
}

impl Report {
    pub fn with_buttons(buttons: &[Button]) -> Self {
        Self {
            buttons: Buttons::new(buttons),
            ..Self::default()
        }
    }

    /// Apply one input change.
    pub fn apply(&mut self, input: Input) {
        match input {
            Input::Pressed(button) => self.buttons.insert(button),
            Input::Released(button) => self.buttons.remove(button),
            Input::LeftTrigger(level) => self.left_trigger = level,
            Input::RightTrigger(level) => self.right_trigger = level,
            Input::LeftStick(x, y) => {
                self.thumb_lx = x;
                self.thumb_ly = y;
            }
            Input::RightStick(x, y) => {
                self.thumb_rx = x;
                self.thumb_ry = y;
            }
        }
    }

    #[inline]
    pub fn to_raw(&self) -> XUSB_REPORT {
        XUSB_REPORT {
            // Only named buttons reach the wire; they all sit below bit 16.
            wButtons: Buttons::from_value_truncate(self.buttons.value()).value() as u16,
            bLeftTrigger: self.left_trigger,
            bRightTrigger: self.right_trigger,
            sThumbLX: self.thumb_lx,
            sThumbLY: self.thumb_ly,
            sThumbRX: self.thumb_rx,
            sThumbRY: self.thumb_ry,
        }
    }

    /// Build a report from the raw driver struct. The reserved button bit
    /// is dropped.
    pub fn from_raw(raw: &XUSB_REPORT) -> Self {
        Self {
            buttons: Buttons::from_value_truncate(u64::from(raw.wButtons)),
            left_trigger: raw.bLeftTrigger,
            right_trigger: raw.bRightTrigger,
            thumb_lx: raw.sThumbLX,
            thumb_ly: raw.sThumbLY,
            thumb_rx: raw.sThumbRX,
            thumb_ry: raw.sThumbRY,
        }
    }
}

impl From<Report> for XUSB_REPORT {
    fn from(report: Report) -> Self {
        report.to_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_is_neutral() {
        assert_eq!(Report::default().to_raw(), XUSB_REPORT::default());
    }

    #[test]
    fn unknown_button_bits_are_not_sent() {
        let report = Report {
            buttons: Buttons::from_value(0x1_0000 | 0x0800 | 0x1000),
            ..Report::default()
        };
        assert_eq!(report.to_raw().wButtons, 0x1000);
    }

    #[test]
    fn raw_report_keeps_field_order() {
        let report = Report {
            buttons: Buttons::new(&[Button::DpadUp, Button::A]),
            left_trigger: 10,
            right_trigger: 255,
            thumb_lx: -32768,
            thumb_ly: 32767,
            thumb_rx: 1,
            thumb_ry: -1,
        };
        let raw = report.to_raw();
        assert_eq!(raw.wButtons, 0x1001);
        assert_eq!(raw.bLeftTrigger, 10);
        assert_eq!(raw.bRightTrigger, 255);
        assert_eq!(raw.sThumbLX, -32768);
        assert_eq!(raw.sThumbLY, 32767);
        assert_eq!(raw.sThumbRX, 1);
        assert_eq!(raw.sThumbRY, -1);
        assert_eq!(Report::from_raw(&raw), report);
    }

    #[test]
    fn apply_updates_running_state() {
        let mut report = Report::default();
        report.apply(Input::Pressed(Button::X));
        report.apply(Input::Pressed(Button::Start));
        report.apply(Input::Released(Button::X));
        report.apply(Input::LeftTrigger(128));
        report.apply(Input::RightStick(100, -100));

        assert_eq!(report.buttons, Buttons::new(&[Button::Start]));
        assert_eq!(report.left_trigger, 128);
        assert_eq!((report.thumb_rx, report.thumb_ry), (100, -100));
        assert_eq!((report.thumb_lx, report.thumb_ly), (0, 0));
    }

    #[test]
    fn reserved_bit_is_dropped_from_raw() {
        let raw = XUSB_REPORT {
            wButtons: 0x0800 | 0x2000,
            ..XUSB_REPORT::default()
        };
        assert_eq!(Report::from_raw(&raw).buttons, Buttons::new(&[Button::B]));
    }
}
