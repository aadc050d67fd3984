//! Safe bindings to the virtual gamepad bus client.
//!
//! A [`Client`] connects to the bus, [`Target`]s are emulated pads plugged
//! in through it, and [`Report`]s carry their input state. Force-feedback
//! and LED changes flow back through notification callbacks.
//!
//! Every call goes through a [`Bus`]: [`DriverBus`] on Windows, or the
//! in-process [`MockBus`].

mod bus;
mod button;
mod client;
mod config;
mod error;
mod notification;
mod pad;
mod report;
mod target;

#[cfg(windows)]
pub use crate::bus::DriverBus;
pub use crate::bus::{Bus, MockBus, RawClient, RawTarget, TargetKind, DEFAULT_CAPACITY};
pub use crate::button::{Button, Buttons, UnknownButton};
pub use crate::client::Client;
pub use crate::config::{load_config, parse_config, BusKind, Config, ConfigError, MockConfig};
pub use crate::error::{Error, ErrorCode, Result};
pub use crate::notification::{Notification, UserData};
pub use crate::pad::{Output, Pad};
pub use crate::report::{Input, Report};
pub use crate::target::{NotificationGuard, Target};

/// Raw driver types, for use with [`Bus`] directly.
pub use padbus_sys as sys;
