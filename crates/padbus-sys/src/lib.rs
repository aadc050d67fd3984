//! Raw declarations of the ViGEm bus client library.
//!
//! Everything here mirrors the C header one to one: error codes, XUSB button
//! bits, the XUSB input report and the exported functions. The functions are
//! only declared on Windows, where `build.rs` links `ViGEmClient.lib`.
//! Safe wrappers live in the `padbus` crate.

#![allow(non_camel_case_types, non_snake_case)]

use std::os::raw::c_void;

pub type VIGEM_ERROR = u32;

pub const VIGEM_ERROR_NONE: VIGEM_ERROR = 0x2000_0000;
pub const VIGEM_ERROR_BUS_NOT_FOUND: VIGEM_ERROR = 0xE000_0001;
pub const VIGEM_ERROR_NO_FREE_SLOT: VIGEM_ERROR = 0xE000_0002;
pub const VIGEM_ERROR_INVALID_TARGET: VIGEM_ERROR = 0xE000_0003;
pub const VIGEM_ERROR_REMOVAL_FAILED: VIGEM_ERROR = 0xE000_0004;
pub const VIGEM_ERROR_ALREADY_CONNECTED: VIGEM_ERROR = 0xE000_0005;
pub const VIGEM_ERROR_TARGET_UNINITIALIZED: VIGEM_ERROR = 0xE000_0006;
pub const VIGEM_ERROR_TARGET_NOT_PLUGGED_IN: VIGEM_ERROR = 0xE000_0007;
pub const VIGEM_ERROR_BUS_VERSION_MISMATCH: VIGEM_ERROR = 0xE000_0008;
pub const VIGEM_ERROR_BUS_ACCESS_FAILED: VIGEM_ERROR = 0xE000_0009;
pub const VIGEM_ERROR_CALLBACK_ALREADY_REGISTERED: VIGEM_ERROR = 0xE000_0010;
pub const VIGEM_ERROR_CALLBACK_NOT_FOUND: VIGEM_ERROR = 0xE000_0011;
pub const VIGEM_ERROR_BUS_ALREADY_CONNECTED: VIGEM_ERROR = 0xE000_0012;
pub const VIGEM_ERROR_BUS_INVALID_HANDLE: VIGEM_ERROR = 0xE000_0013;
pub const VIGEM_ERROR_XUSB_USERINDEX_OUT_OF_RANGE: VIGEM_ERROR = 0xE000_0014;
pub const VIGEM_ERROR_INVALID_PARAMETER: VIGEM_ERROR = 0xE000_0015;
pub const VIGEM_ERROR_NOT_SUPPORTED: VIGEM_ERROR = 0xE000_0016;

pub type XUSB_BUTTON = u16;

pub const XUSB_GAMEPAD_DPAD_UP: XUSB_BUTTON = 0x0001;
pub const XUSB_GAMEPAD_DPAD_DOWN: XUSB_BUTTON = 0x0002;
pub const XUSB_GAMEPAD_DPAD_LEFT: XUSB_BUTTON = 0x0004;
pub const XUSB_GAMEPAD_DPAD_RIGHT: XUSB_BUTTON = 0x0008;
pub const XUSB_GAMEPAD_START: XUSB_BUTTON = 0x0010;
pub const XUSB_GAMEPAD_BACK: XUSB_BUTTON = 0x0020;
pub const XUSB_GAMEPAD_LEFT_THUMB: XUSB_BUTTON = 0x0040;
pub const XUSB_GAMEPAD_RIGHT_THUMB: XUSB_BUTTON = 0x0080;
pub const XUSB_GAMEPAD_LEFT_SHOULDER: XUSB_BUTTON = 0x0100;
pub const XUSB_GAMEPAD_RIGHT_SHOULDER: XUSB_BUTTON = 0x0200;
pub const XUSB_GAMEPAD_GUIDE: XUSB_BUTTON = 0x0400;
// 0x0800 is reserved.
pub const XUSB_GAMEPAD_A: XUSB_BUTTON = 0x1000;
pub const XUSB_GAMEPAD_B: XUSB_BUTTON = 0x2000;
pub const XUSB_GAMEPAD_X: XUSB_BUTTON = 0x4000;
pub const XUSB_GAMEPAD_Y: XUSB_BUTTON = 0x8000;

/// XUSB (Xbox 360) input report, as consumed by `vigem_target_x360_update`.
///
/// The header declares the triggers as `char`; they carry a `0..=255`
/// magnitude, so they are exposed as `u8` with the same width.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct XUSB_REPORT {
    pub wButtons: u16,
    pub bLeftTrigger: u8,
    pub bRightTrigger: u8,
    pub sThumbLX: i16,
    pub sThumbLY: i16,
    pub sThumbRX: i16,
    pub sThumbRY: i16,
}

pub type PVIGEM_CLIENT = *mut c_void;
pub type PVIGEM_TARGET = *mut c_void;

pub type EVT_VIGEM_X360_NOTIFICATION = unsafe extern "C" fn(
    Client: PVIGEM_CLIENT,
    Target: PVIGEM_TARGET,
    LargeMotor: u8,
    SmallMotor: u8,
    LedNumber: u8,
    UserData: *mut c_void,
);

pub type PFN_VIGEM_X360_NOTIFICATION = Option<EVT_VIGEM_X360_NOTIFICATION>;

#[cfg(windows)]
extern "C" {
    pub fn vigem_alloc() -> PVIGEM_CLIENT;
    pub fn vigem_free(vigem: PVIGEM_CLIENT);

    pub fn vigem_connect(vigem: PVIGEM_CLIENT) -> VIGEM_ERROR;
    pub fn vigem_disconnect(vigem: PVIGEM_CLIENT);

    pub fn vigem_target_x360_alloc() -> PVIGEM_TARGET;
    pub fn vigem_target_free(target: PVIGEM_TARGET);

    pub fn vigem_target_add(vigem: PVIGEM_CLIENT, target: PVIGEM_TARGET) -> VIGEM_ERROR;
    pub fn vigem_target_remove(vigem: PVIGEM_CLIENT, target: PVIGEM_TARGET) -> VIGEM_ERROR;

    pub fn vigem_target_x360_register_notification(
        vigem: PVIGEM_CLIENT,
        target: PVIGEM_TARGET,
        notification: PFN_VIGEM_X360_NOTIFICATION,
        userData: *mut c_void,
    ) -> VIGEM_ERROR;
    pub fn vigem_target_x360_unregister_notification(target: PVIGEM_TARGET) -> *mut c_void;

    pub fn vigem_target_lock_notification(target: PVIGEM_TARGET);
    pub fn vigem_target_unlock_notification(target: PVIGEM_TARGET);

    pub fn vigem_target_x360_update(
        vigem: PVIGEM_CLIENT,
        target: PVIGEM_TARGET,
        report: XUSB_REPORT,
    ) -> VIGEM_ERROR;
}
