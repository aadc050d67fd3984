#[cfg(windows)]
mod driver;
mod mock;

use std::os::raw::c_void;
use std::ptr;

use padbus_sys::{
    PFN_VIGEM_X360_NOTIFICATION, PVIGEM_CLIENT, PVIGEM_TARGET, VIGEM_ERROR, XUSB_REPORT,
};

#[cfg(windows)]
pub use driver::DriverBus;
pub use mock::{MockBus, DEFAULT_CAPACITY};

/// Opaque client handle as handed out by a [`Bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawClient(PVIGEM_CLIENT);

/// Opaque target handle as handed out by a [`Bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawTarget(PVIGEM_TARGET);

// Handles are opaque tokens; they are never dereferenced on the Rust side.
unsafe impl Send for RawClient {}
unsafe impl Sync for RawClient {}
unsafe impl Send for RawTarget {}
unsafe impl Sync for RawTarget {}

impl RawClient {
    pub const fn from_ptr(ptr: PVIGEM_CLIENT) -> Self {
        Self(ptr)
    }

    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    #[inline]
    pub const fn as_ptr(self) -> PVIGEM_CLIENT {
        self.0
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl RawTarget {
    pub const fn from_ptr(ptr: PVIGEM_TARGET) -> Self {
        Self(ptr)
    }

    pub const fn null() -> Self {
        Self(ptr::null_mut())
    }

    #[inline]
    pub const fn as_ptr(self) -> PVIGEM_TARGET {
        self.0
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Emulated device profile of a target.
///
/// Only the Xbox 360 (XUSB) profile is declared by the client library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TargetKind {
    #[default]
    X360,
}

impl TargetKind {
    pub fn name(self) -> &'static str {
        match self {
            TargetKind::X360 => "Xbox 360",
        }
    }

    /// Whether the profile has a force-feedback/LED notification channel.
    pub fn supports_notification(self) -> bool {
        match self {
            TargetKind::X360 => true,
        }
    }
}

/// The bus client library, one method per exported function.
///
/// Implementations return raw driver codes; the safe wrappers in this crate
/// convert them into [`Result`](crate::Result).
///
/// # Safety
///
/// Every method taking a handle requires that the handle was produced by the
/// same bus (`alloc` / `target_alloc`) and has not been freed yet.
/// `register_notification` additionally requires `user_data` to stay valid
/// until it is returned by `unregister_notification`.
pub trait Bus: Send + Sync {
    fn alloc(&self) -> RawClient;
    unsafe fn free(&self, client: RawClient);

    unsafe fn connect(&self, client: RawClient) -> VIGEM_ERROR;
    unsafe fn disconnect(&self, client: RawClient);

    fn target_alloc(&self, kind: TargetKind) -> RawTarget;
    unsafe fn target_free(&self, target: RawTarget);

    unsafe fn target_add(&self, client: RawClient, target: RawTarget) -> VIGEM_ERROR;
    unsafe fn target_remove(&self, client: RawClient, target: RawTarget) -> VIGEM_ERROR;

    unsafe fn register_notification(
        &self,
        client: RawClient,
        target: RawTarget,
        callback: PFN_VIGEM_X360_NOTIFICATION,
        user_data: *mut c_void,
    ) -> VIGEM_ERROR;
    /// Remove the callback and return the user data it was registered with,
    /// or null when nothing was registered.
    unsafe fn unregister_notification(&self, target: RawTarget) -> *mut c_void;

    unsafe fn lock_notification(&self, target: RawTarget);
    unsafe fn unlock_notification(&self, target: RawTarget);

    unsafe fn update(
        &self,
        client: RawClient,
        target: RawTarget,
        report: XUSB_REPORT,
    ) -> VIGEM_ERROR;
}
