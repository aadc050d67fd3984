use std::os::raw::c_void;

use padbus_sys::*;

use super::{Bus, RawClient, RawTarget, TargetKind};

/// The real ViGEm bus, reached through `ViGEmClient.dll`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverBus;

impl Bus for DriverBus {
    fn alloc(&self) -> RawClient {
        RawClient::from_ptr(unsafe { vigem_alloc() })
    }

    unsafe fn free(&self, client: RawClient) {
        vigem_free(client.as_ptr());
    }

    unsafe fn connect(&self, client: RawClient) -> VIGEM_ERROR {
        vigem_connect(client.as_ptr())
    }

    unsafe fn disconnect(&self, client: RawClient) {
        vigem_disconnect(client.as_ptr());
    }

    fn target_alloc(&self, kind: TargetKind) -> RawTarget {
        let raw = match kind {
            TargetKind::X360 => unsafe { vigem_target_x360_alloc() },
        };
        RawTarget::from_ptr(raw)
    }

    unsafe fn target_free(&self, target: RawTarget) {
        vigem_target_free(target.as_ptr());
    }

    unsafe fn target_add(&self, client: RawClient, target: RawTarget) -> VIGEM_ERROR {
        vigem_target_add(client.as_ptr(), target.as_ptr())
    }

    unsafe fn target_remove(&self, client: RawClient, target: RawTarget) -> VIGEM_ERROR {
        vigem_target_remove(client.as_ptr(), target.as_ptr())
    }

    unsafe fn register_notification(
        &self,
        client: RawClient,
        target: RawTarget,
        callback: PFN_VIGEM_X360_NOTIFICATION,
        user_data: *mut c_void,
    ) -> VIGEM_ERROR {
        vigem_target_x360_register_notification(
            client.as_ptr(),
            target.as_ptr(),
            callback,
            user_data,
        )
    }

    unsafe fn unregister_notification(&self, target: RawTarget) -> *mut c_void {
        vigem_target_x360_unregister_notification(target.as_ptr())
    }

    unsafe fn lock_notification(&self, target: RawTarget) {
        vigem_target_lock_notification(target.as_ptr());
    }

    unsafe fn unlock_notification(&self, target: RawTarget) {
        vigem_target_unlock_notification(target.as_ptr());
    }

    unsafe fn update(
        &self,
        client: RawClient,
        target: RawTarget,
        report: XUSB_REPORT,
    ) -> VIGEM_ERROR {
        vigem_target_x360_update(client.as_ptr(), target.as_ptr(), report)
    }
}
