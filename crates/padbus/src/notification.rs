use std::any::Any;
use std::fmt;
use std::os::raw::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};

use padbus_sys::{PVIGEM_CLIENT, PVIGEM_TARGET};

use crate::bus::{RawClient, RawTarget};

/// Force-feedback and LED state sent by the host to an emulated pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Notification {
    pub client: RawClient,
    pub target: RawTarget,
    /// Low-frequency rumble motor, 0 to 255.
    pub large_motor: u8,
    /// High-frequency rumble motor, 0 to 255.
    pub small_motor: u8,
    /// Player LED assigned by the host.
    pub led_number: u8,
}

/// User data handed back when a notification is unregistered.
pub struct UserData(Box<dyn Any + Send>);

impl UserData {
    pub(crate) fn new(inner: Box<dyn Any + Send>) -> Self {
        Self(inner)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Take the value out, or get `self` back if the type does not match.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|value| *value).map_err(Self)
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserData").finish_non_exhaustive()
    }
}

type Handler = Box<dyn FnMut(&Notification, &mut (dyn Any + Send)) + Send>;

/// What the driver's opaque user-data pointer points at.
pub(crate) struct Registration {
    handler: Handler,
    user_data: Box<dyn Any + Send>,
}

impl Registration {
    pub(crate) fn new<T, F>(user_data: T, mut callback: F) -> Self
    where
        T: Send + 'static,
        F: FnMut(&Notification, &mut T) + Send + 'static,
    {
        let handler: Handler = Box::new(
            move |notification: &Notification, data: &mut (dyn Any + Send)| {
                if let Some(data) = data.downcast_mut::<T>() {
                    callback(notification, data);
                }
            },
        );
        Self {
            handler,
            user_data: Box::new(user_data),
        }
    }

    pub(crate) fn into_user_data(self) -> UserData {
        UserData::new(self.user_data)
    }

    fn handle(&mut self, notification: &Notification) {
        (self.handler)(notification, &mut *self.user_data);
    }
}

/// C entry point registered with the bus for every target.
///
/// Runs on a driver thread. Panics are caught here since unwinding across
/// the FFI boundary is undefined behavior.
pub(crate) unsafe extern "C" fn dispatch(
    client: PVIGEM_CLIENT,
    target: PVIGEM_TARGET,
    large_motor: u8,
    small_motor: u8,
    led_number: u8,
    user_data: *mut c_void,
) {
    let Some(registration) = user_data.cast::<Registration>().as_mut() else {
        log::error!("notification without user data for target {target:?}");
        return;
    };
    let notification = Notification {
        client: RawClient::from_ptr(client),
        target: RawTarget::from_ptr(target),
        large_motor,
        small_motor,
        led_number,
    };
    let result = catch_unwind(AssertUnwindSafe(|| registration.handle(&notification)));
    if result.is_err() {
        log::error!("notification callback panicked for target {target:?}");
    }
}
