use std::os::raw::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::bus::{Bus, RawClient};
use crate::error::{check, Error, Result};
use crate::notification::{dispatch, Notification, Registration};
use crate::report::Report;
use crate::target::{Attachment, Target};

/// Shared client context. Attached targets hold a reference so the
/// context outlives them; it is disconnected and freed with the last owner.
pub(crate) struct ClientInner {
    pub(crate) bus: Arc<dyn Bus>,
    pub(crate) raw: RawClient,
    connected: AtomicBool,
    // Bumped on every successful connect. Attachments made in an earlier
    // session were dropped by the bus on disconnect.
    session: AtomicU64,
}

impl ClientInner {
    fn new(bus: Arc<dyn Bus>, raw: RawClient) -> Self {
        Self {
            bus,
            raw,
            connected: AtomicBool::new(false),
            session: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn session(&self) -> u64 {
        self.session.load(Ordering::Acquire)
    }

    pub(crate) fn same_bus(&self, target: &Target) -> Result<()> {
        let ours = Arc::as_ptr(&self.bus).cast::<()>();
        let theirs = Arc::as_ptr(target.bus()).cast::<()>();
        if ours == theirs {
            Ok(())
        } else {
            Err(Error::InvalidTarget)
        }
    }

    pub(crate) fn add_target(self: &Arc<Self>, target: &mut Target) -> Result<()> {
        self.same_bus(target)?;
        check(unsafe { self.bus.target_add(self.raw, target.raw()) })?;
        target.owner = Some(Attachment::new(self.clone()));
        log::debug!("target {:?} plugged into client {:?}", target.raw(), self.raw);
        Ok(())
    }

    pub(crate) fn remove_target(&self, target: &mut Target) -> Result<()> {
        self.same_bus(target)?;
        let result = check(unsafe { self.bus.target_remove(self.raw, target.raw()) });
        match result {
            Ok(()) | Err(Error::TargetNotPluggedIn) => target.owner = None,
            // The bus already dropped a target of an earlier session.
            Err(_) if !target.is_attached() => target.owner = None,
            Err(_) => {}
        }
        if result.is_ok() {
            log::debug!("target {:?} unplugged from client {:?}", target.raw(), self.raw);
        }
        result
    }

    #[inline]
    pub(crate) fn update(&self, target: &Target, report: &Report) -> Result<()> {
        self.same_bus(target)?;
        check(unsafe { self.bus.update(self.raw, target.raw(), report.to_raw()) })
    }

    pub(crate) fn register_notification<T, F>(
        &self,
        target: &mut Target,
        user_data: T,
        callback: F,
    ) -> Result<()>
    where
        T: Send + 'static,
        F: FnMut(&Notification, &mut T) + Send + 'static,
    {
        self.same_bus(target)?;
        if target.registration.is_some() {
            return Err(Error::CallbackAlreadyRegistered);
        }

        let registration = Box::into_raw(Box::new(Registration::new(user_data, callback)));
        let code = unsafe {
            self.bus.register_notification(
                self.raw,
                target.raw(),
                Some(dispatch),
                registration.cast::<c_void>(),
            )
        };
        if let Err(err) = check(code) {
            // The bus rejected the pointer and never saw it dispatched.
            drop(unsafe { Box::from_raw(registration) });
            return Err(err);
        }
        target.registration = NonNull::new(registration);
        Ok(())
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        unsafe {
            self.bus.disconnect(self.raw);
            self.bus.free(self.raw);
        }
        log::debug!("client {:?} freed", self.raw);
    }
}

/// A connection to the virtual gamepad bus.
///
/// Owns the underlying client handle; dropping it disconnects and frees the
/// handle once no attached [`Target`] refers to it anymore.
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Allocate a client on `bus`. Does not connect.
    pub fn alloc(bus: Arc<dyn Bus>) -> Self {
        let raw = bus.alloc();
        log::debug!("client {raw:?} allocated");
        Self {
            inner: Arc::new(ClientInner::new(bus, raw)),
        }
    }

    /// Connect to the bus driver. Fails if already connected or the driver
    /// cannot be reached.
    pub fn connect(&mut self) -> Result<()> {
        check(unsafe { self.inner.bus.connect(self.inner.raw) })?;
        self.inner.session.fetch_add(1, Ordering::AcqRel);
        self.inner.connected.store(true, Ordering::Release);
        log::debug!("client {:?} connected", self.inner.raw);
        Ok(())
    }

    /// Disconnect from the bus. Safe to call on a client that never
    /// connected.
    ///
    /// The bus unplugs every target of this client, so they report
    /// [`Target::is_attached`] as `false` afterwards.
    pub fn disconnect(&mut self) {
        unsafe { self.inner.bus.disconnect(self.inner.raw) };
        self.inner.connected.store(false, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn raw(&self) -> RawClient {
        self.inner.raw
    }

    pub fn bus(&self) -> &Arc<dyn Bus> {
        &self.inner.bus
    }

    /// Disconnect and release the client.
    pub fn free(self) {
        drop(self);
    }

    /// Plug `target` into the bus through this client.
    pub fn add_target(&self, target: &mut Target) -> Result<()> {
        self.inner.add_target(target)
    }

    /// Unplug `target`. Fails with `RemovalFailed` or `TargetNotPluggedIn`.
    pub fn remove_target(&self, target: &mut Target) -> Result<()> {
        self.inner.remove_target(target)
    }

    /// Push a new input state for `target`.
    pub fn update(&self, target: &Target, report: &Report) -> Result<()> {
        self.inner.update(target, report)
    }

    /// Subscribe to force-feedback and LED notifications of `target`.
    ///
    /// `callback` may run on a driver thread, always under the target's
    /// notification lock. `user_data` is passed to it by mutable reference
    /// and handed back by [`Target::unregister_notification`].
    pub fn register_notification<T, F>(
        &self,
        target: &mut Target,
        user_data: T,
        callback: F,
    ) -> Result<()>
    where
        T: Send + 'static,
        F: FnMut(&Notification, &mut T) + Send + 'static,
    {
        self.inner.register_notification(target, user_data, callback)
    }

    pub(crate) fn inner(&self) -> &Arc<ClientInner> {
        &self.inner
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("raw", &self.inner.raw)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{MockBus, TargetKind};

    fn connected(bus: &Arc<MockBus>) -> Client {
        let mut client = Client::alloc(bus.clone());
        client.connect().unwrap();
        client
    }

    #[test]
    fn connect_twice_fails() {
        let bus = Arc::new(MockBus::new());
        let mut client = connected(&bus);
        assert!(matches!(client.connect(), Err(Error::BusAlreadyConnected)));
        assert!(client.is_connected());
    }

    #[test]
    fn connect_without_driver_fails() {
        let bus = Arc::new(MockBus::unavailable());
        let mut client = Client::alloc(bus.clone());
        assert!(matches!(client.connect(), Err(Error::BusNotFound)));
        assert!(!client.is_connected());
    }

    #[test]
    fn disconnect_before_connect_is_harmless() {
        let bus = Arc::new(MockBus::new());
        let mut client = Client::alloc(bus.clone());
        client.disconnect();
        client.free();
        assert_eq!(bus.live_handles(), 0);
    }

    #[test]
    fn attached_target_keeps_client_context_alive() {
        let bus = Arc::new(MockBus::new());
        let client = connected(&bus);
        let raw = client.raw();
        let mut target = Target::alloc(bus.clone(), TargetKind::X360);
        client.add_target(&mut target).unwrap();

        client.free();
        assert!(bus.is_connected(raw));
        assert!(target.is_attached());

        target.free();
        assert!(!bus.is_connected(raw));
        assert_eq!(bus.live_handles(), 0);
    }

    #[test]
    fn target_from_other_bus_is_rejected() {
        let bus = Arc::new(MockBus::new());
        let other = Arc::new(MockBus::new());
        let client = connected(&bus);
        let mut target = Target::alloc(other.clone(), TargetKind::X360);
        assert!(matches!(
            client.add_target(&mut target),
            Err(Error::InvalidTarget)
        ));
        assert_eq!(other.attached(), 0);
    }

    #[test]
    fn add_requires_connection() {
        let bus = Arc::new(MockBus::new());
        let client = Client::alloc(bus.clone());
        let mut target = Target::x360(bus.clone());
        assert!(matches!(
            client.add_target(&mut target),
            Err(Error::BusInvalidHandle)
        ));
        assert!(!target.is_attached());
    }

    #[test]
    fn failed_registration_releases_user_data() {
        let bus = Arc::new(MockBus::new());
        let client = connected(&bus);
        let mut target = Target::x360(bus.clone());
        let data = Arc::new(());

        // Not plugged in yet.
        let result = client.register_notification(&mut target, data.clone(), |_, _| {});
        assert!(matches!(result, Err(Error::TargetNotPluggedIn)));
        assert!(!target.has_notification());
        assert_eq!(Arc::strong_count(&data), 1);
    }

    #[test]
    fn unsupported_notification_keeps_target_plugged_in() {
        let bus = Arc::new(MockBus::new());
        let client = connected(&bus);
        let mut target = Target::x360(bus.clone());
        client.add_target(&mut target).unwrap();
        bus.fail_next_register(padbus_sys::VIGEM_ERROR_NOT_SUPPORTED);

        let data = Arc::new(());
        let result = client.register_notification(&mut target, data.clone(), |_, _| {});
        assert!(matches!(result, Err(Error::NotSupported)));
        assert!(!target.has_notification());
        assert!(target.is_attached());
        assert_eq!(Arc::strong_count(&data), 1);
    }
}
