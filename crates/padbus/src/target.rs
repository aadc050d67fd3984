use std::cell::Cell;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::bus::{Bus, RawTarget, TargetKind};
use crate::client::ClientInner;
use crate::error::{check, Error, Result};
use crate::notification::{Registration, UserData};

/// The client a target was plugged in through, and in which connection
/// session.
pub(crate) struct Attachment {
    client: Arc<ClientInner>,
    session: u64,
}

impl Attachment {
    pub(crate) fn new(client: Arc<ClientInner>) -> Self {
        let session = client.session();
        Self { client, session }
    }

    /// False once the client disconnected, even if it connected again.
    fn is_live(&self) -> bool {
        self.client.is_connected() && self.client.session() == self.session
    }
}

/// An emulated device.
///
/// A target is allocated detached; [`Client::add_target`](crate::Client::add_target)
/// plugs it in. Dropping a target unregisters its notification, unplugs it
/// if needed and frees the handle.
pub struct Target {
    bus: Arc<dyn Bus>,
    raw: RawTarget,
    kind: TargetKind,
    pub(crate) owner: Option<Attachment>,
    pub(crate) registration: Option<NonNull<Registration>>,
    // Set while this handle holds the notification lock.
    notification_held: Cell<bool>,
}

// The registration is only touched through `&mut self` or under the
// notification lock by the bus dispatcher.
unsafe impl Send for Target {}

impl Target {
    pub fn alloc(bus: Arc<dyn Bus>, kind: TargetKind) -> Self {
        let raw = bus.target_alloc(kind);
        log::debug!("{} target {raw:?} allocated", kind.name());
        Self {
            bus,
            raw,
            kind,
            owner: None,
            registration: None,
            notification_held: Cell::new(false),
        }
    }

    /// Allocate an Xbox 360 target.
    pub fn x360(bus: Arc<dyn Bus>) -> Self {
        Self::alloc(bus, TargetKind::X360)
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn raw(&self) -> RawTarget {
        self.raw
    }

    pub(crate) fn bus(&self) -> &Arc<dyn Bus> {
        &self.bus
    }

    /// Whether the target is plugged in through a client that is still in
    /// the connection it was added in.
    pub fn is_attached(&self) -> bool {
        self.owner.as_ref().is_some_and(Attachment::is_live)
    }

    pub fn has_notification(&self) -> bool {
        self.registration.is_some()
    }

    /// Block notification dispatch for this target.
    ///
    /// Must be paired with [`unlock_notification`](Self::unlock_notification)
    /// on the same thread. Prefer [`notification_guard`](Self::notification_guard).
    pub fn lock_notification(&self) {
        unsafe { self.bus.lock_notification(self.raw) };
        self.notification_held.set(true);
    }

    pub fn unlock_notification(&self) {
        self.notification_held.set(false);
        unsafe { self.bus.unlock_notification(self.raw) };
    }

    /// Whether this handle currently holds the notification lock.
    pub fn is_notification_locked(&self) -> bool {
        self.notification_held.get()
    }

    /// Scoped form of [`lock_notification`](Self::lock_notification).
    pub fn notification_guard(&self) -> NotificationGuard<'_> {
        self.lock_notification();
        NotificationGuard { target: self }
    }

    /// Stop notifications and take back the user data they were registered
    /// with. Returns `Ok(None)` when nothing is registered.
    ///
    /// Runs under the notification lock. If the caller already holds it
    /// through [`lock_notification`](Self::lock_notification) it is used as
    /// is and stays held.
    pub fn unregister_notification(&mut self) -> Result<Option<UserData>> {
        if self.notification_held.get() {
            return self.unregister_locked();
        }
        self.lock_notification();
        let result = self.unregister_locked();
        self.unlock_notification();
        result
    }

    fn unregister_locked(&mut self) -> Result<Option<UserData>> {
        let returned = unsafe { self.bus.unregister_notification(self.raw) };

        let Some(ours) = self.registration.take() else {
            if returned.is_null() {
                return Ok(None);
            }
            return Err(Error::ForeignUserData);
        };
        if returned != ours.as_ptr().cast() {
            log::warn!(
                "bus returned {returned:?} instead of registered user data for target {:?}",
                self.raw
            );
        }
        let registration = unsafe { Box::from_raw(ours.as_ptr()) };
        Ok(Some(registration.into_user_data()))
    }

/// Release the target.
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        if self.registration.is_some() {
            if let Err(err) = self.unregister_notification() {
                log::warn!("failed to unregister notification of {:?}: {err}", self.raw);
            }
        }
        if let Some(owner) = self.owner.take().filter(Attachment::is_live) {
            let client = owner.client.raw;
            if let Err(err) = check(unsafe { self.bus.target_remove(client, self.raw) }) {
                log::warn!("failed to unplug target {:?} on drop: {err}", self.raw);
            }
        }
        if self.notification_held.get() {
            // Release waiting dispatchers before the handle goes away.
            self.unlock_notification();
        }
        unsafe { self.bus.target_free(self.raw) };
        log::debug!("target {:?} freed", self.raw);
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .field("attached", &self.is_attached())
            .field("notification", &self.has_notification())
            .finish()
    }
}

/// Holds a target's notification lock until dropped.
#[must_use = "the lock is released when the guard is dropped"]
pub struct NotificationGuard<'a> {
    target: &'a Target,
}

impl Drop for NotificationGuard<'_> {
    fn drop(&mut self) {
        self.target.unlock_notification();
    }
}
