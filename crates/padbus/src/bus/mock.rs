use std::os::raw::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use ahash::AHashMap;
use padbus_sys::*;

use super::{Bus, RawClient, RawTarget, TargetKind};
use crate::config::MockConfig;

/// Number of targets a [`MockBus`] accepts by default.
pub const DEFAULT_CAPACITY: usize = 4;

/// In-process bus used in tests and on hosts without the driver.
///
/// Handles are small integers disguised as pointers. The mock follows the
/// driver's error contract: invalid handles, double connects, slot
/// exhaustion, unplugged targets and double registrations all fail with
/// the documented codes.
#[derive(Debug)]
pub struct MockBus {
    capacity: usize,
    available: bool,
    next_id: AtomicUsize,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    clients: AHashMap<usize, ClientSlot>,
    targets: AHashMap<usize, TargetSlot>,
    register_failure: Option<VIGEM_ERROR>,
    remove_failure: Option<VIGEM_ERROR>,
}

#[derive(Debug, Default)]
struct ClientSlot {
    connected: bool,
}

#[derive(Debug)]
struct TargetSlot {
    kind: TargetKind,
    owner: Option<usize>,
    callback: PFN_VIGEM_X360_NOTIFICATION,
    // Stored as an address so the slot stays `Send`.
    user_data: usize,
    lock: Arc<NotificationLock>,
    report: Option<XUSB_REPORT>,
    updates: u64,
}

/// Lock that can be taken and released from separate calls.
#[derive(Debug, Default)]
struct NotificationLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl NotificationLock {
    fn lock(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
    }

    fn unlock(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        self.released.notify_one();
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A bus that accepts at most `capacity` attached targets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            available: true,
            next_id: AtomicUsize::new(1),
            state: Mutex::new(State::default()),
        }
    }

    /// A bus whose driver is not installed: every connect fails with
    /// `BusNotFound`.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self {
            available: config.available,
            ..Self::with_capacity(config.capacity)
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of targets currently plugged in.
    pub fn attached(&self) -> usize {
        self.state().attached()
    }

    /// Number of clients and targets that were allocated and not yet freed.
    pub fn live_handles(&self) -> usize {
        let state = self.state();
        state.clients.len() + state.targets.len()
    }

    pub fn is_connected(&self, client: RawClient) -> bool {
        self.state()
            .clients
            .get(&id(client.as_ptr()))
            .is_some_and(|c| c.connected)
    }

    pub fn is_attached(&self, target: RawTarget) -> bool {
        self.state()
            .targets
            .get(&id(target.as_ptr()))
            .is_some_and(|t| t.owner.is_some())
    }

    /// Last report pushed to `target`.
    pub fn last_report(&self, target: RawTarget) -> Option<XUSB_REPORT> {
        self.state()
            .targets
            .get(&id(target.as_ptr()))
            .and_then(|t| t.report)
    }

    /// Number of successful updates pushed to `target`.
    pub fn update_count(&self, target: RawTarget) -> u64 {
        self.state()
            .targets
            .get(&id(target.as_ptr()))
            .map_or(0, |t| t.updates)
    }

    /// Make the next `register_notification` call fail with `code`.
    pub fn fail_next_register(&self, code: VIGEM_ERROR) {
        self.state().register_failure = Some(code);
    }

    /// Make the next `target_remove` call fail with `code`.
    pub fn fail_next_remove(&self, code: VIGEM_ERROR) {
        self.state().remove_failure = Some(code);
    }

    /// Emit a force-feedback/LED notification the way the driver does:
    /// take the target's notification lock, then call the registered
    /// callback with the registered user data.
    ///
    /// Returns `false` when the target is unknown, unplugged, or has no
    /// callback.
    pub fn notify(
        &self,
        target: RawTarget,
        large_motor: u8,
        small_motor: u8,
        led_number: u8,
    ) -> bool {
        let target_id = id(target.as_ptr());
        let Some(lock) = self.state().targets.get(&target_id).map(|t| t.lock.clone())
        else {
            return false;
        };

        lock.lock();
        let dispatch = {
            let state = self.state();
            state.targets.get(&target_id).and_then(|t| {
                let owner = t.owner?;
                let callback = t.callback?;
                Some((owner, callback, t.user_data))
            })
        };
        if let Some((owner, callback, user_data)) = dispatch {
            unsafe {
                callback(
                    owner as PVIGEM_CLIENT,
                    target.as_ptr(),
                    large_motor,
                    small_motor,
                    led_number,
                    user_data as *mut c_void,
                );
            }
        }
        lock.unlock();
        dispatch.is_some()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_handle(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl State {
    fn attached(&self) -> usize {
        self.targets.values().filter(|t| t.owner.is_some()).count()
    }

    /// Resolve a client that is allocated and connected.
    fn connected_client(&self, client: RawClient) -> Result<usize, VIGEM_ERROR> {
        let client_id = id(client.as_ptr());
        match self.clients.get(&client_id) {
            Some(slot) if slot.connected => Ok(client_id),
            _ => Err(VIGEM_ERROR_BUS_INVALID_HANDLE),
        }
    }

    fn detach_all(&mut self, client_id: usize) {
        for target in self.targets.values_mut() {
            if target.owner == Some(client_id) {
                target.owner = None;
            }
        }
    }
}

#[inline]
fn id(ptr: *mut c_void) -> usize {
    ptr as usize
}

#[inline]
fn code(result: Result<(), VIGEM_ERROR>) -> VIGEM_ERROR {
    result.err().unwrap_or(VIGEM_ERROR_NONE)
}

impl Bus for MockBus {
    fn alloc(&self) -> RawClient {
        let client_id = self.next_handle();
        self.state().clients.insert(client_id, ClientSlot::default());
        log::debug!("mock bus: allocated client {client_id}");
        RawClient::from_ptr(client_id as PVIGEM_CLIENT)
    }

    unsafe fn free(&self, client: RawClient) {
        let client_id = id(client.as_ptr());
        let mut state = self.state();
        if state.clients.remove(&client_id).is_none() {
            log::warn!("mock bus: free of unknown client {client_id}");
            return;
        }
        state.detach_all(client_id);
    }

    unsafe fn connect(&self, client: RawClient) -> VIGEM_ERROR {
        let mut state = self.state();
        let Some(slot) = state.clients.get_mut(&id(client.as_ptr())) else {
            return VIGEM_ERROR_BUS_INVALID_HANDLE;
        };
        if slot.connected {
            return VIGEM_ERROR_BUS_ALREADY_CONNECTED;
        }
        if !self.available {
            return VIGEM_ERROR_BUS_NOT_FOUND;
        }
        slot.connected = true;
        VIGEM_ERROR_NONE
    }

    unsafe fn disconnect(&self, client: RawClient) {
        let client_id = id(client.as_ptr());
        let mut state = self.state();
        if let Some(slot) = state.clients.get_mut(&client_id) {
            slot.connected = false;
            state.detach_all(client_id);
        }
    }

    fn target_alloc(&self, kind: TargetKind) -> RawTarget {
        let target_id = self.next_handle();
        self.state().targets.insert(
            target_id,
            TargetSlot {
                kind,
                owner: None,
                callback: None,
                user_data: 0,
                lock: Arc::default(),
                report: None,
                updates: 0,
            },
        );
        log::debug!("mock bus: allocated {} target {target_id}", kind.name());
        RawTarget::from_ptr(target_id as PVIGEM_TARGET)
    }

    unsafe fn target_free(&self, target: RawTarget) {
        let target_id = id(target.as_ptr());
        match self.state().targets.remove(&target_id) {
            Some(slot) if slot.owner.is_some() => {
                log::warn!("mock bus: freed target {target_id} while plugged in");
            }
            Some(_) => {}
            None => log::warn!("mock bus: free of unknown target {target_id}"),
        }
    }

    unsafe fn target_add(&self, client: RawClient, target: RawTarget) -> VIGEM_ERROR {
        let mut state = self.state();
        code((|| {
            let client_id = state.connected_client(client)?;
            let attached = state.attached();
            let slot = state
                .targets
                .get_mut(&id(target.as_ptr()))
                .ok_or(VIGEM_ERROR_INVALID_TARGET)?;
            if slot.owner.is_some() {
                return Err(VIGEM_ERROR_ALREADY_CONNECTED);
            }
            if attached >= self.capacity {
                return Err(VIGEM_ERROR_NO_FREE_SLOT);
            }
            slot.owner = Some(client_id);
            Ok(())
        })())
    }

    unsafe fn target_remove(&self, client: RawClient, target: RawTarget) -> VIGEM_ERROR {
        let mut state = self.state();
        code((|| {
            if let Some(failure) = state.remove_failure.take() {
                return Err(failure);
            }
            let client_id = state.connected_client(client)?;
            let slot = state
                .targets
                .get_mut(&id(target.as_ptr()))
                .ok_or(VIGEM_ERROR_INVALID_TARGET)?;
            match slot.owner {
                None => Err(VIGEM_ERROR_TARGET_NOT_PLUGGED_IN),
                Some(owner) if owner != client_id => Err(VIGEM_ERROR_REMOVAL_FAILED),
                Some(_) => {
                    slot.owner = None;
                    Ok(())
                }
            }
        })())
    }

    unsafe fn register_notification(
        &self,
        client: RawClient,
        target: RawTarget,
        callback: PFN_VIGEM_X360_NOTIFICATION,
        user_data: *mut c_void,
    ) -> VIGEM_ERROR {
        let mut state = self.state();
        code((|| {
            if let Some(failure) = state.register_failure.take() {
                return Err(failure);
            }
            let client_id = state.connected_client(client)?;
            let slot = state
                .targets
                .get_mut(&id(target.as_ptr()))
                .ok_or(VIGEM_ERROR_INVALID_TARGET)?;
            if !slot.kind.supports_notification() {
                return Err(VIGEM_ERROR_NOT_SUPPORTED);
            }
            if callback.is_none() {
                return Err(VIGEM_ERROR_INVALID_PARAMETER);
            }
            match slot.owner {
                None => return Err(VIGEM_ERROR_TARGET_NOT_PLUGGED_IN),
                Some(owner) if owner != client_id => return Err(VIGEM_ERROR_INVALID_TARGET),
                Some(_) => {}
            }
            if slot.callback.is_some() {
                return Err(VIGEM_ERROR_CALLBACK_ALREADY_REGISTERED);
            }
            slot.callback = callback;
            slot.user_data = user_data as usize;
            Ok(())
        })())
    }

    unsafe fn unregister_notification(&self, target: RawTarget) -> *mut c_void {
        let mut state = self.state();
        match state.targets.get_mut(&id(target.as_ptr())) {
            Some(slot) => {
                slot.callback = None;
                std::mem::take(&mut slot.user_data) as *mut c_void
            }
            None => std::ptr::null_mut(),
        }
    }

    unsafe fn lock_notification(&self, target: RawTarget) {
        let lock = self.state().targets.get(&id(target.as_ptr())).map(|t| t.lock.clone());
        match lock {
            Some(lock) => lock.lock(),
            None => log::warn!("mock bus: lock of unknown target"),
        }
    }

    unsafe fn unlock_notification(&self, target: RawTarget) {
        let lock = self.state().targets.get(&id(target.as_ptr())).map(|t| t.lock.clone());
        if let Some(lock) = lock {
            lock.unlock();
        }
    }

    unsafe fn update(
        &self,
        client: RawClient,
        target: RawTarget,
        report: XUSB_REPORT,
    ) -> VIGEM_ERROR {
        let mut state = self.state();
        code((|| {
            let client_id = state.connected_client(client)?;
            let slot = state
                .targets
                .get_mut(&id(target.as_ptr()))
                .ok_or(VIGEM_ERROR_INVALID_TARGET)?;
            match slot.owner {
                None => Err(VIGEM_ERROR_TARGET_NOT_PLUGGED_IN),
                Some(owner) if owner != client_id => Err(VIGEM_ERROR_INVALID_TARGET),
                Some(_) => {
                    slot.report = Some(report);
                    slot.updates += 1;
                    Ok(())
                }
            }
        })())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    fn connected(bus: &MockBus) -> RawClient {
        let client = bus.alloc();
        assert_eq!(unsafe { bus.connect(client) }, VIGEM_ERROR_NONE);
        client
    }

    #[test]
    fn connect_twice_fails() {
        let bus = MockBus::new();
        let client = connected(&bus);
        assert_eq!(
            unsafe { bus.connect(client) },
            VIGEM_ERROR_BUS_ALREADY_CONNECTED
        );
    }

    #[test]
    fn unavailable_bus_is_not_found() {
        let bus = MockBus::unavailable();
        let client = bus.alloc();
        assert_eq!(unsafe { bus.connect(client) }, VIGEM_ERROR_BUS_NOT_FOUND);
        assert!(!bus.is_connected(client));
    }

    #[test]
    fn disconnect_is_safe_on_fresh_client() {
        let bus = MockBus::new();
        let client = bus.alloc();
        unsafe {
            bus.disconnect(client);
            bus.free(client);
        }
        assert_eq!(bus.live_handles(), 0);
    }

    #[test]
    fn capacity_limits_attached_targets() {
        let bus = MockBus::with_capacity(2);
        let client = connected(&bus);
        let targets: Vec<_> = (0..3).map(|_| bus.target_alloc(TargetKind::X360)).collect();
        unsafe {
            assert_eq!(bus.target_add(client, targets[0]), VIGEM_ERROR_NONE);
            assert_eq!(bus.target_add(client, targets[1]), VIGEM_ERROR_NONE);
            assert_eq!(bus.target_add(client, targets[2]), VIGEM_ERROR_NO_FREE_SLOT);
            assert_eq!(bus.target_add(client, targets[0]), VIGEM_ERROR_ALREADY_CONNECTED);

            assert_eq!(bus.target_remove(client, targets[1]), VIGEM_ERROR_NONE);
            assert_eq!(bus.target_add(client, targets[2]), VIGEM_ERROR_NONE);
        }
        assert_eq!(bus.attached(), 2);
    }

    #[test]
    fn target_of_other_client_cannot_be_removed() {
        let bus = MockBus::new();
        let first = connected(&bus);
        let second = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        unsafe {
            assert_eq!(bus.target_add(first, target), VIGEM_ERROR_NONE);
            assert_eq!(bus.target_remove(second, target), VIGEM_ERROR_REMOVAL_FAILED);
            assert_eq!(bus.target_remove(first, target), VIGEM_ERROR_NONE);
            assert_eq!(
                bus.target_remove(first, target),
                VIGEM_ERROR_TARGET_NOT_PLUGGED_IN
            );
        }
    }

    #[test]
    fn disconnect_unplugs_targets() {
        let bus = MockBus::new();
        let client = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        unsafe {
            assert_eq!(bus.target_add(client, target), VIGEM_ERROR_NONE);
            bus.disconnect(client);
        }
        assert!(!bus.is_attached(target));
        assert_eq!(
            unsafe { bus.update(client, target, XUSB_REPORT::default()) },
            VIGEM_ERROR_BUS_INVALID_HANDLE
        );
    }

    #[test]
    fn update_requires_plugged_in_target() {
        let bus = MockBus::new();
        let client = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        let report = XUSB_REPORT {
            wButtons: XUSB_GAMEPAD_A,
            ..XUSB_REPORT::default()
        };
        unsafe {
            assert_eq!(
                bus.update(client, target, report),
                VIGEM_ERROR_TARGET_NOT_PLUGGED_IN
            );
            assert_eq!(bus.target_add(client, target), VIGEM_ERROR_NONE);
            assert_eq!(bus.update(client, target, report), VIGEM_ERROR_NONE);
        }
        assert_eq!(bus.last_report(target), Some(report));
        assert_eq!(bus.update_count(target), 1);
    }

    unsafe extern "C" fn record(
        client: PVIGEM_CLIENT,
        target: PVIGEM_TARGET,
        large_motor: u8,
        small_motor: u8,
        led_number: u8,
        user_data: *mut c_void,
    ) {
        let seen = &mut *user_data.cast::<Vec<(usize, usize, u8, u8, u8)>>();
        seen.push((
            client as usize,
            target as usize,
            large_motor,
            small_motor,
            led_number,
        ));
    }

    #[test]
    fn notification_passes_payload_and_user_data_through() {
        let bus = MockBus::new();
        let client = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        let mut seen: Vec<(usize, usize, u8, u8, u8)> = Vec::new();
        let user_data = std::ptr::addr_of_mut!(seen).cast::<c_void>();

        unsafe {
            assert_eq!(bus.target_add(client, target), VIGEM_ERROR_NONE);
            assert_eq!(
                bus.register_notification(client, target, Some(record), user_data),
                VIGEM_ERROR_NONE
            );
            assert_eq!(
                bus.register_notification(client, target, Some(record), user_data),
                VIGEM_ERROR_CALLBACK_ALREADY_REGISTERED
            );
        }
        assert!(bus.notify(target, 200, 50, 2));

        let returned = unsafe { bus.unregister_notification(target) };
        assert_eq!(returned, user_data);
        assert!(unsafe { bus.unregister_notification(target) }.is_null());
        assert!(!bus.notify(target, 1, 1, 1));

        assert_eq!(
            seen,
            vec![(client.as_ptr() as usize, target.as_ptr() as usize, 200, 50, 2)]
        );
    }

    #[test]
    fn register_rejects_missing_callback_and_unplugged_target() {
        let bus = MockBus::new();
        let client = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        unsafe {
            assert_eq!(
                bus.register_notification(client, target, Some(record), std::ptr::null_mut()),
                VIGEM_ERROR_TARGET_NOT_PLUGGED_IN
            );
            assert_eq!(bus.target_add(client, target), VIGEM_ERROR_NONE);
            assert_eq!(
                bus.register_notification(client, target, None, std::ptr::null_mut()),
                VIGEM_ERROR_INVALID_PARAMETER
            );
        }
    }

    #[test]
    fn injected_failures_apply_once() {
        let bus = MockBus::new();
        let client = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        bus.fail_next_register(VIGEM_ERROR_NOT_SUPPORTED);
        bus.fail_next_remove(VIGEM_ERROR_REMOVAL_FAILED);
        unsafe {
            assert_eq!(bus.target_add(client, target), VIGEM_ERROR_NONE);
            assert_eq!(
                bus.register_notification(client, target, Some(record), std::ptr::null_mut()),
                VIGEM_ERROR_NOT_SUPPORTED
            );
            assert_eq!(bus.target_remove(client, target), VIGEM_ERROR_REMOVAL_FAILED);
            assert!(bus.is_attached(target));
            assert_eq!(bus.target_remove(client, target), VIGEM_ERROR_NONE);
        }
    }

    #[test]
    fn notify_waits_for_notification_lock() {
        let bus = Arc::new(MockBus::new());
        let client = connected(&bus);
        let target = bus.target_alloc(TargetKind::X360);
        unsafe { bus.target_add(client, target) };

        unsafe { bus.lock_notification(target) };
        let done = Arc::new(AtomicBool::new(false));
        let handle = {
            let bus = bus.clone();
            let done = done.clone();
            thread::spawn(move || {
                bus.notify(target, 0, 0, 0);
                done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst));
        unsafe { bus.unlock_notification(target) };
        handle.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
    }
}
