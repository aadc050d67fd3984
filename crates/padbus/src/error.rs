use padbus_sys::*;
use thiserror::Error;

/// Raw outcome of a bus call, with the exact driver values.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    None = VIGEM_ERROR_NONE,
    BusNotFound = VIGEM_ERROR_BUS_NOT_FOUND,
    NoFreeSlot = VIGEM_ERROR_NO_FREE_SLOT,
    InvalidTarget = VIGEM_ERROR_INVALID_TARGET,
    RemovalFailed = VIGEM_ERROR_REMOVAL_FAILED,
    AlreadyConnected = VIGEM_ERROR_ALREADY_CONNECTED,
    TargetUninitialized = VIGEM_ERROR_TARGET_UNINITIALIZED,
    TargetNotPluggedIn = VIGEM_ERROR_TARGET_NOT_PLUGGED_IN,
    BusVersionMismatch = VIGEM_ERROR_BUS_VERSION_MISMATCH,
    BusAccessFailed = VIGEM_ERROR_BUS_ACCESS_FAILED,
    CallbackAlreadyRegistered = VIGEM_ERROR_CALLBACK_ALREADY_REGISTERED,
    CallbackNotFound = VIGEM_ERROR_CALLBACK_NOT_FOUND,
    BusAlreadyConnected = VIGEM_ERROR_BUS_ALREADY_CONNECTED,
    BusInvalidHandle = VIGEM_ERROR_BUS_INVALID_HANDLE,
    XusbUserIndexOutOfRange = VIGEM_ERROR_XUSB_USERINDEX_OUT_OF_RANGE,
    InvalidParameter = VIGEM_ERROR_INVALID_PARAMETER,
    NotSupported = VIGEM_ERROR_NOT_SUPPORTED,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 17] = [
        ErrorCode::None,
        ErrorCode::BusNotFound,
        ErrorCode::NoFreeSlot,
        ErrorCode::InvalidTarget,
        ErrorCode::RemovalFailed,
        ErrorCode::AlreadyConnected,
        ErrorCode::TargetUninitialized,
        ErrorCode::TargetNotPluggedIn,
        ErrorCode::BusVersionMismatch,
        ErrorCode::BusAccessFailed,
        ErrorCode::CallbackAlreadyRegistered,
        ErrorCode::CallbackNotFound,
        ErrorCode::BusAlreadyConnected,
        ErrorCode::BusInvalidHandle,
        ErrorCode::XusbUserIndexOutOfRange,
        ErrorCode::InvalidParameter,
        ErrorCode::NotSupported,
    ];

    /// Look up a raw driver value. Returns `None` for values the header
    /// does not declare.
    pub fn from_raw(raw: VIGEM_ERROR) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.raw() == raw)
    }

    #[inline]
    pub const fn raw(self) -> VIGEM_ERROR {
        self as VIGEM_ERROR
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, ErrorCode::None)
    }

    pub fn into_result(self) -> Result<()> {
        let err = match self {
            ErrorCode::None => return Ok(()),
            ErrorCode::BusNotFound => Error::BusNotFound,
            ErrorCode::NoFreeSlot => Error::NoFreeSlot,
            ErrorCode::InvalidTarget => Error::InvalidTarget,
            ErrorCode::RemovalFailed => Error::RemovalFailed,
            ErrorCode::AlreadyConnected => Error::AlreadyConnected,
            ErrorCode::TargetUninitialized => Error::TargetUninitialized,
            ErrorCode::TargetNotPluggedIn => Error::TargetNotPluggedIn,
            ErrorCode::BusVersionMismatch => Error::BusVersionMismatch,
            ErrorCode::BusAccessFailed => Error::BusAccessFailed,
            ErrorCode::CallbackAlreadyRegistered => Error::CallbackAlreadyRegistered,
            ErrorCode::CallbackNotFound => Error::CallbackNotFound,
            ErrorCode::BusAlreadyConnected => Error::BusAlreadyConnected,
            ErrorCode::BusInvalidHandle => Error::BusInvalidHandle,
            ErrorCode::XusbUserIndexOutOfRange => Error::XusbUserIndexOutOfRange,
            ErrorCode::InvalidParameter => Error::InvalidParameter,
            ErrorCode::NotSupported => Error::NotSupported,
        };
        Err(err)
    }
}

/// Error type for bus operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bus driver not found")]
    BusNotFound,
    #[error("no free slot on the bus")]
    NoFreeSlot,
    #[error("invalid target")]
    InvalidTarget,
    #[error("target removal failed")]
    RemovalFailed,
    #[error("target is already plugged in")]
    AlreadyConnected,
    #[error("target is not initialized")]
    TargetUninitialized,
    #[error("target is not plugged in")]
    TargetNotPluggedIn,
    #[error("bus driver version mismatch")]
    BusVersionMismatch,
    #[error("bus access failed")]
    BusAccessFailed,
    #[error("notification callback already registered")]
    CallbackAlreadyRegistered,
    #[error("notification callback not found")]
    CallbackNotFound,
    #[error("client is already connected to the bus")]
    BusAlreadyConnected,
    #[error("invalid bus handle")]
    BusInvalidHandle,
    #[error("XUSB user index out of range")]
    XusbUserIndexOutOfRange,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("operation not supported")]
    NotSupported,
    /// Plugging in failed and undoing the partial plug-in failed as well.
    #[error("plug-in failed: {source}; cleanup failed: {cleanup}")]
    PlugIn {
        source: Box<Error>,
        cleanup: Box<Error>,
    },
    /// The driver handed back user data this binding did not register.
    #[error("driver returned foreign notification user data")]
    ForeignUserData,
    #[error("unknown bus error code {0:#010x}")]
    Unknown(u32),
}

impl Error {
    /// The driver code behind this error, if there is one.
    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            Error::BusNotFound => ErrorCode::BusNotFound,
            Error::NoFreeSlot => ErrorCode::NoFreeSlot,
            Error::InvalidTarget => ErrorCode::InvalidTarget,
            Error::RemovalFailed => ErrorCode::RemovalFailed,
            Error::AlreadyConnected => ErrorCode::AlreadyConnected,
            Error::TargetUninitialized => ErrorCode::TargetUninitialized,
            Error::TargetNotPluggedIn => ErrorCode::TargetNotPluggedIn,
            Error::BusVersionMismatch => ErrorCode::BusVersionMismatch,
            Error::BusAccessFailed => ErrorCode::BusAccessFailed,
            Error::CallbackAlreadyRegistered => ErrorCode::CallbackAlreadyRegistered,
            Error::CallbackNotFound => ErrorCode::CallbackNotFound,
            Error::BusAlreadyConnected => ErrorCode::BusAlreadyConnected,
            Error::BusInvalidHandle => ErrorCode::BusInvalidHandle,
            Error::XusbUserIndexOutOfRange => ErrorCode::XusbUserIndexOutOfRange,
            Error::InvalidParameter => ErrorCode::InvalidParameter,
            Error::NotSupported => ErrorCode::NotSupported,
            Error::PlugIn { .. } | Error::ForeignUserData | Error::Unknown(_) => {
                return None
            }
        };
        Some(code)
    }
}

/// Convenient result alias for bus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Convert a raw driver value into a result.
pub(crate) fn check(raw: VIGEM_ERROR) -> Result<()> {
    match ErrorCode::from_raw(raw) {
        Some(code) => code.into_result(),
        None => Err(Error::Unknown(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_distinct_from_every_failure() {
        for code in &ErrorCode::ALL[1..] {
            assert_ne!(code.raw(), ErrorCode::None.raw());
            assert!(!code.is_success());
        }
        assert!(ErrorCode::None.is_success());
    }

    #[test]
    fn failure_codes_are_unique_and_share_high_bits() {
        let failures = &ErrorCode::ALL[1..];
        for (i, a) in failures.iter().enumerate() {
            assert_eq!(a.raw() & 0xF000_0000, 0xE000_0000);
            for b in &failures[i + 1..] {
                assert_ne!(a.raw(), b.raw(), "{a:?} and {b:?} collide");
            }
        }
    }

    #[test]
    fn raw_values_round_trip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_raw(code.raw()), Some(code));
        }
        assert_eq!(ErrorCode::from_raw(0xE000_000A), None);
        assert_eq!(ErrorCode::None.raw(), 0x2000_0000);
        assert_eq!(ErrorCode::CallbackAlreadyRegistered.raw(), 0xE000_0010);
    }

    #[test]
    fn check_maps_codes_to_errors() {
        assert!(check(VIGEM_ERROR_NONE).is_ok());
        assert!(matches!(
            check(VIGEM_ERROR_NO_FREE_SLOT),
            Err(Error::NoFreeSlot)
        ));
        assert!(matches!(check(0xDEAD_BEEF), Err(Error::Unknown(0xDEAD_BEEF))));
    }

    #[test]
    fn errors_map_back_to_their_code() {
        for code in &ErrorCode::ALL[1..] {
            let err = code.into_result().unwrap_err();
            assert_eq!(err.code(), Some(*code));
        }
        assert_eq!(Error::ForeignUserData.code(), None);
    }
}
