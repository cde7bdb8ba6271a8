//! Lock helpers
//!
//! Mailboxes, subscription tables and the registry all use std locks that
//! are never held across an `.await`. A poisoned lock means a panic happened
//! while a structure was mid-update; these helpers turn that into a
//! [`ProviderError::Internal`] instead of propagating the panic.

use crate::provider::error::ProviderError;
use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

/// Convert a poisoned mutex lock into a provider error
pub fn lock_mutex<'a, T>(
    result: LockResult<MutexGuard<'a, T>>,
    what: &str,
) -> Result<MutexGuard<'a, T>, ProviderError> {
    result.map_err(|poison_err| ProviderError::Internal {
        message: format!(
            "Internal synchronisation error ({} mutex poisoned). A panic occurred while holding the lock. PoisonError: {:?}",
            what, poison_err
        ),
    })
}

/// Convert a poisoned RwLock read into a provider error
pub fn read_lock<'a, T>(
    result: LockResult<RwLockReadGuard<'a, T>>,
    what: &str,
) -> Result<RwLockReadGuard<'a, T>, ProviderError> {
    result.map_err(|poison_err| ProviderError::Internal {
        message: format!(
            "Internal synchronisation error ({} RwLock read poisoned). A panic occurred while holding a write lock. PoisonError: {:?}",
            what, poison_err
        ),
    })
}

/// Convert a poisoned RwLock write into a provider error
pub fn write_lock<'a, T>(
    result: LockResult<RwLockWriteGuard<'a, T>>,
    what: &str,
) -> Result<RwLockWriteGuard<'a, T>, ProviderError> {
    result.map_err(|poison_err| ProviderError::Internal {
        message: format!(
            "Internal synchronisation error ({} RwLock write poisoned). A panic occurred while holding the lock. PoisonError: {:?}",
            what, poison_err
        ),
    })
}
