//! Lock helpers.
//!
//! Component state sits behind `RwLock`s that are only ever held for a
//! synchronous update, never across an `.await`. A poisoned lock still holds
//! a consistent value, so it is recovered rather than propagated.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
