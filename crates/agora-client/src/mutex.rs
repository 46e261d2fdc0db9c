//! Poison-recovering lock helper.
//!
//! Engine state lives behind `std::sync::Mutex` and is never held across an
//! await. A panic while holding a lock leaves flag maps in a usable state,
//! so poisoning is recovered rather than propagated.

use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
