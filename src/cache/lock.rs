//! Poison-tolerant lock access.
//!
//! A panic while a guard is held must not take the cache down with it, so a
//! poisoned lock is recovered and the incident logged.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), op, "rwlock.read")
}

pub(crate) fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), op, "rwlock.write")
}

fn recover<G>(result: LockResult<G>, op: &'static str, lock_kind: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op,
            lock_kind,
            result = "poisoned_recovered",
            "Recovered from poisoned lock; state may be stale"
        );
        poisoned.into_inner()
    })
}
