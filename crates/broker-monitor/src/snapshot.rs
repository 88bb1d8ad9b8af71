// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Epoch-checked snapshot copies and poisoned-lock recovery.
//!
//! Every structural mutation of the live registry bumps an epoch counter.
//! A snapshot copies what it needs under the registry read lock and compares
//! the epoch before and after; when they differ the copy is retried so the
//! caller gets a view that corresponds to a single registry generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const MAX_RETRIES: usize = 3;

/// Copy data out of `data` with `extractor`, retrying while `epoch` moves.
///
/// After `MAX_RETRIES` unstable attempts the last copy is returned.
pub(crate) fn snapshot_with_epoch<T, R, F>(epoch: &AtomicU64, data: &RwLock<T>, extractor: F) -> R
where
    F: Fn(&T) -> R,
{
    let mut attempt = 1;
    loop {
        let epoch_before = epoch.load(Ordering::SeqCst);
        let snapshot = {
            let guard = recover_read(data, "registry snapshot");
            extractor(&guard)
        };
        let epoch_after = epoch.load(Ordering::SeqCst);

        if epoch_before == epoch_after {
            return snapshot;
        }
        if attempt == MAX_RETRIES {
            log::debug!(
                "[monitor] snapshot epoch moved {} times ({} -> {}), returning last copy",
                attempt,
                epoch_before,
                epoch_after
            );
            return snapshot;
        }
        attempt += 1;
    }
}

pub(crate) fn recover_read<'a, T>(lock: &'a RwLock<T>, context: &str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::debug!("[monitor] WARNING: {} poisoned, recovering", context);
            poisoned.into_inner()
        }
    }
}

pub(crate) fn recover_write<'a, T>(
    lock: &'a RwLock<T>,
    context: &str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::debug!("[monitor] WARNING: {} poisoned, recovering", context);
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_stable_epoch_single_pass() {
        let epoch = AtomicU64::new(1);
        let data = RwLock::new(vec![1u64, 2, 3]);
        let calls = AtomicUsize::new(0);

        let sum: u64 = snapshot_with_epoch(&epoch, &data, |v| {
            calls.fetch_add(1, Ordering::SeqCst);
            v.iter().sum()
        });
        assert_eq!(sum, 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_after_concurrent_bump() {
        let epoch = AtomicU64::new(1);
        let data = RwLock::new(100u64);
        let calls = AtomicUsize::new(0);

        let value = snapshot_with_epoch(&epoch, &data, |v| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                epoch.fetch_add(1, Ordering::SeqCst);
            }
            *v
        });
        assert_eq!(value, 100);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retry_limit() {
        let epoch = AtomicU64::new(1);
        let data = RwLock::new(7u64);
        let calls = AtomicUsize::new(0);

        let value = snapshot_with_epoch(&epoch, &data, |v| {
            calls.fetch_add(1, Ordering::SeqCst);
            epoch.fetch_add(1, Ordering::SeqCst);
            *v
        });
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);
    }

    #[test]
    fn test_poisoned_lock_recovery() {
        let lock = Arc::new(RwLock::new(5u32));
        let poisoner = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(lock.is_poisoned());
        assert_eq!(*recover_read(&lock, "test"), 5);
        *recover_write(&lock, "test") = 6;
        assert_eq!(*recover_read(&lock, "test"), 6);
    }
}
