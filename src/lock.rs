use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the inner value if a panicking holder poisoned it.
///
/// Handler panics are caught at the router, so a poisoned lock must not take
/// the whole input path down with it.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            crate::log_debug(&format!("Mutex poisoned in {context}; recovering"));
            poisoned.into_inner()
        }
    }
}
