use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Lock `lock`, taking over the data if a previous holder panicked.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            crate::log_debug(&format!("Mutex poisoned in {context}; recovering"));
            poisoned.into_inner()
        }
    }
}

pub(crate) fn wait_or_recover<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    context: &str,
) -> MutexGuard<'a, T> {
    condvar.wait(guard).unwrap_or_else(|poisoned| {
        crate::log_debug(&format!("Mutex poisoned while waiting in {context}; recovering"));
        poisoned.into_inner()
    })
}

pub(crate) fn wait_timeout_or_recover<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
    context: &str,
) -> MutexGuard<'a, T> {
    match condvar.wait_timeout(guard, timeout) {
        Ok((guard, _)) => guard,
        Err(poisoned) => {
            crate::log_debug(&format!("Mutex poisoned while waiting in {context}; recovering"));
            poisoned.into_inner().0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn poisoned_mutex_is_recovered() {
        let shared = Arc::new(Mutex::new(7));
        let poisoner = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().expect("lock");
            panic!("poison it");
        })
        .join();
        assert!(shared.is_poisoned());
        assert_eq!(*lock_or_recover(&shared, "test"), 7);
    }

    #[test]
    fn timed_wait_returns_guard() {
        let mutex = Mutex::new(1);
        let condvar = Condvar::new();
        let guard = lock_or_recover(&mutex, "test");
        let guard = wait_timeout_or_recover(&condvar, guard, Duration::from_millis(5), "test");
        assert_eq!(*guard, 1);
    }
}
