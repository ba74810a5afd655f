use std::time::Duration;

use log::warn;

/// Call `f` until it succeeds, it fails with an error for which `retryable`
/// returns false, or `max_attempts` calls have been made.  The wait between
/// attempts doubles every time.
///
/// Suggested `max_attempts = 3`, `initial_wait = Duration::from_millis(500)`.
pub fn with_retry<T, E, F, R>(
    max_attempts: u32,
    initial_wait: Duration,
    retryable: R,
    mut f: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
    R: Fn(&E) -> bool,
{
    let mut attempts = 0;
    let mut wait_duration = initial_wait;

    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempts += 1;
                if attempts >= max_attempts || !retryable(&e) {
                    return Err(e);
                }
                warn!(
                    "Retrying after error: {} (attempt {}/{})",
                    e, attempts, max_attempts
                );
                std::thread::sleep(wait_duration);
                wait_duration *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;

    #[test]
    fn stops_on_permanent_error() {
        let calls = Cell::new(0);
        let res: Result<(), String> = with_retry(5, Duration::ZERO, |_| false, || {
            calls.set(calls.get() + 1);
            Err("not found".to_string())
        });
        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_transient_error_until_success() {
        let calls = Cell::new(0);
        let res: Result<u32, String> = with_retry(5, Duration::ZERO, |_| true, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err("timeout".to_string())
            } else {
                Ok(42)
            }
        });
        assert_eq!(res, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let res: Result<(), String> = with_retry(3, Duration::ZERO, |_| true, || {
            calls.set(calls.get() + 1);
            Err("timeout".to_string())
        });
        assert_eq!(res, Err("timeout".to_string()));
        assert_eq!(calls.get(), 3);
    }
}
