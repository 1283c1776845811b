use std::thread;
use std::time::{Duration, Instant};

/// Polls the condition until it holds, failing the test after five seconds.
pub fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition was not met in time");
        thread::sleep(Duration::from_millis(5));
    }
}
