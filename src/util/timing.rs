use std::time::{Duration, Instant};

/// Run an action and measure the wall-clock time it took
///
/// The analysis itself never measures time. Callers that want to report how long an analysis ran
/// wrap the call themselves:
///
/// ```
/// use opstack::util::timed;
///
/// let (sum, elapsed) = timed(|| (1..=10).sum::<u32>());
/// assert_eq!(sum, 55);
/// assert!(elapsed.as_secs() < 60);
/// ```
pub fn timed<T>(action: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let result = action();
    (result, start.elapsed())
}
