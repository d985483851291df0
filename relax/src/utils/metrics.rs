use std::time::{Duration, Instant};

/// Runs `f` and returns its result together with how long it took.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let tt = Instant::now();
    let val = f();

    (val, tt.elapsed())
}

/// Logs the duration of a denoise call, if the `metrics` feature is on.
#[cfg(feature = "metrics")]
pub fn report(label: &str, frame_index: u64, tt: Duration) {
    log::trace!(
        "Viewport `{label}` denoised; frame-index = {frame_index}, tt = {}",
        humantime::format_duration(tt),
    );
}

#[cfg(not(feature = "metrics"))]
pub fn report(_label: &str, _frame_index: u64, _tt: Duration) {
    //
}
