//! Timing utilities.

use std::time::Instant;

#[cfg(feature = "timings")]
#[inline]
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    always_timed(name, f)
}

#[cfg(not(feature = "timings"))]
#[inline]
pub fn timed<R>(_: &str, f: impl FnOnce() -> R) -> R {
    f()
}

#[inline]
pub fn always_timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    let span = tracing::info_span!("timed", section = name);
    let _enter = span.enter();
    let t = Instant::now();
    let r = f();
    tracing::info!(elapsed_ms = %t.elapsed().as_millis(), "{}", name);
    r
}
