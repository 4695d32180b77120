/// Seconds since the UNIX epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn current_time_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Seconds since page load (`performance.now()`)
#[cfg(target_arch = "wasm32")]
pub fn current_time_secs() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| perf.now() / 1000.0)
        .unwrap_or(0.0)
}

/// True once `interval_secs` have passed since `since`.
///
/// A clock that went backwards counts as elapsed so autosave cannot stall.
pub fn interval_elapsed(since: f64, now: f64, interval_secs: u64) -> bool {
    let elapsed = now - since;
    elapsed < 0.0 || elapsed >= interval_secs as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_checks() {
        assert!(!interval_elapsed(100.0, 110.0, 30));
        assert!(interval_elapsed(100.0, 130.0, 30));
        assert!(interval_elapsed(100.0, 50.0, 30));
    }
}
