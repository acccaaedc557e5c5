//! Monotonic time source

/// Monotonic millisecond clock
///
/// The controller uses this to bound the retraction poll loop; drivers use
/// it to track non-blocking timed runs and stall debouncing.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch. Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since`
    fn elapsed_ms(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        T::now_ms(self)
    }
}
