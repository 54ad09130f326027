use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Trailing debounce: only the last value pushed is released, once no new
/// value has arrived for the configured delay.
///
/// Time is passed in explicitly so callers (and tests) control the clock.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    pending: Option<T>,
    changed_at: Option<Instant>,
    debounce_ms: u64,
}

impl<T> Default for Debounce<T> {
    fn default() -> Self { Self::new(DEFAULT_DEBOUNCE_MS) }
}

impl<T> Debounce<T> {
    pub fn new(debounce_ms: u64) -> Self { Self { pending: None, changed_at: None, debounce_ms } }

    pub fn delay(&self) -> Duration { Duration::from_millis(self.debounce_ms) }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.changed_at = Some(now);
    }

    pub fn is_pending(&self) -> bool { self.pending.is_some() }

    /// When the pending value becomes due.
    pub fn deadline(&self) -> Option<Instant> { self.changed_at.map(|t0| t0 + self.delay()) }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let t0 = self.changed_at?;
        if now.saturating_duration_since(t0) >= self.delay() {
            self.changed_at = None;
            self.pending.take()
        } else {
            None
        }
    }

    /// Release the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.changed_at = None;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_releases_on_first_poll() {
        let mut d = Debounce::new(0);
        let now = Instant::now();
        d.push(1, now);
        assert_eq!(d.poll(now), Some(1));
        assert_eq!(d.poll(now), None);
    }
}
