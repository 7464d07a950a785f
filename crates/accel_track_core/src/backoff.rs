/// Exponential reconnect delay: starts at `initial_ms`, doubles after every
/// failed attempt and never exceeds `max_ms`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial_ms: u64,
    max_ms: u64,
    current_ms: u64,
}

impl Backoff {
    pub const fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            initial_ms,
            max_ms,
            current_ms: initial_ms,
        }
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay_ms(&mut self) -> u64 {
        let delay = self.current_ms.min(self.max_ms);
        self.current_ms = self.current_ms.saturating_mul(2).min(self.max_ms);
        delay
    }

    pub fn reset(&mut self) {
        self.current_ms = self.initial_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_cap() {
        let mut backoff = Backoff::new(500, 4_000);
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_delay_ms()).collect();
        assert_eq!(delays, [500, 1_000, 2_000, 4_000, 4_000, 4_000]);
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new(250, 1_000);
        backoff.next_delay_ms();
        backoff.next_delay_ms();
        backoff.reset();
        assert_eq!(backoff.next_delay_ms(), 250);
    }

    #[test]
    fn initial_above_cap_is_clamped() {
        let mut backoff = Backoff::new(10_000, 1_000);
        assert_eq!(backoff.next_delay_ms(), 1_000);
    }
}
