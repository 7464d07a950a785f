use crate::sample::AccelSample;

/// Holds the sample whose publication failed, so the next broker session
/// sends it before anything new from the queue.
#[derive(Debug, Default)]
pub struct Outbox {
    retained: Option<AccelSample>,
    resent: u32,
}

impl Outbox {
    pub const fn new() -> Self {
        Self {
            retained: None,
            resent: 0,
        }
    }

    /// Takes the retained sample, if any.
    pub fn take(&mut self) -> Option<AccelSample> {
        let sample = self.retained.take();
        if sample.is_some() {
            self.resent = self.resent.wrapping_add(1);
        }
        sample
    }

    /// Keeps `sample` for the next attempt. Only one sample is retained.
    pub fn retain(&mut self, sample: AccelSample) {
        self.retained = Some(sample);
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_none()
    }

    /// Number of samples handed out again after a failed publication.
    pub fn resent(&self) -> u32 {
        self.resent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outbox_yields_nothing() {
        let mut outbox = Outbox::new();
        assert!(outbox.is_empty());
        assert_eq!(outbox.take(), None);
        assert_eq!(outbox.resent(), 0);
    }

    #[test]
    fn failed_sample_is_sent_once_more() {
        let mut outbox = Outbox::new();
        let sample = AccelSample::from_raw([120, -340, 16_384], 1_500);

        outbox.retain(sample);
        assert!(!outbox.is_empty());
        assert_eq!(outbox.take(), Some(sample));
        assert_eq!(outbox.take(), None);
        assert_eq!(outbox.resent(), 1);
    }

    #[test]
    fn sentinel_samples_are_retained_too() {
        let mut outbox = Outbox::new();
        outbox.retain(AccelSample::unavailable(200));
        let sample = outbox.take().map(|s| s.is_unavailable());
        assert_eq!(sample, Some(true));
    }
}
