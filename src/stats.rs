// Running statistic: latest value, arithmetic mean and a smoothed blend.

/// Weight given to history when blending a new sample into the smoothed value.
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.5;

/// Tracks one reported quantity across sampling ticks.
///
/// `last` is clamped at zero so a counter-reset artifact never shows up as a
/// negative rate, while `total` (and therefore `mean`) sums the raw samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStat {
    smoothing_factor: f64,
    last: f64,
    mean: f64,
    smoothed: f64,
    total: f64,
    count: u64,
}

impl Default for RunningStat {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FACTOR)
    }
}

impl RunningStat {
    pub fn new(smoothing_factor: f64) -> Self {
        Self {
            smoothing_factor,
            last: 0.0,
            mean: 0.0,
            smoothed: 0.0,
            total: 0.0,
            count: 0,
        }
    }

    /// Zeroes every derived field; the smoothing factor is kept.
    pub fn reset(&mut self) {
        self.last = 0.0;
        self.mean = 0.0;
        self.smoothed = 0.0;
        self.total = 0.0;
        self.count = 0;
    }

    pub fn update(&mut self, sample: f64) {
        self.last = sample.max(0.0);
        self.total += sample;
        // Blends against the previous mean, not the previous smoothed value.
        self.smoothed = if self.count == 0 {
            sample
        } else {
            self.mean * self.smoothing_factor + sample * (1.0 - self.smoothing_factor)
        };
        self.count += 1;
        self.mean = self.total / self.count as f64;
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn smoothed(&self) -> f64 {
        self.smoothed
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn smoothing_factor(&self) -> f64 {
        self.smoothing_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn new_starts_at_zero() {
        let s = RunningStat::new(0.3);
        assert_eq!(s.last(), 0.0);
        assert_eq!(s.mean(), 0.0);
        assert_eq!(s.smoothed(), 0.0);
        assert_eq!(s.total(), 0.0);
        assert_eq!(s.count(), 0);
        assert_eq!(s.smoothing_factor(), 0.3);
        assert_eq!(RunningStat::default().smoothing_factor(), 0.5);
    }

    #[test]
    fn mean_is_total_over_count() {
        let mut s = RunningStat::default();
        let samples = [1.5, 0.0, 7.25, 3.0, 12.0];
        for x in samples {
            s.update(x);
        }
        let expected: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!(approx(s.mean(), expected));
        assert!(approx(s.mean(), s.total() / s.count() as f64));
        assert_eq!(s.last(), 12.0);
        assert_eq!(s.count(), 5);
    }

    #[test]
    fn negative_sample_clamps_last_but_counts_in_total() {
        let mut s = RunningStat::default();
        s.update(4.0);
        s.update(-2.0);
        assert_eq!(s.last(), 0.0);
        assert!(approx(s.total(), 2.0));
        assert!(approx(s.mean(), 1.0));
    }

    #[test]
    fn first_update_sets_smoothed_to_sample() {
        for factor in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let mut s = RunningStat::new(factor);
            s.update(42.0);
            assert_eq!(s.smoothed(), 42.0);
        }
    }

    #[test]
    fn smoothed_blends_previous_mean_with_sample() {
        let mut s = RunningStat::new(0.25);
        s.update(10.0);
        s.update(30.0);
        // previous mean 10: 10 * 0.25 + 30 * 0.75
        assert!(approx(s.smoothed(), 25.0));
        s.update(0.0);
        // previous mean 20: 20 * 0.25 + 0 * 0.75
        assert!(approx(s.smoothed(), 5.0));
    }

    #[test]
    fn reset_behaves_like_fresh_instance() {
        let mut used = RunningStat::new(0.7);
        used.update(3.0);
        used.update(-1.0);
        used.update(9.0);
        used.reset();
        assert_eq!(used.smoothing_factor(), 0.7);
        used.update(5.5);

        let mut fresh = RunningStat::new(0.7);
        fresh.update(5.5);
        assert_eq!(used, fresh);
    }
}
