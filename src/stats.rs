//! Flow rate through the door
//!
//! Works on the cumulative exit series recorded once per step, the same
//! numbers the benchmark file holds.

/// Exits per step over a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowStats {
    /// Mean pedestrians leaving per step
    pub mean: f64,
    /// Population standard deviation of pedestrians leaving per step
    pub std_dev: f64,
    /// Steps the statistics cover
    pub steps: usize,
}

/// Exits per step from a cumulative series, the first entry measured
/// against zero
fn per_step(cumulative: &[u64]) -> Vec<f64> {
    let mut previous = 0;
    cumulative
        .iter()
        .map(|&c| {
            let d = c.saturating_sub(previous);
            previous = c;
            d as f64
        })
        .collect()
}

impl FlowStats {
    /// Statistics of the per-step differences of `cumulative`.
    ///
    /// The first entry is measured against zero, so a series of `n` values
    /// yields `n` samples.
    pub fn from_cumulative(cumulative: &[u64]) -> Self {
        Self::from_per_step(&per_step(cumulative))
    }

    /// Statistics over every step of several runs, pooled into one sample
    /// set. Each series is differenced on its own.
    pub fn pooled<'a, I>(series: I) -> Self
    where
        I: IntoIterator<Item = &'a [u64]>,
    {
        let samples: Vec<f64> = series.into_iter().flat_map(per_step).collect();
        Self::from_per_step(&samples)
    }

    fn from_per_step(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            std_dev: variance.sqrt(),
            steps: samples.len(),
        }
    }

    /// Mean flow in pedestrians per second
    pub fn rate_per_second(&self, dt: f64) -> f64 {
        if dt > 0.0 { self.mean / dt } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        let stats = FlowStats::from_cumulative(&[]);
        assert_eq!(stats, FlowStats::default());
        assert_eq!(stats.rate_per_second(0.025), 0.0);
    }

    #[test]
    fn test_constant_flow() {
        let stats = FlowStats::from_cumulative(&[1, 2, 3, 4]);
        assert_eq!(stats.steps, 4);
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert!(stats.std_dev.abs() < 1e-12);
        assert!((stats.rate_per_second(0.5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_pooled_rounds_restart_from_zero() {
        // Per step: 1, 1 then 3, 0, 0
        let a = [1, 2];
        let b = [3, 3, 3];
        let stats = FlowStats::pooled([&a[..], &b[..]]);
        assert_eq!(stats.steps, 5);
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert!((stats.std_dev - (6.0f64 / 5.0).sqrt()).abs() < 1e-12);

        assert_eq!(FlowStats::pooled([&a[..]]), FlowStats::from_cumulative(&a));
    }

    #[test]
    fn test_bursty_flow() {
        // Per step: 0, 2, 0, 2
        let stats = FlowStats::from_cumulative(&[0, 2, 2, 4]);
        assert!((stats.mean - 1.0).abs() < 1e-12);
        assert!((stats.std_dev - 1.0).abs() < 1e-12);
    }
}
