use std::time::Duration;

/// Rolling window of frame intervals, for logging the effective refresh
/// rate and jitter of the presentation loop.
#[derive(Debug, Clone)]
pub struct FrameStats {
    samples: Vec<Duration>,
    max_samples: usize,
}

impl FrameStats {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record(&mut self, interval: Duration) {
        if self.samples.len() >= self.max_samples {
            self.samples.remove(0);
        }
        self.samples.push(interval);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|d| d.as_secs_f64() * 1e3).sum();
        sum / self.samples.len() as f64
    }

    /// Standard deviation of the frame interval, in milliseconds.
    pub fn jitter_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let avg = self.average_ms();
        let var = self
            .samples
            .iter()
            .map(|d| {
                let x = d.as_secs_f64() * 1e3;
                (x - avg).powi(2)
            })
            .sum::<f64>()
            / self.samples.len() as f64;
        var.sqrt()
    }

    pub fn effective_fps(&self) -> f64 {
        let avg = self.average_ms();
        if avg > 0.0 { 1e3 / avg } else { 0.0 }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_uniform_frames() {
        let mut stats = FrameStats::new(10);
        for _ in 0..5 {
            stats.record(Duration::from_millis(10));
        }
        assert_eq!(stats.len(), 5);
        assert!((stats.average_ms() - 10.0).abs() < 1e-9);
        assert!(stats.jitter_ms() < 1e-9);
        assert!((stats.effective_fps() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn window_discards_oldest_samples() {
        let mut stats = FrameStats::new(2);
        stats.record(Duration::from_millis(100));
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(10));
        assert_eq!(stats.len(), 2);
        assert!((stats.average_ms() - 10.0).abs() < 1e-9);
    }
}
