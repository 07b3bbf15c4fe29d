//! Rolling frame rate estimate.

use std::collections::VecDeque;
use std::time::Duration;

/// Fixed-capacity window of per-frame rates, reported as their mean
#[derive(Debug, Clone)]
pub struct FpsWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl FpsWindow {
    /// Create a window holding at most `capacity` samples (at least one)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Record one frame's wall-clock duration; a zero duration counts as 0 fps
    pub fn record(&mut self, frame_time: Duration) {
        let seconds = frame_time.as_secs_f64();
        self.push(if seconds > 0.0 { 1.0 / seconds } else { 0.0 });
    }

    /// Push a rate sample, evicting the oldest when full
    pub fn push(&mut self, rate: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(rate);
    }

    /// Arithmetic mean of the current samples, 0 when empty
    #[must_use]
    pub fn fps(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
