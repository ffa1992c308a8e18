use std::collections::VecDeque;

pub const EPSILON: f64 = 1e-7;
pub const WINDOW: usize = 20;

/// Plateau detector over mean-queue-length samples.
///
/// Iteration 0 is ignored, iterations 1..=20 fill the window, and from
/// iteration 21 on the oldest sample is evicted and the run is steady once
/// every sample left in the window is within [`EPSILON`] of it. Slow drift
/// below epsilon per window also counts as steady.
#[derive(Clone, Debug)]
pub struct SteadyStateDetector {
    window: VecDeque<f64>,
    current: f64,
    past: f64,
}

impl Default for SteadyStateDetector {
    fn default() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW),
            current: 0.0,
            past: 0.0,
        }
    }
}

impl SteadyStateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.current = 0.0;
        self.past = 0.0;
    }

    pub fn observe(&mut self, iteration: u64, mean_queue_length: f64) -> bool {
        self.current = mean_queue_length;
        if iteration == 0 {
            return false;
        }
        if (iteration as usize) <= WINDOW {
            self.window.push_back(mean_queue_length);
            return false;
        }

        if let Some(evicted) = self.window.pop_front() {
            self.past = evicted;
        }
        self.window.push_back(mean_queue_length);
        self.window
            .iter()
            .all(|sample| (sample - self.past).abs() <= EPSILON)
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn past(&self) -> f64 {
        self.past
    }

    pub fn samples(&self) -> impl Iterator<Item = &f64> {
        self.window.iter()
    }
}
