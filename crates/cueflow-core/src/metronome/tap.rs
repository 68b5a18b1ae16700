use crate::config::{MAX_BPM, MIN_BPM};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_TAPS: usize = 4;

/// Tempo from the average interval of the last few taps.
#[derive(Debug, Clone)]
pub struct TapTempo {
    taps: VecDeque<Instant>,
    reset_after: Duration,
}

impl TapTempo {
    pub fn new(reset_after: Duration) -> Self {
        Self {
            taps: VecDeque::with_capacity(MAX_TAPS),
            reset_after,
        }
    }

    /// Records a tap. Returns the new tempo once two taps are in range.
    pub fn tap(&mut self, now: Instant) -> Option<f64> {
        if let Some(&last) = self.taps.back() {
            if now.saturating_duration_since(last) > self.reset_after {
                self.taps.clear();
            }
        }
        self.taps.push_back(now);
        while self.taps.len() > MAX_TAPS {
            self.taps.pop_front();
        }

        let first = *self.taps.front()?;
        let last = *self.taps.back()?;
        let intervals = self.taps.len().checked_sub(1).filter(|&n| n > 0)?;
        let average = last.saturating_duration_since(first).as_secs_f64() / intervals as f64;
        if average <= 0.0 {
            return None;
        }
        Some((60.0 / average).clamp(MIN_BPM, MAX_BPM))
    }

    pub fn reset(&mut self) {
        self.taps.clear();
    }
}
