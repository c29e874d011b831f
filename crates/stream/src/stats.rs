use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// What one streaming update did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStats {
    /// Times the range moved left (negative) or right (positive).
    pub shifts: i32,
    pub blocks_created: usize,
    pub trees_created: usize,
    pub evicted: usize,
    pub live_entities: usize,
    /// Wall time spent in the update; zero when not measured.
    pub frame_time: Duration,
}

impl StreamStats {
    pub fn extended(&self) -> bool {
        self.shifts != 0
    }

    /// Fold another update into this one. Live count and frame time are
    /// taken from `other`.
    pub fn absorb(&mut self, other: &StreamStats) {
        self.shifts += other.shifts;
        self.blocks_created += other.blocks_created;
        self.trees_created += other.trees_created;
        self.evicted += other.evicted;
        self.live_entities = other.live_entities;
        self.frame_time = other.frame_time;
    }
}

/// Rolling window of recent frame durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    history: VecDeque<Duration>,
    capacity: usize,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame timer needs room for at least one sample");
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(dt);
    }

    pub fn count(&self) -> usize {
        self.history.len()
    }

    pub fn last(&self) -> Option<Duration> {
        self.history.back().copied()
    }

    pub fn average(&self) -> Duration {
        if self.history.is_empty() {
            return Duration::ZERO;
        }
        self.history.iter().sum::<Duration>() / self.history.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.history.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.history.iter().copied().min().unwrap_or(Duration::ZERO)
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        assert_eq!(timer.average(), Duration::ZERO);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(timer.min(), Duration::from_millis(10));
        assert_eq!(timer.last(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn timer_drops_oldest_sample() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
        assert_eq!(timer.min(), Duration::from_millis(20));
    }

    #[test]
    fn absorb_sums_work() {
        let mut total = StreamStats::default();
        total.absorb(&StreamStats {
            shifts: 1,
            blocks_created: 10,
            trees_created: 2,
            evicted: 4,
            live_entities: 100,
            frame_time: Duration::ZERO,
        });
        total.absorb(&StreamStats {
            shifts: -1,
            blocks_created: 5,
            live_entities: 90,
            ..StreamStats::default()
        });
        assert_eq!(total.blocks_created, 15);
        assert_eq!(total.shifts, 0);
        assert_eq!(total.live_entities, 90);
        assert!(!total.extended());
    }
}
