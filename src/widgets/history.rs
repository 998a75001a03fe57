//! Bounded sample history feeding sparklines and graphs.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Samples kept by default.
pub const DEFAULT_CAPACITY: usize = 60;

/// Ring of timestamped samples; the oldest drops once full.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    samples: VecDeque<(DateTime<Utc>, f64)>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, at: DateTime<Utc>, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((at, value));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<f64> {
        self.samples.back().map(|(_, v)| *v)
    }

    /// Values, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|(_, v)| *v).collect()
    }

    pub fn points(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.samples.iter().copied().collect()
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().map(|(_, v)| *v).reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().map(|(_, v)| *v).reduce(f64::min)
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().map(|(_, v)| v).sum::<f64>() / self.samples.len() as f64)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(s: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + s, 0).unwrap()
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(t(i), i as f64);
        }
        assert_eq!(h.values(), vec![2.0, 3.0, 4.0]);
        assert_eq!(h.points()[0].0, t(2));
        assert_eq!(h.last(), Some(4.0));
    }

    #[test]
    fn stats() {
        let mut h = History::default();
        assert_eq!(h.mean(), None);
        h.push(t(0), 1.0);
        h.push(t(1), 5.0);
        h.push(t(2), f64::NAN);
        assert_eq!(h.len(), 2);
        assert_eq!(h.min(), Some(1.0));
        assert_eq!(h.max(), Some(5.0));
        assert_eq!(h.mean(), Some(3.0));
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut h = History::new(0);
        h.push(t(0), 1.0);
        h.push(t(1), 2.0);
        assert_eq!(h.values(), vec![2.0]);
    }
}
