//! Run statistics tracking.
//!
//! [`RunStats`] records cumulative statistics across runs: runs completed,
//! total steps, and the final score of every run that ended in a fall.

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// RunStats
// ---------------------------------------------------------------------------

/// Bevy resource that tracks cumulative statistics across runs.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    /// Number of runs that ended in a fall.
    pub runs_completed: u32,
    /// Total steps across all runs.
    pub total_steps: u64,
    /// Final score of each completed run, in order.
    pub scores: Vec<f32>,
}

impl RunStats {
    pub const fn new() -> Self {
        Self {
            runs_completed: 0,
            total_steps: 0,
            scores: Vec::new(),
        }
    }

    pub fn record_fall(&mut self, score: f32) {
        self.runs_completed += 1;
        self.scores.push(score);
    }

    /// Furthest final score.
    pub fn best(&self) -> Option<f32> {
        self.scores.iter().copied().reduce(f32::max)
    }

    /// Mean final score across completed runs.
    pub fn mean_score(&self) -> Option<f32> {
        if self.scores.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.scores.iter().sum::<f32>() / self.scores.len() as f32)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stats_default_empty() {
        let stats = RunStats::new();
        assert_eq!(stats.runs_completed, 0);
        assert!(stats.best().is_none());
        assert!(stats.mean_score().is_none());
    }

    #[test]
    fn best_and_mean() {
        let mut stats = RunStats::new();
        stats.record_fall(1.0);
        stats.record_fall(-0.5);
        stats.record_fall(2.5);
        assert_eq!(stats.runs_completed, 3);
        assert_relative_eq!(stats.best().unwrap(), 2.5);
        assert_relative_eq!(stats.mean_score().unwrap(), 1.0);
    }

    #[test]
    fn reset_clears_stats() {
        let mut stats = RunStats::new();
        stats.record_fall(1.0);
        stats.total_steps = 500;
        stats.reset();
        assert_eq!(stats, RunStats::default());
    }
}
