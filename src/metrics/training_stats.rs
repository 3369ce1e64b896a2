//! Per-episode training statistics
//!
//! Tracks scores, the best score and the running mean over the whole run, plus
//! a rolling window of recent scores and losses for smoothed progress output.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Training statistics tracker
///
/// # Example
///
/// ```rust
/// use q_snake::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
/// stats.record_episode(4, 120);
/// stats.record_episode(2, 80);
///
/// assert_eq!(stats.record(), 4);
/// assert_eq!(stats.mean_score(), 3.0);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Every episode's final score, oldest first
    scores: Vec<u32>,

    /// Running mean after each episode, parallel to `scores`
    mean_scores: Vec<f32>,

    /// Recent scores (rolling window)
    recent_scores: VecDeque<u32>,

    /// Recent training losses (rolling window)
    recent_losses: VecDeque<f32>,

    total_score: u64,
    total_steps: usize,
    record: u32,
    window_size: usize,
    started: Instant,
}

impl TrainingStats {
    /// Create a tracker keeping `window_size` values for rolling averages
    pub fn new(window_size: usize) -> Self {
        Self {
            scores: Vec::new(),
            mean_scores: Vec::new(),
            recent_scores: VecDeque::with_capacity(window_size),
            recent_losses: VecDeque::with_capacity(window_size),
            total_score: 0,
            total_steps: 0,
            record: 0,
            window_size,
            started: Instant::now(),
        }
    }

    /// Start from a best score carried over from an earlier run
    pub fn with_record(mut self, record: u32) -> Self {
        self.record = record;
        self
    }

    /// Record a finished episode.
    ///
    /// Returns `true` if the score beats the previous record.
    pub fn record_episode(&mut self, score: u32, steps: usize) -> bool {
        self.scores.push(score);
        self.total_score += score as u64;
        self.total_steps += steps;
        self.mean_scores
            .push(self.total_score as f32 / self.scores.len() as f32);
        Self::push_deque(&mut self.recent_scores, score, self.window_size);

        let new_record = score > self.record;
        if new_record {
            self.record = score;
        }
        new_record
    }

    /// Record the loss of a training update
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.recent_losses, loss, self.window_size);
    }

    /// Episodes completed in this run
    pub fn episodes(&self) -> usize {
        self.scores.len()
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Best score seen, including any carried-over record
    pub fn record(&self) -> u32 {
        self.record
    }

    pub fn last_score(&self) -> Option<u32> {
        self.scores.last().copied()
    }

    /// Total score divided by episodes; 0.0 before the first episode
    pub fn mean_score(&self) -> f32 {
        self.mean_scores.last().copied().unwrap_or(0.0)
    }

    /// Mean score over the rolling window
    pub fn recent_mean_score(&self) -> f32 {
        if self.recent_scores.is_empty() {
            0.0
        } else {
            self.recent_scores.iter().sum::<u32>() as f32 / self.recent_scores.len() as f32
        }
    }

    /// Mean loss over the rolling window
    pub fn mean_loss(&self) -> f32 {
        if self.recent_losses.is_empty() {
            0.0
        } else {
            self.recent_losses.iter().sum::<f32>() / self.recent_losses.len() as f32
        }
    }

    /// Score history for plotting
    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    /// Running-mean history for plotting
    pub fn mean_scores(&self) -> &[f32] {
        &self.mean_scores
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time as `MM:SS`
    pub fn format_elapsed(&self) -> String {
        format_duration(self.elapsed())
    }

    /// One-line summary of the run so far
    pub fn format_summary(&self) -> String {
        format!(
            "Games: {} | Steps: {} | Record: {} | Mean: {:.2} | Recent: {:.2} | Loss: {:.4}",
            self.episodes(),
            self.total_steps,
            self.record,
            self.mean_score(),
            self.recent_mean_score(),
            self.mean_loss(),
        )
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

/// Format a duration as `MM:SS` (minutes are not wrapped at an hour)
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let stats = TrainingStats::new(100);
        assert_eq!(stats.window_size(), 100);
        assert_eq!(stats.episodes(), 0);
        assert_eq!(stats.total_steps(), 0);
        assert_eq!(stats.record(), 0);
        assert_eq!(stats.last_score(), None);
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrainingStats::new(10);
        assert_eq!(stats.mean_score(), 0.0);
        assert_eq!(stats.recent_mean_score(), 0.0);
        assert_eq!(stats.mean_loss(), 0.0);
    }

    #[test]
    fn test_running_mean_is_total_over_games() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(0, 10);
        stats.record_episode(3, 40);
        stats.record_episode(6, 70);

        assert_eq!(stats.total_steps(), 120);
        assert_eq!(stats.scores(), &[0, 3, 6]);
        assert_eq!(stats.mean_scores(), &[0.0, 1.5, 3.0]);
        assert!((stats.mean_score() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_record_tracking() {
        let mut stats = TrainingStats::new(10);

        assert!(stats.record_episode(10, 1));
        assert!(!stats.record_episode(5, 1));
        assert!(!stats.record_episode(10, 1));
        assert_eq!(stats.record(), 10);
        assert!(stats.record_episode(15, 1));
        assert_eq!(stats.record(), 15);
    }

    #[test]
    fn test_carried_over_record() {
        let mut stats = TrainingStats::new(10).with_record(20);

        assert!(!stats.record_episode(12, 1));
        assert_eq!(stats.record(), 20);
        assert!(stats.record_episode(21, 1));
    }

    #[test]
    fn test_rolling_windows() {
        let mut stats = TrainingStats::new(3);

        for score in [1, 2, 3, 4] {
            stats.record_episode(score, 10);
        }
        // Window holds 2, 3, 4 while the running mean covers all four.
        assert!((stats.recent_mean_score() - 3.0).abs() < 1e-6);
        assert!((stats.mean_score() - 2.5).abs() < 1e-6);

        stats.record_loss(0.1);
        stats.record_loss(0.2);
        stats.record_loss(0.3);
        stats.record_loss(0.4);
        assert!((stats.mean_loss() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_format_summary() {
        let mut stats = TrainingStats::new(100);
        stats.record_episode(5, 150);
        stats.record_loss(0.02);

        let summary = stats.format_summary();
        assert!(summary.contains("Games: 1"));
        assert!(summary.contains("Steps: 150"));
        assert!(summary.contains("Record: 5"));
        assert!(summary.contains("Mean: 5.00"));
        assert!(summary.contains("Loss: 0.0200"));
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_duration(Duration::from_secs(125)), "02:05");
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_secs(3661)), "61:01");
    }
}
