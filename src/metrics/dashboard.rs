//! Per-step agent diagnostics for the live dashboard
//!
//! Append-only: updated once per training step and read by the renderer. Score
//! and running-mean histories live in [`TrainingStats`](super::TrainingStats).

use std::collections::VecDeque;

use crate::game::{Position, RelativeAction};
use crate::rl::QValues;

/// Number of recent Q-value vectors and rewards kept for plotting
pub const DASHBOARD_WINDOW: usize = 50;

/// Action counts, recent Q-values and rewards, and a head-visit heatmap
#[derive(Debug, Clone)]
pub struct Dashboard {
    action_counts: [u64; RelativeAction::COUNT],
    q_values: VecDeque<QValues>,
    rewards: VecDeque<f32>,
    /// Row-major visit counts, `rows * cols`
    heatmap: Vec<u32>,
    cols: usize,
    rows: usize,
}

impl Dashboard {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            action_counts: [0; RelativeAction::COUNT],
            q_values: VecDeque::with_capacity(DASHBOARD_WINDOW),
            rewards: VecDeque::with_capacity(DASHBOARD_WINDOW),
            heatmap: vec![0; cols * rows],
            cols,
            rows,
        }
    }

    /// Record one agent step.
    ///
    /// `q_values` is present only for greedy picks. `head` is in pixels; heads
    /// outside the board (a wall hit) are counted against the nearest edge cell.
    pub fn record_step(
        &mut self,
        action: RelativeAction,
        q_values: Option<QValues>,
        reward: f32,
        head: Position,
        block_size: i32,
    ) {
        self.action_counts[action.index()] += 1;

        if let Some(q) = q_values {
            push_window(&mut self.q_values, q);
        }
        push_window(&mut self.rewards, reward);

        self.record_visit(head, block_size);
    }

    /// Count a head position in the heatmap without recording an action
    pub fn record_visit(&mut self, head: Position, block_size: i32) {
        if let Some(idx) = self.cell_index(head, block_size) {
            self.heatmap[idx] += 1;
        }
    }

    fn cell_index(&self, head: Position, block_size: i32) -> Option<usize> {
        if self.cols == 0 || self.rows == 0 || block_size <= 0 {
            return None;
        }
        let (col, row) = head.cell(block_size);
        let col = col.clamp(0, self.cols as i32 - 1) as usize;
        let row = row.clamp(0, self.rows as i32 - 1) as usize;
        Some(row * self.cols + col)
    }

    /// Times each action was taken, indexed by `RelativeAction::index`
    pub fn action_counts(&self) -> &[u64; RelativeAction::COUNT] {
        &self.action_counts
    }

    pub fn total_actions(&self) -> u64 {
        self.action_counts.iter().sum()
    }

    /// Up to the last 50 greedy Q-value vectors, oldest first
    pub fn q_history(&self) -> impl Iterator<Item = &QValues> {
        self.q_values.iter()
    }

    /// Up to the last 50 step rewards, oldest first
    pub fn reward_history(&self) -> impl Iterator<Item = f32> + '_ {
        self.rewards.iter().copied()
    }

    /// Visit count of a cell
    pub fn heat(&self, col: usize, row: usize) -> u32 {
        if col >= self.cols || row >= self.rows {
            return 0;
        }
        self.heatmap[row * self.cols + col]
    }

    pub fn max_heat(&self) -> u32 {
        self.heatmap.iter().copied().max().unwrap_or(0)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

fn push_window<T>(window: &mut VecDeque<T>, value: T) {
    if window.len() >= DASHBOARD_WINDOW {
        window.pop_front();
    }
    window.push_back(value);
}
