//! Experience replay memory
//!
//! A bounded FIFO of transitions. Once full, each push evicts the oldest entry;
//! sampling ignores insertion order and draws uniformly without replacement.

use rand::Rng;
use std::collections::VecDeque;

use super::observation::Observation;
use crate::game::RelativeAction;

/// One step of experience
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub observation: Observation,
    pub action: RelativeAction,
    pub reward: f32,
    pub next_observation: Observation,
    pub done: bool,
}

/// Fixed-capacity replay memory
///
/// # Example
///
/// ```rust
/// use q_snake::game::RelativeAction;
/// use q_snake::rl::{ReplayBuffer, Transition};
///
/// let mut memory = ReplayBuffer::new(2);
/// for reward in [1.0, 2.0, 3.0] {
///     memory.push(Transition {
///         observation: [0.0; 11],
///         action: RelativeAction::Straight,
///         reward,
///         next_observation: [0.0; 11],
///         done: false,
///     });
/// }
///
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.iter().next().unwrap().reward, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create an empty memory holding at most `capacity` transitions
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Append a transition, evicting the oldest one when at capacity
    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }

        if self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Draw `n` distinct transitions uniformly at random.
    ///
    /// When the memory holds `n` or fewer transitions the whole contents are
    /// returned in insertion order.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Transition> {
        if self.transitions.len() <= n {
            return self.transitions.iter().cloned().collect();
        }

        rand::seq::index::sample(rng, self.transitions.len(), n)
            .into_iter()
            .map(|i| self.transitions[i].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from the oldest to the newest transition
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }
}
