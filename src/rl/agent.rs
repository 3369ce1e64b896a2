//! Online Q-learning agent
//!
//! Couples the Q-network with epsilon-greedy action selection, the replay
//! memory and the gradient-descent update against a bootstrapped target.

use anyhow::{Result, anyhow};
use burn::{
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, Int, Tensor, TensorData, backend::AutodiffBackend},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::buffer::{ReplayBuffer, Transition};
use super::config::AgentConfig;
use super::network::{QNetwork, QNetworkConfig};
use super::observation::{OBSERVATION_SIZE, Observation};
use crate::game::RelativeAction;

/// Scores for each relative action, indexed by `RelativeAction::index`
pub type QValues = [f32; RelativeAction::COUNT];

/// Outcome of epsilon-greedy selection
#[derive(Debug, Clone, PartialEq)]
pub struct ActionChoice {
    pub action: RelativeAction,
    /// Network scores, present only when the action was chosen greedily
    pub q_values: Option<QValues>,
}

impl ActionChoice {
    pub fn explored(&self) -> bool {
        self.q_values.is_none()
    }
}

/// Q-learning agent
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation
///
/// # Example
///
/// ```rust
/// use q_snake::rl::{AgentConfig, QAgent, TrainingBackend, default_device};
///
/// let agent = QAgent::<TrainingBackend>::new(AgentConfig::default(), default_device()).unwrap();
/// assert_eq!(agent.games_played(), 0);
/// assert_eq!(agent.epsilon(), 80);
/// ```
pub struct QAgent<B: AutodiffBackend> {
    network: QNetwork<B>,
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    config: AgentConfig,
    memory: ReplayBuffer,
    rng: StdRng,
    games_played: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> QAgent<B> {
    /// Create an agent with a freshly initialised network
    pub fn new(config: AgentConfig, device: B::Device) -> Result<Self> {
        let network = Self::network_config(&config).init::<B>(&device);
        Self::from_network(network, config, device)
    }

    /// Create an agent around an existing (e.g. restored) network
    pub fn from_network(network: QNetwork<B>, config: AgentConfig, device: B::Device) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("invalid agent configuration: {}", e))?;

        Ok(Self {
            network,
            optim: AdamConfig::new().init(),
            memory: ReplayBuffer::new(config.memory_capacity),
            config,
            rng: StdRng::from_entropy(),
            games_played: 0,
            device,
        })
    }

    /// Layer sizes implied by an agent configuration
    pub fn network_config(config: &AgentConfig) -> QNetworkConfig {
        QNetworkConfig::new(OBSERVATION_SIZE, config.hidden_size, RelativeAction::COUNT)
    }

    /// Reseed exploration and replay sampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Current exploration threshold.
    ///
    /// Goes negative once `games_played` passes `exploration_games`, after which
    /// every action is greedy.
    pub fn epsilon(&self) -> i64 {
        self.config.exploration_games - self.games_played as i64
    }

    /// Epsilon-greedy action selection
    pub fn select_action(&mut self, observation: &Observation) -> Result<ActionChoice> {
        let draw = self.rng.gen_range(0..self.config.exploration_range);

        if draw < self.epsilon() {
            let action = RelativeAction::ALL[self.rng.gen_range(0..RelativeAction::COUNT)];
            return Ok(ActionChoice {
                action,
                q_values: None,
            });
        }

        let q_values = self.predict(observation)?;
        Ok(ActionChoice {
            action: RelativeAction::ALL[argmax(&q_values)],
            q_values: Some(q_values),
        })
    }

    /// Score all actions for one observation without tracking gradients
    pub fn predict(&self, observation: &Observation) -> Result<QValues> {
        let network = self.network.valid();
        let input = Tensor::<B::InnerBackend, 2>::from_data(
            TensorData::new(observation.to_vec(), [1, OBSERVATION_SIZE]),
            &self.device,
        );

        let values: Vec<f32> = network
            .forward(input)
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("failed to read Q-values: {:?}", e))?;

        values
            .try_into()
            .map_err(|v: Vec<f32>| anyhow!("expected {} Q-values, got {}", RelativeAction::COUNT, v.len()))
    }

    /// Store a transition in replay memory
    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Single-transition update, run after every step
    pub fn train_short_memory(&mut self, transition: &Transition) -> f32 {
        self.train_step(std::slice::from_ref(transition))
    }

    /// Batched update over a random sample of the replay memory.
    ///
    /// Returns `None` when the memory is empty.
    pub fn train_long_memory(&mut self) -> Option<f32> {
        if self.memory.is_empty() {
            return None;
        }

        let batch = self.memory.sample(self.config.batch_size, &mut self.rng);
        Some(self.train_step(&batch))
    }

    /// One gradient step on a batch of transitions; returns the loss.
    ///
    /// Target is `reward` for terminal transitions and
    /// `reward + gamma * max_a Q(next, a)` otherwise. The loss is the mean squared
    /// error between the taken action's score and its target.
    pub fn train_step(&mut self, batch: &[Transition]) -> f32 {
        if batch.is_empty() {
            return 0.0;
        }
        let n = batch.len();

        let observations: Vec<f32> = batch.iter().flat_map(|t| t.observation).collect();
        let next_observations: Vec<f32> = batch.iter().flat_map(|t| t.next_observation).collect();
        let actions: Vec<i32> = batch.iter().map(|t| t.action.index() as i32).collect();
        let rewards: Vec<f32> = batch.iter().map(|t| t.reward).collect();
        let not_done: Vec<f32> = batch
            .iter()
            .map(|t| if t.done { 0.0 } else { 1.0 })
            .collect();

        let observations: Tensor<B, 2> = Tensor::from_data(
            TensorData::new(observations, [n, OBSERVATION_SIZE]),
            &self.device,
        );
        let next_observations: Tensor<B, 2> = Tensor::from_data(
            TensorData::new(next_observations, [n, OBSERVATION_SIZE]),
            &self.device,
        );
        let actions = Tensor::<B, 1, Int>::from_ints(actions.as_slice(), &self.device);
        let rewards = Tensor::<B, 1>::from_floats(rewards.as_slice(), &self.device);
        let not_done = Tensor::<B, 1>::from_floats(not_done.as_slice(), &self.device);

        // No gradient flows through the bootstrapped estimate.
        let next_max = self
            .network
            .forward(next_observations)
            .detach()
            .max_dim(1)
            .squeeze::<1>(1);
        let target = rewards + next_max * not_done * self.config.gamma;

        let predicted = self
            .network
            .forward(observations)
            .gather(1, actions.unsqueeze_dim(1))
            .squeeze::<1>(1);

        let diff = predicted - target;
        let loss = (diff.clone() * diff).mean();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optim
            .step(self.config.learning_rate, self.network.clone(), grads);

        loss.into_scalar().elem::<f32>()
    }

    pub fn games_played(&self) -> usize {
        self.games_played
    }

    /// Restore the game counter, e.g. from checkpoint metadata
    pub fn set_games_played(&mut self, games: usize) {
        self.games_played = games;
    }

    pub fn increment_games(&mut self) {
        self.games_played += 1;
    }

    pub fn network(&self) -> &QNetwork<B> {
        &self.network
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }
}

/// Index of the largest score; the first one wins ties
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{TrainingBackend, default_device};

    fn create_test_agent() -> QAgent<TrainingBackend> {
        QAgent::new(AgentConfig::default(), default_device())
            .unwrap()
            .with_seed(17)
    }

    fn transition(observation: Observation, action: RelativeAction, reward: f32, done: bool) -> Transition {
        Transition {
            observation,
            action,
            reward,
            next_observation: observation,
            done,
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = create_test_agent();
        assert_eq!(agent.games_played(), 0);
        assert_eq!(agent.epsilon(), 80);
        assert!(agent.memory().is_empty());
        assert_eq!(agent.memory().capacity(), 100_000);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AgentConfig {
            gamma: 2.0,
            ..Default::default()
        };
        assert!(QAgent::<TrainingBackend>::new(config, default_device()).is_err());
    }

    #[test]
    fn test_epsilon_schedule() {
        let mut agent = create_test_agent();
        agent.set_games_played(30);
        assert_eq!(agent.epsilon(), 50);
        agent.set_games_played(80);
        assert_eq!(agent.epsilon(), 0);
        agent.increment_games();
        assert_eq!(agent.epsilon(), -1);
    }

    #[test]
    fn test_greedy_after_exploration_budget() {
        let mut agent = create_test_agent();
        agent.set_games_played(81);
        let obs = [0.0; 11];
        let expected = agent.predict(&obs).unwrap();

        for _ in 0..50 {
            let choice = agent.select_action(&obs).unwrap();
            assert!(!choice.explored());
            assert_eq!(choice.q_values, Some(expected));
            assert_eq!(choice.action, RelativeAction::ALL[argmax(&expected)]);
        }
    }

    #[test]
    fn test_exploration_happens_early() {
        let mut agent = create_test_agent();
        let obs = [0.0; 11];

        let explored = (0..400)
            .filter(|_| agent.select_action(&obs).unwrap().explored())
            .count();

        // epsilon 80 of 200 draws: roughly 40% random.
        assert!(explored > 80 && explored < 240, "explored {} of 400", explored);
    }

    #[test]
    fn test_predict_is_finite() {
        let agent = create_test_agent();
        let q = agent.predict(&[1.0; 11]).unwrap();
        assert!(q.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.1, 0.6, 0.2]), 1);
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[-1.0, -2.0, -0.5]), 2);
    }

    #[test]
    fn test_terminal_updates_move_toward_reward() {
        let mut agent = create_test_agent();
        let mut obs = [0.0; 11];
        obs[0] = 1.0;
        obs[4] = 1.0;
        let t = transition(obs, RelativeAction::TurnLeft, -10.0, true);

        let first_loss = agent.train_short_memory(&t);
        for _ in 0..500 {
            agent.train_short_memory(&t);
        }
        let last_loss = agent.train_short_memory(&t);

        assert!(first_loss.is_finite());
        assert!(last_loss < first_loss, "{} !< {}", last_loss, first_loss);
        let q = agent.predict(&obs).unwrap();
        assert!(q[RelativeAction::TurnLeft.index()] < -5.0, "q = {:?}", q);
    }

    #[test]
    fn test_long_memory_uses_replay() {
        let mut agent = create_test_agent();
        assert_eq!(agent.train_long_memory(), None);

        for i in 0..20 {
            let mut obs = [0.0; 11];
            obs[i % 11] = 1.0;
            let action = RelativeAction::ALL[i % 3];
            agent.remember(transition(obs, action, if i % 2 == 0 { 10.0 } else { 0.0 }, i % 5 == 0));
        }

        let loss = agent.train_long_memory().unwrap();
        assert!(loss.is_finite());
        assert_eq!(agent.memory().len(), 20);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut agent = create_test_agent();
        let before = agent.predict(&[1.0; 11]).unwrap();
        assert_eq!(agent.train_step(&[]), 0.0);
        assert_eq!(agent.predict(&[1.0; 11]).unwrap(), before);
    }

    #[test]
    fn test_non_terminal_target_bootstraps_from_next_state() {
        let mut agent = create_test_agent();
        let mut obs = [0.0; 11];
        obs[1] = 1.0;
        obs[7] = 1.0;
        let mut next_obs = [0.0; 11];
        next_obs[2] = 1.0;
        next_obs[9] = 1.0;
        let t = Transition {
            observation: obs,
            action: RelativeAction::TurnRight,
            reward: 0.0,
            next_observation: next_obs,
            done: false,
        };

        let q = agent.predict(&obs).unwrap();
        let q_next = agent.predict(&next_obs).unwrap();
        let next_max = q_next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let target = t.reward + agent.config().gamma * next_max;
        let expected = (q[RelativeAction::TurnRight.index()] - target).powi(2);

        let loss = agent.train_step(std::slice::from_ref(&t));
        assert!(
            (loss - expected).abs() <= 1e-5 + expected * 1e-4,
            "loss {} expected {}",
            loss,
            expected
        );
    }

    #[test]
    fn test_terminal_target_is_reward_only() {
        let mut agent = create_test_agent();
        let mut obs = [0.0; 11];
        obs[3] = 1.0;
        obs[10] = 1.0;
        let mut next_obs = [0.0; 11];
        next_obs[0] = 1.0;
        let t = Transition {
            observation: obs,
            action: RelativeAction::Straight,
            reward: -10.0,
            next_observation: next_obs,
            done: true,
        };

        let q = agent.predict(&obs).unwrap();
        let expected = (q[RelativeAction::Straight.index()] - t.reward).powi(2);

        let loss = agent.train_step(std::slice::from_ref(&t));
        assert!(
            (loss - expected).abs() <= 1e-4 + expected * 1e-4,
            "loss {} expected {}",
            loss,
            expected
        );
    }
}
