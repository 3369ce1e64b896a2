//! Q-network for the Snake agent
//!
//! A single hidden layer maps the 11 hand-crafted features to one score per
//! relative action.
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 11]
//!   ↓ Linear(11 → 256) + ReLU
//!   ↓ Linear(256 → 3)
//! Output: [batch, 3]  (Straight, Right, Left)
//! ```
//!
//! # Example
//!
//! ```rust
//! use q_snake::rl::QNetworkConfig;
//! use burn::backend::ndarray::{NdArray, NdArrayDevice};
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::default().init::<Backend>(&device);
//!
//! let q_values = network.forward(Tensor::zeros([4, 11], &device));
//! assert_eq!(q_values.dims(), [4, 3]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};
use serde::{Deserialize, Serialize};

use super::observation::OBSERVATION_SIZE;
use crate::game::RelativeAction;

/// Layer sizes of the Q-network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    /// Number of input features (default: 11)
    pub input_size: usize,

    /// Width of the hidden layer (default: 256)
    pub hidden_size: usize,

    /// Number of action scores produced (default: 3)
    pub output_size: usize,
}

impl QNetworkConfig {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            output_size,
        }
    }

    /// Initialize the network with random weights on `device`
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            linear1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            linear2: LinearConfig::new(self.hidden_size, self.output_size).init(device),
        }
    }
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self::new(OBSERVATION_SIZE, 256, RelativeAction::COUNT)
    }
}

/// Feed-forward action-value network
///
/// Generic over the Burn backend so the same definition serves training
/// (`Autodiff<NdArray>`) and gradient-free prediction (`NdArray`).
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    linear1: Linear<B>,
    linear2: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Score every action for a batch of observations
    ///
    /// * `observations` - `[batch, input_size]`
    ///
    /// Returns `[batch, output_size]`.
    pub fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear1.forward(observations);
        let x = relu(x);
        self.linear2.forward(x)
    }
}
