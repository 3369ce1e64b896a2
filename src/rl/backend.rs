//! Backend type aliases and device management
//!
//! - **TrainingBackend**: Autodiff-enabled NdArray backend for the Q-learning updates (CPU)
//! - **InferenceBackend**: Plain NdArray backend used for gradient-free prediction (CPU)
//!
//! The 11 → 256 → 3 network is small enough that the CPU backend keeps up with
//! one update per game step.
//!
//! # Example
//!
//! ```rust
//! use q_snake::rl::{QNetworkConfig, TrainingBackend, default_device};
//!
//! let device = default_device();
//! let network = QNetworkConfig::default().init::<TrainingBackend>(&device);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend type for training (with autodiff)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend type for prediction (without autodiff)
///
/// This is `<TrainingBackend as AutodiffBackend>::InnerBackend`, the backend a
/// network lands on after `.valid()`.
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::module::AutodiffModule;
    use burn::tensor::Tensor;

    use crate::rl::QNetworkConfig;

    #[test]
    fn test_default_device() {
        let device1 = default_device();
        let device2 = default_device();
        assert_eq!(device1, device2);
    }

    #[test]
    fn test_valid_network_runs_on_inference_backend() {
        let device = default_device();
        let network = QNetworkConfig::default().init::<TrainingBackend>(&device);

        let inference = network.valid();
        let output = inference.forward(Tensor::<InferenceBackend, 2>::zeros([2, 11], &device));

        assert_eq!(output.dims(), [2, 3]);
    }
}
