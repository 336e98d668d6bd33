//! Compute backend selection
//!
//! The `wgpu` feature switches to the accelerated backend, whose default
//! device is the best adapter available. Without it everything runs on the
//! CPU `NdArray` backend.

use burn::backend::Autodiff;
use burn::tensor::backend::Backend;

#[cfg(not(feature = "wgpu"))]
pub type InferenceBackend = burn::backend::NdArray<f32>;

#[cfg(feature = "wgpu")]
pub type InferenceBackend = burn::backend::Wgpu<f32, i32>;

/// Backend used while fitting (tracks gradients)
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Best available device for the selected backend
pub fn best_device() -> <InferenceBackend as Backend>::Device {
    Default::default()
}

/// Reseed the backend random number generator.
///
/// Parameter initialisation draws from this generator. The model factories
/// materialise their weights on construction, so seeding right before
/// `create_conv1d` or `create_mlp` makes the initial weights reproducible.
pub fn seed_everything<B: Backend>(seed: u64) {
    B::seed(seed);
}
