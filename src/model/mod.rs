//! Regressor architectures
//!
//! - Conv1d: one convolution over the lag axis followed by two dense layers
//! - MLP: a single hidden layer
//!
//! Both implement [`Regressor`], which the training loop, the inference runner
//! and the persistence helpers are written against.

pub mod conv1d;
pub mod mlp;

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

pub use conv1d::{create_conv1d, Conv1dConfig, Conv1dRegressor};
pub use mlp::{create_mlp, MlpConfig, MlpRegressor};

use crate::{Result, TsnnError};

/// Shape of a regressor, enough to rebuild it before loading weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Architecture {
    Conv1d {
        in_channels: usize,
        sequence_len: usize,
    },
    Mlp {
        input_size: usize,
        hidden_size: usize,
    },
}

impl Architecture {
    /// Number of values each input row must carry
    pub fn input_width(&self) -> usize {
        match self {
            Architecture::Conv1d {
                in_channels,
                sequence_len,
            } => in_channels * sequence_len,
            Architecture::Mlp { input_size, .. } => *input_size,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Architecture::Conv1d { .. } => "conv1d",
            Architecture::Mlp { .. } => "mlp",
        }
    }
}

/// A single-output regressor over flat lagged rows
pub trait Regressor<B: Backend>: Module<B> {
    /// Rows `[batch, input_width]` to predictions `[batch, 1]`
    fn forward_rows(&self, rows: Tensor<B, 2>) -> Tensor<B, 2>;

    fn architecture(&self) -> Architecture;

    /// Fresh, untrained instance of the given architecture
    fn from_architecture(device: &B::Device, architecture: &Architecture) -> Result<Self>
    where
        Self: Sized;

    fn input_width(&self) -> usize {
        self.architecture().input_width()
    }
}

/// Reject rows whose width does not match what the model consumes
pub fn check_input_width<B: Backend, M: Regressor<B>>(model: &M, found: usize) -> Result<()> {
    let expected = model.input_width();
    if expected != found {
        return Err(TsnnError::InputWidth { expected, found });
    }
    Ok(())
}

/// A regressor whose architecture is only known at runtime (e.g. loaded from disk)
#[derive(Debug, Clone)]
pub enum Network<B: Backend> {
    Conv1d(Conv1dRegressor<B>),
    Mlp(MlpRegressor<B>),
}

impl<B: Backend> Network<B> {
    pub fn architecture(&self) -> Architecture {
        match self {
            Network::Conv1d(m) => m.architecture(),
            Network::Mlp(m) => m.architecture(),
        }
    }

    pub fn forward_rows(&self, rows: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Network::Conv1d(m) => m.forward_rows(rows),
            Network::Mlp(m) => m.forward_rows(rows),
        }
    }

    /// Predict every row of a frame, see [`crate::predict::predict`]
    pub fn predict(&self, frame: &crate::TimeSeriesFrame) -> Result<Vec<f32>> {
        match self {
            Network::Conv1d(m) => crate::predict::predict(m, frame),
            Network::Mlp(m) => crate::predict::predict(m, frame),
        }
    }
}
