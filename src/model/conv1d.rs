//! 1-D convolutional regressor
//!
//! Architecture: Input[batch, channels, seq] → Conv1d(64, kernel 2) → ReLU
//!             → Flatten → Linear(50) → ReLU → Linear(1)

use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig as ConvLayerConfig};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::{Architecture, Regressor};
use crate::{Result, TsnnError};

/// Output channels of the convolution
pub const CONV_CHANNELS: usize = 64;
/// Convolution kernel width
pub const KERNEL_SIZE: usize = 2;
/// Width of the dense layer between the convolution and the output
pub const DENSE_WIDTH: usize = 50;

/// Configuration for the convolutional regressor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conv1dConfig {
    /// Input channels (1 for a single lagged series)
    pub in_channels: usize,
    /// Number of lags along the convolution axis
    pub sequence_len: usize,
}

impl Default for Conv1dConfig {
    fn default() -> Self {
        Conv1dConfig {
            in_channels: 1,
            sequence_len: 4,
        }
    }
}

impl Conv1dConfig {
    /// Flattened width after the convolution: (sequence_len - 1) * 64
    pub fn flat_width(&self) -> usize {
        self.sequence_len.saturating_sub(KERNEL_SIZE - 1) * CONV_CHANNELS
    }

    fn validate(&self) -> Result<()> {
        if self.in_channels == 0 {
            return Err(TsnnError::Architecture(
                "conv1d needs at least one input channel".to_string(),
            ));
        }
        if self.sequence_len < KERNEL_SIZE {
            return Err(TsnnError::Architecture(format!(
                "conv1d needs sequence_len >= {}, got {}",
                KERNEL_SIZE, self.sequence_len
            )));
        }
        Ok(())
    }
}

#[derive(Module, Debug)]
pub struct Conv1dRegressor<B: Backend> {
    conv: Conv1d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    in_channels: usize,
    sequence_len: usize,
}

impl<B: Backend> Conv1dRegressor<B> {
    pub fn new(device: &B::Device, config: Conv1dConfig) -> Result<Self> {
        config.validate()?;

        Ok(Conv1dRegressor {
            conv: ConvLayerConfig::new(config.in_channels, CONV_CHANNELS, KERNEL_SIZE).init(device),
            fc1: LinearConfig::new(config.flat_width(), DENSE_WIDTH).init(device),
            fc2: LinearConfig::new(DENSE_WIDTH, 1).init(device),
            in_channels: config.in_channels,
            sequence_len: config.sequence_len,
        })
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Lag windows [batch, in_channels, sequence_len]
    ///
    /// # Returns
    /// Predictions [batch, 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let x = relu(self.conv.forward(x));
        let x: Tensor<B, 2> = x.flatten(1, 2);
        let x = relu(self.fc1.forward(x));
        self.fc2.forward(x)
    }

    pub fn config(&self) -> Conv1dConfig {
        Conv1dConfig {
            in_channels: self.in_channels,
            sequence_len: self.sequence_len,
        }
    }
}

impl<B: Backend> Regressor<B> for Conv1dRegressor<B> {
    /// Rows are read channel-major; with one channel the lags become the sequence axis
    fn forward_rows(&self, rows: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, _] = rows.dims();
        self.forward(rows.reshape([batch, self.in_channels, self.sequence_len]))
    }

    fn architecture(&self) -> Architecture {
        Architecture::Conv1d {
            in_channels: self.in_channels,
            sequence_len: self.sequence_len,
        }
    }

    fn from_architecture(device: &B::Device, architecture: &Architecture) -> Result<Self> {
        match *architecture {
            Architecture::Conv1d {
                in_channels,
                sequence_len,
            } => Self::new(
                device,
                Conv1dConfig {
                    in_channels,
                    sequence_len,
                },
            ),
            other => Err(TsnnError::Architecture(format!(
                "expected a conv1d model, found {}",
                other.name()
            ))),
        }
    }
}

/// Build an untrained convolutional regressor on `device`.
///
/// `Some(seed)` reseeds the backend right before the weights are drawn.
/// The weights are materialised here, so later draws never affect them.
pub fn create_conv1d<B: Backend>(
    device: &B::Device,
    config: Conv1dConfig,
    seed: Option<u64>,
) -> Result<Conv1dRegressor<B>> {
    if let Some(seed) = seed {
        B::seed(seed);
    }
    // burn initialises parameters lazily; moving them forces the draw now
    let model = Conv1dRegressor::new(device, config)?.to_device(device);
    log::debug!(
        "Created conv1d regressor: {} channel(s) x {} lags, flat width {}",
        config.in_channels,
        config.sequence_len,
        config.flat_width()
    );
    Ok(model)
}
