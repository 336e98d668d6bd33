//! Single-hidden-layer MLP regressor
//!
//! Architecture: Input(lags) → Hidden(width) → ReLU → Output(1)

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::{Architecture, Regressor};
use crate::{Result, TsnnError};

/// Configuration for the MLP regressor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    /// Number of lagged predictors per row
    pub input_size: usize,
    /// Hidden layer width
    pub hidden_size: usize,
}

impl Default for MlpConfig {
    fn default() -> Self {
        MlpConfig {
            input_size: 4,
            hidden_size: 64,
        }
    }
}

#[derive(Module, Debug)]
pub struct MlpRegressor<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
    input_size: usize,
    hidden_size: usize,
}

impl<B: Backend> MlpRegressor<B> {
    pub fn new(device: &B::Device, config: MlpConfig) -> Result<Self> {
        if config.input_size == 0 || config.hidden_size == 0 {
            return Err(TsnnError::Architecture(format!(
                "mlp needs non-zero widths, got input {} hidden {}",
                config.input_size, config.hidden_size
            )));
        }

        Ok(MlpRegressor {
            hidden: LinearConfig::new(config.input_size, config.hidden_size).init(device),
            output: LinearConfig::new(config.hidden_size, 1).init(device),
            input_size: config.input_size,
            hidden_size: config.hidden_size,
        })
    }

    /// Forward pass: [batch, input_size] → [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(x));
        self.output.forward(x)
    }

    pub fn config(&self) -> MlpConfig {
        MlpConfig {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
        }
    }
}

impl<B: Backend> Regressor<B> for MlpRegressor<B> {
    fn forward_rows(&self, rows: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(rows)
    }

    fn architecture(&self) -> Architecture {
        Architecture::Mlp {
            input_size: self.input_size,
            hidden_size: self.hidden_size,
        }
    }

    fn from_architecture(device: &B::Device, architecture: &Architecture) -> Result<Self> {
        match *architecture {
            Architecture::Mlp {
                input_size,
                hidden_size,
            } => Self::new(
                device,
                MlpConfig {
                    input_size,
                    hidden_size,
                },
            ),
            other => Err(TsnnError::Architecture(format!(
                "expected an mlp model, found {}",
                other.name()
            ))),
        }
    }
}

/// Build an untrained MLP regressor on `device`.
///
/// `Some(seed)` reseeds the backend right before the weights are drawn.
/// The weights are materialised here, so later draws never affect them.
pub fn create_mlp<B: Backend>(
    device: &B::Device,
    config: MlpConfig,
    seed: Option<u64>,
) -> Result<MlpRegressor<B>> {
    if let Some(seed) = seed {
        B::seed(seed);
    }
    let model = MlpRegressor::new(device, config)?.to_device(device);
    log::debug!(
        "Created mlp regressor: {} inputs, {} hidden",
        config.input_size,
        config.hidden_size
    );
    Ok(model)
}
