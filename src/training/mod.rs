//! Model training
//!
//! One training loop for every regressor, with the early-stopping policy kept
//! separate so it can be used without tensors.

pub mod early_stopping;
pub mod trainer;

pub use early_stopping::{EarlyStopping, StopReason};
pub use trainer::{
    fit, train_conv1d, train_frame, train_mlp, OptimizerKind, TrainingConfig, TrainingRun,
};
