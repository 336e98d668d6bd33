//! Prediction interface
//!
//! Batched inference over held-out frames.

pub mod inference;

pub use inference::{predict, predict_conv1d, predict_frame, predict_mlp, PREDICT_BATCH_SIZE};
