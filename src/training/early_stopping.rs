//! Early-stopping policy on the epoch training loss

use serde::{Deserialize, Serialize};
use std::fmt;

/// Loss must drop by more than this to count as an improvement
pub const MIN_IMPROVEMENT: f64 = 0.001;
/// Epochs without improvement tolerated before stopping
pub const PATIENCE: usize = 100;

/// Why a training run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// An epoch reached a loss of exactly zero
    PerfectFit,
    /// No improvement above the threshold for more than `patience` epochs
    NoImprovement,
    /// The epoch budget ran out
    EpochBudget,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::PerfectFit => write!(f, "perfect fit"),
            StopReason::NoImprovement => write!(f, "no improvement"),
            StopReason::EpochBudget => write!(f, "epoch budget reached"),
        }
    }
}

/// Tracks the best epoch loss and decides when to stop.
///
/// The threshold is absolute, not relative to the loss.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    min_improvement: f64,
    patience: usize,
    last_error: f64,
    last_epoch: usize,
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::new(MIN_IMPROVEMENT, PATIENCE)
    }
}

impl EarlyStopping {
    pub fn new(min_improvement: f64, patience: usize) -> Self {
        EarlyStopping {
            min_improvement,
            patience,
            last_error: f64::MAX,
            last_epoch: 0,
        }
    }

    /// Feed the loss of `epoch`; returns `Some` when training should stop
    pub fn observe(&mut self, epoch: usize, loss: f64) -> Option<StopReason> {
        if loss == 0.0 {
            self.last_error = loss;
            self.last_epoch = epoch;
            return Some(StopReason::PerfectFit);
        }

        if self.last_error - loss > self.min_improvement {
            self.last_error = loss;
            self.last_epoch = epoch;
            None
        } else if epoch.saturating_sub(self.last_epoch) > self.patience {
            Some(StopReason::NoImprovement)
        } else {
            None
        }
    }

    /// Best loss seen so far (`f64::MAX` before the first improvement)
    pub fn best_loss(&self) -> f64 {
        self.last_error
    }

    /// Epoch at which `best_loss` was reached
    pub fn best_epoch(&self) -> usize {
        self.last_epoch
    }
}
