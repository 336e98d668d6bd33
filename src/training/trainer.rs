//! Shared training loop for every regressor

use burn::data::dataloader::DataLoaderBuilder;
use burn::module::{AutodiffModule, Module};
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use serde::{Deserialize, Serialize};

use super::early_stopping::{EarlyStopping, StopReason, MIN_IMPROVEMENT, PATIENCE};
use crate::backend::seed_everything;
use crate::data::{SeriesBatch, SeriesBatcher, SeriesDataset, TimeSeriesFrame, TARGET_COLUMN};
use crate::model::{check_input_width, Conv1dRegressor, MlpRegressor, Regressor};
use crate::{Result, TsnnError};

/// Epoch budget used by the convenience entry points
pub const DEFAULT_EPOCHS: usize = 10_000;

/// Adam epsilon, overriding burn's 1e-5 default
pub const ADAM_EPSILON: f32 = 1e-8;

fn adam_config() -> AdamConfig {
    AdamConfig::new().with_epsilon(ADAM_EPSILON)
}

/// Optimizer family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Sgd,
    Adam,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub optimizer: OptimizerKind,
    /// Minimum absolute loss drop that counts as an improvement
    pub min_improvement: f64,
    /// Epochs without improvement tolerated before stopping
    pub patience: usize,
    /// Seed applied before the loop when reproducibility is requested
    pub seed: u64,
    /// Report every epoch at info level instead of debug
    pub debug: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: DEFAULT_EPOCHS,
            learning_rate: 1e-5,
            batch_size: 8,
            optimizer: OptimizerKind::Sgd,
            min_improvement: MIN_IMPROVEMENT,
            patience: PATIENCE,
            seed: 0,
            debug: false,
        }
    }
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingRun<M> {
    pub model: M,
    /// Average batch loss of every epoch that ran, in order
    pub losses: Vec<f64>,
    pub stop_reason: StopReason,
    pub best_loss: f64,
    pub best_epoch: usize,
}

impl<M> TrainingRun<M> {
    pub fn epochs_run(&self) -> usize {
        self.losses.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

/// Fit `model` with MSE loss and early stopping.
///
/// `batches` is called once per epoch and must yield the same batches in the
/// same order every time.
pub fn fit<B, M, F, I>(model: M, batches: F, config: &TrainingConfig) -> TrainingRun<M>
where
    B: AutodiffBackend,
    M: Regressor<B> + AutodiffModule<B>,
    F: FnMut() -> I,
    I: IntoIterator<Item = SeriesBatch<B>>,
{
    match config.optimizer {
        OptimizerKind::Sgd => run_epochs(model, SgdConfig::new().init::<B, M>(), batches, config),
        OptimizerKind::Adam => run_epochs(model, adam_config().init::<B, M>(), batches, config),
    }
}

fn run_epochs<B, M, O, F, I>(
    mut model: M,
    mut optimizer: O,
    mut batches: F,
    config: &TrainingConfig,
) -> TrainingRun<M>
where
    B: AutodiffBackend,
    M: Regressor<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
    F: FnMut() -> I,
    I: IntoIterator<Item = SeriesBatch<B>>,
{
    let criterion = MseLoss::new();
    let mut stopping = EarlyStopping::new(config.min_improvement, config.patience);
    let mut batch_losses: Vec<f64> = Vec::new();
    let mut losses: Vec<f64> = Vec::new();
    let mut stop_reason = StopReason::EpochBudget;
    let epoch_len = config.epochs.to_string().len();

    log::info!(
        "Starting {} training for up to {} epochs ({:?}, lr={})",
        model.architecture().name(),
        config.epochs,
        config.optimizer,
        config.learning_rate
    );

    for epoch in 0..config.epochs {
        for batch in batches() {
            let output = model.forward_rows(batch.features);
            let loss = criterion.forward(output, batch.targets, Reduction::Mean);
            let loss_val: f64 = loss.clone().into_scalar().elem();

            // Gradients are rebuilt from this loss alone, nothing accumulates across steps
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            batch_losses.push(loss_val);
        }

        if batch_losses.is_empty() {
            log::warn!("No batches to train on, stopping");
            break;
        }

        let train_loss = batch_losses.iter().sum::<f64>() / batch_losses.len() as f64;
        losses.push(train_loss);

        let decision = stopping.observe(epoch, train_loss);

        let msg = format!(
            "[{:>width$}/{:>width$}] train_loss: {:.5}",
            epoch,
            config.epochs,
            train_loss,
            width = epoch_len
        );
        if config.debug {
            log::info!("{}", msg);
        } else {
            log::debug!("{}", msg);
        }

        if let Some(reason) = decision {
            stop_reason = reason;
            break;
        }

        batch_losses.clear();
    }

    log::info!(
        "Training finished after {} epochs: {} (best loss {:.5} at epoch {})",
        losses.len(),
        stop_reason,
        stopping.best_loss(),
        stopping.best_epoch()
    );

    TrainingRun {
        model,
        losses,
        stop_reason,
        best_loss: stopping.best_loss(),
        best_epoch: stopping.best_epoch(),
    }
}

/// Train on a frame whose target column is `t0`, batches in row order.
///
/// With `reproduce`, the backend is reseeded with `config.seed` right before
/// the loop starts.
pub fn train_frame<B, M>(
    model: M,
    frame: &TimeSeriesFrame,
    config: &TrainingConfig,
    reproduce: bool,
) -> Result<TrainingRun<M>>
where
    B: AutodiffBackend,
    M: Regressor<B> + AutodiffModule<B>,
{
    if config.batch_size == 0 {
        return Err(TsnnError::Config("batch_size must be positive".to_string()));
    }

    let dataset = SeriesDataset::from_frame(frame, TARGET_COLUMN)?;
    check_input_width(&model, dataset.feature_count())?;

    let device = model.devices().into_iter().next().unwrap_or_default();
    let loader = DataLoaderBuilder::new(SeriesBatcher::<B>::new(device))
        .batch_size(config.batch_size)
        .build(dataset);

    if reproduce {
        seed_everything::<B>(config.seed);
    }

    Ok(fit(model, || loader.iter(), config))
}

fn entry_config(n_epochs: usize, deep_debug: bool) -> TrainingConfig {
    TrainingConfig {
        epochs: n_epochs,
        optimizer: OptimizerKind::Adam,
        debug: deep_debug,
        ..TrainingConfig::default()
    }
}

/// Train a convolutional regressor with Adam, lr 1e-5, batches of 8
pub fn train_conv1d<B: AutodiffBackend>(
    model: Conv1dRegressor<B>,
    frame: &TimeSeriesFrame,
    n_epochs: usize,
    deep_debug: bool,
    reproduce: bool,
) -> Result<TrainingRun<Conv1dRegressor<B>>> {
    train_frame(model, frame, &entry_config(n_epochs, deep_debug), reproduce)
}

/// Train an MLP regressor with Adam, lr 1e-5, batches of 8
pub fn train_mlp<B: AutodiffBackend>(
    model: MlpRegressor<B>,
    frame: &TimeSeriesFrame,
    n_epochs: usize,
    deep_debug: bool,
    reproduce: bool,
) -> Result<TrainingRun<MlpRegressor<B>>> {
    train_frame(model, frame, &entry_config(n_epochs, deep_debug), reproduce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{create_conv1d, create_mlp, Conv1dConfig, MlpConfig};
    use crate::predict::predict;
    use crate::test_util::rng_guard;
    use burn::backend::{Autodiff, NdArray};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type TestBackend = Autodiff<NdArray<f32>>;

    fn random_frame(rows: usize, features: usize, target: impl Fn(usize) -> f64) -> TimeSeriesFrame {
        let mut rng = StdRng::seed_from_u64(42);
        let mut columns: Vec<String> = (1..=features).rev().map(|i| format!("t{}", i)).collect();
        columns.push(TARGET_COLUMN.to_string());

        let data = (0..rows)
            .map(|r| {
                let mut row: Vec<f64> = (0..features).map(|_| rng.gen_range(-1.0..1.0)).collect();
                row.push(target(r));
                row
            })
            .collect();
        TimeSeriesFrame::new(columns, data).unwrap()
    }

    fn mlp(input_size: usize, seed: u64) -> MlpRegressor<TestBackend> {
        let config = MlpConfig {
            input_size,
            hidden_size: 8,
        };
        create_mlp(&Default::default(), config, Some(seed)).unwrap()
    }

    fn frozen(epochs: usize) -> TrainingConfig {
        TrainingConfig {
            epochs,
            learning_rate: 0.0,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_stops_at_patience_without_improvement() {
        let _rng = rng_guard();
        let frame = random_frame(20, 3, |r| r as f64);

        let run = train_frame(mlp(3, 1), &frame, &frozen(1000), false).unwrap();

        // epoch 0 is the only improvement, so the stop lands on 0 + 101
        assert_eq!(run.stop_reason, StopReason::NoImprovement);
        assert_eq!(run.best_epoch, 0);
        assert_eq!(run.epochs_run(), 102);
        assert!(run.losses.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_adam_uses_small_epsilon() {
        let value = serde_json::to_value(adam_config()).unwrap();
        let epsilon = value["epsilon"].as_f64().unwrap();
        assert!((epsilon - 1e-8).abs() < 1e-12, "epsilon {}", epsilon);
    }

    #[test]
    fn test_reproduce_does_not_reinitialise_unseeded_models() {
        let _rng = rng_guard();
        let device = Default::default();
        let config = MlpConfig {
            input_size: 3,
            hidden_size: 8,
        };
        let a = create_mlp::<TestBackend>(&device, config, None).unwrap();
        let b = create_mlp::<TestBackend>(&device, config, None).unwrap();
        let frame = random_frame(8, 3, |r| r as f64);

        // Both runs reseed to the same value; weights drawn at creation must survive it
        let a = train_frame(a, &frame, &frozen(1), true).unwrap().model.valid();
        let b = train_frame(b, &frame, &frozen(1), true).unwrap().model.valid();

        assert_ne!(predict(&a, &frame).unwrap(), predict(&b, &frame).unwrap());
    }

    #[test]
    fn test_epoch_budget_is_a_normal_end() {
        let _rng = rng_guard();
        let frame = random_frame(20, 3, |r| r as f64);

        let run = train_frame(mlp(3, 2), &frame, &frozen(5), false).unwrap();

        assert_eq!(run.stop_reason, StopReason::EpochBudget);
        assert_eq!(run.epochs_run(), 5);
    }

    #[test]
    fn test_zero_loss_stops_with_zero_last() {
        let _rng = rng_guard();
        let model = mlp(3, 3);

        // Targets are the model's own predictions, so the first epoch fits exactly
        let inputs = random_frame(20, 3, |_| 0.0);
        let outputs = predict(&model.valid(), &inputs).unwrap();
        let frame = random_frame(20, 3, |r| outputs[r] as f64);

        let config = TrainingConfig {
            epochs: 50,
            ..TrainingConfig::default()
        };
        let run = train_frame(model, &frame, &config, false).unwrap();

        assert_eq!(run.stop_reason, StopReason::PerfectFit);
        assert_eq!(run.losses, vec![0.0]);
        assert_eq!(run.best_loss, 0.0);
    }

    #[test]
    fn test_constant_target_converges_before_budget() {
        let _rng = rng_guard();
        let frame = random_frame(20, 3, |_| 1.0);
        let config = TrainingConfig {
            epochs: 3000,
            learning_rate: 0.01,
            optimizer: OptimizerKind::Adam,
            ..TrainingConfig::default()
        };

        let run = train_frame(mlp(3, 4), &frame, &config, true).unwrap();

        assert_ne!(run.stop_reason, StopReason::EpochBudget);
        assert!(run.epochs_run() < 3000);
        let last = run.final_loss().unwrap();
        assert!(last < 1e-2, "final loss {}", last);
        assert!(last < run.losses[0]);
    }

    #[test]
    fn test_reproducible_runs_match() {
        let _rng = rng_guard();
        let frame = random_frame(20, 4, |r| (r as f64 * 0.3).sin());
        let model = create_conv1d::<TestBackend>(&Default::default(), Conv1dConfig::default(), Some(5))
            .unwrap();
        let config = TrainingConfig {
            epochs: 15,
            learning_rate: 1e-3,
            optimizer: OptimizerKind::Adam,
            ..TrainingConfig::default()
        };

        let first = train_frame(model.clone(), &frame, &config, true).unwrap();
        let second = train_frame(model, &frame, &config, true).unwrap();

        assert_eq!(first.losses, second.losses);
        assert_eq!(first.epochs_run(), 15);
    }

    #[test]
    fn test_train_entry_points() {
        let _rng = rng_guard();
        let frame = random_frame(12, 4, |r| r as f64 / 12.0);
        let device = Default::default();

        let conv = create_conv1d::<TestBackend>(&device, Conv1dConfig::default(), None).unwrap();
        let run = train_conv1d(conv, &frame, 3, true, true).unwrap();
        assert_eq!(run.epochs_run(), 3);

        let mlp = create_mlp::<TestBackend>(&device, MlpConfig::default(), None).unwrap();
        let run = train_mlp(mlp, &frame, 3, false, true).unwrap();
        assert_eq!(run.epochs_run(), 3);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let _rng = rng_guard();
        let frame = random_frame(10, 2, |_| 0.0);

        let err = train_frame(mlp(3, 6), &frame, &frozen(5), false).unwrap_err();
        assert!(matches!(err, TsnnError::InputWidth { expected: 3, found: 2 }));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let _rng = rng_guard();
        let frame = random_frame(10, 3, |_| 0.0);
        let config = TrainingConfig {
            batch_size: 0,
            ..TrainingConfig::default()
        };

        let err = train_frame(mlp(3, 7), &frame, &config, false).unwrap_err();
        assert!(matches!(err, TsnnError::Config(_)));
    }

    #[test]
    fn test_empty_frame_trains_nothing() {
        let _rng = rng_guard();
        let frame = random_frame(0, 3, |_| 0.0);

        let run = train_frame(mlp(3, 8), &frame, &frozen(10), false).unwrap();
        assert_eq!(run.stop_reason, StopReason::EpochBudget);
        assert!(run.losses.is_empty());
    }
}
