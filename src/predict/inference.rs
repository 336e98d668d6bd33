//! Batched inference over lagged rows

use burn::data::dataloader::DataLoaderBuilder;
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::data::{SeriesBatcher, SeriesDataset, TimeSeriesFrame, TARGET_COLUMN};
use crate::model::{check_input_width, Conv1dRegressor, MlpRegressor, Regressor};
use crate::{Result, TsnnError};

/// Rows pushed through the model at once
pub const PREDICT_BATCH_SIZE: usize = 8;

/// Predict one value per row of `frame`, in row order.
///
/// The frame must carry the training schema; `t0` is dropped and never
/// compared. Gradient tracking is switched off on a copy of the model, so an
/// autodiff model builds no graph here. Prefer `run.model.valid()` or a loaded
/// model, which avoid the autodiff backend entirely.
pub fn predict<B: Backend, M: Regressor<B>>(model: &M, frame: &TimeSeriesFrame) -> Result<Vec<f32>> {
    let dataset = SeriesDataset::from_frame(frame, TARGET_COLUMN)?;
    check_input_width(model, dataset.feature_count())?;
    if dataset.is_empty() {
        return Ok(Vec::new());
    }

    let model = model.clone().no_grad();
    let device = model.devices().into_iter().next().unwrap_or_default();
    let loader = DataLoaderBuilder::new(SeriesBatcher::<B>::new(device))
        .batch_size(PREDICT_BATCH_SIZE)
        .build(dataset);

    let outputs: Vec<Tensor<B, 2>> = loader
        .iter()
        .map(|batch| model.forward_rows(batch.features))
        .collect();

    let predictions: Tensor<B, 1> = Tensor::cat(outputs, 0).flatten(0, 1);
    predictions
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| TsnnError::Tensor(format!("{:?}", e)))
}

/// Copy of `frame` with the predictions appended as column `name`
pub fn predict_frame<B: Backend, M: Regressor<B>>(
    model: &M,
    frame: &TimeSeriesFrame,
    name: &str,
) -> Result<TimeSeriesFrame> {
    let predictions = predict(model, frame)?;
    frame.with_column(name, &predictions)
}

pub fn predict_conv1d<B: Backend>(
    model: &Conv1dRegressor<B>,
    frame: &TimeSeriesFrame,
) -> Result<Vec<f32>> {
    predict(model, frame)
}

pub fn predict_mlp<B: Backend>(model: &MlpRegressor<B>, frame: &TimeSeriesFrame) -> Result<Vec<f32>> {
    predict(model, frame)
}
