//! Burn dataset and batcher over lagged rows

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::frame::TimeSeriesFrame;
use crate::Result;

/// One time step: lagged predictors and the value to regress
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesItem {
    pub features: Vec<f32>,
    pub target: f32,
}

/// Rows of a frame in their original order
#[derive(Debug, Clone, Default)]
pub struct SeriesDataset {
    items: Vec<SeriesItem>,
    feature_count: usize,
}

impl SeriesDataset {
    /// Split a frame on its target column
    pub fn from_frame(frame: &TimeSeriesFrame, target: &str) -> Result<Self> {
        let (features, targets) = frame.split_target(target)?;
        let feature_count = frame.columns().len() - 1;

        let items = features
            .into_iter()
            .zip(targets)
            .map(|(features, target)| SeriesItem { features, target })
            .collect();

        Ok(SeriesDataset {
            items,
            feature_count,
        })
    }

    /// Predictor columns per row
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Dataset<SeriesItem> for SeriesDataset {
    fn get(&self, index: usize) -> Option<SeriesItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Mini-batch of rows
#[derive(Debug, Clone)]
pub struct SeriesBatch<B: Backend> {
    /// Predictors: [batch, features]
    pub features: Tensor<B, 2>,
    /// Targets: [batch, 1]
    pub targets: Tensor<B, 2>,
}

/// Stacks `SeriesItem`s into tensors on a fixed device
#[derive(Clone)]
pub struct SeriesBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> SeriesBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        SeriesBatcher { device }
    }
}

impl<B: Backend> Batcher<B, SeriesItem, SeriesBatch<B>> for SeriesBatcher<B> {
    fn batch(&self, items: Vec<SeriesItem>, _device: &B::Device) -> SeriesBatch<B> {
        let batch_size = items.len();
        let feature_dim = items.first().map(|s| s.features.len()).unwrap_or(0);

        let mut feature_data = Vec::with_capacity(batch_size * feature_dim);
        let mut target_data = Vec::with_capacity(batch_size);
        for item in &items {
            feature_data.extend_from_slice(&item.features);
            target_data.push(item.target);
        }

        let features = Tensor::<B, 1>::from_floats(feature_data.as_slice(), &self.device)
            .reshape([batch_size, feature_dim]);
        let targets = Tensor::<B, 1>::from_floats(target_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        SeriesBatch { features, targets }
    }
}
