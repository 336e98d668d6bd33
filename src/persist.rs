//! Saving and loading models and tables
//!
//! A model file is one line of JSON describing the architecture, followed by
//! the full-precision named MessagePack record of the weights.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder};
use burn::tensor::backend::Backend;

use crate::data::TimeSeriesFrame;
use crate::model::{Architecture, Conv1dRegressor, MlpRegressor, Network, Regressor};
use crate::{Result, TsnnError};

/// Ends the architecture header; compact JSON never contains a raw newline
const HEADER_END: u8 = b'\n';

#[derive(Debug)]
struct ModelFile {
    architecture: Architecture,
    weights: Vec<u8>,
}

fn recorder() -> NamedMpkBytesRecorder<FullPrecisionSettings> {
    NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
}

fn read_model_file<P: AsRef<Path>>(path: P) -> Result<ModelFile> {
    let mut bytes = std::fs::read(path)?;
    let end = bytes
        .iter()
        .position(|&b| b == HEADER_END)
        .ok_or_else(|| TsnnError::Record("model file has no architecture header".to_string()))?;

    let architecture = serde_json::from_slice(&bytes[..end])?;
    let weights = bytes.split_off(end + 1);
    Ok(ModelFile {
        architecture,
        weights,
    })
}

/// Write architecture and weights of `model` to `path`
pub fn save_model<B: Backend, M: Regressor<B>, P: AsRef<Path>>(model: &M, path: P) -> Result<()> {
    let weights = Recorder::<B>::record(&recorder(), model.clone().into_record(), ())
        .map_err(|e| TsnnError::Record(e.to_string()))?;
    let file = ModelFile {
        architecture: model.architecture(),
        weights,
    };

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer(&mut writer, &file.architecture)?;
    writer.write_all(&[HEADER_END])?;
    writer.write_all(&file.weights)?;
    writer.flush()?;

    log::info!(
        "Saved {} model to {}",
        file.architecture.name(),
        path.as_ref().display()
    );
    Ok(())
}

fn restore<B: Backend, M: Regressor<B>>(file: ModelFile, device: &B::Device) -> Result<M> {
    let model = M::from_architecture(device, &file.architecture)?;
    let record = Recorder::<B>::load(&recorder(), file.weights, device)
        .map_err(|e| TsnnError::Record(e.to_string()))?;
    Ok(model.load_record(record))
}

/// Load a model of a known type onto `device`.
///
/// Load onto an inference backend to get the model in evaluation mode.
pub fn load_model<B: Backend, M: Regressor<B>, P: AsRef<Path>>(
    path: P,
    device: &B::Device,
) -> Result<M> {
    let file = read_model_file(path)?;
    restore(file, device)
}

/// Load a model whose architecture is read from the file
pub fn load_network<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Network<B>> {
    let file = read_model_file(path)?;
    match file.architecture {
        Architecture::Conv1d { .. } => Ok(Network::Conv1d(restore::<B, Conv1dRegressor<B>>(
            file, device,
        )?)),
        Architecture::Mlp { .. } => Ok(Network::Mlp(restore::<B, MlpRegressor<B>>(file, device)?)),
    }
}

/// Write `frame` comma-delimited with a header and no index column
pub fn save_table<P: AsRef<Path>>(frame: &TimeSeriesFrame, path: P) -> Result<()> {
    frame.to_csv(path)
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<TimeSeriesFrame> {
    TimeSeriesFrame::from_csv(path)
}
