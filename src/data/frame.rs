//! In-memory lagged time-series table

use std::io::{Read, Write};
use std::path::Path;

use crate::{Result, TsnnError};

/// Name of the regression target column
pub const TARGET_COLUMN: &str = "t0";

/// A table of numeric rows with named columns.
///
/// Rows are time steps. One column is the target, the others are lagged
/// predictors kept in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TimeSeriesFrame {
    /// Build a frame, checking every row against the header width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let expected = columns.len();
        if let Some((row, values)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(TsnnError::RaggedRow {
                row,
                expected,
                found: values.len(),
            });
        }
        Ok(TimeSeriesFrame { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of a single column
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TsnnError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Split into predictor rows (target dropped, order kept) and target values
    pub fn split_target(&self, target: &str) -> Result<(Vec<Vec<f32>>, Vec<f32>)> {
        let idx = self
            .column_index(target)
            .ok_or_else(|| TsnnError::MissingColumn(target.to_string()))?;

        let mut features = Vec::with_capacity(self.rows.len());
        let mut targets = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            features.push(
                row.iter()
                    .enumerate()
                    .filter(|(j, _)| *j != idx)
                    .map(|(_, v)| *v as f32)
                    .collect(),
            );
            targets.push(row[idx] as f32);
        }

        Ok((features, targets))
    }

    /// Copy of this frame with an extra column appended
    pub fn with_column(&self, name: &str, values: &[f32]) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(TsnnError::ColumnLength {
                name: name.to_string(),
                expected: self.rows.len(),
                found: values.len(),
            });
        }

        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, v)| {
                let mut row = row.clone();
                row.push(*v as f64);
                row
            })
            .collect();

        Ok(TimeSeriesFrame { columns, rows })
    }

    /// Parse a comma-delimited table with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in rdr.deserialize::<Vec<f64>>() {
            rows.push(record?);
        }

        Self::new(columns, rows)
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Write as comma-delimited text: header row, no index column
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lagged() -> TimeSeriesFrame {
        TimeSeriesFrame::new(
            vec!["t3".into(), "t2".into(), "t1".into(), "t0".into()],
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 3.0, 4.0, 5.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_ragged_row_rejected() {
        let err = TimeSeriesFrame::new(
            vec!["a".into(), "t0".into()],
            vec![vec![1.0, 2.0], vec![1.0]],
        )
        .unwrap_err();

        match err {
            TsnnError::RaggedRow { row, expected, found } => {
                assert_eq!((row, expected, found), (1, 2, 1));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_split_target_keeps_feature_order() {
        let frame = TimeSeriesFrame::new(
            vec!["t2".into(), "t0".into(), "t1".into()],
            vec![vec![1.0, 9.0, 2.0], vec![3.0, 8.0, 4.0]],
        )
        .unwrap();

        let (features, targets) = frame.split_target(TARGET_COLUMN).unwrap();
        assert_eq!(features, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(targets, vec![9.0, 8.0]);
    }

    #[test]
    fn test_missing_target() {
        let frame = TimeSeriesFrame::new(vec!["t1".into()], vec![vec![1.0]]).unwrap();
        let err = frame.split_target(TARGET_COLUMN).unwrap_err();
        assert!(matches!(err, TsnnError::MissingColumn(name) if name == "t0"));
    }

    #[test]
    fn test_csv_has_no_index_column() {
        let mut buf = Vec::new();
        lagged().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text, "t3,t2,t1,t0\n1,2,3,4\n2,3,4,5\n");
    }

    #[test]
    fn test_read_back_written_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.csv");

        let frame = lagged().with_column("prediction", &[0.25, -1.5]).unwrap();
        frame.to_csv(&path).unwrap();

        let loaded = TimeSeriesFrame::from_csv(&path).unwrap();
        assert_eq!(loaded, frame);
        assert_eq!(loaded.column("prediction").unwrap(), vec![0.25, -1.5]);
    }

    #[test]
    fn test_with_column_length_mismatch() {
        let err = lagged().with_column("prediction", &[1.0]).unwrap_err();
        assert!(matches!(err, TsnnError::ColumnLength { expected: 2, found: 1, .. }));
    }
}
