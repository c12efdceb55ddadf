//! Dataset Module - Iris reference data
//!
//! Loads the canonical 150-row Iris table (embedded, or an `iris.json` override
//! from the data directory) and produces the seeded train/test partition.

mod table;

use std::fs;
use std::path::Path;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::CLASS_COUNT;

/// Number of measurements per flower
pub const FEATURE_COUNT: usize = 4;

/// Feature order shared by the dataset, the forest and the API
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("dataset is empty")]
    Empty,
}

/// One labelled row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f64; FEATURE_COUNT],
    pub label: usize,
}

/// On-disk row format of `iris.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
    pub label: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrisDataset {
    samples: Vec<Sample>,
}

impl IrisDataset {
    /// The built-in reference table
    pub fn embedded() -> Self {
        let samples = table::IRIS_ROWS
            .iter()
            .map(|&(features, label)| Sample { features, label })
            .collect();
        Self { samples }
    }

    /// Load `<data_path>/iris.json` if it exists, otherwise the embedded table
    pub fn load(data_path: &Path) -> Result<Self, DatasetError> {
        let file = data_path.join("iris.json");
        if !file.exists() {
            tracing::debug!("No dataset override at {}, using embedded Iris table", file.display());
            return Ok(Self::embedded());
        }

        tracing::info!("Loading dataset from {}", file.display());
        let data = fs::read(&file)?;
        let records: Vec<DatasetRecord> = serde_json::from_slice(&data)?;
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<DatasetRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        let samples = records
            .into_iter()
            .enumerate()
            .map(|(row, r)| {
                let features = [r.sepal_length, r.sepal_width, r.petal_length, r.petal_width];
                if let Some(pos) = features.iter().position(|v| !v.is_finite() || *v < 0.0) {
                    return Err(DatasetError::InvalidRow {
                        row,
                        reason: format!("{} must be a non-negative number", FEATURE_NAMES[pos]),
                    });
                }
                if r.label >= CLASS_COUNT {
                    return Err(DatasetError::InvalidRow {
                        row,
                        reason: format!("label {} is not a class index", r.label),
                    });
                }
                Ok(Sample { features, label: r.label })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Feature matrix, one row per sample
    pub fn features(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.samples.len(), FEATURE_COUNT));
        for (mut row, sample) in matrix.rows_mut().into_iter().zip(&self.samples) {
            for (cell, value) in row.iter_mut().zip(sample.features) {
                *cell = value;
            }
        }
        matrix
    }

    pub fn labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.label).collect()
    }

    pub fn class_counts(&self) -> [usize; CLASS_COUNT] {
        let mut counts = [0usize; CLASS_COUNT];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }

    /// Seeded shuffle, then `ceil(n * test_size)` rows go to the test set.
    ///
    /// Returns `(train, test)`. The same seed always yields the same partition.
    pub fn split(&self, test_size: f64, seed: u64) -> (IrisDataset, IrisDataset) {
        let total = self.samples.len();
        let n_test = ((total as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
        let n_test = n_test.min(total);

        let mut order: Vec<usize> = (0..total).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let pick = |idx: &[usize]| IrisDataset {
            samples: idx.iter().map(|&i| self.samples[i]).collect(),
        };
        let test = pick(&order[..n_test]);
        let train = pick(&order[n_test..]);

        tracing::debug!("Dataset split: {} training, {} test", train.len(), test.len());

        (train, test)
    }
}
