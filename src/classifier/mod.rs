//! Classifier Module - RandomForest model artifact
//!
//! Bagged CART trees over the four Iris measurements. The artifact is created
//! untrained, fitted once by the training pipeline, persisted, then loaded
//! read-only by the server.
//!
//! Class order is fixed: index `i` in every probability row is `CLASS_NAMES[i]`.
//! Training labels are class indices in the same order (0 = setosa).

mod error;
pub mod storage;
pub mod tree;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::dataset::FEATURE_COUNT;
pub use error::ModelError;
use tree::{DecisionTree, TreeParams};

pub const CLASS_COUNT: usize = 3;

pub const CLASS_NAMES: [&str; CLASS_COUNT] = ["setosa", "versicolor", "virginica"];

/// Index of a class name in `CLASS_NAMES`
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_NAMES.iter().position(|c| *c == name)
}

/// Forest hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub random_state: u64,
    pub min_samples_split: usize,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            random_state: 42,
            min_samples_split: 2,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            random_state: config.random_state,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrisClassifier {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    is_trained: bool,
}

impl IrisClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            is_trained: false,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        self.is_trained
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fit the forest. Calling it again refits from scratch.
    pub fn train(&mut self, features: &Array2<f64>, labels: &[usize]) -> Result<&mut Self, ModelError> {
        check_features(features)?;
        if features.nrows() == 0 {
            return Err(ModelError::InvalidInput("training set is empty".to_string()));
        }
        if features.nrows() != labels.len() {
            return Err(ModelError::InvalidInput(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l >= CLASS_COUNT) {
            return Err(ModelError::InvalidInput(format!("label {} is not a class index", bad)));
        }
        if self.params.n_estimators == 0 {
            return Err(ModelError::InvalidInput("n_estimators must be at least 1".to_string()));
        }

        let n = features.nrows();
        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            max_features: ((FEATURE_COUNT as f64).sqrt() as usize).max(1),
        };

        let mut rng = StdRng::seed_from_u64(self.params.random_state);
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());
            let sample_idx: Vec<usize> = if self.params.bootstrap {
                (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(features.view(), labels, sample_idx, &tree_params, &mut tree_rng));
        }

        tracing::debug!(
            "Fitted {} trees on {} samples (max depth reached: {})",
            trees.len(),
            n,
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        self.trees = trees;
        self.is_trained = true;
        Ok(self)
    }

    /// Class probabilities: one row per input, one column per class in `CLASS_NAMES` order
    pub fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.ensure_trained()?;
        check_features(features)?;

        let mut proba = Array2::<f64>::zeros((features.nrows(), CLASS_COUNT));
        for (row, mut out) in features.rows().into_iter().zip(proba.rows_mut()) {
            for (cell, p) in out.iter_mut().zip(self.row_proba(row)) {
                *cell = p;
            }
        }
        Ok(proba)
    }

    /// Predicted class index per input: the arg-max of `predict_proba`, lowest index on ties
    pub fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        let proba = self.predict_proba(features)?;
        Ok(proba.rows().into_iter().map(|row| argmax(row.as_slice().unwrap_or(&[]))).collect())
    }

    fn row_proba(&self, row: ArrayView1<'_, f64>) -> [f64; CLASS_COUNT] {
        let mut sum = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf_distribution(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.map(|s| s / n)
    }

    fn ensure_trained(&self) -> Result<(), ModelError> {
        if self.is_trained && !self.trees.is_empty() {
            Ok(())
        } else {
            Err(ModelError::Untrained)
        }
    }

    /// Consistency check for artifacts read back from disk
    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        self.ensure_trained()?;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| match e {
                ModelError::Corrupt(msg) => ModelError::Corrupt(format!("tree {}: {}", i, msg)),
                other => other,
            })?;
        }
        Ok(())
    }
}

fn check_features(features: &Array2<f64>) -> Result<(), ModelError> {
    if features.ncols() != FEATURE_COUNT {
        return Err(ModelError::InvalidInput(format!(
            "expected {} features per row, got {}",
            FEATURE_COUNT,
            features.ncols()
        )));
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidInput("features must be finite".to_string()));
    }
    Ok(())
}

/// First index of the largest value
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}
