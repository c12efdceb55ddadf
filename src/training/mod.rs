//! Training Module - fit, evaluate and persist the forest
//!
//! load dataset → seeded split → fit → evaluate → stage model + metrics → reload check → commit.
//! Model and metrics are first written to `.staged` siblings. They replace the
//! previous files only after the reload check passes; a failed run removes its
//! staged files and leaves the previous artifacts untouched.

pub mod metrics;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::classifier::{ForestParams, IrisClassifier, ModelError};
use crate::config::Config;
use crate::dataset::{DatasetError, IrisDataset};
pub use metrics::{evaluate, write_json, ClassScores, ClassificationReport, Metrics};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("failed to write metrics: {0}")]
    Io(#[from] std::io::Error),

    #[error("split produced {train} training and {test} test rows; both must be non-empty")]
    EmptySplit { train: usize, test: usize },

    #[error("reloaded artifact disagrees with the trained model: {0}")]
    SelfCheck(String),
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub metrics: Metrics,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
    pub train_samples: usize,
    pub test_samples: usize,
}

/// Metrics file layout: the metrics plus run metadata
#[derive(Serialize)]
struct MetricsFile<'a> {
    #[serde(flatten)]
    metrics: &'a Metrics,
    model_version: &'a str,
    trained_at: DateTime<Utc>,
    n_estimators: usize,
    max_depth: Option<usize>,
    random_state: u64,
    train_samples: usize,
    test_samples: usize,
}

/// Run the full pipeline described by `config`
pub fn run_pipeline(config: &Config) -> Result<TrainingOutcome, TrainingError> {
    tracing::info!("Starting training process...");
    tracing::info!(
        "Configuration: random_state={}, test_size={}, n_estimators={}, max_depth={:?}",
        config.random_state,
        config.test_size,
        config.n_estimators,
        config.max_depth
    );

    tracing::info!("Loading Iris dataset...");
    let dataset = IrisDataset::load(&config.data_path)?;
    let (train, test) = dataset.split(config.test_size, config.random_state);
    if train.is_empty() || test.is_empty() {
        return Err(TrainingError::EmptySplit { train: train.len(), test: test.len() });
    }
    tracing::info!("Training samples: {}, Test samples: {}", train.len(), test.len());

    tracing::info!("Training model...");
    let mut classifier = IrisClassifier::new(ForestParams::from_config(config));
    classifier.train(&train.features(), &train.labels())?;

    tracing::info!("Evaluating model on test set...");
    let metrics = evaluate(&classifier, &test)?;
    log_report(&metrics);

    let model_path = config.model_path.clone();
    let metrics_path = config.metrics_path();

    let staged_model = staged_path(&model_path);
    let staged_metrics = staged_path(&metrics_path);

    tracing::info!(
        "Saving model to {} and metrics to {}...",
        model_path.display(),
        metrics_path.display()
    );
    let record = MetricsFile {
        metrics: &metrics,
        model_version: &config.model_version,
        trained_at: Utc::now(),
        n_estimators: config.n_estimators,
        max_depth: config.max_depth,
        random_state: config.random_state,
        train_samples: train.len(),
        test_samples: test.len(),
    };

    let staged = stage(&classifier, &record, &staged_model, &staged_metrics)
        .and_then(|()| self_check(&classifier, &staged_model, &test))
        .and_then(|()| {
            tracing::debug!("Reload check passed, replacing previous artifacts");
            // Metrics first: if that rename fails the previous model is still in place
            fs::rename(&staged_metrics, &metrics_path)?;
            fs::rename(&staged_model, &model_path)?;
            Ok(())
        });
    if let Err(e) = staged {
        discard(&[&staged_model, &staged_metrics]);
        return Err(e);
    }

    tracing::info!("Training pipeline completed successfully");

    Ok(TrainingOutcome {
        metrics,
        model_path,
        metrics_path,
        train_samples: train.len(),
        test_samples: test.len(),
    })
}

fn stage(
    classifier: &IrisClassifier,
    record: &MetricsFile<'_>,
    model: &Path,
    metrics: &Path,
) -> Result<(), TrainingError> {
    classifier.save(model)?;
    write_json(record, metrics)?;
    Ok(())
}

/// Reload the written artifact and compare its predictions with the in-memory model
fn self_check(classifier: &IrisClassifier, path: &Path, test: &IrisDataset) -> Result<(), TrainingError> {
    let reloaded = IrisClassifier::load(path)?;
    let x = test.features();
    if reloaded.predict(&x)? != classifier.predict(&x)? {
        return Err(TrainingError::SelfCheck(format!(
            "predictions from {} differ on the test set",
            path.display()
        )));
    }
    Ok(())
}

fn log_report(metrics: &Metrics) {
    tracing::info!("Test Accuracy: {:.4}", metrics.accuracy);
    tracing::info!("Classification Report:");
    for (name, scores) in &metrics.classification_report.classes {
        tracing::info!(
            "  {}: precision={:.4} recall={:.4} f1-score={:.4} support={}",
            name,
            scores.precision,
            scores.recall,
            scores.f1_score,
            scores.support
        );
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".staged");
    path.with_file_name(name)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> Config {
        Config {
            model_path: dir.join("models").join("iris_model.json"),
            data_path: dir.join("data"),
            n_estimators: 10,
            ..Config::default()
        }
    }

    #[test]
    fn test_pipeline_writes_model_and_metrics() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());

        let outcome = run_pipeline(&config).unwrap();

        assert_eq!(outcome.train_samples, 120);
        assert_eq!(outcome.test_samples, 30);
        assert!(outcome.model_path.exists());
        assert_eq!(outcome.metrics_path, dir.path().join("models").join("metrics.json"));
        assert!(outcome.metrics.accuracy > 0.8);

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&outcome.metrics_path).unwrap()).unwrap();
        assert!(json["accuracy"].is_f64());
        assert_eq!(json["confusion_matrix"].as_array().unwrap().len(), 3);
        assert!(json["classification_report"]["setosa"]["precision"].is_f64());
        assert_eq!(json["model_version"], "v1");
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();

        let first = run_pipeline(&config_in(a.path())).unwrap();
        let second = run_pipeline(&config_in(b.path())).unwrap();

        assert_eq!(first.metrics.accuracy, second.metrics.accuracy);
        assert_eq!(first.metrics.confusion_matrix, second.metrics.confusion_matrix);
    }

    #[test]
    fn test_empty_split_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = Config { test_size: 0.0, ..config_in(dir.path()) };

        let err = run_pipeline(&config).unwrap_err();

        assert!(matches!(err, TrainingError::EmptySplit { train: 150, test: 0 }));
        assert!(!config.model_path.exists());
        assert!(!config.metrics_path().exists());
    }

    #[test]
    fn test_failed_run_keeps_previous_model() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        run_pipeline(&config).unwrap();
        let previous = fs::read(&config.model_path).unwrap();

        // A directory in place of metrics.json makes the commit step fail
        fs::remove_file(config.metrics_path()).unwrap();
        fs::create_dir(config.metrics_path()).unwrap();

        let retrain = Config { n_estimators: 5, ..config.clone() };
        assert!(matches!(run_pipeline(&retrain), Err(TrainingError::Io(_))));

        assert_eq!(fs::read(&config.model_path).unwrap(), previous);
        assert!(IrisClassifier::load(&config.model_path).is_ok());
        assert!(!staged_path(&config.model_path).exists());
        assert!(!staged_path(&config.metrics_path()).exists());
    }

    #[test]
    fn test_successful_rerun_replaces_artifacts() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        run_pipeline(&config).unwrap();

        let retrain = Config { n_estimators: 5, ..config.clone() };
        run_pipeline(&retrain).unwrap();

        assert_eq!(IrisClassifier::load(&config.model_path).unwrap().n_trees(), 5);
        assert!(!staged_path(&config.model_path).exists());
        assert!(!staged_path(&config.metrics_path()).exists());
    }

    #[test]
    fn test_bad_dataset_aborts_before_writing() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(&config.data_path).unwrap();
        fs::write(config.data_file(), b"[{\"sepal_length\": 1.0}]").unwrap();

        assert!(matches!(run_pipeline(&config), Err(TrainingError::Dataset(_))));
        assert!(!config.model_path.exists());
    }
}
