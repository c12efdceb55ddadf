//! Evaluation metrics

use std::fs;
use std::path::Path;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::classifier::{IrisClassifier, ModelError, CLASS_COUNT, CLASS_NAMES};
use crate::dataset::IrisDataset;

/// Per-class (or averaged) scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Serialized as a single map: one entry per class, then `accuracy`,
/// `macro avg` and `weighted avg`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<(String, ClassScores)>,
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

impl Serialize for ClassificationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len() + 3))?;
        for (name, scores) in &self.classes {
            map.serialize_entry(name, scores)?;
        }
        map.serialize_entry("accuracy", &self.accuracy)?;
        map.serialize_entry("macro avg", &self.macro_avg)?;
        map.serialize_entry("weighted avg", &self.weighted_avg)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub accuracy: f64,
    /// Rows are true classes, columns predicted classes
    pub confusion_matrix: Vec<Vec<usize>>,
    pub classification_report: ClassificationReport,
}

impl Metrics {
    /// Compute metrics from true and predicted class indices
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        let mut confusion = vec![vec![0usize; CLASS_COUNT]; CLASS_COUNT];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            confusion[t][p] += 1;
        }

        let total = y_true.len();
        let correct: usize = (0..CLASS_COUNT).map(|c| confusion[c][c]).sum();
        let accuracy = ratio(correct, total);

        let classes: Vec<(String, ClassScores)> = (0..CLASS_COUNT)
            .map(|c| {
                let tp = confusion[c][c];
                let support: usize = confusion[c].iter().sum();
                let predicted: usize = confusion.iter().map(|row| row[c]).sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                (CLASS_NAMES[c].to_string(), ClassScores { precision, recall, f1_score, support })
            })
            .collect();

        let n = CLASS_COUNT as f64;
        let macro_avg = ClassScores {
            precision: classes.iter().map(|(_, s)| s.precision).sum::<f64>() / n,
            recall: classes.iter().map(|(_, s)| s.recall).sum::<f64>() / n,
            f1_score: classes.iter().map(|(_, s)| s.f1_score).sum::<f64>() / n,
            support: total,
        };

        let weighted = |f: fn(&ClassScores) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes.iter().map(|(_, s)| f(s) * s.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = ClassScores {
            precision: weighted(|s: &ClassScores| s.precision),
            recall: weighted(|s: &ClassScores| s.recall),
            f1_score: weighted(|s: &ClassScores| s.f1_score),
            support: total,
        };

        Self {
            accuracy,
            confusion_matrix: confusion,
            classification_report: ClassificationReport {
                classes,
                accuracy,
                macro_avg,
                weighted_avg,
            },
        }
    }
}

/// Write pretty-printed JSON, creating parent directories
pub fn write_json<T: Serialize>(record: &T, path: &Path) -> Result<(), std::io::Error> {
    let json = serde_json::to_vec_pretty(record).map_err(std::io::Error::from)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, json)
}

/// Score `classifier` on a held-out set
pub fn evaluate(classifier: &IrisClassifier, test: &IrisDataset) -> Result<Metrics, ModelError> {
    let y_pred = classifier.predict(&test.features())?;
    Ok(Metrics::compute(&test.labels(), &y_pred))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 1, 2, 2];
        let metrics = Metrics::compute(&y, &y);

        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.confusion_matrix, vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 2]]);
        let (name, virginica) = &metrics.classification_report.classes[2];
        assert_eq!(name, "virginica");
        assert_eq!(virginica.support, 2);
        assert_eq!(virginica.f1_score, 1.0);
    }

    #[test]
    fn test_mixed_predictions() {
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 1, 1, 1];
        let metrics = Metrics::compute(&y_true, &y_pred);

        assert_eq!(metrics.accuracy, 0.75);
        assert_eq!(metrics.confusion_matrix[0], vec![1, 1, 0]);

        let classes = &metrics.classification_report.classes;
        let setosa = classes[0].1;
        assert_eq!(setosa.precision, 1.0);
        assert_eq!(setosa.recall, 0.5);
        let versicolor = classes[1].1;
        assert!((versicolor.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(versicolor.recall, 1.0);

        // Absent class scores zero instead of dividing by zero
        let virginica = classes[2].1;
        assert_eq!((virginica.precision, virginica.recall, virginica.f1_score), (0.0, 0.0, 0.0));
        assert_eq!(metrics.classification_report.weighted_avg.support, 4);
    }

    #[test]
    fn test_report_json_shape() {
        let metrics = Metrics::compute(&[0, 1, 2], &[0, 1, 2]);
        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["accuracy"], 1.0);
        assert_eq!(json["confusion_matrix"][2][2], 1);
        assert_eq!(json["classification_report"]["setosa"]["f1-score"], 1.0);
        assert_eq!(json["classification_report"]["macro avg"]["support"], 3);
        assert_eq!(json["classification_report"]["accuracy"], 1.0);
    }

    #[test]
    fn test_write_json_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("metrics.json");
        let metrics = Metrics::compute(&[0, 1], &[0, 0]);

        write_json(&metrics, &path).unwrap();

        let loaded: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(loaded["accuracy"], 0.5);
        assert_eq!(loaded["confusion_matrix"], serde_json::json!([[1, 0, 0], [1, 0, 0], [0, 0, 0]]));
    }

    #[test]
    fn test_empty_input() {
        let metrics = Metrics::compute(&[], &[]);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.classification_report.weighted_avg.precision, 0.0);
    }
}
