//! Prediction response model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted class name
    pub prediction: String,
    pub prediction_index: usize,
    /// Probability of the predicted class
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

/// Build the response record for one prediction.
///
/// `probabilities` and `class_names` share the same order. The caller guarantees
/// `prediction < class_names.len()`; an out-of-range index is a programming error.
pub fn format_prediction(
    prediction: usize,
    probabilities: &[f64],
    class_names: &[&str],
) -> PredictionResponse {
    assert!(
        prediction < class_names.len(),
        "class index {} out of range for {} classes",
        prediction,
        class_names.len()
    );

    PredictionResponse {
        prediction: class_names[prediction].to_string(),
        prediction_index: prediction,
        confidence: probabilities.get(prediction).copied().unwrap_or(0.0),
        probabilities: class_names
            .iter()
            .zip(probabilities)
            .map(|(name, p)| (name.to_string(), *p))
            .collect(),
    }
}
