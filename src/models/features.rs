//! Feature vector model

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dataset::FEATURE_COUNT;

/// Iris flower measurements in centimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeatureVector {
    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub sepal_length: f64,

    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub sepal_width: f64,

    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub petal_length: f64,

    #[validate(range(min = 0.0, message = "must be greater than or equal to 0"))]
    pub petal_width: f64,
}

impl FeatureVector {
    pub fn new(sepal_length: f64, sepal_width: f64, petal_length: f64, petal_width: f64) -> Self {
        Self { sepal_length, sepal_width, petal_length, petal_width }
    }

    /// Values in `FEATURE_NAMES` order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [self.sepal_length, self.sepal_width, self.petal_length, self.petal_width]
    }

    /// Stack a batch into a `(n, 4)` matrix, preserving order
    pub fn to_matrix(batch: &[FeatureVector]) -> Array2<f64> {
        let flat: Vec<f64> = batch.iter().flat_map(|f| f.to_array()).collect();
        Array2::from_shape_vec((batch.len(), FEATURE_COUNT), flat)
            .unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)))
    }
}
