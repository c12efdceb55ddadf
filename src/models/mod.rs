//! Request and response records

mod features;
mod prediction;

pub use features::FeatureVector;
pub use prediction::{format_prediction, PredictionResponse};
