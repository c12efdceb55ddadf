//! Prediction handlers

use axum::{extract::State, Json};

use crate::classifier::{IrisClassifier, ModelError, CLASS_NAMES};
use crate::middleware::json::{ValidatedBatch, ValidatedJson};
use crate::models::{format_prediction, FeatureVector, PredictionResponse};
use crate::{AppError, AppResult, AppState};

/// Classify a single flower
pub async fn single(
    State(state): State<AppState>,
    ValidatedJson(features): ValidatedJson<FeatureVector>,
) -> AppResult<Json<PredictionResponse>> {
    let model = state.model.get().ok_or(AppError::ModelNotLoaded)?;

    let result = infer(&model, std::slice::from_ref(&features))?
        .pop()
        .ok_or_else(|| AppError::InternalError("model returned no prediction".to_string()))?;

    tracing::info!("Prediction: {} (confidence: {:.4})", result.prediction, result.confidence);

    Ok(Json(result))
}

/// Classify many flowers; output order matches input order
pub async fn batch(
    State(state): State<AppState>,
    ValidatedBatch(batch): ValidatedBatch<FeatureVector>,
) -> AppResult<Json<Vec<PredictionResponse>>> {
    let model = state.model.get().ok_or(AppError::ModelNotLoaded)?;

    let results = infer(&model, &batch)?;

    tracing::info!("Batch prediction completed for {} samples", results.len());

    Ok(Json(results))
}

/// Run predict + predict_proba and format each row
pub fn infer(
    model: &IrisClassifier,
    batch: &[FeatureVector],
) -> Result<Vec<PredictionResponse>, ModelError> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let x = FeatureVector::to_matrix(batch);
    let predictions = model.predict(&x)?;
    let probabilities = model.predict_proba(&x)?;

    if predictions.len() != batch.len() || probabilities.nrows() != batch.len() {
        return Err(ModelError::InvalidInput(format!(
            "model returned {} predictions for {} inputs",
            predictions.len(),
            batch.len()
        )));
    }

    Ok(predictions
        .into_iter()
        .zip(probabilities.rows())
        .map(|(index, row)| format_prediction(index, &row.to_vec(), &CLASS_NAMES))
        .collect())
}
