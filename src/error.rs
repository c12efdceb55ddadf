//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use validator::ValidationErrors;

use crate::classifier::ModelError;

pub type AppResult<T> = Result<T, AppError>;

/// Fixed message for requests that arrive before a model is installed
pub const MODEL_NOT_LOADED: &str = "Model not loaded. Please check server logs.";

/// One offending request field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(Vec<FieldError>),
    BadRequest(String),

    // Availability errors
    ModelNotLoaded,

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::ValidationError(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                Some(fields),
            ),
            AppError::BadRequest(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            AppError::ModelNotLoaded => (StatusCode::SERVICE_UNAVAILABLE, MODEL_NOT_LOADED.to_string(), None),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed".to_string(), None)
            }
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationError(field_errors(&errors, None))
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Flatten validator output; `index` prefixes field names for batch items (`[2].sepal_length`)
pub fn field_errors(errors: &ValidationErrors, index: Option<usize>) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = match index {
                Some(i) => format!("[{}].{}", i, field),
                None => field.to_string(),
            };
            errs.iter()
                .map(|e| FieldError {
                    field: field.clone(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code)),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureVector;
    use validator::Validate;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::ModelNotLoaded.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::InternalError("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ValidationError(vec![]).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_model_errors_hide_detail() {
        let err = AppError::from(ModelError::InvalidInput("secret detail".to_string()));
        assert!(matches!(err, AppError::InternalError(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Prediction failed");
        assert_eq!(body["status"], 500);
        assert!(body.get("details").is_none());
        assert!(!String::from_utf8_lossy(&bytes).contains("secret detail"));
    }

    #[test]
    fn test_body_rejections_are_unprocessable() {
        let response = AppError::BadRequest("missing field `petal_width`".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_field_errors_are_prefixed_for_batches() {
        let errors = FeatureVector::new(1.0, -2.0, 1.0, -0.5).validate().unwrap_err();
        let fields = field_errors(&errors, Some(3));

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "[3].petal_width");
        assert_eq!(fields[1].field, "[3].sepal_width");
        assert_eq!(fields[0].code, "range");
    }
}
