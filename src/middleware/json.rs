//! JSON body extraction with field validation

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{field_errors, AppError};

/// A request body that decoded and passed `Validate`.
///
/// Every decoding failure (missing or mistyped field, malformed JSON, wrong
/// content type) is reported as 422 with the app error body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Same as [`ValidatedJson`] for a JSON array; every item is validated and
/// field names in the error carry the item index.
#[derive(Debug, Clone)]
pub struct ValidatedBatch<T>(pub Vec<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedBatch<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(items) = Json::<Vec<T>>::from_request(req, state).await?;

        let errors: Vec<_> = items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.validate().err().map(|e| field_errors(&e, Some(i))))
            .flatten()
            .collect();
        if !errors.is_empty() {
            return Err(AppError::ValidationError(errors));
        }

        Ok(Self(items))
    }
}
