//! Request extractors.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use super::error::{issues_from, ApiError, ValidationIssue};

/// JSON body that has been deserialized and validated.
///
/// Unlike [`axum::Json`], every failure (bad JSON, wrong shape, rule
/// violation) is a 400 with a list of issues.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![ValidationIssue::new(
                    "invalid_json",
                    Vec::new(),
                    rejection.body_text(),
                )])
            })?;

        let payload: T = serde_json::from_value(value).map_err(|e| {
            ApiError::Validation(vec![ValidationIssue::new(
                "invalid_type",
                Vec::new(),
                e.to_string(),
            )])
        })?;

        payload
            .validate()
            .map_err(|errors| ApiError::Validation(issues_from(&errors)))?;

        Ok(ValidatedJson(payload))
    }
}
