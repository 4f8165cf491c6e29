//! HTTP error mapping.
//!
//! Handlers return [`ApiError`]. Validation failures carry a list of issues;
//! backend failures carry only a fixed context string on the wire, the cause
//! goes to the log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::error::Error;

/// One problem with a request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Machine readable code, e.g. `length` or `invalid_type`
    pub code: String,
    /// Path to the offending field, camelCase, list indices as strings
    pub path: Vec<String>,
    /// Human readable message
    pub message: String,
}

impl ValidationIssue {
    /// Create an issue
    pub fn new(code: impl Into<String>, path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path,
            message: message.into(),
        }
    }
}

/// Error returned by REST handlers
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The body failed to parse or validate
    #[error("invalid request body")]
    Validation(Vec<ValidationIssue>),

    /// The addressed entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The backend failed
    #[error("Failed to {context}")]
    Internal {
        /// What the handler was doing, e.g. `fetch projects`
        context: &'static str,
        /// Underlying failure
        #[source]
        source: Error,
    },
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = match &self {
            ApiError::Validation(issues) => json!({ "error": issues }),
            ApiError::Internal { context, source } => {
                tracing::error!(error = %source, "Failed to {}", context);
                json!({ "error": self.to_string() })
            }
            ApiError::NotFound(_) => json!({ "error": self.to_string() }),
        };
        (code, Json(body)).into_response()
    }
}

/// Attach a handler context to backend errors
pub trait ResultExt<T> {
    /// Turn an error into [`ApiError::Internal`] with `context`
    fn or_internal(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for crate::error::Result<T> {
    fn or_internal(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Internal { context, source })
    }
}

/// Flatten `validator` errors into issues, sorted by path
pub fn issues_from(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    collect_issues(errors, &[], &mut issues);
    issues.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.code.cmp(&b.code)));
    issues
}

fn collect_issues(errors: &ValidationErrors, prefix: &[String], issues: &mut Vec<ValidationIssue>) {
    for (field, kind) in errors.errors() {
        let mut path = prefix.to_vec();
        if *field != "__all__" {
            path.push(camel_case(field));
        }

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                    issues.push(ValidationIssue::new(error.code.to_string(), path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_issues(nested, &path, issues),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let mut item_path = path.clone();
                    item_path.push(index.to_string());
                    collect_issues(nested, &item_path, issues);
                }
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::AgentConfig;
    use validator::Validate;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("max_tokens"), "maxTokens");
        assert_eq!(camel_case("name"), "name");
    }

    #[test]
    fn test_issues_use_wire_names() {
        let config = AgentConfig {
            max_tokens: Some(0),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        let issues = issues_from(&errors);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec!["maxTokens".to_string()]);
        assert_eq!(issues[0].code, "range");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("Project").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation(Vec::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let err = ApiError::Internal {
            context: "fetch projects",
            source: Error::Internal("boom".to_string()),
        };
        assert_eq!(err.to_string(), "Failed to fetch projects");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
