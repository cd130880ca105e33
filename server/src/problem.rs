//! Mapping of dispatch errors to RFC 7807 problem documents.
//!
//! # Design
//! `ApiError` is what route handlers return. Domain errors convert into it
//! via `From`; the adapter adds its own cases for fetch misses, id mismatches,
//! undecodable requests and unknown routes. Every variant renders as
//! `application/problem+json`; 500s carry a fixed title and never the
//! internal error text.

use std::collections::BTreeMap;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use todo_core::{ToDoError, ToDoId};

pub const BAD_REQUEST_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.5.1";
pub const NOT_FOUND_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.5.4";
pub const METHOD_NOT_ALLOWED_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.5.5";
pub const SERVER_ERROR_TYPE: &str = "https://tools.ietf.org/html/rfc7231#section-6.6.1";

const PROBLEM_JSON: &str = "application/problem+json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ProblemDetails {
    fn new(problem_type: &str, title: &str, status: StatusCode) -> Self {
        Self {
            problem_type: problem_type.to_string(),
            title: title.to_string(),
            status: status.as_u16(),
            detail: None,
            errors: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[derive(Debug)]
pub enum ApiError {
    Domain(ToDoError),
    /// A fetch-by-id query returned no item.
    ItemNotFound,
    IdMismatch { path: ToDoId, body: ToDoId },
    /// The body or path could not be decoded.
    MalformedRequest(String),
    RouteNotFound,
    MethodNotAllowed,
}

impl From<ToDoError> for ApiError {
    fn from(error: ToDoError) -> Self {
        Self::Domain(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(ToDoError::ValidationFailed(_))
            | Self::IdMismatch { .. }
            | Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Domain(ToDoError::NotFound { .. }) | Self::ItemNotFound | Self::RouteNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_problem(&self) -> ProblemDetails {
        let status = self.status();
        match self {
            Self::Domain(ToDoError::ValidationFailed(failures)) => ProblemDetails {
                errors: Some(failures.errors()),
                ..ProblemDetails::new(
                    BAD_REQUEST_TYPE,
                    "One or more validation errors occurred.",
                    status,
                )
            },
            Self::Domain(error @ ToDoError::NotFound { .. }) => ProblemDetails::new(
                NOT_FOUND_TYPE,
                "The specified resource was not found.",
                status,
            )
            .with_detail(error.to_string()),
            Self::Domain(_) => ProblemDetails::new(
                SERVER_ERROR_TYPE,
                "An error occurred while processing your request.",
                status,
            ),
            Self::ItemNotFound | Self::RouteNotFound => {
                ProblemDetails::new(NOT_FOUND_TYPE, "Not Found", status)
            }
            Self::MethodNotAllowed => {
                ProblemDetails::new(METHOD_NOT_ALLOWED_TYPE, "Method Not Allowed", status)
            }
            Self::MalformedRequest(detail) => {
                ProblemDetails::new(BAD_REQUEST_TYPE, "Bad Request", status)
                    .with_detail(detail.clone())
            }
            Self::IdMismatch { path, body } => {
                ProblemDetails::new(BAD_REQUEST_TYPE, "Bad Request", status)
                    .with_detail(format!("Route id {path} does not match body id {body}."))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed with server error");
        }
        (
            status,
            [(header::CONTENT_TYPE, PROBLEM_JSON)],
            Json(self.to_problem()),
        )
            .into_response()
    }
}
