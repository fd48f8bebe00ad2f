use std::net::AddrParseError;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::core::{SavingsMode, Variant};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("savings mode '{mode}' is not offered by the {variant} variant")]
    SavingsModeNotOffered { mode: SavingsMode, variant: Variant },
    #[error("the {0} variant has no residual projection")]
    ProjectionUnavailable(Variant),
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeadError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid POCKET_LISTEN_ADDR '{value}': {source}")]
    ListenAddr {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid POCKET_VARIANT: {0}")]
    Variant(#[from] InputError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Lead(#[from] LeadError),
    #[error("{}", .0.body_text())]
    Json(#[from] JsonRejection),
    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Input(_) | ApiError::Lead(_) => StatusCode::BAD_REQUEST,
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (
            status,
            [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
            body,
        )
            .into_response()
    }
}
