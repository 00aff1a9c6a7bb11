use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Please log in to send a donation")]
    NotAuthenticated,

    #[error("Amount must be a number greater than zero")]
    InvalidAmount,

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Donations are currently disabled")]
    DonationsDisabled,

    #[error("A preview is already playing")]
    PreviewBusy,

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Queue store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Failures of the shared queue store and its persistence backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Persisted queue under {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize queue: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Queue changed concurrently after {attempts} attempts")]
    Conflict { attempts: u32 },
}

/// Failures reported by a speech synthesizer (the `onError` path).
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Failed to start speech engine {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Speech engine failed: {0}")]
    Engine(String),

    #[error("Speech cancelled")]
    Cancelled,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let (status_code, error_code) = match self {
            AppError::NotAuthenticated => {
                log::warn!("Donation rejected: not authenticated");
                (actix_web::http::StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED")
            }
            AppError::InvalidAmount => (actix_web::http::StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            AppError::EmptyMessage => (actix_web::http::StatusCode::BAD_REQUEST, "EMPTY_MESSAGE"),
            AppError::DonationsDisabled => {
                (actix_web::http::StatusCode::FORBIDDEN, "DONATIONS_DISABLED")
            }
            AppError::PreviewBusy => {
                (actix_web::http::StatusCode::TOO_MANY_REQUESTS, "PREVIEW_BUSY")
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (actix_web::http::StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            AppError::JwtError(err) => {
                log::warn!("JWT error: {err}");
                (actix_web::http::StatusCode::UNAUTHORIZED, "AUTH_ERROR")
            }
            AppError::StoreError(err) => {
                log::error!("Queue store error: {err}");
                return internal_response("STORE_ERROR", "Queue store error");
            }
            AppError::InternalError(_) => {
                log::error!("Internal error: {self}");
                return internal_response("INTERNAL_ERROR", "Internal server error");
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

fn internal_response(code: &str, message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": {
            "code": code,
            "message": message
        }
    }))
}
