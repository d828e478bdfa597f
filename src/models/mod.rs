// timegate-service/src/models/mod.rs
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::json;

// Team record module
pub mod team;
pub use team::*;

// Submission and response envelopes
pub mod submission;
pub use submission::*;

// JWT claims structure issued by the identity provider
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued at
}

// Custom error types
#[derive(Debug, Display)]
pub enum ServiceError {
    #[display(fmt = "Internal Server Error")]
    InternalServerError,
    #[display(fmt = "BadRequest: {}", _0)]
    BadRequest(String),
    #[display(fmt = "Unauthorized")]
    Unauthorized,
    #[display(fmt = "Your email is not registered in any team. Please contact organizers.")]
    NotRegistered,
    #[display(fmt = "Team directory unavailable: {}", _0)]
    DirectoryUnavailable(String),
    #[display(fmt = "Missing answers for {:?}", _0)]
    IncompleteAnswers(Vec<String>),
    #[display(fmt = "Team is already closed ({})", _0)]
    AlreadyClosed(TeamStatus),
    #[display(fmt = "The team timer has not been started yet")]
    TimerNotStarted,
    #[display(fmt = "Team record is corrupt: {}", _0)]
    CorruptRecord(String),
}

impl ServiceError {
    // Stable reason code returned to callers
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::InternalServerError => "INTERNAL_ERROR",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Unauthorized => "UNAUTHORIZED",
            ServiceError::NotRegistered => "NOT_REGISTERED",
            ServiceError::DirectoryUnavailable(_) => "DIRECTORY_UNAVAILABLE",
            ServiceError::IncompleteAnswers(_) => "INCOMPLETE_ANSWERS",
            ServiceError::AlreadyClosed(_) => "ALREADY_CLOSED",
            ServiceError::TimerNotStarted => "TIMER_NOT_STARTED",
            ServiceError::CorruptRecord(_) => "CORRUPT_RECORD",
        }
    }
}

impl std::error::Error for ServiceError {}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InternalServerError | ServiceError::CorruptRecord(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::NotRegistered => StatusCode::NOT_FOUND,
            ServiceError::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::IncompleteAnswers(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::AlreadyClosed(_) | ServiceError::TimerNotStarted => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "success": false,
            "reason": self.reason(),
            "message": self.to_string(),
        });

        match self {
            ServiceError::IncompleteAnswers(missing) => body["missing"] = json!(missing),
            ServiceError::AlreadyClosed(status) => body["status"] = json!(status),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}
