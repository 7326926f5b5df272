use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::NotFound(_) => AppError::NotFound(message),
            DomainError::StaleVersion { .. } | DomainError::LimitRace | DomainError::CartStale(_) => {
                log::info!("Conflict: {}", message);
                AppError::Conflict(message)
            }
            DomainError::IllegalTransition { .. } | DomainError::OrderTerminal(_) => {
                AppError::Unprocessable(message)
            }
            DomainError::InvalidInput(_)
            | DomainError::InvalidQuantity
            | DomainError::ItemUnavailable(_)
            | DomainError::CartEmpty
            | DomainError::Promo(_) => AppError::BadRequest(message),
            DomainError::Internal(detail) => {
                log::error!("Storage failure: {}", detail);
                AppError::Internal(detail)
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
