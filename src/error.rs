use actix_web::{body, http::{self, StatusCode}, HttpResponse};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PayrollError {
    /// Malformed or logically impossible input
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// Conflict class, but reported as a bad request
    #[error("Cannot delete a PAID period")]
    PaidPeriod,

    #[error("internal server error")]
    Internal(#[from] DbErr),
}

impl PayrollError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl actix_web::error::ResponseError for PayrollError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        if let PayrollError::Internal(source) = self {
            error!(error = %source, "payroll engine persistence failure");
        }

        HttpResponse::build(self.status_code())
            .json(serde_json::json!({
                "message": self.to_string(),
            }))
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            PayrollError::Validation(_) => StatusCode::BAD_REQUEST,
            PayrollError::NotFound(_) => StatusCode::NOT_FOUND,
            PayrollError::Conflict(_) => StatusCode::CONFLICT,
            PayrollError::PaidPeriod => StatusCode::BAD_REQUEST,
            PayrollError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
