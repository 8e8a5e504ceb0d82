use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use into_the_wild_registration::RegistrationError;
use serde_json::json;
use tracing::warn;

/// What a handler can fail with. Workflow refusals carry their own
/// taxonomy; `Validation` covers malformed requests the workflow never
/// sees.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Workflow(#[from] RegistrationError),
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Workflow(error) => match error {
                RegistrationError::AuthRequired => StatusCode::UNAUTHORIZED,
                RegistrationError::IndemnityRequired
                | RegistrationError::MissingContactDetails => StatusCode::UNPROCESSABLE_ENTITY,
                RegistrationError::TrekNotLoaded | RegistrationError::NotFound => {
                    StatusCode::NOT_FOUND
                }
                RegistrationError::MissingApprovedId(_) => StatusCode::FORBIDDEN,
                RegistrationError::TrekFull
                | RegistrationError::AlreadyRegistered
                | RegistrationError::UpdateFailed(_)
                | RegistrationError::TentsUnavailable => StatusCode::CONFLICT,
                RegistrationError::RequirementCheckFailed(_)
                | RegistrationError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
                RegistrationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn log_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Workflow(error) => error.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Codes stay in the logs; clients only get the message.
        warn!(code = self.log_code(), %status, "request failed: {self}");
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
