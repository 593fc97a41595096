use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde_json::json;

use crate::clients::errors::Error;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NoCredential => StatusCode::UNAUTHORIZED,
            Error::UpstreamError { .. }
            | Error::HttpError(_)
            | Error::DeserializationError(_)
            | Error::SpotifyAuthError(_) => StatusCode::BAD_GATEWAY,
            Error::RateLimitExhausted
            | Error::RecommendationRateLimited
            | Error::PlayerLimitReached => StatusCode::SERVICE_UNAVAILABLE,
            Error::EmptyRecommendation => StatusCode::NOT_FOUND,
            Error::PlayerNotReady(_) => StatusCode::CONFLICT,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_rate_limited() {
            warn!("Request gave up on Spotify rate limiting: {self}");
        } else if status.is_server_error() {
            error!("Request failed with {status}: {self}");
        }
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
