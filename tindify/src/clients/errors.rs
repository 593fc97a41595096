use rspotify::ClientError;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No access token found")]
    NoCredential,

    #[error("Spotify API error: {status}. {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Max retries reached. Unable to complete the request.")]
    RateLimitExhausted,

    #[error("No tracks returned from recommendation")]
    EmptyRecommendation,

    // User-facing rewrite of RateLimitExhausted at the recommendation boundary
    #[error(
        "Unable to get track recommendation due to rate limiting. Please try again later."
    )]
    RecommendationRateLimited,

    #[error("Player {0} has no ready device")]
    PlayerNotReady(String),

    #[error("Too many players are registered. Please try again later.")]
    PlayerLimitReached,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("HTTP transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Spotify authorization error: {0}")]
    SpotifyAuthError(#[from] ClientError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl Error {
    /// True for errors caused by Spotify rate limiting, whatever the boundary that reported them.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Error::RateLimitExhausted | Error::RecommendationRateLimited
        )
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}
