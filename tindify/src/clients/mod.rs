/// Spotify authorization code flow
pub mod auth;
/// Track, album, artist and credential records
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Resilient Spotify Web API client
pub mod spotify;
/// Credential lookup for actions
pub mod token_store;

pub use auth::SpotifyAuth;
pub use spotify::{RequestOptions, RetryPolicy, SpotifyClient};
pub use token_store::{TokenStore, require_credential};
