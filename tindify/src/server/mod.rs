//! JSON API the swipe UI talks to.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post, put},
};
use log::info;

use crate::{
    clients::{SpotifyAuth, SpotifyClient, errors::Result},
    config::Config,
    playback::PlayerRegistry,
};

/// Cookie helpers and the cookie backed token store
pub mod cookies;
mod error;
/// Request handlers
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub spotify: Arc<SpotifyClient>,
    pub auth: Arc<SpotifyAuth>,
    pub players: PlayerRegistry,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(spotify: SpotifyClient, auth: SpotifyAuth, secure_cookies: bool) -> Self {
        AppState {
            spotify: Arc::new(spotify),
            auth: Arc::new(auth),
            players: PlayerRegistry::default(),
            secure_cookies,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.api.client()?,
            config.oauth.auth(),
            config.secure_cookies,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", get(routes::login))
        .route("/callback", get(routes::callback))
        .route("/signout", post(routes::signout));

    let api_routes = Router::new()
        .route("/search", get(routes::search))
        .route("/top-tracks", get(routes::top_tracks))
        .route("/recommendation", get(routes::recommendation))
        .route("/genres", get(routes::genres))
        .route("/playlists", post(routes::create_playlist))
        .route("/playlists/{id}/tracks", post(routes::save_track))
        .route("/player/pause", put(routes::pause))
        .route("/player/{player}/events", post(routes::player_event))
        .route("/player/{player}/play", post(routes::play))
        .route("/swipe/start", post(routes::swipe_start))
        .route("/swipe/like", post(routes::swipe_like))
        .route("/swipe/pass", post(routes::swipe_pass))
        .route("/swipe/finish", post(routes::swipe_finish))
        .nest("/auth", auth_routes);

    Router::new().nest("/api", api_routes).with_state(state)
}

pub async fn serve(config: &Config, bind: SocketAddr) -> Result<()> {
    let state = AppState::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Tindify listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
