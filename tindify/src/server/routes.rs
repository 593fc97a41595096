use axum::{
    Json,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    clients::{
        TokenStore,
        entities::{AccessCredential, PlaylistRef, Track},
        errors::{Error, Result},
        require_credential,
    },
    playback::{PlayerEvent, PlayerKey},
    server::{
        AppState,
        cookies::{
            CookieTokenStore, clear_credential, store_credential, store_oauth_state,
            take_oauth_state,
        },
    },
    swipe::{SwipeOptions, SwipeSession},
};

/// Credential of the signed-in user, resolved from the request cookies
pub struct Authenticated(pub AccessCredential);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let jar = CookieJar::from_headers(&parts.headers);
        require_credential(&CookieTokenStore::from_jar(&jar)).map(Authenticated)
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub seed_track: Option<String>,
    // comma separated
    pub seed_genres: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveTrackRequest {
    pub track_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub session: SwipeSession,
}

/// GET /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let (url, oauth_state) = state.auth.authorize()?;
    let jar = store_oauth_state(jar, oauth_state, state.secure_cookies);
    Ok((jar, Redirect::to(&url)))
}

/// GET /api/auth/callback
/// Stores the exchanged tokens as cookies and sends the browser home
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let (jar, expected_state) = take_oauth_state(jar, state.secure_cookies);

    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        info!(
            "Authorization callback without code: {}",
            query.error.as_deref().unwrap_or("no error given")
        );
        return Ok((jar, Redirect::to("/error")).into_response());
    };
    if expected_state.is_none() || query.state != expected_state {
        warn!("Authorization callback with unknown state, not exchanging the code");
        return Ok((jar, Redirect::to("/error")).into_response());
    }

    let credential = state.auth.exchange_code(&code).await?;
    let jar = store_credential(jar, &credential, state.secure_cookies);
    Ok((jar, Redirect::to("/")).into_response())
}

/// POST /api/auth/signout
/// Also forgets the players the session registered
pub async fn signout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    if let Some(credential) = CookieTokenStore::from_jar(&jar).get() {
        let removed = state.players.remove_owner(&credential).await;
        debug!("Sign out dropped {removed} players");
    }
    let jar = clear_credential(jar, state.secure_cookies);
    (jar, Json(json!({ "success": true })))
}

/// GET /api/search?q=
pub async fn search(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Track>>> {
    let tracks = state.spotify.search_tracks(&credential, &query.q).await?;
    Ok(Json(tracks))
}

/// GET /api/top-tracks
pub async fn top_tracks(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
) -> Result<Json<Vec<Track>>> {
    Ok(Json(state.spotify.get_top_tracks(&credential).await?))
}

/// GET /api/recommendation
pub async fn recommendation(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Track>> {
    let seed_genres = split_genres(query.seed_genres.as_deref());
    let track = state
        .spotify
        .get_recommendation(&credential, query.seed_track.as_deref(), &seed_genres)
        .await?;
    Ok(Json(track))
}

/// GET /api/genres
pub async fn genres(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.spotify.get_available_genres(&credential).await?))
}

/// POST /api/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<Json<PlaylistRef>> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest("playlist name must not be empty".into()));
    }
    Ok(Json(state.spotify.create_playlist(&credential, name).await?))
}

/// POST /api/playlists/{id}/tracks
pub async fn save_track(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(playlist_id): Path<String>,
    Json(req): Json<SaveTrackRequest>,
) -> Result<StatusCode> {
    state
        .spotify
        .save_track(&credential, &req.track_id, &playlist_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/player/pause
/// Always succeeds, failures are logged by the action
pub async fn pause(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
) -> StatusCode {
    state.spotify.stop_playback(&credential).await;
    StatusCode::NO_CONTENT
}

/// POST /api/player/{player}/events
pub async fn player_event(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(player): Path<String>,
    Json(event): Json<PlayerEvent>,
) -> Result<StatusCode> {
    if matches!(event, PlayerEvent::Ready { .. }) {
        // only a token Spotify accepts may register a device
        state.spotify.current_user_id(&credential).await?;
    }
    let key = PlayerKey::new(&credential, player);
    state.players.dispatch(&key, event).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/player/{player}/play
pub async fn play(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Path(player): Path<String>,
    Json(req): Json<PlayRequest>,
) -> Result<StatusCode> {
    let bridge = state
        .players
        .get(&PlayerKey::new(&credential, player.clone()))
        .await
        .ok_or(Error::PlayerNotReady(player))?;
    bridge.play(&state.spotify, &credential, &req.uri).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/swipe/start
pub async fn swipe_start(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(options): Json<SwipeOptions>,
) -> Result<Json<SwipeSession>> {
    let session = SwipeSession::start(&state.spotify, &credential, options).await?;
    Ok(Json(session))
}

/// POST /api/swipe/like
pub async fn swipe_like(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(req): Json<SwipeRequest>,
) -> Result<Json<SwipeSession>> {
    let mut session = req.session;
    session.like(&state.spotify, &credential).await?;
    Ok(Json(session))
}

/// POST /api/swipe/pass
pub async fn swipe_pass(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(req): Json<SwipeRequest>,
) -> Result<Json<SwipeSession>> {
    let mut session = req.session;
    session.pass(&state.spotify, &credential).await?;
    debug!("Swipe session now shows {}", session.current.id);
    Ok(Json(session))
}

/// POST /api/swipe/finish
/// Pauses playback, the session itself is dropped by the browser
pub async fn swipe_finish(
    State(state): State<AppState>,
    Authenticated(credential): Authenticated,
    Json(req): Json<SwipeRequest>,
) -> StatusCode {
    req.session.finish(&state.spotify, &credential).await;
    StatusCode::NO_CONTENT
}

fn split_genres(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genres_are_split_and_trimmed() {
        assert_eq!(split_genres(Some("jazz, blues,,")), vec!["jazz", "blues"]);
        assert!(split_genres(Some("")).is_empty());
        assert!(split_genres(None).is_empty());
    }
}
