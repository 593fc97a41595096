//! Named Spotify operations the swipe UI is built from.
//!
//! Every action takes the credential explicitly, composes one or more
//! [`SpotifyClient::fetch`] calls and shapes the JSON into [`crate::clients::entities`] types.

use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::clients::{
    RequestOptions, SpotifyClient,
    entities::{AccessCredential, PlaylistRef, Track},
    errors::{Error, Result},
};

/// Genres used when a recommendation has no seed of its own
pub const DEFAULT_SEED_GENRES: &str = "pop,rock,hip-hop,electronic";

#[derive(Deserialize)]
struct Paging<T> {
    items: Vec<T>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Paging<Track>,
}

#[derive(Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Deserialize)]
struct CurrentUser {
    id: String,
}

#[derive(Deserialize)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Deserialize)]
struct GenreSeeds {
    genres: Vec<String>,
}

/// Recommendation endpoint for the given seeds.
///
/// A non-empty seed track wins over genres; with neither, [`DEFAULT_SEED_GENRES`] is used.
pub fn recommendation_path(seed_track: Option<&str>, seed_genres: &[String]) -> String {
    let mut endpoint = String::from("/recommendations?limit=1");
    match seed_track.filter(|id| !id.is_empty()) {
        Some(track_id) => {
            endpoint.push_str("&seed_tracks=");
            endpoint.push_str(&urlencoding::encode(track_id));
        }
        None if !seed_genres.is_empty() => {
            // each genre encoded on its own, the separating commas stay literal
            let genres: Vec<_> = seed_genres
                .iter()
                .map(|genre| urlencoding::encode(genre))
                .collect();
            endpoint.push_str("&seed_genres=");
            endpoint.push_str(&genres.join(","));
        }
        None => {
            endpoint.push_str("&seed_genres=");
            endpoint.push_str(DEFAULT_SEED_GENRES);
        }
    }
    endpoint
}

// Ids are single path segments, a `/` or `..` in one must not escape it
fn playlist_tracks_path(playlist_id: &str) -> String {
    format!("/playlists/{}/tracks", urlencoding::encode(playlist_id))
}

impl SpotifyClient {
    pub async fn search_tracks(
        &self,
        credential: &AccessCredential,
        query: &str,
    ) -> Result<Vec<Track>> {
        let endpoint = format!("/search?type=track&q={}", urlencoding::encode(query));
        let data = self.fetch(&endpoint, credential, RequestOptions::get()).await?;
        let response: SearchResponse = serde_json::from_value(data)?;
        debug!("Search {query:?} returned {} tracks", response.tracks.items.len());
        Ok(response.tracks.items)
    }

    pub async fn get_top_tracks(&self, credential: &AccessCredential) -> Result<Vec<Track>> {
        let data = self
            .fetch("/me/top/tracks", credential, RequestOptions::get())
            .await
            .inspect_err(|e| error!("Error fetching top tracks: {e}"))?;
        let page: Paging<Track> = serde_json::from_value(data)?;
        Ok(page.items)
    }

    /// First recommended track for the given seeds.
    ///
    /// Rate limit exhaustion is reported as [`Error::RecommendationRateLimited`];
    /// other failures propagate unchanged.
    pub async fn get_recommendation(
        &self,
        credential: &AccessCredential,
        seed_track: Option<&str>,
        seed_genres: &[String],
    ) -> Result<Track> {
        let endpoint = recommendation_path(seed_track, seed_genres);
        let data = match self.fetch(&endpoint, credential, RequestOptions::get()).await {
            Ok(data) => data,
            Err(Error::RateLimitExhausted) => {
                error!("Error getting recommendation: rate limit retries exhausted");
                return Err(Error::RecommendationRateLimited);
            }
            Err(e) => {
                error!("Error getting recommendation: {e}");
                return Err(e);
            }
        };

        let response: RecommendationsResponse = serde_json::from_value(data)?;
        response
            .tracks
            .into_iter()
            .next()
            .ok_or(Error::EmptyRecommendation)
    }

    pub async fn save_track(
        &self,
        credential: &AccessCredential,
        track_id: &str,
        playlist_id: &str,
    ) -> Result<()> {
        let endpoint = playlist_tracks_path(playlist_id);
        let body = json!({ "uris": [format!("spotify:track:{track_id}")] });
        self.fetch(&endpoint, credential, RequestOptions::post(body))
            .await?;
        debug!("Saved track {track_id} to playlist {playlist_id}");
        Ok(())
    }

    /// Spotify id of the user the credential belongs to
    pub async fn current_user_id(&self, credential: &AccessCredential) -> Result<String> {
        let data = self.fetch("/me", credential, RequestOptions::get()).await?;
        let user: CurrentUser = serde_json::from_value(data)?;
        Ok(user.id)
    }

    /// Creates a private playlist owned by the signed-in user
    pub async fn create_playlist(
        &self,
        credential: &AccessCredential,
        name: &str,
    ) -> Result<PlaylistRef> {
        let user_id = self.current_user_id(credential).await?;

        let endpoint = format!("/users/{}/playlists", urlencoding::encode(&user_id));
        let body = json!({ "name": name, "public": false });
        let created: CreatedPlaylist = serde_json::from_value(
            self.fetch(&endpoint, credential, RequestOptions::post(body))
                .await?,
        )?;

        info!("Created playlist {} for user {user_id}", created.id);
        Ok(PlaylistRef { id: created.id })
    }

    /// Best-effort pause used on teardown, failures are only logged
    pub async fn stop_playback(&self, credential: &AccessCredential) {
        if let Err(e) = self
            .fetch("/me/player/pause", credential, RequestOptions::put(None))
            .await
        {
            warn!("Error stopping playback: {e}");
        }
    }

    pub async fn get_available_genres(&self, credential: &AccessCredential) -> Result<Vec<String>> {
        let data = self
            .fetch(
                "/recommendations/available-genre-seeds",
                credential,
                RequestOptions::get(),
            )
            .await
            .inspect_err(|e| error!("Error fetching available genres: {e}"))?;
        let seeds: GenreSeeds = serde_json::from_value(data)?;
        Ok(seeds.genres)
    }

    /// Starts `uri` on the browser player registered as `device_id`
    pub async fn play_track(
        &self,
        credential: &AccessCredential,
        device_id: &str,
        uri: &str,
    ) -> Result<()> {
        let endpoint = format!(
            "/me/player/play?device_id={}",
            urlencoding::encode(device_id)
        );
        let body = json!({ "uris": [uri] });
        self.fetch(&endpoint, credential, RequestOptions::put(Some(body)))
            .await?;
        debug!("Playing {uri} on device {device_id}");
        Ok(())
    }
}
