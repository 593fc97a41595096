use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clients::{
    SpotifyClient,
    entities::{AccessCredential, PlaylistRef, Track},
    errors::Result,
};

/// Playlist name used when a session is started without one
pub const DEFAULT_PLAYLIST_NAME: &str = "My Spotify Tinder Playlist";

/// How a swipe session picks its playlist and recommendations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeOptions {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub seed_track: Option<String>,
    #[serde(default)]
    pub seed_genres: Vec<String>,
}

/// One round of swiping: the playlist liked tracks go to and the track on screen.
///
/// The session is plain data so the browser can hold it between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeSession {
    pub playlist: PlaylistRef,
    pub current: Track,
    #[serde(default)]
    pub seed_track: Option<String>,
    #[serde(default)]
    pub seed_genres: Vec<String>,
}

impl SwipeSession {
    /// Creates the session playlist, then fetches the first recommendation
    pub async fn start(
        client: &SpotifyClient,
        credential: &AccessCredential,
        options: SwipeOptions,
    ) -> Result<Self> {
        let name = options.name.as_deref().unwrap_or(DEFAULT_PLAYLIST_NAME);
        let playlist = client.create_playlist(credential, name).await?;
        let current = client
            .get_recommendation(
                credential,
                options.seed_track.as_deref(),
                &options.seed_genres,
            )
            .await?;

        info!("Swipe session started with playlist {}", playlist.id);
        Ok(SwipeSession {
            playlist,
            current,
            seed_track: options.seed_track,
            seed_genres: options.seed_genres,
        })
    }

    /// Saves the current track into the session playlist and moves on
    pub async fn like(
        &mut self,
        client: &SpotifyClient,
        credential: &AccessCredential,
    ) -> Result<&Track> {
        client
            .save_track(credential, &self.current.id, &self.playlist.id)
            .await?;
        debug!("Liked {} ({})", self.current.name, self.current.id);
        self.advance(client, credential).await
    }

    pub async fn pass(
        &mut self,
        client: &SpotifyClient,
        credential: &AccessCredential,
    ) -> Result<&Track> {
        debug!("Passed on {} ({})", self.current.name, self.current.id);
        self.advance(client, credential).await
    }

    // Teardown, never fails
    pub async fn finish(&self, client: &SpotifyClient, credential: &AccessCredential) {
        client.stop_playback(credential).await;
        info!("Swipe session for playlist {} finished", self.playlist.id);
    }

    async fn advance(
        &mut self,
        client: &SpotifyClient,
        credential: &AccessCredential,
    ) -> Result<&Track> {
        let next = client
            .get_recommendation(credential, self.seed_track.as_deref(), &self.seed_genres)
            .await?;
        self.current = next;
        Ok(&self.current)
    }
}
