use log::{debug, info};
use rand::{Rng, distr::Alphanumeric};
use rspotify::{AuthCodeSpotify, Credentials, OAuth, prelude::*, scopes};

use crate::clients::{
    entities::AccessCredential,
    errors::{Error, Result},
};

const STATE_LEN: usize = 32;

/// Authorization code flow against accounts.spotify.com.
///
/// Holds only the app credentials; every code exchange runs on its own
/// rspotify client so concurrent logins never share token state.
pub struct SpotifyAuth {
    credentials: Credentials,
    oauth: OAuth,
}

impl SpotifyAuth {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        let credentials = Credentials::new(client_id, client_secret);
        let oauth = OAuth {
            redirect_uri: redirect_uri.to_string(),
            scopes: scopes!(
                "ugc-image-upload",
                "user-read-private",
                "user-read-email",
                "playlist-modify-private",
                "playlist-modify-public",
                "playlist-read-private",
                "playlist-read-collaborative",
                "user-follow-modify",
                "user-follow-read",
                "user-read-playback-position",
                "user-top-read",
                "user-read-recently-played",
                "user-library-modify",
                "user-library-read",
                "user-read-playback-state",
                "user-modify-playback-state",
                "user-read-currently-playing",
                "app-remote-control",
                "streaming"
            ),
            ..Default::default()
        };
        SpotifyAuth { credentials, oauth }
    }

    fn spotify(&self) -> AuthCodeSpotify {
        AuthCodeSpotify::new(self.credentials.clone(), self.oauth.clone())
    }

    /// Authorize URL for one sign-in attempt, with the `state` it carries.
    ///
    /// The callback must present the same state, so it is stored on the browser
    /// until then.
    pub fn authorize(&self) -> Result<(String, String)> {
        let state: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();
        let oauth = OAuth {
            state: state.clone(),
            ..self.oauth.clone()
        };
        let url = AuthCodeSpotify::new(self.credentials.clone(), oauth).get_authorize_url(false)?;
        Ok((url, state))
    }

    /// Exchanges the callback `code` for an access credential
    pub async fn exchange_code(&self, code: &str) -> Result<AccessCredential> {
        debug!("Exchanging Spotify authorization code ...");
        let spotify = self.spotify();
        spotify.request_token(code).await?;

        let token = spotify
            .token
            .lock()
            .await
            .map_err(|_| Error::ConfigurationError("Spotify token lock is unavailable".into()))?
            .take();

        let credential = token
            .and_then(|t| AccessCredential::new(t.access_token, t.refresh_token))
            .ok_or(Error::NoCredential)?;
        info!("Spotify authorization completed");
        Ok(credential)
    }
}
