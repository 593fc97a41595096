use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    // Spotify sends null dimensions for some user-uploaded images
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<Artist>,
    pub album: Album,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub uri: String,
}

impl Track {
    /// Comma separated artist names, the way the swipe card shows them
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Largest cover image, Spotify lists them widest first
    pub fn cover(&self) -> Option<&Image> {
        self.album.images.first()
    }
}

/// Identifier of a playlist created for the current swipe session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
}

/// Bearer credential obtained from the authorization handshake.
///
/// Never refreshed by this crate; an expired token shows up as a 401 from Spotify.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl AccessCredential {
    /// Builds a credential, treating an empty access token as no credential at all.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Option<Self> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return None;
        }
        Some(AccessCredential {
            access_token,
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn bearer(&self) -> &str {
        &self.access_token
    }
}

// Tokens must not end up in logs
impl std::fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
