//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use tindify::clients::{RetryPolicy, SpotifyClient, entities::AccessCredential};
use wiremock::MockServer;

pub const TOKEN: &str = "test-access-token";

pub fn credential() -> AccessCredential {
    AccessCredential::new(TOKEN, Some("test-refresh-token".into())).unwrap()
}

/// Same attempt budget as production, millisecond backoff
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    }
}

pub fn client_for(server: &MockServer) -> SpotifyClient {
    SpotifyClient::new(server.uri(), fast_retry()).unwrap()
}

pub fn track_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Track {id}"),
        "artists": [{"id": "artist-1", "name": "Daft Punk"}],
        "album": {
            "id": "album-1",
            "name": "Discovery",
            "images": [{"url": "https://i.scdn.co/image/cover", "height": 640, "width": 640}]
        },
        "preview_url": format!("https://p.scdn.co/mp3-preview/{id}"),
        "uri": format!("spotify:track:{id}")
    })
}
