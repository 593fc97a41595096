use std::time::Duration;

use log::debug;

use crate::clients::{
    SpotifyAuth, SpotifyClient,
    errors::{Error, Result},
    spotify::{DEFAULT_API_BASE_URL, RetryPolicy},
};

/// Where Spotify API calls go and how they retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub retry: RetryPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `SPOTIFY_API_BASE_URL`, `TINDIFY_MAX_ATTEMPTS` and `TINDIFY_BASE_DELAY_MS`
    pub fn from_env() -> Result<Self> {
        let mut config = ApiConfig::default();
        if let Ok(base_url) = std::env::var("SPOTIFY_API_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(max_attempts) = optional_number("TINDIFY_MAX_ATTEMPTS")? {
            config.retry.max_attempts = u32::try_from(max_attempts).map_err(|_| {
                Error::ConfigurationError("TINDIFY_MAX_ATTEMPTS is too large".into())
            })?;
        }
        if let Some(delay_ms) = optional_number("TINDIFY_BASE_DELAY_MS")? {
            config.retry.base_delay = Duration::from_millis(delay_ms);
        }
        config.validate()?;
        Ok(config)
    }

    /// A client with no attempts would fail every call without sending it
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(Error::ConfigurationError(
                "TINDIFY_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn client(&self) -> Result<SpotifyClient> {
        SpotifyClient::new(self.base_url.clone(), self.retry)
    }
}

/// Spotify app registration used by the authorization handshake
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl OAuthConfig {
    pub fn auth(&self) -> SpotifyAuth {
        SpotifyAuth::new(&self.client_id, &self.client_secret, &self.redirect_uri)
    }
}

// Configuration for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api: ApiConfig,
    pub oauth: OAuthConfig,
    pub secure_cookies: bool,
}

pub struct ConfigBuilder {
    api: Option<ApiConfig>,
    oauth: Option<OAuthConfig>,
    secure_cookies: Option<bool>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            api: None,
            oauth: None,
            secure_cookies: None, // Secure cookies unless explicitly disabled for local http
        }
    }

    #[must_use]
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    #[must_use]
    pub fn oauth(mut self, oauth: OAuthConfig) -> Self {
        self.oauth = Some(oauth);
        self
    }

    #[must_use]
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = Some(secure);
        self
    }

    /// Fills every unset part from the environment
    pub fn build(self) -> Result<Config> {
        let api = match self.api {
            Some(api) => api,
            None => ApiConfig::from_env()?,
        };
        api.validate()?;
        let oauth = match self.oauth {
            Some(oauth) => oauth,
            None => OAuthConfig {
                client_id: required("SPOTIFY_CLIENT_ID")?,
                client_secret: required("SPOTIFY_CLIENT_SECRET")?,
                redirect_uri: required("SPOTIFY_REDIRECT_URI")?,
            },
        };
        let config = Config {
            api,
            oauth,
            secure_cookies: self.secure_cookies.unwrap_or(true),
        };
        debug!("Built config: {config:?}");
        Ok(config)
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|e| {
        Error::ConfigurationError(format!(
            "{name}: {e}. Set it in the environment or in a .env file"
        ))
    })
}

fn optional_number(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::ConfigurationError(format!("{name}: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
