use std::time::Duration;

use log::{debug, error, warn};
use reqwest::{
    Client, Method, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use serde_json::Value;

use crate::clients::{
    entities::AccessCredential,
    errors::{Error, Result},
};

/// Base URL of the Spotify Web API, every endpoint path is appended to it
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// How the client reacts to `429 Too Many Requests`.
///
/// The wait before the next attempt is the server's `Retry-After` hint when it
/// parses, otherwise `base_delay * 2^attempt` with `attempt` counted from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after the given (zero based) rate limited attempt
    pub fn delay_for(&self, attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
        retry_after
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or_else(
                || {
                    self.base_delay
                        .saturating_mul(2u32.saturating_pow(attempt))
                },
                Duration::from_secs,
            )
    }
}

/// Method, body and extra headers of a single Spotify call. Defaults to a bare GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    body: Option<Value>,
    headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        RequestOptions {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn put(body: Option<Value>) -> Self {
        RequestOptions {
            method: Method::PUT,
            body,
            ..Self::default()
        }
    }

    /// Extra header; Authorization and Content-Type are always overridden by the client
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

pub struct SpotifyClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl SpotifyClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("tindify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(SpotifyClient {
            http,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Performs one Spotify API call, absorbing rate limiting.
    ///
    /// Returns the parsed JSON body of the first 2xx response (`null` for an
    /// empty body). Any other non-2xx status fails right away with
    /// [`Error::UpstreamError`]; running out of attempts on 429 fails with
    /// [`Error::RateLimitExhausted`].
    pub async fn fetch(
        &self,
        endpoint: &str,
        credential: &AccessCredential,
        options: RequestOptions,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Fetching from Spotify: {} {url}", options.method);

        let headers = Self::request_headers(credential, &options)?;

        for attempt in 0..self.retry.max_attempts {
            let mut request = self
                .http
                .request(options.method.clone(), &url)
                .headers(headers.clone());
            if let Some(body) = &options.body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = self
                    .retry
                    .delay_for(attempt, response.headers().get(RETRY_AFTER));
                warn!(
                    "Rate limited on attempt {}/{}. Retrying after {}ms",
                    attempt + 1,
                    self.retry.max_attempts,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
            } else if !status.is_success() {
                let body = response.text().await?;
                error!("Spotify API error: {status} for {url}. Error body: {body}");
                return Err(Error::UpstreamError {
                    status: status.as_u16(),
                    body,
                });
            } else {
                let bytes = response.bytes().await?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Value::Null);
                }
                return Ok(serde_json::from_slice(&bytes)?);
            }
        }

        Err(Error::RateLimitExhausted)
    }

    fn request_headers(
        credential: &AccessCredential,
        options: &RequestOptions,
    ) -> Result<HeaderMap> {
        let mut headers = options.headers.clone();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.bearer()))
            .map_err(|e| Error::BadRequest(format!("access token is not a valid header: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}
