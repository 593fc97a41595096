use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::clients::{TokenStore, entities::AccessCredential};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Holds the `state` of a sign-in attempt between login and callback
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Token store over the cookies of one incoming request
#[derive(Debug, Default)]
pub struct CookieTokenStore {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl CookieTokenStore {
    pub fn from_jar(jar: &CookieJar) -> Self {
        CookieTokenStore {
            access_token: jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()),
            refresh_token: jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()),
        }
    }
}

impl TokenStore for CookieTokenStore {
    fn get(&self) -> Option<AccessCredential> {
        let access_token = self.access_token.clone()?;
        AccessCredential::new(access_token, self.refresh_token.clone())
    }
}

fn http_only(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn expired(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = http_only(name, String::new(), secure);
    cookie.make_removal();
    cookie
}

/// Stores the credential for later requests
pub fn store_credential(jar: CookieJar, credential: &AccessCredential, secure: bool) -> CookieJar {
    let jar = jar.add(http_only(
        ACCESS_TOKEN_COOKIE,
        credential.bearer().to_string(),
        secure,
    ));
    match &credential.refresh_token {
        Some(refresh_token) => jar.add(http_only(
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            secure,
        )),
        None => jar,
    }
}

/// Expires both credential cookies, whether the browser sent them or not
pub fn clear_credential(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired(ACCESS_TOKEN_COOKIE, secure))
        .add(expired(REFRESH_TOKEN_COOKIE, secure))
}

pub fn store_oauth_state(jar: CookieJar, state: String, secure: bool) -> CookieJar {
    jar.add(http_only(OAUTH_STATE_COOKIE, state, secure))
}

/// Reads the pending sign-in state and expires it; a state is good for one callback
pub fn take_oauth_state(jar: CookieJar, secure: bool) -> (CookieJar, Option<String>) {
    let Some(state) = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let jar = jar.add(expired(OAUTH_STATE_COOKIE, secure));
    (jar, Some(state).filter(|state| !state.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{errors::Error, require_credential};
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

    fn jar(cookie: &'static str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn reads_credential_from_cookie_header() {
        let store = CookieTokenStore::from_jar(&jar("theme=dark; access_token=abc; refresh_token=def"));
        let credential = require_credential(&store).unwrap();
        assert_eq!(credential.bearer(), "abc");
        assert_eq!(credential.refresh_token.as_deref(), Some("def"));
    }

    #[test]
    fn signed_out_cookie_is_no_credential() {
        let store = CookieTokenStore::from_jar(&jar("access_token=; refresh_token="));
        assert!(matches!(require_credential(&store), Err(Error::NoCredential)));

        let store = CookieTokenStore::from_jar(&CookieJar::new());
        assert!(matches!(require_credential(&store), Err(Error::NoCredential)));
    }

    #[test]
    fn cookie_names_match_exactly() {
        let store = CookieTokenStore::from_jar(&jar("old_access_token=zzz"));
        assert!(store.get().is_none());
    }

    #[test]
    fn credential_cookies_are_http_only() {
        let credential = AccessCredential::new("abc", Some("def".into())).unwrap();
        let jar = store_credential(CookieJar::new(), &credential, true);

        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        let refresh = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), "abc");
        assert_eq!(refresh.value(), "def");
        for cookie in [access, refresh] {
            assert_eq!(cookie.http_only(), Some(true));
            assert_eq!(cookie.secure(), Some(true));
            assert_eq!(cookie.path(), Some("/"));
        }
    }

    #[test]
    fn cleared_cookies_expire_both() {
        let jar = clear_credential(CookieJar::new(), false);
        for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
            let cookie = jar.get(name).unwrap().to_string();
            assert!(cookie.contains("Max-Age=0"));
            assert!(!cookie.contains("Secure"));
        }
    }

    #[test]
    fn oauth_state_is_taken_once() {
        let (jar, state) = take_oauth_state(jar("oauth_state=xyz"), false);
        assert_eq!(state.as_deref(), Some("xyz"));
        assert!(jar.get(OAUTH_STATE_COOKIE).unwrap().to_string().contains("Max-Age=0"));

        let (_, state) = take_oauth_state(CookieJar::new(), false);
        assert_eq!(state, None);
    }
}
