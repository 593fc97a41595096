use crate::clients::{
    entities::AccessCredential,
    errors::{Error, Result},
};

/// Where the current user's credential lives (cookies, environment, ...).
///
/// Actions never read it themselves; adapters resolve the credential once
/// with [`require_credential`] and pass it down explicitly.
pub trait TokenStore {
    fn get(&self) -> Option<AccessCredential>;
}

impl TokenStore for Option<AccessCredential> {
    fn get(&self) -> Option<AccessCredential> {
        self.clone()
    }
}

/// Reads the credential from an environment variable on every lookup
pub struct EnvTokenStore {
    var: String,
}

impl EnvTokenStore {
    pub fn new(var: impl Into<String>) -> Self {
        EnvTokenStore { var: var.into() }
    }
}

impl TokenStore for EnvTokenStore {
    fn get(&self) -> Option<AccessCredential> {
        std::env::var(&self.var)
            .ok()
            .and_then(|token| AccessCredential::new(token, None))
    }
}

pub fn require_credential<S: TokenStore + ?Sized>(store: &S) -> Result<AccessCredential> {
    store.get().ok_or(Error::NoCredential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_reported() {
        let store: Option<AccessCredential> = None;
        assert!(matches!(require_credential(&store), Err(Error::NoCredential)));
    }

    #[test]
    fn present_credential_is_returned() {
        let store = AccessCredential::new("tok", None);
        assert_eq!(require_credential(&store).unwrap().bearer(), "tok");
    }

    #[test]
    fn unset_env_var_is_no_credential() {
        let store = EnvTokenStore::new("TINDIFY_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(matches!(require_credential(&store), Err(Error::NoCredential)));
    }
}
