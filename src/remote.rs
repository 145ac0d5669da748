//! Authenticated remote URLs.
//!
//! The release token is carried as a [`Secret`] and only turned back into
//! plain text when the URL is handed to git. Formatting a [`RemoteUrl`] for
//! logs or errors always redacts the credential.

use crate::layout::RepositoryIdentity;
use std::fmt;

/// Placeholder printed in place of secret values.
pub const REDACTED: &str = "<redacted>";

/// A credential that never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the plain secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of the secret (raw or URL-encoded) in
    /// `text` with [`REDACTED`].
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_owned();
        }
        let encoded = encode_userinfo(&self.0);
        text.replace(&self.0, REDACTED).replace(&encoded, REDACTED)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&REDACTED).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// An `https` remote URL whose user-info embeds an account and token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteUrl {
    host: String,
    path: String,
    account: String,
    token: Secret,
}

impl RemoteUrl {
    /// Builds the authenticated push URL for `identity`.
    #[must_use]
    pub fn authenticated(identity: &RepositoryIdentity, token: Secret) -> Self {
        Self {
            host: identity.host.clone(),
            path: identity.slug(),
            account: identity.account.clone(),
            token,
        }
    }

    /// Returns the credential embedded in the URL.
    #[must_use]
    pub const fn token(&self) -> &Secret {
        &self.token
    }

    /// Returns the full URL including the plain-text token.
    ///
    /// Only pass the result straight to the collaborator that needs it.
    #[must_use]
    pub fn expose(&self) -> String {
        self.render(&encode_userinfo(self.token.expose()))
    }

    fn render(&self, token: &str) -> String {
        format!(
            "https://{}:{token}@{}/{}",
            encode_userinfo(&self.account),
            self.host,
            self.path
        )
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(REDACTED))
    }
}

/// Percent-encodes a URL user-info component, leaving RFC 3986 unreserved
/// characters untouched.
fn encode_userinfo(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
