//! Credentials and authentication mode.
//!
//! A client authenticates either with an account's email and password (HTTP
//! Basic) or with an API client key sent as `X-Gauges-Token`. The variant is
//! picked when the credentials are built, never inferred later.

use std::fmt;

use base64::Engine;
use reqwest::header::AUTHORIZATION;

use crate::error::Error;
use crate::secret::{self, Lookup};

/// Header carrying the API token in token mode.
pub const TOKEN_HEADER: &str = "X-Gauges-Token";

/// Credentials for one client. Exactly one authentication mode is active.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { email: String, password: String },
    Token { token: String },
}

/// Authentication strategy derived from [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Basic,
    Token,
}

impl Credentials {
    pub fn basic(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token {
            token: token.into(),
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::Basic { .. } => AuthMode::Basic,
            Credentials::Token { .. } => AuthMode::Token,
        }
    }

    pub fn is_basic(&self) -> bool {
        self.mode() == AuthMode::Basic
    }

    pub fn is_token(&self) -> bool {
        self.mode() == AuthMode::Token
    }

    /// The single header that authenticates a request in this mode.
    ///
    /// Values are sent as given; empty tokens or passwords are left for the
    /// server to reject.
    pub fn auth_header(&self) -> (String, String) {
        match self {
            Credentials::Basic { email, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", email, password));
                (AUTHORIZATION.as_str().to_string(), format!("Basic {}", encoded))
            }
            Credentials::Token { token } => (TOKEN_HEADER.to_string(), token.clone()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token { .. } => f
                .debug_struct("Token")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Where resolved credentials came from (for diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    OnePassword,
    Bitwarden,
    Keepassxc,
    Environment,
}

impl CredentialSource {
    fn label(&self) -> &'static str {
        match self {
            CredentialSource::OnePassword => "1Password",
            CredentialSource::Bitwarden => "Bitwarden",
            CredentialSource::Keepassxc => "KeePassXC",
            CredentialSource::Environment => "GAUGES_TOKEN",
        }
    }
}

/// Token from the first configured secret backend, with its source.
type TokenSource<'a> = &'a dyn Fn(Lookup<'_>) -> Option<(String, CredentialSource)>;

/// Resolve credentials from the process environment.
///
/// See [`resolve_credentials_with`] for the order.
pub fn resolve_credentials() -> Result<(Credentials, CredentialSource), Error> {
    resolve_credentials_with(&|name: &str| std::env::var(name).ok())
}

/// Resolve credentials through `lookup`.
///
/// Order: secret backends (1Password, Bitwarden, KeePassXC; these yield a
/// token), then `GAUGES_TOKEN`, then `GAUGES_EMAIL` + `GAUGES_PASSWORD`.
/// A token from any source together with `GAUGES_EMAIL` is rejected, as is
/// no credentials at all.
pub fn resolve_credentials_with(
    lookup: Lookup<'_>,
) -> Result<(Credentials, CredentialSource), Error> {
    resolve_from(lookup, &backend_token)
}

fn backend_token(lookup: Lookup<'_>) -> Option<(String, CredentialSource)> {
    secret::one_password(lookup)
        .map(|t| (t, CredentialSource::OnePassword))
        .or_else(|| secret::bitwarden(lookup).map(|t| (t, CredentialSource::Bitwarden)))
        .or_else(|| secret::keepassxc(lookup).map(|t| (t, CredentialSource::Keepassxc)))
}

fn resolve_from(
    lookup: Lookup<'_>,
    backends: TokenSource<'_>,
) -> Result<(Credentials, CredentialSource), Error> {
    let email = secret::var(lookup, "GAUGES_EMAIL");
    let password = lookup("GAUGES_PASSWORD");
    let token = backends(lookup).or_else(|| {
        secret::var(lookup, "GAUGES_TOKEN").map(|t| (t, CredentialSource::Environment))
    });

    match (token, email, password) {
        (Some((_, source)), Some(_), _) => Err(Error::Credentials(format!(
            "a token from {} and GAUGES_EMAIL are both set; pick one authentication mode",
            source.label()
        ))),
        (Some((t, source)), None, _) => Ok((Credentials::token(t), source)),
        (None, Some(e), Some(p)) => Ok((Credentials::basic(e, p), CredentialSource::Environment)),
        (None, Some(_), None) => Err(Error::Credentials(
            "GAUGES_EMAIL is set but GAUGES_PASSWORD is missing".to_string(),
        )),
        (None, None, _) => Err(Error::Credentials(
            "no credentials found. Set GAUGES_TOKEN, GAUGES_EMAIL and GAUGES_PASSWORD, \
             or configure a secret backend: GAUGES_OP_ENTRY_PATH (1Password), \
             GAUGES_BW_ITEM_ID (Bitwarden), or GAUGES_KPXC_DB+GAUGES_KPXC_ENTRY (KeePassXC)"
                .to_string(),
        )),
    }
}
