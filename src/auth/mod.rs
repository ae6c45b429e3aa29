//! Authentication module
//!
//! Supports: service account keys, authorized user (ADC) files, the
//! instance metadata server, and fixed tokens.
//!
//! `GoogleAuthenticator` implements `TokenProvider` and caches tokens
//! until shortly before they expire.

mod authenticator;
mod types;

pub use authenticator::{GoogleAuthenticator, StoreCredentials, TokenProvider};
pub use types::{
    CachedToken, CredentialsFile, TokenSource, CLOUD_PLATFORM_SCOPE, GOOGLE_TOKEN_URL,
    METADATA_TOKEN_URL,
};

#[cfg(test)]
mod tests;
