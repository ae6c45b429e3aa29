//! Credential types
//!
//! `TokenSource` is the runtime description of where access tokens come
//! from. `CredentialsFile` mirrors the JSON key files Google tooling writes.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// OAuth2 scope requested for storage and warehouse access
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default Google OAuth2 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Default metadata server token endpoint (ambient credentials)
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Lifetime requested for self-signed service account assertions
pub const JWT_LIFETIME_SECONDS: u64 = 3600;

/// Where access tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Fixed token, never refreshed
    Static {
        /// The bearer token
        token: String,
    },

    /// Service account key, exchanged through a signed JWT assertion
    ServiceAccount {
        /// Service account email (iss claim)
        client_email: String,
        /// PEM encoded RSA private key
        private_key: String,
        /// Key identifier, sent as the JWT `kid` header
        private_key_id: Option<String>,
        /// Token endpoint (aud claim and exchange URL)
        token_uri: String,
        /// Requested scopes
        scopes: Vec<String>,
    },

    /// End-user credentials written by `gcloud auth application-default login`
    AuthorizedUser {
        /// OAuth2 client ID
        client_id: String,
        /// OAuth2 client secret
        client_secret: String,
        /// Long-lived refresh token
        refresh_token: String,
        /// Token endpoint
        token_uri: String,
    },

    /// Ambient credentials of the compute instance
    MetadataServer {
        /// Token endpoint of the metadata server
        url: String,
    },
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::MetadataServer {
            url: METADATA_TOKEN_URL.to_string(),
        }
    }
}

impl TokenSource {
    /// Resolve credentials the way Google client libraries do.
    ///
    /// If `env_var` names a credentials file, that file is used; otherwise
    /// the metadata server of the current instance is queried.
    pub fn from_env(env_var: &str) -> Result<Self> {
        match std::env::var(env_var) {
            Ok(path) if !path.trim().is_empty() => {
                tracing::debug!("Using credentials file from {env_var}: {path}");
                CredentialsFile::load(Path::new(&path)).map(Self::from)
            }
            _ => {
                tracing::debug!("{env_var} not set, using metadata server credentials");
                Ok(Self::default())
            }
        }
    }

    /// Short name of the source, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::ServiceAccount { .. } => "service_account",
            Self::AuthorizedUser { .. } => "authorized_user",
            Self::MetadataServer { .. } => "metadata_server",
        }
    }
}

/// JSON credentials file, discriminated by its `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    /// Service account key
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },

    /// Application default credentials of an end user
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default = "default_token_uri")]
        token_uri: String,
    },
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl CredentialsFile {
    /// Read and parse a credentials file
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::credentials(&display, format!("cannot read file: {e}")))?;
        Self::parse(&content).map_err(|e| Error::credentials(display, e.to_string()))
    }

    /// Parse credentials JSON
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

impl From<CredentialsFile> for TokenSource {
    fn from(file: CredentialsFile) -> Self {
        match file {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => Self::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
                scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
            },
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => Self::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            },
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
