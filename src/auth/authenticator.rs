//! Authenticator implementation
//!
//! Turns a `TokenSource` into bearer tokens and caches them until they
//! expire.

use super::types::{CachedToken, TokenSource, JWT_LIFETIME_SECONDS};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use object_store::gcp::GcpCredential;
use object_store::CredentialProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Capability to obtain an OAuth2 access token.
///
/// Injected into the uploader and the warehouse client so that tests can
/// supply a fixed token instead of real credentials.
#[async_trait]
pub trait TokenProvider: Send + Sync + std::fmt::Debug {
    /// Return a currently valid bearer token
    async fn access_token(&self) -> Result<String>;
}

/// Authenticator for Google APIs
#[derive(Debug)]
pub struct GoogleAuthenticator {
    /// Token source
    source: TokenSource,
    /// Cached token
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl GoogleAuthenticator {
    /// Create a new authenticator for the given source
    pub fn new(source: TokenSource) -> Self {
        Self::with_client(source, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(source: TokenSource, http_client: Client) -> Self {
        Self {
            source,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Create an authenticator that always returns `token`
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::new(TokenSource::Static {
            token: token.into(),
        })
    }

    /// Get the token source
    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch a new token based on the source
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        tracing::debug!("Fetching access token ({})", self.source.kind());
        match &self.source {
            TokenSource::Static { token } => Ok(CachedToken::new(token.clone(), None)),

            TokenSource::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
                scopes,
            } => {
                self.exchange_service_account_jwt(
                    client_email,
                    private_key,
                    private_key_id.as_deref(),
                    token_uri,
                    scopes,
                )
                .await
            }

            TokenSource::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => {
                self.fetch_oauth2_refresh(token_uri, client_id, client_secret, refresh_token)
                    .await
            }

            TokenSource::MetadataServer { url } => self.fetch_metadata_token(url).await,
        }
    }

    /// Fetch OAuth2 token using refresh token flow
    async fn fetch_oauth2_refresh(
        &self,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<CachedToken> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http_client
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!("Refresh token request failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.into_cached_token())
    }

    /// Sign a JWT assertion with the service account key and exchange it
    async fn exchange_service_account_jwt(
        &self,
        client_email: &str,
        private_key: &str,
        private_key_id: Option<&str>,
        token_uri: &str,
        scopes: &[String],
    ) -> Result<CachedToken> {
        let now = Utc::now().timestamp();
        #[allow(clippy::cast_possible_wrap)]
        let exp = now + JWT_LIFETIME_SECONDS as i64;

        let claims = JwtClaims {
            iss: client_email.to_string(),
            scope: scopes.join(" "),
            aud: token_uri.to_string(),
            iat: now,
            exp,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = private_key_id.map(String::from);

        let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
            Error::JwtGeneration {
                message: format!("Invalid private key: {e}"),
            }
        })?;

        let jwt = encode(&header, &claims, &encoding_key).map_err(|e| Error::JwtGeneration {
            message: format!("Failed to encode JWT: {e}"),
        })?;

        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", jwt.as_str()),
        ];

        let response = self
            .http_client
            .post(token_uri)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::JwtGeneration {
                message: format!("JWT token exchange failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.into_cached_token())
    }

    /// Ask the instance metadata server for a token
    async fn fetch_metadata_token(&self, url: &str) -> Result<CachedToken> {
        let response = self
            .http_client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::auth(format!("Metadata server unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Metadata server returned status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.into_cached_token())
    }

    /// Clear the cached token
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }
}

#[async_trait]
impl TokenProvider for GoogleAuthenticator {
    async fn access_token(&self) -> Result<String> {
        self.get_or_refresh_token().await
    }
}

/// Adapter exposing a `TokenProvider` to object_store's GCS client
#[derive(Debug)]
pub struct StoreCredentials {
    provider: Arc<dyn TokenProvider>,
}

impl StoreCredentials {
    /// Wrap a token provider
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CredentialProvider for StoreCredentials {
    type Credential = GcpCredential;

    async fn get_credential(&self) -> object_store::Result<Arc<GcpCredential>> {
        let bearer = self
            .provider
            .access_token()
            .await
            .map_err(|e| object_store::Error::Generic {
                store: "GCS",
                source: Box::new(e),
            })?;
        Ok(Arc::new(GcpCredential { bearer }))
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}

/// Claims of a Google service account assertion
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}
