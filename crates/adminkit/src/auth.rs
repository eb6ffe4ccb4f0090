//! Two-legged OAuth for service accounts.
//!
//! A signed RS256 JWT assertion naming the service account (`iss`), the
//! requested scopes and the impersonated principal (`sub`) is exchanged at
//! the token endpoint for a short-lived bearer token. Tokens are cached per
//! subject until shortly before they expire.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::{Error, Result};

/// Lifetime requested for each assertion, in seconds.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before the service says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// JWT claims of a service-account assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Service account email.
    pub iss: String,
    /// Space-separated scopes.
    pub scope: String,
    /// Token endpoint.
    pub aud: String,
    /// Impersonated principal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued-at (seconds since the epoch).
    pub iat: i64,
    /// Expiry (seconds since the epoch).
    pub exp: i64,
}

impl Claims {
    /// Build the claims for `credentials`, impersonating `subject`.
    pub fn new(credentials: &Credentials, subject: Option<&str>, issued_at: i64) -> Self {
        let key = credentials.key();
        Self {
            iss: key.client_email.clone(),
            scope: credentials.scopes().join(" "),
            aud: key.token_uri.clone(),
            sub: subject.map(str::to_string),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Sign an assertion with the key's private key.
pub fn sign_assertion(credentials: &Credentials, claims: &Claims) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(credentials.key().private_key.as_bytes())?;
    let mut header = Header::new(Algorithm::RS256);
    if !credentials.key().private_key_id.is_empty() {
        header.kid = Some(credentials.key().private_key_id.clone());
    }
    Ok(jsonwebtoken::encode(&header, claims, &key)?)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Exchanges assertions for access tokens and caches them per subject.
pub struct Authenticator {
    agent: ureq::Agent,
    credentials: Credentials,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl Authenticator {
    /// Create an authenticator for `credentials`.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self::with_agent(credentials, ureq::Agent::new_with_defaults())
    }

    /// Create an authenticator that shares an HTTP agent.
    #[must_use]
    pub fn with_agent(credentials: Credentials, agent: ureq::Agent) -> Self {
        Self {
            agent,
            credentials,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The credentials in use.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Get a bearer token impersonating `subject`.
    ///
    /// `None` uses the credentials' own subject.
    pub fn access_token(&self, subject: Option<&str>) -> Result<String> {
        let subject = subject.or(self.credentials.subject());
        let cache_key = subject.unwrap_or_default().to_string();

        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&cache_key) {
                if Instant::now() < cached.refresh_at {
                    log::trace!("Using cached token for {}", cache_key);
                    return Ok(cached.token.clone());
                }
            }
        }

        let fetched = self.exchange(subject)?;
        let token = fetched.access_token.clone();
        let lifetime = Duration::from_secs(fetched.expires_in).saturating_sub(EXPIRY_MARGIN);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                cache_key,
                CachedToken {
                    token: fetched.access_token,
                    refresh_at: Instant::now() + lifetime,
                },
            );
        Ok(token)
    }

    fn exchange(&self, subject: Option<&str>) -> Result<TokenResponse> {
        let subject_name = subject.unwrap_or("(service account)").to_string();
        let claims = Claims::new(&self.credentials, subject, chrono::Utc::now().timestamp());
        let assertion = sign_assertion(&self.credentials, &claims)?;

        log::debug!(
            "Requesting token for {} with scopes: {}",
            subject_name,
            claims.scope
        );

        let mut response = self
            .agent
            .post(&self.credentials.key().token_uri)
            .send_form([("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .map_err(|e| {
                let err = Error::from(e);
                Error::TokenExchange {
                    subject: subject_name.clone(),
                    status: err.status_code(),
                    message: err.to_string(),
                }
            })?;

        response
            .body_mut()
            .read_json::<TokenResponse>()
            .map_err(|e| Error::TokenExchange {
                subject: subject_name,
                message: format!("unreadable token response: {}", e),
                status: None,
            })
    }
}
