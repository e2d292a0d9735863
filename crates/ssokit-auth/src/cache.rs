//! Single-slot service credential cache
//!
//! The cache holds at most one access token and keeps no expiry timer. Trust
//! is re-derived on every read by running the token back through the
//! [`TokenVerifier`]: an expired token fails claim validation and an
//! untrusted one fails the issuer check, both of which force a refetch.
//!
//! Refreshes are single-flight. Concurrent misses queue on one lock and the
//! slot is checked again after acquiring it, so only the first caller talks
//! to the issuer.

use std::fmt;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::issuance::CredentialIssuer;
use crate::verifier::TokenVerifier;

/// Identity the service authenticates as
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Tenant the credential is issued for
    pub tenant_domain: String,
}

impl ServiceIdentity {
    /// Identity from its three parts
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_domain: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            tenant_domain: tenant_domain.into(),
        }
    }
}

impl From<&AuthConfig> for ServiceIdentity {
    fn from(config: &AuthConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tenant_domain: config.tenant_domain.clone(),
        }
    }
}

/// Cached token and the outcome of its most recent verification
#[derive(Clone, PartialEq, Eq)]
pub struct CachedCredential {
    value: String,
    last_verified_trusted: bool,
}

impl CachedCredential {
    /// Raw token
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the last verification found the issuer trusted
    pub fn last_verified_trusted(&self) -> bool {
        self.last_verified_trusted
    }
}

impl fmt::Debug for CachedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCredential")
            .field("value", &"[REDACTED]")
            .field("last_verified_trusted", &self.last_verified_trusted)
            .finish()
    }
}

/// Thread-safe holder for the service credential
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    verifier: TokenVerifier,
    issuer: Arc<dyn CredentialIssuer>,
    identity: ServiceIdentity,
    slot: Arc<RwLock<Option<CachedCredential>>>,
    refresh: Arc<Mutex<()>>,
}

impl CredentialCache {
    /// Empty cache
    pub fn new(
        verifier: TokenVerifier,
        issuer: Arc<dyn CredentialIssuer>,
        identity: ServiceIdentity,
    ) -> Self {
        Self {
            verifier,
            issuer,
            identity,
            slot: Arc::new(RwLock::new(None)),
            refresh: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the verifier, keeping the slot
    #[must_use]
    pub fn with_verifier(mut self, verifier: TokenVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Return a trusted credential, issuing a new one when needed
    ///
    /// # Errors
    ///
    /// - [`AuthError::Issuance`] if the issuer call fails
    /// - [`AuthError::NoCredential`] if the freshly issued token does not
    ///   verify or its issuer is not trusted
    pub async fn get_credential(&self) -> Result<String> {
        if let Some(value) = self.cached_trusted().await {
            debug!("Using cached service credential");
            return Ok(value);
        }

        let _refresh = self.refresh.lock().await;
        if let Some(value) = self.cached_trusted().await {
            debug!("Service credential refreshed by a concurrent caller");
            return Ok(value);
        }

        let identity = &self.identity;
        let fresh = self
            .issuer
            .issue_credential(
                &identity.client_id,
                &identity.client_secret,
                &identity.tenant_domain,
            )
            .await?;

        let verified = self.verifier.verify(&fresh).map_err(|e| {
            warn!(error = %e, "Issued credential failed verification");
            AuthError::NoCredential {
                reason: format!("issued credential failed verification: {e}"),
            }
        })?;
        if !verified.is_issuer_trusted() {
            warn!(issuer = %verified.header().iss, "Issued credential has an untrusted issuer");
            return Err(AuthError::NoCredential {
                reason: format!("issuer {} is not trusted", verified.header().iss),
            });
        }

        *self.slot.write().await = Some(CachedCredential {
            value: fresh.clone(),
            last_verified_trusted: true,
        });
        info!(jti = %verified.payload().jti, "Service credential cached");

        Ok(fresh)
    }

    /// Empty the slot so the next read issues a new credential
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
        debug!("Service credential cache cleared");
    }

    /// Current slot contents
    pub async fn snapshot(&self) -> Option<CachedCredential> {
        self.slot.read().await.clone()
    }

    /// Verifier used for cached and fresh tokens
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    async fn cached_trusted(&self) -> Option<String> {
        let cached = self.slot.read().await.clone()?;

        let trusted = match self.verifier.verify(&cached.value) {
            Ok(token) => token.is_issuer_trusted(),
            Err(e) => {
                debug!(error = %e, "Cached service credential no longer valid");
                false
            }
        };

        if trusted != cached.last_verified_trusted {
            let mut slot = self.slot.write().await;
            if let Some(current) = slot.as_mut()
                && current.value == cached.value
            {
                current.last_verified_trusted = trusted;
            }
        }

        trusted.then_some(cached.value)
    }
}
