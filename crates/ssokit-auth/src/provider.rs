//! Configured entry point
//!
//! [`CredentialProvider`] wires an [`AuthConfig`] into a verifier, an OAuth
//! client-credentials issuer and a credential cache sharing that verifier.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CachedCredential, CredentialCache, ServiceIdentity};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::Result;
use crate::issuance::{ClientCredentialsIssuer, CredentialIssuer};
use crate::verifier::{TokenVerifier, VerifiedToken};

/// Token verification and service credentials behind one handle
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    verifier: TokenVerifier,
    cache: CredentialCache,
}

impl CredentialProvider {
    /// Build from configuration using the wall clock and the HTTP issuer
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`](crate::AuthError::Configuration)
    /// if `config` fails validation or the HTTP client cannot be built.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        let issuer = ClientCredentialsIssuer::from_config(config)?;
        debug!(
            base_url = %config.base_url,
            tenant = %config.tenant_domain,
            token_url = %issuer.token_url(),
            force_trust = config.force_trust,
            "Credential provider configured"
        );
        Ok(Self::with_issuer(config, Arc::new(issuer)))
    }

    /// Build from configuration with a custom issuer
    pub fn with_issuer(config: &AuthConfig, issuer: Arc<dyn CredentialIssuer>) -> Self {
        let verifier = TokenVerifier::new(config.verifier_config());
        let cache = CredentialCache::new(verifier.clone(), issuer, ServiceIdentity::from(config));
        Self { verifier, cache }
    }

    /// Replace the time source for verification and the cache
    #[must_use]
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        let verifier = self.verifier.with_shared_clock(clock);
        let cache = self.cache.with_verifier(verifier.clone());
        Self { verifier, cache }
    }

    /// Verify an inbound token
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify`].
    pub fn verify(&self, raw: &str) -> Result<VerifiedToken> {
        self.verifier.verify(raw)
    }

    /// Current trusted service credential
    ///
    /// # Errors
    ///
    /// See [`CredentialCache::get_credential`].
    pub async fn get_credential(&self) -> Result<String> {
        self.cache.get_credential().await
    }

    /// Drop the cached service credential
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }

    /// Cached service credential, if any
    pub async fn snapshot(&self) -> Option<CachedCredential> {
        self.cache.snapshot().await
    }

    /// Underlying verifier
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Underlying cache
    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }
}
