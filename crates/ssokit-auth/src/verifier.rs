//! Token verification pipeline
//!
//! A raw token moves through `decoded → structurally valid → verified`, or is
//! rejected at the first stage that fails:
//!
//! | Stage | Component | Rejection |
//! |-------|-----------|-----------|
//! | decode | [`codec::decode`] | [`AuthError::MalformedToken`] |
//! | claims | [`Header::parse`], [`Payload::parse`] | [`AuthError::InvalidClaims`] |
//! | issuer | [`IssuerVerifier::verify`] | never; recorded on the token |
//!
//! An untrusted issuer is not a rejection. The outcome is carried on the
//! [`VerifiedToken`] and callers pick the policy, e.g. with
//! [`VerifiedToken::require_trusted`]. No stage retries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::claims::{Header, Payload};
use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::config::VerifierConfig;
use crate::error::{AuthError, ClaimsError, Result};
use crate::issuer::IssuerVerifier;

/// A token that passed decoding and claim validation
///
/// Fields are read-only: the trust outcome is fixed when the token is built.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    header: Header,
    payload: Payload,
    issuer_trusted: bool,
}

impl VerifiedToken {
    /// Validated header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Validated payload
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Whether the issuer matched the service and tenant (or trust was forced)
    pub fn is_issuer_trusted(&self) -> bool {
        self.issuer_trusted
    }

    /// Canonical subject id
    pub fn subject_id(&self) -> &str {
        self.payload.subject_id()
    }

    /// Owning domain (`org`, else `tnt`)
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::MissingDomain`] if the token names neither.
    pub fn domain(&self) -> std::result::Result<&str, ClaimsError> {
        self.payload.domain()
    }

    /// Granted scopes
    pub fn scopes(&self) -> &[String] {
        &self.payload.scp
    }

    /// Expiry timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.payload.expires_at()
    }

    /// Turn an untrusted token into an error
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UntrustedIssuer`] carrying the header issuer.
    pub fn require_trusted(self) -> Result<Self> {
        if self.issuer_trusted {
            Ok(self)
        } else {
            Err(AuthError::UntrustedIssuer {
                issuer: self.header.iss,
            })
        }
    }

    /// Split into header, payload and trust outcome
    pub fn into_parts(self) -> (Header, Payload, bool) {
        (self.header, self.payload, self.issuer_trusted)
    }
}

/// Runs raw tokens through decoding, claim validation and issuer trust
///
/// ```rust
/// use ssokit_auth::clock::FixedClock;
/// use ssokit_auth::config::VerifierConfig;
/// use ssokit_auth::verifier::TokenVerifier;
///
/// let verifier = TokenVerifier::new(VerifierConfig::new("https://auth.example.com"))
///     .with_clock(FixedClock::new(1_700_000_000));
///
/// assert!(verifier.verify("not-a-token").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    expected_algorithm: String,
    issuer: IssuerVerifier,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Verifier using the wall clock
    pub fn new(config: VerifierConfig) -> Self {
        let mut issuer =
            IssuerVerifier::new(config.base_url).with_force_trust(config.force_trust);
        if let Some(tenant) = config.tenant_domain {
            issuer = issuer.with_tenant_domain(tenant);
        }

        Self {
            expected_algorithm: config.expected_algorithm,
            issuer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the time source with a shared one
    #[must_use]
    pub fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Issuer policy in use
    pub fn issuer(&self) -> &IssuerVerifier {
        &self.issuer
    }

    /// Verify `raw`
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`] if the token cannot be decoded
    /// - [`AuthError::InvalidClaims`] if a header or payload invariant fails
    pub fn verify(&self, raw: &str) -> Result<VerifiedToken> {
        let decoded = codec::decode(raw).inspect_err(|e| {
            warn!(stage = "decode", error = %e, "Token rejected");
        })?;
        debug!(stage = "decode", "Token decoded");

        let now = self.clock.now();
        let header = Header::parse(&decoded.header, &self.expected_algorithm);
        let payload = header.and_then(|header| {
            Payload::parse(&decoded.payload, now).map(|payload| (header, payload))
        });
        let (header, payload) = payload.map_err(|e| {
            warn!(stage = "claims", error = %e, now, "Token rejected");
            AuthError::from(e)
        })?;
        debug!(
            stage = "claims",
            kid = %header.kid,
            jti = %payload.jti,
            ver = payload.ver,
            "Token claims valid"
        );

        let issuer_trusted = self.issuer.verify(&header, &payload);
        if !issuer_trusted {
            warn!(issuer = %header.iss, jti = %payload.jti, "Token issuer not trusted");
        }
        debug!(stage = "issuer", issuer_trusted, "Token verified");

        Ok(VerifiedToken {
            header,
            payload,
            issuer_trusted,
        })
    }
}
