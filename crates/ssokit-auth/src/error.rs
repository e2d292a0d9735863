//! Error types for the credential/token subsystem

use thiserror::Error;

/// Result alias used throughout this crate
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failures surfaced by token verification and credential acquisition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Input could not be decoded at all (segment count, base64, JSON)
    #[error("malformed token: {reason}")]
    MalformedToken {
        /// What made the token undecodable
        reason: String,
    },

    /// Token decoded but violates a claim invariant
    #[error("invalid claims: {0}")]
    InvalidClaims(#[from] ClaimsError),

    /// Token is structurally valid but its issuer is not trusted
    #[error("untrusted issuer: {issuer}")]
    UntrustedIssuer {
        /// Issuer string carried by the token
        issuer: String,
    },

    /// No trusted credential could be obtained
    #[error("no credential available: {reason}")]
    NoCredential {
        /// Why the freshly issued credential was refused
        reason: String,
    },

    /// The credential issuer could not be reached or refused the exchange
    #[error("credential issuance failed: {0}")]
    Issuance(String),

    /// Configuration is incomplete or inconsistent
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Whether retrying the calling operation could succeed
    ///
    /// Decoding and claim failures are properties of the token itself and
    /// never go away on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UntrustedIssuer { .. } | Self::NoCredential { .. } | Self::Issuance(_)
        )
    }
}

/// A violated header or payload invariant
///
/// Claims are checked in a fixed order and the first violation is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    /// Required claim absent or empty
    #[error("missing required claim `{0}`")]
    Missing(&'static str),

    /// A claim has the wrong JSON type
    #[error("malformed claims: {0}")]
    Shape(String),

    /// Header `typ` is not `JWT`
    #[error("unsupported token type `{0}`")]
    UnsupportedType(String),

    /// Header `alg` differs from the configured algorithm
    #[error("unexpected algorithm `{found}`, expected `{expected}`")]
    UnexpectedAlgorithm {
        /// Configured algorithm
        expected: String,
        /// Algorithm carried by the token
        found: String,
    },

    /// `ver` outside the supported range
    #[error("unsupported token version {0}")]
    UnsupportedVersion(i64),

    /// `exp` is not in the future
    #[error("token expired at {exp} (now {now})")]
    Expired {
        /// Expiry claim
        exp: i64,
        /// Verification time
        now: i64,
    },

    /// `iat` is not in the past
    #[error("token issued in the future at {iat} (now {now})")]
    IssuedInFuture {
        /// Issued-at claim
        iat: i64,
        /// Verification time
        now: i64,
    },

    /// Neither `org` nor `tnt` is present
    #[error("token carries neither `org` nor `tnt`")]
    MissingDomain,
}
