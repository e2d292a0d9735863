//! # ssokit Auth
//!
//! Token handling and service credentials for the ssokit identity SDK.
//!
//! ## Architecture
//!
//! - [`codec`] - compact token splitting and base64url decoding
//! - [`claims`] - typed [`Header`] and [`Payload`] with invariant checks
//! - [`issuer`] - issuer trust against the service base URL and tenant
//! - [`verifier`] - the `decode → claims → issuer` pipeline producing
//!   [`VerifiedToken`]s
//! - [`issuance`] - OAuth 2.0 client-credentials exchange
//! - [`cache`] - single-slot, single-flight service credential cache
//! - [`provider`] - [`CredentialProvider`], everything wired from an
//!   [`AuthConfig`]
//!
//! Token signatures are not checked: this SDK trusts a token's structure,
//! claims and issuer strings only.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ssokit_auth::{AuthConfig, CredentialProvider};
//!
//! # tokio_test::block_on(async {
//! let config = AuthConfig::from_env()?;
//! let provider = CredentialProvider::from_config(&config)?;
//!
//! // Outbound: a trusted service credential, cached between calls
//! let credential = provider.get_credential().await?;
//!
//! // Inbound: verify a caller's token
//! let token = provider.verify(&credential)?;
//! println!("subject {}", token.subject_id());
//! # Ok::<(), ssokit_auth::AuthError>(())
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod claims;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod issuance;
pub mod issuer;
pub mod provider;
pub mod verifier;

pub use cache::{CachedCredential, CredentialCache, ServiceIdentity};
pub use claims::{Header, Payload};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, VerifierConfig};
pub use error::{AuthError, ClaimsError, Result};
pub use issuance::{ClientCredentialsIssuer, CredentialIssuer};
pub use issuer::IssuerVerifier;
pub use provider::CredentialProvider;
pub use verifier::{TokenVerifier, VerifiedToken};

/// Response types and resource decoding
pub use ssokit_types as types;

/// Version of the ssokit auth crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
