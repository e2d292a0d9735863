//! Configuration for token verification and credential acquisition

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::claims::DEFAULT_ALGORITHM;
use crate::error::{AuthError, Result};

/// Environment variable prefix used by [`AuthConfig::from_env`]
pub const ENV_PREFIX: &str = "SSOKIT_";

/// Service credentials and trust settings
///
/// ```rust
/// use ssokit_auth::config::AuthConfig;
///
/// let config = AuthConfig::new("https://auth.example.com", "acme", "cli_1", "s3cret")
///     .with_expected_algorithm("ES256");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.token_url().unwrap().as_str(), "https://auth.example.com/oauth/token");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Service base URL; issuers must live under it
    pub base_url: String,
    /// Tenant the service credential is issued for
    pub tenant_domain: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    #[serde(deserialize_with = "deserialize_secret")]
    pub client_secret: SecretString,
    /// Header `alg` every token must carry
    #[serde(default = "default_expected_algorithm")]
    pub expected_algorithm: String,
    /// Trust every issuer (test and bypass deployments only)
    #[serde(default)]
    pub force_trust: bool,
    /// Token endpoint path, relative to `base_url`
    #[serde(default = "default_token_path")]
    pub token_path: String,
    /// Token endpoint timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

fn default_expected_algorithm() -> String {
    DEFAULT_ALGORITHM.to_owned()
}

fn default_token_path() -> String {
    "/oauth/token".to_owned()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AuthConfig {
    /// Configuration with defaults for everything but the credentials
    pub fn new(
        base_url: impl Into<String>,
        tenant_domain: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_domain: tenant_domain.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            expected_algorithm: default_expected_algorithm(),
            force_trust: false,
            token_path: default_token_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Load from `SSOKIT_*` environment variables
    ///
    /// `SSOKIT_BASE_URL`, `SSOKIT_TENANT_DOMAIN`, `SSOKIT_CLIENT_ID` and
    /// `SSOKIT_CLIENT_SECRET` are required. `SSOKIT_EXPECTED_ALGORITHM`,
    /// `SSOKIT_FORCE_TRUST`, `SSOKIT_TOKEN_PATH` and
    /// `SSOKIT_REQUEST_TIMEOUT` override the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a required variable is unset
    /// or the result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                AuthError::Configuration(format!("{ENV_PREFIX}{name} is not set"))
            })
        };

        let mut config = Self::new(
            required("BASE_URL")?,
            required("TENANT_DOMAIN")?,
            required("CLIENT_ID")?,
            required("CLIENT_SECRET")?,
        );

        if let Some(alg) = var("EXPECTED_ALGORITHM") {
            config.expected_algorithm = alg;
        }
        if let Some(path) = var("TOKEN_PATH") {
            config.token_path = path;
        }
        config.force_trust = var("FORCE_TRUST")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if let Some(timeout) = var("REQUEST_TIMEOUT").and_then(|v| v.parse().ok()) {
            config.request_timeout_secs = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Override the expected signing algorithm
    #[must_use]
    pub fn with_expected_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.expected_algorithm = algorithm.into();
        self
    }

    /// Enable or disable the issuer-trust bypass
    #[must_use]
    pub fn with_force_trust(mut self, force_trust: bool) -> Self {
        self.force_trust = force_trust;
        self
    }

    /// Override the token endpoint path
    #[must_use]
    pub fn with_token_path(mut self, token_path: impl Into<String>) -> Self {
        self.token_path = token_path.into();
        self
    }

    /// Override the token endpoint timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Token endpoint timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check that required fields are present and the base URL parses
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let non_empty = [
            ("base_url", self.base_url.as_str()),
            ("tenant_domain", self.tenant_domain.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("expected_algorithm", self.expected_algorithm.as_str()),
        ];
        if let Some((field, _)) = non_empty.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AuthError::Configuration(format!("{field} must not be empty")));
        }

        let base = Url::parse(&self.base_url)
            .map_err(|e| AuthError::Configuration(format!("invalid base_url: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AuthError::Configuration(format!(
                "base_url must be http(s), got {}",
                base.scheme()
            )));
        }

        self.token_url().map(|_| ())
    }

    /// Absolute token endpoint URL
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the URL cannot be built.
    pub fn token_url(&self) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.token_path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| AuthError::Configuration(format!("invalid token URL: {e}")))
    }

    /// Verification settings derived from this configuration
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            expected_algorithm: self.expected_algorithm.clone(),
            base_url: self.base_url.clone(),
            tenant_domain: Some(self.tenant_domain.clone()),
            force_trust: self.force_trust,
        }
    }
}

/// Settings consumed by [`TokenVerifier`](crate::verifier::TokenVerifier)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifierConfig {
    /// Header `alg` every token must carry
    #[serde(default = "default_expected_algorithm")]
    pub expected_algorithm: String,
    /// Service base URL
    pub base_url: String,
    /// Tenant used when a token has no `tnt` claim
    #[serde(default)]
    pub tenant_domain: Option<String>,
    /// Trust every issuer
    #[serde(default)]
    pub force_trust: bool,
}

impl VerifierConfig {
    /// Verify tokens from `base_url` with the default algorithm
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            expected_algorithm: default_expected_algorithm(),
            base_url: base_url.into(),
            tenant_domain: None,
            force_trust: false,
        }
    }

    /// Override the expected signing algorithm
    #[must_use]
    pub fn with_expected_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.expected_algorithm = algorithm.into();
        self
    }

    /// Set the fallback tenant
    #[must_use]
    pub fn with_tenant_domain(mut self, tenant_domain: impl Into<String>) -> Self {
        self.tenant_domain = Some(tenant_domain.into());
        self
    }

    /// Enable or disable the issuer-trust bypass
    #[must_use]
    pub fn with_force_trust(mut self, force_trust: bool) -> Self {
        self.force_trust = force_trust;
        self
    }
}

impl From<&AuthConfig> for VerifierConfig {
    fn from(config: &AuthConfig) -> Self {
        config.verifier_config()
    }
}
