//! Common test utilities for integration tests
//!
//! Token builders, a scripted credential issuer and a wiremock token
//! endpoint shared by the verifier, cache and issuance tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use ssokit_auth::codec::encode_segment;
use ssokit_auth::{AuthError, CredentialIssuer, FixedClock, TokenVerifier, VerifierConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Verification instant used by every test
pub const NOW: i64 = 1_700_000_000;
pub const BASE_URL: &str = "https://auth.example.com";
pub const TENANT: &str = "acme";

/// Route `tracing` output to the test harness (`RUST_LOG` controls the level)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn issuer_for(base_url: &str, tenant: &str) -> String {
    format!("{base_url}/t/{tenant}")
}

/// Builds compact tokens, valid by default
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    header: Map<String, Value>,
    payload: Map<String, Value>,
}

impl TokenBuilder {
    /// Valid v2 token issued by `BASE_URL` for `TENANT`
    pub fn new() -> Self {
        Self::issued_by(BASE_URL, TENANT)
    }

    /// Valid v2 token issued by `base_url` for `tenant`
    pub fn issued_by(base_url: &str, tenant: &str) -> Self {
        let iss = issuer_for(base_url, tenant);
        Self {
            header: object(json!({
                "kid": "key-1",
                "iss": iss,
                "typ": "JWT",
                "alg": "RS256",
            })),
            payload: object(json!({
                "sub": "oidc|usr_123",
                "jti": "tok_1",
                "jtt": "access",
                "ver": 2,
                "exp": NOW + 3600,
                "iat": NOW - 60,
                "iss": iss,
                "tnt": tenant,
                "org": "org_acme",
                "env": "env_prod",
            })),
        }
    }

    /// Valid v1 token issued by `BASE_URL` for `TENANT`
    pub fn v1() -> Self {
        Self::new()
            .claim("ver", 1)
            .claim("dbs", "main")
            .claim("cid", "cli_1")
            .without("org")
            .without("env")
    }

    pub fn header(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.header.insert(key.to_owned(), value.into());
        self
    }

    pub fn claim(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_owned(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.payload.remove(key);
        self
    }

    pub fn without_header(mut self, key: &str) -> Self {
        self.header.remove(key);
        self
    }

    /// Set the issuer on both header and payload
    pub fn issuer(self, iss: &str) -> Self {
        self.header("iss", iss).claim("iss", iss)
    }

    pub fn build(&self) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            encode_segment(&self.header),
            encode_segment(&self.payload)
        )
    }
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(object) => object,
        _ => unreachable!("builders only produce objects"),
    }
}

/// Verifier trusting `BASE_URL`, frozen at `NOW`
pub fn verifier() -> (TokenVerifier, FixedClock) {
    verifier_with(VerifierConfig::new(BASE_URL).with_tenant_domain(TENANT))
}

pub fn verifier_with(config: VerifierConfig) -> (TokenVerifier, FixedClock) {
    let clock = FixedClock::new(NOW);
    let verifier = TokenVerifier::new(config).with_clock(clock.clone());
    (verifier, clock)
}

/// Issuer replaying scripted responses and counting calls
#[derive(Debug, Default)]
pub struct ScriptedIssuer {
    responses: Mutex<VecDeque<Result<String, AuthError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedIssuer {
    pub fn new(responses: impl IntoIterator<Item = Result<String, AuthError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Always return `token`
    pub fn always(token: String) -> Self {
        Self::new(std::iter::repeat_n(Ok(token), 64))
    }

    /// Sleep before answering, to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialIssuer for ScriptedIssuer {
    async fn issue_credential(
        &self,
        _client_id: &str,
        _client_secret: &SecretString,
        _tenant_domain: &str,
    ) -> Result<String, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::Issuance("script exhausted".into())))
    }
}

/// Wiremock-backed OAuth2 token endpoint
pub struct MockTokenServer {
    pub server: MockServer,
}

impl MockTokenServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub async fn mock_token_success(&self, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_token_error(&self, error: &str, description: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": error,
                "error_description": description,
            })))
            .mount(&self.server)
            .await;
    }
}
