//! Client-credentials issuance against a mock token endpoint
//!
//! Covers the OAuth2 exchange itself and the provider wiring from
//! configuration through to a cached, trusted credential.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockTokenServer, NOW, TokenBuilder};
use secrecy::SecretString;
use ssokit_auth::{
    AuthConfig, AuthError, ClientCredentialsIssuer, CredentialIssuer, CredentialProvider,
    FixedClock,
};
use url::Url;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

fn secret() -> SecretString {
    SecretString::new("s3cret".to_string())
}

fn config_for(server: &MockTokenServer) -> AuthConfig {
    AuthConfig::new(server.uri(), "acme", "cli_1", "s3cret")
        .with_request_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_exchange_sends_grant_and_tenant() {
    let server = MockTokenServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("tenant=acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "issued-token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server.server)
        .await;

    let issuer = ClientCredentialsIssuer::from_config(&config_for(&server)).unwrap();
    let token = issuer
        .issue_credential("cli_1", &secret(), "acme")
        .await
        .unwrap();

    assert_eq!(token, "issued-token");
}

#[tokio::test]
async fn test_error_response_maps_to_issuance() {
    let server = MockTokenServer::start().await;
    server
        .mock_token_error("invalid_client", "Client authentication failed")
        .await;

    let issuer = ClientCredentialsIssuer::from_config(&config_for(&server)).unwrap();
    let err = issuer
        .issue_credential("cli_1", &secret(), "acme")
        .await
        .unwrap_err();

    match err {
        AuthError::Issuance(reason) => {
            assert!(reason.contains("invalid_client"), "{reason}");
            assert!(reason.contains("Client authentication failed"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_maps_to_issuance() {
    let issuer = ClientCredentialsIssuer::new(
        Url::parse("http://127.0.0.1:9/oauth/token").unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();

    let err = issuer
        .issue_credential("cli_1", &secret(), "acme")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Issuance(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let server = MockTokenServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "https://evil.example.com/token"),
        )
        .mount(&server.server)
        .await;

    let issuer = ClientCredentialsIssuer::from_config(&config_for(&server)).unwrap();
    let result = issuer.issue_credential("cli_1", &secret(), "acme").await;

    assert!(matches!(result, Err(AuthError::Issuance(_))));
}

#[tokio::test]
async fn test_provider_caches_issued_credential() {
    let server = MockTokenServer::start().await;
    let token = TokenBuilder::issued_by(&server.uri(), "acme").build();
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "token_type": "Bearer",
        })))
        .expect(1)
        .mount(&server.server)
        .await;

    let provider = CredentialProvider::from_config(&config_for(&server))
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(NOW)));

    assert_eq!(provider.get_credential().await.unwrap(), token);
    assert_eq!(provider.get_credential().await.unwrap(), token);

    let verified = provider.verify(&token).unwrap();
    assert!(verified.is_issuer_trusted());
}

#[tokio::test]
async fn test_provider_refuses_credential_from_other_issuer() {
    let server = MockTokenServer::start().await;
    let token = TokenBuilder::issued_by("https://elsewhere.example.org", "acme").build();
    server.mock_token_success(&token).await;

    let provider = CredentialProvider::from_config(&config_for(&server))
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(NOW)));

    assert!(matches!(
        provider.get_credential().await,
        Err(AuthError::NoCredential { .. })
    ));
}

#[tokio::test]
async fn test_provider_force_trust_accepts_other_issuer() {
    let server = MockTokenServer::start().await;
    let token = TokenBuilder::issued_by("https://elsewhere.example.org", "acme").build();
    server.mock_token_success(&token).await;

    let config = config_for(&server).with_force_trust(true);
    let provider = CredentialProvider::from_config(&config)
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(NOW)));

    assert_eq!(provider.get_credential().await.unwrap(), token);
}

#[test]
fn test_provider_rejects_invalid_config() {
    let config = AuthConfig::new("not a url", "acme", "cli_1", "s3cret");
    assert!(matches!(
        CredentialProvider::from_config(&config),
        Err(AuthError::Configuration(_))
    ));
}
