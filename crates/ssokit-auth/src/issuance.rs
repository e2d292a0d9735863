//! Service credential issuance
//!
//! [`CredentialIssuer`] is the network boundary of the credential cache. The
//! default implementation performs an OAuth 2.0 client-credentials exchange
//! against the service token endpoint, sending the tenant domain as an extra
//! `tenant` form parameter.

use std::time::Duration;

use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{ClientId, ClientSecret, RequestTokenError, TokenResponse, TokenUrl};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

/// Obtains a fresh access token for the service identity
#[async_trait]
pub trait CredentialIssuer: Send + Sync + std::fmt::Debug {
    /// Exchange client credentials for an access token
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Issuance`] when the endpoint is unreachable or
    /// refuses the exchange.
    async fn issue_credential(
        &self,
        client_id: &str,
        client_secret: &SecretString,
        tenant_domain: &str,
    ) -> Result<String>;
}

/// OAuth 2.0 client-credentials exchange over HTTP
#[derive(Debug, Clone)]
pub struct ClientCredentialsIssuer {
    token_url: Url,
    http_client: reqwest::Client,
}

impl ClientCredentialsIssuer {
    /// Issuer posting to `token_url` with the given request timeout
    ///
    /// Redirects are never followed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the HTTP client cannot be built.
    pub fn new(token_url: Url, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(token_url, http_client))
    }

    /// Issuer using the token endpoint and timeout from `config`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the token URL is invalid.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(config.token_url()?, config.request_timeout())
    }

    /// Issuer reusing an existing client
    ///
    /// The client should be built with `redirect::Policy::none()`.
    pub fn with_http_client(token_url: Url, http_client: reqwest::Client) -> Self {
        Self {
            token_url,
            http_client,
        }
    }

    /// Token endpoint
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

#[async_trait]
impl CredentialIssuer for ClientCredentialsIssuer {
    async fn issue_credential(
        &self,
        client_id: &str,
        client_secret: &SecretString,
        tenant_domain: &str,
    ) -> Result<String> {
        let client = BasicClient::new(ClientId::new(client_id.to_owned()))
            .set_client_secret(ClientSecret::new(client_secret.expose_secret().clone()))
            .set_token_uri(TokenUrl::from_url(self.token_url.clone()));

        info!(
            token_url = %self.token_url,
            client_id,
            tenant = tenant_domain,
            "Requesting service credential"
        );

        let response = client
            .exchange_client_credentials()
            .add_extra_param("tenant", tenant_domain.to_owned())
            .request_async(&self.http_client)
            .await
            .map_err(|e| {
                let reason = describe(&e);
                error!(token_url = %self.token_url, error = %reason, "Credential issuance failed");
                AuthError::Issuance(reason)
            })?;

        info!(
            token_url = %self.token_url,
            expires_in = ?response.expires_in().map(|d| d.as_secs()),
            "Service credential issued"
        );

        Ok(response.access_token().secret().clone())
    }
}

fn describe<RE>(err: &RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => match response.error_description() {
            Some(description) => format!("{}: {description}", response.error()),
            None => response.error().to_string(),
        },
        RequestTokenError::Request(e) => format!("request failed: {e}"),
        RequestTokenError::Parse(e, _) => format!("unparseable token response: {e}"),
        RequestTokenError::Other(message) => message.clone(),
    }
}
