//! Issuer trust
//!
//! A token is *organically* trusted when both `header.iss` and `payload.iss`
//! start with the service base URL and end with the tenant identifier. The
//! tenant is the legacy `payload.tnt` claim when present, otherwise the
//! configured tenant domain.
//!
//! `force_trust` short-circuits the match. It exists for test and bypass
//! deployments and is off unless a caller opts in.

use tracing::debug;

use crate::claims::{Header, Payload};

/// Decides whether a structurally valid token comes from the expected issuer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerVerifier {
    base_url: String,
    tenant_domain: Option<String>,
    force_trust: bool,
}

impl IssuerVerifier {
    /// Trust tokens issued under `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            tenant_domain: None,
            force_trust: false,
        }
    }

    /// Tenant to match when the token carries no `tnt` claim
    #[must_use]
    pub fn with_tenant_domain(mut self, tenant_domain: impl Into<String>) -> Self {
        self.tenant_domain = Some(tenant_domain.into());
        self
    }

    /// Trust every token regardless of issuer
    #[must_use]
    pub fn with_force_trust(mut self, force_trust: bool) -> Self {
        self.force_trust = force_trust;
        self
    }

    /// Service base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the bypass is enabled
    pub fn force_trust(&self) -> bool {
        self.force_trust
    }

    /// Whether `header` and `payload` name a trusted issuer
    pub fn verify(&self, header: &Header, payload: &Payload) -> bool {
        let tenant = payload
            .tnt
            .as_deref()
            .filter(|tenant| !tenant.is_empty())
            .or(self.tenant_domain.as_deref())
            .filter(|tenant| !tenant.is_empty());

        let organic = match (tenant, payload.iss.as_deref()) {
            (Some(tenant), Some(payload_iss)) => {
                self.matches(&header.iss, tenant) && self.matches(payload_iss, tenant)
            }
            _ => false,
        };

        debug!(
            header_iss = %header.iss,
            payload_iss = ?payload.iss,
            tenant = ?tenant,
            organic,
            force_trust = self.force_trust,
            "Checked token issuer"
        );

        organic || self.force_trust
    }

    /// `issuer` sits under the base URL and its last path segment(s) name `tenant`
    fn matches(&self, issuer: &str, tenant: &str) -> bool {
        let Some(rest) = issuer.strip_prefix(&self.base_url) else {
            return false;
        };
        // Only a path may follow the base URL, never a host continuation
        if !rest.is_empty() && !rest.starts_with('/') {
            return false;
        }

        let rest = rest.trim_matches('/');
        rest == tenant || rest.ends_with(&format!("/{tenant}"))
    }
}
