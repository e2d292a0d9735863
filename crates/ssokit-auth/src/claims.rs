//! Typed token header and payload
//!
//! [`Header::parse`] and [`Payload::parse`] turn decoded JSON documents into
//! typed values, enforcing every structural invariant on the way in. Nothing
//! is defaulted: a document that violates an invariant does not produce a
//! value at all.
//!
//! # Validation order
//!
//! Claim types are enforced by serde while the document is deserialized; a
//! claim of the wrong JSON type fails with [`ClaimsError::Shape`] before any
//! other check. The remaining checks run in a fixed order and the **first**
//! violation is returned:
//!
//! - header: `kid`, `iss`, `typ == "JWT"`, `alg == expected`
//! - payload: `sub`, `jti`, `jtt`, `ver` (then its 1..=3 range), `exp`, `iat`,
//!   the validity window (`exp > now`, then `iat < now`), then the
//!   version-conditional claims (`dbs`, `iss`, `cid` for v1; `org`, `env` for
//!   v2+)

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ClaimsError;

/// Algorithm expected when none is configured
pub const DEFAULT_ALGORITHM: &str = "RS256";

/// Only accepted header `typ`
pub const TOKEN_TYPE: &str = "JWT";

/// Payload versions this SDK understands
pub const SUPPORTED_VERSIONS: RangeInclusive<i64> = 1..=3;

type Claims = Map<String, Value>;

/// Token header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Signing key identifier
    pub kid: String,
    /// Issuer
    pub iss: String,
    /// Token type, always `JWT`
    pub typ: String,
    /// Signing algorithm
    pub alg: String,
}

impl Header {
    /// Build a header from its decoded document
    ///
    /// # Errors
    ///
    /// Returns the first violated header invariant.
    pub fn parse(doc: &Claims, expected_algorithm: &str) -> Result<Self, ClaimsError> {
        let raw: RawHeader = deserialize_claims(doc)?;

        let kid = required(raw.kid, "kid")?;
        let iss = required(raw.iss, "iss")?;

        let typ = required(raw.typ, "typ")?;
        if typ != TOKEN_TYPE {
            return Err(ClaimsError::UnsupportedType(typ));
        }

        let alg = required(raw.alg, "alg")?;
        if alg != expected_algorithm {
            return Err(ClaimsError::UnexpectedAlgorithm {
                expected: expected_algorithm.to_owned(),
                found: alg,
            });
        }

        Ok(Self { kid, iss, typ, alg })
    }
}

/// Token payload
///
/// Required claims are plain fields; everything the service may or may not
/// send is an `Option` (or an empty collection). Claims this type does not
/// model are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// Subject, possibly realm-qualified (`<realm>|<id>`)
    pub sub: String,
    /// Token identifier
    pub jti: String,
    /// Token type (access, id, service, ...)
    pub jtt: String,
    /// Payload version, within [`SUPPORTED_VERSIONS`]
    pub ver: i64,
    /// Expiry, epoch seconds
    pub exp: i64,
    /// Issued-at, epoch seconds
    pub iat: i64,

    /// Issuer (required for v1)
    pub iss: Option<String>,
    /// Database connection name (required for v1)
    pub dbs: Option<String>,
    /// Client identifier (required for v1)
    pub cid: Option<String>,
    /// Organization (required for v2+)
    pub org: Option<String>,
    /// Environment (required for v2+)
    pub env: Option<String>,
    /// Legacy tenant identifier
    pub tnt: Option<String>,

    /// Granted scopes
    pub scp: Vec<String>,
    /// Audiences (a single string is accepted as a one-element list)
    pub aud: Vec<String>,
    /// OIDC nonce
    pub nonce: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Whether the email has been verified
    pub email_verified: Option<bool>,
    /// Whether the phone number has been verified
    pub phone_number_verified: Option<bool>,
    /// Full name
    pub name: Option<String>,
    /// Given name
    pub given_name: Option<String>,
    /// Family name
    pub family_name: Option<String>,
    /// User-editable metadata
    pub user_metadata: Option<Map<String, Value>>,
    /// Application-managed metadata
    pub app_metadata: Option<Map<String, Value>>,
    /// OAuth client that requested the token
    pub client_id: Option<String>,
    /// OIDC access token hash
    pub at_hash: Option<String>,
    /// OIDC authorization code hash
    pub c_hash: Option<String>,

    /// Claims not modelled above
    pub extra: Map<String, Value>,
}

/// Header as it arrives, before presence checks
#[derive(Debug, Deserialize)]
struct RawHeader {
    kid: Option<String>,
    iss: Option<String>,
    typ: Option<String>,
    alg: Option<String>,
}

/// Payload as it arrives: claim types enforced, presence and ranges not yet
#[derive(Debug, Deserialize)]
struct RawPayload {
    sub: Option<String>,
    jti: Option<String>,
    jtt: Option<String>,
    ver: Option<i64>,
    exp: Option<i64>,
    iat: Option<i64>,
    iss: Option<String>,
    dbs: Option<String>,
    cid: Option<String>,
    org: Option<String>,
    env: Option<String>,
    tnt: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    scp: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    aud: Vec<String>,
    nonce: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
    phone_number_verified: Option<bool>,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    user_metadata: Option<Map<String, Value>>,
    app_metadata: Option<Map<String, Value>>,
    client_id: Option<String>,
    at_hash: Option<String>,
    c_hash: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Payload {
    /// Build a payload from its decoded document, validated at `now`
    ///
    /// # Errors
    ///
    /// Returns the first violated payload invariant (see the module docs for
    /// the order).
    pub fn parse(doc: &Claims, now: i64) -> Result<Self, ClaimsError> {
        let raw: RawPayload = deserialize_claims(doc)?;

        let sub = required(raw.sub, "sub")?;
        let jti = required(raw.jti, "jti")?;
        let jtt = required(raw.jtt, "jtt")?;

        let ver = raw.ver.ok_or(ClaimsError::Missing("ver"))?;
        if !SUPPORTED_VERSIONS.contains(&ver) {
            return Err(ClaimsError::UnsupportedVersion(ver));
        }

        let exp = raw.exp.ok_or(ClaimsError::Missing("exp"))?;
        let iat = raw.iat.ok_or(ClaimsError::Missing("iat"))?;
        if exp <= now {
            return Err(ClaimsError::Expired { exp, now });
        }
        if iat >= now {
            return Err(ClaimsError::IssuedInFuture { iat, now });
        }

        let (iss, dbs, cid, org, env) = if ver == 1 {
            (
                Some(required(raw.iss, "iss")?),
                Some(required(raw.dbs, "dbs")?),
                Some(required(raw.cid, "cid")?),
                raw.org,
                raw.env,
            )
        } else {
            let org = Some(required(raw.org, "org")?);
            let env = Some(required(raw.env, "env")?);
            (raw.iss, raw.dbs, raw.cid, org, env)
        };

        Ok(Self {
            sub,
            jti,
            jtt,
            ver,
            exp,
            iat,
            iss,
            dbs,
            cid,
            org,
            env,
            tnt: raw.tnt,
            scp: raw.scp,
            aud: raw.aud,
            nonce: raw.nonce,
            email: raw.email,
            email_verified: raw.email_verified,
            phone_number_verified: raw.phone_number_verified,
            name: raw.name,
            given_name: raw.given_name,
            family_name: raw.family_name,
            user_metadata: raw.user_metadata,
            app_metadata: raw.app_metadata,
            client_id: raw.client_id,
            at_hash: raw.at_hash,
            c_hash: raw.c_hash,
            extra: raw.extra,
        })
    }

    /// Canonical subject id: the last `|`-separated segment of `sub`
    pub fn subject_id(&self) -> &str {
        self.sub.rsplit('|').next().unwrap_or(&self.sub)
    }

    /// Realm prefix of a realm-qualified subject
    pub fn realm(&self) -> Option<&str> {
        self.sub.rsplit_once('|').map(|(realm, _)| realm)
    }

    /// Owning domain: `org` when present, else `tnt`
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::MissingDomain`] when the token carries neither.
    pub fn domain(&self) -> Result<&str, ClaimsError> {
        self.org
            .as_deref()
            .filter(|org| !org.is_empty())
            .or_else(|| self.tnt.as_deref().filter(|tnt| !tnt.is_empty()))
            .ok_or(ClaimsError::MissingDomain)
    }

    /// Whether `scope` was granted
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scp.iter().any(|s| s == scope)
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Issued-at as a timestamp
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }
}

fn deserialize_claims<T: DeserializeOwned>(doc: &Claims) -> Result<T, ClaimsError> {
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|e| ClaimsError::Shape(e.to_string()))
}

/// Present and non-empty
fn required(value: Option<String>, claim: &'static str) -> Result<String, ClaimsError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ClaimsError::Missing(claim))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// `"a"` and `["a", "b"]` are both accepted; `null` reads as empty
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringOrList::One(value)) => vec![value],
        Some(StringOrList::Many(values)) => values,
    })
}
