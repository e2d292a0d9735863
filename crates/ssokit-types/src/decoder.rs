//! Discriminator-driven response decoding
//!
//! Response bodies from the identity service are either a single resource or
//! a collection envelope (`{data, pagination, total}`). Both are routed through
//! a static table keyed by the `__type__` discriminator:
//!
//! - single resource: the top-level discriminator selects the decoder
//! - collection: the discriminator of the **first** element of `data` selects
//!   the decoder applied to every element
//!
//! Registering a new resource type is one entry in [`DECODERS`]; the dispatch
//! logic never changes. Failures come back as [`ApiResult::Error`] values,
//! never as panics.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::resource::{
    ApiKey, Application, Environment, Group, Organization, Page, Pagination, Resource, Role, User,
};
use crate::result::ApiResult;

/// Reserved field naming an object's resource type
pub const DISCRIMINATOR: &str = "__type__";

/// Decode one JSON object into a typed resource
pub type DecodeFn = fn(Value) -> Result<Resource, serde_json::Error>;

fn decode_as<T>(value: Value) -> Result<Resource, serde_json::Error>
where
    T: DeserializeOwned + Into<Resource>,
{
    serde_json::from_value::<T>(value).map(Into::into)
}

/// Tag → decoder table, built once on first use
static DECODERS: Lazy<HashMap<&'static str, DecodeFn>> = Lazy::new(|| {
    let entries: [(&'static str, DecodeFn); 7] = [
        (Organization::TYPE_TAG, decode_as::<Organization>),
        (Environment::TYPE_TAG, decode_as::<Environment>),
        (User::TYPE_TAG, decode_as::<User>),
        (Group::TYPE_TAG, decode_as::<Group>),
        (Role::TYPE_TAG, decode_as::<Role>),
        (Application::TYPE_TAG, decode_as::<Application>),
        (ApiKey::TYPE_TAG, decode_as::<ApiKey>),
    ];
    entries.into_iter().collect()
});

/// A decoded response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded {
    /// A single resource
    Single(Resource),
    /// A page of resources
    Page(Page<Resource>),
}

impl Decoded {
    /// The single resource, if this body was not a collection
    pub fn into_single(self) -> Option<Resource> {
        match self {
            Self::Single(resource) => Some(resource),
            Self::Page(_) => None,
        }
    }

    /// The page, if this body was a collection
    pub fn into_page(self) -> Option<Page<Resource>> {
        match self {
            Self::Single(_) => None,
            Self::Page(page) => Some(page),
        }
    }
}

/// Stateless decoder for identity-service response bodies
///
/// # Example
///
/// ```rust
/// use ssokit_types::{ApiResult, DecodeError, ResourceDecoder};
///
/// let result = ResourceDecoder::decode(r#"{"__type__": "Bogus", "id": "x"}"#);
/// assert_eq!(result, ApiResult::Error(DecodeError::UnknownType("Bogus".into())));
/// assert_eq!(result.message().unwrap(), "no decoder for type Bogus");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceDecoder;

impl ResourceDecoder {
    /// Decode a raw JSON body
    pub fn decode(raw: &str) -> ApiResult<Decoded, DecodeError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::decode_value(value),
            Err(e) => ApiResult::Error(DecodeError::InvalidJson(e.to_string())),
        }
    }

    /// Decode a raw JSON body held as bytes
    pub fn decode_slice(raw: &[u8]) -> ApiResult<Decoded, DecodeError> {
        match serde_json::from_slice::<Value>(raw) {
            Ok(value) => Self::decode_value(value),
            Err(e) => ApiResult::Error(DecodeError::InvalidJson(e.to_string())),
        }
    }

    /// Decode an already-parsed JSON document
    pub fn decode_value(value: Value) -> ApiResult<Decoded, DecodeError> {
        let result = decode_document(value);
        if let Err(ref e) = result {
            debug!(error = %e, "Response body did not decode");
        }
        result.into()
    }

    /// Whether a decoder is registered for `type_tag`
    pub fn supports(type_tag: &str) -> bool {
        DECODERS.contains_key(type_tag)
    }

    /// Registered discriminators, sorted
    pub fn known_types() -> Vec<&'static str> {
        let mut tags: Vec<_> = DECODERS.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

fn decode_document(value: Value) -> Result<Decoded, DecodeError> {
    let Value::Object(object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let is_envelope = match object.get("data") {
        Some(Value::Array(items)) if !items.is_empty() => true,
        // An empty page has no element to read a discriminator from
        Some(Value::Array(_)) => !object.contains_key(DISCRIMINATOR),
        _ => false,
    };

    if is_envelope {
        decode_page(object).map(Decoded::Page)
    } else {
        decode_single(object).map(Decoded::Single)
    }
}

fn decode_single(object: Map<String, Value>) -> Result<Resource, DecodeError> {
    let type_tag = discriminator_of(&object)?.to_owned();
    let decoder = lookup(&type_tag)?;

    decoder(Value::Object(object)).map_err(|e| DecodeError::InvalidResource {
        type_tag,
        reason: e.to_string(),
    })
}

fn decode_page(mut object: Map<String, Value>) -> Result<Page<Resource>, DecodeError> {
    let total = object
        .get("total")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            DecodeError::InvalidEnvelope("`total` must be a non-negative integer".to_string())
        })?;

    let pagination = match object.remove("pagination") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<Pagination>(value)
                .map_err(|e| DecodeError::InvalidEnvelope(format!("pagination: {e}")))?,
        ),
    };

    let items = match object.remove("data") {
        Some(Value::Array(items)) => items,
        _ => return Err(DecodeError::InvalidEnvelope("`data` must be an array".to_string())),
    };

    let Some(first) = items.first() else {
        return Ok(Page {
            data: Vec::new(),
            pagination,
            total,
        });
    };

    let type_tag = match first {
        Value::Object(element) => discriminator_of(element)?.to_owned(),
        _ => return Err(DecodeError::NotAnObject),
    };
    let decoder = lookup(&type_tag)?;

    let mut data = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if let Some(tag) = item.get(DISCRIMINATOR).and_then(Value::as_str)
            && tag != type_tag
        {
            warn!(
                expected = %type_tag,
                found = %tag,
                index,
                "Mixed-type collection, decoding with the first element's decoder"
            );
        }

        let resource = decoder(item).map_err(|e| DecodeError::InvalidResource {
            type_tag: type_tag.clone(),
            reason: format!("element {index}: {e}"),
        })?;
        data.push(resource);
    }

    Ok(Page {
        data,
        pagination,
        total,
    })
}

fn discriminator_of(object: &Map<String, Value>) -> Result<&str, DecodeError> {
    object
        .get(DISCRIMINATOR)
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingDiscriminator(DISCRIMINATOR))
}

fn lookup(type_tag: &str) -> Result<DecodeFn, DecodeError> {
    DECODERS
        .get(type_tag)
        .copied()
        .ok_or_else(|| DecodeError::UnknownType(type_tag.to_owned()))
}
