//! Resource decoding errors

use thiserror::Error;

/// Why a response body could not be turned into a typed resource
///
/// Every variant is recoverable at the call site: decoding never panics on
/// peer-supplied input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Body is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Body (or a collection element) is valid JSON but not an object
    #[error("expected a JSON object")]
    NotAnObject,

    /// No discriminator field where one is required
    #[error("missing discriminator field `{0}`")]
    MissingDiscriminator(&'static str),

    /// Discriminator names a type with no registered decoder
    #[error("no decoder for type {0}")]
    UnknownType(String),

    /// The selected decoder rejected the object
    #[error("invalid {type_tag} resource: {reason}")]
    InvalidResource {
        /// Discriminator of the rejected object
        type_tag: String,
        /// Underlying decoder message
        reason: String,
    },

    /// Collection envelope is missing or mistyping its fields
    #[error("invalid collection envelope: {0}")]
    InvalidEnvelope(String),
}

impl DecodeError {
    /// The discriminator involved in the failure, when one was read
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Self::UnknownType(tag) => Some(tag),
            Self::InvalidResource { type_tag, .. } => Some(type_tag),
            _ => None,
        }
    }
}
