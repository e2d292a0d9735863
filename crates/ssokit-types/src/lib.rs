//! # ssokit Types
//!
//! Response-side types for the ssokit identity SDK.
//!
//! - **Result envelope**: [`ApiResult`], the two-variant success/error outcome
//!   returned by every fallible SDK surface
//! - **Resources**: [`Resource`] and its typed variants (`Organization`,
//!   `Environment`, `User`, ...), each carrying the `__type__` discriminator
//! - **Collections**: [`Page`] envelopes with pagination and total count
//! - **Decoding**: [`ResourceDecoder`], a static discriminator table that turns
//!   raw JSON bodies into typed resources
//!
//! ## Quick Start
//!
//! ```rust
//! use ssokit_types::{Decoded, ResourceDecoder};
//!
//! let body = r#"{"__type__": "Organization", "id": "org_1", "name": "Acme"}"#;
//!
//! let result = ResourceDecoder::decode(body);
//! assert!(result.is_success());
//!
//! if let Some(Decoded::Single(resource)) = result.success() {
//!     assert_eq!(resource.type_tag(), "Organization");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod decoder;
pub mod error;
pub mod resource;
pub mod result;

pub use decoder::{DISCRIMINATOR, Decoded, ResourceDecoder};
pub use error::DecodeError;
pub use resource::*;
pub use result::ApiResult;

/// Version of the ssokit types crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
