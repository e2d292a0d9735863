//! Discriminated domain resources.
//!
//! Every object the identity service returns carries a `__type__`
//! discriminator, an `id`, and optionally the `environment` and owning
//! `domain` it belongs to. The per-type structs below model a handful of
//! well-known fields and keep everything else in `extra`, so schema drift on
//! the service side never makes a body undecodable.
//!
//! Collections arrive wrapped in a [`Page`] envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! resources {
    ($(
        $(#[$meta:meta])*
        $name:ident => $tag:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct $name {
                /// Discriminator (`__type__`)
                #[serde(rename = "__type__")]
                pub type_tag: String,
                /// Resource identifier
                pub id: String,
                /// Environment the resource lives in
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub environment: Option<String>,
                /// Owning domain
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub domain: Option<String>,
                $( $(#[$fmeta])* pub $field: $ty, )*
                /// Fields not modelled explicitly
                #[serde(flatten)]
                pub extra: Map<String, Value>,
            }

            impl $name {
                /// Discriminator value identifying this resource type
                pub const TYPE_TAG: &'static str = $tag;
            }

            impl From<$name> for Resource {
                fn from(resource: $name) -> Self {
                    Resource::$name(resource)
                }
            }
        )*

        /// Any resource the decoder knows how to produce
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum Resource {
            $(
                $(#[$meta])*
                $name($name),
            )*
        }

        impl Resource {
            /// Discriminator the resource was decoded from
            pub fn type_tag(&self) -> &str {
                match self {
                    $( Self::$name(r) => &r.type_tag, )*
                }
            }

            /// Resource identifier
            pub fn id(&self) -> &str {
                match self {
                    $( Self::$name(r) => &r.id, )*
                }
            }

            /// Environment, when the service reported one
            pub fn environment(&self) -> Option<&str> {
                match self {
                    $( Self::$name(r) => r.environment.as_deref(), )*
                }
            }

            /// Owning domain, when the service reported one
            pub fn domain(&self) -> Option<&str> {
                match self {
                    $( Self::$name(r) => r.domain.as_deref(), )*
                }
            }

            /// Unmodelled fields
            pub fn extra(&self) -> &Map<String, Value> {
                match self {
                    $( Self::$name(r) => &r.extra, )*
                }
            }
        }
    };
}

resources! {
    /// A tenant organization
    Organization => "Organization" {
        /// Machine name
        name: Option<String>,
        /// Name shown in hosted pages
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        /// Creation timestamp
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<DateTime<Utc>>,
    }

    /// A deployment environment (e.g. production, staging)
    Environment => "Environment" {
        /// Environment name
        name: Option<String>,
        /// Whether this is a production environment
        #[serde(default, skip_serializing_if = "Option::is_none")]
        production: Option<bool>,
    }

    /// An end user
    User => "User" {
        /// Primary email address
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        /// Whether the email address has been verified
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_verified: Option<bool>,
        /// Given name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        given_name: Option<String>,
        /// Family name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        family_name: Option<String>,
        /// Creation timestamp
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<DateTime<Utc>>,
    }

    /// A group of users
    Group => "Group" {
        /// Group name
        name: Option<String>,
        /// Number of members
        #[serde(default, skip_serializing_if = "Option::is_none")]
        member_count: Option<u64>,
    }

    /// A named bundle of permissions
    Role => "Role" {
        /// Role name
        name: Option<String>,
        /// Permission identifiers granted by the role
        #[serde(default)]
        permissions: Vec<String>,
    }

    /// A registered client application
    Application => "Application" {
        /// Application name
        name: Option<String>,
        /// OAuth client identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
        /// Registered redirect URIs
        #[serde(default)]
        redirect_uris: Vec<String>,
    }

    /// A long-lived API key
    ApiKey => "ApiKey" {
        /// Key label
        name: Option<String>,
        /// Scopes granted to the key
        #[serde(default)]
        scopes: Vec<String>,
        /// Expiry, if the key has one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
    }
}

/// Pagination cursor block of a collection envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    /// Offset of the first element in this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Maximum page size requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Cursor for the next page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Cursor for the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    /// Any other pagination fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Collection envelope: one page of resources plus the overall count
///
/// `total` is the service-side count and is independent of `data.len()`;
/// it usually exceeds the page size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Resources in this page, in service order
    pub data: Vec<T>,
    /// Pagination block, if the service sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Total number of matching resources
    pub total: u64,
}

impl<T> Page<T> {
    /// Number of resources in this page
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this page carries no resources
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether more resources exist beyond this page
    pub fn has_more(&self) -> bool {
        let offset = self
            .pagination
            .as_ref()
            .and_then(|p| p.offset)
            .unwrap_or(0);
        offset.saturating_add(self.data.len() as u64) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extra_fields_are_kept() {
        let org: Organization = serde_json::from_value(json!({
            "__type__": "Organization",
            "id": "org_1",
            "name": "acme",
            "plan": "enterprise",
        }))
        .unwrap();

        assert_eq!(org.name.as_deref(), Some("acme"));
        assert_eq!(org.extra.get("plan"), Some(&json!("enterprise")));
        assert!(!org.extra.contains_key("__type__"));
        assert!(!org.extra.contains_key("id"));
    }

    #[test]
    fn test_resource_accessors() {
        let user = User {
            type_tag: User::TYPE_TAG.to_string(),
            id: "usr_1".into(),
            environment: Some("prod".into()),
            domain: Some("acme".into()),
            email: Some("a@acme.test".into()),
            email_verified: Some(true),
            given_name: None,
            family_name: None,
            created_at: None,
            extra: Map::new(),
        };
        let resource = Resource::from(user);

        assert_eq!(resource.type_tag(), "User");
        assert_eq!(resource.id(), "usr_1");
        assert_eq!(resource.environment(), Some("prod"));
        assert_eq!(resource.domain(), Some("acme"));
    }

    #[test]
    fn test_resource_serializes_with_discriminator() {
        let role = Resource::Role(Role {
            type_tag: Role::TYPE_TAG.to_string(),
            id: "rol_1".into(),
            environment: None,
            domain: None,
            name: Some("admin".into()),
            permissions: vec!["users:read".into()],
            extra: Map::new(),
        });

        let value = serde_json::to_value(&role).unwrap();
        assert_eq!(value["__type__"], "Role");
        assert_eq!(value["permissions"], json!(["users:read"]));
        assert!(value.get("environment").is_none());
    }

    #[test]
    fn test_page_has_more() {
        let page: Page<u8> = Page {
            data: vec![1, 2],
            pagination: Some(Pagination {
                offset: Some(0),
                limit: Some(2),
                ..Pagination::default()
            }),
            total: 5,
        };
        assert!(page.has_more());
        assert_eq!(page.len(), 2);

        let last: Page<u8> = Page {
            data: vec![5],
            pagination: Some(Pagination {
                offset: Some(4),
                ..Pagination::default()
            }),
            total: 5,
        };
        assert!(!last.has_more());
    }

    #[test]
    fn test_page_has_more_with_huge_offset() {
        let page: Page<u8> = Page {
            data: vec![1],
            pagination: Some(Pagination {
                offset: Some(u64::MAX),
                ..Pagination::default()
            }),
            total: 1,
        };
        assert!(!page.has_more());
    }
}
