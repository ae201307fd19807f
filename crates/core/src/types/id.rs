//! Newtype IDs for Shopify resources.
//!
//! Shopify hands out global IDs of the form `gid://shopify/Order/123`, while
//! webhook payloads carry the bare number. Every resource ID is stored as the
//! numeric tail, and the `define_shopify_id!` macro generates wrappers that
//! accept either form and prevent mixing IDs of different resources.

use thiserror::Error;

/// Errors produced when parsing a Shopify ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input was empty or whitespace.
    #[error("empty id")]
    Empty,

    /// The GID names a different resource type.
    #[error("expected a gid://shopify/{expected}/<id>, got {got}")]
    WrongResource {
        /// Resource the caller asked for.
        expected: &'static str,
        /// The raw input.
        got: String,
    },

    /// The numeric part did not parse.
    #[error("invalid numeric id: {0}")]
    NotNumeric(String),
}

/// Extract the numeric tail of a Shopify GID (or a bare numeric ID).
///
/// # Errors
///
/// Returns `IdError` if the input is empty, names another resource, or the
/// tail is not an integer.
pub fn parse_gid_tail(raw: &str, resource: &'static str) -> Result<i64, IdError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(IdError::Empty);
    }

    let tail = match raw.strip_prefix("gid://shopify/") {
        Some(rest) => {
            let (kind, id) = rest.split_once('/').ok_or_else(|| IdError::WrongResource {
                expected: resource,
                got: raw.to_string(),
            })?;
            if kind != resource {
                return Err(IdError::WrongResource {
                    expected: resource,
                    got: raw.to_string(),
                });
            }
            // Some GIDs carry a query suffix, e.g. `?inventory_item_id=...`
            id.split_once('?').map_or(id, |(head, _)| head)
        }
        None => raw,
    };

    tail.parse::<i64>()
        .map_err(|_| IdError::NotNumeric(tail.to_string()))
}

/// Macro to define a type-safe Shopify resource ID.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `parse()` accepting `gid://shopify/<Resource>/<n>` or `<n>`
/// - `gid()` producing the GraphQL global ID
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use trackscore_core::define_shopify_id;
/// define_shopify_id!(LocationId, "Location");
///
/// let id = LocationId::parse("gid://shopify/Location/42").unwrap();
/// assert_eq!(id.as_i64(), 42);
/// assert_eq!(id.gid(), "gid://shopify/Location/42");
/// ```
#[macro_export]
macro_rules! define_shopify_id {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Shopify resource name used in GIDs.
            pub const RESOURCE: &'static str = $resource;

            /// Create an ID from its numeric value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying numeric value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            /// Parse a GID or bare numeric ID.
            ///
            /// # Errors
            ///
            /// Returns `IdError` if the input is not an ID of this resource.
            pub fn parse(raw: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::parse_gid_tail(raw, $resource).map(Self)
            }

            /// The GraphQL global ID for this resource.
            #[must_use]
            pub fn gid(&self) -> String {
                format!("gid://shopify/{}/{}", $resource, self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i64 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i64 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i64 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i64 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_shopify_id!(OrderId, "Order");
define_shopify_id!(CustomerId, "Customer");
define_shopify_id!(ProductId, "Product");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gid() {
        let id = OrderId::parse("gid://shopify/Order/5512345678").unwrap();
        assert_eq!(id.as_i64(), 5_512_345_678);
    }

    #[test]
    fn test_parse_bare_number() {
        let id = OrderId::parse(" 42 ").unwrap();
        assert_eq!(id, OrderId::new(42));
    }

    #[test]
    fn test_parse_wrong_resource() {
        let err = OrderId::parse("gid://shopify/Customer/1").unwrap_err();
        assert!(matches!(err, IdError::WrongResource { expected: "Order", .. }));
    }

    #[test]
    fn test_parse_query_suffix() {
        let id = ProductId::parse("gid://shopify/Product/9?variant=1").unwrap();
        assert_eq!(id.as_i64(), 9);
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(OrderId::parse(""), Err(IdError::Empty));
        assert!(matches!(
            OrderId::parse("#ORD-001"),
            Err(IdError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_gid_round_trip() {
        let id = CustomerId::new(77);
        assert_eq!(id.gid(), "gid://shopify/Customer/77");
        assert_eq!(id.to_string(), "77");
        assert_eq!(id.gid().parse::<CustomerId>().unwrap(), id);
    }
}
