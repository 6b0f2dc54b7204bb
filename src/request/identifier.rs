//! Request type identifiers.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag naming the semantic kind of a webhook request.
///
/// Used as the [`HandlerRegistry`](crate::handler::HandlerRegistry) key.
/// Identifiers are plain strings on the wire (`"serviceCall"`), so any value
/// the hub contract grows is representable; the well-known ones are
/// associated constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestType(Cow<'static, str>);

impl RequestType {
    /// A service call on the hub (`domain.service` with `service_data`).
    pub const SERVICE_CALL: Self = Self::from_static("serviceCall");

    /// Fallback marker for requests no registered handler serves.
    pub const UNHANDLED: Self = Self::from_static("unhandled");

    /// Create an identifier from a static string (usable in consts).
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create an identifier from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RequestType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for RequestType {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrowed_and_owned_compare_equal() {
        assert_eq!(RequestType::SERVICE_CALL, RequestType::new("serviceCall"));
        assert_ne!(RequestType::SERVICE_CALL, RequestType::UNHANDLED);
    }

    #[test]
    fn test_display() {
        assert_eq!(RequestType::UNHANDLED.to_string(), "unhandled");
        assert_eq!(RequestType::from("any").as_str(), "any");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&RequestType::SERVICE_CALL).unwrap();
        assert_eq!(json, "\"serviceCall\"");

        let parsed: RequestType = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(parsed, RequestType::new("other"));
    }
}
