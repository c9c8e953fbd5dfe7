//! Status enums for catalog entities.

use serde::{Deserialize, Serialize};

/// Catalog product lifecycle status.
///
/// Only `published` products are shown on the storefront; `draft` and
/// `archived` products remain addressable by ID for existing cart snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ProductStatus {
    /// The status as its lowercase wire/storage string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Parse a storage string back into a status.
    ///
    /// Unknown values come back as `None` rather than defaulting, so data
    /// corruption surfaces at the repository layer.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for status in [
            ProductStatus::Draft,
            ProductStatus::Published,
            ProductStatus::Archived,
        ] {
            assert_eq!(ProductStatus::from_str_opt(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_unknown_is_none() {
        assert_eq!(ProductStatus::from_str_opt("deleted"), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ProductStatus::Published).expect("serializes");
        assert_eq!(json, "\"published\"");
    }
}
