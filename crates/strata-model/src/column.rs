use std::fmt;

/// Reserved key carrying the row's own identifier in `get_columns` results.
/// Qualified names always contain a colon, so this can never collide.
pub const ROW_ID_KEY: &str = "id";

/// A parsed column address.
///
/// Wire form is `"family:qualifier"` for a single cell, or `"family:"`
/// (trailing colon, no qualifier) for every qualifier currently present
/// under the family. The adjacent record layer builds these strings
/// directly, so `Display` re-emits exactly the wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnAddress {
    Qualified { family: String, qualifier: String },
    Wildcard { family: String },
}

impl ColumnAddress {
    /// Parse a wire-form address. The family must be non-empty, and neither
    /// part may contain NUL (reserved as the cell key separator).
    pub fn parse(s: &str) -> Result<Self, InvalidAddress> {
        let Some((family, qualifier)) = s.split_once(':') else {
            return Err(InvalidAddress(s.to_string()));
        };
        if family.is_empty() || family.contains('\0') || qualifier.contains('\0') {
            return Err(InvalidAddress(s.to_string()));
        }
        if qualifier.is_empty() {
            Ok(ColumnAddress::Wildcard {
                family: family.to_string(),
            })
        } else {
            Ok(ColumnAddress::Qualified {
                family: family.to_string(),
                qualifier: qualifier.to_string(),
            })
        }
    }

    pub fn family(&self) -> &str {
        match self {
            ColumnAddress::Qualified { family, .. } => family,
            ColumnAddress::Wildcard { family } => family,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        match self {
            ColumnAddress::Qualified { qualifier, .. } => Some(qualifier),
            ColumnAddress::Wildcard { .. } => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ColumnAddress::Wildcard { .. })
    }
}

impl fmt::Display for ColumnAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnAddress::Qualified { family, qualifier } => {
                write!(f, "{family}:{qualifier}")
            }
            ColumnAddress::Wildcard { family } => write!(f, "{family}:"),
        }
    }
}

/// The offending input of an unparseable column address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAddress(pub String);

impl fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid column address: {:?}", self.0)
    }
}

impl std::error::Error for InvalidAddress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_address_roundtrip() {
        let addr = ColumnAddress::parse("info:name").unwrap();
        assert_eq!(addr.family(), "info");
        assert_eq!(addr.qualifier(), Some("name"));
        assert!(!addr.is_wildcard());
        assert_eq!(addr.to_string(), "info:name");
    }

    #[test]
    fn wildcard_address_roundtrip() {
        let addr = ColumnAddress::parse("info:").unwrap();
        assert_eq!(addr.family(), "info");
        assert_eq!(addr.qualifier(), None);
        assert!(addr.is_wildcard());
        assert_eq!(addr.to_string(), "info:");
    }

    #[test]
    fn qualifier_may_itself_contain_colons() {
        let addr = ColumnAddress::parse("attrs:path:to:key").unwrap();
        assert_eq!(addr.family(), "attrs");
        assert_eq!(addr.qualifier(), Some("path:to:key"));
        assert_eq!(addr.to_string(), "attrs:path:to:key");
    }

    #[test]
    fn rejects_missing_colon_and_empty_family() {
        assert!(ColumnAddress::parse("info").is_err());
        assert!(ColumnAddress::parse(":name").is_err());
        assert!(ColumnAddress::parse("").is_err());
    }

    #[test]
    fn rejects_nul_bytes() {
        assert!(ColumnAddress::parse("in\0fo:name").is_err());
        assert!(ColumnAddress::parse("info:na\0me").is_err());
    }
}
