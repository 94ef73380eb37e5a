use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifies what a cart entry points at: a bare product, or a
/// (variant, size) combination.
///
/// The string form (`"12"` or `"4-7"`) is what travels over the wire and
/// into session storage; it is decoded into this enum once, when the entry
/// is created, and never re-parsed at read sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LineItemKey {
    Simple(i64),
    Variant { variant_id: i64, size_id: i64 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid line item key: {0}")]
pub struct ParseLineItemKeyError(String);

impl FromStr for LineItemKey {
    type Err = ParseLineItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            None => s
                .parse::<i64>()
                .map(LineItemKey::Simple)
                .map_err(|_| ParseLineItemKeyError(s.to_string())),
            Some((variant, size)) => {
                let variant_id = variant
                    .parse::<i64>()
                    .map_err(|_| ParseLineItemKeyError(s.to_string()))?;
                let size_id = size
                    .parse::<i64>()
                    .map_err(|_| ParseLineItemKeyError(s.to_string()))?;
                Ok(LineItemKey::Variant { variant_id, size_id })
            }
        }
    }
}

impl fmt::Display for LineItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineItemKey::Simple(id) => write!(f, "{}", id),
            LineItemKey::Variant { variant_id, size_id } => write!(f, "{}-{}", variant_id, size_id),
        }
    }
}

// Serialized as its string form so it can be a JSON map key in session storage.
impl Serialize for LineItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LineItemKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_key() {
        assert_eq!("12".parse::<LineItemKey>().unwrap(), LineItemKey::Simple(12));
    }

    #[test]
    fn test_parse_variant_key() {
        assert_eq!(
            "4-7".parse::<LineItemKey>().unwrap(),
            LineItemKey::Variant {
                variant_id: 4,
                size_id: 7
            }
        );
    }

    #[test]
    fn test_display_round_trip() {
        for raw in ["12", "4-7", "100-3"] {
            let key: LineItemKey = raw.parse().unwrap();
            assert_eq!(key.to_string(), raw);
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("".parse::<LineItemKey>().is_err());
        assert!("abc".parse::<LineItemKey>().is_err());
        assert!("4-".parse::<LineItemKey>().is_err());
        assert!("-7".parse::<LineItemKey>().is_err());
        assert!("4-7-9".parse::<LineItemKey>().is_err());
        assert!("4-x".parse::<LineItemKey>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let key = LineItemKey::Variant {
            variant_id: 4,
            size_id: 7,
        };
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"4-7\"");
        let back: LineItemKey = serde_json::from_str("\"4-7\"").unwrap();
        assert_eq!(back, key);
    }
}
