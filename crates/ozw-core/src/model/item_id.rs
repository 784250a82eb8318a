// ── Child identity ──
//
// Every collection item is keyed by the topic segment that created it.
// Canonical decimal segments (node ids, value indexes, ...) become a
// number so lookups work with either `1` or `"1"`. Anything else,
// including zero-padded digits, stays the exact text it arrived as.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── ItemId ──────────────────────────────────────────────────────────

/// Identifier of an entity inside its owning collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Name(String),
}

impl ItemId {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// Whether a topic segment may address a direct collection without
/// naming it first. Only plain decimal segments qualify.
pub fn is_identifier(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for ItemId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        if is_identifier(s) && (s == "0" || !s.starts_with('0')) {
            if let Ok(n) = s.parse::<u64>() {
                return Self::Number(n);
            }
        }
        Self::Name(s.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Number(n) => Self::Number(n),
            Self::Name(_) => Self::Name(s),
        }
    }
}

impl From<&String> for ItemId {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&ItemId> for ItemId {
    fn from(id: &ItemId) -> Self {
        id.clone()
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for ItemId {
    fn from(n: u32) -> Self {
        Self::Number(u64::from(n))
    }
}

impl From<u16> for ItemId {
    fn from(n: u16) -> Self {
        Self::Number(u64::from(n))
    }
}

impl From<u8> for ItemId {
    fn from(n: u8) -> Self {
        Self::Number(u64::from(n))
    }
}

impl From<i32> for ItemId {
    fn from(n: i32) -> Self {
        u64::try_from(n).map_or_else(|_| Self::Name(n.to_string()), Self::Number)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segment_becomes_number() {
        assert_eq!(ItemId::from("42"), ItemId::Number(42));
        assert_eq!(ItemId::from("42"), ItemId::from(42));
    }

    #[test]
    fn named_segment_stays_name() {
        let id = ItemId::from("status");
        assert_eq!(id.as_name(), Some("status"));
        assert!(id.as_number().is_none());
    }

    #[test]
    fn overflowing_digits_fall_back_to_name() {
        let id = ItemId::from("99999999999999999999999");
        assert!(id.as_name().is_some());
    }

    #[test]
    fn zero_padded_segment_keeps_its_text() {
        let id = ItemId::from("007");
        assert_eq!(id, ItemId::Name("007".into()));
        assert_ne!(id, ItemId::from(7));
        assert_eq!(id.to_string(), "007");
        assert_eq!(ItemId::from("0"), ItemId::Number(0));
    }

    #[test]
    fn negative_integer_is_a_name() {
        assert_eq!(ItemId::from(-1), ItemId::Name("-1".into()));
    }

    #[test]
    fn identifier_check_only_accepts_digits() {
        assert!(is_identifier("12"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a1"));
        assert!(!is_identifier("-1"));
    }

    #[test]
    fn display_round_trips() {
        let id: ItemId = "7".parse().unwrap();
        assert_eq!(id.to_string(), "7");
        assert_eq!(ItemId::from("abc").to_string(), "abc");
    }
}
