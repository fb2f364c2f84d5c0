//! Order status values.
//!
//! The order store deliberately accepts any status string (transitions are
//! caller-driven, there is no enforced state machine). This enum covers the
//! values the system itself assigns or documents; use [`OrderStatus::parse`]
//! for lenient recognition of incoming strings.

use serde::{Deserialize, Serialize};

/// Known order status values.
///
/// `Pending` is the only system-assigned state (set on creation). The rest
/// are written by external request with no ordering enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// All known statuses, for tool schema documentation.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Confirmed, Self::Paid, Self::Cancelled];

    /// The canonical lowercase string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Recognize a status string, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for values outside the documented set. Callers that
    /// preserve the store's permissive behavior should treat `None` as
    /// "unknown but still writable".
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_as_str_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!(OrderStatus::parse(" PAID "), Some(OrderStatus::Paid));
        assert_eq!(OrderStatus::parse("Cancelled"), Some(OrderStatus::Cancelled));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(OrderStatus::parse("shipped"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Paid).expect("serialize");
        assert_eq!(json, "\"paid\"");
    }
}
