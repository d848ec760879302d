pub mod followed_order;
pub mod order_event;
pub mod user;

pub use followed_order::FollowedOrder;
pub use order_event::OrderEvent;
pub use user::UserAccount;

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" | "0" => Some(Side::Buy),
            "SELL" | "1" => Some(Side::Sell),
            _ => None,
        }
    }

    /// The side that closes a position opened on this side.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parses_api_variants() {
        assert_eq!(Side::from_api_str("buy"), Some(Side::Buy));
        assert_eq!(Side::from_api_str("SELL"), Some(Side::Sell));
        assert_eq!(Side::from_api_str("0"), Some(Side::Buy));
        assert_eq!(Side::from_api_str("hold"), None);
    }

    #[test]
    fn close_side_is_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
