//! Lucky Prizes
//!
//! Rewards won through the storefront's mini-games. A prize is either a
//! cart-level discount fraction or a free item that materialises as a
//! zero-price prize line. Keeping a prize requires the raw subtotal to stay
//! at or above a configured floor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::items::Size;

/// A reward held against the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LuckyPrize {
    /// A cart-level discount, as a fraction in `0..=1`.
    Discount {
        /// Discount fraction, e.g. `0.1` for 10% off.
        value: Decimal,
    },

    /// A free item, added to the cart as a zero-price prize line.
    Item {
        /// Synthetic product id of the prize line, e.g. `"prize-10"`.
        id: String,

        /// Size of the prize line.
        size: Size,
    },
}

impl LuckyPrize {
    /// The discount fraction, for discount-type prizes.
    #[must_use]
    pub const fn discount_value(&self) -> Option<Decimal> {
        match self {
            Self::Discount { value } => Some(*value),
            Self::Item { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn discount_value_is_only_present_on_discount_prizes() {
        let discount = LuckyPrize::Discount {
            value: Decimal::new(1, 1),
        };
        let item = LuckyPrize::Item {
            id: "prize-10".to_string(),
            size: Size::Ml(10),
        };

        assert_eq!(discount.discount_value(), Some(Decimal::new(1, 1)));
        assert_eq!(item.discount_value(), None);
    }

    #[test]
    fn wire_form_is_tagged_by_type() -> TestResult {
        let prize: LuckyPrize = serde_json::from_str(r#"{"type":"discount","value":0.1}"#)?;

        assert_eq!(prize.discount_value(), Some(Decimal::new(1, 1)));

        let prize: LuckyPrize = serde_json::from_str(r#"{"type":"item","id":"prize-10","size":"10"}"#)?;

        assert!(matches!(prize, LuckyPrize::Item { .. }));

        Ok(())
    }
}
