//! Coupons
//!
//! Coupon model and the per-item eligibility filter. A coupon carries an
//! optional constraint set; every populated axis must pass for an item to be
//! eligible, and an absent list imposes no restriction on that axis.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::items::LineItem;

/// A validated coupon, as returned by the validation service and persisted
/// to device storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Display code the shopper entered.
    pub code: String,

    /// Whole-number percentage off, `0..=100`.
    #[serde(rename = "discountPercent")]
    pub discount_percent: u8,

    /// Optional constraint set; `None` means the coupon applies everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<CouponLimitations>,
}

/// Constraint set attached to a coupon. Every list is optional; an absent
/// list means "no restriction on that axis".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponLimitations {
    /// Millilitre sizes the coupon covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_sizes: Option<Vec<u32>>,

    /// Brands the coupon covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_brands: Option<Vec<String>>,

    /// Categories the coupon covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_categories: Option<Vec<String>>,

    /// Product ids the coupon covers; compared as strings so composite ids
    /// such as `"prize-10"` work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_products: Option<Vec<String>>,

    /// Account emails allowed to redeem; checked once per cart, not per item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,

    /// Minimum raw cart subtotal, in major units, before the coupon applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cart_total: Option<u32>,
}

impl Coupon {
    /// The discount as a decimal fraction (`0.1` for 10%).
    #[must_use]
    pub fn fraction(&self) -> Decimal {
        Decimal::from(self.discount_percent) / Decimal::ONE_HUNDRED
    }

    /// Cart-level redemption check: the holder passes the user allow-list
    /// and the raw subtotal meets the minimum. Item-level axes are judged
    /// separately by [`Coupon::item_eligible`].
    #[must_use]
    pub fn applies(&self, email: Option<&str>, subtotal: Money<'static, Currency>) -> bool {
        self.limitations.as_ref().is_none_or(|limitations| {
            limitations.user_allowed(email) && limitations.meets_minimum(subtotal)
        })
    }

    /// Whether a line item passes every populated constraint axis.
    #[must_use]
    pub fn item_eligible(&self, item: &LineItem) -> bool {
        self.limitations
            .as_ref()
            .is_none_or(|limitations| limitations.item_eligible(item))
    }
}

impl CouponLimitations {
    /// Whether the holder's email passes the user allow-list.
    ///
    /// A populated list with no signed-in holder always fails; matching is
    /// case-insensitive.
    #[must_use]
    pub fn user_allowed(&self, email: Option<&str>) -> bool {
        match &self.allowed_users {
            None => true,
            Some(users) => {
                email.is_some_and(|email| users.iter().any(|user| eq_ci(user, email)))
            }
        }
    }

    /// Whether the raw subtotal reaches `min_cart_total`.
    #[must_use]
    pub fn meets_minimum(&self, subtotal: Money<'static, Currency>) -> bool {
        match self.min_cart_total {
            None => true,
            Some(minimum) => {
                let minimum = Money::from_major(i64::from(minimum), subtotal.currency());

                subtotal.to_minor_units() >= minimum.to_minor_units()
            }
        }
    }

    /// Per-item predicate: every populated axis is ANDed; an absent list
    /// passes. A `Set` size never matches a numeric size list.
    #[must_use]
    pub fn item_eligible(&self, item: &LineItem) -> bool {
        if let Some(sizes) = &self.allowed_sizes {
            let Some(ml) = item.size.millilitres() else {
                return false;
            };

            if !sizes.contains(&ml) {
                return false;
            }
        }

        if let Some(brands) = &self.allowed_brands {
            if !brands.iter().any(|brand| eq_ci(brand, &item.brand)) {
                return false;
            }
        }

        if let Some(categories) = &self.allowed_categories {
            if !categories
                .iter()
                .any(|category| eq_ci(category, &item.category))
            {
                return false;
            }
        }

        if let Some(products) = &self.allowed_products {
            if !products.iter().any(|product| eq_ci(product, &item.id)) {
                return false;
            }
        }

        true
    }
}

/// Trimmed, case-insensitive comparison used across all string axes.
fn eq_ci(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
