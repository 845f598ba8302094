//! Persisted record shapes.
//!
//! Serde mirrors of the domain types, with prices carried as plain
//! minor-unit integers. Records are what crosses the storage and wire
//! boundaries; the store converts them back to domain types on hydration.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use sillage::{
    items::{LineItem, Size},
    lottery::LotteryMode,
    prize::LuckyPrize,
};

/// One persisted cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    /// Product identifier.
    pub id: String,

    /// Size in the storefront wire form.
    pub size: Size,

    /// Unit price in minor units.
    pub unit_price: i64,

    /// Count of units.
    pub quantity: u32,

    /// Prize-line marker.
    #[serde(default)]
    pub is_prize: bool,

    /// Lottery-bundle marker.
    #[serde(default)]
    pub is_lottery_item: bool,

    /// Cached brand for coupon eligibility.
    #[serde(default)]
    pub brand: String,

    /// Cached category for coupon eligibility.
    #[serde(default)]
    pub category: String,

    /// Cached stock ceiling in millilitres.
    #[serde(default)]
    pub stock_ml: Option<u32>,
}

impl LineItemRecord {
    /// Snapshot a domain line into its persisted form.
    #[must_use]
    pub fn from_item(item: &LineItem) -> Self {
        Self {
            id: item.id.clone(),
            size: item.size,
            unit_price: item.unit_price.to_minor_units(),
            quantity: item.quantity,
            is_prize: item.is_prize,
            is_lottery_item: item.is_lottery_item,
            brand: item.brand.clone(),
            category: item.category.clone(),
            stock_ml: item.stock_ml,
        }
    }

    /// Rebuild the domain line in the given currency.
    #[must_use]
    pub fn into_item(self, currency: &'static Currency) -> LineItem {
        LineItem {
            id: self.id,
            size: self.size,
            unit_price: Money::from_minor(self.unit_price, currency),
            quantity: self.quantity,
            is_prize: self.is_prize,
            is_lottery_item: self.is_lottery_item,
            brand: self.brand,
            category: self.category,
            stock_ml: self.stock_ml,
        }
    }
}

/// The persisted cart: its lines plus any held prize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    /// Persisted cart lines, in display order.
    #[serde(default)]
    pub items: Vec<LineItemRecord>,

    /// Held lucky prize, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<LuckyPrize>,
}

/// The persisted lottery session. Only active sessions are stored; the
/// record is removed whenever the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRecord {
    /// Absolute expiry instant of the session.
    pub expires_at: Timestamp,
}

impl LotteryRecord {
    /// The persisted form of a mode, when it is active.
    #[must_use]
    pub fn from_mode(mode: &LotteryMode) -> Option<Self> {
        mode.expires_at().map(|expires_at| Self { expires_at })
    }

    /// Rebuild the active mode this record described.
    #[must_use]
    pub fn into_mode(self) -> LotteryMode {
        LotteryMode::Active {
            expires_at: self.expires_at,
        }
    }
}
