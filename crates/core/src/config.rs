//! Pricing Configuration

use decimal_percentage::Percentage;
use jiff::Span;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use smallvec::{SmallVec, smallvec};

use crate::samples::SampleTier;

/// Storefront pricing constants.
///
/// The defaults are the live storefront's values; tests and embedders can
/// build their own to exercise other ladders and floors.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Currency every cart price must carry.
    pub currency: &'static Currency,

    /// Flat shipping added after all discounts.
    pub shipping_cost: Money<'static, Currency>,

    /// Flat discount on the item subtotal while lottery mode is active.
    pub lottery_discount: Percentage,

    /// How long a lottery session locks the cart.
    pub lottery_duration: Span,

    /// Raw-subtotal floor below which a held lucky prize is forfeited.
    pub prize_min_subtotal: Money<'static, Currency>,

    /// Free-sample ladder, sorted by descending threshold.
    pub sample_tiers: SmallVec<[SampleTier; 3]>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let currency = iso::TWD;

        Self {
            currency,
            shipping_cost: Money::from_major(60, currency),
            lottery_discount: Percentage::from(0.15),
            lottery_duration: Span::new().minutes(10),
            prize_min_subtotal: Money::from_major(1200, currency),
            sample_tiers: smallvec![
                SampleTier {
                    threshold: Money::from_major(1000, currency),
                    free_samples: 6,
                },
                SampleTier {
                    threshold: Money::from_major(500, currency),
                    free_samples: 4,
                },
                SampleTier {
                    threshold: Money::from_major(300, currency),
                    free_samples: 2,
                },
            ],
        }
    }
}

impl PricingConfig {
    /// Zero in the configured currency.
    #[must_use]
    pub fn zero(&self) -> Money<'static, Currency> {
        Money::from_minor(0, self.currency)
    }
}
