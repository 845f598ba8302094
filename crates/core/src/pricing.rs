//! Pricing
//!
//! The pricing evaluator: a pure function of the cart state, recomputed on
//! every read. The pipeline order is load-bearing: raw subtotal, then at
//! most one cart-level discount, then the coupon against the
//! already-discounted eligible share, then shipping. The free-sample ladder
//! is always judged on the raw subtotal.

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    config::PricingConfig,
    coupons::Coupon,
    discounts::{DiscountError, apportioned_minor, fraction_of_minor, percent_of_minor, ratio_of_minor},
    items::LineItem,
    lottery::LotteryMode,
    prize::LuckyPrize,
    samples::sample_allowance,
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Wrapped discount conversion error.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Everything the storefront derives from the cart. Never stored; recompute
/// on every read.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Raw item subtotal, before any discount.
    pub subtotal: Money<'static, Currency>,

    /// Total of every discount applied (cart-level plus coupon).
    pub discount_amount: Money<'static, Currency>,

    /// Flat shipping charge; never discounted.
    pub shipping_cost: Money<'static, Currency>,

    /// Discounted items plus shipping.
    pub total: Money<'static, Currency>,

    /// Complimentary samples earned by the raw subtotal.
    pub free_samples: u32,

    /// Additional spend to the next sample tier; zero at the top tier.
    pub next_tier: Money<'static, Currency>,
}

/// Sum the line totals of a cart.
///
/// An empty cart totals zero in the given currency; prize lines carry a
/// zero price and so contribute nothing.
///
/// # Errors
///
/// Returns a [`MoneyError`] when a line's currency differs from `currency`.
pub fn subtotal(
    items: &[LineItem],
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, MoneyError> {
    items
        .iter()
        .try_fold(Money::from_minor(0, currency), |acc, item| {
            acc.add(item.line_total())
        })
}

/// Price the cart.
///
/// Pipeline, in order:
///
/// 1. raw `subtotal` over all lines;
/// 2. at most one cart-level discount: the lottery discount while a session
///    is active, else a held discount-type lucky prize; the two never stack;
/// 3. the coupon, when the holder passes its allow-list and the **raw**
///    subtotal meets its minimum: the percentage is taken from the
///    already-discounted amount apportioned by the eligible-item ratio (a
///    deliberate stacking choice the storefront ships with);
/// 4. flat shipping;
/// 5. the free-sample ladder, judged on the raw subtotal.
///
/// Each discount is rounded half away from zero at its own step and nowhere
/// else.
///
/// # Errors
///
/// Returns a [`PricingError`] on a currency mismatch between a line and the
/// configured currency, or when a discount conversion overflows.
pub fn evaluate(
    items: &[LineItem],
    coupon: Option<&Coupon>,
    user_email: Option<&str>,
    prize: Option<&LuckyPrize>,
    lottery: &LotteryMode,
    config: &PricingConfig,
) -> Result<Quote, PricingError> {
    let currency = config.currency;
    let subtotal = subtotal(items, currency)?;
    let subtotal_minor = subtotal.to_minor_units();

    let cart_discount_minor = if lottery.is_active() {
        percent_of_minor(&config.lottery_discount, subtotal_minor)?
    } else if let Some(value) = prize.and_then(LuckyPrize::discount_value) {
        fraction_of_minor(value, subtotal_minor)?
    } else {
        0
    };

    let mut discount_minor = cart_discount_minor;
    let mut after_minor = subtotal_minor.saturating_sub(cart_discount_minor);

    if let Some(coupon) = coupon {
        if coupon.applies(user_email, subtotal) {
            let eligible_minor = items
                .iter()
                .filter(|item| coupon.item_eligible(item))
                .fold(0_i64, |acc, item| {
                    acc.saturating_add(item.line_total().to_minor_units())
                });

            let ratio = ratio_of_minor(eligible_minor, subtotal_minor);
            let coupon_minor = apportioned_minor(after_minor, ratio, coupon.fraction())?;

            discount_minor = discount_minor.saturating_add(coupon_minor);
            after_minor = after_minor.saturating_sub(coupon_minor);
        }
    }

    let total_minor = after_minor.saturating_add(config.shipping_cost.to_minor_units());
    let allowance = sample_allowance(subtotal, &config.sample_tiers);

    Ok(Quote {
        subtotal,
        discount_amount: Money::from_minor(discount_minor, currency),
        shipping_cost: config.shipping_cost,
        total: Money::from_minor(total_minor, currency),
        free_samples: allowance.free_samples,
        next_tier: allowance.next_tier,
    })
}
