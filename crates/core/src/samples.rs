//! Free-Sample Tiers
//!
//! The storefront grants complimentary samples on a subtotal-threshold
//! ladder. The ladder is a strictly staged step function of the raw
//! subtotal, computed before any discount is applied.

use rusty_money::{Money, iso::Currency};

/// One rung of the free-sample ladder.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTier {
    /// Minimum raw subtotal for this tier.
    pub threshold: Money<'static, Currency>,

    /// Complimentary samples granted at this tier.
    pub free_samples: u32,
}

/// The samples a cart has earned, plus the spend remaining to the next tier.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleAllowance {
    /// Complimentary samples granted for the current subtotal.
    pub free_samples: u32,

    /// Additional spend needed to reach the next tier; zero at the top.
    pub next_tier: Money<'static, Currency>,
}

/// Evaluate the free-sample ladder for a raw subtotal.
///
/// `tiers` must be sorted by descending threshold; the first rung the
/// subtotal reaches wins. Below the lowest rung the allowance is zero
/// samples and the distance to that rung.
#[must_use]
pub fn sample_allowance(
    subtotal: Money<'static, Currency>,
    tiers: &[SampleTier],
) -> SampleAllowance {
    let currency = subtotal.currency();
    let subtotal_minor = subtotal.to_minor_units();

    let distance_to = |tier: &SampleTier| {
        Money::from_minor(
            tier.threshold
                .to_minor_units()
                .saturating_sub(subtotal_minor),
            currency,
        )
    };

    let mut next_up: Option<&SampleTier> = None;

    for tier in tiers {
        if subtotal_minor >= tier.threshold.to_minor_units() {
            return SampleAllowance {
                free_samples: tier.free_samples,
                next_tier: next_up
                    .map_or_else(|| Money::from_minor(0, currency), distance_to),
            };
        }

        next_up = Some(tier);
    }

    SampleAllowance {
        free_samples: 0,
        next_tier: next_up.map_or_else(|| Money::from_minor(0, currency), distance_to),
    }
}
