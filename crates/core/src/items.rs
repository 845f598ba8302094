//! Line Items

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Nominal volume of a line item.
///
/// The storefront encodes sizes as loosely-formatted strings (`"10"`,
/// `"10ml"`) plus the `"set"` sentinel for bundles, so parsing strips
/// everything that is not a digit before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Size {
    /// Volume in millilitres.
    Ml(u32),

    /// Bundle sentinel; contributes no millilitres to stock math.
    Set,
}

impl Size {
    /// Parse a size from its wire form.
    ///
    /// `"set"` (any case) is the bundle sentinel; anything else has its
    /// non-digit characters stripped and the remainder parsed as millilitres.
    /// Returns `None` when no digits remain.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case("set") {
            return Some(Self::Set);
        }

        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return None;
        }

        digits.parse().ok().map(Self::Ml)
    }

    /// Return the millilitre count, or `None` for the bundle sentinel.
    #[must_use]
    pub const fn millilitres(&self) -> Option<u32> {
        match self {
            Self::Ml(ml) => Some(*ml),
            Self::Set => None,
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ml(ml) => write!(f, "{ml}"),
            Self::Set => f.write_str("set"),
        }
    }
}

impl Serialize for Size {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizeVisitor;

        impl de::Visitor<'_> for SizeVisitor {
            type Value = Size;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a millilitre size or the \"set\" sentinel")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Size, E> {
                Size::parse(value)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Size, E> {
                match u32::try_from(value) {
                    Ok(ml) => Ok(Size::Ml(ml)),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Unsigned(value), &self)),
                }
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Size, E> {
                match u32::try_from(value) {
                    Ok(ml) => Ok(Size::Ml(ml)),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(value), &self)),
                }
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

/// A cart line: one `(product id, size)` pairing with a quantity and a unit
/// price snapshotted at the time the line was added.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Product identifier. Synthetic ids such as `"prize-10"` mark
    /// non-catalogue prize lines.
    pub id: String,

    /// Nominal volume, or the bundle sentinel.
    pub size: Size,

    /// Unit price snapshotted at add time, never re-fetched.
    pub unit_price: Money<'static, Currency>,

    /// Positive count of units.
    pub quantity: u32,

    /// Prize lines bypass quantity controls and stock checks.
    pub is_prize: bool,

    /// Set on lines placed by a lottery bundle replacement.
    pub is_lottery_item: bool,

    /// Cached brand, used only by coupon eligibility.
    pub brand: String,

    /// Cached category, used only by coupon eligibility.
    pub category: String,

    /// Cached stock ceiling in millilitres, when known.
    pub stock_ml: Option<u32>,
}

impl LineItem {
    /// Whether this line is the `(id, size)` entry for the given pair.
    #[must_use]
    pub fn matches(&self, id: &str, size: Size) -> bool {
        self.id == id && self.size == size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money<'static, Currency> {
        Money::from_minor(
            self.unit_price
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity)),
            self.unit_price.currency(),
        )
    }

    /// Millilitres this line requests in total, for stock validation.
    ///
    /// Bundle (`Set`) lines report `None` and skip stock math entirely.
    #[must_use]
    pub fn requested_ml(&self) -> Option<u32> {
        self.size
            .millilitres()
            .map(|ml| ml.saturating_mul(self.quantity))
    }
}
