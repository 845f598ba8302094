//! Cart store errors.

use sillage::pricing::PricingError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by cart mutations.
///
/// Validation rejections ([`CartError::Locked`],
/// [`CartError::InsufficientStock`], [`CartError::PrizeBelowMinimum`]) leave
/// the cart unchanged and are meant to be shown to the shopper once.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart rejects mutations while a lottery session is running.
    #[error("cart is locked while a lottery session is running")]
    Locked,

    /// A quantity update would exceed the line's cached stock ceiling.
    #[error("requested {requested_ml}ml exceeds the {stock_ml}ml in stock")]
    InsufficientStock {
        /// Millilitres the update asked for.
        requested_ml: u32,

        /// Millilitres the cached stock ceiling allows.
        stock_ml: u32,
    },

    /// A prize cannot be held while the subtotal is below the floor.
    #[error("cart subtotal is below the prize threshold")]
    PrizeBelowMinimum,

    /// Wrapped pricing failure.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped persistence failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A record failed to serialize for persistence.
    #[error("failed to encode persisted record: {0}")]
    Encode(#[from] serde_json::Error),
}
