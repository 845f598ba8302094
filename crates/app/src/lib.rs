//! Sillage App
//!
//! The stateful storefront layer around the [`sillage`] pricing engine: the
//! cart store with its lock and merge rules, device-local persistence, the
//! identity seam, and the external service clients (coupon validation,
//! order submission, abandoned-cart recovery sync).

pub mod identity;
pub mod services;
pub mod storage;
pub mod store;
