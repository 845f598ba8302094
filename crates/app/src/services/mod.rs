//! External service clients.
//!
//! The storefront's collaborators behind simple request/response contracts:
//! coupon validation, order submission, and the fire-and-forget
//! abandoned-cart recovery sync. Each seam is a trait with an HTTP
//! implementation; failures are surfaced once and never retried.

pub mod coupons;
pub mod orders;
pub mod recovery;
