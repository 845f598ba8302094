//! Coupon validation client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use sillage::coupons::Coupon;
use thiserror::Error;

/// Errors from coupon validation.
#[derive(Debug, Error)]
pub enum CouponValidationError {
    /// The service rejected the code.
    #[error("coupon code was rejected")]
    Invalid,

    /// An HTTP transport or deserialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Validates shopper-submitted coupon codes against the external service.
///
/// Failures are surfaced to the caller once and never retried.
#[automock]
#[async_trait]
pub trait CouponValidationService: Send + Sync {
    /// Exchange a code for its validated coupon.
    ///
    /// # Errors
    ///
    /// Returns [`CouponValidationError::Invalid`] when the service rejects
    /// the code, or [`CouponValidationError::Http`] on transport failure.
    async fn validate(&self, code: &str) -> Result<Coupon, CouponValidationError>;
}

/// HTTP client for the coupon validation service.
#[derive(Debug, Clone)]
pub struct HttpCouponValidationService {
    base_url: String,
    http: Client,
}

impl HttpCouponValidationService {
    /// Create a client against the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl CouponValidationService for HttpCouponValidationService {
    async fn validate(&self, code: &str) -> Result<Coupon, CouponValidationError> {
        let url = format!("{}/coupons/validate", self.base_url);
        let body = serde_json::json!({ "code": code });

        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(CouponValidationError::Invalid);
        }

        Ok(response.json().await?)
    }
}
