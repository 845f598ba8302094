//! Order submission client and the checkout flow.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    identity::IdentityProvider,
    storage::{StorageBackend, records::LineItemRecord},
    store::{CartError, CartStore},
};

/// The payload handed to the order service. Downstream stock deduction and
/// the confirmation email are its side effects, not ours.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Cart lines at submission time.
    pub items: Vec<LineItemRecord>,

    /// Grand total in minor units, as quoted.
    pub total: i64,

    /// Complimentary samples earned by the cart.
    pub free_samples: u32,

    /// Shopper notes for the order.
    pub notes: String,
}

/// The order service's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderConfirmation {
    /// Identifier of the created order.
    #[serde(rename = "orderId")]
    pub order_id: String,
}

/// Errors from order submission.
#[derive(Debug, Error)]
pub enum OrderSubmissionError {
    /// The service refused the order.
    #[error("order was rejected: {0}")]
    Rejected(String),

    /// An HTTP transport or deserialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Submits completed carts to the external order service.
#[automock]
#[async_trait]
pub trait OrderSubmissionService: Send + Sync {
    /// Submit an order, returning its confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`OrderSubmissionError::Rejected`] when the service refuses
    /// the order, or [`OrderSubmissionError::Http`] on transport failure.
    async fn submit(&self, order: OrderRequest) -> Result<OrderConfirmation, OrderSubmissionError>;
}

/// HTTP client for the order submission service.
#[derive(Debug, Clone)]
pub struct HttpOrderSubmissionService {
    base_url: String,
    http: Client,
}

impl HttpOrderSubmissionService {
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
impl OrderSubmissionService for HttpOrderSubmissionService {
    async fn submit(&self, order: OrderRequest) -> Result<OrderConfirmation, OrderSubmissionError> {
        let url = format!("{}/orders", self.base_url);

        let response = self.http.post(&url).json(&order).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(OrderSubmissionError::Rejected(format!(
                "order submission failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// An empty cart cannot be submitted.
    #[error("cannot submit an empty cart")]
    EmptyCart,

    /// Wrapped cart or pricing failure.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Wrapped submission failure.
    #[error(transparent)]
    Submission(#[from] OrderSubmissionError),
}

/// Quote the cart, submit it, and reset the session on success.
///
/// The quote is taken as of `now` (expiring a due lottery session first);
/// the submitted total is the quoted grand total. On acceptance the cart,
/// prize and lottery reset while the coupon stays applied.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for a cart with no lines, or the
/// wrapped cart/submission failure. A failed submission leaves the cart
/// untouched.
pub async fn checkout<S: StorageBackend>(
    store: &mut CartStore<S>,
    orders: &dyn OrderSubmissionService,
    identity: &dyn IdentityProvider,
    notes: &str,
    now: Timestamp,
) -> Result<OrderConfirmation, CheckoutError> {
    if store.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let email = identity.current_email();
    let quote = store.quote(now, email.as_deref())?;

    let request = OrderRequest {
        items: store.items().iter().map(LineItemRecord::from_item).collect(),
        total: quote.total.to_minor_units(),
        free_samples: quote.free_samples,
        notes: notes.to_string(),
    };

    let confirmation = orders.submit(request).await?;

    store.complete_checkout()?;

    Ok(confirmation)
}
