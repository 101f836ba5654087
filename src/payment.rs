//! Payment method branch
//!
//! How checkout completes depends on the chosen method:
//! - cash on delivery submits the order straight away
//! - credit card opens a hosted checkout session and hands back its URL;
//!   the backend creates the order itself once payment is confirmed
//! - anything else goes through an in-app capture step, then submits like
//!   cash on delivery

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::{SessionItem, StorefrontApi};
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::{OrderId, PaymentMethod};
use crate::sync::Storefront;
use crate::{Result, ValidationError};

pub use crate::domain::aggregates::CheckoutSession;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Could not start card checkout: {0}")]
    SessionCreation(String),

    #[error("Payment was not captured: {0}")]
    CaptureDeclined(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Order created; navigate to its confirmation page.
    Placed(OrderId),
    /// Send the browser to the hosted checkout page.
    Redirect(CheckoutSession),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureReceipt {
    pub reference: Uuid,
    pub amount: Decimal,
}

/// In-app payment capture shown before the order is submitted.
#[async_trait]
pub trait CaptureModal: Send + Sync {
    async fn capture(&self, method: &PaymentMethod, amount: Decimal) -> std::result::Result<CaptureReceipt, PaymentError>;
}

/// Approves every capture without contacting a processor.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimulatedCapture;

#[async_trait]
impl CaptureModal for SimulatedCapture {
    async fn capture(&self, method: &PaymentMethod, amount: Decimal) -> std::result::Result<CaptureReceipt, PaymentError> {
        let receipt = CaptureReceipt { reference: Uuid::new_v4(), amount };
        info!(%method, %amount, reference = %receipt.reference, "simulated payment captured");
        Ok(receipt)
    }
}

impl<A: StorefrontApi> Storefront<A> {
    /// Completes checkout with the payment method on the active source.
    /// A card redirect ends any Buy-Now overlay; the hosted page now owns
    /// that purchase.
    #[instrument(skip(self, capture))]
    pub async fn complete_checkout(&self, capture: &dyn CaptureModal) -> Result<CheckoutOutcome> {
        let draft = self.draft().await?;
        match &draft.payment_method {
            PaymentMethod::CashOnDelivery => Ok(CheckoutOutcome::Placed(self.place_order().await?)),
            PaymentMethod::CreditCard => {
                let items: Vec<SessionItem> = draft.order_items.iter().map(SessionItem::from).collect();
                self.start_card_checkout(&items).await.map(CheckoutOutcome::Redirect)
            }
            method => {
                self.ensure_no_pending_order().await?;
                capture.capture(method, draft.total_price).await?;
                Ok(CheckoutOutcome::Placed(self.place_order().await?))
            }
        }
    }

    async fn start_card_checkout(&self, items: &[SessionItem]) -> Result<CheckoutSession> {
        if items.is_empty() { return Err(ValidationError::NoItems.into()); }
        self.dispatch(OrderEvent::SessionRequested).await;
        match self.api.create_checkout_session(items).await {
            Ok(session) => {
                info!(session = %session.id, "redirecting to hosted checkout");
                self.dispatch(OrderEvent::SessionCreated(session.clone())).await;
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "checkout session failed");
                let err = PaymentError::SessionCreation(e.to_string());
                self.dispatch(OrderEvent::SessionFailed(err.to_string())).await;
                Err(err.into())
            }
        }
    }
}
