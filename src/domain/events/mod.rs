//! Store events
//!
//! Every state change goes through one of these. Remote operations come in
//! request / success / failure triples.

use crate::domain::aggregates::{BuyNowIntent, Cart, CheckoutSession, Order};
use crate::domain::value_objects::{PaymentMethod, ShippingDetails};

#[derive(Clone, Debug)]
pub enum AppEvent {
    Cart(CartEvent),
    BuyNow(BuyNowEvent),
    Order(OrderEvent),
    ErrorDismissed,
}

/// Which cart call a [`CartEvent`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartOp {
    Load,
    Upsert,
    Remove,
    Clear,
    SaveShipping,
    SavePayment,
}

impl CartOp {
    /// Edits that mean the shopper is building a new order.
    pub fn restarts_checkout(self) -> bool {
        matches!(self, Self::Upsert | Self::Remove | Self::SaveShipping | Self::SavePayment)
    }
}

/// `seq` is the monotonic cart request number; see [`crate::store::CartSequence`].
#[derive(Clone, Debug)]
pub enum CartEvent {
    Requested { op: CartOp, seq: u64 },
    Synced { op: CartOp, seq: u64, cart: Cart },
    Failed { op: CartOp, seq: u64, message: String },
}

#[derive(Clone, Debug)]
pub enum BuyNowEvent {
    Set(BuyNowIntent),
    ShippingSaved(ShippingDetails),
    PaymentSelected(PaymentMethod),
    Cleared,
}

#[derive(Clone, Debug)]
pub enum OrderEvent {
    Submitted,
    Created(Order),
    Failed(String),
    SessionRequested,
    SessionCreated(CheckoutSession),
    SessionFailed(String),
    HistoryRequested,
    HistoryLoaded(Vec<Order>),
    HistoryFailed(String),
    DetailLoaded(Order),
}

impl From<CartEvent> for AppEvent {
    fn from(e: CartEvent) -> Self { Self::Cart(e) }
}

impl From<BuyNowEvent> for AppEvent {
    fn from(e: BuyNowEvent) -> Self { Self::BuyNow(e) }
}

impl From<OrderEvent> for AppEvent {
    fn from(e: OrderEvent) -> Self { Self::Order(e) }
}
