//! Application state and its reducer
//!
//! `reduce` is the only place state changes. It is pure, so every checkout
//! transition can be tested by feeding events in order.

use crate::domain::aggregates::{BuyNowIntent, Cart, CheckoutSession, ItemSource, Order};
use crate::domain::checkout_gate::CheckoutPhase;
use crate::domain::events::{AppEvent, BuyNowEvent, CartEvent, OrderEvent};
use crate::domain::value_objects::OrderId;

/// Lifecycle of one logical remote operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OpStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failure(String),
}

impl OpStatus {
    pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }
}

/// Cart request numbering. A response is applied only if its number is
/// newer than the last one applied, so a slow reply can never overwrite a
/// fresher cart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CartSequence {
    pub issued: u64,
    pub applied: u64,
}

impl CartSequence {
    pub fn next(&self) -> u64 { self.issued.max(self.applied) + 1 }
    pub fn is_stale(&self, seq: u64) -> bool { seq <= self.applied }
    /// True for numbers this client never handed out.
    pub fn is_unissued(&self, seq: u64) -> bool { seq > self.issued }
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub cart: Cart,
    pub buy_now: Option<BuyNowIntent>,
    pub placed: Option<OrderId>,
    pub last_order: Option<Order>,
    pub orders: Vec<Order>,
    pub checkout_session: Option<CheckoutSession>,
    pub cart_status: OpStatus,
    pub order_status: OpStatus,
    pub session_status: OpStatus,
    pub history_status: OpStatus,
    pub cart_seq: CartSequence,
    pub error: Option<String>,
}

impl AppState {
    /// The Buy-Now overlay when present, otherwise the cart.
    pub fn item_source(&self) -> ItemSource<'_> { ItemSource::resolve(&self.cart, self.buy_now.as_ref()) }

    pub fn phase(&self) -> CheckoutPhase { CheckoutPhase::of(self.item_source(), self.placed.as_ref()) }
}

pub fn reduce(state: AppState, event: AppEvent) -> AppState {
    match event {
        AppEvent::Cart(e) => reduce_cart(state, e),
        AppEvent::BuyNow(e) => reduce_buy_now(state, e),
        AppEvent::Order(e) => reduce_order(state, e),
        AppEvent::ErrorDismissed => AppState { error: None, ..state },
    }
}

fn reduce_cart(mut state: AppState, event: CartEvent) -> AppState {
    match event {
        CartEvent::Requested { seq, .. } => {
            state.cart_seq.issued = state.cart_seq.issued.max(seq);
            state.cart_status = OpStatus::Pending;
            state.error = None;
        }
        CartEvent::Synced { op, seq, cart } => {
            if state.cart_seq.is_stale(seq) {
                tracing::debug!(?op, seq, applied = state.cart_seq.applied, "discarding stale cart response");
                return state;
            }
            if state.cart_seq.is_unissued(seq) {
                tracing::warn!(?op, seq, issued = state.cart_seq.issued, "ignoring cart response for unissued seq");
                return state;
            }
            state.cart = cart;
            state.cart_seq.applied = seq;
            if op.restarts_checkout() { state.placed = None; }
            if seq >= state.cart_seq.issued { state.cart_status = OpStatus::Success; }
        }
        CartEvent::Failed { op, seq, message } => {
            if state.cart_seq.is_stale(seq) || state.cart_seq.is_unissued(seq) {
                tracing::debug!(?op, seq, "discarding stale cart failure");
                return state;
            }
            if seq >= state.cart_seq.issued { state.cart_status = OpStatus::Failure(message.clone()); }
            state.error = Some(message);
        }
    }
    state
}

fn reduce_buy_now(mut state: AppState, event: BuyNowEvent) -> AppState {
    match event {
        BuyNowEvent::Set(intent) => {
            state.buy_now = Some(intent);
            state.placed = None;
        }
        BuyNowEvent::ShippingSaved(details) => {
            if let Some(intent) = state.buy_now.as_mut() { intent.set_shipping_details(details); }
        }
        BuyNowEvent::PaymentSelected(method) => {
            if let Some(intent) = state.buy_now.as_mut() { intent.set_payment_method(method); }
        }
        BuyNowEvent::Cleared => state.buy_now = None,
    }
    state
}

fn reduce_order(mut state: AppState, event: OrderEvent) -> AppState {
    match event {
        OrderEvent::Submitted => {
            state.order_status = OpStatus::Pending;
            state.error = None;
        }
        OrderEvent::Created(order) => {
            state.order_status = OpStatus::Success;
            state.placed = Some(order.id.clone());
            state.last_order = Some(order);
        }
        OrderEvent::Failed(message) => {
            state.order_status = OpStatus::Failure(message.clone());
            state.error = Some(message);
        }
        OrderEvent::SessionRequested => {
            state.session_status = OpStatus::Pending;
            state.checkout_session = None;
            state.error = None;
        }
        OrderEvent::SessionCreated(session) => {
            // The hosted page owns the purchase from here on.
            state.session_status = OpStatus::Success;
            state.checkout_session = Some(session);
            state.buy_now = None;
        }
        OrderEvent::SessionFailed(message) => {
            state.session_status = OpStatus::Failure(message.clone());
            state.error = Some(message);
        }
        OrderEvent::HistoryRequested => state.history_status = OpStatus::Pending,
        OrderEvent::HistoryLoaded(orders) => {
            state.history_status = OpStatus::Success;
            state.orders = orders;
        }
        OrderEvent::HistoryFailed(message) => {
            state.history_status = OpStatus::Failure(message.clone());
            state.error = Some(message);
        }
        OrderEvent::DetailLoaded(order) => state.last_order = Some(order),
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CartLineItem, Product};
    use crate::domain::events::CartOp;
    use crate::domain::value_objects::{PaymentMethod, ShippingDetails};
    use rust_decimal_macros::dec;

    fn cart_of(qty: u32) -> Cart {
        Cart::new(vec![CartLineItem::new(&Product::new("P1", "Widget", dec!(10), 20), qty).unwrap()], None, None)
    }

    fn apply(state: AppState, events: Vec<AppEvent>) -> AppState { events.into_iter().fold(state, reduce) }

    #[test]
    fn test_stale_cart_response_is_discarded() {
        let state = apply(AppState::default(), vec![
            CartEvent::Requested { op: CartOp::Upsert, seq: 1 }.into(),
            CartEvent::Requested { op: CartOp::Upsert, seq: 2 }.into(),
            CartEvent::Synced { op: CartOp::Upsert, seq: 2, cart: cart_of(5) }.into(),
            CartEvent::Synced { op: CartOp::Upsert, seq: 1, cart: cart_of(3) }.into(),
        ]);
        assert_eq!(state.cart.items()[0].quantity, 5);
        assert_eq!(state.cart_seq, CartSequence { issued: 2, applied: 2 });
        assert_eq!(state.cart_status, OpStatus::Success);
    }

    #[test]
    fn test_older_response_first_keeps_pending() {
        let state = apply(AppState::default(), vec![
            CartEvent::Requested { op: CartOp::Upsert, seq: 1 }.into(),
            CartEvent::Requested { op: CartOp::Upsert, seq: 2 }.into(),
            CartEvent::Synced { op: CartOp::Upsert, seq: 1, cart: cart_of(3) }.into(),
        ]);
        assert_eq!(state.cart.items()[0].quantity, 3);
        assert!(state.cart_status.is_pending());
    }

    #[test]
    fn test_cart_failure_sets_error_and_keeps_cart() {
        let state = apply(AppState::default(), vec![
            CartEvent::Requested { op: CartOp::Load, seq: 1 }.into(),
            CartEvent::Synced { op: CartOp::Load, seq: 1, cart: cart_of(2) }.into(),
            CartEvent::Requested { op: CartOp::Upsert, seq: 2 }.into(),
            CartEvent::Failed { op: CartOp::Upsert, seq: 2, message: "Out of stock".into() }.into(),
        ]);
        assert_eq!(state.cart.items()[0].quantity, 2);
        assert_eq!(state.error.as_deref(), Some("Out of stock"));
        assert_eq!(state.cart_status, OpStatus::Failure("Out of stock".into()));
        let state = reduce(state, AppEvent::ErrorDismissed);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_order_created_marks_placed() {
        let order: Order = serde_json::from_str(r#"{"_id":"o-9"}"#).unwrap();
        let state = apply(AppState::default(), vec![OrderEvent::Submitted.into(), OrderEvent::Created(order).into()]);
        assert_eq!(state.placed, Some(OrderId::new("o-9")));
        assert!(matches!(state.phase(), CheckoutPhase::Placed(_)));
        assert_eq!(state.order_status, OpStatus::Success);
    }

    #[test]
    fn test_new_cart_edit_restarts_checkout() {
        let state = AppState { placed: Some(OrderId::new("o-1")), ..AppState::default() };
        let cleared = reduce(state, CartEvent::Synced { op: CartOp::Clear, seq: 1, cart: Cart::default() }.into());
        assert!(cleared.placed.is_some());
        let edited = reduce(cleared, CartEvent::Synced { op: CartOp::Upsert, seq: 2, cart: cart_of(1) }.into());
        assert!(edited.placed.is_none());
    }

    #[test]
    fn test_buy_now_overlay_takes_checkout_details() {
        let intent = BuyNowIntent::new(Product::new("X", "X", dec!(1500), 3), 2).unwrap();
        let state = apply(AppState::default(), vec![
            BuyNowEvent::Set(intent).into(),
            BuyNowEvent::ShippingSaved(ShippingDetails::new("a", "Galle", "80000", "LK")).into(),
            BuyNowEvent::PaymentSelected(PaymentMethod::CashOnDelivery).into(),
        ]);
        assert!(state.item_source().is_buy_now());
        assert!(state.cart.shipping_details().is_none());
        assert_eq!(state.phase(), CheckoutPhase::HasPayment);
        let state = reduce(state, BuyNowEvent::Cleared.into());
        assert!(!state.item_source().is_buy_now());
    }

    #[test]
    fn test_unissued_seq_cannot_freeze_cart() {
        let state = apply(AppState::default(), vec![
            CartEvent::Requested { op: CartOp::Load, seq: 1 }.into(),
            CartEvent::Synced { op: CartOp::Load, seq: 42, cart: cart_of(1) }.into(),
        ]);
        assert!(state.cart.is_empty());
        assert_eq!(state.cart_seq.applied, 0);

        let seq = state.cart_seq.next();
        assert_eq!(seq, 2);
        let state = apply(state, vec![
            CartEvent::Requested { op: CartOp::Upsert, seq }.into(),
            CartEvent::Synced { op: CartOp::Upsert, seq, cart: cart_of(7) }.into(),
        ]);
        assert_eq!(state.cart.items()[0].quantity, 7);
        assert_eq!(state.cart_status, OpStatus::Success);
    }

    #[test]
    fn test_next_seq_stays_ahead_of_applied() {
        let seq = CartSequence { issued: 2, applied: 5 };
        assert_eq!(seq.next(), 6);
        assert!(!seq.is_stale(seq.next()));
    }

    #[test]
    fn test_card_session_ends_buy_now() {
        let intent = BuyNowIntent::new(Product::new("K", "Kettle", dec!(1500), 3), 2).unwrap();
        let session = CheckoutSession { id: "cs_1".into(), url: "https://pay.example/cs_1".into() };
        let state = apply(AppState::default(), vec![
            BuyNowEvent::Set(intent).into(),
            OrderEvent::SessionRequested.into(),
            OrderEvent::SessionCreated(session).into(),
        ]);
        assert!(state.buy_now.is_none());
        assert!(!state.item_source().is_buy_now());
        assert_eq!(state.session_status, OpStatus::Success);
    }

    #[test]
    fn test_order_failure_is_surfaced() {
        let state = apply(AppState::default(), vec![OrderEvent::Submitted.into(), OrderEvent::Failed("Payment required".into()).into()]);
        assert_eq!(state.error.as_deref(), Some("Payment required"));
        assert!(state.placed.is_none());
    }
}
