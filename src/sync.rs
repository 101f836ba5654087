//! Remote sync layer
//!
//! [`Storefront`] is the context object handed to whatever drives the UI.
//! Each remote operation dispatches a request event, awaits the backend and
//! dispatches the outcome. Failures land in `AppState::error` and are also
//! returned; nothing is retried.

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiResult, StorefrontApi, Versioned};
use crate::domain::aggregates::{cart::validate_quantity, BuyNowIntent, Cart, Order, OrderDraft, OrderDraftBuilder, Product};
use crate::domain::checkout_gate::{gate, CheckoutPage, GateDecision};
use crate::domain::events::{AppEvent, BuyNowEvent, CartEvent, CartOp, OrderEvent};
use crate::domain::pricing::{compute_totals, DiscountPolicy, Totals};
use crate::domain::regions::RegionTable;
use crate::domain::value_objects::{OrderId, PaymentMethod, ProductId, ShippingDetails};
use crate::store::{reduce, AppState};
use crate::{Result, StorefrontError, ValidationError};

pub struct Storefront<A> {
    pub(crate) api: A,
    state: Mutex<AppState>,
    regions: RegionTable,
    policy: DiscountPolicy,
}

impl<A: StorefrontApi> Storefront<A> {
    pub fn new(api: A) -> Self { Self::with_pricing(api, RegionTable::default(), DiscountPolicy::default()) }

    pub fn with_pricing(api: A, regions: RegionTable, policy: DiscountPolicy) -> Self {
        Self { api, state: Mutex::new(AppState::default()), regions, policy }
    }

    pub fn api(&self) -> &A { &self.api }
    pub fn regions(&self) -> &RegionTable { &self.regions }

    /// Copy of the current state for rendering.
    pub async fn snapshot(&self) -> AppState { self.state.lock().await.clone() }

    pub async fn dispatch(&self, event: impl Into<AppEvent>) {
        let mut state = self.state.lock().await;
        *state = reduce(std::mem::take(&mut *state), event.into());
    }

    /// Totals of whatever checkout would currently order.
    pub async fn totals(&self) -> Totals {
        let state = self.state.lock().await;
        let source = state.item_source();
        let fee = source.shipping_details().map_or(Decimal::ZERO, |s| self.regions.rate_for(&s.city));
        compute_totals(&source.lines(), fee, &self.policy)
    }

    /// Page-entry guard. Call on every render of a checkout page.
    pub async fn enter(&self, page: &CheckoutPage) -> GateDecision {
        let phase = self.state.lock().await.phase();
        gate(page, &phase)
    }

    pub async fn draft(&self) -> std::result::Result<OrderDraft, ValidationError> {
        let state = self.state.lock().await;
        OrderDraftBuilder::new(&self.regions, &self.policy).build(state.item_source())
    }

    pub async fn dismiss_error(&self) { self.dispatch(AppEvent::ErrorDismissed).await }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    async fn begin_cart(&self, op: CartOp) -> u64 {
        let mut state = self.state.lock().await;
        let seq = state.cart_seq.next();
        *state = reduce(std::mem::take(&mut *state), CartEvent::Requested { op, seq }.into());
        seq
    }

    async fn finish_cart(&self, op: CartOp, seq: u64, outcome: ApiResult<Versioned<Cart>>) -> Result<Cart> {
        match outcome {
            Ok(reply) => {
                if reply.seq != seq { debug!(?op, seq, echoed = reply.seq, "echoed seq differs from request"); }
                self.dispatch(CartEvent::Synced { op, seq, cart: reply.value }).await;
                Ok(self.state.lock().await.cart.clone())
            }
            Err(e) => {
                self.dispatch(CartEvent::Failed { op, seq, message: e.to_string() }).await;
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn load_cart(&self) -> Result<Cart> {
        let seq = self.begin_cart(CartOp::Load).await;
        let outcome = self.api.fetch_cart(seq).await;
        self.finish_cart(CartOp::Load, seq, outcome).await
    }

    /// Sets the cart quantity for `product`. A zero quantity is rejected;
    /// use [`Self::remove_item`].
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn add_or_update_item(&self, product: &Product, quantity: u32) -> Result<Cart> {
        validate_quantity(product, quantity)?;
        let seq = self.begin_cart(CartOp::Upsert).await;
        let outcome = self.api.upsert_cart_item(&product.id, quantity, seq).await;
        self.finish_cart(CartOp::Upsert, seq, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<Cart> {
        let seq = self.begin_cart(CartOp::Remove).await;
        let outcome = self.api.remove_cart_item(product_id, seq).await;
        self.finish_cart(CartOp::Remove, seq, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<Cart> {
        let seq = self.begin_cart(CartOp::Clear).await;
        let outcome = self.api.clear_cart(seq).await;
        self.finish_cart(CartOp::Clear, seq, outcome).await
    }

    /// Stored on the Buy-Now intent when one is active, on the server cart
    /// otherwise.
    #[instrument(skip(self, details))]
    pub async fn save_shipping(&self, details: ShippingDetails) -> Result<()> {
        let missing = details.missing_fields();
        if !missing.is_empty() { return Err(ValidationError::IncompleteShipping(missing.join(", ")).into()); }
        if self.state.lock().await.buy_now.is_some() {
            self.dispatch(BuyNowEvent::ShippingSaved(details)).await;
            return Ok(());
        }
        let seq = self.begin_cart(CartOp::SaveShipping).await;
        let outcome = self.api.save_shipping(&details, seq).await;
        self.finish_cart(CartOp::SaveShipping, seq, outcome).await.map(|_| ())
    }

    #[instrument(skip(self))]
    pub async fn save_payment_method(&self, method: PaymentMethod) -> Result<()> {
        if self.state.lock().await.buy_now.is_some() {
            self.dispatch(BuyNowEvent::PaymentSelected(method)).await;
            return Ok(());
        }
        let seq = self.begin_cart(CartOp::SavePayment).await;
        let outcome = self.api.save_payment_method(&method, seq).await;
        self.finish_cart(CartOp::SavePayment, seq, outcome).await.map(|_| ())
    }

    // -------------------------------------------------------------------------
    // Buy-Now
    // -------------------------------------------------------------------------

    pub async fn set_buy_now(&self, product: Product, quantity: u32) -> Result<()> {
        let intent = BuyNowIntent::new(product, quantity)?;
        info!(product = %intent.product().id, quantity, "buy-now intent set");
        self.dispatch(BuyNowEvent::Set(intent)).await;
        Ok(())
    }

    pub async fn clear_buy_now(&self) { self.dispatch(BuyNowEvent::Cleared).await }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub(crate) async fn ensure_no_pending_order(&self) -> Result<()> {
        if self.state.lock().await.order_status.is_pending() { return Err(StorefrontError::AlreadyPending("Order submission")); }
        Ok(())
    }

    /// Builds the draft from the active source and submits it. Refuses while
    /// a previous submission is still pending.
    ///
    /// A failed cart clear afterwards leaves `cart_status` at `Failure` but
    /// does not raise a user-facing error; the order itself went through.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderId> {
        let (draft, from_buy_now) = {
            let mut state = self.state.lock().await;
            if state.order_status.is_pending() { return Err(StorefrontError::AlreadyPending("Order submission")); }
            let source = state.item_source();
            let from_buy_now = source.is_buy_now();
            let draft = OrderDraftBuilder::new(&self.regions, &self.policy).build(source)?;
            *state = reduce(std::mem::take(&mut *state), OrderEvent::Submitted.into());
            (draft, from_buy_now)
        };

        let order = match self.api.create_order(&draft, Uuid::now_v7()).await {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "order creation failed");
                self.dispatch(OrderEvent::Failed(e.to_string())).await;
                return Err(e.into());
            }
        };

        let id = order.id.clone();
        info!(order = %id, total = %draft.total_price, from_buy_now, "order created");
        self.dispatch(OrderEvent::Created(order)).await;
        if from_buy_now { self.clear_buy_now().await; }
        if let Err(e) = self.clear_cart().await {
            warn!(order = %id, error = %e, "cart clear after order failed");
            self.dispatch(AppEvent::ErrorDismissed).await;
        }
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>> {
        self.dispatch(OrderEvent::HistoryRequested).await;
        match self.api.my_orders().await {
            Ok(orders) => {
                self.dispatch(OrderEvent::HistoryLoaded(orders.clone())).await;
                Ok(orders)
            }
            Err(e) => {
                self.dispatch(OrderEvent::HistoryFailed(e.to_string())).await;
                Err(e.into())
            }
        }
    }

    /// Every order in the shop; the backend restricts this to admins.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        self.dispatch(OrderEvent::HistoryRequested).await;
        match self.api.all_orders().await {
            Ok(orders) => {
                self.dispatch(OrderEvent::HistoryLoaded(orders.clone())).await;
                Ok(orders)
            }
            Err(e) => {
                self.dispatch(OrderEvent::HistoryFailed(e.to_string())).await;
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn order(&self, id: &OrderId) -> Result<Order> {
        let order = self.api.order(id).await?;
        self.dispatch(OrderEvent::DetailLoaded(order.clone())).await;
        Ok(order)
    }

    pub async fn product(&self, id: &ProductId) -> Result<Product> { Ok(self.api.product(id).await?) }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{ApiError, SessionItem};
    use crate::domain::aggregates::{CartLineItem, CheckoutSession};
    use crate::store::OpStatus;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex as StdMutex;

    /// In-memory backend with scripted failures.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub cart: StdMutex<Vec<CartLineItem>>,
        pub shipping: StdMutex<Option<ShippingDetails>>,
        pub payment: StdMutex<Option<PaymentMethod>>,
        pub orders: StdMutex<Vec<OrderDraft>>,
        pub fail_orders: StdMutex<Option<String>>,
        pub fail_sessions: StdMutex<Option<String>>,
        pub sessions: StdMutex<Vec<Vec<SessionItem>>>,
        pub fail_clear: StdMutex<Option<String>>,
        pub echo_seq: StdMutex<Option<u64>>,
    }

    impl FakeApi {
        fn reply(&self, seq: u64) -> ApiResult<Versioned<Cart>> {
            let cart = Cart::new(self.cart.lock().unwrap().clone(), self.shipping.lock().unwrap().clone(), self.payment.lock().unwrap().clone());
            let seq = self.echo_seq.lock().unwrap().unwrap_or(seq);
            Ok(Versioned { seq, value: cart })
        }
    }

    #[async_trait]
    impl StorefrontApi for FakeApi {
        async fn fetch_cart(&self, seq: u64) -> ApiResult<Versioned<Cart>> { self.reply(seq) }
        async fn upsert_cart_item(&self, product_id: &ProductId, quantity: u32, seq: u64) -> ApiResult<Versioned<Cart>> {
            {
                let mut cart = self.cart.lock().unwrap();
                match cart.iter_mut().find(|i| &i.product_id == product_id) {
                    Some(line) => line.quantity = quantity,
                    None => cart.push(CartLineItem::new(&Product::new(product_id.as_str(), product_id.as_str(), dec!(10), 100), quantity).unwrap()),
                }
            }
            self.reply(seq)
        }
        async fn remove_cart_item(&self, product_id: &ProductId, seq: u64) -> ApiResult<Versioned<Cart>> {
            self.cart.lock().unwrap().retain(|i| &i.product_id != product_id);
            self.reply(seq)
        }
        async fn clear_cart(&self, seq: u64) -> ApiResult<Versioned<Cart>> {
            if let Some(message) = self.fail_clear.lock().unwrap().clone() {
                return Err(ApiError::Remote { status: 500, message });
            }
            self.cart.lock().unwrap().clear();
            self.reply(seq)
        }
        async fn save_shipping(&self, details: &ShippingDetails, seq: u64) -> ApiResult<Versioned<Cart>> {
            *self.shipping.lock().unwrap() = Some(details.clone());
            self.reply(seq)
        }
        async fn save_payment_method(&self, method: &PaymentMethod, seq: u64) -> ApiResult<Versioned<Cart>> {
            *self.payment.lock().unwrap() = Some(method.clone());
            self.reply(seq)
        }
        async fn create_order(&self, draft: &OrderDraft, _key: Uuid) -> ApiResult<Order> {
            if let Some(message) = self.fail_orders.lock().unwrap().clone() {
                return Err(ApiError::Remote { status: 400, message });
            }
            let mut orders = self.orders.lock().unwrap();
            orders.push(draft.clone());
            let json = serde_json::json!({ "_id": format!("order-{}", orders.len()), "totalPrice": draft.total_price });
            Ok(serde_json::from_value(json).unwrap())
        }
        async fn my_orders(&self) -> ApiResult<Vec<Order>> { Ok(vec![]) }
        async fn order(&self, id: &OrderId) -> ApiResult<Order> {
            Ok(serde_json::from_value(serde_json::json!({ "_id": id.as_str() })).unwrap())
        }
        async fn all_orders(&self) -> ApiResult<Vec<Order>> { Err(ApiError::Remote { status: 401, message: "Not authorized as an admin".into() }) }
        async fn product(&self, id: &ProductId) -> ApiResult<Product> { Ok(Product::new(id.as_str(), "Kettle", dec!(1500), 5)) }
        async fn create_checkout_session(&self, items: &[SessionItem]) -> ApiResult<CheckoutSession> {
            if let Some(message) = self.fail_sessions.lock().unwrap().clone() {
                return Err(ApiError::Remote { status: 500, message });
            }
            self.sessions.lock().unwrap().push(items.to_vec());
            Ok(CheckoutSession { id: "cs_test".into(), url: "https://pay.example/cs_test".into() })
        }
    }

    pub(crate) fn colombo() -> ShippingDetails { ShippingDetails::new("1 Main St", "Colombo", "00100", "Sri Lanka") }

    #[tokio::test]
    async fn test_cart_round_trip_through_store() {
        let store = Storefront::new(FakeApi::default());
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 3).await.unwrap();
        let cart = store.add_or_update_item(&Product::new("B", "B", dec!(10), 10), 1).await.unwrap();
        assert_eq!(cart.item_count(), 4);
        let cart = store.remove_item(&ProductId::new("missing")).await.unwrap();
        assert_eq!(cart.items().len(), 2);
        let state = store.snapshot().await;
        assert_eq!(state.cart_seq.applied, 3);
        assert_eq!(state.cart_status, OpStatus::Success);
    }

    #[tokio::test]
    async fn test_quantity_validated_before_remote_call() {
        let store = Storefront::new(FakeApi::default());
        let err = store.add_or_update_item(&Product::new("A", "A", dec!(10), 2), 5).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ValidationError::ExceedsStock { .. })));
        assert_eq!(store.snapshot().await.cart_seq.issued, 0);
        assert!(store.api().cart.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gate_redirects_until_ready() {
        let store = Storefront::new(FakeApi::default());
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 1).await.unwrap();
        assert_eq!(store.enter(&CheckoutPage::Payment).await, GateDecision::Redirect(CheckoutPage::Shipping));
        store.save_shipping(colombo()).await.unwrap();
        assert_eq!(store.enter(&CheckoutPage::Payment).await, GateDecision::Proceed);
        assert_eq!(store.enter(&CheckoutPage::PlaceOrder).await, GateDecision::Redirect(CheckoutPage::Payment));
        store.save_payment_method(PaymentMethod::CashOnDelivery).await.unwrap();
        assert_eq!(store.enter(&CheckoutPage::PlaceOrder).await, GateDecision::Proceed);
    }

    #[tokio::test]
    async fn test_incomplete_shipping_rejected_inline() {
        let store = Storefront::new(FakeApi::default());
        let err = store.save_shipping(ShippingDetails::new("", "Colombo", "00100", "LK")).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(ValidationError::IncompleteShipping(_))));
        assert!(store.api().shipping.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_place_order_from_cart_clears_everything() {
        let store = Storefront::new(FakeApi::default());
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 3).await.unwrap();
        store.save_shipping(colombo()).await.unwrap();
        store.save_payment_method(PaymentMethod::CashOnDelivery).await.unwrap();

        let id = store.place_order().await.unwrap();
        assert_eq!(id.as_str(), "order-1");
        let state = store.snapshot().await;
        assert!(state.cart.is_empty());
        assert!(state.buy_now.is_none());
        assert_eq!(state.placed, Some(id.clone()));
        assert!(store.load_cart().await.unwrap().is_empty());
        assert_eq!(store.enter(&CheckoutPage::PlaceOrder).await, GateDecision::Redirect(CheckoutPage::Confirmation(id)));
        let sent = store.api().orders.lock().unwrap()[0].clone();
        assert_eq!(sent.total_price, dec!(230));
    }

    #[tokio::test]
    async fn test_buy_now_order_uses_only_overlay() {
        let store = Storefront::new(FakeApi::default());
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 3).await.unwrap();
        store.save_shipping(colombo()).await.unwrap();
        store.set_buy_now(Product::new("K", "Kettle", dec!(1500), 5), 2).await.unwrap();
        store.save_shipping(ShippingDetails::new("9 Road", "Nowhereville", "1", "LK")).await.unwrap();
        store.save_payment_method(PaymentMethod::CashOnDelivery).await.unwrap();

        store.place_order().await.unwrap();
        let sent = store.api().orders.lock().unwrap()[0].clone();
        assert_eq!(sent.order_items.len(), 1);
        assert_eq!(sent.order_items[0].product_id.as_str(), "K");
        assert_eq!(sent.discount, dec!(300));
        assert_eq!(sent.shipping_price, dec!(200));
        assert_eq!(sent.total_price, dec!(2900));
        // the server cart kept its own address; the overlay never wrote to it
        assert_eq!(store.api().shipping.lock().unwrap().as_ref().map(|s| s.city.as_str()), Some("Colombo"));
        let state = store.snapshot().await;
        assert!(state.buy_now.is_none());
        assert!(state.cart.is_empty());
    }

    #[tokio::test]
    async fn test_order_failure_keeps_cart_and_surfaces_message() {
        let api = FakeApi::default();
        *api.fail_orders.lock().unwrap() = Some("Product out of stock".into());
        let store = Storefront::new(api);
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 1).await.unwrap();
        store.save_shipping(colombo()).await.unwrap();
        store.save_payment_method(PaymentMethod::CashOnDelivery).await.unwrap();

        let err = store.place_order().await.unwrap_err();
        assert_eq!(err.to_string(), "Product out of stock");
        let state = store.snapshot().await;
        assert_eq!(state.error.as_deref(), Some("Product out of stock"));
        assert_eq!(state.cart.items().len(), 1);
        assert!(state.placed.is_none());
        assert_eq!(store.enter(&CheckoutPage::PlaceOrder).await, GateDecision::Proceed);
    }

    #[tokio::test]
    async fn test_second_submission_refused_while_pending() {
        let store = Storefront::new(FakeApi::default());
        store.dispatch(OrderEvent::Submitted).await;
        let err = store.place_order().await.unwrap_err();
        assert!(matches!(err, StorefrontError::AlreadyPending(_)));
    }

    #[tokio::test]
    async fn test_failed_clear_after_order_is_not_a_user_error() {
        let store = Storefront::new(FakeApi::default());
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 1).await.unwrap();
        store.save_shipping(colombo()).await.unwrap();
        store.save_payment_method(PaymentMethod::CashOnDelivery).await.unwrap();
        *store.api().fail_clear.lock().unwrap() = Some("Cart service down".into());

        let id = store.place_order().await.unwrap();
        let state = store.snapshot().await;
        assert_eq!(state.placed, Some(id));
        assert_eq!(state.order_status, OpStatus::Success);
        assert!(state.error.is_none());
        assert_eq!(state.cart_status, OpStatus::Failure("Cart service down".into()));
    }

    #[tokio::test]
    async fn test_bogus_echoed_seq_does_not_stall_cart() {
        let store = Storefront::new(FakeApi::default());
        *store.api().echo_seq.lock().unwrap() = Some(42);
        store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 1).await.unwrap();
        *store.api().echo_seq.lock().unwrap() = None;
        let cart = store.add_or_update_item(&Product::new("A", "A", dec!(10), 10), 7).await.unwrap();

        assert_eq!(cart.items()[0].quantity, 7);
        let state = store.snapshot().await;
        assert_eq!(state.cart_seq, crate::store::CartSequence { issued: 2, applied: 2 });
        assert_eq!(state.cart_status, OpStatus::Success);
    }

    #[tokio::test]
    async fn test_admin_listing_error_is_recorded() {
        let store = Storefront::new(FakeApi::default());
        assert!(store.all_orders().await.is_err());
        assert_eq!(store.snapshot().await.error.as_deref(), Some("Not authorized as an admin"));
        store.dismiss_error().await;
        assert!(store.snapshot().await.error.is_none());
    }
}
