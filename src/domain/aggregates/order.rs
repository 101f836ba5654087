//! Order drafts and the order read model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{BuyNowIntent, Cart, CartLineItem};
use crate::domain::pricing::{compute_totals, DiscountPolicy};
use crate::domain::regions::RegionTable;
use crate::domain::value_objects::{OrderId, PaymentMethod, ShippingDetails};
use crate::ValidationError;

/// Where checkout reads its items, address and payment choice from.
#[derive(Clone, Copy, Debug)]
pub enum ItemSource<'a> {
    Cart(&'a Cart),
    BuyNow(&'a BuyNowIntent),
}

impl<'a> ItemSource<'a> {
    /// A Buy-Now intent, when present, always wins over the cart.
    pub fn resolve(cart: &'a Cart, buy_now: Option<&'a BuyNowIntent>) -> Self {
        match buy_now {
            Some(intent) => Self::BuyNow(intent),
            None => Self::Cart(cart),
        }
    }

    pub fn lines(&self) -> Vec<CartLineItem> {
        match self {
            Self::Cart(cart) => cart.items().to_vec(),
            Self::BuyNow(intent) => vec![intent.line()],
        }
    }

    pub fn shipping_details(&self) -> Option<&'a ShippingDetails> {
        match *self {
            Self::Cart(cart) => cart.shipping_details(),
            Self::BuyNow(intent) => intent.shipping_details(),
        }
    }

    pub fn payment_method(&self) -> Option<&'a PaymentMethod> {
        match *self {
            Self::Cart(cart) => cart.payment_method(),
            Self::BuyNow(intent) => intent.payment_method(),
        }
    }

    pub fn is_buy_now(&self) -> bool { matches!(self, Self::BuyNow(_)) }
}

/// Order submission payload for `POST /api/orders`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub payment_method: PaymentMethod,
    pub shipping_details: ShippingDetails,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub discount: Decimal,
    pub items_price: Decimal,
    pub total_price: Decimal,
    pub order_items: Vec<CartLineItem>,
}

#[derive(Clone, Copy, Debug)]
pub struct OrderDraftBuilder<'a> {
    regions: &'a RegionTable,
    policy: &'a DiscountPolicy,
}

impl<'a> OrderDraftBuilder<'a> {
    pub fn new(regions: &'a RegionTable, policy: &'a DiscountPolicy) -> Self { Self { regions, policy } }

    /// Pure: no I/O happens until the draft is handed to the sync layer.
    pub fn build(&self, source: ItemSource<'_>) -> Result<OrderDraft, ValidationError> {
        let shipping = source.shipping_details().ok_or_else(|| ValidationError::IncompleteShipping("address".into()))?;
        let missing = shipping.missing_fields();
        if !missing.is_empty() { return Err(ValidationError::IncompleteShipping(missing.join(", "))); }
        let payment_method = source.payment_method().ok_or(ValidationError::MissingPaymentMethod)?;
        let order_items = source.lines();
        if order_items.is_empty() { return Err(ValidationError::NoItems); }

        let totals = compute_totals(&order_items, self.regions.rate_for(&shipping.city), self.policy);
        Ok(OrderDraft {
            payment_method: payment_method.clone(),
            shipping_details: shipping.clone(),
            shipping_price: totals.shipping_fee,
            tax_price: Decimal::ZERO,
            discount: totals.discount,
            items_price: totals.subtotal,
            total_price: totals.total,
            order_items,
        })
    }
}

/// An order as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_items: Vec<CartLineItem>,
    #[serde(default, alias = "shippingAddress")]
    pub shipping_details: Option<ShippingDetails>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub items_price: Decimal,
    #[serde(default)]
    pub tax_price: Decimal,
    #[serde(default)]
    pub shipping_price: Decimal,
    #[serde(default)]
    pub total_price: Decimal,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Hosted card checkout session; the browser is sent to `url`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

impl Order {
    pub fn status_label(&self) -> &'static str {
        match (self.is_paid, self.is_delivered) {
            (_, true) => "Delivered",
            (true, false) => "Paid",
            (false, false) => "Pending",
        }
    }
}
