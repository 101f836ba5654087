//! Wire shapes that differ from the domain types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Cart, CartLineItem};
use crate::domain::value_objects::{PaymentMethod, ProductId, ShippingDetails};

/// Cart representation returned by every `/api/cart` endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartResponse {
    pub cart_items: Vec<CartLineItem>,
    #[serde(alias = "shippingAddress")]
    pub shipping_details: Option<ShippingDetails>,
    pub payment_method: Option<String>,
    pub total_price: Option<Decimal>,
}

impl From<CartResponse> for Cart {
    fn from(r: CartResponse) -> Self {
        // Fresh carts come back with `{}` and `""` placeholders.
        let shipping = r.shipping_details.filter(|s| s.missing_fields().len() < 4);
        let payment = r.payment_method.filter(|m| !m.trim().is_empty()).map(PaymentMethod::from);
        Cart::new(r.cart_items, shipping, payment)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertItemRequest<'a> {
    pub product_id: &'a ProductId,
    pub qty: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest<'a> {
    pub payment_method: &'a PaymentMethod,
}

/// One line of a hosted checkout session request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&CartLineItem> for SessionItem {
    fn from(item: &CartLineItem) -> Self {
        Self { name: item.name.clone(), price: item.unit_price, quantity: item.quantity }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub items: &'a [SessionItem],
}

/// Error body the backend sends with non-2xx replies.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}
