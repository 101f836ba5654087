//! Buy-Now overlay
//!
//! A single-item purchase that bypasses the persisted cart. Lives only in
//! client memory and carries its own shipping details and payment choice
//! while checkout runs.

use crate::domain::aggregates::cart::{validate_quantity, CartLineItem};
use crate::domain::aggregates::Product;
use crate::domain::value_objects::{PaymentMethod, ShippingDetails};
use crate::ValidationError;

#[derive(Clone, Debug, PartialEq)]
pub struct BuyNowIntent {
    product: Product,
    quantity: u32,
    shipping_details: Option<ShippingDetails>,
    payment_method: Option<PaymentMethod>,
}

impl BuyNowIntent {
    pub fn new(product: Product, quantity: u32) -> Result<Self, ValidationError> {
        validate_quantity(&product, quantity)?;
        Ok(Self { product, quantity, shipping_details: None, payment_method: None })
    }

    pub fn product(&self) -> &Product { &self.product }
    pub fn quantity(&self) -> u32 { self.quantity }
    pub fn shipping_details(&self) -> Option<&ShippingDetails> { self.shipping_details.as_ref() }
    pub fn payment_method(&self) -> Option<&PaymentMethod> { self.payment_method.as_ref() }

    /// The overlay's only order line.
    pub fn line(&self) -> CartLineItem {
        CartLineItem {
            product_id: self.product.id.clone(), name: self.product.name.clone(), image: self.product.image.clone(),
            unit_price: self.product.price, quantity: self.quantity, stock_ceiling: self.product.count_in_stock,
        }
    }

    pub fn set_shipping_details(&mut self, details: ShippingDetails) { self.shipping_details = Some(details); }
    pub fn set_payment_method(&mut self, method: PaymentMethod) { self.payment_method = Some(method); }
}
