//! Cart Aggregate
//!
//! The client copy of the server cart. Every successful remote mutation
//! replaces the whole snapshot; totals are always derived, never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Product;
use crate::domain::pricing::{compute_totals, DiscountPolicy, Priced, Totals};
use crate::domain::regions::RegionTable;
use crate::domain::value_objects::{PaymentMethod, ProductId, ShippingDetails};
use crate::ValidationError;

/// One product line. `1 <= quantity <= stock_ceiling`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "price")]
    pub unit_price: Decimal,
    #[serde(rename = "qty", alias = "quantity")]
    pub quantity: u32,
    #[serde(rename = "countInStock", default)]
    pub stock_ceiling: u32,
}

impl CartLineItem {
    pub fn new(product: &Product, quantity: u32) -> Result<Self, ValidationError> {
        validate_quantity(product, quantity)?;
        Ok(Self {
            product_id: product.id.clone(), name: product.name.clone(), image: product.image.clone(),
            unit_price: product.price, quantity, stock_ceiling: product.count_in_stock,
        })
    }
}

impl Priced for CartLineItem {
    fn unit_price(&self) -> Decimal { self.unit_price }
    fn quantity(&self) -> u32 { self.quantity }
}

/// Checks a requested quantity against the product's stock.
pub fn validate_quantity(product: &Product, quantity: u32) -> Result<(), ValidationError> {
    if quantity == 0 { return Err(ValidationError::UseRemoval); }
    if quantity > product.count_in_stock {
        return Err(ValidationError::ExceedsStock { product: product.name.clone(), available: product.count_in_stock });
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartLineItem>,
    shipping_details: Option<ShippingDetails>,
    payment_method: Option<PaymentMethod>,
}

impl Cart {
    pub fn new(items: Vec<CartLineItem>, shipping_details: Option<ShippingDetails>, payment_method: Option<PaymentMethod>) -> Self {
        Self { items, shipping_details, payment_method }
    }

    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn shipping_details(&self) -> Option<&ShippingDetails> { self.shipping_details.as_ref() }
    pub fn payment_method(&self) -> Option<&PaymentMethod> { self.payment_method.as_ref() }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Shipping is only priced once an address has been entered.
    pub fn shipping_fee(&self, regions: &RegionTable) -> Decimal {
        self.shipping_details.as_ref().map_or(Decimal::ZERO, |s| regions.rate_for(&s.city))
    }

    pub fn totals(&self, regions: &RegionTable, policy: &DiscountPolicy) -> Totals {
        compute_totals(&self.items, self.shipping_fee(regions), policy)
    }
}
