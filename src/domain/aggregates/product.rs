//! Catalog product as seen by the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProductId;

/// The slice of a catalog product the cart and Buy-Now paths need.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Decimal,
    #[serde(default)]
    pub count_in_stock: u32,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, count_in_stock: u32) -> Self {
        Self { id: ProductId::new(id), name: name.into(), image: String::new(), price, count_in_stock }
    }

    pub fn is_in_stock(&self) -> bool { self.count_in_stock > 0 }
}
