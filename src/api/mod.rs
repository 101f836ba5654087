//! Storefront backend API
//!
//! [`StorefrontApi`] is the seam between checkout coordination and the
//! remote backend. [`HttpApi`] is the REST implementation.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CheckoutSession, Order, OrderDraft, Product};
use crate::domain::value_objects::{OrderId, PaymentMethod, ProductId, ShippingDetails};

pub mod dto;
pub mod http;

pub use dto::SessionItem;
pub use http::HttpApi;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-2xx reply. `message` is the backend's own text when it sent one.
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// A cart reply tagged with the request sequence number it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub seq: u64,
    pub value: T,
}

#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn fetch_cart(&self, seq: u64) -> ApiResult<Versioned<Cart>>;
    async fn upsert_cart_item(&self, product_id: &ProductId, quantity: u32, seq: u64) -> ApiResult<Versioned<Cart>>;
    async fn remove_cart_item(&self, product_id: &ProductId, seq: u64) -> ApiResult<Versioned<Cart>>;
    async fn clear_cart(&self, seq: u64) -> ApiResult<Versioned<Cart>>;
    async fn save_shipping(&self, details: &ShippingDetails, seq: u64) -> ApiResult<Versioned<Cart>>;
    async fn save_payment_method(&self, method: &PaymentMethod, seq: u64) -> ApiResult<Versioned<Cart>>;

    async fn create_order(&self, draft: &OrderDraft, idempotency_key: Uuid) -> ApiResult<Order>;
    async fn my_orders(&self) -> ApiResult<Vec<Order>>;
    async fn order(&self, id: &OrderId) -> ApiResult<Order>;
    async fn all_orders(&self) -> ApiResult<Vec<Order>>;

    async fn product(&self, id: &ProductId) -> ApiResult<Product>;
    async fn create_checkout_session(&self, items: &[SessionItem]) -> ApiResult<CheckoutSession>;
}
