//! Storefront checkout core
//!
//! Client-side cart and checkout coordination against a remote storefront
//! backend. The backend owns pricing truth, stock and persistence; this crate
//! keeps a consistent client copy and drives checkout.
//!
//! ## Features
//! - Server-authoritative cart with derived totals and a 10% bulk discount
//! - District shipping rates with a default fallback
//! - Buy-Now single-item purchases that never touch the cart
//! - Gated checkout: shipping, payment, place order
//! - Order drafting and submission, hosted card checkout, simulated capture

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod payment;
pub mod session;
pub mod store;
pub mod sync;

pub use api::{ApiError, HttpApi, StorefrontApi};
pub use config::Config;
pub use domain::aggregates::{BuyNowIntent, Cart, CartLineItem, ItemSource, Order, OrderDraft, OrderDraftBuilder, Product};
pub use domain::checkout_gate::{CheckoutPage, CheckoutPhase, GateDecision};
pub use domain::pricing::{DiscountPolicy, Totals};
pub use domain::regions::{Region, RegionTable};
pub use domain::value_objects::{Money, MoneyError, OrderId, PaymentMethod, ProductId, ShippingDetails};
pub use payment::{CaptureModal, CheckoutOutcome, PaymentError, SimulatedCapture};
pub use store::{AppState, OpStatus};
pub use sync::Storefront;

// =============================================================================
// Error Types
// =============================================================================

/// Input problems caught before anything is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Quantity must be at least 1, remove the item instead")]
    UseRemoval,

    #[error("Only {available} of {product} in stock")]
    ExceedsStock { product: String, available: u32 },

    #[error("Shipping details incomplete: {0}")]
    IncompleteShipping(String),

    #[error("Select a payment method")]
    MissingPaymentMethod,

    #[error("There are no items to order")]
    NoItems,
}

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("{0} already in progress")]
    AlreadyPending(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
