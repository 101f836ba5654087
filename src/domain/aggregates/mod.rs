//! Aggregates module
pub mod product;
pub mod cart;
pub mod buy_now;
pub mod order;

pub use product::Product;
pub use cart::{Cart, CartLineItem};
pub use buy_now::BuyNowIntent;
pub use order::{CheckoutSession, ItemSource, Order, OrderDraft, OrderDraftBuilder};
