//! Cart and order pricing
//!
//! `total = subtotal - discount + shipping`. The discount is a flat rate
//! that kicks in once the subtotal is strictly above the threshold.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::domain::value_objects::round_cents;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscountPolicy {
    pub threshold: Decimal,
    pub rate: Decimal,
}

impl Default for DiscountPolicy {
    fn default() -> Self { Self { threshold: dec!(500), rate: dec!(0.10) } }
}

impl DiscountPolicy {
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.threshold { round_cents(subtotal * self.rate) } else { Decimal::ZERO }
    }
}

/// Anything that contributes `quantity * unit_price` to a subtotal.
pub trait Priced {
    fn unit_price(&self) -> Decimal;
    fn quantity(&self) -> u32;
    fn line_total(&self) -> Decimal { self.unit_price() * Decimal::from(self.quantity()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

pub fn compute_totals<P: Priced>(lines: &[P], shipping_fee: Decimal, policy: &DiscountPolicy) -> Totals {
    let subtotal = round_cents(lines.iter().map(Priced::line_total).sum());
    let discount = policy.discount_for(subtotal);
    let shipping_fee = round_cents(shipping_fee);
    Totals { subtotal, discount, shipping_fee, total: round_cents(subtotal - discount + shipping_fee) }
}
