//! Checkout step gate
//!
//! Linear flow `shipping -> payment -> place order`. The phase is derived
//! from what the active item source already holds; nothing stores a step
//! token. The gate runs on every page entry and never fails, it only
//! sends the user back to the earliest incomplete step.

use std::fmt;

use crate::domain::aggregates::ItemSource;
use crate::domain::value_objects::OrderId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutPage {
    Shipping,
    Payment,
    PlaceOrder,
    Confirmation(OrderId),
}

impl fmt::Display for CheckoutPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipping => write!(f, "/shipping"),
            Self::Payment => write!(f, "/payment"),
            Self::PlaceOrder => write!(f, "/placeorder"),
            Self::Confirmation(id) => write!(f, "/order/{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutPhase {
    NoShipping,
    HasShipping,
    HasPayment,
    Placed(OrderId),
}

impl CheckoutPhase {
    pub fn of(source: ItemSource<'_>, placed: Option<&OrderId>) -> Self {
        if let Some(id) = placed { return Self::Placed(id.clone()); }
        match (source.shipping_details(), source.payment_method()) {
            (Some(s), Some(_)) if s.is_complete() => Self::HasPayment,
            (Some(s), None) if s.is_complete() => Self::HasShipping,
            _ => Self::NoShipping,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(CheckoutPage),
}

pub fn gate(page: &CheckoutPage, phase: &CheckoutPhase) -> GateDecision {
    use CheckoutPage as Page;
    use CheckoutPhase as Phase;

    let decision = match (page, phase) {
        (Page::Shipping, _) | (Page::Confirmation(_), _) => GateDecision::Proceed,
        (Page::Payment, Phase::NoShipping | Phase::Placed(_)) => GateDecision::Redirect(Page::Shipping),
        (Page::Payment, _) => GateDecision::Proceed,
        (Page::PlaceOrder, Phase::NoShipping) => GateDecision::Redirect(Page::Shipping),
        (Page::PlaceOrder, Phase::HasShipping) => GateDecision::Redirect(Page::Payment),
        (Page::PlaceOrder, Phase::HasPayment) => GateDecision::Proceed,
        (Page::PlaceOrder, Phase::Placed(id)) => GateDecision::Redirect(Page::Confirmation(id.clone())),
    };
    if let GateDecision::Redirect(to) = &decision {
        tracing::debug!(from = %page, to = %to, ?phase, "checkout gate redirect");
    }
    decision
}
