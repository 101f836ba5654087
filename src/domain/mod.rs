//! Checkout domain: pure types and rules, no I/O.
pub mod value_objects;
pub mod regions;
pub mod pricing;
pub mod aggregates;
pub mod checkout_gate;
pub mod events;
