//! Checkout pipeline components.
//!
//! Each component is injected with per-entity store traits so unit tests run
//! against in-memory fakes; the `db` module provides the `PostgreSQL`
//! implementations.

pub mod cart;
pub mod checkout;
pub mod merge;
pub mod orders;
pub mod shipping;

#[cfg(test)]
pub mod fakes;
