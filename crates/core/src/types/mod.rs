//! Core types for Marram.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod country;
pub mod id;
pub mod money;
pub mod order_number;
pub mod status;
pub mod token;

pub use country::{CountryCode, CountryCodeError};
pub use id::*;
pub use money::{Money, Weight};
pub use order_number::OrderNumber;
pub use status::OrderStatus;
pub use token::GuestToken;
