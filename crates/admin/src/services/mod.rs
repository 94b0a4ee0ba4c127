//! Back-office services.

pub mod labels;
