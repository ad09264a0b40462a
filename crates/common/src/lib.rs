//! Identifier types shared by the saga core and the HTTP surface.

pub mod types;

pub use types::{OrderId, PaymentId, ProductId, UserId};
