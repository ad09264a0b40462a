//! Saga input.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// Stock delta that takes this item out of stock.
    pub fn checkout_delta(&self) -> i64 {
        -i64::from(self.quantity)
    }

    /// Stock delta that puts this item back.
    pub fn restock_delta(&self) -> i64 {
        i64::from(self.quantity)
    }
}

/// The order a saga is asked to place. Never mutated once a saga starts.
///
/// `user_id` is forwarded to the downstream services as-is, absent or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl OrderRequest {
    pub fn new(user_id: Option<UserId>, items: Vec<OrderItem>) -> Self {
        Self { user_id, items }
    }
}
