//! Order service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::request::OrderRequest;
use crate::services::{CallLog, ServiceCall};

/// Order as reported back by the order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(default)]
    pub order_id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub total_amount: f64,
}

/// Trait for order management operations.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Creates an order and returns the identifier the service assigned.
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderId, ServiceError>;

    /// Fetches an order, including its total amount.
    async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, ServiceError>;

    /// Deletes an order and echoes the deleted identifier.
    async fn delete_order(&self, order_id: OrderId) -> Result<OrderId, ServiceError>;
}

#[derive(Debug)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, OrderDetails>,
    unit_prices: HashMap<ProductId, f64>,
    next_id: u64,
    fail_on_create: Option<ServiceError>,
    fail_on_get: Option<ServiceError>,
    fail_on_delete: Option<ServiceError>,
}

impl Default for InMemoryOrderState {
    fn default() -> Self {
        Self {
            orders: HashMap::new(),
            unit_prices: HashMap::new(),
            next_id: 1,
            fail_on_create: None,
            fail_on_get: None,
            fail_on_delete: None,
        }
    }
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
    log: CallLog,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service numbering orders from 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers created orders from `first_id`.
    pub fn starting_at(self, first_id: u64) -> Self {
        self.state.write().unwrap().next_id = first_id;
        self
    }

    /// Records every call into `log`.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Sets the price used to compute order totals.
    pub fn set_unit_price(&self, product_id: impl Into<ProductId>, price: f64) {
        self.state
            .write()
            .unwrap()
            .unit_prices
            .insert(product_id.into(), price);
    }

    /// Makes every subsequent create call fail with `error`.
    pub fn fail_create_with(&self, error: ServiceError) {
        self.state.write().unwrap().fail_on_create = Some(error);
    }

    /// Makes every subsequent get call fail with `error`.
    pub fn fail_get_with(&self, error: ServiceError) {
        self.state.write().unwrap().fail_on_get = Some(error);
    }

    /// Makes every subsequent delete call fail with `error`.
    pub fn fail_delete_with(&self, error: ServiceError) {
        self.state.write().unwrap().fail_on_delete = Some(error);
    }

    /// Returns the number of orders that currently exist.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Returns true if an order exists with the given ID.
    pub fn has_order(&self, order_id: OrderId) -> bool {
        self.state.read().unwrap().orders.contains_key(&order_id)
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderId, ServiceError> {
        self.log.record(ServiceCall::CreateOrder);
        let mut state = self.state.write().unwrap();

        if let Some(error) = state.fail_on_create.clone() {
            return Err(error);
        }

        let order_id = OrderId::new(state.next_id);
        state.next_id += 1;

        let total_amount: f64 = request
            .items
            .iter()
            .map(|item| {
                let price = state
                    .unit_prices
                    .get(&item.product_id)
                    .copied()
                    .unwrap_or_default();
                price * f64::from(item.quantity)
            })
            .sum();

        state.orders.insert(
            order_id,
            OrderDetails {
                order_id,
                user_id: request.user_id,
                total_amount,
            },
        );

        Ok(order_id)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, ServiceError> {
        self.log.record(ServiceCall::GetOrder(order_id));
        let state = self.state.read().unwrap();

        if let Some(error) = state.fail_on_get.clone() {
            return Err(error);
        }

        state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| ServiceError::rejected(404, format!("order {order_id} not found")))
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<OrderId, ServiceError> {
        self.log.record(ServiceCall::DeleteOrder(order_id));
        let mut state = self.state.write().unwrap();

        if let Some(error) = state.fail_on_delete.clone() {
            return Err(error);
        }

        state
            .orders
            .remove(&order_id)
            .map(|_| order_id)
            .ok_or_else(|| ServiceError::rejected(404, format!("order {order_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OrderItem;

    fn request() -> OrderRequest {
        OrderRequest::new(
            Some(UserId::new(1)),
            vec![OrderItem::new(1, 2), OrderItem::new(2, 1)],
        )
    }

    #[tokio::test]
    async fn test_create_get_and_delete() {
        let service = InMemoryOrderService::new();
        service.set_unit_price(1, 10.0);
        service.set_unit_price(2, 2.5);

        let order_id = service.create_order(&request()).await.unwrap();
        assert_eq!(service.order_count(), 1);

        let details = service.get_order(order_id).await.unwrap();
        assert_eq!(details.order_id, order_id);
        assert_eq!(details.total_amount, 22.5);

        assert_eq!(service.delete_order(order_id).await.unwrap(), order_id);
        assert!(!service.has_order(order_id));
    }

    #[tokio::test]
    async fn test_sequential_order_ids() {
        let service = InMemoryOrderService::new().starting_at(42);

        let first = service.create_order(&request()).await.unwrap();
        let second = service.create_order(&request()).await.unwrap();

        assert_eq!(first, OrderId::new(42));
        assert_eq!(second, OrderId::new(43));
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let service = InMemoryOrderService::new();
        service.fail_create_with(ServiceError::rejected(400, "invalid order"));

        let result = service.create_order(&request()).await;
        assert_eq!(result, Err(ServiceError::rejected(400, "invalid order")));
        assert_eq!(service.order_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let service = InMemoryOrderService::new();

        let err = service.get_order(OrderId::new(9)).await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        let err = service.delete_order(OrderId::NONE).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_calls_are_logged() {
        let log = CallLog::new();
        let service = InMemoryOrderService::new().with_log(log.clone());

        let order_id = service.create_order(&request()).await.unwrap();
        service.delete_order(order_id).await.unwrap();

        assert_eq!(
            log.calls(),
            vec![ServiceCall::CreateOrder, ServiceCall::DeleteOrder(order_id)]
        );
    }
}
