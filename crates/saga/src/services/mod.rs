//! Downstream service traits, in-memory implementations, and the HTTP gateway client.

pub mod gateway;
pub mod order;
pub mod payment;
pub mod stock;

use std::sync::{Arc, Mutex};

use common::{OrderId, PaymentId, ProductId};

pub use gateway::GatewayClient;
pub use order::{InMemoryOrderService, OrderDetails, OrderService};
pub use payment::{InMemoryPaymentService, PaymentRequest, PaymentService};
pub use stock::{InMemoryStockService, StockService};

/// A downstream call observed by the in-memory services.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    CreateOrder,
    GetOrder(OrderId),
    DeleteOrder(OrderId),
    AdjustStock { product_id: ProductId, delta: i64 },
    CreatePayment { order_id: OrderId, total_amount: f64 },
    DeletePayment(PaymentId),
}

/// Journal of downstream calls shared between in-memory services.
///
/// Every call is recorded whether or not it succeeded.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<ServiceCall>>>,
}

impl CallLog {
    /// Creates an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call.
    pub fn record(&self, call: ServiceCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Returns every recorded call in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the stock adjustments in order.
    pub fn stock_adjustments(&self) -> Vec<(ProductId, i64)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                ServiceCall::AdjustStock { product_id, delta } => Some((*product_id, *delta)),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of recorded calls.
    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_journal() {
        let log = CallLog::new();
        let other = log.clone();
        other.record(ServiceCall::CreateOrder);
        other.record(ServiceCall::AdjustStock {
            product_id: ProductId::new(1),
            delta: -2,
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.calls()[0], ServiceCall::CreateOrder);
        assert_eq!(log.stock_adjustments(), vec![(ProductId::new(1), -2)]);
    }
}
