//! Stock service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ProductId;

use crate::error::ServiceError;
use crate::services::{CallLog, ServiceCall};

/// Trait for stock level operations.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Adds `delta` to the stock of a product. Negative deltas check stock out.
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    levels: HashMap<ProductId, i64>,
    fail_for_product: HashMap<ProductId, ServiceError>,
    fail_on_restock: Option<ServiceError>,
}

/// In-memory stock service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockService {
    state: Arc<RwLock<InMemoryStockState>>,
    log: CallLog,
}

impl InMemoryStockService {
    /// Creates a new in-memory stock service with every level at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every call into `log`.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Sets the stock level of a product.
    pub fn set_level(&self, product_id: impl Into<ProductId>, level: i64) {
        self.state
            .write()
            .unwrap()
            .levels
            .insert(product_id.into(), level);
    }

    /// Returns the stock level of a product.
    pub fn level(&self, product_id: impl Into<ProductId>) -> i64 {
        self.state
            .read()
            .unwrap()
            .levels
            .get(&product_id.into())
            .copied()
            .unwrap_or_default()
    }

    /// Makes every adjustment of `product_id` fail with `error`.
    pub fn fail_for_product(&self, product_id: impl Into<ProductId>, error: ServiceError) {
        self.state
            .write()
            .unwrap()
            .fail_for_product
            .insert(product_id.into(), error);
    }

    /// Makes every positive adjustment fail with `error`.
    pub fn fail_restock_with(&self, error: ServiceError) {
        self.state.write().unwrap().fail_on_restock = Some(error);
    }
}

#[async_trait]
impl StockService for InMemoryStockService {
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<(), ServiceError> {
        self.log
            .record(ServiceCall::AdjustStock { product_id, delta });
        let mut state = self.state.write().unwrap();

        if let Some(error) = state.fail_for_product.get(&product_id).cloned() {
            return Err(error);
        }
        if delta > 0 {
            if let Some(error) = state.fail_on_restock.clone() {
                return Err(error);
            }
        }

        *state.levels.entry(product_id).or_default() += delta;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_adjust_up_and_down() {
        let service = InMemoryStockService::new();
        service.set_level(1, 10);

        service.adjust_stock(ProductId::new(1), -3).await.unwrap();
        assert_eq!(service.level(1), 7);

        service.adjust_stock(ProductId::new(1), 3).await.unwrap();
        assert_eq!(service.level(1), 10);
    }

    #[tokio::test]
    async fn test_fail_for_product_leaves_others_untouched() {
        let service = InMemoryStockService::new();
        service.fail_for_product(2, ServiceError::rejected(409, "insufficient stock"));

        assert!(service.adjust_stock(ProductId::new(1), -1).await.is_ok());
        let err = service.adjust_stock(ProductId::new(2), -1).await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(service.level(1), -1);
        assert_eq!(service.level(2), 0);
    }

    #[tokio::test]
    async fn test_fail_on_restock_allows_checkout() {
        let service = InMemoryStockService::new();
        service.fail_restock_with(ServiceError::transport("connection reset"));

        assert!(service.adjust_stock(ProductId::new(1), -1).await.is_ok());
        let err = service.adjust_stock(ProductId::new(1), 1).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_failed_calls_are_logged() {
        let log = CallLog::new();
        let service = InMemoryStockService::new().with_log(log.clone());
        service.fail_for_product(5, ServiceError::rejected(400, "unknown product"));

        let _ = service.adjust_stock(ProductId::new(5), -4).await;

        assert_eq!(log.stock_adjustments(), vec![(ProductId::new(5), -4)]);
    }
}
