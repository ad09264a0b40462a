//! Payment service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, PaymentId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::services::{CallLog, ServiceCall};

/// Payment transaction to create for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub user_id: Option<UserId>,
    pub total_amount: f64,
}

/// Trait for payment processing operations.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Creates a payment transaction and returns its identifier.
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentId, ServiceError>;

    /// Deletes a previously created payment transaction.
    async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), ServiceError>;
}

#[derive(Debug)]
struct InMemoryPaymentState {
    payments: HashMap<PaymentId, PaymentRequest>,
    next_id: u64,
    fail_on_create: Option<ServiceError>,
    fail_on_delete: Option<ServiceError>,
}

impl Default for InMemoryPaymentState {
    fn default() -> Self {
        Self {
            payments: HashMap::new(),
            next_id: 1,
            fail_on_create: None,
            fail_on_delete: None,
        }
    }
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
    log: CallLog,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every call into `log`.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Makes every subsequent create call fail with `error`.
    pub fn fail_create_with(&self, error: ServiceError) {
        self.state.write().unwrap().fail_on_create = Some(error);
    }

    /// Makes every subsequent delete call fail with `error`.
    pub fn fail_delete_with(&self, error: ServiceError) {
        self.state.write().unwrap().fail_on_delete = Some(error);
    }

    /// Returns the number of active payments.
    pub fn payment_count(&self) -> usize {
        self.state.read().unwrap().payments.len()
    }

    /// Returns the payment stored under `payment_id`.
    pub fn payment(&self, payment_id: PaymentId) -> Option<PaymentRequest> {
        self.state.read().unwrap().payments.get(&payment_id).cloned()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentId, ServiceError> {
        self.log.record(ServiceCall::CreatePayment {
            order_id: request.order_id,
            total_amount: request.total_amount,
        });
        let mut state = self.state.write().unwrap();

        if let Some(error) = state.fail_on_create.clone() {
            return Err(error);
        }

        let payment_id = PaymentId::new(state.next_id);
        state.next_id += 1;
        state.payments.insert(payment_id, request.clone());

        Ok(payment_id)
    }

    async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), ServiceError> {
        self.log.record(ServiceCall::DeletePayment(payment_id));
        let mut state = self.state.write().unwrap();

        if let Some(error) = state.fail_on_delete.clone() {
            return Err(error);
        }

        state
            .payments
            .remove(&payment_id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::rejected(404, format!("payment {payment_id} not found")))
    }
}
