//! Step handlers: one forward action and its compensating action per saga step.

pub mod create_order;
pub mod create_payment;
pub mod decrease_stock;

use tracing::Span;

use crate::compensation::CompensationOutcome;
use crate::error::ServiceError;
use crate::services::{OrderService, PaymentService, StockService};
use crate::state::SagaState;

pub use create_order::CreateOrderHandler;
pub use create_payment::CreatePaymentHandler;
pub use decrease_stock::DecreaseStockHandler;

/// Identifies a saga step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    CreateOrder,
    DecreaseStock,
    CreatePayment,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::CreateOrder => "create_order",
            StepKind::DecreaseStock => "decrease_stock",
            StepKind::CreatePayment => "create_payment",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A step whose forward action succeeded at the downstream service.
#[derive(Debug, Clone)]
pub enum CompletedStep {
    CreateOrder(CreateOrderHandler),
    DecreaseStock(DecreaseStockHandler),
    CreatePayment(CreatePaymentHandler),
}

impl CompletedStep {
    pub fn kind(&self) -> StepKind {
        match self {
            CompletedStep::CreateOrder(_) => StepKind::CreateOrder,
            CompletedStep::DecreaseStock(_) => StepKind::DecreaseStock,
            CompletedStep::CreatePayment(_) => StepKind::CreatePayment,
        }
    }

    /// Runs the compensating action of the wrapped handler.
    pub async fn rollback<O, S, P>(
        &self,
        orders: &O,
        stock: &S,
        payments: &P,
    ) -> (SagaState, CompensationOutcome)
    where
        O: OrderService + ?Sized,
        S: StockService + ?Sized,
        P: PaymentService + ?Sized,
    {
        match self {
            CompletedStep::CreateOrder(handler) => handler.rollback(orders).await,
            CompletedStep::DecreaseStock(handler) => handler.rollback(stock).await,
            CompletedStep::CreatePayment(handler) => handler.rollback(payments).await,
        }
    }
}

/// Attaches a failed downstream call to `span`.
fn record_failure(span: &Span, error: &ServiceError) {
    span.record("success", false);
    if let Some(status) = error.status() {
        span.record("error_code", status);
    }
    span.record("error_message", tracing::field::display(error));
}
