//! Orchestrated order saga.
//!
//! Placing an order spans three services that share no transaction:
//! 1. Create the order
//! 2. Decrease stock for every line item
//! 3. Create the payment
//!
//! When a step fails, the steps that already completed are compensated
//! (stock put back, order deleted) in reverse order of completion.

pub mod compensation;
pub mod context;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod request;
pub mod services;
pub mod state;

pub use compensation::{CompensationOutcome, CompensationRecord};
pub use context::{SagaContext, SagaResult, SagaStatus};
pub use controller::OrderSagaController;
pub use error::{OrchestrationFault, ServiceError};
pub use handlers::StepKind;
pub use request::{OrderItem, OrderRequest};
pub use services::{
    CallLog, GatewayClient, InMemoryOrderService, InMemoryPaymentService, InMemoryStockService,
    OrderDetails, OrderService, PaymentRequest, PaymentService, ServiceCall, StockService,
};
pub use state::SagaState;
