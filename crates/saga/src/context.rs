//! Per-run saga state.

use common::{OrderId, PaymentId};
use serde::Serialize;
use uuid::Uuid;

use crate::compensation::CompensationRecord;
use crate::handlers::{CompletedStep, StepKind};
use crate::request::OrderRequest;
use crate::state::SagaState;

/// Everything one saga run knows about itself.
///
/// Owned by a single run and dropped once the run reaches `Completed`.
#[derive(Debug, Clone)]
pub struct SagaContext {
    saga_id: Uuid,
    request: OrderRequest,
    state: SagaState,
    order_id: Option<OrderId>,
    payment_id: Option<PaymentId>,
    completed: Vec<CompletedStep>,
    compensations: Vec<CompensationRecord>,
    error_occurred: bool,
}

impl SagaContext {
    pub fn new(request: OrderRequest) -> Self {
        Self {
            saga_id: Uuid::new_v4(),
            request,
            state: SagaState::default(),
            order_id: None,
            payment_id: None,
            completed: Vec::new(),
            compensations: Vec::new(),
            error_occurred: false,
        }
    }

    /// Correlation identifier for logs and traces.
    pub fn saga_id(&self) -> Uuid {
        self.saga_id
    }

    pub fn request(&self) -> &OrderRequest {
        &self.request
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn payment_id(&self) -> Option<PaymentId> {
        self.payment_id
    }

    pub fn error_occurred(&self) -> bool {
        self.error_occurred
    }

    /// Kinds of the steps still awaiting compensation, oldest first.
    pub fn completed_steps(&self) -> Vec<StepKind> {
        self.completed.iter().map(CompletedStep::kind).collect()
    }

    /// Compensating actions that ran, in execution order.
    pub fn compensations(&self) -> &[CompensationRecord] {
        &self.compensations
    }

    /// Returns true if the saga created its payment without any error.
    pub fn succeeded(&self) -> bool {
        self.state.is_terminal() && self.payment_id.is_some() && !self.error_occurred
    }

    /// The caller-facing result of this run.
    pub fn result(&self) -> SagaResult {
        SagaResult {
            order_id: self.order_id.unwrap_or(OrderId::NONE),
            status: if self.succeeded() {
                SagaStatus::Ok
            } else {
                SagaStatus::Failed
            },
        }
    }

    pub(crate) fn set_state(&mut self, state: SagaState) {
        self.state = state;
    }

    pub(crate) fn set_order_id(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    pub(crate) fn set_payment_id(&mut self, payment_id: PaymentId) {
        self.payment_id = Some(payment_id);
    }

    pub(crate) fn mark_error(&mut self) {
        self.error_occurred = true;
    }

    pub(crate) fn push_completed(&mut self, step: CompletedStep) {
        self.completed.push(step);
    }

    pub(crate) fn top_completed(&self) -> Option<StepKind> {
        self.completed.last().map(CompletedStep::kind)
    }

    pub(crate) fn has_completed(&self, kind: StepKind) -> bool {
        self.completed.iter().any(|step| step.kind() == kind)
    }

    pub(crate) fn pop_completed(&mut self) -> Option<CompletedStep> {
        self.completed.pop()
    }

    pub(crate) fn record_compensation(&mut self, record: CompensationRecord) {
        self.compensations.push(record);
    }
}

/// Binary outcome reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SagaStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "An error occurred while creating the order.")]
    Failed,
}

impl SagaStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SagaStatus::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Ok => "OK",
            SagaStatus::Failed => "An error occurred while creating the order.",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `{order_id, status}` returned by a saga run.
///
/// `order_id` is `0` when the order was never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SagaResult {
    pub order_id: OrderId,
    pub status: SagaStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_starts_creating_order() {
        let ctx = SagaContext::new(OrderRequest::default());
        assert_eq!(ctx.state(), SagaState::CreatingOrder);
        assert_eq!(ctx.order_id(), None);
        assert!(ctx.completed_steps().is_empty());
        assert!(!ctx.error_occurred());
    }

    #[test]
    fn test_contexts_have_distinct_ids() {
        let a = SagaContext::new(OrderRequest::default());
        let b = SagaContext::new(OrderRequest::default());
        assert_ne!(a.saga_id(), b.saga_id());
    }

    #[test]
    fn test_unfinished_context_is_not_ok() {
        let mut ctx = SagaContext::new(OrderRequest::default());
        ctx.set_order_id(OrderId::new(42));
        ctx.set_payment_id(PaymentId::new(1));

        assert_eq!(ctx.result().status, SagaStatus::Failed);

        ctx.set_state(SagaState::Completed);
        assert_eq!(
            ctx.result(),
            SagaResult {
                order_id: OrderId::new(42),
                status: SagaStatus::Ok
            }
        );
    }

    #[test]
    fn test_error_flag_fails_the_result() {
        let mut ctx = SagaContext::new(OrderRequest::default());
        ctx.set_payment_id(PaymentId::new(1));
        ctx.set_state(SagaState::Completed);
        ctx.mark_error();

        let result = ctx.result();
        assert_eq!(result.order_id, OrderId::NONE);
        assert_eq!(result.status, SagaStatus::Failed);
    }

    #[test]
    fn test_result_wire_shape() {
        let result = SagaResult {
            order_id: OrderId::new(42),
            status: SagaStatus::Ok,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({ "order_id": 42, "status": "OK" })
        );

        let failed = SagaResult {
            order_id: OrderId::NONE,
            status: SagaStatus::Failed,
        };
        assert_eq!(
            serde_json::to_value(failed).unwrap()["status"],
            "An error occurred while creating the order."
        );
    }
}
