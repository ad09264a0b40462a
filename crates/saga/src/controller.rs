//! Saga controller: the step function and the loop that drives it.

use std::time::Instant;

use tracing::Instrument;
use tracing::field::Empty;

use crate::compensation::{CompensationOutcome, CompensationRecord};
use crate::context::{SagaContext, SagaResult};
use crate::error::OrchestrationFault;
use crate::handlers::{
    CompletedStep, CreateOrderHandler, CreatePaymentHandler, DecreaseStockHandler, StepKind,
};
use crate::request::OrderRequest;
use crate::services::{OrderService, PaymentService, StockService};
use crate::state::SagaState;

/// Orchestrates the order saga across the order, stock, and payment services.
///
/// Holds only the downstream capabilities. Each run owns a fresh
/// [`SagaContext`], so one controller can serve independent sagas concurrently.
pub struct OrderSagaController<O, S, P>
where
    O: OrderService,
    S: StockService,
    P: PaymentService,
{
    orders: O,
    stock: S,
    payments: P,
}

impl<O, S, P> OrderSagaController<O, S, P>
where
    O: OrderService,
    S: StockService,
    P: PaymentService,
{
    /// Creates a new saga controller.
    pub fn new(orders: O, stock: S, payments: P) -> Self {
        Self {
            orders,
            stock,
            payments,
        }
    }

    /// Places an order and reports `{order_id, status}`.
    pub async fn run(&self, request: OrderRequest) -> SagaResult {
        self.execute(request).await.result()
    }

    /// Runs a saga to completion and returns its final context.
    ///
    /// Never fails: every downstream failure and orchestration fault is
    /// turned into a state transition.
    pub async fn execute(&self, request: OrderRequest) -> SagaContext {
        metrics::counter!("saga_executions_total").increment(1);
        let started = Instant::now();
        let mut ctx = SagaContext::new(request);

        let span = tracing::info_span!(
            "order_saga_execution",
            saga_id = %ctx.saga_id(),
            user_id = ?ctx.request().user_id,
            items_count = ctx.request().items.len(),
            current_state = Empty,
            final_state = Empty,
            error_occurred = Empty,
            order_id = Empty,
            saga_status = Empty,
        );

        async {
            let span = tracing::Span::current();
            let mut state = ctx.state();
            while !state.is_terminal() {
                span.record("current_state", state.as_str());
                let step_span = tracing::info_span!(
                    "saga_step",
                    state = state.as_str(),
                    step = state.span_name()
                );
                state = self.step(&mut ctx, state).instrument(step_span).await;
            }

            let result = ctx.result();
            span.record("final_state", state.as_str());
            span.record("error_occurred", ctx.error_occurred());
            span.record("order_id", result.order_id.as_u64());
            span.record("saga_status", result.status.as_str());

            let duration = started.elapsed().as_secs_f64();
            metrics::histogram!("saga_duration_seconds").record(duration);
            if result.status.is_ok() {
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(
                    order_id = %result.order_id,
                    duration,
                    "saga completed successfully"
                );
            } else {
                metrics::counter!("saga_failed").increment(1);
                tracing::warn!(order_id = %result.order_id, duration, "saga failed");
            }
        }
        .instrument(span)
        .await;

        ctx
    }

    /// Executes `state` against `ctx` and returns the state to run next.
    ///
    /// An orchestration fault rolls back every completed step, newest
    /// first, and yields `Completed`.
    pub async fn step(&self, ctx: &mut SagaContext, state: SagaState) -> SagaState {
        if state.is_terminal() {
            ctx.set_state(state);
            return state;
        }

        let next = match self.transition(ctx, state).await {
            Ok(next) if state.can_transition_to(next) => next,
            Ok(next) => {
                let fault = OrchestrationFault::IllegalTransition {
                    from: state,
                    to: next,
                };
                self.cascade_rollback(ctx, fault).await
            }
            Err(fault) => self.cascade_rollback(ctx, fault).await,
        };

        ctx.set_state(next);
        next
    }

    async fn transition(
        &self,
        ctx: &mut SagaContext,
        state: SagaState,
    ) -> Result<SagaState, OrchestrationFault> {
        match state {
            SagaState::CreatingOrder => {
                if let Some(order_id) = ctx.order_id() {
                    return Err(OrchestrationFault::OrderAlreadyCreated { order_id });
                }

                let mut handler = CreateOrderHandler::new(ctx.request().clone());
                let next = handler.run(&self.orders).await;
                match handler.order_id() {
                    Some(order_id) if !next.is_terminal() => {
                        ctx.set_order_id(order_id);
                        ctx.push_completed(CompletedStep::CreateOrder(handler));
                    }
                    _ => ctx.mark_error(),
                }
                Ok(next)
            }

            SagaState::DecreasingStock => {
                if ctx.order_id().is_none() {
                    return Err(OrchestrationFault::MissingOrderId { state });
                }

                let handler = DecreaseStockHandler::new(ctx.request().items.clone());
                let next = handler.run(&self.stock).await;
                if next == SagaState::CreatingPayment {
                    ctx.push_completed(CompletedStep::DecreaseStock(handler));
                } else {
                    ctx.mark_error();
                }
                Ok(next)
            }

            SagaState::CreatingPayment => {
                let order_id = ctx
                    .order_id()
                    .ok_or(OrchestrationFault::MissingOrderId { state })?;
                if ctx.top_completed() != Some(StepKind::DecreaseStock) {
                    return Err(OrchestrationFault::PrerequisiteMissing {
                        state,
                        step: StepKind::DecreaseStock.as_str(),
                    });
                }

                let mut handler = CreatePaymentHandler::new(order_id, ctx.request().user_id);
                let next = handler.run(&self.orders, &self.payments).await;
                match handler.payment_id() {
                    Some(payment_id) if next.is_terminal() => {
                        ctx.set_payment_id(payment_id);
                        ctx.push_completed(CompletedStep::CreatePayment(handler));
                    }
                    _ => ctx.mark_error(),
                }
                Ok(next)
            }

            SagaState::IncreasingStock => {
                ctx.mark_error();
                self.compensate_own_step(
                    ctx,
                    state,
                    StepKind::DecreaseStock,
                    SagaState::CancellingOrder,
                )
                .await
            }

            SagaState::CancellingOrder => {
                ctx.mark_error();
                self.compensate_own_step(ctx, state, StepKind::CreateOrder, SagaState::Completed)
                    .await
            }

            SagaState::Completed => Ok(SagaState::Completed),
        }
    }

    /// Rolls back `kind` if it is the newest completed step.
    ///
    /// When `kind` never completed there is nothing to undo and the saga
    /// moves on to `fallthrough`. When it completed but is not on top,
    /// undoing it now would break reverse completion order.
    async fn compensate_own_step(
        &self,
        ctx: &mut SagaContext,
        state: SagaState,
        kind: StepKind,
        fallthrough: SagaState,
    ) -> Result<SagaState, OrchestrationFault> {
        match ctx.top_completed() {
            Some(top) if top == kind => {
                let Some(step) = ctx.pop_completed() else {
                    return Ok(fallthrough);
                };
                let (next, outcome) = step
                    .rollback(&self.orders, &self.stock, &self.payments)
                    .await;
                record_compensation(ctx, kind, outcome);
                Ok(next)
            }
            Some(top) if ctx.has_completed(kind) => Err(OrchestrationFault::StackOutOfOrder {
                state,
                top: top.as_str(),
            }),
            _ => Ok(fallthrough),
        }
    }

    async fn cascade_rollback(
        &self,
        ctx: &mut SagaContext,
        fault: OrchestrationFault,
    ) -> SagaState {
        ctx.mark_error();
        metrics::counter!("saga_orchestration_faults_total").increment(1);
        tracing::error!(
            saga_id = %ctx.saga_id(),
            error = %fault,
            steps = ctx.completed_steps().len(),
            "invalid saga state, rolling back completed steps"
        );

        let span = tracing::info_span!("saga_error_handling", fault = %fault);
        async {
            while let Some(step) = ctx.pop_completed() {
                let (_, outcome) = step
                    .rollback(&self.orders, &self.stock, &self.payments)
                    .await;
                record_compensation(ctx, step.kind(), outcome);
            }
        }
        .instrument(span)
        .await;

        SagaState::Completed
    }
}

fn record_compensation(ctx: &mut SagaContext, step: StepKind, outcome: CompensationOutcome) {
    metrics::counter!(
        "saga_compensations_total",
        "step" => step.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    if let CompensationOutcome::Degraded { attempted, errors } = &outcome {
        tracing::warn!(
            saga_id = %ctx.saga_id(),
            %step,
            attempted,
            failed = errors.len(),
            "compensation degraded"
        );
    }
    ctx.record_compensation(CompensationRecord { step, outcome });
}
