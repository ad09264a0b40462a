//! Create the order; compensate by deleting it.

use common::OrderId;
use tracing::Instrument;
use tracing::field::Empty;

use super::record_failure;
use crate::compensation::CompensationOutcome;
use crate::request::OrderRequest;
use crate::services::OrderService;
use crate::state::SagaState;

/// Creates the order at the order service.
#[derive(Debug, Clone)]
pub struct CreateOrderHandler {
    request: OrderRequest,
    order_id: Option<OrderId>,
}

impl CreateOrderHandler {
    pub fn new(request: OrderRequest) -> Self {
        Self {
            request,
            order_id: None,
        }
    }

    /// The identifier assigned by the order service, once creation succeeded.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    /// Creates the order.
    ///
    /// Any failure ends the saga: no order exists yet, so there is nothing
    /// to compensate.
    pub async fn run<O: OrderService + ?Sized>(&mut self, orders: &O) -> SagaState {
        let span = tracing::info_span!(
            "create_order_handler_run",
            user_id = ?self.request.user_id,
            items_count = self.request.items.len(),
            order_id = Empty,
            success = Empty,
            error_code = Empty,
            error_message = Empty,
        );

        async {
            let span = tracing::Span::current();
            match orders.create_order(&self.request).await {
                Ok(order_id) => {
                    self.order_id = Some(order_id);
                    span.record("order_id", order_id.as_u64());
                    span.record("success", true);
                    tracing::debug!(%order_id, "order created");
                    SagaState::DecreasingStock
                }
                Err(e) => {
                    record_failure(&span, &e);
                    tracing::error!(error = %e, "order creation failed");
                    SagaState::Completed
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Deletes the order.
    ///
    /// Without a recorded order this issues a delete for `OrderId::NONE`.
    pub async fn rollback<O: OrderService + ?Sized>(
        &self,
        orders: &O,
    ) -> (SagaState, CompensationOutcome) {
        let order_id = self.order_id.unwrap_or(OrderId::NONE);
        let span = tracing::info_span!(
            "create_order_handler_rollback",
            order_id = order_id.as_u64(),
            success = Empty,
            error_code = Empty,
            error_message = Empty,
        );

        async {
            let span = tracing::Span::current();
            if order_id.is_none() {
                tracing::warn!("no order id recorded, deleting order 0");
            }
            let outcome = match orders.delete_order(order_id).await {
                Ok(_) => {
                    span.record("success", true);
                    tracing::debug!(%order_id, "order deleted");
                    CompensationOutcome::Applied { attempted: 1 }
                }
                Err(e) => {
                    record_failure(&span, &e);
                    tracing::error!(%order_id, error = %e, "order deletion failed");
                    CompensationOutcome::from_errors(1, vec![e])
                }
            };
            (SagaState::Completed, outcome)
        }
        .instrument(span)
        .await
    }
}
