//! Charge the order total; compensate by deleting the payment.

use common::{OrderId, PaymentId, UserId};
use tracing::Instrument;
use tracing::field::Empty;

use super::record_failure;
use crate::compensation::CompensationOutcome;
use crate::services::{OrderService, PaymentRequest, PaymentService};
use crate::state::SagaState;

#[derive(Debug, Clone)]
pub struct CreatePaymentHandler {
    order_id: OrderId,
    user_id: Option<UserId>,
    total_amount: Option<f64>,
    payment_id: Option<PaymentId>,
}

impl CreatePaymentHandler {
    pub fn new(order_id: OrderId, user_id: Option<UserId>) -> Self {
        Self {
            order_id,
            user_id,
            total_amount: None,
            payment_id: None,
        }
    }

    /// The order total fetched before charging.
    pub fn total_amount(&self) -> Option<f64> {
        self.total_amount
    }

    /// Identifier of the created payment.
    pub fn payment_id(&self) -> Option<PaymentId> {
        self.payment_id
    }

    /// Fetches the order total, then creates the payment.
    ///
    /// Either failure enters the compensation chain at `IncreasingStock`.
    pub async fn run<O, P>(&mut self, orders: &O, payments: &P) -> SagaState
    where
        O: OrderService + ?Sized,
        P: PaymentService + ?Sized,
    {
        let span = tracing::info_span!(
            "create_payment_handler_run",
            order_id = self.order_id.as_u64(),
            user_id = ?self.user_id,
            total_amount = Empty,
            payment_id = Empty,
            failure_step = Empty,
            success = Empty,
            error_code = Empty,
            error_message = Empty,
        );

        async {
            let span = tracing::Span::current();

            let details = match orders
                .get_order(self.order_id)
                .instrument(tracing::info_span!("get_order_details"))
                .await
            {
                Ok(details) => details,
                Err(e) => {
                    record_failure(&span, &e);
                    span.record("failure_step", "get_order_details");
                    tracing::error!(order_id = %self.order_id, error = %e, "order lookup failed");
                    return SagaState::IncreasingStock;
                }
            };
            self.total_amount = Some(details.total_amount);
            span.record("total_amount", details.total_amount);

            let request = PaymentRequest {
                order_id: self.order_id,
                user_id: self.user_id,
                total_amount: details.total_amount,
            };
            match payments
                .create_payment(&request)
                .instrument(tracing::info_span!("create_payment_transaction"))
                .await
            {
                Ok(payment_id) => {
                    self.payment_id = Some(payment_id);
                    span.record("payment_id", payment_id.as_u64());
                    span.record("success", true);
                    tracing::debug!(%payment_id, "payment created");
                    SagaState::Completed
                }
                Err(e) => {
                    record_failure(&span, &e);
                    span.record("failure_step", "create_payment_transaction");
                    tracing::error!(
                        order_id = %self.order_id,
                        error = %e,
                        "payment creation failed"
                    );
                    SagaState::IncreasingStock
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Deletes the payment, if one was created.
    pub async fn rollback<P: PaymentService + ?Sized>(
        &self,
        payments: &P,
    ) -> (SagaState, CompensationOutcome) {
        let span = tracing::info_span!(
            "create_payment_handler_rollback",
            payment_id = ?self.payment_id,
            skipped = Empty,
            success = Empty,
            error_code = Empty,
            error_message = Empty,
        );

        async {
            let span = tracing::Span::current();
            let Some(payment_id) = self.payment_id.filter(|id| id.as_u64() > 0) else {
                span.record("skipped", true);
                tracing::debug!("no payment to delete");
                return (SagaState::IncreasingStock, CompensationOutcome::Skipped);
            };

            let outcome = match payments.delete_payment(payment_id).await {
                Ok(()) => {
                    span.record("success", true);
                    tracing::debug!(%payment_id, "payment deleted");
                    CompensationOutcome::Applied { attempted: 1 }
                }
                Err(e) => {
                    record_failure(&span, &e);
                    tracing::error!(%payment_id, error = %e, "payment deletion failed");
                    CompensationOutcome::from_errors(1, vec![e])
                }
            };
            (SagaState::IncreasingStock, outcome)
        }
        .instrument(span)
        .await
    }
}
