//! Check line items out of stock; compensate by checking them back in.

use tracing::Instrument;
use tracing::field::Empty;

use super::record_failure;
use crate::compensation::CompensationOutcome;
use crate::request::OrderItem;
use crate::services::StockService;
use crate::state::SagaState;

#[derive(Debug, Clone)]
pub struct DecreaseStockHandler {
    items: Vec<OrderItem>,
}

impl DecreaseStockHandler {
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self { items }
    }

    /// Decrements stock item by item, in order, stopping at the first failure.
    ///
    /// Items decremented before the failing one stay decremented: this
    /// handler only reaches the completed steps when every item succeeded.
    pub async fn run<S: StockService + ?Sized>(&self, stock: &S) -> SagaState {
        let span = tracing::info_span!(
            "decrease_stock_handler_run",
            items_count = self.items.len(),
            success = Empty,
            error_code = Empty,
            error_message = Empty,
        );

        async {
            let span = tracing::Span::current();
            for (index, item) in self.items.iter().enumerate() {
                let item_span = tracing::info_span!(
                    "decrease_stock_item",
                    index,
                    product_id = item.product_id.as_u64(),
                    quantity = item.quantity,
                    success = Empty,
                    error_code = Empty,
                    error_message = Empty,
                );
                let result = stock
                    .adjust_stock(item.product_id, item.checkout_delta())
                    .instrument(item_span.clone())
                    .await;

                match result {
                    Ok(()) => {
                        item_span.record("success", true);
                    }
                    Err(e) => {
                        record_failure(&item_span, &e);
                        record_failure(&span, &e);
                        tracing::error!(
                            product_id = %item.product_id,
                            error = %e,
                            "stock decrease failed"
                        );
                        return SagaState::CancellingOrder;
                    }
                }
            }

            span.record("success", true);
            tracing::debug!("stock decreased for every item");
            SagaState::CreatingPayment
        }
        .instrument(span)
        .await
    }

    /// Puts every item back in stock.
    ///
    /// A failing item does not stop the remaining ones.
    pub async fn rollback<S: StockService + ?Sized>(
        &self,
        stock: &S,
    ) -> (SagaState, CompensationOutcome) {
        let span = tracing::info_span!(
            "decrease_stock_handler_rollback",
            items_count = self.items.len(),
            success_count = Empty,
        );

        async {
            let mut errors = Vec::new();
            for (index, item) in self.items.iter().enumerate() {
                let item_span = tracing::info_span!(
                    "increase_stock_item",
                    index,
                    product_id = item.product_id.as_u64(),
                    quantity = item.quantity,
                    success = Empty,
                    error_code = Empty,
                    error_message = Empty,
                );
                let result = stock
                    .adjust_stock(item.product_id, item.restock_delta())
                    .instrument(item_span.clone())
                    .await;

                match result {
                    Ok(()) => {
                        item_span.record("success", true);
                    }
                    Err(e) => {
                        record_failure(&item_span, &e);
                        tracing::error!(
                            product_id = %item.product_id,
                            error = %e,
                            "stock increase failed"
                        );
                        errors.push(e);
                    }
                }
            }

            let success_count = self.items.len() - errors.len();
            tracing::Span::current().record("success_count", success_count);
            tracing::debug!(success_count, total_items = self.items.len(), "stock restored");

            (
                SagaState::CancellingOrder,
                CompensationOutcome::from_errors(self.items.len(), errors),
            )
        }
        .instrument(span)
        .await
    }
}
