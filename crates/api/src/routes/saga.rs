//! Saga trigger endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use saga::{
    OrderRequest, OrderSagaController, OrderService, PaymentService, SagaResult, StockService,
};

/// Shared application state accessible from all handlers.
pub struct AppState<O, S, P>
where
    O: OrderService,
    S: StockService,
    P: PaymentService,
{
    pub controller: OrderSagaController<O, S, P>,
}

impl<O, S, P> AppState<O, S, P>
where
    O: OrderService,
    S: StockService,
    P: PaymentService,
{
    pub fn new(orders: O, stock: S, payments: P) -> Self {
        Self {
            controller: OrderSagaController::new(orders, stock, payments),
        }
    }
}

/// POST /saga/order — run one order saga to completion.
///
/// Responds 200 when the payment was created and nothing was rolled back,
/// 500 otherwise. The body is `{order_id, status}` in both cases.
#[tracing::instrument(skip(state, req), fields(items = req.items.len()))]
pub async fn place_order<O, S, P>(
    State(state): State<Arc<AppState<O, S, P>>>,
    Json(req): Json<OrderRequest>,
) -> (StatusCode, Json<SagaResult>)
where
    O: OrderService + 'static,
    S: StockService + 'static,
    P: PaymentService + 'static,
{
    let result = state.controller.run(req).await;
    let status = if result.status.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    metrics::counter!("saga_order_requests_total", "status" => status.as_u16().to_string())
        .increment(1);
    tracing::info!(
        order_id = %result.order_id,
        status = result.status.as_str(),
        "order saga finished"
    );

    (status, Json(result))
}
