//! HTTP client for the order, stock, and payment services behind the API gateway.

use std::time::Duration;

use async_trait::async_trait;
use common::{OrderId, PaymentId, ProductId};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;
use crate::request::OrderRequest;
use crate::services::order::{OrderDetails, OrderService};
use crate::services::payment::{PaymentRequest, PaymentService};
use crate::services::stock::StockService;

const EMPTY_BODY: &str = "no response content";

/// Gateway-backed implementation of every downstream capability.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OrderIdBody {
    #[serde(default)]
    order_id: OrderId,
}

#[derive(Debug, Deserialize)]
struct PaymentIdBody {
    #[serde(default)]
    payment_id: PaymentId,
}

#[derive(Debug, serde::Serialize)]
struct StockAdjustment {
    product_id: ProductId,
    quantity: i64,
}

impl GatewayClient {
    /// Creates a client with reqwest's default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(rejection(status.as_u16(), response.text().await))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ServiceError::transport(format!("invalid response body: {e}")))
    }
}

/// Classifies a non-2xx reply. An unreadable body still counts as a rejection.
fn rejection<E: std::fmt::Display>(status: u16, body: Result<String, E>) -> ServiceError {
    let body = match body {
        Ok(body) if !body.is_empty() => body,
        Ok(_) => EMPTY_BODY.to_string(),
        Err(e) => {
            tracing::warn!(status, error = %e, "failed to read rejection body");
            EMPTY_BODY.to_string()
        }
    };
    ServiceError::rejected(status, body)
}

#[async_trait]
impl OrderService for GatewayClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderId, ServiceError> {
        let body: OrderIdBody = self
            .send_json(self.http.post(self.url("/store-api/orders")).json(request))
            .await?;
        Ok(body.order_id)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, ServiceError> {
        self.send_json(
            self.http
                .get(self.url(&format!("/store-api/orders/{order_id}"))),
        )
        .await
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<OrderId, ServiceError> {
        let body: OrderIdBody = self
            .send_json(
                self.http
                    .delete(self.url(&format!("/store-api/orders/{order_id}"))),
            )
            .await?;
        Ok(body.order_id)
    }
}

#[async_trait]
impl StockService for GatewayClient {
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<(), ServiceError> {
        let adjustment = StockAdjustment {
            product_id,
            quantity: delta,
        };
        self.send(self.http.post(self.url("/store-api/stocks")).json(&adjustment))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PaymentService for GatewayClient {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentId, ServiceError> {
        let body: PaymentIdBody = self
            .send_json(self.http.post(self.url("/payments-api/payments")).json(request))
            .await?;
        Ok(body.payment_id)
    }

    async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), ServiceError> {
        self.send(
            self.http
                .delete(self.url(&format!("/payments-api/payments/{payment_id}"))),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OrderItem;
    use common::UserId;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_order_posts_request_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/store-api/orders").json_body(json!({
                    "user_id": 1,
                    "items": [{ "product_id": 7, "quantity": 2 }]
                }));
                then.status(201).json_body(json!({ "order_id": 42 }));
            })
            .await;

        let client = GatewayClient::new(server.base_url());
        let request = OrderRequest::new(Some(UserId::new(1)), vec![OrderItem::new(7, 2)]);

        let order_id = client.create_order(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(order_id, OrderId::new(42));
    }

    #[tokio::test]
    async fn test_rejection_keeps_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/store-api/orders");
                then.status(400).body(r#"{"error":"no items"}"#);
            })
            .await;

        let client = GatewayClient::new(server.base_url());
        let err = client
            .create_order(&OrderRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::rejected(400, r#"{"error":"no items"}"#));
    }

    #[test]
    fn test_unreadable_rejection_body_keeps_status() {
        let err = rejection(503, Err::<String, _>("connection closed before message completed"));

        assert_eq!(err, ServiceError::rejected(503, EMPTY_BODY));
        assert!(!err.is_transport());
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_empty_rejection_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/payments-api/payments/3");
                then.status(500);
            })
            .await;

        let client = GatewayClient::new(server.base_url());
        let err = client.delete_payment(PaymentId::new(3)).await.unwrap_err();

        assert_eq!(err, ServiceError::rejected(500, EMPTY_BODY));
    }

    #[tokio::test]
    async fn test_get_order_reads_total_amount() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/store-api/orders/42");
                then.status(200).json_body(json!({
                    "order_id": 42,
                    "user_id": 1,
                    "total_amount": 99.5,
                    "is_paid": false
                }));
            })
            .await;

        let client = GatewayClient::new(format!("{}/", server.base_url()));
        let details = client.get_order(OrderId::new(42)).await.unwrap();

        assert_eq!(details.total_amount, 99.5);
        assert_eq!(details.user_id, Some(UserId::new(1)));
    }

    #[tokio::test]
    async fn test_adjust_stock_sends_signed_quantity() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/store-api/stocks")
                    .json_body(json!({ "product_id": 7, "quantity": -2 }));
                then.status(200).json_body(json!({ "result": "ok" }));
            })
            .await;

        let client = GatewayClient::new(server.base_url());
        client.adjust_stock(ProductId::new(7), -2).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_payment_returns_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/payments-api/payments")
                    .json_body(json!({ "order_id": 42, "user_id": null, "total_amount": 10.0 }));
                then.status(200).json_body(json!({ "payment_id": 5 }));
            })
            .await;

        let client = GatewayClient::new(server.base_url());
        let payment_id = client
            .create_payment(&PaymentRequest {
                order_id: OrderId::new(42),
                user_id: None,
                total_amount: 10.0,
            })
            .await
            .unwrap();

        assert_eq!(payment_id, PaymentId::new(5));
    }

    #[tokio::test]
    async fn test_undecodable_success_is_transport_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/store-api/orders/42");
                then.status(200).body("not json");
            })
            .await;

        let client = GatewayClient::new(server.base_url());
        let err = client.delete_order(OrderId::new(42)).await.unwrap_err();

        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_failure() {
        let client = GatewayClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2))
            .unwrap();
        let err = client
            .adjust_stock(ProductId::new(1), 1)
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }
}
