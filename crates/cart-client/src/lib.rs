//! cart-client: HTTP adapter that creates orders on the hosted backend's
//! REST interface.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cart_types::domain::order::{PlaceOrderRequest, PlacedOrder};
use cart_types::ports::order_gateway::{GatewayError, OrderGateway};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;

#[derive(Clone)]
pub struct OrdersClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct OrdersClient {
    base: Url,
    client: reqwest::Client,
}

impl OrdersClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<OrdersClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        // `join` replaces the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(OrdersClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    // Inserts a row into `orders` and returns the stored representation.
    async fn post_order(&self, req: &PlaceOrderRequest) -> Result<PlacedOrder, GatewayError> {
        let url = self
            .url("orders")
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let res = self
            .client
            .post(url)
            .header("prefer", "return=representation")
            .json(req)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        decode_placed(&body)
    }
}

// The REST layer answers an insert with either the row or a one-element array.
fn decode_placed(body: &str) -> Result<PlacedOrder, GatewayError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    let row = match value {
        serde_json::Value::Array(rows) => rows
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Decode("empty representation".into()))?,
        other => other,
    };
    serde_json::from_value(row).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl OrderGateway for OrdersClient {
    async fn create_order(&self, request: &PlaceOrderRequest) -> Result<PlacedOrder, GatewayError> {
        let placed = self.post_order(request).await?;
        tracing::debug!(order_id = %placed.id, "backend accepted order");
        Ok(placed)
    }
}

impl OrdersClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sends the project key both as `apikey` and as a bearer token.
    pub fn with_api_key(self, key: impl AsRef<str>) -> anyhow::Result<Self> {
        let key = key.as_ref();
        self.with_header("apikey", key)?
            .with_header("authorization", format!("Bearer {key}"))
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<OrdersClient> {
        if let Some(client) = self.client {
            return Ok(OrdersClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(OrdersClient {
            base: self.base,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_types::domain::money::Money;
    use cart_types::domain::order::{OrderLine, OrderQuote, OrderStatus, RestaurantRef};
    use httpmock::prelude::*;

    fn sample_request() -> PlaceOrderRequest {
        PlaceOrderRequest::new(
            "user-1".into(),
            &RestaurantRef {
                id: "R1".into(),
                name: "Papa Johns".into(),
            },
            vec![OrderLine {
                dish_id: "D1".into(),
                name: "Pizza".into(),
                quantity: 2,
                unit_price: Money::from_cents(850),
                line_total: Money::from_cents(1700),
            }],
            OrderQuote::new(Money::from_cents(1700), Money::from_cents(200)),
            "2024-05-01T12:30:00Z".parse().unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_order_and_reads_representation() {
        let server = MockServer::start();
        let req = sample_request();

        let create_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/orders")
                .header("prefer", "return=representation")
                .header("apikey", "anon-key")
                .header("authorization", "Bearer anon-key")
                .json_body_obj(&req);
            then.status(201).json_body(serde_json::json!([{
                "id": 101,
                "status": "Placed",
                "estimated_delivery_time": "2024-05-01T12:30:00Z"
            }]));
        });

        let client = OrdersClient::builder(&server.url("/rest/v1"))
            .unwrap()
            .with_api_key("anon-key")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let placed = OrderGateway::create_order(&client, &req).await.unwrap();
        assert_eq!(placed.id, "101");
        assert_eq!(placed.status, OrderStatus::Placed);
        assert_eq!(placed.estimated_delivery_time, req.estimated_delivery_time);

        create_mock.assert();
    }

    #[tokio::test]
    async fn single_object_body_is_accepted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/orders");
            then.status(201).json_body(serde_json::json!({
                "id": "a1b2",
                "status": "Placed",
                "estimated_delivery_time": "2024-05-01T12:30:00Z"
            }));
        });

        let client = OrdersClient::new(&server.base_url()).unwrap();
        let placed = client.create_order(&sample_request()).await.unwrap();
        assert_eq!(placed.id, "a1b2");
        mock.assert();
    }

    #[tokio::test]
    async fn rejection_and_garbage_map_to_gateway_errors() {
        let server = MockServer::start();
        let reject = server.mock(|when, then| {
            when.method(POST).path("/bad/orders");
            then.status(401).body("{\"message\":\"JWT expired\"}");
        });
        let garbage = server.mock(|when, then| {
            when.method(POST).path("/empty/orders");
            then.status(201).json_body(serde_json::json!([]));
        });

        let client = OrdersClient::new(&server.url("/bad")).unwrap();
        let err = OrderGateway::create_order(&client, &sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 401, .. }));

        let client = OrdersClient::new(&server.url("/empty/")).unwrap();
        let err = OrderGateway::create_order(&client, &sample_request())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));

        reject.assert();
        garbage.assert();
    }

    #[test]
    fn builder_rejects_bad_input() {
        assert!(OrdersClient::new("not a url").is_err());
        assert!(OrdersClient::builder("http://localhost")
            .unwrap()
            .with_header("bad header", "x")
            .is_err());
    }
}
