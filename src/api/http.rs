//! REST implementation of [`StorefrontApi`] over `reqwest`.

use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::dto::{CartResponse, ErrorBody, PaymentMethodRequest, SessionItem, SessionRequest, UpsertItemRequest};
use super::{ApiError, ApiResult, StorefrontApi, Versioned};
use crate::domain::aggregates::{Cart, CheckoutSession, Order, OrderDraft, Product};
use crate::domain::value_objects::{OrderId, PaymentMethod, ProductId, ShippingDetails};

/// Header carrying the cart request sequence number, both ways.
pub const REQUEST_SEQ_HEADER: &str = "x-request-seq";
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

#[derive(Clone, Debug)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), token: None })
    }

    /// Bearer token sent with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(req: RequestBuilder) -> ApiResult<Response> {
        let response = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() { return Ok(response); }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        warn!(status = status.as_u16(), %message, "storefront API error");
        Err(ApiError::Remote { status: status.as_u16(), message })
    }

    async fn json<T: DeserializeOwned>(req: RequestBuilder) -> ApiResult<T> {
        Self::send(req).await?.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn cart(&self, req: RequestBuilder, seq: u64) -> ApiResult<Versioned<Cart>> {
        let response = Self::send(req.header(REQUEST_SEQ_HEADER, seq.to_string())).await?;
        if let Some(echoed) = echoed_seq(response.headers()).filter(|e| *e != seq) {
            warn!(seq, echoed, "cart reply echoed another request seq");
        }
        let body: CartResponse = response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        debug!(seq, items = body.cart_items.len(), server_total = ?body.total_price, "cart synced");
        Ok(Versioned { seq, value: body.into() })
    }
}

fn echoed_seq(headers: &HeaderMap) -> Option<u64> {
    headers.get(REQUEST_SEQ_HEADER)?.to_str().ok()?.trim().parse().ok()
}

#[async_trait]
impl StorefrontApi for HttpApi {
    #[instrument(skip(self))]
    async fn fetch_cart(&self, seq: u64) -> ApiResult<Versioned<Cart>> {
        self.cart(self.request(Method::GET, "/api/cart"), seq).await
    }

    #[instrument(skip(self), fields(product = %product_id))]
    async fn upsert_cart_item(&self, product_id: &ProductId, quantity: u32, seq: u64) -> ApiResult<Versioned<Cart>> {
        let body = UpsertItemRequest { product_id, qty: quantity };
        self.cart(self.request(Method::POST, "/api/cart").json(&body), seq).await
    }

    #[instrument(skip(self), fields(product = %product_id))]
    async fn remove_cart_item(&self, product_id: &ProductId, seq: u64) -> ApiResult<Versioned<Cart>> {
        self.cart(self.request(Method::DELETE, &format!("/api/cart/{product_id}")), seq).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, seq: u64) -> ApiResult<Versioned<Cart>> {
        self.cart(self.request(Method::DELETE, "/api/cart"), seq).await
    }

    #[instrument(skip(self, details))]
    async fn save_shipping(&self, details: &ShippingDetails, seq: u64) -> ApiResult<Versioned<Cart>> {
        self.cart(self.request(Method::POST, "/api/cart/shipping").json(details), seq).await
    }

    #[instrument(skip(self), fields(method = %method))]
    async fn save_payment_method(&self, method: &PaymentMethod, seq: u64) -> ApiResult<Versioned<Cart>> {
        let body = PaymentMethodRequest { payment_method: method };
        self.cart(self.request(Method::POST, "/api/cart/payment").json(&body), seq).await
    }

    #[instrument(skip(self, draft), fields(total = %draft.total_price))]
    async fn create_order(&self, draft: &OrderDraft, idempotency_key: Uuid) -> ApiResult<Order> {
        let req = self.request(Method::POST, "/api/orders").header(IDEMPOTENCY_HEADER, idempotency_key.to_string()).json(draft);
        Self::json(req).await
    }

    #[instrument(skip(self))]
    async fn my_orders(&self) -> ApiResult<Vec<Order>> {
        Self::json(self.request(Method::GET, "/api/orders/myorders")).await
    }

    #[instrument(skip(self), fields(order = %id))]
    async fn order(&self, id: &OrderId) -> ApiResult<Order> {
        Self::json(self.request(Method::GET, &format!("/api/orders/{id}"))).await
    }

    #[instrument(skip(self))]
    async fn all_orders(&self) -> ApiResult<Vec<Order>> {
        Self::json(self.request(Method::GET, "/api/orders")).await
    }

    #[instrument(skip(self), fields(product = %id))]
    async fn product(&self, id: &ProductId) -> ApiResult<Product> {
        Self::json(self.request(Method::GET, &format!("/api/products/{id}"))).await
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    async fn create_checkout_session(&self, items: &[SessionItem]) -> ApiResult<CheckoutSession> {
        Self::json(self.request(Method::POST, "/api/payments/create-checkout-session").json(&SessionRequest { items })).await
    }
}
