//! Signed REST transport: list markets for a series/date (feeds
//! `brain::MarketLister`) and place limit orders (feeds
//! `sniper::OrderExecutor`). Grounded on the teacher's
//! `core/exchange/polymarket/client.rs` plain-`reqwest::Client` wrapper
//! shape, with signing headers layered on per `super::signing`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::brain::MarketLister;
use crate::error::{Error, Result};
use crate::model::ExecuteTrade;
use crate::sniper::{OrderExecutor, OrderOutcome};

use super::signing::RequestSigner;

pub struct KalshiRestClient {
    http: HttpClient,
    base_url: String,
    api_key_id: String,
    signer: Box<dyn RequestSigner>,
}

impl KalshiRestClient {
    pub fn new(base_url: String, api_key_id: String, signer: Box<dyn RequestSigner>) -> Self {
        Self { http: HttpClient::new(), base_url, api_key_id, signer }
    }

    fn signed_headers(&self, method: &str, path: &str) -> Result<reqwest::header::HeaderMap> {
        let timestamp_ms = Utc::now().timestamp_millis();
        let signature = self.signer.sign(timestamp_ms, method, path)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("KALSHI-ACCESS-KEY", self.api_key_id.parse().unwrap());
        headers.insert("KALSHI-ACCESS-TIMESTAMP", timestamp_ms.to_string().parse().unwrap());
        headers.insert("KALSHI-ACCESS-SIGNATURE", signature.parse().unwrap());
        Ok(headers)
    }
}

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    #[serde(default)]
    markets: Vec<WireMarket>,
}

#[derive(Debug, Deserialize)]
struct WireMarket {
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(default)]
    balance: Option<i64>,
}

impl KalshiRestClient {
    /// Authenticated no-op used to warm the REST connection and verify the
    /// signing key is accepted before any agent starts trading against it.
    pub async fn account_lookup(&self) -> Result<()> {
        let path = "/trade-api/v2/portfolio/balance";
        let url = format!("{}{}", self.base_url, path);
        let headers = self.signed_headers("GET", path)?;

        let response = self.http.get(&url).headers(headers).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("account lookup rejected: {status} {text}")));
        }
        let _: BalanceResponse = response.json().await?;
        Ok(())
    }
}

#[async_trait]
impl MarketLister for KalshiRestClient {
    async fn list_tickers(&self, series_prefix: &str, datecode_hint: &str) -> Result<Vec<String>> {
        let path = "/trade-api/v2/markets";
        let url = format!(
            "{}{}?series_ticker={}&status=open",
            self.base_url, path, series_prefix
        );
        let headers = self.signed_headers("GET", path)?;

        debug!(%series_prefix, %datecode_hint, "exchange: listing markets");
        let response: MarketsResponse = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .await?
            .json()
            .await?;

        Ok(response
            .markets
            .into_iter()
            .filter(|m| m.ticker.contains(datecode_hint))
            .map(|m| m.ticker)
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    ticker: &'a str,
    action: &'static str,
    side: &'static str,
    count: u32,
    #[serde(rename = "type")]
    order_type: &'static str,
    yes_price: u8,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    order: WireOrder,
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    status: String,
    #[serde(default)]
    filled_count: Option<u32>,
    #[serde(default)]
    yes_price: Option<u8>,
}

#[async_trait]
impl OrderExecutor for KalshiRestClient {
    async fn submit(&self, trade: &ExecuteTrade) -> Result<OrderOutcome> {
        let path = "/trade-api/v2/portfolio/orders";
        let url = format!("{}{}", self.base_url, path);
        let headers = self.signed_headers("POST", path)?;

        let body = CreateOrderRequest {
            ticker: trade.ticker.as_str(),
            action: "buy",
            side: "yes",
            count: trade.quantity,
            order_type: "limit",
            yes_price: trade.limit_price_cents,
        };

        let response = self.http.post(&url).headers(headers).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, body = %text, "exchange: order request rejected by transport");
            return Err(Error::Execution(format!("order rejected: {status} {text}")));
        }

        let parsed: CreateOrderResponse = response.json().await?;
        let filled = parsed.order.filled_count.unwrap_or(0);
        let avg_price = parsed.order.yes_price.unwrap_or(trade.limit_price_cents);

        match parsed.order.status.as_str() {
            "executed" if filled >= trade.quantity => {
                Ok(OrderOutcome::Filled { qty: filled, avg_price_cents: avg_price })
            }
            "executed" | "resting" if filled > 0 => {
                Ok(OrderOutcome::PartialFill { qty: filled, avg_price_cents: avg_price })
            }
            other => Ok(OrderOutcome::Rejected { reason: format!("order status: {other}") }),
        }
    }
}
