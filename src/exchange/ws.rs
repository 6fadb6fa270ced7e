//! Signed WebSocket orderbook stream. Grounded on the teacher's
//! `core/exchange/polymarket/websocket.rs` `DataStream`: same
//! connect/subscribe/next_event shape and ping/pong/close handling, wire
//! messages replaced with Kalshi's `orderbook_snapshot`/`orderbook_delta`
//! channel per spec.md §3's `MarketUpdate` semantics.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{MarketTicker, MarketUpdate, PriceLevel, Side};
use crate::watcher::{MarketEvent, OrderBookStream};

use super::signing::RequestSigner;

const WS_PATH: &str = "/trade-api/ws/v2";

#[derive(Debug, Serialize)]
struct SubscribeMessage<'a> {
    id: u64,
    cmd: &'static str,
    params: SubscribeParams<'a>,
}

#[derive(Debug, Serialize)]
struct SubscribeParams<'a> {
    channels: [&'static str; 1],
    market_tickers: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WireMessage {
    #[serde(rename = "orderbook_snapshot")]
    Snapshot(WireBook),
    #[serde(rename = "orderbook_delta")]
    Delta(WireBook),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct WireBook {
    market_ticker: String,
    seq: u64,
    #[serde(default)]
    yes: Vec<[u32; 2]>,
    #[serde(default)]
    no: Vec<[u32; 2]>,
}

fn to_levels(raw: &[[u32; 2]]) -> Vec<PriceLevel> {
    raw.iter()
        .filter_map(|[price, size]| {
            if *price == 0 || *price > 99 {
                return None;
            }
            Some(PriceLevel { price_cents: *price as u8, size: *size })
        })
        .collect()
}

pub struct KalshiOrderBookStream {
    url: String,
    api_key_id: String,
    signer: Box<dyn RequestSigner>,
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    next_id: u64,
    /// One wire message yields two `MarketEvent`s (yes, then no); the second
    /// is parked here and drained before the socket is polled again.
    pending: VecDeque<MarketEvent>,
}

impl KalshiOrderBookStream {
    pub fn new(ws_url: String, api_key_id: String, signer: Box<dyn RequestSigner>) -> Self {
        Self { url: ws_url, api_key_id, signer, ws: None, next_id: 1, pending: VecDeque::new() }
    }
}

#[async_trait]
impl OrderBookStream for KalshiOrderBookStream {
    async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "exchange: connecting orderbook stream");

        let timestamp_ms = Utc::now().timestamp_millis();
        let signature = self.signer.sign(timestamp_ms, "GET", WS_PATH)?;

        let mut request = self
            .url
            .clone()
            .into_client_request()
            .map_err(|e| Error::Transport(format!("invalid websocket url: {e}")))?;
        let headers = request.headers_mut();
        headers.insert("KALSHI-ACCESS-KEY", self.api_key_id.parse().unwrap());
        headers.insert("KALSHI-ACCESS-TIMESTAMP", timestamp_ms.to_string().parse().unwrap());
        headers.insert("KALSHI-ACCESS-SIGNATURE", signature.parse().unwrap());

        let (ws_stream, response) = connect_async(request).await?;
        info!(status = %response.status(), "exchange: orderbook stream connected");
        self.ws = Some(ws_stream);
        Ok(())
    }

    async fn subscribe(&mut self, tickers: &[MarketTicker]) -> Result<()> {
        let ws = self
            .ws
            .as_mut()
            .ok_or_else(|| Error::Transport("subscribe called before connect".to_string()))?;

        let market_tickers: Vec<String> = tickers.iter().map(|t| t.as_str().to_string()).collect();
        let msg = SubscribeMessage {
            id: self.next_id,
            cmd: "subscribe",
            params: SubscribeParams { channels: ["orderbook_delta"], market_tickers: &market_tickers },
        };
        self.next_id += 1;

        let json = serde_json::to_string(&msg)?;
        debug!(tickers = ?market_tickers, "exchange: subscribing");
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        loop {
            let ws = self.ws.as_mut()?;
            match ws.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<WireMessage>(&text) {
                    Ok(WireMessage::Snapshot(book)) => {
                        let (yes, no) = to_market_events(book, true);
                        self.pending.push_back(no);
                        return Some(yes);
                    }
                    Ok(WireMessage::Delta(book)) => {
                        let (yes, no) = to_market_events(book, false);
                        self.pending.push_back(no);
                        return Some(yes);
                    }
                    Ok(WireMessage::Unknown) => continue,
                    Err(e) => {
                        warn!(error = %e, raw = %text, "exchange: failed to parse orderbook message");
                        continue;
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                    continue;
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "exchange: orderbook stream closed by server");
                    self.ws = None;
                    return Some(MarketEvent::Disconnected { reason: "server_close".to_string() });
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "exchange: orderbook stream error");
                    self.ws = None;
                    return Some(MarketEvent::Disconnected { reason: e.to_string() });
                }
                None => {
                    self.ws = None;
                    return Some(MarketEvent::Disconnected { reason: "stream_ended".to_string() });
                }
            }
        }
    }

    fn exchange_name(&self) -> &'static str {
        "kalshi"
    }
}

/// Kalshi sends yes/no levels in one message; split into the two
/// `MarketUpdate`s Watcher's cache expects (one per `Side`), yes first.
fn to_market_events(book: WireBook, is_snapshot: bool) -> (MarketEvent, MarketEvent) {
    let ticker: MarketTicker = book.market_ticker.clone().into();
    let yes = MarketUpdate {
        ticker: ticker.clone(),
        sequence: book.seq,
        is_snapshot,
        side: Side::Yes,
        levels: to_levels(&book.yes),
    };
    let no = MarketUpdate {
        ticker,
        sequence: book.seq,
        is_snapshot,
        side: Side::No,
        levels: to_levels(&book.no),
    };
    if is_snapshot {
        (MarketEvent::Snapshot(yes), MarketEvent::Snapshot(no))
    } else {
        (MarketEvent::Delta(yes), MarketEvent::Delta(no))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> WireBook {
        WireBook {
            market_ticker: "NFLTOT-26JAN03DENKC-T175".to_string(),
            seq: 9,
            yes: vec![[45, 10]],
            no: vec![[55, 20]],
        }
    }

    #[test]
    fn splits_one_wire_message_into_a_yes_and_a_no_update() {
        let (yes_event, no_event) = to_market_events(book(), true);

        let MarketEvent::Snapshot(yes) = yes_event else { panic!("expected snapshot") };
        assert_eq!(yes.side, Side::Yes);
        assert_eq!(yes.levels, vec![PriceLevel { price_cents: 45, size: 10 }]);

        let MarketEvent::Snapshot(no) = no_event else { panic!("expected snapshot") };
        assert_eq!(no.side, Side::No);
        assert_eq!(no.levels, vec![PriceLevel { price_cents: 55, size: 20 }]);
        assert_eq!(no.ticker, yes.ticker);
        assert_eq!(no.sequence, yes.sequence);
    }

    #[test]
    fn missing_no_field_parses_as_an_empty_book_side() {
        let (_, no_event) = to_market_events(
            WireBook { market_ticker: "T".to_string(), seq: 1, yes: vec![[50, 1]], no: vec![] },
            false,
        );
        let MarketEvent::Delta(no) = no_event else { panic!("expected delta") };
        assert!(no.levels.is_empty());
    }
}
