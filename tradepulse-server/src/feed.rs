//! Exchange trade feed client.
//!
//! Connects to the Binance trade stream, normalizes raw trade messages into
//! [`TradeEvent`]s, and forwards them over an mpsc channel to the ingestion
//! loop. Reconnects automatically after any socket error with a fixed delay;
//! the statistics window downstream persists across the gap.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use tradepulse_core::TradeEvent;

/// Raw Binance `@trade` stream message (numeric fields arrive as strings)
#[derive(Debug, Deserialize)]
struct BinanceTrade {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
    #[serde(rename = "T")]
    trade_time_ms: i64,
}

/// Parse a raw feed frame into a normalized trade event.
///
/// Volume is the quote-notional value of the trade (price x quantity), the
/// unit the whale threshold is configured in. Non-trade frames and malformed
/// payloads yield `None`.
pub fn parse_trade(text: &str) -> Option<TradeEvent> {
    let raw: BinanceTrade = serde_json::from_str(text).ok()?;
    if raw.event_type != "trade" {
        return None;
    }

    let price: f64 = raw.price.parse().ok()?;
    let quantity: f64 = raw.quantity.parse().ok()?;
    let time = DateTime::from_timestamp_millis(raw.trade_time_ms)?;

    Some(TradeEvent {
        price,
        volume: price * quantity,
        time,
    })
}

/// Run the feed connection loop until the downstream receiver is dropped.
pub async fn run(url: String, reconnect_delay: Duration, event_tx: mpsc::Sender<TradeEvent>) {
    info!("starting trade feed client for {}", url);

    loop {
        match connect_async(&url).await {
            Ok((ws_stream, _)) => {
                info!("connected to trade feed at {}", url);
                let (_, mut read) = ws_stream.split();

                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            let Some(event) = parse_trade(&text) else {
                                debug!("ignoring non-trade frame");
                                continue;
                            };
                            if event_tx.send(event).await.is_err() {
                                info!("ingestion loop stopped, shutting down feed");
                                return;
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("feed closed the connection");
                            break;
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                            // Heartbeats are handled by tungstenite
                        }
                        Err(e) => {
                            error!("feed socket error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }

                warn!("feed disconnected, will reconnect");
            }
            Err(e) => {
                error!("failed to connect to {}: {}", url, e);
            }
        }

        if event_tx.is_closed() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}
