//! TradePulse WebSocket server.
//!
//! Wires the exchange trade feed through the rolling statistics engine and
//! broadcasts every enriched snapshot to connected clients, which can also
//! issue paper-trading commands (execute / portfolio / history) over the
//! same connection.

mod feed;
mod protocol;
mod sink;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use protocol::ServerMessage;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use tradepulse_core::{Config, Ledger, RollingStats, SnapshotHub, SnapshotRx, TradeEvent};

/// Feed channel depth between the exchange client and the ingestion loop
const FEED_CHANNEL_CAPACITY: usize = 1024;
/// Delay before reconnecting after a feed disconnect
const FEED_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    init_logging();

    let config = Config::from_env();
    info!(?config, "starting TradePulse server");

    // History sink: the ledger forwards every executed trade, a dedicated
    // task appends them to the JSONL store
    let history_path = std::env::var("HISTORY_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("trade_history.jsonl"));
    let (sink_tx, sink_rx) = mpsc::unbounded_channel();
    tokio::spawn(sink::run(history_path, sink_rx));

    let ledger = Arc::new(Ledger::new(config.starting_usd).with_sink(sink_tx));
    let hub = SnapshotHub::new(config.subscriber_buffer);

    // Exchange feed -> ingestion channel
    let feed_url = std::env::var("FEED_URL")
        .unwrap_or_else(|_| "wss://stream.binance.com:9443/ws/btcusdt@trade".to_string());
    let (event_tx, mut event_rx) = mpsc::channel::<TradeEvent>(FEED_CHANNEL_CAPACITY);
    tokio::spawn(feed::run(feed_url, FEED_RECONNECT_DELAY, event_tx));

    // WebSocket server for subscribers and ledger commands
    let server_addr_str = std::env::var("WS_ADDR").unwrap_or_else(|_| "0.0.0.0:9001".to_string());
    let server_addr = server_addr_str
        .parse::<SocketAddr>()
        .unwrap_or_else(|_| "0.0.0.0:9001".parse().unwrap());
    {
        let hub = hub.clone();
        let ledger = Arc::clone(&ledger);
        let trade_amount = config.trade_amount;
        tokio::spawn(async move {
            start_websocket_server(server_addr, hub, ledger, trade_amount).await;
        });
    }
    info!("WebSocket server listening on ws://{}", server_addr);

    // Ingestion loop: the sole owner and writer of the rolling window
    let mut engine = RollingStats::new(&config);
    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("feed channel closed, stopping ingestion");
                    break;
                };
                let snapshot = engine.observe(&event);
                if snapshot.stats.status.is_anomalous() {
                    info!(
                        price = snapshot.price,
                        z_score = snapshot.stats.z_score,
                        status = %snapshot.stats.status,
                        "anomaly detected"
                    );
                }
                hub.publish(snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    // Dropping the hub (and the server's clone going away with the process)
    // ends every subscriber stream; the sink drains once the ledger is gone
    info!("TradePulse server stopped");
}

/// Accept WebSocket clients and hand each one a hub subscription.
async fn start_websocket_server(
    addr: SocketAddr,
    hub: SnapshotHub,
    ledger: Arc<Ledger>,
    trade_amount: f64,
) {
    let listener = TcpListener::bind(&addr)
        .await
        .expect("failed to bind WebSocket server");

    while let Ok((stream, peer_addr)) = listener.accept().await {
        info!("new WebSocket connection from {}", peer_addr);
        let subscription = hub.subscribe();
        let ledger = Arc::clone(&ledger);
        tokio::spawn(handle_client(
            stream,
            peer_addr,
            subscription,
            ledger,
            trade_amount,
        ));
    }
}

/// Serve one client: stream snapshots out, answer command frames in.
async fn handle_client(
    stream: TcpStream,
    peer_addr: SocketAddr,
    mut subscription: SnapshotRx,
    ledger: Arc<Ledger>,
    trade_amount: f64,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", peer_addr, e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let welcome = ServerMessage::Welcome {
        message: "Connected to TradePulse snapshot feed".to_string(),
        timestamp: Utc::now(),
    };
    if send_message(&mut ws_sender, &welcome).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            maybe_snapshot = subscription.recv() => {
                let Some(snapshot) = maybe_snapshot else {
                    info!("snapshot hub closed, ending stream for {}", peer_addr);
                    break;
                };
                let message = ServerMessage::Snapshot { snapshot };
                if send_message(&mut ws_sender, &message).await.is_err() {
                    break;
                }
            }
            maybe_msg = ws_receiver.next() => {
                match maybe_msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = protocol::respond(&text, &ledger, trade_amount);
                        if send_message(&mut ws_sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Pings are answered by tungstenite automatically
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error for {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
        }
    }

    if subscription.dropped() > 0 {
        warn!(
            "client {} fell behind, {} snapshots dropped over the session",
            peer_addr,
            subscription.dropped()
        );
    }
    info!("WebSocket connection closed for {}", peer_addr);
}

type WsSink = futures::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<TcpStream>,
    Message,
>;

async fn send_message(
    ws_sender: &mut WsSink,
    message: &ServerMessage,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    match serde_json::to_string(message) {
        Ok(json) => ws_sender.send(Message::Text(json.into())).await,
        Err(e) => {
            error!("failed to serialize server message: {}", e);
            Ok(())
        }
    }
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
