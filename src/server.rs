use std::{io, sync::Arc};

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::{
    net::TcpListener,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    configs::ServerConfig,
    connection::{Connection, Outbound},
};

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
    shutdown: CancellationToken,
}

/// Builds the application's routes, the websocket endpoint living at `/ws`.
pub fn router(config: ServerConfig, shutdown: CancellationToken) -> Router {
    let state = AppState {
        config: Arc::new(config),
        shutdown,
    };

    Router::new().route("/ws", get(upgrade)).with_state(state)
}

/// Serves websocket clients until `shutdown` is triggered.
///
/// # Arguments
/// * `config` - Where to listen and how to serve.
/// * `shutdown` - Cancelling it closes every connection and stops the server.
pub async fn serve(config: ServerConfig, shutdown: CancellationToken) -> io::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    info!("listening at {}", listener.local_addr()?);

    let signal = shutdown.clone();
    axum::serve(listener, router(config, shutdown))
        .with_graceful_shutdown(async move { signal.cancelled().await })
        .await
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let AppState { config, shutdown } = state;
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut conn = Connection::new(config.map_size, tx);
    let id = conn.session().id().to_string();
    info!(session = id.as_str(); "client connected");

    conn.greet();

    let mut ticker = time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => conn.handle_text(&text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(session = id.as_str(); "websocket error: {e}");
                    break;
                }
            },
            Some(outbound) = rx.recv() => {
                let Some(msg) = to_message(outbound) else {
                    continue;
                };

                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => conn.tick(),
            _ = shutdown.cancelled() => {
                debug!(session = id.as_str(); "closing on shutdown");
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    conn.close().await;
    info!(session = id.as_str(); "client disconnected");
}

fn to_message(outbound: Outbound) -> Option<Message> {
    match outbound {
        Outbound::Reply(reply) => match reply.to_json() {
            Ok(json) => Some(Message::Text(json)),
            Err(e) => {
                warn!("failed to serialize reply: {e}");
                None
            }
        },
        Outbound::Frame(frame) => Some(Message::Binary(frame.encode())),
    }
}
