//! `GET /ws`: pushes the current public feed to the client as a status-wrapped JSON frame
//! every `refresh_interval / 2`.
//!
//! Grounded on `original_source/back/app/apiService/internal/server/handler/wsHandlers.go`'s
//! `handleConnection`/`sendNewMsg` ticker loop, re-expressed via `rocket_ws`'s channel/task
//! pattern (the same pattern the teacher uses for its own chat socket in
//! `mynewslens::sessions::websocket::chat_websocket`), with an added `select!` arm so a client
//! close is noticed immediately instead of only between ticks.

use rocket::futures::{SinkExt, StreamExt};
use rocket::{get, routes, Route, State};
use rocket_ws::{Channel, Message, WebSocket};
use tracing::{debug, error, info};

use common::ErrorKind;

use crate::state::AppState;

#[get("/ws")]
pub fn feed_socket(ws: WebSocket, state: &State<AppState>) -> Channel<'static> {
    let fetcher = state.feed_fetcher.clone();
    let push_interval = state.ws_push_interval;

    ws.channel(move |mut stream| {
        Box::pin(async move {
            info!("gateway websocket connected");
            let mut ticker = tokio::time::interval(push_interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let frame = match fetcher.fetch_articles().await {
                            Ok(articles) => serde_json::json!({"status": 200, "body": {"articles": articles}}),
                            Err(e) if e.kind == ErrorKind::NoPublishedArticles || e.kind == ErrorKind::CacheEmpty => {
                                debug!("ws: nothing to push yet");
                                serde_json::json!({"status": 200, "body": {"articles": []}})
                            }
                            Err(e) => {
                                debug!(%e, "ws: transient fetch error, sending empty frame");
                                serde_json::json!({"status": 200, "body": {"articles": []}})
                            }
                        };

                        if let Err(e) = stream.send(Message::Text(frame.to_string())).await {
                            error!(%e, "ws: write failed, closing connection");
                            break;
                        }
                    }
                    incoming = stream.next() => {
                        match incoming {
                            Some(Ok(Message::Close(_))) | None => {
                                info!("gateway websocket closed by client");
                                break;
                            }
                            Some(Err(e)) => {
                                error!(%e, "gateway websocket error");
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }

            Ok(())
        })
    })
}

pub fn routes() -> Vec<Route> {
    routes![feed_socket]
}
