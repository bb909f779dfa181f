use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, Semaphore};

use crate::game_loop::{GameBroadcast, GameCommand};
use crate::protocol::{ClientMsg, RejectedMsg, ServerMsg};

/// Largest text frame a client may send (bytes)
pub const MAX_MESSAGE_BYTES: usize = 1024;
/// Unparseable messages tolerated before the client is dropped
pub const MAX_PARSE_ERRORS: u32 = 5;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
    pub connection_semaphore: Arc<Semaphore>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    let permit = match app_state.connection_semaphore.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!("Connection limit reached, refusing client");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };
    ws.on_upgrade(move |socket| async move {
        handle_socket(socket, app_state).await;
        drop(permit);
    })
}

type WsSink = SplitSink<WebSocket, Message>;

async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

fn rejected(request: &str, reason: String) -> ServerMsg {
    ServerMsg::Rejected(RejectedMsg {
        request: request.to_string(),
        reason,
    })
}

/// Send a command to the game loop and wait for its answer.
async fn request<T>(
    game_tx: &mpsc::Sender<GameCommand>,
    make: impl FnOnce(oneshot::Sender<Result<T, String>>) -> GameCommand,
) -> Result<T, String> {
    let (resp_tx, resp_rx) = oneshot::channel();
    game_tx
        .send(make(resp_tx))
        .await
        .map_err(|_| "game loop is not running".to_string())?;
    resp_rx
        .await
        .map_err(|_| "game loop dropped the request".to_string())?
}

/// Forward one client message. Returns the reply meant only for this
/// client, if any.
async fn handle_client_msg(
    game_tx: &mpsc::Sender<GameCommand>,
    msg: ClientMsg,
) -> Option<ServerMsg> {
    match msg {
        ClientMsg::FireShot(shot) => {
            request(game_tx, |response| GameCommand::FireShot { shot, response })
                .await
                .err()
                .map(|reason| rejected("fire_shot", reason))
        }
        ClientMsg::PlaceCueBall { x, y } => {
            request(game_tx, |response| GameCommand::PlaceCueBall { x, y, response })
                .await
                .err()
                .map(|reason| rejected("place_cue_ball", reason))
        }
        ClientMsg::Predict(predict) => {
            match request(game_tx, |response| GameCommand::Predict {
                request: predict,
                response,
            })
            .await
            {
                Ok(prediction) => Some(ServerMsg::Prediction(prediction)),
                Err(reason) => Some(rejected("predict", reason)),
            }
        }
        ClientMsg::Decide { choice } => {
            request(game_tx, |response| GameCommand::Decide { choice, response })
                .await
                .err()
                .map(|reason| rejected("decide", reason))
        }
        ClientMsg::NewRack => {
            request(game_tx, |response| GameCommand::NewRack { response })
                .await
                .err()
                .map(|reason| rejected("new_rack", reason))
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Join the game
    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::Join { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!("Client {} connected", my_id);

    if !send_msg(&mut sink, &ServerMsg::Welcome(welcome)).await {
        return;
    }

    // Subscribe to broadcasts
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();
    let mut parse_errors: u32 = 0;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_MESSAGE_BYTES {
                            tracing::warn!(
                                "Client {} sent {} bytes, disconnecting",
                                my_id,
                                text.len()
                            );
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                        let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(client_msg) => client_msg,
                            Err(e) => {
                                parse_errors += 1;
                                if parse_errors >= MAX_PARSE_ERRORS {
                                    tracing::warn!(
                                        "Client {} sent {} unparseable messages, disconnecting",
                                        my_id,
                                        parse_errors
                                    );
                                    let _ = sink.send(Message::Close(None)).await;
                                    break;
                                }
                                let reply = rejected("unknown", e.to_string());
                                if !send_msg(&mut sink, &reply).await {
                                    break;
                                }
                                continue;
                            }
                        };
                        let reply = handle_client_msg(&app_state.game_tx, client_msg).await;
                        if let Some(reply) = reply {
                            if !send_msg(&mut sink, &reply).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) if data.len() > MAX_MESSAGE_BYTES => {
                        tracing::warn!(
                            "Client {} sent oversized binary frame, disconnecting",
                            my_id
                        );
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Client {} socket error: {}", my_id, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong/small binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let msg = match broadcast {
                            GameBroadcast::TableState(msg) => ServerMsg::TableState(msg),
                            GameBroadcast::Events(msg) => ServerMsg::Events(msg),
                        };
                        if !send_msg(&mut sink, &msg).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Snapshots supersede each other; lost events are not replayed
                        tracing::warn!("Client {} lagged by {} messages", my_id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .game_tx
        .send(GameCommand::Leave { id: my_id })
        .await;
    tracing::info!("Client {} disconnected", my_id);
}
