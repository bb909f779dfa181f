//! Integration tests for the ten-ball server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tenball_server::protocol::{ClientMsg, FireShotMsg, PhaseWire, PredictMsg, ServerMsg};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Start a test server on a random available port and return the WebSocket URL.
async fn start_test_server_with(bot_opponent: bool, max_connections: usize) -> String {
    use tenball_server::config::ServerConfig;
    use tenball_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
    use tenball_server::ws::AppState;

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // Release the port so the server can bind to it

    let config = ServerConfig {
        listen_addr: addr.to_string(),
        broadcast_rate_hz: 10,
        max_connections,
        bot_opponent,
        ..Default::default()
    };

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(64);

    let app_state = AppState {
        game_tx,
        broadcast_tx: broadcast_tx.clone(),
        connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
    };

    // Start game loop
    let game_config = config.clone();
    tokio::spawn(async move {
        run_game_loop(game_rx, broadcast_tx, game_config).await;
    });

    // Start HTTP/WebSocket server
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(tenball_server::ws::ws_handler))
        .with_state(app_state);

    tokio::spawn(async move {
        let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("ws://{}/ws", addr)
}

async fn start_test_server() -> String {
    start_test_server_with(false, 100).await
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut Ws) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

/// Skip broadcasts until a message matching `pred` arrives, or give up.
async fn recv_matching(
    ws: &mut Ws,
    timeout: Duration,
    pred: impl Fn(&ServerMsg) -> bool,
) -> Option<ServerMsg> {
    let search = async {
        loop {
            let msg = recv_msg(ws).await;
            if pred(&msg) {
                return msg;
            }
        }
    };
    tokio::time::timeout(timeout, search).await.ok()
}

async fn send(ws: &mut Ws, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

/// Wait for the server to drop the connection.
async fn wait_for_disconnect(ws: &mut Ws) -> bool {
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        match tokio::time::timeout(Duration::from_millis(100), ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return true,
            Err(_) => {
                // Timeout - try sending to check if connection is dead
                if ws.send(Message::Ping(vec![].into())).await.is_err() {
                    return true;
                }
            }
            _ => continue,
        }
    }
    false
}

fn is_rejected(msg: &ServerMsg) -> bool {
    matches!(msg, ServerMsg::Rejected(_))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_welcome() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    match recv_msg(&mut ws).await {
        ServerMsg::Welcome(welcome) => {
            assert_eq!(welcome.protocol_version, 1);
            assert_eq!(welcome.bot_seat, None);
            assert_eq!(welcome.table.pockets.len(), 6);
            assert_eq!(welcome.state.balls.len(), 11);
            assert_eq!(welcome.state.match_state.phase, PhaseWire::Break);
            assert!(welcome.state.match_state.ball_in_hand);
        }
        other => panic!("Expected Welcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bot_seat_is_announced() {
    let url = start_test_server_with(true, 100).await;
    let mut ws = connect(&url).await;

    match recv_msg(&mut ws).await {
        ServerMsg::Welcome(welcome) => assert_eq!(welcome.bot_seat, Some(2)),
        other => panic!("Expected Welcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_predict_is_answered_to_sender() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    let request = ClientMsg::Predict(PredictMsg {
        angle: 0.0,
        power: 0.8,
        english: 0.0,
        english_direction: 0.0,
        ignore_cue_pocket: true,
    });
    send(&mut ws, &request).await;

    let reply = recv_matching(&mut ws, Duration::from_secs(2), |m| {
        matches!(m, ServerMsg::Prediction(_))
    })
    .await
    .expect("no prediction received");
    match reply {
        ServerMsg::Prediction(prediction) => {
            let cue = prediction.paths.iter().find(|p| p.ball == 0).unwrap();
            assert!(cue.points.len() >= 2);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_invalid_shot_is_rejected() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    let shot = ClientMsg::FireShot(FireShotMsg {
        angle: 0.0,
        power: 0.0,
        english: 0.0,
        english_direction: 0.0,
        call: None,
        push_out: false,
    });
    send(&mut ws, &shot).await;

    match recv_matching(&mut ws, Duration::from_secs(2), is_rejected).await {
        Some(ServerMsg::Rejected(rejected)) => {
            assert_eq!(rejected.request, "fire_shot");
            assert!(!rejected.reason.is_empty());
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_break_placement_outside_kitchen_is_rejected() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    send(&mut ws, &ClientMsg::PlaceCueBall { x: 300.0, y: 150.0 }).await;
    match recv_matching(&mut ws, Duration::from_secs(2), is_rejected).await {
        Some(ServerMsg::Rejected(rejected)) => assert_eq!(rejected.request, "place_cue_ball"),
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shot_is_broadcast_to_every_client() {
    let url = start_test_server().await;
    let mut shooter = connect(&url).await;
    let mut watcher = connect(&url).await;
    let _ = recv_msg(&mut shooter).await;
    let _ = recv_msg(&mut watcher).await;

    send(&mut shooter, &ClientMsg::PlaceCueBall { x: 120.0, y: 160.0 }).await;
    let placed = recv_matching(&mut watcher, Duration::from_secs(2), |m| match m {
        ServerMsg::TableState(state) => state.balls[0].pos == [120.0, 160.0],
        _ => false,
    })
    .await;
    assert!(placed.is_some(), "placement should reach other clients");

    let shot = ClientMsg::FireShot(FireShotMsg {
        angle: 0.0,
        power: 1.0,
        english: 0.0,
        english_direction: 0.0,
        call: None,
        push_out: false,
    });
    send(&mut shooter, &shot).await;
    let rolling = recv_matching(&mut watcher, Duration::from_secs(2), |m| match m {
        ServerMsg::TableState(state) => state.match_state.shot_in_progress,
        _ => false,
    })
    .await;
    assert!(rolling.is_some(), "shot should be broadcast as in progress");
}

#[tokio::test]
async fn test_new_rack_is_announced() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;
    let _welcome = recv_msg(&mut ws).await;

    send(&mut ws, &ClientMsg::NewRack).await;
    let msg = recv_matching(&mut ws, Duration::from_secs(2), |m| match m {
        ServerMsg::TableState(state) => state.match_state.rack == 2,
        _ => false,
    })
    .await;
    assert!(msg.is_some(), "rack number should advance");
}

#[tokio::test]
async fn test_connection_limit_refuses_extra_clients() {
    let url = start_test_server_with(false, 1).await;
    let mut first = connect(&url).await;
    let _welcome = recv_msg(&mut first).await;

    assert!(
        connect_async(&url).await.is_err(),
        "second client should be refused"
    );
}

#[tokio::test]
async fn test_oversized_message_disconnects_client() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    // Get welcome
    let _welcome = recv_msg(&mut ws).await;

    // Send an oversized message (> 1024 bytes)
    let huge_payload = "x".repeat(2000);
    let msg = format!(
        r#"{{"type":"place_cue_ball","x":100.0,"y":150.0,"extra":"{}"}}"#,
        huge_payload
    );
    let _ = ws.send(Message::Text(msg.into())).await;

    assert!(
        wait_for_disconnect(&mut ws).await,
        "Client should be disconnected after oversized message"
    );
}

#[tokio::test]
async fn test_parse_spam_disconnects_client() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    // Get welcome
    let _welcome = recv_msg(&mut ws).await;

    // Send multiple invalid JSON messages (parse errors)
    for _ in 0..10 {
        let _ = ws.send(Message::Text("not valid json".into())).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(
        wait_for_disconnect(&mut ws).await,
        "Client should be disconnected after too many parse errors"
    );
}
