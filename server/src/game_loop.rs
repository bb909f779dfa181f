use crate::bot::{BotAction, BotPersonality, BotPlayer};
use crate::config::ServerConfig;
use crate::events::GameEvent;
use crate::player::Player;
use crate::protocol::{
    call_from_wire, decision_choice_from_wire, events_msg, prediction_msg, table_state_msg,
    welcome_msg, DecisionChoiceWire, EventsMsg, FireShotMsg, PredictMsg, PredictionMsg,
    TableStateMsg, WelcomeMsg,
};
use crate::shot::ShotParams;
use crate::state::GameState;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Seat the bot takes when enabled
pub const BOT_SEAT: Player = Player::Two;

type Reply<T> = oneshot::Sender<Result<T, String>>;

/// Commands from client connections to the game loop
pub enum GameCommand {
    Join {
        response: oneshot::Sender<(u32, WelcomeMsg)>,
    },
    Leave {
        id: u32,
    },
    FireShot {
        shot: FireShotMsg,
        response: Reply<()>,
    },
    PlaceCueBall {
        x: f64,
        y: f64,
        response: Reply<()>,
    },
    Predict {
        request: PredictMsg,
        response: Reply<PredictionMsg>,
    },
    Decide {
        choice: DecisionChoiceWire,
        response: Reply<()>,
    },
    NewRack {
        response: Reply<()>,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    TableState(TableStateMsg),
    Events(EventsMsg),
}

fn broadcast_state(tx: &broadcast::Sender<GameBroadcast>, state: &GameState) {
    let _ = tx.send(GameBroadcast::TableState(table_state_msg(state)));
}

fn broadcast_events(tx: &broadcast::Sender<GameBroadcast>, frame: u64, events: &[GameEvent]) {
    if !events.is_empty() {
        let _ = tx.send(GameBroadcast::Events(events_msg(frame, events)));
    }
}

/// Humans may not act for the bot's seat.
fn check_human_turn(state: &GameState, bot_seat: Option<Player>) -> Result<(), String> {
    match bot_seat {
        Some(seat) if state.acting_player() == seat => {
            Err(format!("waiting for the bot ({})", seat))
        }
        _ => Ok(()),
    }
}

fn fire_shot(state: &mut GameState, shot: FireShotMsg) -> Result<(), String> {
    let params = ShotParams::new(shot.angle, shot.power)
        .with_english(shot.english, shot.english_direction);
    let call = shot.call.map(call_from_wire).transpose()?;
    state
        .fire_shot(params, call, shot.push_out)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn apply_bot_actions(
    state: &mut GameState,
    actions: Vec<BotAction>,
    broadcast_tx: &broadcast::Sender<GameBroadcast>,
) {
    for action in actions {
        let outcome = match action {
            BotAction::PlaceCueBall { x, y } => {
                state.place_cue_ball(x, y).map_err(|e| e.to_string())
            }
            BotAction::FireShot { params, call } => state
                .fire_shot(params, call, false)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            BotAction::Decide(choice) => state
                .decide(choice)
                .map(|events| broadcast_events(broadcast_tx, state.frame(), &events))
                .map_err(|e| e.to_string()),
        };
        if let Err(e) = outcome {
            tracing::warn!("Bot action rejected: {}", e);
            break;
        }
    }
    broadcast_state(broadcast_tx, state);
}

/// Run the main game loop. Owns the table.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
) {
    let mut state = GameState::new(&server_config.match_config, server_config.physics);
    let mut bot_rng = ChaCha8Rng::seed_from_u64(server_config.match_config.rng_seed ^ 0xb07);
    let mut bot = server_config.bot_opponent.then(|| {
        let personality = BotPersonality::random(&mut bot_rng);
        tracing::info!("Bot takes {} with {:?} personality", BOT_SEAT, personality);
        BotPlayer::new(BOT_SEAT, personality)
    });
    let bot_seat = bot.as_ref().map(|b| b.seat);

    let frame_dt = 1.0 / server_config.frame_rate_hz as f64;
    let broadcast_every_n =
        (server_config.frame_rate_hz / server_config.broadcast_rate_hz).max(1) as u64;
    let mut next_client_id: u32 = 1;

    let mut tick_interval = tokio::time::interval(Duration::from_secs_f64(frame_dt));
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let result = state.advance_frame();
                broadcast_events(&broadcast_tx, result.frame, &result.events);

                if let Some(bot) = bot.as_mut() {
                    let actions = bot.tick(frame_dt, &state, &mut bot_rng);
                    if !actions.is_empty() {
                        apply_bot_actions(&mut state, actions, &broadcast_tx);
                    }
                }

                if result.frame % broadcast_every_n == 0 {
                    broadcast_state(&broadcast_tx, &state);
                }
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    // Every connection handle is gone
                    break;
                };
                match cmd {
                    GameCommand::Join { response } => {
                        let id = next_client_id;
                        next_client_id += 1;
                        let _ = response.send((id, welcome_msg(&state, bot_seat)));
                    }
                    GameCommand::Leave { id } => {
                        tracing::info!("Client {} left", id);
                    }
                    GameCommand::FireShot { shot, response } => {
                        let result = check_human_turn(&state, bot_seat)
                            .and_then(|_| fire_shot(&mut state, shot));
                        if result.is_ok() {
                            broadcast_state(&broadcast_tx, &state);
                        }
                        let _ = response.send(result);
                    }
                    GameCommand::PlaceCueBall { x, y, response } => {
                        let result = check_human_turn(&state, bot_seat).and_then(|_| {
                            state.place_cue_ball(x, y).map_err(|e| e.to_string())
                        });
                        if result.is_ok() {
                            broadcast_state(&broadcast_tx, &state);
                        }
                        let _ = response.send(result);
                    }
                    GameCommand::Predict { request, response } => {
                        let params = ShotParams::new(request.angle, request.power)
                            .with_english(request.english, request.english_direction);
                        let result = state
                            .predict_trajectories(params, request.ignore_cue_pocket)
                            .map(|paths| prediction_msg(&paths))
                            .map_err(|e| e.to_string());
                        let _ = response.send(result);
                    }
                    GameCommand::Decide { choice, response } => {
                        let result = check_human_turn(&state, bot_seat).and_then(|_| {
                            state
                                .decide(decision_choice_from_wire(choice))
                                .map_err(|e| e.to_string())
                        });
                        if let Ok(events) = &result {
                            broadcast_events(&broadcast_tx, state.frame(), events);
                            broadcast_state(&broadcast_tx, &state);
                        }
                        let _ = response.send(result.map(|_| ()));
                    }
                    GameCommand::NewRack { response } => {
                        let event = state.rerack();
                        broadcast_events(&broadcast_tx, state.frame(), &[event]);
                        broadcast_state(&broadcast_tx, &state);
                        let _ = response.send(Ok(()));
                    }
                }
            }
        }
    }

    tracing::info!("Game loop ended");
}
