//! Conversions between simulation types and the shared wire types.

use std::collections::BTreeMap;

pub use tenball_shared::protocol::*;

use crate::ball::{Ball, BallId, OBJECT_BALL_COUNT};
use crate::events::GameEvent;
use crate::player::Player;
use crate::predictor::{MarkerKind, Polyline};
use crate::rules::{
    DecisionChoice, Foul, GameEndReason, MatchState, PendingDecision, Phase, PushOutStatus,
};
use crate::shot::CallShot;
use crate::state::GameState;
use crate::table::{PocketId, PocketKind, Table};
use tenball_shared::vec2::Vec2;

fn point(v: Vec2) -> [f64; 2] {
    [round4(v.x), round4(v.y)]
}

pub fn pocket_wire(pocket: PocketId) -> PocketWire {
    match pocket {
        PocketId::TopLeft => PocketWire::CornerTopLeft,
        PocketId::TopSide => PocketWire::SideTop,
        PocketId::TopRight => PocketWire::CornerTopRight,
        PocketId::BottomLeft => PocketWire::CornerBottomLeft,
        PocketId::BottomSide => PocketWire::SideBottom,
        PocketId::BottomRight => PocketWire::CornerBottomRight,
    }
}

pub fn pocket_from_wire(pocket: PocketWire) -> PocketId {
    match pocket {
        PocketWire::CornerTopLeft => PocketId::TopLeft,
        PocketWire::SideTop => PocketId::TopSide,
        PocketWire::CornerTopRight => PocketId::TopRight,
        PocketWire::CornerBottomLeft => PocketId::BottomLeft,
        PocketWire::SideBottom => PocketId::BottomSide,
        PocketWire::CornerBottomRight => PocketId::BottomRight,
    }
}

fn phase_wire(phase: Phase) -> PhaseWire {
    match phase {
        Phase::Break => PhaseWire::Break,
        Phase::Play => PhaseWire::Play,
    }
}

pub fn foul_wire(foul: Foul) -> FoulWire {
    match foul {
        Foul::Scratch => FoulWire::Scratch,
        Foul::BreakWrongBallFirst => FoulWire::BreakWrongBallFirst,
        Foul::BreakInsufficientCushions => FoulWire::BreakInsufficientCushions,
        Foul::WrongBallFirst => FoulWire::WrongBallFirst,
        Foul::NoContact => FoulWire::NoContact,
        Foul::NoRailContact => FoulWire::NoRailContact,
    }
}

fn push_out_wire(status: PushOutStatus) -> PushOutWire {
    match status {
        PushOutStatus::Unavailable => PushOutWire::Unavailable,
        PushOutStatus::Available => PushOutWire::Available,
        PushOutStatus::Spent => PushOutWire::Spent,
    }
}

fn decision_wire(decision: PendingDecision) -> DecisionWire {
    let kind = match decision {
        PendingDecision::IllegalPocket { .. } => DecisionKindWire::IllegalPocket,
        PendingDecision::PushOut { .. } => DecisionKindWire::PushOut,
    };
    DecisionWire {
        kind,
        decider: decision.decider().number(),
        shooter: decision.shooter().number(),
    }
}

fn end_reason_wire(reason: GameEndReason) -> GameEndReasonWire {
    match reason {
        GameEndReason::TenBallPocketed => GameEndReasonWire::TenBallPocketed,
        GameEndReason::ThreeConsecutiveFouls => GameEndReasonWire::ThreeConsecutiveFouls,
    }
}

pub fn decision_choice_from_wire(choice: DecisionChoiceWire) -> DecisionChoice {
    match choice {
        DecisionChoiceWire::AcceptTable => DecisionChoice::AcceptTable,
        DecisionChoiceWire::ShooterShootsAgain => DecisionChoice::ShooterShootsAgain,
    }
}

/// Validate a wire call. Ball numbers outside 1..=10 are rejected here;
/// whether the ball is on the table is checked by `GameState`.
pub fn call_from_wire(call: CallWire) -> Result<CallShot, String> {
    if call.ball == 0 || call.ball as usize > OBJECT_BALL_COUNT {
        return Err(format!("no object ball numbered {}", call.ball));
    }
    Ok(CallShot {
        ball: BallId(call.ball),
        pocket: pocket_from_wire(call.pocket),
    })
}

pub fn ball_wire(ball: &Ball) -> BallWire {
    BallWire {
        id: ball.id.0,
        pos: point(ball.position),
        vel: point(ball.velocity),
        visible: ball.visible,
        pocketed: ball.pocketed,
        pocket: ball.pocketed_pocket_id.map(pocket_wire),
        rotation: round4(ball.rotation),
    }
}

pub fn match_wire(
    state: &MatchState,
    shot_in_progress: bool,
    lowest_ball: Option<BallId>,
) -> MatchWire {
    MatchWire {
        current_player: state.current_player.number(),
        phase: phase_wire(state.phase),
        ball_in_hand: state.ball_in_hand,
        consecutive_fouls: state.consecutive_fouls,
        push_out: push_out_wire(state.push_out),
        pending_decision: state.pending.map(decision_wire),
        winner: state.winner.map(Player::number),
        shot_in_progress,
        lowest_ball: lowest_ball.map(|b| b.0),
        rack: state.rack_number,
        scores: state.scores,
    }
}

pub fn event_wire(event: &GameEvent) -> GameEventWire {
    match event {
        GameEvent::Pocketed { ball, pocket } => GameEventWire::Pocketed {
            ball: ball.0,
            pocket: pocket_wire(*pocket),
        },
        GameEvent::Foul {
            player,
            foul,
            consecutive,
        } => GameEventWire::Foul {
            player: player.number(),
            foul: foul_wire(*foul),
            consecutive: *consecutive,
        },
        GameEvent::IllegalPocket { balls } => GameEventWire::IllegalPocket {
            balls: balls.iter().map(|b| b.0).collect(),
        },
        GameEvent::BallSpotted { ball, position } => GameEventWire::BallSpotted {
            ball: ball.0,
            pos: point(*position),
        },
        GameEvent::PhaseChanged { phase } => GameEventWire::PhaseChanged {
            phase: phase_wire(*phase),
        },
        GameEvent::TurnChanged {
            player,
            ball_in_hand,
        } => GameEventWire::TurnChanged {
            player: player.number(),
            ball_in_hand: *ball_in_hand,
        },
        GameEvent::PushOutAvailable { player } => GameEventWire::PushOutAvailable {
            player: player.number(),
        },
        GameEvent::DecisionRequired(decision) => GameEventWire::DecisionRequired {
            decision: decision_wire(*decision),
        },
        GameEvent::CueBallRestored { position } => GameEventWire::CueBallRestored {
            pos: point(*position),
        },
        GameEvent::GameEnd { winner, reason } => GameEventWire::GameEnd {
            winner: winner.number(),
            reason: end_reason_wire(*reason),
        },
        GameEvent::Reracked { rack, breaker } => GameEventWire::Reracked {
            rack: *rack,
            breaker: breaker.number(),
        },
    }
}

pub fn events_msg(frame: u64, events: &[GameEvent]) -> EventsMsg {
    EventsMsg {
        frame,
        events: events.iter().map(event_wire).collect(),
    }
}

pub fn table_wire(table: &Table) -> TableWire {
    TableWire {
        width: table.width,
        height: table.height,
        ball_diameter: table.ball_diameter,
        felt: table.felt.to_array(),
        kitchen: table.kitchen.to_array(),
        foot_spot: point(table.foot_spot),
        pockets: table
            .pockets
            .iter()
            .map(|p| PocketGeomWire {
                id: pocket_wire(p.id),
                center: point(p.center),
                capture_radius: round4(p.capture_radius()),
                corner: p.kind == PocketKind::Corner,
            })
            .collect(),
    }
}

pub fn table_state_msg(state: &GameState) -> TableStateMsg {
    TableStateMsg {
        frame: state.frame(),
        balls: state.balls().iter().map(ball_wire).collect(),
        match_state: match_wire(
            state.match_state(),
            state.shot_in_progress(),
            state.balls().lowest_object_ball(),
        ),
    }
}

pub fn welcome_msg(state: &GameState, bot_seat: Option<Player>) -> WelcomeMsg {
    WelcomeMsg {
        protocol_version: PROTOCOL_VERSION,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        bot_seat: bot_seat.map(Player::number),
        physics: *state.physics(),
        table: table_wire(state.table()),
        state: table_state_msg(state),
    }
}

fn marker_wire(index: usize, kind: MarkerKind) -> MarkerWire {
    let index = index as u32;
    match kind {
        MarkerKind::Collision { with } => MarkerWire::Collision { index, with: with.0 },
        MarkerKind::Cushion => MarkerWire::Cushion { index },
        MarkerKind::Pocketed { pocket } => MarkerWire::Pocketed {
            index,
            pocket: pocket_wire(pocket),
        },
    }
}

pub fn prediction_msg(paths: &BTreeMap<BallId, Polyline>) -> PredictionMsg {
    PredictionMsg {
        paths: paths
            .iter()
            .map(|(id, path)| PathWire {
                ball: id.0,
                points: path.points.iter().copied().map(point).collect(),
                markers: path
                    .markers
                    .iter()
                    .map(|m| marker_wire(m.index, m.kind))
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::shot::ShotParams;
    use tenball_shared::config::PhysicsConfig;
    use tenball_shared::vec2::vec2;

    fn test_state() -> GameState {
        GameState::new(&MatchConfig::default(), PhysicsConfig::default())
    }

    #[test]
    fn pocket_ids_roundtrip_through_wire() {
        for id in PocketId::ALL {
            assert_eq!(pocket_from_wire(pocket_wire(id)), id);
        }
        assert_eq!(pocket_wire(PocketId::TopLeft), PocketWire::CornerTopLeft);
    }

    #[test]
    fn call_rejects_cue_and_unknown_balls() {
        let pocket = PocketWire::SideBottom;
        assert!(call_from_wire(CallWire { ball: 0, pocket }).is_err());
        assert!(call_from_wire(CallWire { ball: 11, pocket }).is_err());
        let call = call_from_wire(CallWire { ball: 10, pocket }).unwrap();
        assert_eq!(call.ball, BallId::TEN);
        assert_eq!(call.pocket, PocketId::BottomSide);
    }

    #[test]
    fn welcome_describes_table_and_rack() {
        let state = test_state();
        let welcome = welcome_msg(&state, Some(Player::Two));
        assert_eq!(welcome.protocol_version, PROTOCOL_VERSION);
        assert_eq!(welcome.bot_seat, Some(2));
        assert_eq!(welcome.table.pockets.len(), 6);
        assert_eq!(welcome.table.pockets.iter().filter(|p| p.corner).count(), 4);
        assert_eq!(welcome.state.balls.len(), 11);
        assert_eq!(welcome.state.match_state.phase, PhaseWire::Break);
        assert_eq!(welcome.state.match_state.lowest_ball, Some(1));
        assert!(welcome.state.match_state.ball_in_hand);
    }

    #[test]
    fn events_use_player_numbers() {
        let msg = events_msg(
            7,
            &[
                GameEvent::Foul {
                    player: Player::Two,
                    foul: Foul::NoRailContact,
                    consecutive: 2,
                },
                GameEvent::DecisionRequired(PendingDecision::PushOut {
                    decider: Player::One,
                    shooter: Player::Two,
                }),
                GameEvent::BallSpotted {
                    ball: BallId::TEN,
                    position: vec2(450.123456, 150.0),
                },
            ],
        );
        assert_eq!(msg.frame, 7);
        match &msg.events[0] {
            GameEventWire::Foul { player, foul, consecutive } => {
                assert_eq!(*player, 2);
                assert_eq!(*foul, FoulWire::NoRailContact);
                assert_eq!(*consecutive, 2);
            }
            other => panic!("Expected Foul, got {:?}", other),
        }
        match &msg.events[1] {
            GameEventWire::DecisionRequired { decision } => {
                assert_eq!(decision.kind, DecisionKindWire::PushOut);
                assert_eq!(decision.decider, 1);
                assert_eq!(decision.shooter, 2);
            }
            other => panic!("Expected DecisionRequired, got {:?}", other),
        }
        match &msg.events[2] {
            GameEventWire::BallSpotted { ball, pos } => {
                assert_eq!(*ball, 10);
                assert_eq!(*pos, [450.1235, 150.0]);
            }
            other => panic!("Expected BallSpotted, got {:?}", other),
        }
    }

    #[test]
    fn prediction_keeps_marker_indices() {
        let state = test_state();
        let paths = state
            .predict_trajectories(ShotParams::new(0.0, 1.0), true)
            .unwrap();
        let msg = prediction_msg(&paths);
        assert_eq!(msg.paths.len(), paths.len());
        for (wire, path) in msg.paths.iter().zip(paths.values()) {
            assert_eq!(wire.points.len(), path.points.len());
            for marker in &wire.markers {
                let index = match marker {
                    MarkerWire::Collision { index, .. }
                    | MarkerWire::Cushion { index }
                    | MarkerWire::Pocketed { index, .. } => *index,
                };
                assert!((index as usize) < wire.points.len());
            }
        }
        assert_eq!(msg.paths[0].ball, 0);
    }
}
