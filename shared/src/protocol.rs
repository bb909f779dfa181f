use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::PhysicsConfig;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Shared enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "kebab-case")]
pub enum PocketWire {
    CornerTopLeft,
    SideTop,
    CornerTopRight,
    CornerBottomLeft,
    SideBottom,
    CornerBottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum PhaseWire {
    Break,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum FoulWire {
    Scratch,
    BreakWrongBallFirst,
    BreakInsufficientCushions,
    WrongBallFirst,
    NoContact,
    NoRailContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum PushOutWire {
    Unavailable,
    Available,
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum DecisionKindWire {
    IllegalPocket,
    PushOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum DecisionChoiceWire {
    AcceptTable,
    ShooterShootsAgain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum GameEndReasonWire {
    TenBallPocketed,
    ThreeConsecutiveFouls,
}

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "table_state")]
    TableState(TableStateMsg),
    #[serde(rename = "events")]
    Events(EventsMsg),
    #[serde(rename = "prediction")]
    Prediction(PredictionMsg),
    #[serde(rename = "rejected")]
    Rejected(RejectedMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    /// Seat played by the server-side bot, if any
    pub bot_seat: Option<u8>,
    pub physics: PhysicsConfig,
    pub table: TableWire,
    pub state: TableStateMsg,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TableWire {
    pub width: f64,
    pub height: f64,
    pub ball_diameter: f64,
    /// [left, right, top, bottom]
    pub felt: [f64; 4],
    /// [left, right, top, bottom]
    pub kitchen: [f64; 4],
    pub foot_spot: [f64; 2],
    pub pockets: Vec<PocketGeomWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PocketGeomWire {
    pub id: PocketWire,
    pub center: [f64; 2],
    pub capture_radius: f64,
    pub corner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct TableStateMsg {
    pub frame: u64,
    pub balls: Vec<BallWire>,
    #[serde(rename = "match")]
    pub match_state: MatchWire,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BallWire {
    /// 0 is the cue ball
    pub id: u8,
    pub pos: [f64; 2],
    pub vel: [f64; 2],
    pub visible: bool,
    pub pocketed: bool,
    #[serde(default)]
    pub pocket: Option<PocketWire>,
    pub rotation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MatchWire {
    pub current_player: u8,
    pub phase: PhaseWire,
    pub ball_in_hand: bool,
    pub consecutive_fouls: [u8; 2],
    pub push_out: PushOutWire,
    #[serde(default)]
    pub pending_decision: Option<DecisionWire>,
    #[serde(default)]
    pub winner: Option<u8>,
    pub shot_in_progress: bool,
    #[serde(default)]
    pub lowest_ball: Option<u8>,
    pub rack: u32,
    pub scores: [u32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct DecisionWire {
    pub kind: DecisionKindWire,
    pub decider: u8,
    pub shooter: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct EventsMsg {
    pub frame: u64,
    pub events: Vec<GameEventWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEventWire {
    Pocketed {
        ball: u8,
        pocket: PocketWire,
    },
    Foul {
        player: u8,
        foul: FoulWire,
        consecutive: u8,
    },
    IllegalPocket {
        balls: Vec<u8>,
    },
    BallSpotted {
        ball: u8,
        pos: [f64; 2],
    },
    PhaseChanged {
        phase: PhaseWire,
    },
    TurnChanged {
        player: u8,
        #[serde(rename = "ballInHand")]
        ball_in_hand: bool,
    },
    PushOutAvailable {
        player: u8,
    },
    DecisionRequired {
        decision: DecisionWire,
    },
    CueBallRestored {
        pos: [f64; 2],
    },
    GameEnd {
        winner: u8,
        reason: GameEndReasonWire,
    },
    Reracked {
        rack: u32,
        breaker: u8,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PredictionMsg {
    pub paths: Vec<PathWire>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct PathWire {
    pub ball: u8,
    pub points: Vec<[f64; 2]>,
    pub markers: Vec<MarkerWire>,
}

/// A notable point on a predicted path. `index` points into `PathWire::points`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerWire {
    Collision { index: u32, with: u8 },
    Cushion { index: u32 },
    Pocketed { index: u32, pocket: PocketWire },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct RejectedMsg {
    pub request: String,
    pub reason: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "fire_shot")]
    FireShot(FireShotMsg),
    #[serde(rename = "place_cue_ball")]
    PlaceCueBall { x: f64, y: f64 },
    #[serde(rename = "predict")]
    Predict(PredictMsg),
    #[serde(rename = "decide")]
    Decide { choice: DecisionChoiceWire },
    #[serde(rename = "new_rack")]
    NewRack,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct FireShotMsg {
    pub angle: f64,
    pub power: f64,
    #[serde(default)]
    pub english: f64,
    #[serde(default)]
    pub english_direction: f64,
    #[serde(default)]
    pub call: Option<CallWire>,
    #[serde(default)]
    pub push_out: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct CallWire {
    pub ball: u8,
    pub pocket: PocketWire,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PredictMsg {
    pub angle: f64,
    pub power: f64,
    #[serde(default)]
    pub english: f64,
    #[serde(default)]
    pub english_direction: f64,
    #[serde(default = "default_ignore_cue_pocket")]
    pub ignore_cue_pocket: bool,
}

fn default_ignore_cue_pocket() -> bool {
    true
}

// === Conversion helpers ===

/// Round to 4 decimal places (keeps table coordinates readable, halves JSON size)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> MatchWire {
        MatchWire {
            current_player: 1,
            phase: PhaseWire::Break,
            ball_in_hand: true,
            consecutive_fouls: [0, 0],
            push_out: PushOutWire::Unavailable,
            pending_decision: None,
            winner: None,
            shot_in_progress: false,
            lowest_ball: Some(1),
            rack: 1,
            scores: [0, 0],
        }
    }

    #[test]
    fn server_msg_welcome_roundtrip() {
        let msg = ServerMsg::Welcome(WelcomeMsg {
            protocol_version: PROTOCOL_VERSION,
            server_version: "0.1.0".to_string(),
            bot_seat: Some(2),
            physics: PhysicsConfig::default(),
            table: TableWire {
                width: 600.0,
                height: 300.0,
                ball_diameter: 15.0,
                felt: [30.0, 570.77, 24.5, 270.18],
                kitchen: [30.0, 160.0, 24.5, 270.18],
                foot_spot: [450.0, 150.0],
                pockets: vec![PocketGeomWire {
                    id: PocketWire::CornerTopLeft,
                    center: [20.0, 14.5],
                    capture_radius: 45.75,
                    corner: true,
                }],
            },
            state: TableStateMsg {
                frame: 0,
                balls: vec![],
                match_state: sample_match(),
            },
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"welcome\""));
        assert!(json.contains("\"protocolVersion\":1"));
        assert!(json.contains("\"corner-top-left\""));
        assert!(json.contains("\"match\":{"));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::Welcome(w) => {
                assert_eq!(w.protocol_version, PROTOCOL_VERSION);
                assert_eq!(w.bot_seat, Some(2));
                assert_eq!(w.table.pockets.len(), 1);
                assert_eq!(w.state.match_state.phase, PhaseWire::Break);
            }
            _ => panic!("Expected Welcome"),
        }
    }

    #[test]
    fn events_msg_uses_kind_tags() {
        let msg = ServerMsg::Events(EventsMsg {
            frame: 120,
            events: vec![
                GameEventWire::Foul {
                    player: 1,
                    foul: FoulWire::WrongBallFirst,
                    consecutive: 2,
                },
                GameEventWire::TurnChanged {
                    player: 2,
                    ball_in_hand: true,
                },
                GameEventWire::GameEnd {
                    winner: 2,
                    reason: GameEndReasonWire::ThreeConsecutiveFouls,
                },
            ],
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"events\""));
        assert!(json.contains("\"kind\":\"foul\""));
        assert!(json.contains("\"foul\":\"wrong_ball_first\""));
        assert!(json.contains("\"ballInHand\":true"));
        assert!(json.contains("\"reason\":\"three_consecutive_fouls\""));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::Events(e) => {
                assert_eq!(e.frame, 120);
                assert_eq!(e.events.len(), 3);
            }
            _ => panic!("Expected Events"),
        }
    }

    #[test]
    fn prediction_markers_roundtrip() {
        let msg = ServerMsg::Prediction(PredictionMsg {
            paths: vec![PathWire {
                ball: 0,
                points: vec![[100.0, 150.0], [118.0, 150.0]],
                markers: vec![
                    MarkerWire::Collision { index: 1, with: 1 },
                    MarkerWire::Pocketed {
                        index: 1,
                        pocket: PocketWire::SideTop,
                    },
                ],
            }],
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"collision\""));
        assert!(json.contains("\"side-top\""));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::Prediction(p) => {
                assert_eq!(p.paths[0].points.len(), 2);
                assert_eq!(p.paths[0].markers.len(), 2);
            }
            _ => panic!("Expected Prediction"),
        }
    }

    #[test]
    fn client_msg_fire_shot_defaults() {
        let json = r#"{"type":"fire_shot","angle":0.5,"power":0.8}"#;
        let parsed: ClientMsg = serde_json::from_str(json).unwrap();
        match parsed {
            ClientMsg::FireShot(shot) => {
                assert!((shot.angle - 0.5).abs() < 1e-9);
                assert_eq!(shot.english, 0.0);
                assert!(shot.call.is_none());
                assert!(!shot.push_out);
            }
            _ => panic!("Expected FireShot"),
        }
    }

    #[test]
    fn client_msg_fire_shot_with_call() {
        let json = r#"{"type":"fire_shot","angle":3.1,"power":0.4,"call":{"ball":10,"pocket":"corner-top-left"},"pushOut":false}"#;
        let parsed: ClientMsg = serde_json::from_str(json).unwrap();
        match parsed {
            ClientMsg::FireShot(shot) => {
                let call = shot.call.unwrap();
                assert_eq!(call.ball, 10);
                assert_eq!(call.pocket, PocketWire::CornerTopLeft);
            }
            _ => panic!("Expected FireShot"),
        }
    }

    #[test]
    fn client_msg_predict_ignores_cue_pocket_by_default() {
        let json = r#"{"type":"predict","angle":0.0,"power":1.0}"#;
        let parsed: ClientMsg = serde_json::from_str(json).unwrap();
        match parsed {
            ClientMsg::Predict(p) => assert!(p.ignore_cue_pocket),
            _ => panic!("Expected Predict"),
        }
    }

    #[test]
    fn client_msg_unit_and_struct_variants_roundtrip() {
        let msgs = vec![
            ClientMsg::PlaceCueBall { x: 100.0, y: 150.0 },
            ClientMsg::Decide {
                choice: DecisionChoiceWire::ShooterShootsAgain,
            },
            ClientMsg::NewRack,
        ];
        for msg in msgs {
            let json = serde_json::to_string(&msg).unwrap();
            let parsed: ClientMsg = serde_json::from_str(&json).unwrap();
            assert_eq!(
                serde_json::to_string(&parsed).unwrap(),
                json,
                "roundtrip mismatch"
            );
        }
        let json = serde_json::to_string(&ClientMsg::NewRack).unwrap();
        assert_eq!(json, r#"{"type":"new_rack"}"#);
    }

    #[test]
    fn round4_truncates_noise() {
        assert_eq!(round4(300.38500001), 300.385);
        assert_eq!(round4(-0.00004), -0.0);
    }
}
