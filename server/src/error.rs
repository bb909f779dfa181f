//! Caller-facing errors. Fouls are game events, never errors.

use crate::ball::BallId;
use crate::player::Player;
use crate::table::PocketId;
use thiserror::Error;

/// Rejected cue-ball placement. State is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("cue ball can only be placed with ball in hand")]
    NotAllowed,
    #[error("position ({x:.2}, {y:.2}) is off the playing surface")]
    OutsideTable { x: f64, y: f64 },
    #[error("break placement must be behind the head string")]
    OutsideKitchen,
    #[error("position is inside the {0:?} pocket")]
    InPocket(PocketId),
    #[error("position overlaps the {0}")]
    Overlapping(BallId),
}

/// Rejected shot or preview request. State is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShotError {
    #[error("game is over")]
    GameOver,
    #[error("a shot is already in progress")]
    ShotInProgress,
    #[error("waiting for a decision from {0}")]
    DecisionPending(Player),
    #[error("cue ball is not on the table")]
    CueBallOffTable,
    #[error("power {0} is outside 0.1..=1.0")]
    InvalidPower(f64),
    #[error("aim angle must be finite")]
    InvalidAngle,
    #[error("english must be within 0..=1 with a finite direction")]
    InvalidEnglish,
    #[error("push-out is not available")]
    PushOutUnavailable,
    #[error("cannot call {0}: {1}")]
    InvalidCall(BallId, &'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("no decision is pending")]
    NothingPending,
    #[error("a shot is in progress")]
    ShotInProgress,
}
