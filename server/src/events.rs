use crate::ball::BallId;
use crate::player::Player;
use crate::rules::{Foul, GameEndReason, PendingDecision, Phase};
use crate::table::PocketId;
use tenball_shared::vec2::Vec2;

/// Everything the host needs to animate, announce or log, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Pocketed {
        ball: BallId,
        pocket: PocketId,
    },
    Foul {
        player: Player,
        foul: Foul,
        /// Shooter's consecutive foul count including this one
        consecutive: u8,
    },
    IllegalPocket {
        balls: Vec<BallId>,
    },
    BallSpotted {
        ball: BallId,
        position: Vec2,
    },
    PhaseChanged {
        phase: Phase,
    },
    TurnChanged {
        player: Player,
        ball_in_hand: bool,
    },
    PushOutAvailable {
        player: Player,
    },
    DecisionRequired(PendingDecision),
    CueBallRestored {
        position: Vec2,
    },
    GameEnd {
        winner: Player,
        reason: GameEndReason,
    },
    Reracked {
        rack: u32,
        breaker: Player,
    },
}
