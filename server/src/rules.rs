//! Ten-ball turn and foul state machine.
//!
//! The rules only react at two edges: a shot being fired (`begin_shot`) and
//! every ball coming to rest (`resolve_shot`). Everything in between belongs
//! to the stepper. Resolution never touches ball positions itself; it
//! reports what must be spotted or restored and the caller does it.

use crate::ball::BallId;
use crate::error::{DecisionError, ShotError};
use crate::events::GameEvent;
use crate::player::Player;
use crate::shot::ShotSummary;

/// Minimum cushion contacts on a break that drops nothing
pub const BREAK_MIN_CUSHIONS: u8 = 4;
/// Consecutive fouls that lose the game
pub const FOUL_LIMIT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Break,
    Play,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Foul {
    Scratch,
    BreakWrongBallFirst,
    BreakInsufficientCushions,
    WrongBallFirst,
    NoContact,
    NoRailContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutStatus {
    /// No push-out this rack yet (before the break resolves, or after a
    /// fouled break)
    Unavailable,
    /// The next shot may be declared a push-out
    Available,
    Spent,
}

/// The opponent of `shooter` must choose who plays the current table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingDecision {
    IllegalPocket { decider: Player, shooter: Player },
    PushOut { decider: Player, shooter: Player },
}

impl PendingDecision {
    pub fn decider(&self) -> Player {
        match *self {
            PendingDecision::IllegalPocket { decider, .. }
            | PendingDecision::PushOut { decider, .. } => decider,
        }
    }

    pub fn shooter(&self) -> Player {
        match *self {
            PendingDecision::IllegalPocket { shooter, .. }
            | PendingDecision::PushOut { shooter, .. } => shooter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionChoice {
    /// Decider takes the table as it lies
    AcceptTable,
    /// Shooter must play the table as it lies
    ShooterShootsAgain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    TenBallPocketed,
    ThreeConsecutiveFouls,
}

/// What the caller must do to the balls after a shot resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Every foul detected, highest priority first
    pub fouls: Vec<Foul>,
    pub events: Vec<GameEvent>,
    /// Put the 10-ball back on the foot spot
    pub spot_ten: bool,
    /// The cue ball dropped and must come back for ball in hand
    pub restore_cue: bool,
}

/// Fouls committed by a finished shot, highest priority first.
///
/// A push-out can only foul by scratching. On the break the first ball hit
/// must be the lowest ball and either something drops or enough balls reach
/// a cushion. Otherwise the usual lowest-ball-first, contact and rail
/// requirements apply.
pub fn detect_fouls(summary: &ShotSummary) -> Vec<Foul> {
    let mut fouls = Vec::new();
    let tracker = &summary.tracker;
    let lowest = summary.context.lowest_ball_at_shot_start;

    if summary.cue_pocketed() {
        fouls.push(Foul::Scratch);
    }

    if summary.context.is_push_out {
        return fouls;
    }

    if summary.phase() == Phase::Break {
        if tracker.first_ball_hit.is_none() || tracker.first_ball_hit != lowest {
            fouls.push(Foul::BreakWrongBallFirst);
        } else if !summary.any_object_pocketed()
            && tracker.object_balls_hit_cushion_count < BREAK_MIN_CUSHIONS
        {
            fouls.push(Foul::BreakInsufficientCushions);
        }
        return fouls;
    }

    match tracker.first_ball_hit {
        Some(first) if lowest.is_some() && Some(first) != lowest => {
            fouls.push(Foul::WrongBallFirst);
        }
        Some(_) => {}
        None => fouls.push(Foul::NoContact),
    }

    if tracker.any_contact_made
        && !summary.any_object_pocketed()
        && !tracker.rail_contact_after_hit
    {
        fouls.push(Foul::NoRailContact);
    }

    fouls
}

/// Turn-level match state. Persists across shots within a rack.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub current_player: Player,
    pub phase: Phase,
    pub ball_in_hand: bool,
    pub consecutive_fouls: [u8; 2],
    pub push_out: PushOutStatus,
    pub pending: Option<PendingDecision>,
    pub winner: Option<Player>,
    pub breaker: Player,
    pub rack_number: u32,
    /// Racks won per player
    pub scores: [u32; 2],
}

impl MatchState {
    /// Fresh rack with `breaker` to break from the kitchen.
    pub fn new(breaker: Player) -> Self {
        Self {
            current_player: breaker,
            phase: Phase::Break,
            ball_in_hand: true,
            consecutive_fouls: [0, 0],
            push_out: PushOutStatus::Unavailable,
            pending: None,
            winner: None,
            breaker,
            rack_number: 1,
            scores: [0, 0],
        }
    }

    /// Arranged position already past the break, `shooter` to play.
    pub fn in_play(shooter: Player) -> Self {
        Self {
            phase: Phase::Play,
            ball_in_hand: false,
            ..Self::new(shooter)
        }
    }

    /// Start the next rack. Scores carry over and the break alternates.
    pub fn next_rack(&mut self) {
        let breaker = self.breaker.other();
        *self = Self {
            rack_number: self.rack_number + 1,
            scores: self.scores,
            ..Self::new(breaker)
        };
    }

    pub fn fouls_of(&self, player: Player) -> u8 {
        self.consecutive_fouls[player.index()]
    }

    /// Player whose input the table is waiting for.
    pub fn acting_player(&self) -> Player {
        self.pending
            .map(|p| p.decider())
            .unwrap_or(self.current_player)
    }

    /// Cue ball may be moved by hand right now.
    pub fn can_place_cue(&self) -> bool {
        self.winner.is_none() && self.pending.is_none() && self.ball_in_hand
    }

    pub fn check_can_shoot(&self) -> Result<(), ShotError> {
        if self.winner.is_some() {
            return Err(ShotError::GameOver);
        }
        if let Some(pending) = self.pending {
            return Err(ShotError::DecisionPending(pending.decider()));
        }
        Ok(())
    }

    /// Commit to a shot. Firing a normal shot while a push-out is on offer
    /// declines it for good.
    pub fn begin_shot(&mut self, push_out: bool) -> Result<(), ShotError> {
        self.check_can_shoot()?;
        if push_out {
            if self.push_out != PushOutStatus::Available {
                return Err(ShotError::PushOutUnavailable);
            }
        } else if self.push_out == PushOutStatus::Available {
            self.push_out = PushOutStatus::Spent;
        }
        self.ball_in_hand = false;
        Ok(())
    }

    fn switch_turn(&mut self, to: Player, ball_in_hand: bool, events: &mut Vec<GameEvent>) {
        self.current_player = to;
        self.ball_in_hand = ball_in_hand;
        events.push(GameEvent::TurnChanged {
            player: to,
            ball_in_hand,
        });
    }

    fn end_game(&mut self, winner: Player, reason: GameEndReason, events: &mut Vec<GameEvent>) {
        self.winner = Some(winner);
        self.ball_in_hand = false;
        self.pending = None;
        self.scores[winner.index()] += 1;
        events.push(GameEvent::GameEnd { winner, reason });
    }

    fn require_decision(&mut self, decision: PendingDecision, events: &mut Vec<GameEvent>) {
        self.pending = Some(decision);
        events.push(GameEvent::DecisionRequired(decision));
    }

    /// Apply the outcome of a shot once every ball has stopped.
    pub fn resolve_shot(&mut self, summary: &ShotSummary) -> Resolution {
        let shooter = summary.shooter();
        let opponent = shooter.other();
        let was_break = summary.phase() == Phase::Break;
        let ten_down = summary.pocket_of(BallId::TEN).is_some();
        let mut res = Resolution {
            fouls: detect_fouls(summary),
            ..Default::default()
        };

        if was_break {
            self.phase = Phase::Play;
            res.events.push(GameEvent::PhaseChanged { phase: Phase::Play });
        }

        if let Some(&foul) = res.fouls.first() {
            let count = self.consecutive_fouls[shooter.index()].saturating_add(1);
            self.consecutive_fouls[shooter.index()] = count;
            res.events.push(GameEvent::Foul {
                player: shooter,
                foul,
                consecutive: count,
            });
            res.spot_ten = ten_down;
            res.restore_cue = summary.cue_pocketed();
            if summary.context.is_push_out {
                self.push_out = PushOutStatus::Spent;
            }

            if count >= FOUL_LIMIT {
                self.end_game(opponent, GameEndReason::ThreeConsecutiveFouls, &mut res.events);
            } else {
                self.switch_turn(opponent, true, &mut res.events);
            }
            return res;
        }

        self.consecutive_fouls[shooter.index()] = 0;

        if was_break {
            res.spot_ten = ten_down;
            let next = if summary.any_object_pocketed() {
                shooter
            } else {
                opponent
            };
            self.push_out = PushOutStatus::Available;
            if next != shooter {
                self.switch_turn(next, false, &mut res.events);
            }
            res.events.push(GameEvent::PushOutAvailable { player: next });
            return res;
        }

        if summary.context.is_push_out {
            self.push_out = PushOutStatus::Spent;
            res.spot_ten = ten_down;
            self.switch_turn(opponent, false, &mut res.events);
            self.require_decision(
                PendingDecision::PushOut {
                    decider: opponent,
                    shooter,
                },
                &mut res.events,
            );
            return res;
        }

        if let Some(call) = summary.context.call {
            if call.ball == BallId::TEN && summary.called_ball_made() {
                self.end_game(shooter, GameEndReason::TenBallPocketed, &mut res.events);
                return res;
            }
        }

        let call = summary.context.call;
        let illegal: Vec<BallId> = summary
            .object_balls_pocketed()
            .filter(|&(ball, pocket)| {
                call.map_or(true, |c| c.ball != ball || c.pocket != pocket)
            })
            .map(|(ball, _)| ball)
            .collect();
        let called_made = summary.called_ball_made();

        if !illegal.is_empty() {
            res.spot_ten = illegal.contains(&BallId::TEN);
            res.events.push(GameEvent::IllegalPocket {
                balls: illegal,
            });
            if !called_made {
                self.switch_turn(opponent, false, &mut res.events);
            }
            self.require_decision(
                PendingDecision::IllegalPocket {
                    decider: opponent,
                    shooter,
                },
                &mut res.events,
            );
            return res;
        }

        if !called_made {
            self.switch_turn(opponent, false, &mut res.events);
        }
        res
    }

    /// Settle a pending push-out or illegal-pocket decision.
    pub fn apply_decision(
        &mut self,
        choice: DecisionChoice,
    ) -> Result<Vec<GameEvent>, DecisionError> {
        let pending = self.pending.take().ok_or(DecisionError::NothingPending)?;
        let next = match choice {
            DecisionChoice::AcceptTable => pending.decider(),
            DecisionChoice::ShooterShootsAgain => pending.shooter(),
        };
        let mut events = Vec::new();
        self.switch_turn(next, false, &mut events);
        Ok(events)
    }
}
