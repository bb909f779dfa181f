//! Built-in opponent that can fill the second seat.
//!
//! The bot is a small state machine driven once per frame:
//! - waits until the table is waiting on its seat
//! - "thinks" for a personality-dependent delay
//! - places the cue ball if it has ball in hand, then shoots at the lowest
//!   ball, calling the pocket with the smallest cut angle
//!
//! It always accepts the table when asked to decide and never pushes out.

use rand::Rng;
use tenball_shared::vec2::{angle_of, distance, dot, normalize, vec2, Vec2};

use crate::ball::BallId;
use crate::player::Player;
use crate::rules::{DecisionChoice, Phase};
use crate::shot::{CallShot, ShotParams, MAX_POWER, MIN_POWER};
use crate::state::GameState;
use crate::table::PocketId;

/// Distance behind the object ball, in diameters, for a ball-in-hand setup
const SETUP_DISTANCE: f64 = 4.0;
/// Grid spacing when nothing better is free
const FALLBACK_STEP: f64 = 20.0;

/// Bot personality affects timing and stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotPersonality {
    /// Shoots quickly (0.3-0.8s)
    Eager,
    /// Takes a while over each shot (1.5-4.0s)
    Relaxed,
    /// Unpredictable timing, power and aim (0.2-6.0s)
    Chaotic,
}

impl BotPersonality {
    fn delay_range(&self) -> (f64, f64) {
        match self {
            BotPersonality::Eager => (0.3, 0.8),
            BotPersonality::Relaxed => (1.5, 4.0),
            BotPersonality::Chaotic => (0.2, 6.0),
        }
    }

    fn random_delay(&self, rng: &mut impl Rng) -> f64 {
        let (min, max) = self.delay_range();
        min + rng.gen::<f64>() * (max - min)
    }

    fn power_factor(&self, rng: &mut impl Rng) -> f64 {
        match self {
            BotPersonality::Eager => 0.9 + rng.gen::<f64>() * 0.2,
            BotPersonality::Relaxed => 0.8 + rng.gen::<f64>() * 0.3,
            BotPersonality::Chaotic => 0.5 + rng.gen::<f64>() * 1.0,
        }
    }

    /// Max aim error in radians
    fn aim_error(&self) -> f64 {
        match self {
            BotPersonality::Eager | BotPersonality::Relaxed => 0.01,
            BotPersonality::Chaotic => 0.05,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => BotPersonality::Eager,
            1 => BotPersonality::Relaxed,
            _ => BotPersonality::Chaotic,
        }
    }
}

/// What the bot wants done to the table, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BotAction {
    PlaceCueBall { x: f64, y: f64 },
    FireShot {
        params: ShotParams,
        call: Option<CallShot>,
    },
    Decide(DecisionChoice),
}

#[derive(Debug)]
pub struct BotPlayer {
    pub seat: Player,
    pub personality: BotPersonality,
    /// Seconds left before acting. `None` while it's not the bot's turn.
    think_timer: Option<f64>,
}

impl BotPlayer {
    pub fn new(seat: Player, personality: BotPersonality) -> Self {
        Self {
            seat,
            personality,
            think_timer: None,
        }
    }

    /// Advance the bot by `dt` seconds. Returns the actions to apply once it
    /// has finished thinking, otherwise nothing.
    pub fn tick(&mut self, dt: f64, state: &GameState, rng: &mut impl Rng) -> Vec<BotAction> {
        let m = state.match_state();
        if state.shot_in_progress() || m.winner.is_some() || state.acting_player() != self.seat {
            self.think_timer = None;
            return Vec::new();
        }

        let personality = self.personality;
        let timer = self
            .think_timer
            .get_or_insert_with(|| personality.random_delay(rng));
        *timer -= dt;
        if *timer > 0.0 {
            return Vec::new();
        }
        self.think_timer = None;
        self.choose(state, rng)
    }

    fn choose(&self, state: &GameState, rng: &mut impl Rng) -> Vec<BotAction> {
        let m = state.match_state();
        if let Some(pending) = m.pending {
            tracing::debug!(seat = %self.seat, ?pending, "bot accepts the table");
            return vec![BotAction::Decide(DecisionChoice::AcceptTable)];
        }

        let Some(target) = state.balls().lowest_object_ball() else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        let cue_on_table = state.balls().cue().is_active();

        let cue = if m.can_place_cue() {
            match self.choose_placement(state, target) {
                Some(p) => {
                    actions.push(BotAction::PlaceCueBall { x: p.x, y: p.y });
                    p
                }
                None if cue_on_table => state.balls().cue().position,
                None => return Vec::new(),
            }
        } else if cue_on_table {
            state.balls().cue().position
        } else {
            // Waiting for the cue ball to come back
            return Vec::new();
        };

        let (params, call) = self.plan_shot(state, cue, target, rng);
        tracing::debug!(
            seat = %self.seat,
            target = %target,
            angle = params.angle,
            power = params.power,
            "bot shoots"
        );
        actions.push(BotAction::FireShot { params, call });
        actions
    }

    /// Legal cue position for ball in hand: default spot on the break,
    /// otherwise straight behind the target for its easiest pocket.
    fn choose_placement(&self, state: &GameState, target: BallId) -> Option<Vec2> {
        let table = state.table();
        let legal = |p: Vec2| state.check_cue_placement(p.x, p.y).is_ok();

        let mut candidates = Vec::new();
        if state.match_state().phase == Phase::Play {
            if let Some(target_pos) = state.balls().get(target).map(|b| b.position) {
                let mut pockets: Vec<PocketId> = PocketId::ALL.to_vec();
                pockets.sort_by(|a, b| {
                    let da = distance(table.pocket(*a).center, target_pos);
                    let db = distance(table.pocket(*b).center, target_pos);
                    da.total_cmp(&db)
                });
                candidates.extend(pockets.iter().map(|id| {
                    let line = normalize(table.pocket(*id).center - target_pos);
                    target_pos - line * (table.ball_diameter * SETUP_DISTANCE)
                }));
            }
        }
        candidates.push(table.default_cue_position);
        if let Some(p) = candidates.into_iter().find(|p| legal(*p)) {
            return Some(p);
        }

        let area = if state.match_state().phase == Phase::Break {
            table.kitchen_playable()
        } else {
            table.playable()
        };
        let mut y = area.top;
        while y <= area.bottom {
            let mut x = area.left;
            while x <= area.right {
                if legal(vec2(x, y)) {
                    return Some(vec2(x, y));
                }
                x += FALLBACK_STEP;
            }
            y += FALLBACK_STEP;
        }
        None
    }

    /// Aim through the ghost ball of the pocket with the smallest cut.
    fn plan_shot(
        &self,
        state: &GameState,
        cue: Vec2,
        target: BallId,
        rng: &mut impl Rng,
    ) -> (ShotParams, Option<CallShot>) {
        let table = state.table();
        let target_pos = state
            .balls()
            .get(target)
            .map(|b| b.position)
            .unwrap_or(table.foot_spot);
        let factor = self.personality.power_factor(rng);
        let error = self.personality.aim_error();
        let jitter = rng.gen_range(-error..=error);

        if state.match_state().phase == Phase::Break {
            let angle = angle_of(target_pos - cue) + jitter;
            let power = (MAX_POWER * factor).clamp(MIN_POWER, MAX_POWER);
            return (ShotParams::new(angle, power), None);
        }

        let to_target = normalize(target_pos - cue);
        let best = table
            .pockets
            .iter()
            .map(|pocket| {
                let line = normalize(pocket.center - target_pos);
                let ghost = target_pos - line * table.ball_diameter;
                (pocket, ghost, dot(to_target, line))
            })
            .max_by(|a, b| a.2.total_cmp(&b.2));

        let Some((pocket, ghost, _)) = best else {
            let angle = angle_of(target_pos - cue) + jitter;
            return (ShotParams::new(angle, 0.5), None);
        };
        let travel = distance(cue, ghost) + distance(target_pos, pocket.center);
        let base = (0.25 + travel / 900.0).min(0.9);
        let power = (base * factor).clamp(MIN_POWER, MAX_POWER);
        let angle = angle_of(ghost - cue) + jitter;
        let call = CallShot {
            ball: target,
            pocket: pocket.id,
        };
        (ShotParams::new(angle, power), Some(call))
    }
}
