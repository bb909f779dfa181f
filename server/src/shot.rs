//! Shot inputs and the per-shot bookkeeping the rules consume.

use crate::ball::{Ball, BallId};
use crate::error::ShotError;
use crate::physics::StepObserver;
use crate::player::Player;
use crate::rules::Phase;
use crate::table::PocketId;
use tenball_shared::config::PhysicsConfig;
use tenball_shared::vec2::{from_angle, Vec2};

pub const MIN_POWER: f64 = 0.1;
pub const MAX_POWER: f64 = 1.0;

/// Cue stroke as the player sets it up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotParams {
    /// Radians, 0 points toward +x
    pub angle: f64,
    pub power: f64,
    pub english: f64,
    /// Degrees relative to the aim line. 0 is follow, 180 is draw.
    pub english_direction: f64,
}

impl ShotParams {
    pub fn new(angle: f64, power: f64) -> Self {
        Self {
            angle,
            power,
            english: 0.0,
            english_direction: 0.0,
        }
    }

    pub fn with_english(mut self, english: f64, direction_degrees: f64) -> Self {
        self.english = english;
        self.english_direction = direction_degrees;
        self
    }

    pub fn validate(&self) -> Result<(), ShotError> {
        if !self.angle.is_finite() {
            return Err(ShotError::InvalidAngle);
        }
        if !self.power.is_finite() || !(MIN_POWER..=MAX_POWER).contains(&self.power) {
            return Err(ShotError::InvalidPower(self.power));
        }
        if !self.english.is_finite()
            || !(0.0..=1.0).contains(&self.english)
            || !self.english_direction.is_finite()
        {
            return Err(ShotError::InvalidEnglish);
        }
        Ok(())
    }

    /// Initial cue ball velocity and spin for this stroke.
    pub fn launch(&self, config: &PhysicsConfig) -> Launch {
        let spin_angle = self.angle + self.english_direction.rem_euclid(360.0).to_radians();
        Launch {
            velocity: from_angle(self.angle) * (self.power * config.max_shot_speed),
            spin: from_angle(spin_angle) * (self.english * config.english_spin_scale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub velocity: Vec2,
    pub spin: Vec2,
}

/// Called ball and pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShot {
    pub ball: BallId,
    pub pocket: PocketId,
}

/// Everything fixed at the moment the shot is fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotContext {
    pub params: ShotParams,
    pub call: Option<CallShot>,
    pub is_push_out: bool,
    pub shooter: Player,
    pub phase: Phase,
    /// Snapshot so balls made mid-shot don't move the target
    pub lowest_ball_at_shot_start: Option<BallId>,
}

/// Contact bookkeeping gathered while the shot rolls out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotTracker {
    pub first_ball_hit: Option<BallId>,
    pub any_contact_made: bool,
    pub rail_contact_after_hit: bool,
    /// Counted per cushion event during the break, so a ball that hits
    /// two rails counts twice
    pub object_balls_hit_cushion_count: u8,
    pub pocketed: Vec<(BallId, PocketId)>,
    count_break_cushions: bool,
}

impl ShotTracker {
    pub fn new(phase: Phase) -> Self {
        Self {
            count_break_cushions: phase == Phase::Break,
            ..Default::default()
        }
    }
}

impl ShotTracker {
    fn cue_contact(&mut self, object: BallId) {
        self.any_contact_made = true;
        if self.first_ball_hit.is_none() {
            self.first_ball_hit = Some(object);
        }
    }

    fn cushion_contact(&mut self, ball: BallId) {
        if self.any_contact_made {
            self.rail_contact_after_hit = true;
        }
        if self.count_break_cushions && !ball.is_cue() {
            self.object_balls_hit_cushion_count =
                self.object_balls_hit_cushion_count.saturating_add(1);
        }
    }
}

impl StepObserver for ShotTracker {
    fn on_collision(&mut self, a: &Ball, b: &Ball) {
        if a.id.is_cue() {
            self.cue_contact(b.id);
        }
    }

    fn on_cushion(&mut self, ball: &Ball) {
        self.cushion_contact(ball.id);
    }

    fn on_pocket(&mut self, ball: &Ball, pocket: PocketId) {
        self.pocketed.push((ball.id, pocket));
    }
}

/// A finished shot: its context plus what happened on the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotSummary {
    pub context: ShotContext,
    pub tracker: ShotTracker,
}

impl ShotSummary {
    pub fn phase(&self) -> Phase {
        self.context.phase
    }

    pub fn shooter(&self) -> Player {
        self.context.shooter
    }

    pub fn cue_pocketed(&self) -> bool {
        self.tracker.pocketed.iter().any(|(b, _)| b.is_cue())
    }

    pub fn object_balls_pocketed(&self) -> impl Iterator<Item = (BallId, PocketId)> + '_ {
        self.tracker
            .pocketed
            .iter()
            .copied()
            .filter(|(b, _)| !b.is_cue())
    }

    pub fn any_object_pocketed(&self) -> bool {
        self.object_balls_pocketed().next().is_some()
    }

    /// Pocket `ball` dropped into this shot, if it dropped.
    pub fn pocket_of(&self, ball: BallId) -> Option<PocketId> {
        self.tracker
            .pocketed
            .iter()
            .find(|(b, _)| *b == ball)
            .map(|(_, p)| *p)
    }

    /// The called ball went into the called pocket.
    pub fn called_ball_made(&self) -> bool {
        self.context
            .call
            .is_some_and(|call| self.pocket_of(call.ball) == Some(call.pocket))
    }
}
