//! Ball kinematic state and the arena that owns it.

use crate::table::PocketId;
use tenball_shared::vec2::{length_sq, Vec2};

/// Ball identifier. 0 is the cue ball, 1..=10 are object balls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallId(pub u8);

impl BallId {
    pub const CUE: BallId = BallId(0);
    pub const TEN: BallId = BallId(10);

    pub fn is_cue(self) -> bool {
        self == BallId::CUE
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Object balls in numeric order.
    pub fn object_balls() -> impl Iterator<Item = BallId> {
        (1..=OBJECT_BALL_COUNT as u8).map(BallId)
    }
}

impl std::fmt::Display for BallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_cue() {
            write!(f, "cue")
        } else {
            write!(f, "{}-ball", self.0)
        }
    }
}

pub const OBJECT_BALL_COUNT: usize = 10;
pub const BALL_COUNT: usize = OBJECT_BALL_COUNT + 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: BallId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Two-axis English accumulator
    pub spin: Vec2,
    pub visible: bool,
    pub pocketed: bool,
    pub pocketed_pocket_id: Option<PocketId>,
    pub moving: bool,
    /// Cosmetic roll angle (radians)
    pub rotation: f64,
    pub rotation_speed: f64,
}

impl Ball {
    pub fn at_rest(id: BallId, position: Vec2) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            spin: Vec2::ZERO,
            visible: true,
            pocketed: false,
            pocketed_pocket_id: None,
            moving: false,
            rotation: 0.0,
            rotation_speed: 0.0,
        }
    }

    /// A ball that is not on the table (already pocketed before play starts).
    pub fn off_table(id: BallId) -> Self {
        Self {
            visible: false,
            pocketed: true,
            ..Self::at_rest(id, Vec2::ZERO)
        }
    }

    /// On the table and taking part in stepping and collisions.
    pub fn is_active(&self) -> bool {
        self.visible && !self.pocketed
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * length_sq(self.velocity)
    }

    /// Drop the ball into `pocket`. Irreversible until the ball is spotted.
    pub fn pocket(&mut self, pocket: PocketId) {
        self.pocketed = true;
        self.visible = false;
        self.pocketed_pocket_id = Some(pocket);
        self.halt();
    }

    /// Put a ball back on the table at rest.
    pub fn respot(&mut self, position: Vec2) {
        self.position = position;
        self.pocketed = false;
        self.visible = true;
        self.pocketed_pocket_id = None;
        self.halt();
    }

    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
        self.spin = Vec2::ZERO;
        self.moving = false;
        self.rotation_speed = 0.0;
    }
}

/// Arena of all balls addressed by `BallId`. Index 0 is the cue ball.
#[derive(Debug, Clone, PartialEq)]
pub struct BallSet {
    balls: Vec<Ball>,
}

impl BallSet {
    /// Cue ball plus every object ball, all off the table.
    pub fn empty() -> Self {
        Self {
            balls: (0..BALL_COUNT as u8)
                .map(|i| Ball::off_table(BallId(i)))
                .collect(),
        }
    }

    /// Balls listed in `layout` are placed at rest; every other ball starts
    /// off the table.
    pub fn from_layout(layout: &[(BallId, Vec2)]) -> Self {
        let mut set = Self::empty();
        for &(id, pos) in layout {
            if let Some(ball) = set.get_mut(id) {
                *ball = Ball::at_rest(id, pos);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn get(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.index())
    }

    pub fn get_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(id.index())
    }

    pub fn cue(&self) -> &Ball {
        &self.balls[0]
    }

    pub fn cue_mut(&mut self) -> &mut Ball {
        &mut self.balls[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ball> {
        self.balls.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Ball> {
        self.balls.iter_mut()
    }

    pub fn as_slice(&self) -> &[Ball] {
        &self.balls
    }

    /// Two distinct balls mutably at once. `None` if `a == b` or either
    /// index is out of range.
    pub fn get_two_mut(&mut self, a: usize, b: usize) -> Option<(&mut Ball, &mut Ball)> {
        if a == b || a >= self.balls.len() || b >= self.balls.len() {
            return None;
        }
        if a < b {
            let (head, tail) = self.balls.split_at_mut(b);
            Some((&mut head[a], &mut tail[0]))
        } else {
            let (head, tail) = self.balls.split_at_mut(a);
            Some((&mut tail[0], &mut head[b]))
        }
    }

    pub fn active(&self) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(|b| b.is_active())
    }

    pub fn any_moving(&self) -> bool {
        self.balls.iter().any(|b| b.is_active() && b.moving)
    }

    /// Lowest-numbered object ball still on the table.
    pub fn lowest_object_ball(&self) -> Option<BallId> {
        self.balls
            .iter()
            .skip(1)
            .find(|b| b.is_active())
            .map(|b| b.id)
    }

    pub fn object_balls_on_table(&self) -> usize {
        self.balls.iter().skip(1).filter(|b| b.is_active()).count()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.active().map(Ball::kinetic_energy).sum()
    }
}
