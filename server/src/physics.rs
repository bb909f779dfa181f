//! Fixed-substep table physics.
//!
//! One frame is `sub_steps` identical sub-steps. Each sub-step moves every
//! active ball (spin, friction, integration, cushions, pockets, stop check)
//! and then resolves ball-ball contacts, cue-ball pairs first.
//!
//! Stepping is total and deterministic: the same balls and options always
//! produce the same result, which the trajectory preview relies on.

use crate::ball::{Ball, BallSet};
use crate::table::{PocketId, PocketKind, Table};
use tenball_shared::config::PhysicsConfig;
use tenball_shared::vec2::{dot, length, normalize, vec2};

/// Receives contact notifications while the stepper runs.
///
/// Balls are passed after the contact has been resolved.
pub trait StepObserver {
    /// `a` and `b` touched. `a` is the cue ball for cue pairs.
    fn on_collision(&mut self, _a: &Ball, _b: &Ball) {}
    fn on_cushion(&mut self, _ball: &Ball) {}
    fn on_pocket(&mut self, _ball: &Ball, _pocket: PocketId) {}
}

impl StepObserver for () {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOptions {
    /// When false the cue ball rolls over pocket mouths instead of dropping.
    pub capture_cue: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self { capture_cue: true }
    }
}

/// Advances a `BallSet` on a fixed table with precomputed per-sub-step
/// coefficients.
#[derive(Debug, Clone)]
pub struct Stepper {
    table: Table,
    config: PhysicsConfig,
    inv_sub_steps: f64,
    friction_per_sub: f64,
    spin_decay_per_sub: f64,
    cushion_restitution: f64,
}

impl Stepper {
    pub fn new(table: Table, config: PhysicsConfig) -> Self {
        let sub_steps = config.sub_steps.max(1) as f64;
        Self {
            inv_sub_steps: 1.0 / sub_steps,
            friction_per_sub: config.friction.powf(1.0 / sub_steps),
            spin_decay_per_sub: config.spin_decay.powf(1.0 / sub_steps),
            cushion_restitution: config.rail_friction * config.cushion_bounce,
            table,
            config,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advance one frame. Returns whether any active ball is still moving.
    pub fn step_frame(
        &self,
        balls: &mut BallSet,
        options: StepOptions,
        observer: &mut impl StepObserver,
    ) -> bool {
        for _ in 0..self.config.sub_steps {
            self.sub_step(balls, options, observer);
        }
        balls.any_moving()
    }

    pub fn sub_step(
        &self,
        balls: &mut BallSet,
        options: StepOptions,
        observer: &mut impl StepObserver,
    ) {
        for ball in balls.iter_mut() {
            if ball.is_active() {
                self.advance_ball(ball, options, observer);
            }
        }
        self.resolve_collisions(balls, observer);
    }

    fn advance_ball(
        &self,
        ball: &mut Ball,
        options: StepOptions,
        observer: &mut impl StepObserver,
    ) {
        // English acts as a small extra acceleration that fades out
        ball.velocity += ball.spin * self.config.max_spin;
        ball.spin *= self.spin_decay_per_sub;

        ball.velocity *= self.friction_per_sub;
        ball.position += ball.velocity * self.inv_sub_steps;

        self.bounce_cushions(ball, observer);

        if options.capture_cue || !ball.id.is_cue() {
            if let Some(pocket) = self.capture_pocket(ball) {
                ball.pocket(pocket);
                observer.on_pocket(ball, pocket);
                return;
            }
        }

        if ball.moving
            && ball.velocity.x.abs() < self.config.stop_speed
            && ball.velocity.y.abs() < self.config.stop_speed
        {
            ball.halt();
        }

        let speed = length(ball.velocity);
        ball.rotation_speed = speed / self.table.ball_radius();
        ball.rotation = (ball.rotation + ball.rotation_speed * self.inv_sub_steps)
            % std::f64::consts::TAU;
    }

    fn bounce_cushions(&self, ball: &mut Ball, observer: &mut impl StepObserver) {
        let bounds = self.table.playable();
        let restitution = self.cushion_restitution;
        let decay = self.config.spin_decay;
        let mut hits = 0;

        if ball.position.x < bounds.left {
            ball.position.x = bounds.left;
            ball.velocity.x = ball.velocity.x.abs() * restitution;
            ball.spin.x *= decay;
            hits += 1;
        } else if ball.position.x > bounds.right {
            ball.position.x = bounds.right;
            ball.velocity.x = -ball.velocity.x.abs() * restitution;
            ball.spin.x *= decay;
            hits += 1;
        }

        if ball.position.y < bounds.top {
            ball.position.y = bounds.top;
            ball.velocity.y = ball.velocity.y.abs() * restitution;
            ball.spin.y *= decay;
            hits += 1;
        } else if ball.position.y > bounds.bottom {
            ball.position.y = bounds.bottom;
            ball.velocity.y = -ball.velocity.y.abs() * restitution;
            ball.spin.y *= decay;
            hits += 1;
        }

        for _ in 0..hits {
            observer.on_cushion(ball);
        }
    }

    /// Pocket that swallows `ball` this sub-step, if any. The ball must be
    /// heading into the pocket, not just passing through or resting in its
    /// mouth.
    fn capture_pocket(&self, ball: &Ball) -> Option<PocketId> {
        let speed = length(ball.velocity);
        if speed == 0.0 {
            return None;
        }
        for pocket in &self.table.pockets {
            let to_pocket = pocket.center - ball.position;
            if length(to_pocket) >= pocket.capture_radius() {
                continue;
            }
            let radial = dot(ball.velocity, normalize(to_pocket));
            let threshold = match pocket.kind {
                PocketKind::Corner => self.config.corner_approach_dot,
                PocketKind::Side => self.config.side_approach_dot,
            };
            if radial / speed <= threshold || radial <= self.config.min_radial_speed {
                continue;
            }
            return Some(pocket.id);
        }
        None
    }

    fn resolve_collisions(&self, balls: &mut BallSet, observer: &mut impl StepObserver) {
        let n = balls.len();
        for j in 1..n {
            self.resolve_pair(balls, 0, j, observer);
        }
        for i in 1..n {
            for j in (i + 1)..n {
                self.resolve_pair(balls, i, j, observer);
            }
        }
    }

    fn resolve_pair(
        &self,
        balls: &mut BallSet,
        i: usize,
        j: usize,
        observer: &mut impl StepObserver,
    ) {
        let Some((a, b)) = balls.get_two_mut(i, j) else {
            return;
        };
        if !a.is_active() || !b.is_active() {
            return;
        }

        let diameter = self.table.ball_diameter;
        let delta = b.position - a.position;
        let dist = length(delta);
        if dist >= diameter {
            return;
        }
        let normal = if dist > 0.0 {
            delta * (1.0 / dist)
        } else {
            vec2(1.0, 0.0)
        };

        let push = normal * ((diameter - dist) / 2.0);
        a.position -= push;
        b.position += push;

        let approach = dot(a.velocity - b.velocity, normal);
        if approach >= 0.0 {
            let impulse = approach.max(self.config.min_impulse);
            a.velocity -= normal * impulse;
            b.velocity += normal * impulse;

            let transfer = (dot(a.spin, normal) - dot(b.spin, normal)) * self.config.spin_transfer;
            a.spin -= normal * transfer;
            b.spin += normal * transfer;
            a.spin *= self.config.collision_spin_damping;
            b.spin *= self.config.collision_spin_damping;
        }

        a.moving = true;
        b.moving = true;
        observer.on_collision(a, b);
    }
}
