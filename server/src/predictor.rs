//! Aim preview: the live stepper run ahead of time on a private copy of the
//! balls.

use std::collections::BTreeMap;

use crate::ball::{Ball, BallId, BallSet, BALL_COUNT};
use crate::physics::{StepObserver, StepOptions, Stepper};
use crate::shot::Launch;
use crate::table::PocketId;
use tenball_shared::vec2::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Collision { with: BallId },
    Cushion,
    Pocketed { pocket: PocketId },
}

/// Notable point on a path. `index` points into `Polyline::points`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub index: usize,
    pub kind: MarkerKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub markers: Vec<Marker>,
}

impl Polyline {
    fn push(&mut self, p: Vec2) {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    fn mark(&mut self, p: Vec2, kind: MarkerKind) {
        self.points.push(p);
        self.markers.push(Marker {
            index: self.points.len() - 1,
            kind,
        });
    }

    pub fn end(&self) -> Option<Vec2> {
        self.points.last().copied()
    }
}

/// Records one path per ball. Contact points are inserted as they happen so
/// markers sit exactly where the contact was.
struct PathRecorder {
    paths: Vec<Polyline>,
    moved: [bool; BALL_COUNT],
}

impl PathRecorder {
    fn new(balls: &BallSet) -> Self {
        Self {
            paths: balls
                .iter()
                .map(|b| Polyline {
                    points: if b.is_active() { vec![b.position] } else { Vec::new() },
                    markers: Vec::new(),
                })
                .collect(),
            moved: [false; BALL_COUNT],
        }
    }

    fn record_frame(&mut self, balls: &BallSet) {
        for ball in balls.active() {
            let path = &mut self.paths[ball.id.index()];
            let before = path.points.len();
            path.push(ball.position);
            if path.points.len() != before {
                self.moved[ball.id.index()] = true;
            }
        }
    }

    fn finish(self) -> BTreeMap<BallId, Polyline> {
        let PathRecorder { paths, moved } = self;
        paths
            .into_iter()
            .enumerate()
            .filter(|(i, _)| moved[*i])
            .map(|(i, path)| (BallId(i as u8), path))
            .collect()
    }
}

impl StepObserver for PathRecorder {
    fn on_collision(&mut self, a: &Ball, b: &Ball) {
        self.paths[a.id.index()].mark(a.position, MarkerKind::Collision { with: b.id });
        self.paths[b.id.index()].mark(b.position, MarkerKind::Collision { with: a.id });
    }

    fn on_cushion(&mut self, ball: &Ball) {
        self.paths[ball.id.index()].mark(ball.position, MarkerKind::Cushion);
        self.moved[ball.id.index()] = true;
    }

    fn on_pocket(&mut self, ball: &Ball, pocket: PocketId) {
        self.paths[ball.id.index()].mark(ball.position, MarkerKind::Pocketed { pocket });
        self.moved[ball.id.index()] = true;
    }
}

fn settled(balls: &BallSet, rest_speed: f64) -> bool {
    balls
        .active()
        .all(|b| b.velocity.x.abs() < rest_speed && b.velocity.y.abs() < rest_speed)
}

/// Predict where every ball goes if the cue ball is launched with `launch`.
///
/// `balls` is never modified. With `ignore_cue_pocket` the cue ball rolls
/// over pocket mouths so its line stays visible. Only balls that moved are
/// returned.
pub fn predict(
    stepper: &Stepper,
    balls: &BallSet,
    launch: Launch,
    ignore_cue_pocket: bool,
) -> BTreeMap<BallId, Polyline> {
    let mut sim = balls.clone();
    let cue = sim.cue_mut();
    cue.velocity = launch.velocity;
    cue.spin = launch.spin;
    cue.moving = true;

    let options = StepOptions {
        capture_cue: !ignore_cue_pocket,
    };
    let config = stepper.config();
    let mut recorder = PathRecorder::new(&sim);

    for _ in 0..config.prediction_max_frames {
        stepper.step_frame(&mut sim, options, &mut recorder);
        recorder.record_frame(&sim);
        if settled(&sim, config.prediction_rest_speed) {
            break;
        }
    }

    recorder.finish()
}
