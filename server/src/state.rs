//! One table: balls, stepper, rules and timed follow-ups behind the
//! operations the host drives.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tenball_shared::config::PhysicsConfig;
use tenball_shared::vec2::{distance, vec2, Vec2};

use crate::ball::{BallId, BallSet, OBJECT_BALL_COUNT};
use crate::config::MatchConfig;
use crate::error::{DecisionError, PlacementError, ShotError};
use crate::events::GameEvent;
use crate::physics::{StepOptions, Stepper};
use crate::player::Player;
use crate::predictor::{predict, Polyline};
use crate::rack::{cue_restore_position, rack_layout, spot_position};
use crate::rules::{DecisionChoice, MatchState, Phase};
use crate::schedule::{EventQueue, TimedAction};
use crate::shot::{CallShot, ShotContext, ShotParams, ShotSummary, ShotTracker};
use crate::table::Table;

/// Identifies a fired shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShotHandle(pub u64);

/// Outcome of one `advance_frame` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub frame: u64,
    pub any_moving: bool,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone)]
struct ActiveShot {
    handle: ShotHandle,
    context: ShotContext,
    tracker: ShotTracker,
    /// Pocketings already emitted as events
    reported: usize,
}

/// Central game state owned by the game loop task.
pub struct GameState {
    stepper: Stepper,
    balls: BallSet,
    match_state: MatchState,
    shot: Option<ActiveShot>,
    queue: EventQueue,
    frame: u64,
    rng: ChaCha8Rng,
    config: MatchConfig,
    next_shot_id: u64,
}

impl GameState {
    /// Fresh rack, player 1 to break.
    pub fn new(config: &MatchConfig, physics: PhysicsConfig) -> Self {
        let table = Table::standard();
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let layout = rack_layout(&table, &mut rng);
        Self {
            stepper: Stepper::new(table, physics),
            balls: BallSet::from_layout(&layout),
            match_state: MatchState::new(Player::One),
            shot: None,
            queue: EventQueue::new(),
            frame: 0,
            rng,
            config: config.clone(),
            next_shot_id: 1,
        }
    }

    /// Arranged position. Balls missing from `layout` are off the table.
    pub fn with_layout(
        config: &MatchConfig,
        physics: PhysicsConfig,
        layout: &[(BallId, Vec2)],
        match_state: MatchState,
    ) -> Self {
        Self {
            balls: BallSet::from_layout(layout),
            match_state,
            ..Self::new(config, physics)
        }
    }

    pub fn table(&self) -> &Table {
        self.stepper.table()
    }

    pub fn physics(&self) -> &PhysicsConfig {
        self.stepper.config()
    }

    pub fn balls(&self) -> &BallSet {
        &self.balls
    }

    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn shot_in_progress(&self) -> bool {
        self.shot.is_some()
    }

    /// Player the table is waiting on.
    pub fn acting_player(&self) -> Player {
        self.match_state.acting_player()
    }

    pub fn is_scheduled(&self, action: TimedAction) -> bool {
        self.queue.is_scheduled(action)
    }

    fn check_call(&self, call: CallShot) -> Result<(), ShotError> {
        if call.ball.is_cue() {
            return Err(ShotError::InvalidCall(call.ball, "the cue ball cannot be called"));
        }
        if call.ball.index() > OBJECT_BALL_COUNT {
            return Err(ShotError::InvalidCall(call.ball, "no such ball"));
        }
        if !self.balls.get(call.ball).is_some_and(|b| b.is_active()) {
            return Err(ShotError::InvalidCall(call.ball, "ball is not on the table"));
        }
        Ok(())
    }

    /// Strike the cue ball. Nothing changes if the shot is rejected.
    pub fn fire_shot(
        &mut self,
        params: ShotParams,
        call: Option<CallShot>,
        push_out: bool,
    ) -> Result<ShotHandle, ShotError> {
        self.match_state.check_can_shoot()?;
        if self.shot.is_some() {
            return Err(ShotError::ShotInProgress);
        }
        if !self.balls.cue().is_active() {
            return Err(ShotError::CueBallOffTable);
        }
        params.validate()?;
        if let Some(call) = call {
            self.check_call(call)?;
        }

        let phase = self.match_state.phase;
        self.match_state.begin_shot(push_out)?;
        let context = ShotContext {
            params,
            call,
            is_push_out: push_out,
            shooter: self.match_state.current_player,
            phase,
            lowest_ball_at_shot_start: self.balls.lowest_object_ball(),
        };

        let launch = params.launch(self.stepper.config());
        let cue = self.balls.cue_mut();
        cue.velocity = launch.velocity;
        cue.spin = launch.spin;
        cue.moving = true;

        let handle = ShotHandle(self.next_shot_id);
        self.next_shot_id += 1;
        tracing::info!(
            shot = handle.0,
            player = %context.shooter,
            angle = params.angle,
            power = params.power,
            push_out,
            "shot fired"
        );
        self.shot = Some(ActiveShot {
            handle,
            context,
            tracker: ShotTracker::new(phase),
            reported: 0,
        });
        Ok(handle)
    }

    /// Run timed actions due this frame, step the balls if a shot is
    /// rolling, and resolve the shot once everything has stopped.
    pub fn advance_frame(&mut self) -> FrameResult {
        self.frame += 1;
        let mut events = Vec::new();

        for action in self.queue.drain_due(self.frame) {
            self.run_timed(action, &mut events);
        }

        let any_moving = match self.shot.as_mut() {
            Some(shot) => {
                let moving = self.stepper.step_frame(
                    &mut self.balls,
                    StepOptions::default(),
                    &mut shot.tracker,
                );
                for &(ball, pocket) in &shot.tracker.pocketed[shot.reported..] {
                    events.push(GameEvent::Pocketed { ball, pocket });
                }
                shot.reported = shot.tracker.pocketed.len();
                moving
            }
            None => false,
        };

        if !any_moving {
            if let Some(shot) = self.shot.take() {
                self.finish_shot(shot, &mut events);
            }
        }

        FrameResult {
            frame: self.frame,
            any_moving,
            events,
        }
    }

    fn finish_shot(&mut self, shot: ActiveShot, events: &mut Vec<GameEvent>) {
        let summary = ShotSummary {
            context: shot.context,
            tracker: shot.tracker,
        };
        let res = self.match_state.resolve_shot(&summary);
        for foul in &res.fouls {
            tracing::debug!(shot = shot.handle.0, ?foul, "foul");
        }
        tracing::info!(
            shot = shot.handle.0,
            player = %summary.shooter(),
            pocketed = summary.tracker.pocketed.len(),
            fouls = res.fouls.len(),
            frame = self.frame,
            "shot resolved"
        );
        events.extend(res.events);

        if res.spot_ten {
            let position = spot_position(&self.balls, self.stepper.table(), BallId::TEN);
            if let Some(ten) = self.balls.get_mut(BallId::TEN) {
                ten.respot(position);
            }
            tracing::debug!(x = position.x, y = position.y, "10-ball spotted");
            events.push(GameEvent::BallSpotted {
                ball: BallId::TEN,
                position,
            });
        }

        if res.restore_cue {
            self.queue.schedule(
                self.frame + self.config.scratch_restore_delay_frames,
                TimedAction::RestoreCueBall,
            );
        }

        if let Some(winner) = self.match_state.winner {
            tracing::info!(%winner, scores = ?self.match_state.scores, "game over");
            if let Some(delay) = self.config.rerack_delay_frames {
                self.queue.schedule(self.frame + delay, TimedAction::Rerack);
            }
        }
    }

    fn run_timed(&mut self, action: TimedAction, events: &mut Vec<GameEvent>) {
        match action {
            TimedAction::RestoreCueBall => {
                if self.balls.cue().is_active() {
                    return;
                }
                let position = cue_restore_position(&self.balls, self.stepper.table());
                self.balls.cue_mut().respot(position);
                tracing::debug!(x = position.x, y = position.y, "cue ball restored");
                events.push(GameEvent::CueBallRestored { position });
            }
            TimedAction::Rerack => events.push(self.rerack()),
        }
    }

    /// Rack the balls for the next game. The break alternates and scores
    /// carry over. Abandons any shot in flight.
    pub fn rerack(&mut self) -> GameEvent {
        self.match_state.next_rack();
        let layout = rack_layout(self.stepper.table(), &mut self.rng);
        self.balls = BallSet::from_layout(&layout);
        self.shot = None;
        self.queue.clear();
        tracing::info!(
            rack = self.match_state.rack_number,
            breaker = %self.match_state.breaker,
            "re-racked"
        );
        GameEvent::Reracked {
            rack: self.match_state.rack_number,
            breaker: self.match_state.breaker,
        }
    }

    /// Preview a shot without touching the live table.
    pub fn predict_trajectories(
        &self,
        params: ShotParams,
        ignore_cue_pocket: bool,
    ) -> Result<BTreeMap<BallId, Polyline>, ShotError> {
        if self.shot.is_some() {
            return Err(ShotError::ShotInProgress);
        }
        if !self.balls.cue().is_active() {
            return Err(ShotError::CueBallOffTable);
        }
        params.validate()?;
        let launch = params.launch(self.stepper.config());
        Ok(predict(&self.stepper, &self.balls, launch, ignore_cue_pocket))
    }

    /// Whether the cue ball could be placed at `(x, y)` right now.
    pub fn check_cue_placement(&self, x: f64, y: f64) -> Result<(), PlacementError> {
        if self.shot.is_some() || !self.match_state.can_place_cue() {
            return Err(PlacementError::NotAllowed);
        }
        let p = vec2(x, y);
        let table = self.stepper.table();
        if !p.is_finite() || !table.playable().contains(p) {
            return Err(PlacementError::OutsideTable { x, y });
        }
        if self.match_state.phase == Phase::Break && !table.kitchen.contains(p) {
            return Err(PlacementError::OutsideKitchen);
        }
        if let Some(pocket) = table.pocket_at(p) {
            return Err(PlacementError::InPocket(pocket));
        }
        if let Some(other) = self
            .balls
            .active()
            .find(|b| !b.id.is_cue() && distance(b.position, p) < table.ball_diameter)
        {
            return Err(PlacementError::Overlapping(other.id));
        }
        Ok(())
    }

    /// Move the cue ball by hand. Cancels a pending automatic restore.
    pub fn place_cue_ball(&mut self, x: f64, y: f64) -> Result<(), PlacementError> {
        self.check_cue_placement(x, y)?;
        self.balls.cue_mut().respot(vec2(x, y));
        self.queue.cancel(TimedAction::RestoreCueBall);
        Ok(())
    }

    /// Settle a pending push-out or illegal-pocket decision.
    pub fn decide(&mut self, choice: DecisionChoice) -> Result<Vec<GameEvent>, DecisionError> {
        if self.shot.is_some() {
            return Err(DecisionError::ShotInProgress);
        }
        let decider = self.match_state.acting_player();
        let events = self.match_state.apply_decision(choice)?;
        tracing::info!(%decider, ?choice, "decision");
        Ok(events)
    }
}
