// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-driven float property animation.
//!
//! An [`Animation`] drives one float property from `from` to `to` over
//! `duration` seconds, optionally repeating, reversing on alternate cycles
//! and phase-aligning with an external reference clock. Animations run on
//! the render thread: [`AnimationEngine`] advances every active animation
//! once per frame and writes straight into the scene graph.
//!
//! # States
//!
//! ```text
//!   Created ──start──► Active ──(last cycle done)──► Ended
//!      │                  │
//!      └──────stop────────┴──────────────────────► Stopped
//! ```
//!
//! Ending writes the literal `to` value, never an eased approximation.
//! Stopping leaves the property where it is and never runs the completion
//! callback.
//!
//! # Cycle folding
//!
//! When a frame lands past the end of a cycle, the remaining count is
//! decremented once and the overshoot is folded back into the next cycle.
//! If the overshoot spans further whole cycles, they are skipped without
//! touching the count, and an odd number of skipped cycles cancels the
//! direction toggle so autoreversing playback stays in phase.

mod engine;
pub mod timing;

use std::fmt;

use crate::error::StageError;
use crate::registry::PropertyId;
use crate::scene::{NodeId, SceneGraph};

pub use engine::{AnimationEngine, AnimationFinished};
pub(crate) use engine::PendingAnimations;
pub use timing::TimingFunction;

/// Identifies an animation for the lifetime of its stage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub(crate) u64);

impl fmt::Debug for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnimationId({})", self.0)
    }
}

/// A created animation bound to a float property.
///
/// Returned by [`Producer::animate`](crate::stage::Producer::animate) and
/// passed back to start or stop it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationHandle {
    pub(crate) id: AnimationId,
    pub(crate) node: NodeId,
    pub(crate) prop: PropertyId,
}

impl AnimationHandle {
    /// Returns the animation's id.
    #[must_use]
    pub const fn id(&self) -> AnimationId {
        self.id
    }

    /// Returns the node whose property is animated.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the animated property.
    #[must_use]
    pub const fn property(&self) -> PropertyId {
        self.prop
    }
}

/// How many cycles an animation plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepeatCount {
    /// A fixed number of cycles. Zero ends on the first frame.
    Times(u32),
    /// Repeat until stopped.
    Forever,
}

/// Playback direction of the current cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From `from` to `to`.
    #[default]
    Forward,
    /// From `to` back to `from`.
    Backward,
}

/// Lifecycle state of an animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Bound to a property, not yet started.
    Created,
    /// Started; advanced every frame.
    Active,
    /// Played to completion (or lost its target).
    Ended,
    /// Stopped explicitly.
    Stopped,
}

/// Why an animation left the active set on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FinishOutcome {
    /// All cycles played; the end value was written.
    Completed,
    /// The animated node was destroyed.
    TargetLost,
}

/// Completion callback, run on the producer thread.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Playback parameters for [`Producer::start`](crate::stage::Producer::start).
pub struct AnimationConfig {
    /// Start value.
    pub from: f32,
    /// End value.
    pub to: f32,
    /// Cycle length in seconds.
    pub duration: f64,
    /// Number of cycles.
    pub count: RepeatCount,
    /// Reverse direction after every completed cycle.
    pub autoreverse: bool,
    /// Easing curve.
    pub timing: TimingFunction,
    /// Called once on the producer thread when the animation completes.
    pub then: Option<Callback>,
    /// A value the property should already be passing through when the
    /// animation activates. Ignored unless strictly between `from` and `to`.
    pub zero_position: Option<f32>,
    /// External clock time (in frame-time seconds) playback is aligned to,
    /// as if the animation had been running since then.
    pub ref_time: Option<f64>,
}

impl AnimationConfig {
    /// A single linear cycle from `from` to `to`.
    #[must_use]
    pub fn new(from: f32, to: f32, duration: f64) -> Self {
        Self {
            from,
            to,
            duration,
            count: RepeatCount::Times(1),
            autoreverse: false,
            timing: TimingFunction::Linear,
            then: None,
            zero_position: None,
            ref_time: None,
        }
    }

    /// Sets the number of cycles.
    #[must_use]
    pub fn count(mut self, count: RepeatCount) -> Self {
        self.count = count;
        self
    }

    /// Enables or disables autoreverse.
    #[must_use]
    pub fn autoreverse(mut self, autoreverse: bool) -> Self {
        self.autoreverse = autoreverse;
        self
    }

    /// Sets the easing curve.
    #[must_use]
    pub fn timing(mut self, timing: TimingFunction) -> Self {
        self.timing = timing;
        self
    }

    /// Sets the completion callback.
    #[must_use]
    pub fn then(mut self, then: impl FnOnce() + Send + 'static) -> Self {
        self.then = Some(Box::new(then));
        self
    }

    /// Sets the zero position.
    #[must_use]
    pub fn zero_position(mut self, value: f32) -> Self {
        self.zero_position = Some(value);
        self
    }

    /// Sets the reference time.
    #[must_use]
    pub fn ref_time(mut self, time: f64) -> Self {
        self.ref_time = Some(time);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StageError> {
        if self.duration.is_finite() && self.duration > 0.0 {
            Ok(())
        } else {
            Err(StageError::InvalidDuration(self.duration))
        }
    }
}

impl fmt::Debug for AnimationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationConfig")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("count", &self.count)
            .field("autoreverse", &self.autoreverse)
            .field("timing", &self.timing)
            .field("then", &self.then.is_some())
            .field("zero_position", &self.zero_position)
            .field("ref_time", &self.ref_time)
            .finish()
    }
}

enum Activation {
    Wait,
    Exhausted,
    Started(f64),
}

/// A running float property animation.
#[derive(Clone, Debug)]
pub struct Animation {
    id: AnimationId,
    node: NodeId,
    prop: PropertyId,
    from: f32,
    to: f32,
    duration: f64,
    autoreverse: bool,
    timing: TimingFunction,
    zero_position: Option<f32>,
    ref_time: Option<f64>,
    remaining: RepeatCount,
    direction: Direction,
    state: AnimationState,
    start_time: Option<f64>,
    last_time: f64,
}

impl Animation {
    /// Creates an animation in the created state. The callback stays with
    /// the producer.
    pub(crate) fn new(handle: AnimationHandle, config: &AnimationConfig) -> Self {
        Self {
            id: handle.id,
            node: handle.node,
            prop: handle.prop,
            from: config.from,
            to: config.to,
            duration: config.duration,
            autoreverse: config.autoreverse,
            timing: config.timing,
            zero_position: config.zero_position,
            ref_time: config.ref_time,
            remaining: config.count,
            direction: Direction::Forward,
            state: AnimationState::Created,
            start_time: None,
            last_time: 0.0,
        }
    }

    /// Returns the animation's id.
    #[must_use]
    pub const fn id(&self) -> AnimationId {
        self.id
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> AnimationState {
        self.state
    }

    /// Returns the direction of the current cycle.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the cycles left, counting the current one.
    #[must_use]
    pub const fn remaining(&self) -> RepeatCount {
        self.remaining
    }

    /// Moves a created animation into the active state.
    pub(crate) fn begin(&mut self) {
        if self.state == AnimationState::Created {
            self.state = AnimationState::Active;
        }
    }

    /// Stops playback without writing the end value.
    pub(crate) fn stop(&mut self) {
        if matches!(self.state, AnimationState::Created | AnimationState::Active) {
            self.state = AnimationState::Stopped;
        }
    }

    fn toggle(&mut self) {
        if self.autoreverse {
            self.direction = match self.direction {
                Direction::Forward => Direction::Backward,
                Direction::Backward => Direction::Forward,
            };
        }
    }

    /// Fraction of a cycle the zero position corresponds to.
    fn zero_fraction(&self) -> Option<f64> {
        let zero = f64::from(self.zero_position?);
        let (from, to) = (f64::from(self.from), f64::from(self.to));
        ((zero - from) * (zero - to) < 0.0).then(|| (zero - from) / (to - from))
    }

    fn activate(&mut self, now: f64) -> Activation {
        let mut start = now;
        if let Some(ref_time) = self.ref_time {
            let mut diff = now - ref_time;
            if diff < 0.0 {
                return Activation::Wait;
            }
            let cycles = (diff / self.duration).floor();
            if cycles > 0.0 {
                if let RepeatCount::Times(n) = &mut self.remaining {
                    if cycles >= f64::from(*n) {
                        return Activation::Exhausted;
                    }
                    #[expect(
                        clippy::cast_possible_truncation,
                        reason = "cycles is a whole number below the remaining u32 count"
                    )]
                    let whole = cycles as u32;
                    *n -= whole;
                }
                diff -= cycles * self.duration;
                if cycles % 2.0 == 1.0 {
                    self.toggle();
                }
            }
            start -= diff;
        }
        if let Some(fraction) = self.zero_fraction() {
            start -= fraction * self.duration;
        }
        self.last_time = now;
        Activation::Started(start)
    }

    /// Advances playback to frame time `now` (seconds) and writes the new
    /// value into the scene.
    ///
    /// Returns `Some` when the animation leaves the active set this frame.
    pub fn advance(&mut self, now: f64, scene: &mut SceneGraph) -> Option<FinishOutcome> {
        if self.state != AnimationState::Active {
            return None;
        }
        if !scene.contains(self.node) {
            self.state = AnimationState::Ended;
            return Some(FinishOutcome::TargetLost);
        }
        if self.remaining == RepeatCount::Times(0) {
            return Some(self.finish(scene));
        }

        let mut start = match self.start_time {
            Some(start) => start,
            None => match self.activate(now) {
                Activation::Wait => return None,
                Activation::Exhausted => return Some(self.finish(scene)),
                Activation::Started(start) => start,
            },
        };

        // Non-monotonic input: keep the elapsed time of the previous frame.
        if now < start {
            start = now - (self.last_time - start);
        }
        self.last_time = now;

        let mut t = (now - start) / self.duration;
        if t >= 1.0 {
            let mut toggle = match &mut self.remaining {
                RepeatCount::Forever => true,
                RepeatCount::Times(n) => {
                    *n -= 1;
                    if *n == 0 {
                        self.start_time = Some(start);
                        return Some(self.finish(scene));
                    }
                    true
                }
            };
            let mut over = now - start - self.duration;
            if over >= self.duration {
                let skipped = (over / self.duration).floor();
                over -= skipped * self.duration;
                if skipped % 2.0 == 1.0 {
                    toggle = false;
                }
            }
            start = now - over;
            t = over / self.duration;
            if toggle {
                self.toggle();
            }
        }
        self.start_time = Some(start);

        let position = match self.direction {
            Direction::Forward => t,
            Direction::Backward => 1.0 - t,
        };
        let (from, to) = (f64::from(self.from), f64::from(self.to));
        #[expect(
            clippy::cast_possible_truncation,
            reason = "property values are stored as f32"
        )]
        let value = (from + (to - from) * self.timing.eval(position)) as f32;
        if scene.write_float(self.node, self.prop, value) {
            None
        } else {
            self.state = AnimationState::Ended;
            Some(FinishOutcome::TargetLost)
        }
    }

    /// Writes the literal end value and ends playback.
    fn finish(&mut self, scene: &mut SceneGraph) -> FinishOutcome {
        self.state = AnimationState::Ended;
        if scene.write_float(self.node, self.prop, self.to) {
            FinishOutcome::Completed
        } else {
            FinishOutcome::TargetLost
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Released;
    use crate::registry::NodeKind;

    const RECT: NodeId = NodeId::new(0, 0);

    fn setup(config: &AnimationConfig) -> (SceneGraph, Animation) {
        let mut scene = SceneGraph::new();
        scene.create(RECT, NodeKind::Rect).unwrap();
        let handle = AnimationHandle {
            id: AnimationId(1),
            node: RECT,
            prop: NodeKind::Rect.lookup("x").unwrap(),
        };
        let mut anim = Animation::new(handle, config);
        anim.begin();
        (scene, anim)
    }

    fn x(scene: &SceneGraph) -> f32 {
        scene.node(RECT).unwrap().float("x").unwrap()
    }

    fn step(
        anim: &mut Animation,
        scene: &mut SceneGraph,
        now: f64,
    ) -> (Option<FinishOutcome>, f32) {
        let outcome = anim.advance(now, scene);
        (outcome, x(scene))
    }

    #[test]
    fn linear_single_cycle_hits_exact_end() {
        let (mut scene, mut anim) = setup(&AnimationConfig::new(0.0, 10.0, 1.0));
        assert_eq!(step(&mut anim, &mut scene, 10.0), (None, 0.0));
        assert_eq!(step(&mut anim, &mut scene, 10.5), (None, 5.0));
        assert_eq!(
            step(&mut anim, &mut scene, 11.0),
            (Some(FinishOutcome::Completed), 10.0)
        );
        assert_eq!(anim.state(), AnimationState::Ended);
        assert_eq!(anim.advance(12.0, &mut scene), None, "ended is terminal");
    }

    #[test]
    fn autoreverse_visits_end_start_end() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0)
            .count(RepeatCount::Times(3))
            .autoreverse(true);
        let (mut scene, mut anim) = setup(&config);
        assert_eq!(step(&mut anim, &mut scene, 5.0), (None, 0.0));
        assert_eq!(step(&mut anim, &mut scene, 6.0), (None, 10.0));
        assert_eq!(anim.direction(), Direction::Backward);
        assert_eq!(step(&mut anim, &mut scene, 6.5), (None, 5.0));
        assert_eq!(step(&mut anim, &mut scene, 7.0), (None, 0.0));
        assert_eq!(anim.direction(), Direction::Forward);
        assert_eq!(
            step(&mut anim, &mut scene, 8.0),
            (Some(FinishOutcome::Completed), 10.0)
        );
    }

    #[test]
    fn repeat_without_autoreverse_restarts_forward() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0).count(RepeatCount::Times(2));
        let (mut scene, mut anim) = setup(&config);
        step(&mut anim, &mut scene, 0.0);
        assert_eq!(step(&mut anim, &mut scene, 1.25), (None, 2.5));
        assert_eq!(anim.direction(), Direction::Forward);
        assert_eq!(anim.remaining(), RepeatCount::Times(1));
    }

    #[test]
    fn ref_time_aligns_phase() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0)
            .count(RepeatCount::Forever)
            .autoreverse(true)
            .ref_time(100.0);

        let (mut scene, mut anim) = setup(&config);
        assert_eq!(step(&mut anim, &mut scene, 102.5), (None, 5.0));
        assert_eq!(anim.direction(), Direction::Forward, "two cycles: in phase");

        let (mut scene, mut anim) = setup(&config);
        assert_eq!(step(&mut anim, &mut scene, 103.25), (None, 7.5));
        assert_eq!(anim.direction(), Direction::Backward, "three cycles: reversed");
    }

    #[test]
    fn ref_time_in_future_waits() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0).ref_time(50.0);
        let (mut scene, mut anim) = setup(&config);
        assert_eq!(step(&mut anim, &mut scene, 49.0), (None, 0.0));
        assert_eq!(anim.state(), AnimationState::Active);
        assert_eq!(step(&mut anim, &mut scene, 50.25), (None, 2.5));
    }

    #[test]
    fn ref_time_past_finite_count_ends_immediately() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0)
            .count(RepeatCount::Times(2))
            .ref_time(0.0);
        let (mut scene, mut anim) = setup(&config);
        assert_eq!(
            step(&mut anim, &mut scene, 2.0),
            (Some(FinishOutcome::Completed), 10.0)
        );
    }

    #[test]
    fn ref_time_multiple_of_duration_starts_cycle() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0)
            .count(RepeatCount::Times(5))
            .ref_time(0.0);
        let (mut scene, mut anim) = setup(&config);
        assert_eq!(step(&mut anim, &mut scene, 3.0), (None, 0.0));
        assert_eq!(anim.remaining(), RepeatCount::Times(2));
    }

    #[test]
    fn zero_position_shifts_start() {
        let config = AnimationConfig::new(0.0, 10.0, 2.0).zero_position(5.0);
        let (mut scene, mut anim) = setup(&config);
        assert_eq!(step(&mut anim, &mut scene, 1.0), (None, 5.0));
        assert_eq!(step(&mut anim, &mut scene, 1.5), (None, 7.5));
    }

    #[test]
    fn zero_position_outside_range_is_ignored() {
        let descending = AnimationConfig::new(10.0, 0.0, 1.0).zero_position(2.5);
        let (mut scene, mut anim) = setup(&descending);
        assert_eq!(step(&mut anim, &mut scene, 0.0), (None, 2.5), "descending works");

        let outside = AnimationConfig::new(0.0, 10.0, 1.0).zero_position(10.0);
        let (mut scene, mut anim) = setup(&outside);
        assert_eq!(step(&mut anim, &mut scene, 0.0), (None, 0.0));
    }

    #[test]
    fn overshoot_folds_whole_cycles() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0)
            .count(RepeatCount::Forever)
            .autoreverse(true);
        let (mut scene, mut anim) = setup(&config);
        step(&mut anim, &mut scene, 0.0);
        // 2.25 cycles later: one boundary toggles, one skipped cycle cancels it.
        assert_eq!(step(&mut anim, &mut scene, 2.25), (None, 2.5));
        assert_eq!(anim.direction(), Direction::Forward);
        // 3.5 cycles: boundary toggles, two skipped cycles keep it.
        let (mut scene, mut anim) = setup(&config);
        step(&mut anim, &mut scene, 0.0);
        assert_eq!(step(&mut anim, &mut scene, 3.5), (None, 5.0));
        assert_eq!(anim.direction(), Direction::Backward);
    }

    #[test]
    fn count_decrements_once_per_boundary_frame() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0).count(RepeatCount::Times(3));
        let (mut scene, mut anim) = setup(&config);
        step(&mut anim, &mut scene, 0.0);
        step(&mut anim, &mut scene, 2.5);
        assert_eq!(anim.remaining(), RepeatCount::Times(2));
    }

    #[test]
    fn clock_skew_keeps_previous_position() {
        let (mut scene, mut anim) = setup(&AnimationConfig::new(0.0, 10.0, 4.0));
        step(&mut anim, &mut scene, 10.0);
        assert_eq!(step(&mut anim, &mut scene, 12.0), (None, 5.0));
        // Clock jumps backwards past the start.
        assert_eq!(step(&mut anim, &mut scene, 5.0), (None, 5.0));
        assert_eq!(step(&mut anim, &mut scene, 6.0), (None, 7.5));
    }

    #[test]
    fn zero_count_ends_on_first_frame() {
        let config = AnimationConfig::new(0.0, 10.0, 1.0).count(RepeatCount::Times(0));
        let (mut scene, mut anim) = setup(&config);
        assert_eq!(
            step(&mut anim, &mut scene, 3.0),
            (Some(FinishOutcome::Completed), 10.0)
        );
    }

    #[test]
    fn destroyed_target_ends_without_write() {
        let (mut scene, mut anim) = setup(&AnimationConfig::new(0.0, 10.0, 1.0));
        anim.advance(0.0, &mut scene);
        let mut released: Vec<Released> = Vec::new();
        scene.destroy(RECT, &mut released).unwrap();
        assert_eq!(anim.advance(0.5, &mut scene), Some(FinishOutcome::TargetLost));
        assert_eq!(anim.state(), AnimationState::Ended);
    }

    #[test]
    fn created_animation_waits_for_begin() {
        let mut scene = SceneGraph::new();
        scene.create(RECT, NodeKind::Rect).unwrap();
        let handle = AnimationHandle {
            id: AnimationId(3),
            node: RECT,
            prop: NodeKind::Rect.lookup("x").unwrap(),
        };
        let mut anim = Animation::new(handle, &AnimationConfig::new(0.0, 10.0, 1.0));
        assert_eq!(anim.state(), AnimationState::Created);
        assert_eq!(step(&mut anim, &mut scene, 0.5), (None, 0.0), "not advanced");

        anim.begin();
        assert_eq!(anim.state(), AnimationState::Active);
        anim.begin();
        assert_eq!(anim.state(), AnimationState::Active, "begin is idempotent");
        anim.stop();
        anim.begin();
        assert_eq!(anim.state(), AnimationState::Stopped, "stopped is terminal");
    }

    #[test]
    fn stopped_animation_does_not_write() {
        let (mut scene, mut anim) = setup(&AnimationConfig::new(0.0, 10.0, 1.0));
        anim.stop();
        anim.stop();
        assert_eq!(anim.state(), AnimationState::Stopped);
        assert_eq!(step(&mut anim, &mut scene, 0.5), (None, 0.0));
    }

    #[test]
    fn invalid_durations_are_rejected() {
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(AnimationConfig::new(0.0, 1.0, d).validate().is_err(), "{d}");
        }
        assert!(AnimationConfig::new(0.0, 1.0, 0.1).validate().is_ok(), "positive");
    }
}
