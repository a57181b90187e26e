// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render-side active set and its hand-off lists.

use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use super::{Animation, AnimationId, FinishOutcome};
use crate::scene::SceneGraph;
use crate::trace::{AnimationFinishedEvent, Tracer};

/// Posted to the producer when an animation leaves the active set on its
/// own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationFinished {
    /// Which animation.
    pub id: AnimationId,
    /// How it ended.
    pub outcome: FinishOutcome,
}

/// Animations waiting to enter or leave the active set.
///
/// Shared by both threads behind a mutex. Critical sections only push,
/// remove or swap out the lists.
#[derive(Debug, Default)]
pub(crate) struct PendingAnimations {
    started: Vec<Animation>,
    stopped: Vec<AnimationId>,
}

impl PendingAnimations {
    pub(crate) fn start(&mut self, animation: Animation) {
        self.started.push(animation);
    }

    /// Requests removal. An animation that was never absorbed is dropped
    /// right here and `true` is returned.
    pub(crate) fn stop(&mut self, id: AnimationId) -> bool {
        if let Some(pos) = self.started.iter().position(|a| a.id == id) {
            self.started.swap_remove(pos);
            true
        } else {
            self.stopped.push(id);
            false
        }
    }

    fn take(&mut self) -> (Vec<Animation>, Vec<AnimationId>) {
        (
            std::mem::take(&mut self.started),
            std::mem::take(&mut self.stopped),
        )
    }
}

/// The set of active animations, owned by the render thread.
#[derive(Debug)]
pub struct AnimationEngine {
    active: Vec<Animation>,
    pending: Arc<Mutex<PendingAnimations>>,
    events: Sender<AnimationFinished>,
}

impl AnimationEngine {
    pub(crate) fn new(
        pending: Arc<Mutex<PendingAnimations>>,
        events: Sender<AnimationFinished>,
    ) -> Self {
        Self {
            active: Vec::new(),
            pending,
            events,
        }
    }

    /// Returns the number of active animations.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Returns the active animation with the given id.
    #[must_use]
    pub fn get(&self, id: AnimationId) -> Option<&Animation> {
        self.active.iter().find(|a| a.id == id)
    }

    /// Moves requested starts into the active set and removes requested
    /// stops. Returns how many animations started.
    pub fn absorb(&mut self) -> usize {
        let (started, stopped) = self.pending.lock().take();
        if !stopped.is_empty() {
            self.active.retain_mut(|a| {
                if stopped.contains(&a.id) {
                    a.stop();
                    false
                } else {
                    true
                }
            });
        }
        let count = started.len();
        self.active.extend(started.into_iter().map(|mut a| {
            a.begin();
            a
        }));
        count
    }

    /// Advances every active animation to `now` and retires those that
    /// finished, posting an [`AnimationFinished`] for each. Returns how many
    /// finished.
    pub fn advance(
        &mut self,
        now: f64,
        scene: &mut SceneGraph,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        let mut finished = 0;
        let events = &self.events;
        self.active.retain_mut(|a| {
            let Some(outcome) = a.advance(now, scene) else {
                return true;
            };
            finished += 1;
            tracer.animation_finished(&AnimationFinishedEvent {
                frame_index,
                id: a.id,
                outcome,
            });
            // A missing producer has nobody left to notify.
            _ = events.send(AnimationFinished { id: a.id, outcome });
            false
        });
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationConfig, AnimationHandle, AnimationState};
    use crate::registry::NodeKind;
    use crate::scene::NodeId;

    fn animation(id: u64, config: &AnimationConfig) -> Animation {
        let handle = AnimationHandle {
            id: AnimationId(id),
            node: NodeId::new(0, 0),
            prop: NodeKind::Rect.lookup("opacity").unwrap(),
        };
        Animation::new(handle, config)
    }

    fn engine() -> (
        AnimationEngine,
        Arc<Mutex<PendingAnimations>>,
        crossbeam_channel::Receiver<AnimationFinished>,
    ) {
        let pending = Arc::new(Mutex::new(PendingAnimations::default()));
        let (tx, rx) = crossbeam_channel::unbounded();
        (AnimationEngine::new(Arc::clone(&pending), tx), pending, rx)
    }

    #[test]
    fn stop_before_absorb_never_activates() {
        let (mut engine, pending, events) = engine();
        let mut scene = SceneGraph::new();
        scene.create(NodeId::new(0, 0), NodeKind::Rect).unwrap();

        pending.lock().start(animation(1, &AnimationConfig::new(1.0, 0.0, 1.0)));
        assert!(pending.lock().stop(AnimationId(1)), "removed from pending list");
        assert_eq!(engine.absorb(), 0);
        engine.advance(0.5, &mut scene, 0, &mut Tracer::none());
        assert_eq!(engine.active_len(), 0);
        assert!(events.try_recv().is_err(), "no completion event");
    }

    #[test]
    fn completion_posts_event() {
        let (mut engine, pending, events) = engine();
        let mut scene = SceneGraph::new();
        scene.create(NodeId::new(0, 0), NodeKind::Rect).unwrap();

        pending.lock().start(animation(7, &AnimationConfig::new(1.0, 0.0, 1.0)));
        assert_eq!(engine.absorb(), 1);
        let absorbed = engine.get(AnimationId(7)).map(Animation::state);
        assert_eq!(absorbed, Some(AnimationState::Active), "absorbing starts it");
        assert_eq!(engine.advance(0.0, &mut scene, 0, &mut Tracer::none()), 0);
        assert!(engine.get(AnimationId(7)).is_some(), "still active");
        assert_eq!(engine.advance(1.0, &mut scene, 1, &mut Tracer::none()), 1);
        assert_eq!(
            events.try_recv(),
            Ok(AnimationFinished {
                id: AnimationId(7),
                outcome: FinishOutcome::Completed
            })
        );
        assert_eq!(engine.active_len(), 0);
    }

    #[test]
    fn stop_after_absorb_removes_silently() {
        let (mut engine, pending, events) = engine();
        let mut scene = SceneGraph::new();
        scene.create(NodeId::new(0, 0), NodeKind::Rect).unwrap();

        pending.lock().start(animation(2, &AnimationConfig::new(1.0, 0.0, 1.0)));
        engine.absorb();
        engine.advance(0.0, &mut scene, 0, &mut Tracer::none());
        assert!(!pending.lock().stop(AnimationId(2)), "already absorbed");
        engine.absorb();
        assert_eq!(engine.active_len(), 0);
        assert!(events.try_recv().is_err(), "stopping posts nothing");
    }
}
