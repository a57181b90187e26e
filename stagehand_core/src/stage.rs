// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The producer and render endpoints of a stage.
//!
//! [`stage`] builds a connected [`Producer`] and [`Renderer`]. Each is `Send`
//! and is meant to be owned by exactly one thread:
//!
//! - The **producer** validates edits, turns them into queued records, tears
//!   retired records down, and runs animation completion callbacks.
//! - The **renderer** owns the [`SceneGraph`] and runs one frame per call to
//!   [`Renderer::frame`].
//!
//! ```text
//!   Producer                                   Renderer::frame(now)
//!   ────────                                   ────────────────────
//!   create_node / set_property / ...  ──►      1. absorb started/stopped animations
//!   start_animation / stop_animation  ──►      2. run frees deferred last frame
//!                                              3. drain + apply the update queue
//!   teardown()          ◄── retired records    4. advance animations
//!   dispatch_events()   ◄── finished events    5. evaluate dirty channels
//! ```
//!
//! Starting an animation goes through a short mutex-guarded list instead of
//! the update queue. The renderer absorbs that list before draining the
//! queue, so by the time an animation first advances every edit enqueued
//! before it was requested has been applied.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::animation::{
    Animation, AnimationConfig, AnimationEngine, AnimationFinished, AnimationHandle, AnimationId,
    Callback, FinishOutcome, PendingAnimations,
};
use crate::backend::{GpuResources, ResourceHandle};
use crate::error::StageError;
use crate::property::{PropertyKind, PropertyValue};
use crate::queue::{
    self, QueueStats, RecordOutcome, RetireReceiver, UpdateOp, UpdateReceiver, UpdateRecord,
    UpdateSender,
};
use crate::registry::{NodeKind, PropertyId, PropertySpec};
use crate::scene::{FrameChanges, NodeId, NodeRef, SceneGraph};
use crate::time::{HostTime, Timebase};
use crate::trace::{FrameBeginEvent, FrameSummary, TeardownEvent, Tracer};

/// Configuration for a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageConfig {
    /// Records the update queue holds before [`Producer`] calls wait.
    pub queue_capacity: usize,
    /// Longest a [`Producer`] call waits for room in a full queue before
    /// failing with [`StageError::QueueFull`].
    pub push_timeout: Duration,
    /// Conversion for [`Renderer::frame_at`].
    pub timebase: Timebase,
}

impl StageConfig {
    /// Default capacity and push timeout, with nanosecond ticks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue_capacity: 4096,
            push_timeout: Duration::from_secs(1),
            timebase: Timebase::NANOS,
        }
    }

    /// Returns this configuration with a different queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Returns this configuration with a different push timeout.
    #[must_use]
    pub const fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    /// Returns this configuration with a different timebase.
    #[must_use]
    pub const fn with_timebase(mut self, timebase: Timebase) -> Self {
        self.timebase = timebase;
        self
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a connected producer/renderer pair.
#[must_use]
pub fn stage<G: GpuResources>(config: StageConfig, gpu: G) -> (Producer, Renderer<G>) {
    let (updates, receiver, retired) = queue::channel(config.queue_capacity, config.push_timeout);
    let (event_tx, events) = crossbeam_channel::unbounded();
    let pending = Arc::new(Mutex::new(PendingAnimations::default()));
    let producer = Producer {
        updates,
        retired,
        events,
        finished: Vec::new(),
        pending: Arc::clone(&pending),
        slots: SlotAllocator::default(),
        created: HashSet::new(),
        running: HashSet::new(),
        callbacks: HashMap::new(),
        next_animation: 0,
        stats: QueueStats::default(),
    };
    let renderer = Renderer {
        scene: SceneGraph::new(),
        updates: receiver,
        engine: AnimationEngine::new(pending, event_tx),
        gpu,
        timebase: config.timebase,
        frame_index: 0,
    };
    (producer, renderer)
}

/// Producer-side node slot allocation.
///
/// A slot is marked dead when its node is destroyed but only returns to the
/// free list when the destroy record has been torn down, so no new node can
/// share a slot with records still in flight for the old one.
#[derive(Debug, Default)]
struct SlotAllocator {
    generation: Vec<u32>,
    live: Vec<bool>,
    free_list: Vec<u32>,
}

impl SlotAllocator {
    fn allocate(&mut self) -> NodeId {
        if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] = self.generation[i].wrapping_add(1);
            self.live[i] = true;
            NodeId::new(idx, self.generation[i])
        } else {
            let idx = u32::try_from(self.live.len()).unwrap_or(u32::MAX);
            self.generation.push(0);
            self.live.push(true);
            NodeId::new(idx, 0)
        }
    }

    fn is_live(&self, id: NodeId) -> bool {
        let i = id.idx as usize;
        self.live.get(i).copied().unwrap_or(false) && self.generation[i] == id.generation
    }

    /// Marks a live node dead. Returns `false` if it already was.
    fn kill(&mut self, id: NodeId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.live[id.idx as usize] = false;
        true
    }

    fn release(&mut self, idx: u32) {
        self.free_list.push(idx);
    }
}

/// The producer endpoint: validates edits and queues them for the render
/// thread.
///
/// Configuration mistakes are returned as [`StageError`]s with nothing
/// queued. Everything else (edits racing with destruction, removing a child
/// that is already gone) is absorbed on the render thread and shows up only
/// in [`QueueStats`].
pub struct Producer {
    updates: UpdateSender,
    retired: RetireReceiver,
    events: Receiver<AnimationFinished>,
    finished: Vec<AnimationFinished>,
    pending: Arc<Mutex<PendingAnimations>>,
    slots: SlotAllocator,
    created: HashSet<AnimationId>,
    running: HashSet<AnimationId>,
    callbacks: HashMap<AnimationId, Callback>,
    next_animation: u64,
    stats: QueueStats,
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("slots", &self.slots)
            .field("created", &self.created)
            .field("running", &self.running)
            .field("callbacks", &self.callbacks.len())
            .field("finished", &self.finished.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Producer {
    fn push(&mut self, record: UpdateRecord) -> Result<(), StageError> {
        self.updates.push(record)?;
        self.stats.enqueued += 1;
        Ok(())
    }

    fn lookup(
        node: &NodeRef,
        name: &str,
    ) -> Result<(PropertyId, &'static PropertySpec), StageError> {
        let kind = node.kind();
        kind.lookup(name)
            .and_then(|id| kind.spec(id).map(|spec| (id, spec)))
            .ok_or_else(|| StageError::UnknownProperty {
                kind,
                name: name.into(),
            })
    }

    /// Queues creation of a node and returns a reference to it.
    ///
    /// The node can be used in further calls right away; the render thread
    /// creates it before applying anything queued later.
    pub fn create_node(&mut self, kind: NodeKind) -> Result<NodeRef, StageError> {
        let id = self.slots.allocate();
        if let Err(err) = self.push(UpdateRecord::create(id, kind)) {
            self.slots.kill(id);
            self.slots.release(id.idx);
            return Err(err);
        }
        Ok(NodeRef::new(id, kind))
    }

    /// Queues destruction of a node.
    ///
    /// The node is detached from its parent and its children are orphaned.
    /// Records queued for it afterwards are dropped. Destroying a node twice
    /// is a no-op.
    pub fn destroy_node(&mut self, node: &NodeRef) -> Result<(), StageError> {
        if !self.slots.is_live(node.id()) {
            return Ok(());
        }
        self.push(UpdateRecord::destroy(node.id()))?;
        self.slots.kill(node.id());
        Ok(())
    }

    /// Queues a property write.
    pub fn set_property(
        &mut self,
        node: &NodeRef,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), StageError> {
        let (prop, spec) = Self::lookup(node, name)?;
        let value = value.into();
        if value.kind() != spec.kind {
            return Err(StageError::TypeMismatch {
                name: spec.name,
                expected: spec.kind,
                found: value.kind(),
            });
        }
        self.push(UpdateRecord::set(node.id(), prop, value))
    }

    /// Queues appending `child` to `group`.
    pub fn add_child(&mut self, group: &NodeRef, child: &NodeRef) -> Result<(), StageError> {
        self.insert(group, child, None)
    }

    /// Queues inserting `child` into `group` at `index`.
    ///
    /// The index is clamped to the child count when the record is applied.
    pub fn insert_child(
        &mut self,
        group: &NodeRef,
        child: &NodeRef,
        index: usize,
    ) -> Result<(), StageError> {
        self.insert(group, child, Some(index))
    }

    fn insert(
        &mut self,
        group: &NodeRef,
        child: &NodeRef,
        index: Option<usize>,
    ) -> Result<(), StageError> {
        if !group.kind().is_group() {
            return Err(StageError::NotAGroup(group.id()));
        }
        if group == child {
            return Err(StageError::InvalidChild {
                parent: group.id(),
                child: child.id(),
            });
        }
        self.push(UpdateRecord::insert(group.id(), child.clone(), index))
    }

    /// Queues removing `child` from `group`. A no-op if it is not a child by
    /// then.
    pub fn remove_child(&mut self, group: &NodeRef, child: &NodeRef) -> Result<(), StageError> {
        if !group.kind().is_group() {
            return Err(StageError::NotAGroup(group.id()));
        }
        self.push(UpdateRecord::remove(group.id(), child.id()))
    }

    /// Queues a GPU resource free. It runs at the start of the frame after
    /// the one that applies this record.
    pub fn free_resource(&mut self, handle: ResourceHandle) -> Result<(), StageError> {
        self.push(UpdateRecord::free(handle))
    }

    /// Creates an animation bound to a float property, without starting it.
    pub fn animate(&mut self, node: &NodeRef, name: &str) -> Result<AnimationHandle, StageError> {
        let (prop, spec) = Self::lookup(node, name)?;
        if spec.kind != PropertyKind::Float {
            return Err(StageError::NotAnimatable {
                name: spec.name,
                kind: spec.kind,
            });
        }
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        self.created.insert(id);
        Ok(AnimationHandle {
            id,
            node: node.id(),
            prop,
        })
    }

    /// Starts a created animation.
    pub fn start(
        &mut self,
        handle: &AnimationHandle,
        mut config: AnimationConfig,
    ) -> Result<(), StageError> {
        if !self.created.contains(&handle.id) {
            return Err(if handle.id.0 < self.next_animation {
                StageError::AlreadyStarted
            } else {
                StageError::UnknownAnimation
            });
        }
        config.validate()?;
        self.created.remove(&handle.id);
        if let Some(then) = config.then.take() {
            self.callbacks.insert(handle.id, then);
        }
        self.running.insert(handle.id);
        let animation = Animation::new(*handle, &config);
        self.pending.lock().start(animation);
        Ok(())
    }

    /// Creates and starts an animation in one step.
    pub fn start_animation(
        &mut self,
        node: &NodeRef,
        name: &str,
        config: AnimationConfig,
    ) -> Result<AnimationHandle, StageError> {
        let handle = self.animate(node, name)?;
        if let Err(err) = self.start(&handle, config) {
            self.created.remove(&handle.id);
            return Err(err);
        }
        Ok(handle)
    }

    /// Stops an animation. The property keeps its current value and the
    /// completion callback is dropped without running.
    ///
    /// Stopping an animation that already ended or was stopped is a no-op.
    /// That includes one the render thread has already finished but whose
    /// event [`dispatch_events`](Self::dispatch_events) has not yet seen: its
    /// completion callback still runs there.
    pub fn stop_animation(&mut self, handle: &AnimationHandle) {
        if self.created.remove(&handle.id) {
            return;
        }
        self.collect_events();
        if self.has_finished(handle.id) {
            return;
        }
        if self.running.remove(&handle.id) {
            self.callbacks.remove(&handle.id);
            self.pending.lock().stop(handle.id);
        }
    }

    /// Stops every animation this producer created. Animations that have
    /// already finished on the render thread keep their completion
    /// callbacks.
    pub fn clear_animations(&mut self) {
        self.created.clear();
        self.collect_events();
        let ended: HashSet<_> = self.finished.iter().map(|e| e.id).collect();
        self.callbacks.retain(|id, _| ended.contains(id));
        let stopping: Vec<_> = self
            .running
            .iter()
            .copied()
            .filter(|id| !ended.contains(id))
            .collect();
        if stopping.is_empty() {
            return;
        }
        let mut pending = self.pending.lock();
        for id in stopping {
            self.running.remove(&id);
            pending.stop(id);
        }
    }

    fn collect_events(&mut self) {
        self.finished.extend(self.events.try_iter());
    }

    fn has_finished(&self, id: AnimationId) -> bool {
        self.finished.iter().any(|e| e.id == id)
    }

    /// Returns whether the animation has been started and has not ended or
    /// been stopped, as far as this producer has been told.
    #[must_use]
    pub fn is_running(&self, handle: &AnimationHandle) -> bool {
        self.running.contains(&handle.id)
    }

    /// Runs completion callbacks for animations that finished since the last
    /// call. Returns how many callbacks ran.
    pub fn dispatch_events(&mut self) -> usize {
        self.collect_events();
        let mut ran = 0;
        for event in std::mem::take(&mut self.finished) {
            self.running.remove(&event.id);
            let Some(then) = self.callbacks.remove(&event.id) else {
                continue;
            };
            if event.outcome == FinishOutcome::Completed {
                then();
                ran += 1;
            }
        }
        ran
    }

    /// Drops every record the render thread has retired, releasing whatever
    /// they carried back, and recycles the slots of destroyed nodes.
    /// Returns how many records were torn down.
    pub fn teardown(&mut self, tracer: &mut Tracer<'_>) -> usize {
        let mut event = TeardownEvent::default();
        for record in self.retired.try_iter() {
            match record.outcome() {
                RecordOutcome::Applied => self.stats.applied += 1,
                RecordOutcome::Dropped(_) => self.stats.dropped += 1,
                RecordOutcome::Pending => {}
            }
            if let (UpdateOp::DestroyNode, Some(id)) = (record.op(), record.target()) {
                self.slots.release(id.idx);
                event.slots_freed += 1;
            }
            self.stats.torn_down += 1;
            event.records += 1;
        }
        if event.records > 0 {
            tracer.teardown(&event);
        }
        event.records
    }

    /// Returns the queue counters.
    #[must_use]
    pub const fn stats(&self) -> QueueStats {
        self.stats
    }
}

/// The render endpoint: owns the scene graph and runs frames.
#[derive(Debug)]
pub struct Renderer<G> {
    scene: SceneGraph,
    updates: UpdateReceiver,
    engine: AnimationEngine,
    gpu: G,
    timebase: Timebase,
    frame_index: u64,
}

impl<G: GpuResources> Renderer<G> {
    /// Runs one frame at time `now` (seconds) and returns what changed.
    pub fn frame(&mut self, now: f64, tracer: &mut Tracer<'_>) -> FrameChanges {
        let frame_index = self.frame_index;
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            now,
            queued: self.updates.len(),
        });

        let animations_started = self.engine.absorb();

        let frees = self.scene.take_frees();
        for handle in &frees {
            self.gpu.free(*handle);
        }

        let drained = self.updates.drain(&mut self.scene, frame_index, tracer);
        let animations_finished = self
            .engine
            .advance(now, &mut self.scene, frame_index, tracer);
        let changes = self.scene.evaluate();

        tracer.frame_summary(&FrameSummary {
            frame_index,
            now,
            animations_started,
            frees: frees.len(),
            applied: drained.applied,
            dropped: drained.dropped,
            animations_active: self.engine.active_len(),
            animations_finished,
        });
        self.frame_index += 1;
        changes
    }

    /// Runs one frame at a host tick time, converted with the stage's
    /// timebase.
    pub fn frame_at(&mut self, time: HostTime, tracer: &mut Tracer<'_>) -> FrameChanges {
        self.frame(time.to_secs(self.timebase), tracer)
    }

    /// Schedules a GPU resource free for the start of the next frame.
    pub fn defer_free(&mut self, handle: ResourceHandle) {
        self.scene.schedule_free(handle);
    }

    /// Allocates a GPU resource.
    pub fn allocate_resource(&mut self) -> ResourceHandle {
        self.gpu.allocate()
    }
}

impl<G> Renderer<G> {
    /// Returns the scene graph.
    #[must_use]
    pub const fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Returns the animation engine.
    #[must_use]
    pub const fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    /// Returns the GPU resource collaborator.
    #[must_use]
    pub const fn gpu(&self) -> &G {
        &self.gpu
    }

    /// Returns the number of frames run so far.
    #[must_use]
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
