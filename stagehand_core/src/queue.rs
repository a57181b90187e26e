// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The ordered, two-phase update queue.
//!
//! Every scene edit the producer makes becomes an [`UpdateRecord`] pushed
//! onto a bounded FIFO channel. The render thread drains the records present
//! at the start of the drain, applies each one to the [`SceneGraph`] in
//! order, and sends every record (applied or dropped) back on the retire
//! channel. The producer tears records down by dropping them on its own
//! thread.
//!
//! ```text
//!   Producer ──push──► [ update channel ] ──drain──► apply(SceneGraph)
//!      ▲                                                  │
//!      └───teardown◄── [ retire channel ] ◄───────────────┘
//! ```
//!
//! A record owns its payload (values, node references). Whatever the scene
//! gives up while applying a record (the previous property value, a removed
//! child link, a destroyed node) is moved into the record's released list,
//! so nothing a producer handed over is ever dropped on the render thread.
//!
//! # Backpressure
//!
//! The update channel is bounded. [`UpdateSender::push`] waits while the
//! channel is full, for at most the push timeout the channel was built with.
//! If the render thread has not made room by then the push fails with
//! [`StageError::QueueFull`] and the record is dropped on the producer
//! thread. The retire channel is unbounded so the render thread never blocks
//! on the producer.

use std::time::Duration;

use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TryIter};

use crate::backend::ResourceHandle;
use crate::error::StageError;
use crate::property::PropertyValue;
use crate::registry::{NodeKind, PropertyId};
use crate::scene::{Node, NodeId, NodeRef, SceneGraph};
use crate::trace::{RecordEvent, Tracer};

/// The edit a record carries, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// See [`UpdateOp::CreateNode`].
    CreateNode,
    /// See [`UpdateOp::SetProperty`].
    SetProperty,
    /// See [`UpdateOp::InsertChild`].
    InsertChild,
    /// See [`UpdateOp::RemoveChild`].
    RemoveChild,
    /// See [`UpdateOp::DestroyNode`].
    DestroyNode,
    /// See [`UpdateOp::FreeResource`].
    FreeResource,
}

/// Why a record was dropped instead of applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The target node was destroyed before the record reached it.
    StaleTarget,
    /// The child of a structural edit no longer exists.
    StaleChild,
    /// The target of a structural edit is not a group.
    NotAGroup,
    /// The child to remove is not in the group.
    ChildAbsent,
    /// Inserting the child would make a node its own ancestor.
    Cycle,
    /// The value does not fit the property.
    KindMismatch,
    /// The slot of a node being created is still occupied.
    SlotOccupied,
}

/// What the render thread did with a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordOutcome {
    /// Not yet drained.
    Pending,
    /// The edit took effect.
    Applied,
    /// The edit was absorbed as a no-op.
    Dropped(DropReason),
}

/// Something the scene gave up while a record was applied.
///
/// Released items travel back to the producer inside their record and are
/// dropped at teardown.
#[derive(Debug)]
pub enum Released {
    /// A child link removed from a group.
    Child(NodeRef),
    /// The previous value of a property.
    Value(PropertyValue),
    /// A destroyed node, with its properties.
    Node(Box<Node>),
}

/// A single scene edit and its payload.
#[derive(Debug)]
pub enum UpdateOp {
    /// Creates a node of `kind` in the target slot.
    CreateNode {
        /// Node type.
        kind: NodeKind,
    },
    /// Replaces the value of a property.
    SetProperty {
        /// Property to write.
        prop: PropertyId,
        /// New value; empty once the record has been applied.
        value: PropertyValue,
    },
    /// Inserts `child` into the target group.
    InsertChild {
        /// Node to insert. The record holds this reference until teardown.
        child: NodeRef,
        /// Position; `None` appends. Clamped to the child count at apply
        /// time.
        index: Option<usize>,
    },
    /// Removes `child` from the target group, if present.
    RemoveChild {
        /// Node to remove.
        child: NodeId,
    },
    /// Destroys the target node.
    DestroyNode,
    /// Frees a GPU resource at the start of the next frame.
    FreeResource(ResourceHandle),
}

impl UpdateOp {
    /// Returns the payload-free tag of this edit.
    #[must_use]
    pub const fn kind(&self) -> OpKind {
        match self {
            Self::CreateNode { .. } => OpKind::CreateNode,
            Self::SetProperty { .. } => OpKind::SetProperty,
            Self::InsertChild { .. } => OpKind::InsertChild,
            Self::RemoveChild { .. } => OpKind::RemoveChild,
            Self::DestroyNode => OpKind::DestroyNode,
            Self::FreeResource(_) => OpKind::FreeResource,
        }
    }
}

/// A queued scene edit.
#[derive(Debug)]
pub struct UpdateRecord {
    target: Option<NodeId>,
    op: UpdateOp,
    released: Vec<Released>,
    outcome: RecordOutcome,
}

impl UpdateRecord {
    fn new(target: Option<NodeId>, op: UpdateOp) -> Self {
        Self {
            target,
            op,
            released: Vec::new(),
            outcome: RecordOutcome::Pending,
        }
    }

    pub(crate) fn create(id: NodeId, kind: NodeKind) -> Self {
        Self::new(Some(id), UpdateOp::CreateNode { kind })
    }

    pub(crate) fn set(id: NodeId, prop: PropertyId, value: PropertyValue) -> Self {
        Self::new(Some(id), UpdateOp::SetProperty { prop, value })
    }

    pub(crate) fn insert(parent: NodeId, child: NodeRef, index: Option<usize>) -> Self {
        Self::new(Some(parent), UpdateOp::InsertChild { child, index })
    }

    pub(crate) fn remove(parent: NodeId, child: NodeId) -> Self {
        Self::new(Some(parent), UpdateOp::RemoveChild { child })
    }

    pub(crate) fn destroy(id: NodeId) -> Self {
        Self::new(Some(id), UpdateOp::DestroyNode)
    }

    pub(crate) fn free(handle: ResourceHandle) -> Self {
        Self::new(None, UpdateOp::FreeResource(handle))
    }

    /// Returns the node the record addresses.
    #[must_use]
    pub const fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Returns the edit.
    #[must_use]
    pub const fn op(&self) -> &UpdateOp {
        &self.op
    }

    /// Returns what the render thread did with the record.
    #[must_use]
    pub const fn outcome(&self) -> RecordOutcome {
        self.outcome
    }

    /// Returns what the scene gave up while applying the record.
    #[must_use]
    pub fn released(&self) -> &[Released] {
        &self.released
    }

    /// Applies the record to `scene`. Runs once, on the render thread.
    pub(crate) fn apply(
        &mut self,
        scene: &mut SceneGraph,
        tracer: &mut Tracer<'_>,
    ) -> RecordOutcome {
        debug_assert_eq!(self.outcome, RecordOutcome::Pending, "record applied twice");
        let result = match (&mut self.op, self.target) {
            (UpdateOp::FreeResource(handle), _) => {
                scene.schedule_free(*handle);
                Ok(())
            }
            (_, None) => Err(DropReason::StaleTarget),
            (UpdateOp::CreateNode { kind }, Some(id)) => scene.create(id, *kind),
            (UpdateOp::SetProperty { prop, value }, Some(id)) => {
                let kind = value.kind();
                let incoming = std::mem::replace(value, PropertyValue::empty(kind));
                match scene.set_property(id, *prop, incoming, tracer) {
                    Ok(old) => {
                        self.released.push(Released::Value(old));
                        Ok(())
                    }
                    Err((reason, rejected)) => {
                        *value = rejected;
                        Err(reason)
                    }
                }
            }
            (UpdateOp::InsertChild { child, index }, Some(id)) => {
                scene.insert_child(id, child, *index, &mut self.released)
            }
            (UpdateOp::RemoveChild { child }, Some(id)) => {
                scene.remove_child(id, *child, &mut self.released)
            }
            (UpdateOp::DestroyNode, Some(id)) => scene.destroy(id, &mut self.released),
        };
        self.outcome = match result {
            Ok(()) => RecordOutcome::Applied,
            Err(reason) => RecordOutcome::Dropped(reason),
        };
        self.outcome
    }
}

/// Running counters of the queue, kept by the producer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Records pushed.
    pub enqueued: u64,
    /// Torn-down records the render thread applied.
    pub applied: u64,
    /// Torn-down records the render thread dropped.
    pub dropped: u64,
    /// Records torn down.
    pub torn_down: u64,
}

impl QueueStats {
    /// Returns the number of records pushed but not yet torn down.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.enqueued - self.torn_down
    }
}

/// Per-drain counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Records applied.
    pub applied: usize,
    /// Records dropped.
    pub dropped: usize,
}

/// Creates the update channel with room for `capacity` records, and its
/// retire channel. A push into a full channel waits at most `push_timeout`.
#[must_use]
pub fn channel(
    capacity: usize,
    push_timeout: Duration,
) -> (UpdateSender, UpdateReceiver, RetireReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let (retire_tx, retire_rx) = crossbeam_channel::unbounded();
    (
        UpdateSender { tx, push_timeout },
        UpdateReceiver {
            rx,
            retire: retire_tx,
        },
        RetireReceiver { rx: retire_rx },
    )
}

/// Producer end of the update channel.
#[derive(Debug)]
pub struct UpdateSender {
    tx: Sender<UpdateRecord>,
    push_timeout: Duration,
}

impl UpdateSender {
    /// Pushes a record, waiting up to the push timeout while the channel is
    /// full.
    ///
    /// On failure the record is dropped here, on the producer thread.
    pub fn push(&self, record: UpdateRecord) -> Result<(), StageError> {
        self.tx
            .send_timeout(record, self.push_timeout)
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => StageError::QueueFull,
                SendTimeoutError::Disconnected(_) => StageError::Disconnected,
            })
    }
}

/// Render end of the update channel.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: Receiver<UpdateRecord>,
    retire: Sender<UpdateRecord>,
}

impl UpdateReceiver {
    /// Returns the number of records waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns whether no records are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Applies the records present when the drain starts, in FIFO order, and
    /// retires each one. Records pushed during the drain wait for the next
    /// one.
    pub fn drain(
        &self,
        scene: &mut SceneGraph,
        frame_index: u64,
        tracer: &mut Tracer<'_>,
    ) -> DrainStats {
        let mut stats = DrainStats::default();
        for _ in 0..self.rx.len() {
            let Ok(mut record) = self.rx.try_recv() else {
                break;
            };
            let outcome = record.apply(scene, tracer);
            match outcome {
                RecordOutcome::Applied => stats.applied += 1,
                _ => stats.dropped += 1,
            }
            tracer.record(&RecordEvent {
                frame_index,
                target: record.target,
                op: record.op.kind(),
                outcome,
            });
            // With the producer gone there is no other thread left to
            // release on.
            _ = self.retire.send(record);
        }
        stats
    }
}

/// Producer end of the retire channel.
#[derive(Debug)]
pub struct RetireReceiver {
    rx: Receiver<UpdateRecord>,
}

impl RetireReceiver {
    /// Takes every record retired so far without blocking.
    pub fn try_iter(&self) -> TryIter<'_, UpdateRecord> {
        self.rx.try_iter()
    }
}
