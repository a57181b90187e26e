// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the update pipeline.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! render frame and the producer-side teardown emit. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::animation::{AnimationId, FinishOutcome};
use crate::queue::{OpKind, RecordOutcome};
use crate::scene::NodeId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the render thread starts a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Frame time in seconds.
    pub now: f64,
    /// Records waiting in the update queue at frame start.
    pub queued: usize,
}

/// Emitted for every update record the render thread applies or drops.
#[derive(Clone, Copy, Debug)]
pub struct RecordEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Node the record addressed, if any.
    pub target: Option<NodeId>,
    /// Which edit the record carried.
    pub op: OpKind,
    /// Whether the edit was applied or dropped.
    pub outcome: RecordOutcome,
}

/// Emitted when a mode property is set to a name that is not recognized.
///
/// The previous mode stays in effect.
#[derive(Clone, Copy, Debug)]
pub struct UnknownValueEvent<'a> {
    /// Node whose property was set.
    pub node: NodeId,
    /// Property name.
    pub property: &'static str,
    /// The rejected value.
    pub value: &'a str,
}

/// Emitted when an animation leaves the active set on its own.
#[derive(Clone, Copy, Debug)]
pub struct AnimationFinishedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which animation ended.
    pub id: AnimationId,
    /// How it ended.
    pub outcome: FinishOutcome,
}

/// Per-frame counters, emitted when the frame's changes have been evaluated.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Frame time in seconds.
    pub now: f64,
    /// Animations moved from the pending list into the active set.
    pub animations_started: usize,
    /// Deferred resource frees executed.
    pub frees: usize,
    /// Records applied.
    pub applied: usize,
    /// Records dropped.
    pub dropped: usize,
    /// Animations still active after advancing.
    pub animations_active: usize,
    /// Animations that ended this frame.
    pub animations_finished: usize,
}

/// Emitted by the producer after returning records to their owners.
#[derive(Clone, Copy, Debug, Default)]
pub struct TeardownEvent {
    /// Records dropped on the producer thread.
    pub records: usize,
    /// Node slots returned to the allocator.
    pub slots_freed: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render frame and producer teardown.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the start of every render frame.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called once per drained update record.
    fn on_record(&mut self, e: &RecordEvent) {
        _ = e;
    }

    /// Called when a mode string is not recognized.
    fn on_unknown_value(&mut self, e: &UnknownValueEvent<'_>) {
        _ = e;
    }

    /// Called when an animation completes or loses its target.
    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        _ = e;
    }

    /// Called with the per-frame counters.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called after a producer-side teardown pass.
    fn on_teardown(&mut self, e: &TeardownEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: std::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl std::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: std::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: std::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RecordEvent`].
    #[inline]
    pub fn record(&mut self, e: &RecordEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_record(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UnknownValueEvent`].
    #[inline]
    pub fn unknown_value(&mut self, e: &UnknownValueEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_unknown_value(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AnimationFinishedEvent`].
    #[inline]
    pub fn animation_finished(&mut self, e: &AnimationFinishedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_animation_finished(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`TeardownEvent`].
    #[inline]
    pub fn teardown(&mut self, e: &TeardownEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_teardown(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            now: 1.5,
            queued: 3,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_begin());
        sink.on_teardown(&TeardownEvent::default());
        sink.on_frame_summary(&FrameSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_begin());
        tracer.frame_summary(&FrameSummary::default());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        struct RecordingSink {
            frames: Vec<u64>,
            unknown: Vec<String>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
                self.frames.push(e.frame_index);
            }
            fn on_unknown_value(&mut self, e: &UnknownValueEvent<'_>) {
                self.unknown.push(format!("{}={}", e.property, e.value));
            }
        }

        let mut sink = RecordingSink {
            frames: Vec::new(),
            unknown: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame_begin(&sample_begin());
        tracer.unknown_value(&UnknownValueEvent {
            node: NodeId::new(0, 0),
            property: "wrap",
            value: "sideways",
        });
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
        assert_eq!(sink.unknown, &["wrap=sideways"]);
    }
}
