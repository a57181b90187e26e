// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Frame times
//! are printed in milliseconds.

use std::io::Write;

use stagehand_core::queue::RecordOutcome;
use stagehand_core::trace::{
    AnimationFinishedEvent, FrameBeginEvent, FrameSummary, RecordEvent, TeardownEvent, TraceSink,
    UnknownValueEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    records: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            records: true,
        }
    }

    /// Enables or disables the per-record lines. Dropped records are always
    /// printed.
    #[must_use]
    pub fn records(mut self, enabled: bool) -> Self {
        self.records = enabled;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] #{} now={:.3}ms queued={}",
            e.frame_index,
            e.now * 1000.0,
            e.queued,
        );
    }

    fn on_record(&mut self, e: &RecordEvent) {
        let target = match e.target {
            Some(id) => format!("{id:?}"),
            None => "-".into(),
        };
        match e.outcome {
            RecordOutcome::Dropped(reason) => {
                let _ = writeln!(
                    self.writer,
                    "[record] frame={} {:?} {target} DROPPED {reason:?}",
                    e.frame_index, e.op,
                );
            }
            _ if self.records => {
                let _ = writeln!(
                    self.writer,
                    "[record] frame={} {:?} {target}",
                    e.frame_index, e.op,
                );
            }
            _ => {}
        }
    }

    fn on_unknown_value(&mut self, e: &UnknownValueEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[unknown] {:?}.{} = {:?} (kept previous mode)",
            e.node, e.property, e.value,
        );
    }

    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        let _ = writeln!(
            self.writer,
            "[anim] frame={} {:?} {:?}",
            e.frame_index, e.id, e.outcome,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} applied={} dropped={} frees={} \
             anim(started={} active={} finished={})",
            s.frame_index,
            s.applied,
            s.dropped,
            s.frees,
            s.animations_started,
            s.animations_active,
            s.animations_finished,
        );
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        let _ = writeln!(
            self.writer,
            "[teardown] records={} slots_freed={}",
            e.records, e.slots_freed,
        );
    }
}
