// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format export.
//!
//! [`ChromeTraceSink`] collects events as they are emitted and
//! [`ChromeTraceSink::write`] produces [Chrome Trace Event Format][format]
//! JSON. Frames become duration events on the render track; records,
//! finished animations and teardown passes are instant events.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use stagehand_core::queue::RecordOutcome;
use stagehand_core::trace::{
    AnimationFinishedEvent, FrameBeginEvent, FrameSummary, RecordEvent, TeardownEvent, TraceSink,
    UnknownValueEvent,
};

const RENDER_TID: u32 = 0;
const PRODUCER_TID: u32 = 1;

/// Collects trace events for export as Chrome Trace Event Format JSON.
///
/// Events carry no wall-clock timestamps of their own, so each one is placed
/// at the time of the most recent frame. Load the output into
/// `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
#[derive(Debug, Default)]
pub struct ChromeTraceSink {
    events: Vec<Value>,
    now_us: f64,
}

impl ChromeTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events collected so far.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Writes the collected events as a JSON array.
    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn instant(&mut self, name: &str, cat: &str, tid: u32, args: Value) {
        self.events.push(json!({
            "ph": "i",
            "name": name,
            "cat": cat,
            "ts": self.now_us,
            "pid": 0,
            "tid": tid,
            "s": "t",
            "args": args,
        }));
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.now_us = e.now * 1_000_000.0;
        self.events.push(json!({
            "ph": "B",
            "name": "Frame",
            "cat": "Frame",
            "ts": self.now_us,
            "pid": 0,
            "tid": RENDER_TID,
            "args": {
                "frame_index": e.frame_index,
                "queued": e.queued,
            }
        }));
    }

    fn on_record(&mut self, e: &RecordEvent) {
        let dropped = match e.outcome {
            RecordOutcome::Dropped(reason) => Some(format!("{reason:?}")),
            _ => None,
        };
        self.instant(
            &format!("{:?}", e.op),
            "Record",
            RENDER_TID,
            json!({
                "frame_index": e.frame_index,
                "target": e.target.map(|id| format!("{id:?}")),
                "dropped": dropped,
            }),
        );
    }

    fn on_unknown_value(&mut self, e: &UnknownValueEvent<'_>) {
        self.instant(
            "UnknownValue",
            "Record",
            RENDER_TID,
            json!({
                "node": format!("{:?}", e.node),
                "property": e.property,
                "value": e.value,
            }),
        );
    }

    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        self.instant(
            "AnimationFinished",
            "Animation",
            RENDER_TID,
            json!({
                "frame_index": e.frame_index,
                "id": format!("{:?}", e.id),
                "outcome": format!("{:?}", e.outcome),
            }),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.events.push(json!({
            "ph": "E",
            "name": "Frame",
            "cat": "Frame",
            "ts": s.now * 1_000_000.0,
            "pid": 0,
            "tid": RENDER_TID,
            "args": {
                "frame_index": s.frame_index,
                "applied": s.applied,
                "dropped": s.dropped,
                "frees": s.frees,
                "animations_started": s.animations_started,
                "animations_active": s.animations_active,
                "animations_finished": s.animations_finished,
            }
        }));
    }

    fn on_teardown(&mut self, e: &TeardownEvent) {
        self.instant(
            "Teardown",
            "Producer",
            PRODUCER_TID,
            json!({
                "records": e.records,
                "slots_freed": e.slots_freed,
            }),
        );
    }
}
