// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Producer and render threads driving a small animated scene.
//!
//! The producer thread builds a group with a rectangle and a caption, starts
//! a pulsing opacity animation and a one-shot slide, and tears records down
//! as the render thread retires them. The render thread runs frames on a
//! simulated 60 Hz clock, lays out dirty text and prints what changed.
//! Render-side trace events go to stderr and to `trace.json` in Chrome Trace
//! Event Format.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use stagehand_core::animation::{AnimationConfig, RepeatCount, TimingFunction};
use stagehand_core::backend::{
    CountingResources, LayoutConstraints, Presenter, TextBuffer, TextLayout,
};
use stagehand_core::derived::Wrap;
use stagehand_core::registry::NodeKind;
use stagehand_core::scene::{FrameChanges, SceneGraph};
use stagehand_core::stage::{StageConfig, stage};
use stagehand_core::trace::{
    AnimationFinishedEvent, FrameBeginEvent, FrameSummary, RecordEvent, TraceSink, Tracer,
    UnknownValueEvent,
};
use stagehand_debug::chrome::ChromeTraceSink;
use stagehand_debug::pretty::PrettyPrintSink;

const FRAMES: u32 = 120;
const GLYPH_WIDTH: f32 = 8.0;

/// Fixed-advance layout: every glyph is one quad of the same width.
struct MonospaceLayout;

impl TextLayout for MonospaceLayout {
    fn layout(&mut self, text: &str, constraints: &LayoutConstraints) -> TextBuffer {
        let per_line = if constraints.width > 0.0 && constraints.modes.wrap != Wrap::None {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "glyph counts per line are small and positive"
            )]
            let n = (constraints.width / GLYPH_WIDTH).floor() as usize;
            n.max(1)
        } else {
            usize::MAX
        };
        let mut buffer = TextBuffer::default();
        for (line, chunk) in text.chars().collect::<Vec<_>>().chunks(per_line).enumerate() {
            if constraints
                .max_lines
                .is_some_and(|max| u32::try_from(line).is_ok_and(|line| line >= max))
            {
                break;
            }
            let y = line as f32;
            for (col, _) in chunk.iter().enumerate() {
                let x = col as f32 * GLYPH_WIDTH;
                buffer.vertices.extend_from_slice(&[x, y, x + GLYPH_WIDTH, y + 1.0]);
            }
            buffer.lines += 1;
            buffer.width = buffer.width.max(chunk.len() as f32 * GLYPH_WIDTH);
        }
        buffer
    }
}

/// Forwards render-side events to both debug sinks.
struct Sinks {
    pretty: PrettyPrintSink,
    chrome: ChromeTraceSink,
}

impl TraceSink for Sinks {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.pretty.on_frame_begin(e);
        self.chrome.on_frame_begin(e);
    }

    fn on_record(&mut self, e: &RecordEvent) {
        self.pretty.on_record(e);
        self.chrome.on_record(e);
    }

    fn on_unknown_value(&mut self, e: &UnknownValueEvent<'_>) {
        self.pretty.on_unknown_value(e);
        self.chrome.on_unknown_value(e);
    }

    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        self.pretty.on_animation_finished(e);
        self.chrome.on_animation_finished(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.pretty.on_frame_summary(s);
        self.chrome.on_frame_summary(s);
    }
}

/// Prints a line per frame that changed anything.
struct LogPresenter {
    layout: MonospaceLayout,
}

impl Presenter for LogPresenter {
    fn apply(&mut self, scene: &SceneGraph, changes: &FrameChanges) {
        if changes.is_empty() {
            return;
        }
        println!(
            "changes: +{} -{} props={} inherited={} topology={}",
            changes.added.len(),
            changes.removed.len(),
            changes.properties.len(),
            changes.inherited.len(),
            changes.topology_changed,
        );
        for &idx in &changes.relayout {
            if let Some(buffer) = scene.layout_text(idx, &mut self.layout) {
                println!(
                    "  relayout slot {idx}: {} lines, {} wide",
                    buffer.lines, buffer.width
                );
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let (mut producer, mut renderer) = stage(StageConfig::new(), CountingResources::new());
    let render_done = Arc::new(AtomicBool::new(false));

    let done = Arc::clone(&render_done);
    let render = thread::spawn(move || {
        let mut sinks = Sinks {
            pretty: PrettyPrintSink::stderr().records(false),
            chrome: ChromeTraceSink::new(),
        };
        let mut presenter = LogPresenter {
            layout: MonospaceLayout,
        };
        let texture = renderer.allocate_resource();
        for frame in 0..FRAMES {
            let now = f64::from(frame) / 60.0;
            let changes = renderer.frame(now, &mut Tracer::new(&mut sinks));
            presenter.apply(renderer.scene(), &changes);
            if frame == FRAMES / 2 {
                renderer.defer_free(texture);
            }
            thread::sleep(Duration::from_millis(2));
        }
        done.store(true, Ordering::Release);
        (renderer, sinks.chrome)
    });

    let slid = Arc::new(AtomicBool::new(false));
    let root = producer.create_node(NodeKind::Group)?;
    let rect = producer.create_node(NodeKind::Rect)?;
    let caption = producer.create_node(NodeKind::Text)?;
    producer.add_child(&root, &rect)?;
    producer.add_child(&root, &caption)?;
    producer.set_property(&rect, "w", 64.0_f32)?;
    producer.set_property(&rect, "h", 64.0_f32)?;
    producer.set_property(&caption, "w", 80.0_f32)?;
    producer.set_property(&caption, "text", "stagehand threaded demo")?;
    producer.set_property(&caption, "wrap", "word")?;

    producer.start_animation(
        &root,
        "opacity",
        AnimationConfig::new(1.0, 0.25, 0.5)
            .count(RepeatCount::Forever)
            .autoreverse(true)
            .timing(TimingFunction::CubicInOut),
    )?;
    let flag = Arc::clone(&slid);
    producer.start_animation(
        &rect,
        "x",
        AnimationConfig::new(0.0, 200.0, 1.0)
            .timing(TimingFunction::CubicOut)
            .then(move || flag.store(true, Ordering::Release)),
    )?;

    let mut cleaned_up = false;
    while !render_done.load(Ordering::Acquire) {
        producer.teardown(&mut Tracer::none());
        producer.dispatch_events();
        if slid.load(Ordering::Acquire) && !cleaned_up {
            producer.set_property(&caption, "text", "slide finished")?;
            producer.destroy_node(&rect)?;
            producer.clear_animations();
            cleaned_up = true;
        }
        thread::sleep(Duration::from_millis(1));
    }

    let (renderer, chrome) = match render.join() {
        Ok(joined) => joined,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    producer.teardown(&mut Tracer::none());
    let stats = producer.stats();
    println!(
        "done: {} records, {} applied, {} dropped, {} live nodes, {} textures freed",
        stats.enqueued,
        stats.applied,
        stats.dropped,
        renderer.scene().len(),
        renderer.gpu().freed().len(),
    );

    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    chrome.write(&mut writer)?;
    println!("wrote {path} ({} events)", chrome.events().len());
    Ok(())
}
