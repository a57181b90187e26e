// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Producer and renderer on separate threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use stagehand_core::animation::AnimationConfig;
use stagehand_core::backend::CountingResources;
use stagehand_core::registry::NodeKind;
use stagehand_core::stage::{StageConfig, stage};
use stagehand_core::trace::Tracer;

#[test]
fn edits_apply_in_order_across_threads() {
    let (mut producer, mut renderer) = stage(
        StageConfig::new().with_queue_capacity(16),
        CountingResources::new(),
    );
    let done = Arc::new(AtomicBool::new(false));

    let producer_done = Arc::clone(&done);
    let producer_thread = thread::spawn(move || {
        let root = producer.create_node(NodeKind::Group).unwrap();
        let mut rects = Vec::new();
        for i in 0..200_u16 {
            let rect = producer.create_node(NodeKind::Rect).unwrap();
            producer.add_child(&root, &rect).unwrap();
            producer.set_property(&rect, "x", f32::from(i)).unwrap();
            producer.set_property(&rect, "x", f32::from(i) * 2.0).unwrap();
            if i % 3 == 0 {
                producer.remove_child(&root, &rect).unwrap();
            }
            rects.push(rect);
            producer.teardown(&mut Tracer::none());
        }
        producer_done.store(true, Ordering::Release);
        (producer, root, rects)
    });

    let mut now = 0.0;
    while !done.load(Ordering::Acquire) {
        renderer.frame(now, &mut Tracer::none());
        now += 1.0 / 60.0;
        thread::yield_now();
    }
    let (mut producer, root, rects) = producer_thread.join().unwrap();
    renderer.frame(now, &mut Tracer::none());
    producer.teardown(&mut Tracer::none());

    let scene = renderer.scene();
    assert_eq!(scene.len(), 201, "every node created");
    let children = scene.children(root.id()).unwrap();
    assert_eq!(children.len(), 133, "every third rect removed");
    for (i, rect) in rects.iter().enumerate() {
        let x = scene.node(rect.id()).unwrap().float("x").unwrap();
        assert_eq!(x, i as f32 * 2.0, "last write wins for rect {i}");
    }
    let order: Vec<_> = children.iter().map(|c| c.id()).collect();
    let expected: Vec<_> = rects
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 != 0)
        .map(|(_, r)| r.id())
        .collect();
    assert_eq!(order, expected, "children kept in insertion order");

    let stats = producer.stats();
    assert_eq!(stats.in_flight(), 0, "everything torn down");
    assert_eq!(stats.dropped, 0, "no races in this sequence");
}

#[test]
fn completion_callback_runs_on_producer_thread() {
    let (mut producer, mut renderer) = stage(StageConfig::new(), CountingResources::new());
    let rect = producer.create_node(NodeKind::Rect).unwrap();
    let producer_id = thread::current().id();
    let ran_on = Arc::new(parking_lot::Mutex::new(None));
    let slot = Arc::clone(&ran_on);
    producer
        .start_animation(
            &rect,
            "opacity",
            AnimationConfig::new(1.0, 0.0, 0.1).then(move || {
                *slot.lock() = Some(thread::current().id());
            }),
        )
        .unwrap();

    let render_thread = thread::spawn(move || {
        renderer.frame(0.0, &mut Tracer::none());
        renderer.frame(0.2, &mut Tracer::none());
        renderer
    });
    let renderer = render_thread.join().unwrap();
    assert_eq!(ran_on.lock().as_ref(), None, "nothing ran on the render thread");

    assert_eq!(producer.dispatch_events(), 1);
    assert_eq!(*ran_on.lock(), Some(producer_id));
    let opacity = renderer.scene().node(rect.id()).unwrap().float("opacity");
    assert_eq!(opacity, Some(0.0), "end value written exactly");
}
