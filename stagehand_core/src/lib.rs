// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered cross-thread mutation and frame-driven animation for a
//! retained-mode scene graph.
//!
//! `stagehand_core` splits a scene between two threads. A producer thread
//! creates nodes, sets properties, edits groups and starts animations; a
//! render thread owns the scene graph and applies those edits, in the order
//! they were made, at the start of each frame. Records that carried payloads
//! across travel back to the producer, so whatever they held is released on
//! the thread that created it.
//!
//! # Architecture
//!
//! ```text
//!   Producer ──push──► update queue (bounded) ──drain──► SceneGraph
//!      ▲                                                    │
//!      │                                                    ▼
//!      └──teardown── retire queue ◄──applied/dropped── UpdateRecord
//!
//!   Producer ──start/stop──► PendingAnimations ──absorb──► AnimationEngine
//!      ▲                                                    │
//!      └──dispatch_events── finished events ◄───advance─────┘
//! ```
//!
//! **[`stage`]** — [`Producer`](stage::Producer) and
//! [`Renderer`](stage::Renderer), and the per-frame order that ties the two
//! queues and the animation engine together.
//!
//! **[`queue`]** — The two-phase update queue: records are applied on the
//! render thread and torn down on the producer thread.
//!
//! **[`scene`]** — Slot-indexed node storage with generational ids, group
//! structure and change evaluation.
//!
//! **[`dirty`]** — Dirty channels via `understory_dirty`. Inherited
//! properties propagate to descendants; everything else is local.
//!
//! **[`registry`]** — Static property tables per node kind.
//!
//! **[`property`]** — Typed property values.
//!
//! **[`derived`]** — Text and image modes parsed from string properties.
//!
//! **[`animation`]** — The animation state machine, engine and easing
//! curves.
//!
//! **[`backend`]** — Traits for GPU resources, text layout and presenters.
//!
//! **[`time`]** — Host tick timestamps and their conversion to seconds.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) and event types, with the
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use stagehand_core::animation::AnimationConfig;
//! use stagehand_core::backend::CountingResources;
//! use stagehand_core::registry::NodeKind;
//! use stagehand_core::stage::{StageConfig, stage};
//! use stagehand_core::trace::Tracer;
//!
//! let (mut producer, mut renderer) = stage(StageConfig::new(), CountingResources::new());
//! let root = producer.create_node(NodeKind::Group).unwrap();
//! let rect = producer.create_node(NodeKind::Rect).unwrap();
//! producer.add_child(&root, &rect).unwrap();
//! producer.set_property(&rect, "w", 100.0_f32).unwrap();
//! producer
//!     .start_animation(&rect, "opacity", AnimationConfig::new(0.0, 1.0, 0.5))
//!     .unwrap();
//!
//! renderer.frame(0.0, &mut Tracer::none());
//! renderer.frame(0.25, &mut Tracer::none());
//! let node = renderer.scene().node(rect.id()).unwrap();
//! assert_eq!(node.float("opacity"), Some(0.5));
//! assert_eq!(renderer.scene().children(root.id()).map(<[_]>::len), Some(1));
//!
//! producer.teardown(&mut Tracer::none());
//! ```
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod animation;
pub mod backend;
pub mod derived;
pub mod dirty;
pub mod error;
pub mod property;
pub mod queue;
pub mod registry;
pub mod scene;
pub mod stage;
pub mod time;
pub mod trace;
