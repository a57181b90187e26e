// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The scene graph records which nodes changed during a frame with
//! multi-channel dirty tracking (via [`understory_dirty`]). Applying a queued
//! record or an animation write marks the matching channel; the render thread
//! drains every channel once per frame in
//! [`SceneGraph::evaluate`](crate::scene::SceneGraph::evaluate).
//!
//! - **Propagating**: [`INHERITED`] is marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent, so changing a group's transform, opacity or
//!   visibility reaches every descendant.
//! - **Local-only**: [`PROPERTY`] and [`LAYOUT`] report just the node that
//!   was marked.
//! - **Structural**: [`TOPOLOGY`] is marked on the parent for child list
//!   edits and on the node itself for creation and destruction.

use understory_dirty::Channel;

/// A property outside the shared transform block changed.
pub const PROPERTY: Channel = Channel::new(0);

/// Transform, opacity or visibility changed; descendants are affected.
pub const INHERITED: Channel = Channel::new(1);

/// A child list changed, or a node was created or destroyed.
pub const TOPOLOGY: Channel = Channel::new(2);

/// Text content or text layout parameters changed.
pub const LAYOUT: Channel = Channel::new(3);
