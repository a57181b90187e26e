// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts for the collaborators the core drives but does not implement.
//!
//! - **GPU resources**: [`GpuResources`] allocates and frees opaque
//!   [`ResourceHandle`]s. Frees are never executed while the frame that
//!   requested them may still draw with the resource: the
//!   [`Renderer`](crate::stage::Renderer) runs them at the start of the next
//!   frame.
//! - **Text layout**: [`TextLayout`] turns a string plus
//!   [`LayoutConstraints`] into a [`TextBuffer`]. The core only tracks which
//!   text nodes need relayout (see [`FrameChanges::relayout`]).
//! - **Presentation**: [`Presenter`] applies a frame's changes to whatever
//!   draws the scene.
//!
//! All three are called on the render thread only.

use std::fmt;

use crate::derived::TextModes;
use crate::property::ObjectRef;
use crate::scene::{FrameChanges, SceneGraph};

/// An opaque GPU resource (texture, buffer, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u32);

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceHandle({})", self.0)
    }
}

/// Allocates and frees GPU resources.
pub trait GpuResources {
    /// Allocates a new resource.
    fn allocate(&mut self) -> ResourceHandle;

    /// Releases a resource. Only called once no frame uses it anymore.
    fn free(&mut self, handle: ResourceHandle);
}

/// A [`GpuResources`] that hands out sequential handles and tracks how many
/// are live.
#[derive(Clone, Debug, Default)]
pub struct CountingResources {
    next: u32,
    live: Vec<ResourceHandle>,
    freed: Vec<ResourceHandle>,
}

impl CountingResources {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handles allocated and not yet freed.
    #[must_use]
    pub fn live(&self) -> &[ResourceHandle] {
        &self.live
    }

    /// Returns every handle freed so far, in order.
    #[must_use]
    pub fn freed(&self) -> &[ResourceHandle] {
        &self.freed
    }
}

impl GpuResources for CountingResources {
    fn allocate(&mut self) -> ResourceHandle {
        let handle = ResourceHandle(self.next);
        self.next += 1;
        self.live.push(handle);
        handle
    }

    fn free(&mut self, handle: ResourceHandle) {
        self.live.retain(|h| *h != handle);
        self.freed.push(handle);
    }
}

/// Inputs to a text layout pass.
#[derive(Clone, Debug)]
pub struct LayoutConstraints {
    /// Box width; zero means unconstrained.
    pub width: f32,
    /// Box height; zero means unconstrained.
    pub height: f32,
    /// Wrap and alignment modes.
    pub modes: TextModes,
    /// Maximum number of lines, if limited.
    pub max_lines: Option<u32>,
    /// Font object, if one is set.
    pub font: Option<ObjectRef>,
}

/// Output of a text layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextBuffer {
    /// Interleaved glyph quad vertices.
    pub vertices: Vec<f32>,
    /// Number of laid-out lines.
    pub lines: u32,
    /// Width of the widest line.
    pub width: f32,
}

/// Lays text out into a vertex buffer.
pub trait TextLayout {
    /// Lays out `text` under `constraints`.
    fn layout(&mut self, text: &str, constraints: &LayoutConstraints) -> TextBuffer;
}

/// Applies evaluated frame changes to a presentation tree.
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// loop {
///     let changes = renderer.frame(now(), &mut tracer);
///     presenter.apply(renderer.scene(), &changes);
/// }
/// ```
pub trait Presenter {
    /// Applies the given [`FrameChanges`], reading current property values
    /// from `scene` as needed.
    fn apply(&mut self, scene: &SceneGraph, changes: &FrameChanges);
}
