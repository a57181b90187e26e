// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static node-type registry.
//!
//! Each [`NodeKind`] has a fixed, read-only property table built at compile
//! time. A node's property slots are created from its table when the node is
//! created and never added or removed afterwards, so a [`PropertyId`] (an
//! index into the table) stays valid for the node's whole life.
//!
//! Every kind shares the transform/opacity/visibility block at the front of
//! its table:
//!
//! | id | name | kind | initial |
//! |----|------|------|---------|
//! | 0–2 | `x` `y` `z` | float | 0 |
//! | 3–4 | `sx` `sy` | float | 1 |
//! | 5–7 | `rx` `ry` `rz` | float | 0 |
//! | 8 | `opacity` | float | 1 |
//! | 9 | `visible` | bool | true |
//!
//! Kind-specific entries follow.

use crate::property::PropertyKind;

/// Index of a property within its node kind's table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(pub(crate) u16);

impl PropertyId {
    /// Returns the raw table index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    /// Returns whether changing this property affects descendants
    /// (the shared transform/opacity/visibility block).
    #[inline]
    #[must_use]
    pub const fn inherits(self) -> bool {
        (self.0 as usize) < COMMON.len()
    }
}

/// Initial value of a registry entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Initial {
    /// Float initial value.
    Float(f32),
    /// Boolean initial value.
    Bool(bool),
    /// String initial value.
    Utf8(&'static str),
    /// Integer initial value.
    Int32(i32),
    /// The kind's zero/empty value.
    Empty,
}

/// One entry of a node kind's property table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropertySpec {
    /// Interned property name.
    pub name: &'static str,
    /// Declared value kind.
    pub kind: PropertyKind,
    /// Value the slot holds after node creation.
    pub initial: Initial,
}

const fn float(name: &'static str, v: f32) -> PropertySpec {
    PropertySpec {
        name,
        kind: PropertyKind::Float,
        initial: Initial::Float(v),
    }
}

const fn flag(name: &'static str, v: bool) -> PropertySpec {
    PropertySpec {
        name,
        kind: PropertyKind::Bool,
        initial: Initial::Bool(v),
    }
}

const fn utf8(name: &'static str, v: &'static str) -> PropertySpec {
    PropertySpec {
        name,
        kind: PropertyKind::Utf8,
        initial: Initial::Utf8(v),
    }
}

const fn empty(name: &'static str, kind: PropertyKind) -> PropertySpec {
    PropertySpec {
        name,
        kind,
        initial: Initial::Empty,
    }
}

const COMMON: &[PropertySpec] = &[
    float("x", 0.0),
    float("y", 0.0),
    float("z", 0.0),
    float("sx", 1.0),
    float("sy", 1.0),
    float("rx", 0.0),
    float("ry", 0.0),
    float("rz", 0.0),
    float("opacity", 1.0),
    flag("visible", true),
];

const GROUP: &[PropertySpec] = &[
    float("w", 0.0),
    float("h", 0.0),
    float("originX", 0.0),
    float("originY", 0.0),
    flag("clipRect", false),
    flag("depth", false),
];

const RECT: &[PropertySpec] = &[
    float("w", 0.0),
    float("h", 0.0),
    float("originX", 0.0),
    float("originY", 0.0),
    float("r", 0.0),
    float("g", 0.0),
    float("b", 0.0),
];

const IMAGE_VIEW: &[PropertySpec] = &[
    float("w", 0.0),
    float("h", 0.0),
    float("originX", 0.0),
    float("originY", 0.0),
    empty("image", PropertyKind::Object),
    float("left", 0.0),
    float("right", 1.0),
    float("top", 0.0),
    float("bottom", 1.0),
    utf8("repeat", "no-repeat"),
];

const TEXT: &[PropertySpec] = &[
    utf8("text", ""),
    float("r", 0.0),
    float("g", 0.0),
    float("b", 0.0),
    float("w", 0.0),
    float("h", 0.0),
    float("originX", 0.0),
    float("originY", 0.0),
    utf8("wrap", "none"),
    utf8("align", "left"),
    utf8("vAlign", "baseline"),
    empty("font", PropertyKind::Object),
    PropertySpec {
        name: "maxLines",
        kind: PropertyKind::Int32,
        initial: Initial::Int32(0),
    },
];

const POLYGON: &[PropertySpec] = &[
    float("fillR", 0.0),
    float("fillG", 0.0),
    float("fillB", 0.0),
    flag("filled", true),
    empty("geometry", PropertyKind::FloatArray),
];

const MODEL: &[PropertySpec] = &[
    float("w", 0.0),
    float("h", 0.0),
    float("originX", 0.0),
    float("originY", 0.0),
    float("fillR", 0.0),
    float("fillG", 0.0),
    float("fillB", 0.0),
    empty("vertices", PropertyKind::FloatArray),
    empty("normals", PropertyKind::FloatArray),
    empty("uvs", PropertyKind::FloatArray),
    empty("indices", PropertyKind::UShortArray),
    empty("texture", PropertyKind::Object),
];

/// The type of a scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Container with an ordered child list.
    Group,
    /// Solid colored rectangle.
    Rect,
    /// Textured rectangle.
    ImageView,
    /// Laid-out text.
    Text,
    /// Filled or outlined 2D polygon.
    Polygon,
    /// Indexed 3D mesh.
    Model,
}

impl NodeKind {
    /// Returns whether nodes of this kind hold children.
    #[inline]
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Group)
    }

    const fn own_table(self) -> &'static [PropertySpec] {
        match self {
            Self::Group => GROUP,
            Self::Rect => RECT,
            Self::ImageView => IMAGE_VIEW,
            Self::Text => TEXT,
            Self::Polygon => POLYGON,
            Self::Model => MODEL,
        }
    }

    /// Returns the number of properties a node of this kind carries.
    #[must_use]
    pub const fn property_count(self) -> usize {
        COMMON.len() + self.own_table().len()
    }

    /// Returns the table entry for `id`.
    #[must_use]
    pub fn spec(self, id: PropertyId) -> Option<&'static PropertySpec> {
        let idx = usize::from(id.0);
        if idx < COMMON.len() {
            COMMON.get(idx)
        } else {
            self.own_table().get(idx - COMMON.len())
        }
    }

    /// Looks up a property by name.
    #[must_use]
    pub fn lookup(self, name: &str) -> Option<PropertyId> {
        self.specs()
            .position(|spec| spec.name == name)
            .and_then(|idx| u16::try_from(idx).ok())
            .map(PropertyId)
    }

    /// Iterates over the full property table in id order.
    pub fn specs(self) -> impl Iterator<Item = &'static PropertySpec> {
        COMMON.iter().chain(self.own_table().iter())
    }
}
