// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed property values.
//!
//! Every node owns a fixed table of [`Property`] slots, one per entry in its
//! kind's registry table (see [`registry`](crate::registry)). A property
//! holds exactly one [`PropertyValue`], replaced as a whole by a queued
//! record or by an animation write.
//!
//! # Object references
//!
//! [`PropertyKind::Object`] properties hold an optional [`ObjectRef`], an
//! `Arc`-backed handle whose strong count is the object's reference count.
//! Setting a new object moves an already-retained handle in and moves the
//! previous handle out; the render thread never drops the old handle itself,
//! it hands it back to the producer thread with the record (see
//! [`queue`](crate::queue)).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::registry::{Initial, PropertySpec};

/// The declared type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// 32-bit float.
    Float,
    /// Boolean flag.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Array of 32-bit floats.
    FloatArray,
    /// Array of unsigned 16-bit integers (index buffers).
    UShortArray,
    /// Reference-counted opaque object (font, texture, ...).
    Object,
}

/// A reference-counted handle to an opaque object owned by a property.
///
/// Cloning retains, dropping releases. Identity is pointer identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Any + Send + Sync>);

impl ObjectRef {
    /// Wraps `value` in a new reference-counted object.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns whether both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the current number of strong references.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Returns the object as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p}, rc={})", Arc::as_ptr(&self.0), self.ref_count())
    }
}

/// The value of a property.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    /// See [`PropertyKind::Float`].
    Float(f32),
    /// See [`PropertyKind::Bool`].
    Bool(bool),
    /// See [`PropertyKind::Utf8`].
    Utf8(String),
    /// See [`PropertyKind::Int32`].
    Int32(i32),
    /// See [`PropertyKind::UInt32`].
    UInt32(u32),
    /// See [`PropertyKind::FloatArray`].
    FloatArray(Vec<f32>),
    /// See [`PropertyKind::UShortArray`].
    UShortArray(Vec<u16>),
    /// See [`PropertyKind::Object`]. `None` clears the reference.
    Object(Option<ObjectRef>),
}

impl PropertyValue {
    /// Returns the kind tag of this value.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::Float(_) => PropertyKind::Float,
            Self::Bool(_) => PropertyKind::Bool,
            Self::Utf8(_) => PropertyKind::Utf8,
            Self::Int32(_) => PropertyKind::Int32,
            Self::UInt32(_) => PropertyKind::UInt32,
            Self::FloatArray(_) => PropertyKind::FloatArray,
            Self::UShortArray(_) => PropertyKind::UShortArray,
            Self::Object(_) => PropertyKind::Object,
        }
    }

    /// Returns the float payload, if this is a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a flag.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object payload, if this is a set object reference.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(Some(obj)) => Some(obj),
            _ => None,
        }
    }

    /// Builds the initial value for a registry entry.
    pub(crate) fn initial(spec: &PropertySpec) -> Self {
        match (spec.kind, spec.initial) {
            (PropertyKind::Float, Initial::Float(v)) => Self::Float(v),
            (PropertyKind::Bool, Initial::Bool(v)) => Self::Bool(v),
            (PropertyKind::Utf8, Initial::Utf8(s)) => Self::Utf8(s.into()),
            (PropertyKind::Int32, Initial::Int32(v)) => Self::Int32(v),
            (kind, _) => Self::empty(kind),
        }
    }

    /// Returns the zero/empty value for `kind`.
    #[must_use]
    pub const fn empty(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Float => Self::Float(0.0),
            PropertyKind::Bool => Self::Bool(false),
            PropertyKind::Utf8 => Self::Utf8(String::new()),
            PropertyKind::Int32 => Self::Int32(0),
            PropertyKind::UInt32 => Self::UInt32(0),
            PropertyKind::FloatArray => Self::FloatArray(Vec::new()),
            PropertyKind::UShortArray => Self::UShortArray(Vec::new()),
            PropertyKind::Object => Self::Object(None),
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::UInt32(a), Self::UInt32(b)) => a == b,
            (Self::FloatArray(a), Self::FloatArray(b)) => a == b,
            (Self::UShortArray(a), Self::UShortArray(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => match (a, b) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Utf8(v.into())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<Vec<f32>> for PropertyValue {
    fn from(v: Vec<f32>) -> Self {
        Self::FloatArray(v)
    }
}

impl From<Vec<u16>> for PropertyValue {
    fn from(v: Vec<u16>) -> Self {
        Self::UShortArray(v)
    }
}

impl From<ObjectRef> for PropertyValue {
    fn from(v: ObjectRef) -> Self {
        Self::Object(Some(v))
    }
}

/// A named, typed property slot owned by a node.
#[derive(Clone, Debug)]
pub struct Property {
    name: &'static str,
    kind: PropertyKind,
    value: PropertyValue,
}

impl Property {
    pub(crate) fn new(spec: &PropertySpec) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            value: PropertyValue::initial(spec),
        }
    }

    /// Returns the interned property name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared kind.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Returns the current value.
    #[must_use]
    pub const fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Stores `value` and returns the previous value.
    ///
    /// The caller owns the returned value and decides on which thread it is
    /// dropped. Kinds are checked at enqueue time; a mismatching value is
    /// handed straight back and the slot is left untouched.
    pub(crate) fn replace(&mut self, value: PropertyValue) -> PropertyValue {
        if value.kind() != self.kind {
            return value;
        }
        core::mem::replace(&mut self.value, value)
    }

    /// Writes a float in place. Returns `false` for non-float properties.
    pub(crate) fn set_float(&mut self, v: f32) -> bool {
        match &mut self.value {
            PropertyValue::Float(slot) => {
                *slot = v;
                true
            }
            _ => false,
        }
    }
}
