// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration errors reported synchronously by the producer API.
//!
//! Only mistakes the caller can detect at the call site are errors. Races
//! that follow from asynchronous ordering (removing a child that is already
//! gone, editing a node destroyed by an earlier record) are absorbed as
//! no-ops when the render thread applies them and never reach this type.

use std::fmt;

use crate::property::PropertyKind;
use crate::registry::NodeKind;
use crate::scene::NodeId;

/// Errors returned by [`Producer`](crate::stage::Producer) operations.
///
/// When an operation returns an error, nothing was enqueued and no state
/// changed.
#[derive(Clone, Debug, PartialEq)]
pub enum StageError {
    /// The node kind has no property with this name.
    UnknownProperty {
        /// Kind of the node that was addressed.
        kind: NodeKind,
        /// Property name that was looked up.
        name: String,
    },
    /// The value does not match the property's declared kind.
    TypeMismatch {
        /// Property name.
        name: &'static str,
        /// Declared kind of the property.
        expected: PropertyKind,
        /// Kind of the value that was supplied.
        found: PropertyKind,
    },
    /// Animations can only be bound to float properties.
    NotAnimatable {
        /// Property name.
        name: &'static str,
        /// Declared kind of the property.
        kind: PropertyKind,
    },
    /// The animation has already left the created state (it was started,
    /// or stopped before it ever started).
    AlreadyStarted,
    /// The animation handle was not issued by this producer.
    UnknownAnimation,
    /// Structural edits target a node that is not a group.
    NotAGroup(NodeId),
    /// The child cannot be attached to the requested parent.
    InvalidChild {
        /// Group that was addressed.
        parent: NodeId,
        /// Offending child.
        child: NodeId,
    },
    /// Animation duration must be finite and strictly positive.
    InvalidDuration(f64),
    /// The update queue stayed full for the whole push timeout. The edit
    /// was not queued.
    QueueFull,
    /// The render side of the stage has been dropped.
    Disconnected,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProperty { kind, name } => {
                write!(f, "{kind:?} has no property named `{name}`")
            }
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "property `{name}` holds {expected:?} values, got {found:?}"
            ),
            Self::NotAnimatable { name, kind } => {
                write!(f, "property `{name}` ({kind:?}) cannot be animated")
            }
            Self::AlreadyStarted => f.write_str("animation already started"),
            Self::UnknownAnimation => f.write_str("unknown animation handle"),
            Self::NotAGroup(id) => write!(f, "{id:?} is not a group"),
            Self::InvalidChild { parent, child } => {
                write!(f, "{child:?} cannot be a child of {parent:?}")
            }
            Self::InvalidDuration(d) => write!(f, "invalid animation duration {d}"),
            Self::QueueFull => f.write_str("update queue full"),
            Self::Disconnected => f.write_str("render side disconnected"),
        }
    }
}

impl std::error::Error for StageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_property_name() {
        let err = StageError::NotAnimatable {
            name: "visible",
            kind: PropertyKind::Bool,
        };
        let text = err.to_string();
        assert!(text.contains("visible"), "got: {text}");
        assert!(text.contains("cannot be animated"), "got: {text}");
    }

    #[test]
    fn errors_are_std_errors() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&StageError::AlreadyStarted);
    }
}
