// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render-side state derived from string properties.
//!
//! Text nodes keep their wrap/align modes and image views their repeat mode
//! as parsed enums next to the raw string properties. The parsed value is
//! refreshed whenever the string is replaced. An unrecognized string keeps
//! the previous mode; the string property itself still holds what was set.

/// How text is broken into lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Wrap {
    /// Single line, no wrapping.
    #[default]
    None,
    /// Wrap at word boundaries.
    Word,
    /// Wrap at any character once the line is full.
    End,
}

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Align {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Vertical text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VAlign {
    /// Box top.
    Top,
    /// Box middle.
    Middle,
    /// First baseline at the node origin.
    #[default]
    Baseline,
    /// Box bottom.
    Bottom,
}

impl Wrap {
    /// Parses a wrap mode name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "word" => Some(Self::Word),
            "end" => Some(Self::End),
            _ => None,
        }
    }
}

impl Align {
    /// Parses an alignment name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl VAlign {
    /// Parses a vertical alignment name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "top" => Some(Self::Top),
            "middle" => Some(Self::Middle),
            "baseline" => Some(Self::Baseline),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Parsed text layout modes of a text node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextModes {
    /// Line breaking.
    pub wrap: Wrap,
    /// Horizontal alignment.
    pub align: Align,
    /// Vertical alignment.
    pub valign: VAlign,
}

/// Texture repeat flags of an image view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Repeat {
    /// Repeat horizontally.
    pub x: bool,
    /// Repeat vertically.
    pub y: bool,
}

impl Repeat {
    /// Parses a repeat mode name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (x, y) = match name {
            "no-repeat" => (false, false),
            "repeat" => (true, true),
            "repeat-x" => (true, false),
            "repeat-y" => (false, true),
            _ => return None,
        };
        Some(Self { x, y })
    }
}

/// Derived state attached to a node, by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Derived {
    None,
    Text(TextModes),
    Image(Repeat),
}

/// What a property change did to derived state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Refresh {
    /// The node needs a new text layout.
    pub(crate) relayout: bool,
    /// The new string was not a recognized mode name.
    pub(crate) unknown: bool,
}

impl Derived {
    /// Re-derives state after property `name` changed to `value`.
    ///
    /// `changed` is false when the new value is identical to the old one.
    pub(crate) fn refresh(&mut self, name: &str, value: Option<&str>, changed: bool) -> Refresh {
        let mut out = Refresh::default();
        match self {
            Self::Text(modes) => match name {
                "w" | "h" | "text" | "maxLines" | "font" => out.relayout = changed,
                "wrap" | "align" | "vAlign" => {
                    let Some(value) = value else { return out };
                    let before = *modes;
                    let parsed = match name {
                        "wrap" => Wrap::parse(value).map(|wrap| TextModes { wrap, ..before }),
                        "align" => Align::parse(value).map(|align| TextModes { align, ..before }),
                        _ => VAlign::parse(value).map(|valign| TextModes { valign, ..before }),
                    };
                    match parsed {
                        Some(next) => {
                            *modes = next;
                            out.relayout = next != before;
                        }
                        None => out.unknown = true,
                    }
                }
                _ => {}
            },
            Self::Image(repeat) => {
                if name == "repeat" {
                    if let Some(parsed) = value.and_then(Repeat::parse) {
                        *repeat = parsed;
                    } else {
                        out.unknown = true;
                    }
                }
            }
            Self::None => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_registry_initials() {
        assert_eq!(Wrap::parse("none"), Some(Wrap::default()));
        assert_eq!(Align::parse("left"), Some(Align::default()));
        assert_eq!(VAlign::parse("baseline"), Some(VAlign::default()));
        assert_eq!(Repeat::parse("no-repeat"), Some(Repeat::default()));
    }

    #[test]
    fn unknown_wrap_keeps_previous_mode() {
        let mut derived = Derived::Text(TextModes::default());
        let r = derived.refresh("wrap", Some("word"), true);
        assert!(r.relayout, "word wrap changes layout");

        let r = derived.refresh("wrap", Some("sideways"), true);
        assert!(r.unknown, "unrecognized mode is reported");
        assert!(!r.relayout, "mode did not change");
        let Derived::Text(modes) = derived else {
            panic!("text state replaced");
        };
        assert_eq!(modes.wrap, Wrap::Word);
    }

    #[test]
    fn same_mode_does_not_relayout() {
        let mut derived = Derived::Text(TextModes::default());
        let r = derived.refresh("align", Some("left"), true);
        assert_eq!(r, Refresh::default());
    }

    #[test]
    fn size_change_relayouts_text_only() {
        let mut text = Derived::Text(TextModes::default());
        assert!(text.refresh("w", None, true).relayout, "text width");
        assert!(!text.refresh("font", None, false).relayout, "same font");

        let mut image = Derived::Image(Repeat::default());
        assert!(!image.refresh("w", None, true).relayout, "images never relayout");
    }

    #[test]
    fn repeat_modes() {
        let mut image = Derived::Image(Repeat::default());
        image.refresh("repeat", Some("repeat-y"), true);
        assert_eq!(image, Derived::Image(Repeat { x: false, y: true }));
        let r = image.refresh("repeat", Some("tile"), true);
        assert!(r.unknown, "tile is not a repeat mode");
        assert_eq!(image, Derived::Image(Repeat { x: false, y: true }));
    }
}
