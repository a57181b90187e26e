// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curves.

/// Maps normalized animation time to normalized progress.
///
/// Every curve maps `0` to `0` and `1` to `1`. Outside `[0, 1]` the cubic
/// curves are not guaranteed to stay in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimingFunction {
    /// Identity.
    #[default]
    Linear,
    /// `t³`, slow start.
    CubicIn,
    /// `1 - (1 - t)³`, slow end.
    CubicOut,
    /// Cubic-in for the first half, cubic-out for the second.
    CubicInOut,
}

impl TimingFunction {
    /// Parses a curve name (`linear`, `cubicIn`, `cubicOut`, `cubicInOut`).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "cubicIn" => Some(Self::CubicIn),
            "cubicOut" => Some(Self::CubicOut),
            "cubicInOut" => Some(Self::CubicInOut),
            _ => None,
        }
    }

    /// Parses a curve name, falling back to [`Linear`](Self::Linear) for
    /// names that are not recognized.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_default()
    }

    /// Evaluates the curve at `t`.
    #[must_use]
    pub fn eval(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::CubicIn => cubic_in(t),
            Self::CubicOut => 1.0 - cubic_in(1.0 - t),
            Self::CubicInOut => {
                if t < 0.5 {
                    cubic_in(2.0 * t) / 2.0
                } else {
                    1.0 - cubic_in(2.0 * (1.0 - t)) / 2.0
                }
            }
        }
    }
}

fn cubic_in(t: f64) -> f64 {
    t * t * t
}
