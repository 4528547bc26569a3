//! Temporal types for the time-indexed board.
//!
//! Time is a logical integer turn counter ([`Tick`]), unbounded in both
//! directions. Object validity windows and the store's locked floor need
//! "infinitely early" and "infinitely late" values, which [`TimeBound`]
//! provides.

use serde::{Deserialize, Serialize};

/// A logical time index. Any integer is addressable, past or future.
pub type Tick = i64;

/// A tick extended with the two infinities.
///
/// The variant order gives the natural comparison: negative infinity sorts
/// below every finite tick, positive infinity above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeBound {
    /// Earlier than every tick.
    NegInfinity,
    /// A concrete tick.
    Finite(Tick),
    /// Later than every tick.
    PosInfinity,
}

impl TimeBound {
    /// Returns the inner tick for finite bounds.
    #[must_use]
    pub const fn finite(self) -> Option<Tick> {
        match self {
            Self::Finite(t) => Some(t),
            _ => None,
        }
    }

    /// Returns true if the bound is a concrete tick.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// Shift a finite bound by `dt`; infinities are unaffected.
    #[must_use]
    pub const fn offset(self, dt: Tick) -> Self {
        match self {
            Self::Finite(t) => Self::Finite(t + dt),
            other => other,
        }
    }
}

impl From<Tick> for TimeBound {
    fn from(t: Tick) -> Self {
        Self::Finite(t)
    }
}

impl std::fmt::Display for TimeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegInfinity => write!(f, "-∞"),
            Self::Finite(t) => write!(f, "{t}"),
            Self::PosInfinity => write!(f, "+∞"),
        }
    }
}

/// The validity window of a simulation object, `[start, end]`.
///
/// Either bound may be infinite. The window's only consumer inside the core
/// is [`TimeWindow::base_time`]; collisions are not filtered by validity,
/// matching the reference behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window.
    pub start: TimeBound,
    /// End of the window.
    pub end: TimeBound,
}

impl TimeWindow {
    /// Creates a window from two bounds.
    #[must_use]
    pub const fn new(start: TimeBound, end: TimeBound) -> Self {
        Self { start, end }
    }

    /// Creates a finite window from two ticks.
    #[must_use]
    pub const fn between(start: Tick, end: Tick) -> Self {
        Self {
            start: TimeBound::Finite(start),
            end: TimeBound::Finite(end),
        }
    }

    /// Creates the unbounded window.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            start: TimeBound::NegInfinity,
            end: TimeBound::PosInfinity,
        }
    }

    /// The temporal origin for an object's local relative-time coordinate:
    /// the start if finite, else the end if finite, else 0.
    #[must_use]
    pub fn base_time(self) -> Tick {
        self.start
            .finite()
            .or_else(|| self.end.finite())
            .unwrap_or(0)
    }

    /// Shift both bounds by `dt` (infinities stay infinite).
    #[must_use]
    pub const fn shifted(self, dt: Tick) -> Self {
        Self {
            start: self.start.offset(dt),
            end: self.end.offset(dt),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
