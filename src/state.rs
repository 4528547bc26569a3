//! Sparse, time-indexed board state.
//!
//! The store keeps only the *difference* between the board and a default
//! state function: per tick, a set of coordinates whose liveness is flipped
//! relative to the default. Memory is proportional to the number of
//! differing cells, not to board size or time range.
//!
//! Key invariants:
//! - Re-asserting the default value at a cell removes its override.
//! - Writes at or below the locked floor are silent no-ops.
//! - A tick's slice is dropped once it stays idle past the GC threshold.
//!
//! Sharp edge: installing a *different* default function while overrides
//! exist re-interprets those overrides against the new function, because
//! they record "differs from default", not an absolute value. This is
//! preserved behavior, not a bug; see `default_swap_reinterprets_overrides`.

use std::collections::{HashMap, HashSet};

use crate::error::ConfigurationError;
use crate::time::{Tick, TimeBound};

/// Baseline liveness of every cell absent any override.
///
/// Implementations must be pure: the same `(x, y, t)` always yields the same
/// answer. Any `Fn(i64, i64, Tick) -> bool` closure qualifies.
pub trait DefaultState {
    /// The default liveness of cell `(x, y)` at tick `t`.
    fn state(&self, x: i64, y: i64, t: Tick) -> bool;
}

impl<F> DefaultState for F
where
    F: Fn(i64, i64, Tick) -> bool,
{
    fn state(&self, x: i64, y: i64, t: Tick) -> bool {
        self(x, y, t)
    }
}

/// The uniform default state: every cell is `self.0` at every tick.
#[derive(Debug, Clone, Copy)]
pub struct Uniform(pub bool);

impl DefaultState for Uniform {
    fn state(&self, _x: i64, _y: i64, _t: Tick) -> bool {
        self.0
    }
}

/// A time-independent pattern stamped at an offset on an otherwise dead
/// board. Covers the preset-pattern loaders (gliders, guns, ...) that live
/// outside the core.
#[derive(Debug, Clone)]
pub struct PatternAt {
    origin: (i64, i64),
    cells: HashSet<(i64, i64)>,
}

impl PatternAt {
    /// Create a pattern whose cells are given relative to `origin`.
    pub fn new(origin: (i64, i64), cells: impl IntoIterator<Item = (i64, i64)>) -> Self {
        Self {
            origin,
            cells: cells.into_iter().collect(),
        }
    }
}

impl DefaultState for PatternAt {
    fn state(&self, x: i64, y: i64, _t: Tick) -> bool {
        self.cells.contains(&(x - self.origin.0, y - self.origin.1))
    }
}

/// One tick's worth of overrides plus its idle counter.
#[derive(Debug, Default)]
struct TimeSlice {
    flipped: HashSet<(i64, i64)>,
    turns_idle: u64,
}

/// The sparse overlay store over a default state function.
pub struct BoardState {
    default_state: Option<Box<dyn DefaultState>>,
    slices: HashMap<Tick, TimeSlice>,
    locked_floor: TimeBound,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Create an empty store with no default state installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_state: None,
            slices: HashMap::new(),
            locked_floor: TimeBound::NegInfinity,
        }
    }

    /// Install (or replace) the default state function.
    ///
    /// Replacing the function while overrides exist re-interprets them; see
    /// the module docs.
    pub fn set_default_state(&mut self, default_state: impl DefaultState + 'static) {
        self.default_state = Some(Box::new(default_state));
    }

    fn default_at(&self, x: i64, y: i64, t: Tick) -> Result<bool, ConfigurationError> {
        let f = self
            .default_state
            .as_ref()
            .ok_or(ConfigurationError::NoDefaultState)?;
        Ok(f.state(x, y, t))
    }

    /// The liveness of cell `(x, y)` at tick `t`: the default, flipped if an
    /// override is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NoDefaultState` if no default state
    /// function has been installed.
    pub fn state_at(&self, x: i64, y: i64, t: Tick) -> Result<bool, ConfigurationError> {
        let default = self.default_at(x, y, t)?;
        let flipped = self
            .slices
            .get(&t)
            .is_some_and(|slice| slice.flipped.contains(&(x, y)));
        Ok(default != flipped)
    }

    /// Set the liveness of cell `(x, y)` at tick `t`.
    ///
    /// A write at or below the locked floor is silently ignored. Writing the
    /// default value removes any override (pruning the tick's slice when it
    /// empties); writing the non-default value records one and resets the
    /// slice's idle counter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NoDefaultState` if no default state
    /// function has been installed.
    pub fn set_state_at(
        &mut self,
        x: i64,
        y: i64,
        t: Tick,
        new_state: bool,
    ) -> Result<(), ConfigurationError> {
        let default = self.default_at(x, y, t)?;

        if self.locked_floor >= TimeBound::Finite(t) {
            return Ok(());
        }

        if new_state == default {
            if let Some(slice) = self.slices.get_mut(&t) {
                slice.flipped.remove(&(x, y));
                slice.turns_idle = 0;

                if slice.flipped.is_empty() {
                    self.slices.remove(&t);
                }
            }
        } else {
            let slice = self.slices.entry(t).or_default();
            slice.turns_idle = 0;
            slice.flipped.insert((x, y));
        }

        Ok(())
    }

    /// Flip the liveness of cell `(x, y)` at tick `t`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NoDefaultState` if no default state
    /// function has been installed.
    pub fn toggle_state_at(&mut self, x: i64, y: i64, t: Tick) -> Result<(), ConfigurationError> {
        let current = self.state_at(x, y, t)?;
        self.set_state_at(x, y, t, !current)
    }

    /// Bump every tracked slice's idle counter. Called once per turn.
    pub fn advance_idle_counters(&mut self) {
        for slice in self.slices.values_mut() {
            slice.turns_idle += 1;
        }
    }

    /// Drop every slice whose idle counter exceeds `threshold`. Called once
    /// per turn, after [`BoardState::advance_idle_counters`].
    pub fn collect_garbage(&mut self, threshold: u64) {
        let before = self.slices.len();
        self.slices.retain(|_, slice| slice.turns_idle <= threshold);

        let removed = before - self.slices.len();
        if removed > 0 {
            log::debug!("gc dropped {removed} stale time slices");
        }
    }

    /// Raise the locked floor to tick `t` if that is above the current floor.
    /// The floor never decreases.
    pub fn raise_locked_floor_to(&mut self, t: Tick) {
        let candidate = TimeBound::Finite(t);
        if candidate > self.locked_floor {
            log::trace!("locked floor raised to {t}");
            self.locked_floor = candidate;
        }
    }

    /// The current locked floor. Writes at or below it are rejected.
    #[must_use]
    pub fn locked_floor(&self) -> TimeBound {
        self.locked_floor
    }

    /// Clear all overrides and reset the locked floor. The default state
    /// function is kept.
    pub fn reset(&mut self) {
        self.slices.clear();
        self.locked_floor = TimeBound::NegInfinity;
    }

    /// Number of ticks currently holding overrides.
    #[must_use]
    pub fn tracked_slices(&self) -> usize {
        self.slices.len()
    }

    /// Whether cell `(x, y)` carries an override at tick `t`.
    #[must_use]
    pub fn has_override(&self, x: i64, y: i64, t: Tick) -> bool {
        self.slices
            .get(&t)
            .is_some_and(|slice| slice.flipped.contains(&(x, y)))
    }
}

impl std::fmt::Debug for BoardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardState")
            .field("has_default_state", &self.default_state.is_some())
            .field("tracked_slices", &self.slices.len())
            .field("locked_floor", &self.locked_floor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead_board() -> BoardState {
        let mut state = BoardState::new();
        state.set_default_state(Uniform(false));
        state
    }

    #[test]
    fn query_without_default_state_fails() {
        let state = BoardState::new();
        assert!(matches!(
            state.state_at(0, 0, 0),
            Err(ConfigurationError::NoDefaultState)
        ));

        let mut state = BoardState::new();
        assert!(state.set_state_at(0, 0, 0, true).is_err());
    }

    #[test]
    fn unwritten_cells_follow_the_default() {
        let mut state = BoardState::new();
        state.set_default_state(|x: i64, y: i64, _t: Tick| x == y);

        assert!(state.state_at(3, 3, 0).unwrap());
        assert!(!state.state_at(3, 4, 99).unwrap());
    }

    #[test]
    fn write_then_read_back() {
        let mut state = dead_board();
        state.set_state_at(2, -5, 10, true).unwrap();

        assert!(state.state_at(2, -5, 10).unwrap());
        // Same cell at another tick is untouched.
        assert!(!state.state_at(2, -5, 11).unwrap());
    }

    #[test]
    fn rewriting_the_default_value_cancels_the_override() {
        let mut state = dead_board();
        state.set_state_at(1, 1, 0, true).unwrap();
        assert_eq!(state.tracked_slices(), 1);

        state.set_state_at(1, 1, 0, false).unwrap();
        assert!(!state.state_at(1, 1, 0).unwrap());
        // The only entry is gone, so the slice is pruned too.
        assert_eq!(state.tracked_slices(), 0);
    }

    #[test]
    fn toggle_twice_restores_the_original_value() {
        let mut state = dead_board();
        state.toggle_state_at(4, 4, 2).unwrap();
        assert!(state.state_at(4, 4, 2).unwrap());

        state.toggle_state_at(4, 4, 2).unwrap();
        assert!(!state.state_at(4, 4, 2).unwrap());
        assert_eq!(state.tracked_slices(), 0);
    }

    #[test]
    fn locked_floor_is_monotonic_and_blocks_writes() {
        let mut state = dead_board();
        state.raise_locked_floor_to(5);
        state.raise_locked_floor_to(3);
        assert_eq!(state.locked_floor(), TimeBound::Finite(5));

        // At or below the floor: silently ignored.
        state.set_state_at(0, 0, 5, true).unwrap();
        state.set_state_at(0, 0, 4, true).unwrap();
        assert!(!state.state_at(0, 0, 5).unwrap());
        assert!(!state.state_at(0, 0, 4).unwrap());

        // Above the floor: accepted.
        state.set_state_at(0, 0, 6, true).unwrap();
        assert!(state.state_at(0, 0, 6).unwrap());
    }

    #[test]
    fn gc_drops_slices_past_the_idle_threshold() {
        let mut state = dead_board();
        state.set_state_at(0, 0, 0, true).unwrap();
        state.set_state_at(0, 0, 1, true).unwrap();

        // Tick 1 gets a refreshing write each turn; tick 0 goes idle.
        for turn in 0..3 {
            state.advance_idle_counters();
            state.set_state_at(turn, 7, 1, true).unwrap();
            state.collect_garbage(2);
        }

        assert!(!state.has_override(0, 0, 0));
        assert!(state.has_override(0, 0, 1));
        // The default-based answer is still served for the dropped tick.
        assert!(!state.state_at(0, 0, 0).unwrap());
    }

    #[test]
    fn reset_clears_overrides_and_floor() {
        let mut state = dead_board();
        state.set_state_at(0, 0, 3, true).unwrap();
        state.raise_locked_floor_to(10);

        state.reset();
        assert_eq!(state.tracked_slices(), 0);
        assert_eq!(state.locked_floor(), TimeBound::NegInfinity);
        // Writes below the old floor work again.
        state.set_state_at(0, 0, 3, true).unwrap();
        assert!(state.state_at(0, 0, 3).unwrap());
    }

    #[test]
    fn default_swap_reinterprets_overrides() {
        // Overrides record "differs from default", not an absolute value, so
        // swapping the default function changes their meaning. Documented
        // sharp edge; do not "fix".
        let mut state = dead_board();
        state.set_state_at(0, 0, 0, true).unwrap();
        assert!(state.state_at(0, 0, 0).unwrap());

        state.set_default_state(Uniform(true));
        assert!(!state.state_at(0, 0, 0).unwrap());
    }

    #[test]
    fn pattern_default_stamps_at_offset() {
        let pattern = PatternAt::new((10, 10), [(0, 0), (1, 0)]);
        let mut state = BoardState::new();
        state.set_default_state(pattern);

        assert!(state.state_at(10, 10, 0).unwrap());
        assert!(state.state_at(11, 10, 50).unwrap());
        assert!(!state.state_at(12, 10, 0).unwrap());
    }
}
