//! Oriented-line geometry: directions, facings, corners, and the pure
//! helpers that convert between them.
//!
//! Simulation objects sit on gridlines, so their corner coordinates are
//! offset half a cell from cell centers. To keep every comparison exact,
//! helpers that deal with corners work in *half-cell units*: the center of
//! cell `(x, y)` is `(2x, 2y)` and its corners are the surrounding odd
//! coordinates. Cell-level APIs elsewhere stay in whole units.

use serde::{Deserialize, Serialize};

use crate::error::InvalidArgumentError;

/// One of the four cardinal directions on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit delta in cell units.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Classify a movement delta into a direction by sign, x taking
    /// precedence over y.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgumentError::NotACardinalStep` for the zero delta.
    pub const fn try_from_delta(dx: i64, dy: i64) -> Result<Self, InvalidArgumentError> {
        if dx > 0 {
            Ok(Self::Right)
        } else if dx < 0 {
            Ok(Self::Left)
        } else if dy > 0 {
            Ok(Self::Up)
        } else if dy < 0 {
            Ok(Self::Down)
        } else {
            Err(InvalidArgumentError::NotACardinalStep { dx, dy })
        }
    }

    /// Counterclockwise quarter turns from `Right`.
    #[must_use]
    pub const fn ccw_quarter_turns(self) -> i64 {
        match self {
            Self::Right => 0,
            Self::Up => 1,
            Self::Left => 2,
            Self::Down => 3,
        }
    }

    /// The direction at `quarter_turns` CCW from `Right` (wraps mod 4).
    #[must_use]
    pub const fn from_ccw_quarter_turns(quarter_turns: i64) -> Self {
        match quarter_turns.rem_euclid(4) {
            0 => Self::Right,
            1 => Self::Up,
            2 => Self::Left,
            _ => Self::Down,
        }
    }

    /// This direction rotated `quarter_turns` CCW (negative for CW).
    #[must_use]
    pub const fn rotated(self, quarter_turns: i64) -> Self {
        Self::from_ccw_quarter_turns(self.ccw_quarter_turns() + quarter_turns)
    }

    /// CCW quarter turns taking `self` onto `other`, in `0..=3`.
    #[must_use]
    pub const fn quarter_turns_to(self, other: Self) -> i64 {
        (other.ccw_quarter_turns() - self.ccw_quarter_turns()).rem_euclid(4)
    }

    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Which side of an oriented segment an object affects, relative to walking
/// from its start to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// A corner of a unit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    BottomLeft,
    TopLeft,
    BottomRight,
    TopRight,
}

/// The corner of the cell centered at `(x, y)`, in half-cell units.
#[must_use]
pub const fn cell_corner(x: i64, y: i64, corner: Corner) -> (i64, i64) {
    match corner {
        Corner::BottomLeft => (2 * x - 1, 2 * y - 1),
        Corner::TopLeft => (2 * x - 1, 2 * y + 1),
        Corner::BottomRight => (2 * x + 1, 2 * y - 1),
        Corner::TopRight => (2 * x + 1, 2 * y + 1),
    }
}

/// The far endpoint of a segment starting at cell `(x, y)` and running
/// `length` cells along `direction`, in cell units.
#[must_use]
pub const fn segment_end(x: i64, y: i64, direction: Direction, length: i64) -> (i64, i64) {
    let (dx, dy) = direction.delta();
    (x + dx * length, y + dy * length)
}

/// Shift a point perpendicular to `direction` by `amount` half-cells, toward
/// the `facing` side (left of travel is positive).
#[must_use]
pub const fn side_shift(x: i64, y: i64, direction: Direction, facing: Facing, amount: i64) -> (i64, i64) {
    let amount = match facing {
        Facing::Left => amount,
        Facing::Right => -amount,
    };

    match direction {
        Direction::Up => (x - amount, y),
        Direction::Down => (x + amount, y),
        Direction::Left => (x, y - amount),
        Direction::Right => (x, y + amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_delta_round_trip() {
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let (dx, dy) = dir.delta();
            assert_eq!(Direction::try_from_delta(dx, dy).unwrap(), dir);
        }
    }

    #[test]
    fn zero_delta_is_rejected() {
        assert!(Direction::try_from_delta(0, 0).is_err());
    }

    #[test]
    fn diagonal_delta_classifies_by_x_first() {
        assert_eq!(Direction::try_from_delta(1, 1).unwrap(), Direction::Right);
        assert_eq!(Direction::try_from_delta(-1, 1).unwrap(), Direction::Left);
    }

    #[test]
    fn quarter_turn_round_trip() {
        for k in 0..4 {
            assert_eq!(Direction::from_ccw_quarter_turns(k).ccw_quarter_turns(), k);
        }
        assert_eq!(Direction::from_ccw_quarter_turns(-1), Direction::Down);
    }

    #[test]
    fn quarter_turns_between_directions() {
        assert_eq!(Direction::Right.quarter_turns_to(Direction::Up), 1);
        assert_eq!(Direction::Up.quarter_turns_to(Direction::Right), 3);
        assert_eq!(Direction::Down.quarter_turns_to(Direction::Up), 2);
        assert_eq!(Direction::Left.quarter_turns_to(Direction::Left), 0);
    }

    #[test]
    fn rotated_wraps_in_both_directions() {
        assert_eq!(Direction::Right.rotated(1), Direction::Up);
        assert_eq!(Direction::Right.rotated(-1), Direction::Down);
        assert_eq!(Direction::Up.rotated(2), Direction::Down);
    }

    #[test]
    fn corners_surround_the_cell_center() {
        // Cell (3, -2) has center (6, -4) in half units.
        assert_eq!(cell_corner(3, -2, Corner::BottomLeft), (5, -5));
        assert_eq!(cell_corner(3, -2, Corner::TopRight), (7, -3));
        assert_eq!(cell_corner(0, 0, Corner::TopLeft), (-1, 1));
    }

    #[test]
    fn segment_end_per_direction() {
        assert_eq!(segment_end(0, 0, Direction::Up, 10), (0, 10));
        assert_eq!(segment_end(0, 0, Direction::Down, 10), (0, -10));
        assert_eq!(segment_end(2, 3, Direction::Left, 4), (-2, 3));
        assert_eq!(segment_end(2, 3, Direction::Right, 4), (6, 3));
    }

    #[test]
    fn side_shift_sign_follows_facing() {
        // Walking right, the left side is +y.
        assert_eq!(side_shift(0, 0, Direction::Right, Facing::Left, 1), (0, 1));
        assert_eq!(side_shift(0, 0, Direction::Right, Facing::Right, 1), (0, -1));
        // Walking up, the left side is -x.
        assert_eq!(side_shift(0, 0, Direction::Up, Facing::Left, 1), (-1, 0));
        assert_eq!(side_shift(0, 0, Direction::Up, Facing::Right, 1), (1, 0));
    }

    #[test]
    fn direction_serialization_uses_lowercase_words() {
        let json = serde_json::to_string(&Direction::Up).unwrap();
        assert_eq!(json, "\"up\"");
        let back: Direction = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(back, Direction::Left);
    }
}
