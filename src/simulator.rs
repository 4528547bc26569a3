//! Turn orchestration: the Conway rule over a sparse time-indexed board,
//! optionally routed through boundary and portal objects.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::{ConfigurationError, InvalidArgumentError, SimResult};
use crate::geometry::{cell_corner, side_shift, Corner, Direction, Facing};
use crate::object::{Constant, ObjectArena, ObjectId, PortalLink, SimObject};
use crate::state::{BoardState, DefaultState};
use crate::time::{Tick, TimeBound, TimeWindow};
use crate::traverser::BoardTraverser;

/// Inclusive rectangle scanned by [`Simulator::run_one_turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge, inclusive.
    pub x1: i64,
    /// Bottom edge, inclusive.
    pub y1: i64,
    /// Right edge, inclusive.
    pub x2: i64,
    /// Top edge, inclusive.
    pub y2: i64,
}

/// Geometry of one end of a portal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalEnd {
    /// Cell anchoring the segment's start.
    pub x: i64,
    /// See `x`.
    pub y: i64,
    /// Direction the segment runs.
    pub direction: Direction,
    /// Side of the segment the portal accepts traversers from.
    pub facing: Facing,
    /// Mirror the portal's local position coordinate.
    pub reversed: bool,
}

/// Where a traverser lands when exiting an object, in true coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPosition {
    /// Landing cell.
    pub x: i64,
    /// See `x`.
    pub y: i64,
    /// Landing tick.
    pub t: Tick,
    /// The direction of travel upon exit.
    pub direction: Direction,
}

/// The simulation engine: board store, object arena, area and turn counters.
///
/// A simulator is an explicitly owned value; whatever orchestrates turns and
/// rendering holds it and passes references down. No global instance exists.
#[derive(Debug)]
pub struct Simulator {
    state: BoardState,
    objects: ObjectArena,
    config: SimConfig,
    area: Option<Rect>,
    turn: u64,
    current_t: Tick,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulator {
    /// Create a simulator with the given tuning constants.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            state: BoardState::new(),
            objects: ObjectArena::new(),
            config,
            area: None,
            turn: 0,
            current_t: 0,
        }
    }

    // Board state passthroughs.

    /// Install (or replace) the default state function.
    pub fn set_default_state(&mut self, default_state: impl DefaultState + 'static) {
        self.state.set_default_state(default_state);
    }

    /// The liveness of cell `(x, y)` at tick `t`.
    ///
    /// # Errors
    ///
    /// Fails if no default state function has been installed.
    pub fn state_at(&self, x: i64, y: i64, t: Tick) -> SimResult<bool> {
        Ok(self.state.state_at(x, y, t)?)
    }

    /// Set the liveness of cell `(x, y)` at tick `t`. Writes at or below the
    /// locked floor are silently ignored.
    ///
    /// # Errors
    ///
    /// Fails if no default state function has been installed.
    pub fn set_state_at(&mut self, x: i64, y: i64, t: Tick, new_state: bool) -> SimResult<()> {
        Ok(self.state.set_state_at(x, y, t, new_state)?)
    }

    /// Flip the liveness of cell `(x, y)` at tick `t`.
    ///
    /// # Errors
    ///
    /// Fails if no default state function has been installed.
    pub fn toggle_state_at(&mut self, x: i64, y: i64, t: Tick) -> SimResult<()> {
        Ok(self.state.toggle_state_at(x, y, t)?)
    }

    /// The store's locked floor.
    #[must_use]
    pub fn locked_floor(&self) -> TimeBound {
        self.state.locked_floor()
    }

    /// Read access to the board store (debug tooling).
    #[must_use]
    pub fn board(&self) -> &BoardState {
        &self.state
    }

    // Simulation configuration.

    /// Define the inclusive rectangle scanned each turn. Must be set before
    /// [`Simulator::run_one_turn`].
    pub fn set_simulation_area(&mut self, x1: i64, y1: i64, x2: i64, y2: i64) {
        self.area = Some(Rect { x1, y1, x2, y2 });
    }

    /// The configured simulation rectangle, if any.
    #[must_use]
    pub fn simulation_area(&self) -> Option<Rect> {
        self.area
    }

    /// The tuning constants this simulator runs with.
    #[must_use]
    pub fn config(&self) -> SimConfig {
        self.config
    }

    /// Completed turn count.
    #[must_use]
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The tick the next turn will read from.
    #[must_use]
    pub fn current_time(&self) -> Tick {
        self.current_t
    }

    /// The registered simulation objects.
    #[must_use]
    pub fn objects(&self) -> &ObjectArena {
        &self.objects
    }

    // The rule.

    /// The Game of Life rule with numeric neighbor counts: a live cell
    /// survives on [2, 3] live neighbors, a dead cell is born on exactly 3.
    ///
    /// Counts may be fractional (averaged diagonal paths, weighted boundary
    /// values); the comparisons stay against the integer thresholds.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn next_cell_state(current_state: bool, live_neighbors: f64) -> bool {
        if current_state {
            live_neighbors >= 2.0 && live_neighbors <= 3.0
        } else {
            live_neighbors == 3.0
        }
    }

    /// A traverser positioned at `(x, y, t)` with the identity orientation.
    #[must_use]
    pub fn traverser(&self, x: i64, y: i64, t: Tick) -> BoardTraverser<'_> {
        BoardTraverser::new(self, x, y, t)
    }

    fn live_neighbors_simple(&self, x: i64, y: i64, t: Tick) -> SimResult<f64> {
        let mut live = 0.0;

        for (dx, dy) in [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ] {
            if self.state_at(x + dx, y + dy, t)? {
                live += 1.0;
            }
        }

        Ok(live)
    }

    fn live_neighbors_traversed(&self, x: i64, y: i64, t: Tick) -> SimResult<f64> {
        let start = self.traverser(x, y, t);
        let mut live = 0.0;

        // The four cardinal neighbors contribute at full weight.
        live += start.move_left()?.state_value()?;
        live += start.move_right()?.state_value()?;
        live += start.move_up()?.state_value()?;
        live += start.move_down()?.state_value()?;

        // Each diagonal neighbor is reached along both two-step paths, each
        // at half weight: an asymmetric arrangement of objects can make the
        // two paths disagree.
        live += start.move_right()?.move_up()?.state_value()? * 0.5;
        live += start.move_up()?.move_right()?.state_value()? * 0.5;
        live += start.move_right()?.move_down()?.state_value()? * 0.5;
        live += start.move_down()?.move_right()?.state_value()? * 0.5;
        live += start.move_left()?.move_up()?.state_value()? * 0.5;
        live += start.move_up()?.move_left()?.state_value()? * 0.5;
        live += start.move_left()?.move_down()?.state_value()? * 0.5;
        live += start.move_down()?.move_left()?.state_value()? * 0.5;

        Ok(live)
    }

    /// The live-neighbor count of cell `(x, y)` at tick `t`.
    ///
    /// With no objects registered every diagonal path is equivalent, so the
    /// count uses direct offset lookups; otherwise it walks a traverser.
    ///
    /// # Errors
    ///
    /// Propagates store configuration errors and broken portal links.
    pub fn live_neighbors(&self, x: i64, y: i64, t: Tick) -> SimResult<f64> {
        if self.objects.is_empty() {
            self.live_neighbors_simple(x, y, t)
        } else {
            self.live_neighbors_traversed(x, y, t)
        }
    }

    /// Advance the simulation by one turn.
    ///
    /// The full rectangle's next states are computed from tick `current_time`
    /// before any write lands at `current_time + 1`; a failing cell aborts
    /// the turn with the store and counters untouched. After the sweep the
    /// turn counters advance, idle counters tick, stale slices are
    /// collected, and the locked floor trails the new time.
    ///
    /// # Errors
    ///
    /// Fails if the simulation area or default state is missing, or a
    /// neighbor computation fails.
    pub fn run_one_turn(&mut self) -> SimResult<()> {
        let area = self.area.ok_or(ConfigurationError::NoSimulationArea)?;
        let t = self.current_t;

        let mut writes = Vec::new();
        for y in area.y1..=area.y2 {
            for x in area.x1..=area.x2 {
                let live_neighbors = self.live_neighbors(x, y, t)?;
                let current = self.state_at(x, y, t)?;
                writes.push((x, y, Self::next_cell_state(current, live_neighbors)));
            }
        }

        for (x, y, next) in writes {
            self.state.set_state_at(x, y, t + 1, next)?;
        }

        self.current_t += 1;
        self.turn += 1;

        self.state.advance_idle_counters();
        self.state.collect_garbage(self.config.gc_idle_turns);

        // Locking has no observable effect yet: nothing writes to a time
        // earlier than the current turn. The floor exists for operations
        // that could alter history.
        self.state
            .raise_locked_floor_to(t - self.config.lock_in_idle_turns);

        log::debug!("turn {} complete, now at t={}", self.turn, self.current_t);
        Ok(())
    }

    /// Clear all overrides, the locked floor, and the turn counters.
    /// Simulation objects are kept; see [`Simulator::reset_objects`].
    pub fn reset(&mut self) {
        self.state.reset();
        self.turn = 0;
        self.current_t = 0;
    }

    /// Drop every simulation object.
    pub fn reset_objects(&mut self) {
        self.objects.clear();
    }

    // Object builders.

    /// Register an ad-hoc object (custom behavior functions, hand-built
    /// portals) and return its handle.
    pub fn add_object(&mut self, object: SimObject) -> ObjectId {
        self.objects.insert(object)
    }

    fn check_length(length: i64) -> Result<(), InvalidArgumentError> {
        if length <= 0 {
            return Err(InvalidArgumentError::NonPositiveLength { length });
        }
        Ok(())
    }

    /// Add a simple two-sided wall: one boundary per facing, both answering
    /// `value` everywhere (0.0 reads as dead, 1.0 as live).
    ///
    /// # Errors
    ///
    /// Fails on a non-positive length.
    #[allow(clippy::too_many_arguments)]
    pub fn add_basic_boundary(
        &mut self,
        x: i64,
        y: i64,
        direction: Direction,
        length: i64,
        reversed: bool,
        window: TimeWindow,
        value: f64,
    ) -> SimResult<(ObjectId, ObjectId)> {
        Self::check_length(length)?;

        let left = self.objects.insert(SimObject::boundary(
            x,
            y,
            direction,
            length,
            Facing::Left,
            reversed,
            window,
            Constant(value),
        ));
        let right = self.objects.insert(SimObject::boundary(
            x,
            y,
            direction,
            length,
            Facing::Right,
            reversed,
            window,
            Constant(value),
        ));

        Ok((left, right))
    }

    /// Add a one-sided wall affecting only approaches from `facing`.
    ///
    /// # Errors
    ///
    /// Fails on a non-positive length.
    #[allow(clippy::too_many_arguments)]
    pub fn add_single_sided_boundary(
        &mut self,
        x: i64,
        y: i64,
        direction: Direction,
        length: i64,
        facing: Facing,
        reversed: bool,
        window: TimeWindow,
        value: f64,
    ) -> SimResult<ObjectId> {
        Self::check_length(length)?;

        Ok(self.objects.insert(SimObject::boundary(
            x,
            y,
            direction,
            length,
            facing,
            reversed,
            window,
            Constant(value),
        )))
    }

    /// Add a linked portal pair, each with an always-dead boundary on its
    /// back side. `temporal_shift` is how far the second portal sits in the
    /// future relative to the first.
    ///
    /// The four objects are inserted in a fixed order (portal A, A's back
    /// boundary, portal B, B's back boundary) and cross-linked by the
    /// handles they are about to receive.
    ///
    /// # Errors
    ///
    /// Fails on a non-positive length.
    pub fn add_portal_pair_with_back_boundaries(
        &mut self,
        first: PortalEnd,
        second: PortalEnd,
        length: i64,
        window: TimeWindow,
        temporal_shift: Tick,
    ) -> SimResult<(ObjectId, ObjectId)> {
        Self::check_length(length)?;

        let first_id = self.objects.upcoming_id(0);
        let second_id = self.objects.upcoming_id(2);

        self.objects.insert(SimObject::portal(
            first.x,
            first.y,
            first.direction,
            length,
            first.facing,
            first.reversed,
            window,
            vec![PortalLink {
                target: second_id,
                strength: 1.0,
                temporal_shift,
            }],
        ));
        self.objects.insert(SimObject::boundary(
            first.x,
            first.y,
            first.direction,
            length,
            first.facing.opposite(),
            false,
            window,
            Constant(0.0),
        ));

        let second_window = window.shifted(temporal_shift);
        self.objects.insert(SimObject::portal(
            second.x,
            second.y,
            second.direction,
            length,
            second.facing,
            second.reversed,
            second_window,
            vec![PortalLink {
                target: first_id,
                strength: 1.0,
                temporal_shift: -temporal_shift,
            }],
        ));
        self.objects.insert(SimObject::boundary(
            second.x,
            second.y,
            second.direction,
            length,
            second.facing.opposite(),
            false,
            second_window,
            Constant(0.0),
        ));

        Ok((first_id, second_id))
    }

    // Object coordinate mapping.

    /// Map an object-relative `(rel_pos, rel_time)` to the true grid
    /// position, time and direction of travel a traverser has upon exiting
    /// the object on its facing side.
    #[must_use]
    pub fn object_exit_position(
        &self,
        object: &SimObject,
        rel_pos: i64,
        rel_time: Tick,
    ) -> ExitPosition {
        // Exiting turns toward the facing side: +90 CCW for left, -90 for
        // right.
        let exit_direction = object.direction.rotated(match object.facing {
            Facing::Left => 1,
            Facing::Right => -1,
        });

        let rel_pos = if object.reversed {
            object.length - 1 - rel_pos
        } else {
            rel_pos
        };

        // Start corner, advanced (rel_pos + 0.5) cells along the segment,
        // then half a cell out the facing side. All in half-cell units; the
        // result is always a cell center.
        let (corner_x, corner_y) = cell_corner(object.start_x, object.start_y, Corner::BottomLeft);
        let (dx, dy) = object.direction.delta();
        let along = 2 * rel_pos + 1;
        let (half_x, half_y) = side_shift(
            corner_x + dx * along,
            corner_y + dy * along,
            object.direction,
            object.facing,
            1,
        );

        ExitPosition {
            x: half_x / 2,
            y: half_y / 2,
            t: rel_time + object.base_t,
            direction: exit_direction,
        }
    }

    /// The parity of a portal, from its (facing, reversed) configuration.
    /// Two linked portals with differing parity turn whatever crosses them
    /// into its mirror image.
    #[must_use]
    pub fn portal_parity(object: &SimObject) -> bool {
        match (object.facing, object.reversed) {
            (Facing::Left | Facing::Right, false) => false,
            (Facing::Left | Facing::Right, true) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Uniform;

    fn dead_sim() -> Simulator {
        let mut sim = Simulator::new(SimConfig::default());
        sim.set_default_state(Uniform(false));
        sim
    }

    #[test]
    fn rule_matches_conway() {
        // Live cell.
        assert!(!Simulator::next_cell_state(true, 0.0));
        assert!(!Simulator::next_cell_state(true, 1.0));
        assert!(Simulator::next_cell_state(true, 2.0));
        assert!(Simulator::next_cell_state(true, 3.0));
        assert!(!Simulator::next_cell_state(true, 4.0));

        // Dead cell.
        assert!(!Simulator::next_cell_state(false, 2.0));
        assert!(Simulator::next_cell_state(false, 3.0));
        assert!(!Simulator::next_cell_state(false, 4.0));
    }

    #[test]
    fn rule_accepts_fractional_counts() {
        assert!(Simulator::next_cell_state(true, 2.5));
        assert!(!Simulator::next_cell_state(false, 2.5));
        assert!(!Simulator::next_cell_state(true, 3.5));
    }

    #[test]
    fn simple_neighbor_count() {
        let mut sim = dead_sim();
        sim.set_state_at(1, 0, 0, true).unwrap();
        sim.set_state_at(1, 1, 0, true).unwrap();
        sim.set_state_at(-1, -1, 0, true).unwrap();
        // Two cells away: not a neighbor.
        sim.set_state_at(2, 0, 0, true).unwrap();

        assert!((sim.live_neighbors(0, 0, 0).unwrap() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn traversed_count_matches_simple_count_without_interference() {
        let mut sim = dead_sim();
        sim.set_state_at(1, 0, 0, true).unwrap();
        sim.set_state_at(0, 1, 0, true).unwrap();
        sim.set_state_at(1, 1, 0, true).unwrap();

        let simple = sim.live_neighbors_simple(0, 0, 0).unwrap();

        // A far-away wall forces the traverser path without affecting the
        // neighborhood.
        sim.add_basic_boundary(50, 50, Direction::Up, 3, false, TimeWindow::always(), 0.0)
            .unwrap();
        let traversed = sim.live_neighbors(0, 0, 0).unwrap();

        assert!((simple - traversed).abs() < f64::EPSILON);
        assert!((traversed - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn run_one_turn_requires_an_area() {
        let mut sim = dead_sim();
        let err = sim.run_one_turn().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn run_one_turn_advances_counters_and_floor() {
        let mut sim = Simulator::new(SimConfig {
            gc_idle_turns: 200,
            lock_in_idle_turns: 2,
        });
        sim.set_default_state(Uniform(false));
        sim.set_simulation_area(-3, -3, 3, 3);

        for _ in 0..4 {
            sim.run_one_turn().unwrap();
        }

        assert_eq!(sim.turn(), 4);
        assert_eq!(sim.current_time(), 4);
        // Floor trails the last sweep's start time (3) by the lock margin.
        assert_eq!(sim.locked_floor(), TimeBound::Finite(1));
    }

    #[test]
    fn reset_keeps_objects() {
        let mut sim = dead_sim();
        sim.set_simulation_area(-2, -2, 2, 2);
        sim.set_state_at(0, 0, 0, true).unwrap();
        sim.add_basic_boundary(10, 10, Direction::Up, 2, false, TimeWindow::always(), 0.0)
            .unwrap();
        sim.run_one_turn().unwrap();

        sim.reset();
        assert_eq!(sim.turn(), 0);
        assert_eq!(sim.current_time(), 0);
        assert!(!sim.state_at(0, 0, 0).unwrap());
        assert_eq!(sim.objects().len(), 2);

        sim.reset_objects();
        assert!(sim.objects().is_empty());
    }

    #[test]
    fn builders_reject_non_positive_lengths() {
        let mut sim = dead_sim();
        assert!(sim
            .add_basic_boundary(0, 0, Direction::Up, 0, false, TimeWindow::always(), 0.0)
            .unwrap_err()
            .is_invalid_argument());
        assert!(sim
            .add_single_sided_boundary(
                0,
                0,
                Direction::Up,
                -1,
                Facing::Left,
                false,
                TimeWindow::always(),
                0.0
            )
            .is_err());
    }

    #[test]
    fn basic_boundary_adds_both_facings() {
        let mut sim = dead_sim();
        let (left, right) = sim
            .add_basic_boundary(0, 0, Direction::Right, 4, false, TimeWindow::always(), 1.0)
            .unwrap();

        assert_eq!(sim.objects().get(left).unwrap().facing, Facing::Left);
        assert_eq!(sim.objects().get(right).unwrap().facing, Facing::Right);
    }

    #[test]
    fn portal_pair_links_are_symmetric() {
        let mut sim = dead_sim();
        let (a, b) = sim
            .add_portal_pair_with_back_boundaries(
                PortalEnd {
                    x: 0,
                    y: 0,
                    direction: Direction::Right,
                    facing: Facing::Left,
                    reversed: false,
                },
                PortalEnd {
                    x: 0,
                    y: 10,
                    direction: Direction::Right,
                    facing: Facing::Left,
                    reversed: false,
                },
                4,
                TimeWindow::between(0, 100),
                7,
            )
            .unwrap();

        // Insertion order: portal, back boundary, portal, back boundary.
        assert_eq!(sim.objects().len(), 4);
        let portal_a = sim.objects().get(a).unwrap();
        let portal_b = sim.objects().get(b).unwrap();
        assert!(portal_a.is_portal());
        assert!(portal_b.is_portal());

        let (crate::object::ObjectKind::Portal { links: links_a }, crate::object::ObjectKind::Portal { links: links_b }) =
            (&portal_a.kind, &portal_b.kind)
        else {
            panic!("expected portals");
        };
        assert_eq!(links_a[0].target, b);
        assert_eq!(links_b[0].target, a);
        assert_eq!(links_a[0].temporal_shift, 7);
        assert_eq!(links_b[0].temporal_shift, -7);

        // The shift lives in the partner's window and base time.
        assert_eq!(portal_b.base_t, 7);
        assert_eq!(portal_b.window, TimeWindow::between(7, 107));

        // Back boundaries face away from their portals.
        let backs: Vec<_> = sim
            .objects()
            .iter()
            .filter(|(_, o)| !o.is_portal())
            .collect();
        assert_eq!(backs.len(), 2);
        assert!(backs.iter().all(|(_, o)| o.facing == Facing::Right));
    }

    #[test]
    fn exit_position_per_facing() {
        let sim = dead_sim();
        let obj = SimObject::portal(
            0,
            0,
            Direction::Right,
            4,
            Facing::Left,
            false,
            TimeWindow::between(0, 100),
            vec![],
        );

        // Facing left of a rightward segment is up.
        let exit = sim.object_exit_position(&obj, 2, 5);
        assert_eq!((exit.x, exit.y, exit.t), (2, 0, 5));
        assert_eq!(exit.direction, Direction::Up);

        let obj = SimObject::portal(
            0,
            0,
            Direction::Right,
            4,
            Facing::Right,
            false,
            TimeWindow::between(0, 100),
            vec![],
        );
        let exit = sim.object_exit_position(&obj, 0, 0);
        assert_eq!((exit.x, exit.y), (0, -1));
        assert_eq!(exit.direction, Direction::Down);
    }

    #[test]
    fn exit_position_mirrors_when_reversed() {
        let sim = dead_sim();
        let obj = SimObject::portal(
            0,
            0,
            Direction::Up,
            5,
            Facing::Left,
            true,
            TimeWindow::between(10, 100),
            vec![],
        );

        // rel_pos 1 mirrors to 3; facing left of an upward segment is -x.
        let exit = sim.object_exit_position(&obj, 1, 4);
        assert_eq!((exit.x, exit.y, exit.t), (-1, 3, 14));
        assert_eq!(exit.direction, Direction::Left);
    }

    #[test]
    fn parity_depends_on_reversal() {
        let window = TimeWindow::always();
        let plain = SimObject::portal(0, 0, Direction::Up, 3, Facing::Left, false, window, vec![]);
        let mirrored = SimObject::portal(0, 0, Direction::Up, 3, Facing::Left, true, window, vec![]);
        let mirrored_right =
            SimObject::portal(0, 0, Direction::Up, 3, Facing::Right, true, window, vec![]);

        assert!(!Simulator::portal_parity(&plain));
        assert!(Simulator::portal_parity(&mirrored));
        assert!(Simulator::portal_parity(&mirrored_right));
    }
}
