//! Coordinate-frame-aware board traversal.
//!
//! A [`BoardTraverser`] is an immutable cursor over a simulator's board:
//! every movement method returns a new traverser and never mutates the
//! receiver. It carries an affine orientation [`Frame`] so that "left" and
//! "up" stay meaningful after passing through a rotating or mirroring
//! portal, and it detects collisions with simulation objects as it steps.

use crate::error::{ConfigurationError, SimResult};
use crate::geometry::{cell_corner, segment_end, Corner, Direction, Facing};
use crate::object::{ObjectId, ObjectKind, SimObject};
use crate::simulator::Simulator;
use crate::time::Tick;

/// A 2x2 integer transform mapping the traverser's own axes onto true grid
/// axes. Only rotations by quarter turns and axis flips occur, so every
/// entry is -1, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// True-x component of the local x axis.
    pub xx: i64,
    /// True-y component of the local x axis.
    pub xy: i64,
    /// True-x component of the local y axis.
    pub yx: i64,
    /// True-y component of the local y axis.
    pub yy: i64,
}

impl Frame {
    /// The untransformed frame.
    pub const IDENTITY: Self = Self {
        xx: 1,
        xy: 0,
        yx: 0,
        yy: 1,
    };

    /// Rotate the frame `quarter_turns` CCW (wraps mod 4).
    #[must_use]
    pub const fn rotate(self, quarter_turns: i64) -> Self {
        match quarter_turns.rem_euclid(4) {
            1 => Self {
                xx: -self.xy,
                xy: self.xx,
                yx: -self.yy,
                yy: self.yx,
            },
            2 => Self {
                xx: -self.xx,
                xy: -self.xy,
                yx: -self.yx,
                yy: -self.yy,
            },
            3 => Self {
                xx: self.xy,
                xy: -self.xx,
                yx: self.yy,
                yy: -self.yx,
            },
            _ => self,
        }
    }

    /// Mirror the true x axis.
    #[must_use]
    pub const fn flip_x(self) -> Self {
        Self {
            xx: -self.xx,
            yx: -self.yx,
            ..self
        }
    }

    /// Mirror the true y axis.
    #[must_use]
    pub const fn flip_y(self) -> Self {
        Self {
            xy: -self.xy,
            yy: -self.yy,
            ..self
        }
    }

    /// Map a local delta to a true-grid delta.
    #[must_use]
    pub const fn apply(self, dx: i64, dy: i64) -> (i64, i64) {
        (
            self.xx * dx + self.yx * dy,
            self.xy * dx + self.yy * dy,
        )
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Result of a collision scan: which object a step would cross, and where
/// on the object the crossing happens in the object's local coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Crossing {
    /// The crossed object.
    pub id: ObjectId,
    /// 0-based position along the segment, `reversed` already applied.
    pub rel_pos: i64,
    /// Time relative to the object's base time.
    pub rel_time: Tick,
}

/// Fields present while the cursor is engaged with a boundary.
#[derive(Debug, Clone, Copy)]
struct Engagement {
    object: ObjectId,
    /// Stepping this way leaves the boundary without moving.
    disengage: Direction,
    /// The direction along the boundary in which `rel_pos` grows (the
    /// object's direction, or its opposite when the object is reversed).
    travel: Direction,
    rel_pos: i64,
    rel_time: Tick,
}

/// An immutable cursor over a simulator's board.
#[derive(Debug, Clone, Copy)]
pub struct BoardTraverser<'a> {
    sim: &'a Simulator,
    x: i64,
    y: i64,
    t: Tick,
    frame: Frame,
    engaged: Option<Engagement>,
}

impl<'a> BoardTraverser<'a> {
    pub(crate) fn new(sim: &'a Simulator, x: i64, y: i64, t: Tick) -> Self {
        Self {
            sim,
            x,
            y,
            t,
            frame: Frame::IDENTITY,
            engaged: None,
        }
    }

    /// Current true grid position.
    #[must_use]
    pub const fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Current time.
    #[must_use]
    pub const fn time(&self) -> Tick {
        self.t
    }

    /// Current orientation frame.
    #[must_use]
    pub const fn frame(&self) -> Frame {
        self.frame
    }

    /// Whether the cursor is currently engaged with a boundary.
    #[must_use]
    pub const fn is_inside_boundary(&self) -> bool {
        self.engaged.is_some()
    }

    /// The live value seen at the cursor: the boundary's behavior value when
    /// engaged, otherwise the board state (1.0 alive, 0.0 dead).
    ///
    /// # Errors
    ///
    /// Propagates store configuration errors, and fails if an engaged object
    /// handle no longer resolves.
    pub fn state_value(&self) -> SimResult<f64> {
        match self.engaged {
            Some(engagement) => {
                let object = self
                    .sim
                    .objects()
                    .get(engagement.object)
                    .ok_or(ConfigurationError::MissingObject {
                        id: engagement.object,
                    })?;

                match &object.kind {
                    ObjectKind::Boundary { behavior } => {
                        Ok(behavior.value(engagement.rel_pos, engagement.rel_time))
                    }
                    // Engagements are only ever created for boundaries.
                    ObjectKind::Portal { .. } => Err(ConfigurationError::MissingObject {
                        id: engagement.object,
                    }
                    .into()),
                }
            }
            None => {
                let alive = self.sim.state_at(self.x, self.y, self.t)?;
                Ok(if alive { 1.0 } else { 0.0 })
            }
        }
    }

    /// Scan all simulation objects for one whose segment this true-grid step
    /// would cross.
    ///
    /// A crossing requires the object to be perpendicular to the movement
    /// axis, immediately in front of the cursor, spanning the cursor's
    /// off-axis coordinate, and oriented/faced so that the step enters from
    /// the object's effect side.
    #[must_use]
    pub fn find_crossing(&self, dx: i64, dy: i64) -> Option<Crossing> {
        // Cursor center in half-cell units.
        let (hx, hy) = (2 * self.x, 2 * self.y);

        for (id, object) in self.sim.objects().iter() {
            let moving_horizontally = dx != 0;
            if object.direction.is_horizontal() == moving_horizontally {
                // Parallel objects never block motion along themselves.
                continue;
            }

            let (mut lo_x, mut lo_y) =
                cell_corner(object.start_x, object.start_y, Corner::BottomLeft);
            let (end_x, end_y) =
                segment_end(object.start_x, object.start_y, object.direction, object.length);
            let (mut hi_x, mut hi_y) = cell_corner(end_x, end_y, Corner::BottomLeft);

            if hi_x < lo_x {
                std::mem::swap(&mut lo_x, &mut hi_x);
            }
            if hi_y < lo_y {
                std::mem::swap(&mut lo_y, &mut hi_y);
            }

            let crossed = if moving_horizontally {
                // Vertical object: gridline at lo_x (== hi_x), one half-step
                // in front of the cursor, cursor's y strictly inside span.
                let fronting = if dx > 0 { hx + 1 == lo_x } else { hx - 1 == lo_x };
                fronting
                    && hy > lo_y
                    && hy < hi_y
                    && crosses_on_horizontal_step(object.direction, object.facing, dx > 0)
            } else {
                let fronting = if dy > 0 { hy + 1 == lo_y } else { hy - 1 == lo_y };
                fronting
                    && hx > lo_x
                    && hx < hi_x
                    && crosses_on_vertical_step(object.direction, object.facing, dy > 0)
            };

            if !crossed {
                continue;
            }

            let mut rel_pos = match object.direction {
                Direction::Up => self.y - object.start_y,
                Direction::Down => object.start_y - 1 - self.y,
                Direction::Right => self.x - object.start_x,
                Direction::Left => object.start_x - 1 - self.x,
            };
            if object.reversed {
                rel_pos = object.length - 1 - rel_pos;
            }

            return Some(Crossing {
                id,
                rel_pos,
                rel_time: self.t - object.base_t,
            });
        }

        None
    }

    /// Step by a true-grid cardinal delta, handling collisions.
    ///
    /// # Errors
    ///
    /// Fails on a zero delta, on a dangling portal link, or when the store
    /// lookup behind a portal resolution fails.
    pub fn true_move_by(&self, dx: i64, dy: i64) -> SimResult<Self> {
        let movement = Direction::try_from_delta(dx, dy)?;

        let Some(engagement) = self.engaged else {
            return self.free_move(movement, dx, dy);
        };

        if movement == engagement.disengage {
            // Leaving the boundary: position was never inside it.
            let mut next = *self;
            next.engaged = None;
            return Ok(next);
        }

        if movement.is_horizontal() == engagement.travel.is_horizontal() {
            // Slide along the boundary.
            let mut next = *self;
            next.x += dx;
            next.y += dy;
            next.engaged = Some(Engagement {
                rel_pos: if movement == engagement.travel {
                    engagement.rel_pos + 1
                } else {
                    engagement.rel_pos - 1
                },
                ..engagement
            });
            return Ok(next);
        }

        // Perpendicular but not the disengage direction: deeper into the
        // boundary, which is a no-op.
        Ok(*self)
    }

    fn free_move(&self, movement: Direction, dx: i64, dy: i64) -> SimResult<Self> {
        let Some(crossing) = self.find_crossing(dx, dy) else {
            let mut next = *self;
            next.x += dx;
            next.y += dy;
            return Ok(next);
        };

        let object = self
            .sim
            .objects()
            .get(crossing.id)
            .ok_or(ConfigurationError::MissingObject { id: crossing.id })?;

        match &object.kind {
            ObjectKind::Boundary { .. } => {
                let mut next = *self;
                next.engaged = Some(Engagement {
                    object: crossing.id,
                    disengage: movement.opposite(),
                    travel: if object.reversed {
                        object.direction.opposite()
                    } else {
                        object.direction
                    },
                    rel_pos: crossing.rel_pos,
                    rel_time: crossing.rel_time,
                });
                Ok(next)
            }
            ObjectKind::Portal { links } => {
                self.cross_portal(crossing, object, links.first(), movement)
            }
        }
    }

    fn cross_portal(
        &self,
        crossing: Crossing,
        portal: &SimObject,
        link: Option<&crate::object::PortalLink>,
        movement: Direction,
    ) -> SimResult<Self> {
        let link = link.ok_or(ConfigurationError::UnlinkedPortal { id: crossing.id })?;
        let partner = self
            .sim
            .objects()
            .get(link.target)
            .ok_or(ConfigurationError::MissingObject { id: link.target })?;

        let exit = self
            .sim
            .object_exit_position(partner, crossing.rel_pos, crossing.rel_time);

        let mut next = *self;
        next.frame = next.frame.rotate(movement.quarter_turns_to(exit.direction));

        if Simulator::portal_parity(portal) != Simulator::portal_parity(partner) {
            // Mismatched parity mirrors the exit across the axis parallel to
            // the entry direction.
            next.frame = if movement.is_horizontal() {
                next.frame.flip_y()
            } else {
                next.frame.flip_x()
            };
        }

        log::trace!(
            "portal crossing {} -> {}: ({}, {}, {}) -> ({}, {}, {})",
            crossing.id,
            link.target,
            self.x,
            self.y,
            self.t,
            exit.x,
            exit.y,
            exit.t
        );

        next.x = exit.x;
        next.y = exit.y;
        next.t = exit.t;
        Ok(next)
    }

    /// Step by a unit delta expressed in the traverser's own frame.
    ///
    /// # Errors
    ///
    /// See [`BoardTraverser::true_move_by`].
    pub fn move_by(&self, dx: i64, dy: i64) -> SimResult<Self> {
        let (true_dx, true_dy) = self.frame.apply(dx, dy);
        self.true_move_by(true_dx, true_dy)
    }

    /// Step one cell left in the traverser's own frame.
    pub fn move_left(&self) -> SimResult<Self> {
        self.move_by(-1, 0)
    }

    /// Step one cell right in the traverser's own frame.
    pub fn move_right(&self) -> SimResult<Self> {
        self.move_by(1, 0)
    }

    /// Step one cell up in the traverser's own frame.
    pub fn move_up(&self) -> SimResult<Self> {
        self.move_by(0, 1)
    }

    /// Step one cell down in the traverser's own frame.
    pub fn move_down(&self) -> SimResult<Self> {
        self.move_by(0, -1)
    }

    /// Rotate the frame `quarter_turns` CCW.
    #[must_use]
    pub fn rotate(&self, quarter_turns: i64) -> Self {
        let mut next = *self;
        next.frame = next.frame.rotate(quarter_turns);
        next
    }

    /// Mirror the frame's true x axis.
    #[must_use]
    pub fn flip_x(&self) -> Self {
        let mut next = *self;
        next.frame = next.frame.flip_x();
        next
    }

    /// Mirror the frame's true y axis.
    #[must_use]
    pub fn flip_y(&self) -> Self {
        let mut next = *self;
        next.frame = next.frame.flip_y();
        next
    }
}

/// Does a horizontal step across a vertical object's gridline count as a
/// crossing, given the object's direction and facing?
const fn crosses_on_horizontal_step(direction: Direction, facing: Facing, step_positive: bool) -> bool {
    matches!(
        (direction, facing, step_positive),
        (Direction::Down, Facing::Left, false)
            | (Direction::Down, Facing::Right, true)
            | (Direction::Up, Facing::Left, true)
            | (Direction::Up, Facing::Right, false)
    )
}

/// Vertical-step analog of [`crosses_on_horizontal_step`].
const fn crosses_on_vertical_step(direction: Direction, facing: Facing, step_positive: bool) -> bool {
    matches!(
        (direction, facing, step_positive),
        (Direction::Left, Facing::Left, true)
            | (Direction::Left, Facing::Right, false)
            | (Direction::Right, Facing::Left, false)
            | (Direction::Right, Facing::Right, true)
    )
}
