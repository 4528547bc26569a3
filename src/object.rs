//! Simulation objects: oriented segments that alter neighbor counting.
//!
//! Objects sit on gridlines. By convention an object's `(start_x, start_y)`
//! names a cell, and the segment runs along that cell's bottom-left corner
//! (so the actual line coordinates are offset by -0.5 in both axes).
//!
//! A boundary supplies a synthetic neighbor value to approaches from its
//! facing side; a portal relocates a traverser to its linked partner.

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction, Facing};
use crate::time::{Tick, TimeWindow};

/// Synthetic neighbor contribution supplied by a boundary.
///
/// `rel_pos` is 0 at the object's start and grows along its direction;
/// corner probing can call with `rel_pos` of -1 or `length`. `rel_time` is 0
/// at the object's base time. The value is not restricted to 0 or 1:
/// fractional and stronger-than-live contributions are allowed.
pub trait BoundaryBehavior {
    /// The neighbor value seen at `(rel_pos, rel_time)` on the segment.
    fn value(&self, rel_pos: i64, rel_time: Tick) -> f64;
}

impl<F> BoundaryBehavior for F
where
    F: Fn(i64, Tick) -> f64,
{
    fn value(&self, rel_pos: i64, rel_time: Tick) -> f64 {
        self(rel_pos, rel_time)
    }
}

/// A boundary that looks the same everywhere on the segment, at all times.
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub f64);

impl BoundaryBehavior for Constant {
    fn value(&self, _rel_pos: i64, _rel_time: Tick) -> f64 {
        self.0
    }
}

/// Opaque handle to a simulation object in an [`ObjectArena`].
///
/// Handles are assigned at insertion and stay valid until the arena is
/// cleared wholesale; portal links hold them instead of list positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub(crate) u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A link from one portal to its partner.
///
/// `strength` scales what is seen through the portal (carried in the model,
/// currently always 1.0 and not consumed by traversal). `temporal_shift` is
/// how far the partner sits in the future; the shift applied on crossing
/// emerges from the partners' base times, which the builder offsets by this
/// amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalLink {
    /// Handle of the partner portal.
    pub target: ObjectId,
    /// Live-value multiplier for matter seen through the portal.
    pub strength: f64,
    /// Ticks the partner lies in the future relative to this portal.
    pub temporal_shift: Tick,
}

/// The variant-specific half of a simulation object.
pub enum ObjectKind {
    /// Supplies a synthetic neighbor value from its facing side.
    Boundary {
        /// The value function over (relative position, relative time).
        behavior: Box<dyn BoundaryBehavior>,
    },
    /// Relocates a traverser to a partner portal.
    Portal {
        /// Partner links; builders create exactly one.
        links: Vec<PortalLink>,
    },
}

impl std::fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boundary { .. } => f.debug_struct("Boundary").finish_non_exhaustive(),
            Self::Portal { links } => f.debug_struct("Portal").field("links", links).finish(),
        }
    }
}

/// An oriented segment with a validity window and a boundary/portal payload.
#[derive(Debug)]
pub struct SimObject {
    /// Cell anchoring the segment's start (line runs along its bottom-left corner).
    pub start_x: i64,
    /// See `start_x`.
    pub start_y: i64,
    /// Direction the segment runs, start to end.
    pub direction: Direction,
    /// Segment length in cells. Positive.
    pub length: i64,
    /// Side of the segment the object affects.
    pub facing: Facing,
    /// Mirror the object's local position coordinate.
    pub reversed: bool,
    /// Validity window; either bound may be infinite.
    pub window: TimeWindow,
    /// Temporal origin for the object's relative-time coordinate.
    pub base_t: Tick,
    /// Boundary or portal payload.
    pub kind: ObjectKind,
}

impl SimObject {
    /// Create a boundary object. `base_t` is derived from the window.
    #[allow(clippy::too_many_arguments)]
    pub fn boundary(
        start_x: i64,
        start_y: i64,
        direction: Direction,
        length: i64,
        facing: Facing,
        reversed: bool,
        window: TimeWindow,
        behavior: impl BoundaryBehavior + 'static,
    ) -> Self {
        Self {
            start_x,
            start_y,
            direction,
            length,
            facing,
            reversed,
            window,
            base_t: window.base_time(),
            kind: ObjectKind::Boundary {
                behavior: Box::new(behavior),
            },
        }
    }

    /// Create a portal object. `base_t` is derived from the window.
    #[allow(clippy::too_many_arguments)]
    pub fn portal(
        start_x: i64,
        start_y: i64,
        direction: Direction,
        length: i64,
        facing: Facing,
        reversed: bool,
        window: TimeWindow,
        links: Vec<PortalLink>,
    ) -> Self {
        Self {
            start_x,
            start_y,
            direction,
            length,
            facing,
            reversed,
            window,
            base_t: window.base_time(),
            kind: ObjectKind::Portal { links },
        }
    }

    /// Returns true for portal objects.
    #[must_use]
    pub const fn is_portal(&self) -> bool {
        matches!(self.kind, ObjectKind::Portal { .. })
    }
}

/// Insertion-ordered arena of simulation objects.
///
/// Objects are only appended or cleared wholesale, never removed one by one,
/// so a handle is simply the slot it was inserted into.
#[derive(Debug, Default)]
pub struct ObjectArena {
    objects: Vec<SimObject>,
}

impl ObjectArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle the next insertion will receive.
    #[must_use]
    pub fn next_id(&self) -> ObjectId {
        self.upcoming_id(0)
    }

    /// The handle the insertion `ahead` slots from now will receive.
    ///
    /// Used by builders that insert interleaved groups of objects and need
    /// to cross-link them before all are inserted.
    #[must_use]
    pub fn upcoming_id(&self, ahead: usize) -> ObjectId {
        ObjectId((self.objects.len() + ahead) as u32)
    }

    /// Append an object, returning its handle.
    pub fn insert(&mut self, object: SimObject) -> ObjectId {
        let id = self.next_id();
        self.objects.push(object);
        id
    }

    /// Look up an object by handle.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&SimObject> {
        self.objects.get(id.0 as usize)
    }

    /// Iterate objects with their handles, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SimObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (ObjectId(i as u32), obj))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drop every object. All outstanding handles become dangling.
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
