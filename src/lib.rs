//! # ChronoLife - Conway's Game of Life with a Memory
//!
//! ChronoLife runs the classic Game of Life over a sparse, time-indexed
//! board: every tick of history stays addressable until it is garbage
//! collected or locked, and the neighbor rule can be routed through
//! simulation objects (boundaries and portals) placed on gridlines.
//!
//! ## Core Concepts
//!
//! - **Board store**: liveness is a default state function plus per-tick
//!   override sets recording only the cells that differ
//! - **Simulator**: owns the store, the object arena, and the turn loop over
//!   a configured rectangle
//! - **Objects**: oriented segments; a boundary answers a synthetic neighbor
//!   value, a portal relocates whatever crosses it to a linked partner,
//!   possibly elsewhere in space and time
//! - **Traverser**: an immutable cursor that walks the board cell by cell,
//!   carrying an orientation frame so direction stays meaningful after
//!   rotating or mirroring portals
//!
//! ## Usage
//!
//! ```rust
//! use chronolife::{SimConfig, Simulator, Uniform};
//!
//! let mut sim = Simulator::new(SimConfig::default());
//! sim.set_default_state(Uniform(false));
//! sim.set_simulation_area(-10, -10, 10, 10);
//!
//! // A blinker.
//! for x in [-1, 0, 1] {
//!     sim.set_state_at(x, 0, 0, true)?;
//! }
//! sim.run_one_turn()?;
//!
//! assert!(sim.state_at(0, 1, 1)?);
//! assert!(!sim.state_at(-1, 0, 1)?);
//! # Ok::<(), chronolife::SimError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod object;
pub mod simulator;
pub mod state;
pub mod time;
pub mod traverser;

// Re-export primary types at crate root for convenience
pub use config::SimConfig;
pub use error::{ConfigurationError, InvalidArgumentError, SimError, SimResult};
pub use geometry::{Corner, Direction, Facing};
pub use object::{BoundaryBehavior, Constant, ObjectArena, ObjectId, ObjectKind, PortalLink, SimObject};
pub use simulator::{ExitPosition, PortalEnd, Rect, Simulator};
pub use state::{BoardState, DefaultState, PatternAt, Uniform};
pub use time::{Tick, TimeBound, TimeWindow};
pub use traverser::{BoardTraverser, Crossing, Frame};
