//! `roboloop-kernel` – Routine Lifecycle & Safety Interlock
//!
//! The part of the control core that decides nothing about *what* the robot
//! should be doing; it enforces how routines live and die and protects the
//! pneumatic supply.
//!
//! # Modules
//!
//! - [`routine`] – [`ControlRoutine`][routine::ControlRoutine] and the
//!   [`RoutineSlot`][routine::RoutineSlot] that wraps it with an idempotent
//!   Idle/Running/Cancelling lifecycle.
//! - [`routine_set`] – [`RoutineSet`][routine_set::RoutineSet]: the fixed,
//!   enumerable registry of every routine, stepped cooperatively once per
//!   tick.  Start/cancel authority is split by type: the mode controller only
//!   ever sees [`ModeRoutines`][routine_set::ModeRoutines]; the compressor
//!   shutoff slot is reachable only from this crate.
//! - [`compressor_shutoff`] – [`CompressorShutoff`][compressor_shutoff::CompressorShutoff]:
//!   the self-terminating routine that rests the compressor for a fixed
//!   duration.
//! - [`supervisor`] – [`SupervisoryTick`][supervisor::SupervisoryTick]: the
//!   fixed-rate entry point that pumps the routines and arms the brownout
//!   interlock.

pub mod compressor_shutoff;
pub mod routine;
pub mod routine_set;
pub mod supervisor;

pub use compressor_shutoff::{CompressorShutoff, DEFAULT_SHUTOFF_DURATION};
pub use routine::{ControlRoutine, RoutineSlot, RoutineStatus};
pub use routine_set::{ModeRoutines, RoutineSet};
pub use supervisor::{SupervisoryTick, TickReport};
