//! `roboloop-runtime` – Mode Arbitration & Robot Lifecycle
//!
//! Composes the hardware context, the routine registry and the supervisory
//! tick into the object an execution host drives.
//!
//! # Modules
//!
//! - [`lifecycle`] – [`RobotLifecycle`][lifecycle::RobotLifecycle]: the host
//!   callback surface (`on_boot`, `on_tick`, `on_mode_change`).  Boot failures
//!   are fatal and surfaced as errors; everything after boot degrades
//!   gracefully.
//! - [`mode_controller`] – [`ModeController`][mode_controller::ModeController]:
//!   starts the mode-owned routines on entry to Autonomous/Teleop and cancels
//!   them on entry to Disabled.
//! - [`routines`] – the three mode-owned routines:
//!   [`TeleopDrive`][routines::TeleopDrive], [`Intake`][routines::Intake] and
//!   [`Elevator`][routines::Elevator].
//! - [`config`] – [`LifecycleConfig`][config::LifecycleConfig]: tick period,
//!   shutoff duration, routine enable flags and tuning.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod config;
pub mod lifecycle;
pub mod mode_controller;
pub mod routines;
pub mod telemetry;

pub use config::{DriveTuning, LifecycleConfig, RoutineToggles};
pub use lifecycle::{RobotLifecycle, RoutineStatusEntry, StatusSnapshot};
pub use mode_controller::ModeController;
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
