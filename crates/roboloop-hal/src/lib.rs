//! `roboloop-hal` – Hardware Abstraction Layer
//!
//! Narrow interfaces to everything the control core consumes but does not
//! own: actuators, the operator telemetry store, the power-health monitor,
//! the vision co-processor and the driver station controls.
//!
//! # Modules
//!
//! - [`gateway`] – [`ActuatorGateway`][gateway::ActuatorGateway]: pneumatic,
//!   drive and compressor outputs.  All calls are fire-and-forget.
//! - [`telemetry_store`] – [`TelemetryStore`][telemetry_store::TelemetryStore]
//!   and the in-process [`MemoryTelemetry`][telemetry_store::MemoryTelemetry]
//!   board.
//! - [`power`], [`vision`], [`operator`] – single-purpose collaborator traits.
//! - [`context`] – [`Hardware`][context::Hardware]: the one explicitly
//!   constructed handle set passed by reference to every routine.
//! - [`sim`] – recording stand-ins for all collaborators so the full stack
//!   runs headless in tests and in the CLI host.

pub mod context;
pub mod gateway;
pub mod operator;
pub mod power;
pub mod sim;
pub mod telemetry_store;
pub mod vision;

pub use context::Hardware;
pub use gateway::ActuatorGateway;
pub use operator::{OperatorCommands, OperatorInput};
pub use power::PowerMonitor;
pub use telemetry_store::{MemoryTelemetry, TelemetryStore};
pub use vision::VisionLink;
