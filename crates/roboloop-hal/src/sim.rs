//! In-process simulated collaborators for headless testing without a robot.
//!
//! Every stand-in is a cheap cloneable handle onto shared state: hand one
//! clone to the control core inside a [`Hardware`] context and keep another
//! to inspect what the core commanded or to play the operator.
//!
//! # Example
//!
//! ```rust
//! use roboloop_hal::ActuatorGateway;
//! use roboloop_hal::sim::SimHardware;
//! use roboloop_types::{Gear, GearSide};
//!
//! let sim = SimHardware::new();
//! let mut hw = sim.build();
//!
//! hw.gateway.set_gear(GearSide::Left, Gear::Low).unwrap();
//! assert_eq!(sim.gateway.snapshot().gears[&GearSide::Left], Gear::Low);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use roboloop_types::{
    DriveDirection, Gear, GearSide, Mechanism, MechanismPosition, Motor, RobotError,
};

use crate::context::Hardware;
use crate::gateway::ActuatorGateway;
use crate::operator::{OperatorCommands, OperatorInput};
use crate::power::PowerMonitor;
use crate::telemetry_store::MemoryTelemetry;
use crate::vision::VisionLink;

// ────────────────────────────────────────────────────────────────────────────
// Simulated actuator gateway
// ────────────────────────────────────────────────────────────────────────────

/// Component names accepted by [`SimGateway::inject_fault`].
pub const GEARBOX: &str = "gearbox";
pub const MECHANISM: &str = "mechanism";
pub const COMPRESSOR: &str = "compressor";
pub const DRIVETRAIN: &str = "drivetrain";
pub const MOTOR: &str = "motor";

/// Everything the simulated gateway has been told to do.
#[derive(Debug, Clone, Default)]
pub struct GatewayState {
    pub gears: HashMap<GearSide, Gear>,
    pub mechanisms: HashMap<Mechanism, MechanismPosition>,
    pub compressor_enabled: bool,
    /// Number of compressor enable/disable commands received.
    pub compressor_commands: usize,
    pub direction: DriveDirection,
    pub motors: HashMap<Motor, f32>,
    faults: HashSet<String>,
}

impl GatewayState {
    /// Last commanded power for `motor`, `0.0` if never commanded.
    pub fn motor(&self, motor: Motor) -> f32 {
        self.motors.get(&motor).copied().unwrap_or(0.0)
    }

    fn check(&self, component: &str) -> Result<(), RobotError> {
        if self.faults.contains(component) {
            Err(RobotError::hardware(component, "simulated fault"))
        } else {
            Ok(())
        }
    }
}

/// A simulated [`ActuatorGateway`] that records every command.  Succeeds
/// unless a fault has been injected for the component involved.
#[derive(Clone, Default)]
pub struct SimGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl SimGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent command to `component` fail.
    pub fn inject_fault(&self, component: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.insert(component.to_string());
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.clear();
        }
    }

    /// Copy of the recorded state.
    pub fn snapshot(&self) -> GatewayState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn with_state<T>(
        &self,
        component: &str,
        f: impl FnOnce(&mut GatewayState) -> T,
    ) -> Result<T, RobotError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RobotError::hardware(component, "simulated bus poisoned"))?;
        state.check(component)?;
        Ok(f(&mut state))
    }
}

impl ActuatorGateway for SimGateway {
    fn set_gear(&mut self, side: GearSide, gear: Gear) -> Result<(), RobotError> {
        self.with_state(GEARBOX, |s| {
            s.gears.insert(side, gear);
        })
    }

    fn gear(&self, side: GearSide) -> Gear {
        self.snapshot().gears.get(&side).copied().unwrap_or_default()
    }

    fn set_mechanism_position(
        &mut self,
        mechanism: Mechanism,
        position: MechanismPosition,
    ) -> Result<(), RobotError> {
        self.with_state(MECHANISM, |s| {
            s.mechanisms.insert(mechanism, position);
        })
    }

    fn mechanism_position(&self, mechanism: Mechanism) -> MechanismPosition {
        self.snapshot()
            .mechanisms
            .get(&mechanism)
            .copied()
            .unwrap_or_default()
    }

    fn set_compressor_enabled(&mut self, enabled: bool) -> Result<(), RobotError> {
        self.with_state(COMPRESSOR, |s| {
            s.compressor_enabled = enabled;
            s.compressor_commands += 1;
        })
    }

    fn set_drive_direction(&mut self, direction: DriveDirection) -> Result<(), RobotError> {
        self.with_state(DRIVETRAIN, |s| s.direction = direction)
    }

    fn drive_direction(&self) -> DriveDirection {
        self.snapshot().direction
    }

    fn set_motor_power(&mut self, motor: Motor, power: f32) -> Result<(), RobotError> {
        self.with_state(MOTOR, |s| {
            s.motors.insert(motor, power.clamp(-1.0, 1.0));
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated power monitor
// ────────────────────────────────────────────────────────────────────────────

/// A power monitor whose brownout flag is set by hand.
#[derive(Clone, Default)]
pub struct SimPower {
    browned_out: Arc<AtomicBool>,
}

impl SimPower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_browned_out(&self, browned_out: bool) {
        self.browned_out.store(browned_out, Ordering::SeqCst);
    }
}

impl PowerMonitor for SimPower {
    fn is_browned_out(&self) -> bool {
        self.browned_out.load(Ordering::SeqCst)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated vision link
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct VisionState {
    driver_mode: Option<bool>,
    signals: usize,
    offline: bool,
}

/// A vision link that records the last driver-mode signal.
#[derive(Clone, Default)]
pub struct SimVision {
    state: Arc<Mutex<VisionState>>,
}

impl SimVision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last delivered driver-mode value, `None` if never signalled.
    pub fn driver_mode(&self) -> Option<bool> {
        self.state.lock().ok().and_then(|s| s.driver_mode)
    }

    /// Number of signals successfully delivered.
    pub fn signals(&self) -> usize {
        self.state.lock().map(|s| s.signals).unwrap_or(0)
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }
}

impl VisionLink for SimVision {
    fn set_driver_mode(&mut self, enabled: bool) -> Result<(), RobotError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RobotError::Vision("link state poisoned".to_string()))?;
        if state.offline {
            return Err(RobotError::Vision("co-processor not reachable".to_string()));
        }
        state.driver_mode = Some(enabled);
        state.signals += 1;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated operator console
// ────────────────────────────────────────────────────────────────────────────

/// Operator controls set programmatically.
#[derive(Clone, Default)]
pub struct SimOperator {
    commands: Arc<Mutex<OperatorCommands>>,
}

impl SimOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit the current control sample in place.
    pub fn update(&self, f: impl FnOnce(&mut OperatorCommands)) {
        if let Ok(mut current) = self.commands.lock() {
            f(&mut current);
        }
    }
}

impl OperatorInput for SimOperator {
    fn read(&self) -> OperatorCommands {
        self.commands.lock().map(|c| *c).unwrap_or_default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimHardware
// ────────────────────────────────────────────────────────────────────────────

/// A full set of simulated collaborators plus the handles to drive and
/// observe them.
///
/// Call [`build`][Self::build] to obtain a [`Hardware`] context wired to
/// clones of these handles.
#[derive(Clone, Default)]
pub struct SimHardware {
    pub gateway: SimGateway,
    pub telemetry: MemoryTelemetry,
    pub power: SimPower,
    pub vision: SimVision,
    pub operator: SimOperator,
}

impl SimHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a [`Hardware`] context sharing state with this handle set.
    pub fn build(&self) -> Hardware {
        Hardware::new(
            Box::new(self.gateway.clone()),
            Box::new(self.telemetry.clone()),
            Box::new(self.power.clone()),
            Box::new(self.vision.clone()),
            Box::new(self.operator.clone()),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
