use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The robot's top-level operating phase.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    #[default]
    Disabled,
    Autonomous,
    Teleop,
}

impl Mode {
    /// `true` for the modes in which mode-owned routines run.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Mode::Disabled)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Disabled => write!(f, "disabled"),
            Mode::Autonomous => write!(f, "autonomous"),
            Mode::Teleop => write!(f, "teleop"),
        }
    }
}

/// Identity of every control routine the robot knows about.  The set is fixed
/// for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutineId {
    TeleopDrive,
    Intake,
    Elevator,
    CompressorShutoff,
}

impl RoutineId {
    pub const ALL: [RoutineId; 4] = [
        RoutineId::TeleopDrive,
        RoutineId::Intake,
        RoutineId::Elevator,
        RoutineId::CompressorShutoff,
    ];

    /// Routines whose start/cancel authority belongs to the mode controller.
    pub const MODE_OWNED: [RoutineId; 3] =
        [RoutineId::TeleopDrive, RoutineId::Intake, RoutineId::Elevator];

    pub fn name(self) -> &'static str {
        match self {
            RoutineId::TeleopDrive => "teleop_drive",
            RoutineId::Intake => "intake",
            RoutineId::Elevator => "elevator",
            RoutineId::CompressorShutoff => "compressor_shutoff",
        }
    }

    pub fn is_mode_owned(self) -> bool {
        !matches!(self, RoutineId::CompressorShutoff)
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of a single control routine.
///
/// `Cancelling` is only observable while the routine is releasing its
/// actuators; cancellation always completes within the call that began it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoutineState {
    #[default]
    Idle,
    Running,
    Cancelling,
}

// ─────────────────────────────────────────────────────────────────────────────
// Actuator vocabulary
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GearSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Gear {
    #[default]
    High,
    Low,
}

impl Gear {
    pub fn toggled(self) -> Self {
        match self {
            Gear::High => Gear::Low,
            Gear::Low => Gear::High,
        }
    }

    /// Operator-facing label written to the telemetry store.
    pub fn label(self) -> &'static str {
        match self {
            Gear::High => "High",
            Gear::Low => "Low",
        }
    }
}

/// Double-acting pneumatic mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    FrontLift,
    RearLift,
    PanelClutch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MechanismPosition {
    Extended,
    #[default]
    Retracted,
}

impl MechanismPosition {
    pub fn toggled(self) -> Self {
        match self {
            MechanismPosition::Extended => MechanismPosition::Retracted,
            MechanismPosition::Retracted => MechanismPosition::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DriveDirection {
    #[default]
    Forward,
    Reverse,
}

impl DriveDirection {
    pub fn toggled(self) -> Self {
        match self {
            DriveDirection::Forward => DriveDirection::Reverse,
            DriveDirection::Reverse => DriveDirection::Forward,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DriveDirection::Forward => "Forward",
            DriveDirection::Reverse => "Reverse",
        }
    }

    /// Sign applied to the forward drive axis.
    pub fn sign(self) -> f32 {
        match self {
            DriveDirection::Forward => 1.0,
            DriveDirection::Reverse => -1.0,
        }
    }
}

/// Open-loop motor outputs, commanded in the range `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motor {
    DriveLeft,
    DriveRight,
    Intake,
    Elevator,
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry store
// ─────────────────────────────────────────────────────────────────────────────

/// A value held by the operator telemetry store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl TelemetryValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TelemetryValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            TelemetryValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TelemetryValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Stable telemetry-store keys.
pub mod keys {
    /// Operator toggle: shut the compressor off while the supply browns out.
    pub const COMPRESSOR_BROWNOUT_SHUTOFF: &str = "Compressor Brownout Shutoff";
    pub const COMPRESSOR_SHUTOFF_ACTIVE: &str = "Compressor Shutoff Active";
    pub const GYROSCOPE_DISABLED: &str = "Gyroscope Disabled";
    pub const POWER_SLIDER: &str = "Power Slider";
    pub const CURRENT_GEAR: &str = "Current Gear";
    pub const DRIVING_DIRECTION: &str = "Driving Direction";
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle history
// ─────────────────────────────────────────────────────────────────────────────

/// A notable transition in the robot lifecycle, kept for operator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: LifecycleEventKind,
}

impl LifecycleEvent {
    pub fn now(kind: LifecycleEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEventKind {
    Booted,
    ModeChanged { from: Mode, to: Mode },
    InterlockEngaged { tick: u64 },
    InterlockReleased { tick: u64 },
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error type shared by every collaborator and the lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RobotError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Telemetry Error on '{key}': {details}")]
    Telemetry { key: String, details: String },

    #[error("Vision Link Error: {0}")]
    Vision(String),

    #[error("Boot Failed: {0}")]
    Boot(String),
}

impl RobotError {
    pub fn hardware(component: impl Into<String>, details: impl Into<String>) -> Self {
        RobotError::HardwareFault {
            component: component.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_disabled_is_not_enabled() {
        assert!(!Mode::Disabled.is_enabled());
        assert!(Mode::Autonomous.is_enabled());
        assert!(Mode::Teleop.is_enabled());
        assert_eq!(Mode::default(), Mode::Disabled);
    }

    #[test]
    fn compressor_shutoff_is_the_only_tick_owned_routine() {
        let tick_owned: Vec<_> = RoutineId::ALL
            .iter()
            .filter(|id| !id.is_mode_owned())
            .collect();
        assert_eq!(tick_owned, vec![&RoutineId::CompressorShutoff]);
        assert!(RoutineId::MODE_OWNED.iter().all(|id| id.is_mode_owned()));
    }

    #[test]
    fn toggles_flip_back_and_forth() {
        assert_eq!(Gear::High.toggled(), Gear::Low);
        assert_eq!(Gear::High.toggled().toggled(), Gear::High);
        assert_eq!(DriveDirection::Forward.toggled(), DriveDirection::Reverse);
        assert_eq!(
            MechanismPosition::Retracted.toggled(),
            MechanismPosition::Extended
        );
    }

    #[test]
    fn telemetry_value_accessors_are_type_strict() {
        assert_eq!(TelemetryValue::Bool(true).as_bool(), Some(true));
        assert_eq!(TelemetryValue::Number(1.0).as_bool(), None);
        assert_eq!(TelemetryValue::Text("High".into()).as_text(), Some("High"));
        assert_eq!(TelemetryValue::Bool(false).as_number(), None);
    }

    #[test]
    fn telemetry_value_serializes_untagged() {
        let json = serde_json::to_string(&TelemetryValue::Number(0.5)).unwrap();
        assert_eq!(json, "0.5");
        let back: TelemetryValue = serde_json::from_str("true").unwrap();
        assert_eq!(back, TelemetryValue::Bool(true));
    }

    #[test]
    fn lifecycle_event_kind_is_tagged() {
        let event = LifecycleEvent::now(LifecycleEventKind::ModeChanged {
            from: Mode::Disabled,
            to: Mode::Teleop,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"mode_changed\""));
        let back: LifecycleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.kind, event.kind);
    }

    #[test]
    fn robot_error_display() {
        let err = RobotError::hardware("compressor", "CAN timeout");
        assert_eq!(err.to_string(), "Hardware Fault on compressor: CAN timeout");
        assert!(RobotError::Boot("x".into()).to_string().contains("Boot Failed"));
    }
}
