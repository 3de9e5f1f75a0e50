//! [`RobotLifecycle`] – the host callback surface.
//!
//! The execution host calls [`on_boot`][RobotLifecycle::on_boot] once, then
//! [`on_tick`][RobotLifecycle::on_tick] at a fixed period and
//! [`on_mode_change`][RobotLifecycle::on_mode_change] between ticks.  Boot is
//! the only fallible step; until it succeeds every other callback is a logged
//! no-op.
//!
//! # Example
//!
//! ```
//! use roboloop_hal::sim::SimHardware;
//! use roboloop_runtime::{LifecycleConfig, RobotLifecycle};
//! use roboloop_types::{Mode, RoutineId, RoutineState};
//!
//! let sim = SimHardware::new();
//! let mut robot = RobotLifecycle::new(LifecycleConfig::default(), sim.build());
//! robot.on_boot().unwrap();
//!
//! robot.on_mode_change(Mode::Disabled, Mode::Teleop);
//! robot.on_tick();
//! assert_eq!(robot.routine_state(RoutineId::Intake), Some(RoutineState::Running));
//! ```

use std::collections::VecDeque;

use roboloop_hal::{ActuatorGateway, Hardware, TelemetryStore};
use roboloop_kernel::{
    CompressorShutoff, ControlRoutine, ModeRoutines, RoutineSet, RoutineSlot, SupervisoryTick,
    TickReport,
};
use roboloop_types::{
    Gear, GearSide, LifecycleEvent, LifecycleEventKind, Mechanism, MechanismPosition, Mode,
    RobotError, RoutineId, RoutineState, keys,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::LifecycleConfig;
use crate::mode_controller::ModeController;
use crate::routines::{Elevator, Intake, TeleopDrive};

/// One routine's entry in a [`StatusSnapshot`].  `state` is `None` when the
/// routine is not fitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineStatusEntry {
    pub id: RoutineId,
    pub state: Option<RoutineState>,
}

/// Point-in-time view of the lifecycle for operator display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub booted: bool,
    pub ticks: u64,
    pub routines: Vec<RoutineStatusEntry>,
}

/// Top-level composition of hardware, routines, mode controller and
/// supervisory tick.
pub struct RobotLifecycle {
    config: LifecycleConfig,
    hw: Hardware,
    routines: RoutineSet,
    modes: ModeController,
    supervisor: SupervisoryTick,
    booted: bool,
    events: VecDeque<LifecycleEvent>,
}

impl RobotLifecycle {
    /// Build the routine registry from `config`, all slots idle.  No hardware
    /// is touched until [`on_boot`][Self::on_boot].
    pub fn new(config: LifecycleConfig, hw: Hardware) -> Self {
        let toggles = config.routines;

        let mode_owned = ModeRoutines::new(
            RoutineSlot::from_option(
                RoutineId::TeleopDrive,
                fitted(toggles.teleop_drive, Box::new(TeleopDrive::new(config.drive))),
            ),
            RoutineSlot::from_option(
                RoutineId::Intake,
                fitted(toggles.intake, Box::new(Intake::new(config.intake_speed))),
            ),
            RoutineSlot::from_option(
                RoutineId::Elevator,
                fitted(
                    toggles.elevator,
                    Box::new(Elevator::new(config.elevator_speed, config.drive.deadband)),
                ),
            ),
        );
        let shutoff = RoutineSlot::from_option(
            RoutineId::CompressorShutoff,
            fitted(
                toggles.compressor_shutoff,
                Box::new(CompressorShutoff::new(config.shutoff_duration)),
            ),
        );

        Self {
            supervisor: SupervisoryTick::new(config.tick_period),
            events: VecDeque::with_capacity(config.event_history),
            config,
            hw,
            routines: RoutineSet::new(mode_owned, shutoff),
            modes: ModeController::new(),
            booted: false,
        }
    }

    // ── Host callbacks ──────────────────────────────────────────────────────

    /// One-time hardware initialization.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::Boot`] naming the first step that failed.  The
    /// robot must not be operated after a boot error.
    pub fn on_boot(&mut self) -> Result<(), RobotError> {
        if self.booted {
            warn!("on_boot called twice; ignoring");
            return Ok(());
        }
        if let Err(e) = self.initialize_hardware() {
            error!(error = %e, "robot boot failed");
            return Err(e);
        }
        self.booted = true;
        self.record(LifecycleEventKind::Booted);
        info!(
            tick_ms = self.config.tick_period.as_millis() as u64,
            "robot booted"
        );
        Ok(())
    }

    /// Run one supervisory tick.  Returns `None` before boot.
    pub fn on_tick(&mut self) -> Option<TickReport> {
        if !self.booted {
            warn!("tick before boot ignored");
            return None;
        }
        let report = self.supervisor.tick(&mut self.routines, &mut self.hw);
        if report.interlock_released {
            self.record(LifecycleEventKind::InterlockReleased { tick: report.tick });
        }
        if report.interlock_engaged {
            self.record(LifecycleEventKind::InterlockEngaged { tick: report.tick });
        }
        Some(report)
    }

    /// Deliver the host's mode transition.  Returns the effective
    /// `(from, to)` pair, or `None` if nothing changed.
    pub fn on_mode_change(&mut self, prev: Mode, next: Mode) -> Option<(Mode, Mode)> {
        if !self.booted {
            warn!(%prev, %next, "mode change before boot ignored");
            return None;
        }
        let change = self.modes.transition(
            prev,
            next,
            self.routines.mode_routines_mut(),
            &mut self.hw,
        )?;
        self.record(LifecycleEventKind::ModeChanged {
            from: change.0,
            to: change.1,
        });
        Some(change)
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn routine_state(&self, id: RoutineId) -> Option<RoutineState> {
        self.routines.state(id)
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.mode(),
            booted: self.booted,
            ticks: self.supervisor.ticks(),
            routines: self
                .routines
                .states()
                .into_iter()
                .map(|(id, state)| RoutineStatusEntry { id, state })
                .collect(),
        }
    }

    /// Recorded lifecycle events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &LifecycleEvent> {
        self.events.iter()
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn initialize_hardware(&mut self) -> Result<(), RobotError> {
        let hw = &mut self.hw;
        let step = |name: &str, result: Result<(), RobotError>| {
            result.map_err(|e| RobotError::Boot(format!("{name}: {e}")))
        };

        step("gyroscope", hw.telemetry.put_bool(keys::GYROSCOPE_DISABLED, true))?;
        step(
            "power slider",
            hw.telemetry
                .put_number(keys::POWER_SLIDER, self.config.drive.default_power_scale),
        )?;
        step("compressor", hw.gateway.set_compressor_enabled(true))?;
        for side in [GearSide::Left, GearSide::Right] {
            step("gearbox", hw.gateway.set_gear(side, Gear::High))?;
        }
        for mechanism in [Mechanism::FrontLift, Mechanism::RearLift, Mechanism::PanelClutch] {
            step(
                "mechanisms",
                hw.gateway
                    .set_mechanism_position(mechanism, MechanismPosition::Retracted),
            )?;
        }
        let gear = hw.gateway.gear(GearSide::Left);
        step(
            "current gear",
            hw.telemetry.put_text(keys::CURRENT_GEAR, gear.label()),
        )?;
        step(
            "brownout flag",
            hw.telemetry.put_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, false),
        )?;
        step(
            "shutoff state",
            hw.telemetry.put_bool(keys::COMPRESSOR_SHUTOFF_ACTIVE, false),
        )
    }

    fn record(&mut self, kind: LifecycleEventKind) {
        let cap = self.config.event_history;
        if cap == 0 {
            return;
        }
        while self.events.len() >= cap {
            self.events.pop_front();
        }
        self.events.push_back(LifecycleEvent::now(kind));
    }
}

fn fitted(enabled: bool, routine: Box<dyn ControlRoutine>) -> Option<Box<dyn ControlRoutine>> {
    enabled.then_some(routine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutineToggles;
    use roboloop_hal::sim::{GEARBOX, SimHardware};
    use roboloop_types::{Motor, TelemetryValue};
    use std::time::Duration;

    fn booted(config: LifecycleConfig) -> (SimHardware, RobotLifecycle) {
        let sim = SimHardware::new();
        let mut robot = RobotLifecycle::new(config, sim.build());
        robot.on_boot().unwrap();
        (sim, robot)
    }

    fn mode_owned_in(robot: &RobotLifecycle, state: RoutineState) -> bool {
        RoutineId::MODE_OWNED
            .iter()
            .all(|id| robot.routine_state(*id) == Some(state))
    }

    fn ticks(robot: &mut RobotLifecycle, n: usize) {
        for _ in 0..n {
            robot.on_tick();
        }
    }

    // ── Boot ────────────────────────────────────────────────────────────────

    #[test]
    fn boot_seeds_hardware_and_telemetry_defaults() {
        let (sim, robot) = booted(LifecycleConfig::default());
        assert!(robot.is_booted());
        assert_eq!(robot.mode(), Mode::Disabled);

        let state = sim.gateway.snapshot();
        assert!(state.compressor_enabled);
        assert_eq!(state.gears[&GearSide::Left], Gear::High);
        assert_eq!(state.gears[&GearSide::Right], Gear::High);
        for m in [Mechanism::FrontLift, Mechanism::RearLift, Mechanism::PanelClutch] {
            assert_eq!(state.mechanisms[&m], MechanismPosition::Retracted);
        }

        let board = &sim.telemetry;
        assert_eq!(board.get(keys::GYROSCOPE_DISABLED).unwrap(), Some(TelemetryValue::Bool(true)));
        assert_eq!(board.get(keys::POWER_SLIDER).unwrap(), Some(TelemetryValue::Number(1.0)));
        assert_eq!(
            board.get(keys::CURRENT_GEAR).unwrap(),
            Some(TelemetryValue::Text("High".into()))
        );
        assert_eq!(
            board.get(keys::COMPRESSOR_BROWNOUT_SHUTOFF).unwrap(),
            Some(TelemetryValue::Bool(false))
        );
        assert!(RoutineId::ALL.iter().all(|id| robot.routine_state(*id) == Some(RoutineState::Idle)));
    }

    #[test]
    fn hardware_fault_at_boot_is_fatal() {
        let sim = SimHardware::new();
        sim.gateway.inject_fault(GEARBOX);
        let mut robot = RobotLifecycle::new(LifecycleConfig::default(), sim.build());

        let err = robot.on_boot().unwrap_err();
        assert!(matches!(&err, RobotError::Boot(msg) if msg.starts_with("gearbox")));
        assert!(!robot.is_booted());
        assert!(robot.on_tick().is_none());
        assert_eq!(robot.on_mode_change(Mode::Disabled, Mode::Teleop), None);
        assert!(mode_owned_in(&robot, RoutineState::Idle));
    }

    #[test]
    fn unreachable_telemetry_at_boot_is_fatal() {
        let sim = SimHardware::new();
        sim.telemetry.set_offline(true);
        let mut robot = RobotLifecycle::new(LifecycleConfig::default(), sim.build());
        assert!(matches!(robot.on_boot(), Err(RobotError::Boot(_))));
    }

    #[test]
    fn second_boot_is_ignored() {
        let (sim, mut robot) = booted(LifecycleConfig::default());
        sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
        robot.on_boot().unwrap();
        assert_eq!(
            sim.telemetry.get(keys::COMPRESSOR_BROWNOUT_SHUTOFF).unwrap(),
            Some(TelemetryValue::Bool(true))
        );
        assert_eq!(robot.events().count(), 1);
    }

    // ── Mode properties ─────────────────────────────────────────────────────

    #[test]
    fn disabling_from_any_mode_idles_mode_owned_routines() {
        for mode in [Mode::Autonomous, Mode::Teleop] {
            let (_sim, mut robot) = booted(LifecycleConfig::default());
            robot.on_mode_change(Mode::Disabled, mode);
            ticks(&mut robot, 3);
            robot.on_mode_change(mode, Mode::Disabled);
            assert!(mode_owned_in(&robot, RoutineState::Idle), "{mode}");
        }
    }

    #[test]
    fn enabling_runs_all_mode_owned_routines() {
        for mode in [Mode::Autonomous, Mode::Teleop] {
            let (_sim, mut robot) = booted(LifecycleConfig::default());
            robot.on_mode_change(Mode::Disabled, mode);
            assert!(mode_owned_in(&robot, RoutineState::Running), "{mode}");
            assert_eq!(
                robot.routine_state(RoutineId::CompressorShutoff),
                Some(RoutineState::Idle)
            );
        }
    }

    #[test]
    fn teleop_ticks_then_brownout_engages_interlock_only() {
        let (sim, mut robot) = booted(LifecycleConfig::default());
        robot.on_mode_change(Mode::Disabled, Mode::Teleop);

        for _ in 0..10 {
            let report = robot.on_tick().unwrap();
            assert!(!report.interlock_engaged);
        }
        assert!(mode_owned_in(&robot, RoutineState::Running));
        assert_eq!(robot.routine_state(RoutineId::CompressorShutoff), Some(RoutineState::Idle));

        sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
        sim.power.set_browned_out(true);
        assert!(robot.on_tick().unwrap().interlock_engaged);
        assert_eq!(
            robot.routine_state(RoutineId::CompressorShutoff),
            Some(RoutineState::Running)
        );
        assert!(mode_owned_in(&robot, RoutineState::Running));
    }

    #[test]
    fn auto_disable_teleop_leaves_no_residue() {
        let (sim, mut robot) = booted(LifecycleConfig::default());
        robot.on_mode_change(Mode::Disabled, Mode::Autonomous);
        sim.operator.update(|c| c.forward = 1.0);
        ticks(&mut robot, 2);
        assert!(sim.gateway.snapshot().motor(Motor::DriveLeft) > 0.0);

        robot.on_mode_change(Mode::Autonomous, Mode::Disabled);
        assert!(mode_owned_in(&robot, RoutineState::Idle));
        assert_eq!(sim.gateway.snapshot().motor(Motor::DriveLeft), 0.0);

        sim.operator.update(|c| c.forward = 0.0);
        robot.on_mode_change(Mode::Disabled, Mode::Teleop);
        assert!(mode_owned_in(&robot, RoutineState::Running));
        ticks(&mut robot, 1);
        assert_eq!(sim.gateway.snapshot().motor(Motor::DriveLeft), 0.0);
        assert_eq!(sim.vision.signals(), 1);
    }

    #[test]
    fn every_mode_sequence_ends_in_the_right_routine_state() {
        const MODES: [Mode; 3] = [Mode::Disabled, Mode::Autonomous, Mode::Teleop];
        const LEN: u32 = 5;

        for code in 0..MODES.len().pow(LEN) {
            let (_sim, mut robot) = booted(LifecycleConfig::default());
            let mut rest = code;
            let mut seen = Vec::new();
            for _ in 0..LEN {
                let next = MODES[rest % MODES.len()];
                rest /= MODES.len();
                seen.push(next);

                robot.on_mode_change(robot.mode(), next);
                robot.on_tick();

                let want = if next.is_enabled() {
                    RoutineState::Running
                } else {
                    RoutineState::Idle
                };
                assert_eq!(robot.mode(), next, "{seen:?}");
                assert!(mode_owned_in(&robot, want), "{seen:?}");
            }
        }
    }

    #[test]
    fn auto_to_teleop_keeps_driving_without_a_stop() {
        let (sim, mut robot) = booted(LifecycleConfig::default());
        sim.operator.update(|c| c.forward = 1.0);
        robot.on_mode_change(Mode::Disabled, Mode::Autonomous);
        ticks(&mut robot, 2);
        let before = sim.gateway.snapshot().motor(Motor::DriveLeft);
        assert!(before > 0.0);

        assert_eq!(
            robot.on_mode_change(Mode::Autonomous, Mode::Teleop),
            Some((Mode::Autonomous, Mode::Teleop))
        );
        assert!(mode_owned_in(&robot, RoutineState::Running));
        assert_eq!(sim.gateway.snapshot().motor(Motor::DriveLeft), before);

        ticks(&mut robot, 1);
        assert!(sim.gateway.snapshot().motor(Motor::DriveLeft) > 0.0);
        assert_eq!(sim.vision.signals(), 1);
    }

    #[test]
    fn interlock_runs_in_disabled_mode_too() {
        let (sim, mut robot) = booted(LifecycleConfig::default());
        sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
        sim.power.set_browned_out(true);
        assert!(robot.on_tick().unwrap().interlock_engaged);
        assert_eq!(robot.mode(), Mode::Disabled);
    }

    // ── Interlock timing ────────────────────────────────────────────────────

    #[test]
    fn shutoff_runs_its_full_duration_then_restores_compressor() {
        let (sim, mut robot) = booted(LifecycleConfig::default());
        sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
        sim.power.set_browned_out(true);
        robot.on_tick();
        sim.power.set_browned_out(false);

        ticks(&mut robot, 300);
        assert!(!sim.gateway.snapshot().compressor_enabled);
        assert_eq!(
            sim.telemetry.get(keys::COMPRESSOR_SHUTOFF_ACTIVE).unwrap(),
            Some(TelemetryValue::Bool(true))
        );

        assert!(robot.on_tick().unwrap().interlock_released);
        assert_eq!(robot.routine_state(RoutineId::CompressorShutoff), Some(RoutineState::Idle));
        assert!(sim.gateway.snapshot().compressor_enabled);
        // The operator's flag is never reset by the core.
        assert_eq!(
            sim.telemetry.get(keys::COMPRESSOR_BROWNOUT_SHUTOFF).unwrap(),
            Some(TelemetryValue::Bool(true))
        );

        let kinds: Vec<_> = robot.events().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                LifecycleEventKind::Booted,
                LifecycleEventKind::InterlockEngaged { tick: 1 },
                LifecycleEventKind::InterlockReleased { tick: 302 },
            ]
        );
    }

    #[test]
    fn configured_duration_and_period_scale_the_rest() {
        let config = LifecycleConfig {
            tick_period: Duration::from_millis(10),
            shutoff_duration: Duration::from_millis(50),
            ..LifecycleConfig::default()
        };
        let (sim, mut robot) = booted(config);
        sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
        sim.power.set_browned_out(true);
        robot.on_tick();
        sim.power.set_browned_out(false);

        ticks(&mut robot, 5);
        assert!(!sim.gateway.snapshot().compressor_enabled);
        assert!(robot.on_tick().unwrap().interlock_released);
    }

    // ── Configuration and observability ────────────────────────────────────

    #[test]
    fn unfitted_routines_are_absent_slots() {
        let config = LifecycleConfig {
            routines: RoutineToggles {
                intake: false,
                compressor_shutoff: false,
                ..RoutineToggles::default()
            },
            ..LifecycleConfig::default()
        };
        let (sim, mut robot) = booted(config);
        robot.on_mode_change(Mode::Disabled, Mode::Teleop);
        sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
        sim.power.set_browned_out(true);
        let report = robot.on_tick().unwrap();

        assert!(!report.interlock_engaged);
        assert_eq!(robot.routine_state(RoutineId::Intake), None);
        assert_eq!(robot.routine_state(RoutineId::CompressorShutoff), None);
        assert_eq!(robot.routine_state(RoutineId::Elevator), Some(RoutineState::Running));
        robot.on_mode_change(Mode::Teleop, Mode::Disabled);
        assert_eq!(robot.routine_state(RoutineId::Elevator), Some(RoutineState::Idle));
    }

    #[test]
    fn event_history_is_bounded() {
        let config = LifecycleConfig {
            event_history: 4,
            ..LifecycleConfig::default()
        };
        let (_sim, mut robot) = booted(config);
        for _ in 0..5 {
            robot.on_mode_change(Mode::Disabled, Mode::Teleop);
            robot.on_mode_change(Mode::Teleop, Mode::Disabled);
        }
        let kinds: Vec<_> = robot.events().map(|e| e.kind.clone()).collect();
        assert_eq!(kinds.len(), 4);
        assert_eq!(
            kinds.last(),
            Some(&LifecycleEventKind::ModeChanged {
                from: Mode::Teleop,
                to: Mode::Disabled
            })
        );
    }

    #[test]
    fn ignored_reentry_records_nothing() {
        let (_sim, mut robot) = booted(LifecycleConfig::default());
        assert_eq!(robot.on_mode_change(Mode::Disabled, Mode::Disabled), None);
        assert_eq!(robot.events().count(), 1);
    }

    #[test]
    fn status_snapshot_serializes() {
        let (_sim, mut robot) = booted(LifecycleConfig::default());
        robot.on_mode_change(Mode::Disabled, Mode::Teleop);
        ticks(&mut robot, 2);

        let status = robot.status();
        assert_eq!(status.ticks, 2);
        assert_eq!(status.routines.len(), 4);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["mode"], "Teleop");
        assert_eq!(json["booted"], true);
        assert_eq!(json["routines"][0]["id"], "TeleopDrive");
        assert_eq!(json["routines"][0]["state"], "Running");
        assert_eq!(json["routines"][3]["state"], "Idle");
    }
}
