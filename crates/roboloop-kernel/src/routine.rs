//! [`ControlRoutine`] and [`RoutineSlot`] – cooperative routine lifecycle.
//!
//! A routine is a unit of periodic control logic bound to one subsystem.  It
//! never blocks and never spawns; the scheduler calls [`RoutineSlot::step`]
//! once per tick while the routine is running.
//!
//! The slot owns the lifecycle so individual routines cannot get it wrong:
//!
//! | Call | From `Idle` | From `Running` |
//! |---|---|---|
//! | [`start`][RoutineSlot::start] | → `Running` | no-op |
//! | [`cancel`][RoutineSlot::cancel] | no-op | → `Cancelling` → `Idle` |
//! | [`step`][RoutineSlot::step] | no-op | one increment; → `Idle` if finished |
//!
//! A slot may also be empty (the routine is disabled for this robot).  Every
//! call on an empty slot is a logged no-op.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use roboloop_hal::{Hardware, sim::SimHardware};
//! use roboloop_kernel::{ControlRoutine, RoutineSlot, RoutineStatus};
//! use roboloop_types::{RoutineId, RoutineState};
//!
//! struct Idler;
//!
//! impl ControlRoutine for Idler {
//!     fn id(&self) -> RoutineId { RoutineId::Intake }
//!     fn execute(&mut self, _: &mut Hardware, _: Duration) -> RoutineStatus {
//!         RoutineStatus::Continue
//!     }
//!     fn end(&mut self, _: &mut Hardware) {}
//! }
//!
//! let mut hw = SimHardware::new().build();
//! let mut slot = RoutineSlot::new(Box::new(Idler));
//!
//! assert!(slot.start());
//! assert!(!slot.start()); // already running
//! slot.step(&mut hw, Duration::from_millis(20));
//! assert!(slot.cancel(&mut hw));
//! assert!(!slot.cancel(&mut hw)); // already idle
//! assert_eq!(slot.state(), Some(RoutineState::Idle));
//! ```

use std::time::Duration;

use roboloop_hal::Hardware;
use roboloop_types::{RoutineId, RoutineState};
use tracing::{debug, info};

/// Outcome of one [`ControlRoutine::execute`] increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineStatus {
    /// Keep running; step again next tick.
    Continue,
    /// The routine has completed its work and should return to idle.
    Finished,
}

/// A long-running, cooperatively scheduled activity bound to one subsystem.
pub trait ControlRoutine: Send {
    fn id(&self) -> RoutineId;

    /// Called on the first step after each start, before `execute`.
    fn initialize(&mut self, _hw: &mut Hardware) {}

    /// Perform one increment of control logic.  `dt` is the tick period.
    ///
    /// Must return within the tick budget: no blocking, no sleeping.
    fn execute(&mut self, hw: &mut Hardware, dt: Duration) -> RoutineStatus;

    /// Drive every actuator this routine commands to its safe value.
    ///
    /// Called exactly once per run, whether the run finished on its own or was
    /// cancelled.
    fn end(&mut self, hw: &mut Hardware);
}

/// Lifecycle wrapper around an optional [`ControlRoutine`].
pub struct RoutineSlot {
    id: RoutineId,
    routine: Option<Box<dyn ControlRoutine>>,
    state: RoutineState,
    initialized: bool,
    starts: u64,
}

impl RoutineSlot {
    /// Wrap a present routine.  The slot starts `Idle`.
    pub fn new(routine: Box<dyn ControlRoutine>) -> Self {
        Self {
            id: routine.id(),
            routine: Some(routine),
            state: RoutineState::Idle,
            initialized: false,
            starts: 0,
        }
    }

    /// A slot whose routine is absent.
    pub fn empty(id: RoutineId) -> Self {
        Self {
            id,
            routine: None,
            state: RoutineState::Idle,
            initialized: false,
            starts: 0,
        }
    }

    /// Build a present or empty slot from an optional routine.
    pub fn from_option(id: RoutineId, routine: Option<Box<dyn ControlRoutine>>) -> Self {
        match routine {
            Some(routine) => Self::new(routine),
            None => Self::empty(id),
        }
    }

    pub fn id(&self) -> RoutineId {
        self.id
    }

    pub fn is_present(&self) -> bool {
        self.routine.is_some()
    }

    /// Lifecycle state, or `None` for an empty slot.
    pub fn state(&self) -> Option<RoutineState> {
        self.routine.as_ref().map(|_| self.state)
    }

    pub fn is_running(&self) -> bool {
        self.routine.is_some() && self.state == RoutineState::Running
    }

    /// Number of Idle→Running transitions since construction.
    pub fn start_count(&self) -> u64 {
        self.starts
    }

    /// Request the routine to run.  Returns `true` if this call moved it from
    /// `Idle` to `Running`; `false` if it was already running or absent.
    pub fn start(&mut self) -> bool {
        if self.routine.is_none() {
            debug!(routine = %self.id, "start requested on absent routine; nothing to do");
            return false;
        }
        if self.state != RoutineState::Idle {
            return false;
        }
        self.state = RoutineState::Running;
        self.initialized = false;
        self.starts += 1;
        info!(routine = %self.id, run = self.starts, "routine started");
        true
    }

    /// Stop the routine and release its actuators.  Returns `true` if this
    /// call moved it from `Running` to `Idle`.
    pub fn cancel(&mut self, hw: &mut Hardware) -> bool {
        if self.routine.is_none() || self.state != RoutineState::Running {
            return false;
        }
        self.finish(hw);
        info!(routine = %self.id, "routine cancelled");
        true
    }

    /// Advance a running routine by one tick.  No-op unless running.
    pub fn step(&mut self, hw: &mut Hardware, dt: Duration) {
        if self.state != RoutineState::Running {
            return;
        }
        let Some(routine) = self.routine.as_mut() else {
            return;
        };
        if !self.initialized {
            routine.initialize(hw);
            self.initialized = true;
        }
        if routine.execute(hw, dt) == RoutineStatus::Finished {
            self.finish(hw);
            info!(routine = %self.id, "routine finished");
        }
    }

    fn finish(&mut self, hw: &mut Hardware) {
        self.state = RoutineState::Cancelling;
        if let Some(routine) = self.routine.as_mut() {
            routine.end(hw);
        }
        self.initialized = false;
        self.state = RoutineState::Idle;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use roboloop_hal::ActuatorGateway;
    use roboloop_hal::sim::SimHardware;
    use roboloop_types::Motor;
    use std::sync::{Arc, Mutex};

    /// Lifecycle calls observed by a [`Recorder`].
    #[derive(Debug, Default, Clone, PartialEq)]
    pub(crate) struct Calls {
        pub initialize: usize,
        pub execute: usize,
        pub end: usize,
    }

    /// Test routine that counts its lifecycle calls, drives the intake motor
    /// while running, and finishes after `finish_after` executes (if set).
    pub(crate) struct Recorder {
        pub id: RoutineId,
        pub calls: Arc<Mutex<Calls>>,
        pub finish_after: Option<usize>,
    }

    impl Recorder {
        pub(crate) fn new(id: RoutineId) -> (Self, Arc<Mutex<Calls>>) {
            let calls = Arc::new(Mutex::new(Calls::default()));
            (
                Self {
                    id,
                    calls: calls.clone(),
                    finish_after: None,
                },
                calls,
            )
        }
    }

    impl ControlRoutine for Recorder {
        fn id(&self) -> RoutineId {
            self.id
        }

        fn initialize(&mut self, _hw: &mut Hardware) {
            self.calls.lock().unwrap().initialize += 1;
        }

        fn execute(&mut self, hw: &mut Hardware, _dt: Duration) -> RoutineStatus {
            let mut calls = self.calls.lock().unwrap();
            calls.execute += 1;
            hw.gateway.set_motor_power(Motor::Intake, 0.5).unwrap();
            match self.finish_after {
                Some(n) if calls.execute >= n => RoutineStatus::Finished,
                _ => RoutineStatus::Continue,
            }
        }

        fn end(&mut self, hw: &mut Hardware) {
            self.calls.lock().unwrap().end += 1;
            hw.gateway.set_motor_power(Motor::Intake, 0.0).unwrap();
        }
    }

    const DT: Duration = Duration::from_millis(20);

    #[test]
    fn new_slot_is_idle() {
        let (recorder, _) = Recorder::new(RoutineId::Intake);
        let slot = RoutineSlot::new(Box::new(recorder));
        assert_eq!(slot.id(), RoutineId::Intake);
        assert_eq!(slot.state(), Some(RoutineState::Idle));
        assert!(!slot.is_running());
    }

    #[test]
    fn double_start_runs_once_and_initializes_once() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (recorder, calls) = Recorder::new(RoutineId::Intake);
        let mut slot = RoutineSlot::new(Box::new(recorder));

        assert!(slot.start());
        assert!(!slot.start());
        slot.step(&mut hw, DT);
        assert!(!slot.start());
        slot.step(&mut hw, DT);

        assert!(slot.is_running());
        assert_eq!(slot.start_count(), 1);
        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.initialize, 1);
        assert_eq!(calls.execute, 2);
    }

    #[test]
    fn cancel_on_idle_is_noop() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (recorder, calls) = Recorder::new(RoutineId::Elevator);
        let mut slot = RoutineSlot::new(Box::new(recorder));

        assert!(!slot.cancel(&mut hw));
        assert_eq!(slot.state(), Some(RoutineState::Idle));
        assert_eq!(calls.lock().unwrap().end, 0);
    }

    #[test]
    fn cancel_releases_actuators() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (recorder, calls) = Recorder::new(RoutineId::Intake);
        let mut slot = RoutineSlot::new(Box::new(recorder));

        slot.start();
        slot.step(&mut hw, DT);
        assert!((sim.gateway.snapshot().motor(Motor::Intake) - 0.5).abs() < f32::EPSILON);

        assert!(slot.cancel(&mut hw));
        assert_eq!(slot.state(), Some(RoutineState::Idle));
        assert_eq!(sim.gateway.snapshot().motor(Motor::Intake), 0.0);
        assert_eq!(calls.lock().unwrap().end, 1);
    }

    #[test]
    fn cancel_before_first_step_still_ends() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (recorder, calls) = Recorder::new(RoutineId::Intake);
        let mut slot = RoutineSlot::new(Box::new(recorder));

        slot.start();
        assert!(slot.cancel(&mut hw));
        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.initialize, 0);
        assert_eq!(calls.end, 1);
    }

    #[test]
    fn step_on_idle_does_nothing() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (recorder, calls) = Recorder::new(RoutineId::Intake);
        let mut slot = RoutineSlot::new(Box::new(recorder));

        slot.step(&mut hw, DT);
        assert_eq!(*calls.lock().unwrap(), Calls::default());
    }

    #[test]
    fn finished_routine_returns_to_idle_and_can_restart() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (mut recorder, calls) = Recorder::new(RoutineId::CompressorShutoff);
        recorder.finish_after = Some(2);
        let mut slot = RoutineSlot::new(Box::new(recorder));

        slot.start();
        slot.step(&mut hw, DT);
        assert!(slot.is_running());
        slot.step(&mut hw, DT);
        assert!(!slot.is_running());
        assert_eq!(calls.lock().unwrap().end, 1);

        // A finished run behaves exactly like a cancelled one.
        assert!(!slot.cancel(&mut hw));
        assert!(slot.start());
        slot.step(&mut hw, DT);
        assert_eq!(calls.lock().unwrap().initialize, 2);
        assert_eq!(slot.start_count(), 2);
    }

    #[test]
    fn empty_slot_ignores_everything() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let mut slot = RoutineSlot::empty(RoutineId::Elevator);

        assert!(!slot.is_present());
        assert_eq!(slot.state(), None);
        assert!(!slot.start());
        slot.step(&mut hw, DT);
        assert!(!slot.cancel(&mut hw));
        assert!(!slot.is_running());
        assert_eq!(slot.start_count(), 0);
    }

    #[test]
    fn from_option_builds_both_kinds() {
        let (recorder, _) = Recorder::new(RoutineId::Intake);
        assert!(RoutineSlot::from_option(RoutineId::Intake, Some(Box::new(recorder))).is_present());
        assert!(!RoutineSlot::from_option(RoutineId::Intake, None).is_present());
    }
}
