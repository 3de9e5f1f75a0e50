//! [`RoutineSet`] – the fixed registry of every control routine.
//!
//! Created once at boot with all slots idle and never resized.  The set is
//! the single enumerable owner of the robot's routines and the only thing the
//! scheduler steps.
//!
//! Start/cancel authority is split by type rather than by locking:
//!
//! - [`ModeRoutines`] (teleop drive, intake, elevator) is handed out by
//!   [`RoutineSet::mode_routines_mut`] to the mode controller.
//! - The compressor-shutoff slot is only mutable inside this crate, where the
//!   [`SupervisoryTick`][crate::supervisor::SupervisoryTick] lives.

use std::time::Duration;

use roboloop_hal::Hardware;
use roboloop_types::{RoutineId, RoutineState};

use crate::routine::RoutineSlot;

/// The three mode-owned routine slots.
pub struct ModeRoutines {
    teleop_drive: RoutineSlot,
    intake: RoutineSlot,
    elevator: RoutineSlot,
}

impl ModeRoutines {
    /// Group the mode-owned slots.  Each slot must carry the matching id.
    pub fn new(teleop_drive: RoutineSlot, intake: RoutineSlot, elevator: RoutineSlot) -> Self {
        debug_assert_eq!(teleop_drive.id(), RoutineId::TeleopDrive);
        debug_assert_eq!(intake.id(), RoutineId::Intake);
        debug_assert_eq!(elevator.id(), RoutineId::Elevator);
        Self {
            teleop_drive,
            intake,
            elevator,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutineSlot> {
        [&self.teleop_drive, &self.intake, &self.elevator].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RoutineSlot> {
        [&mut self.teleop_drive, &mut self.intake, &mut self.elevator].into_iter()
    }

    /// Start every present, idle slot.  Returns how many actually started.
    pub fn start_all(&mut self) -> usize {
        self.iter_mut().map(RoutineSlot::start).filter(|started| *started).count()
    }

    /// Cancel every running slot.  Returns how many were actually cancelled.
    pub fn cancel_all(&mut self, hw: &mut Hardware) -> usize {
        self.iter_mut()
            .map(|slot| slot.cancel(hw))
            .filter(|cancelled| *cancelled)
            .count()
    }
}

/// Registry of every routine the robot runs.
pub struct RoutineSet {
    mode_owned: ModeRoutines,
    compressor_shutoff: RoutineSlot,
}

impl RoutineSet {
    pub fn new(mode_owned: ModeRoutines, compressor_shutoff: RoutineSlot) -> Self {
        debug_assert_eq!(compressor_shutoff.id(), RoutineId::CompressorShutoff);
        Self {
            mode_owned,
            compressor_shutoff,
        }
    }

    /// Start/cancel access to the mode-owned routines.
    pub fn mode_routines_mut(&mut self) -> &mut ModeRoutines {
        &mut self.mode_owned
    }

    pub(crate) fn compressor_shutoff_mut(&mut self) -> &mut RoutineSlot {
        &mut self.compressor_shutoff
    }

    /// Every slot, in [`RoutineId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &RoutineSlot> {
        self.mode_owned
            .iter()
            .chain(std::iter::once(&self.compressor_shutoff))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut RoutineSlot> {
        self.mode_owned
            .iter_mut()
            .chain(std::iter::once(&mut self.compressor_shutoff))
    }

    /// Step every running routine once.
    pub fn step_all(&mut self, hw: &mut Hardware, dt: Duration) {
        for slot in self.iter_mut() {
            slot.step(hw, dt);
        }
    }

    /// State of `id`, or `None` if that routine is absent.
    pub fn state(&self, id: RoutineId) -> Option<RoutineState> {
        self.iter().find(|slot| slot.id() == id).and_then(RoutineSlot::state)
    }

    pub fn is_running(&self, id: RoutineId) -> bool {
        self.state(id) == Some(RoutineState::Running)
    }

    /// `(id, state)` for every slot, in [`RoutineId::ALL`] order.
    pub fn states(&self) -> Vec<(RoutineId, Option<RoutineState>)> {
        self.iter().map(|slot| (slot.id(), slot.state())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::tests::Recorder;
    use roboloop_hal::sim::SimHardware;

    fn recording_slot(id: RoutineId) -> RoutineSlot {
        RoutineSlot::new(Box::new(Recorder::new(id).0))
    }

    fn full_set() -> RoutineSet {
        RoutineSet::new(
            ModeRoutines::new(
                recording_slot(RoutineId::TeleopDrive),
                recording_slot(RoutineId::Intake),
                recording_slot(RoutineId::Elevator),
            ),
            recording_slot(RoutineId::CompressorShutoff),
        )
    }

    #[test]
    fn new_set_is_all_idle_in_canonical_order() {
        let set = full_set();
        let states = set.states();
        let ids: Vec<_> = states.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, RoutineId::ALL.to_vec());
        assert!(states.iter().all(|(_, s)| *s == Some(RoutineState::Idle)));
    }

    #[test]
    fn start_all_and_cancel_all_touch_only_mode_routines() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let mut set = full_set();

        assert_eq!(set.mode_routines_mut().start_all(), 3);
        assert_eq!(set.mode_routines_mut().start_all(), 0);
        for id in RoutineId::MODE_OWNED {
            assert!(set.is_running(id));
        }
        assert!(!set.is_running(RoutineId::CompressorShutoff));

        set.compressor_shutoff_mut().start();
        assert_eq!(set.mode_routines_mut().cancel_all(&mut hw), 3);
        assert_eq!(set.mode_routines_mut().cancel_all(&mut hw), 0);
        assert!(set.is_running(RoutineId::CompressorShutoff));
    }

    #[test]
    fn step_all_steps_only_running_routines() {
        let sim = SimHardware::new();
        let mut hw = sim.build();
        let (intake, intake_calls) = Recorder::new(RoutineId::Intake);
        let (elevator, elevator_calls) = Recorder::new(RoutineId::Elevator);
        let mut set = RoutineSet::new(
            ModeRoutines::new(
                recording_slot(RoutineId::TeleopDrive),
                RoutineSlot::new(Box::new(intake)),
                RoutineSlot::new(Box::new(elevator)),
            ),
            recording_slot(RoutineId::CompressorShutoff),
        );

        set.mode_routines_mut()
            .iter_mut()
            .find(|s| s.id() == RoutineId::Intake)
            .unwrap()
            .start();
        set.step_all(&mut hw, Duration::from_millis(20));
        set.step_all(&mut hw, Duration::from_millis(20));

        assert_eq!(intake_calls.lock().unwrap().execute, 2);
        assert_eq!(elevator_calls.lock().unwrap().execute, 0);
    }

    #[test]
    fn absent_routines_report_none_and_are_skipped() {
        let mut set = RoutineSet::new(
            ModeRoutines::new(
                recording_slot(RoutineId::TeleopDrive),
                RoutineSlot::empty(RoutineId::Intake),
                recording_slot(RoutineId::Elevator),
            ),
            RoutineSlot::empty(RoutineId::CompressorShutoff),
        );

        assert_eq!(set.state(RoutineId::Intake), None);
        assert_eq!(set.state(RoutineId::CompressorShutoff), None);
        assert_eq!(set.mode_routines_mut().start_all(), 2);
        assert!(!set.is_running(RoutineId::Intake));
    }
}
