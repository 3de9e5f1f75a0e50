//! [`SupervisoryTick`] – the fixed-rate loop and the brownout interlock.
//!
//! Each call to [`SupervisoryTick::tick`]:
//!
//! 1. steps every running routine once;
//! 2. samples the operator's brownout-shutoff flag from the telemetry store
//!    (fail-safe `false`) and the power monitor's brownout state;
//! 3. starts [`CompressorShutoff`][crate::compressor_shutoff::CompressorShutoff]
//!    when both are set and it is not already running.
//!
//! Both inputs are re-read every tick, so a brownout that outlasts one
//! shutoff re-arms the interlock on the first tick after it finishes.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use roboloop_hal::sim::SimHardware;
//! use roboloop_kernel::{
//!     CompressorShutoff, ModeRoutines, RoutineSet, RoutineSlot, SupervisoryTick,
//! };
//! use roboloop_types::{RoutineId, keys};
//!
//! let sim = SimHardware::new();
//! let mut hw = sim.build();
//! let mut routines = RoutineSet::new(
//!     ModeRoutines::new(
//!         RoutineSlot::empty(RoutineId::TeleopDrive),
//!         RoutineSlot::empty(RoutineId::Intake),
//!         RoutineSlot::empty(RoutineId::Elevator),
//!     ),
//!     RoutineSlot::new(Box::new(CompressorShutoff::default())),
//! );
//! let mut supervisor = SupervisoryTick::new(Duration::from_millis(20));
//!
//! sim.telemetry.set_bool(keys::COMPRESSOR_BROWNOUT_SHUTOFF, true);
//! sim.power.set_browned_out(true);
//!
//! let report = supervisor.tick(&mut routines, &mut hw);
//! assert!(report.interlock_engaged);
//! assert!(routines.is_running(RoutineId::CompressorShutoff));
//! ```

use std::time::Duration;

use roboloop_hal::{Hardware, PowerMonitor, TelemetryStore};
use roboloop_types::keys;
use tracing::{debug, warn};

use crate::routine_set::RoutineSet;

/// What happened during one supervisory tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// 1-based count of ticks since construction.
    pub tick: u64,
    pub safety_flag: bool,
    pub browned_out: bool,
    /// The compressor shutoff was started on this tick.
    pub interlock_engaged: bool,
    /// A running compressor shutoff finished on this tick.
    pub interlock_released: bool,
}

/// Fixed-rate supervisory loop.  Owns start authority over the compressor
/// shutoff routine.
pub struct SupervisoryTick {
    period: Duration,
    ticks: u64,
}

impl SupervisoryTick {
    /// `period` is the host's fixed tick period; it is handed to every
    /// routine step as the elapsed time.
    pub fn new(period: Duration) -> Self {
        Self { period, ticks: 0 }
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one supervisory tick.
    pub fn tick(&mut self, routines: &mut RoutineSet, hw: &mut Hardware) -> TickReport {
        self.ticks += 1;

        let was_resting = routines.compressor_shutoff_mut().is_running();
        routines.step_all(hw, self.period);
        let shutoff = routines.compressor_shutoff_mut();
        let interlock_released = was_resting && !shutoff.is_running();

        let safety_flag = hw
            .telemetry
            .get_bool_or(keys::COMPRESSOR_BROWNOUT_SHUTOFF, false);
        let browned_out = hw.power.is_browned_out();

        let mut interlock_engaged = false;
        if safety_flag && browned_out && !shutoff.is_running() {
            interlock_engaged = shutoff.start();
            if interlock_engaged {
                warn!(tick = self.ticks, "power bus browning out; resting compressor");
            }
        }

        debug!(tick = self.ticks, safety_flag, browned_out, "supervisory tick");

        TickReport {
            tick: self.ticks,
            safety_flag,
            browned_out,
            interlock_engaged,
            interlock_released,
        }
    }
}
