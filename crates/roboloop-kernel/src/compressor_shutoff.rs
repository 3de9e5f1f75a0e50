//! [`CompressorShutoff`] – rests the compressor while the supply browns out.
//!
//! On its first step the routine disables the compressor's closed-loop
//! control.  Time is counted from that step, so the compressor stays off for
//! the full configured duration: the routine finishes, re-enabling
//! closed-loop control in [`end`][ControlRoutine::end], on the first step at
//! which that much tick time has passed since the compressor stopped.  The same `end` runs if the routine is
//! cancelled, so the compressor is never left disabled.

use std::time::Duration;

use roboloop_hal::{ActuatorGateway, Hardware, TelemetryStore};
use roboloop_types::{RoutineId, keys};
use tracing::{debug, info, warn};

use crate::routine::{ControlRoutine, RoutineStatus};

/// How long the compressor stays off per brownout engagement.  At a 20 ms
/// tick this is 300 periods, measured from the tick that disables it.
pub const DEFAULT_SHUTOFF_DURATION: Duration = Duration::from_secs(6);

/// Time-bounded, self-terminating compressor rest.
pub struct CompressorShutoff {
    duration: Duration,
    elapsed: Duration,
}

impl CompressorShutoff {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
        }
    }
}

impl Default for CompressorShutoff {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTOFF_DURATION)
    }
}

impl ControlRoutine for CompressorShutoff {
    fn id(&self) -> RoutineId {
        RoutineId::CompressorShutoff
    }

    fn initialize(&mut self, hw: &mut Hardware) {
        self.elapsed = Duration::ZERO;
        if let Err(e) = hw.gateway.set_compressor_enabled(false) {
            warn!(error = %e, "failed to disable compressor closed-loop control");
        }
        if let Err(e) = hw.telemetry.put_bool(keys::COMPRESSOR_SHUTOFF_ACTIVE, true) {
            debug!(error = %e, "could not publish compressor shutoff state");
        }
        info!(duration_ms = self.duration.as_millis() as u64, "compressor resting");
    }

    fn execute(&mut self, _hw: &mut Hardware, dt: Duration) -> RoutineStatus {
        // `elapsed` is the off-time before this step.
        if self.elapsed >= self.duration {
            return RoutineStatus::Finished;
        }
        self.elapsed += dt;
        RoutineStatus::Continue
    }

    fn end(&mut self, hw: &mut Hardware) {
        if let Err(e) = hw.gateway.set_compressor_enabled(true) {
            warn!(error = %e, "failed to re-enable compressor closed-loop control");
        }
        if let Err(e) = hw.telemetry.put_bool(keys::COMPRESSOR_SHUTOFF_ACTIVE, false) {
            debug!(error = %e, "could not publish compressor shutoff state");
        }
        info!(
            elapsed_ms = self.elapsed.as_millis() as u64,
            "compressor closed-loop control restored"
        );
    }
}
