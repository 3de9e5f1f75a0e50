//! [`Hardware`] – the process-wide collaborator handle set.
//!
//! Built once at startup and passed by mutable reference to the lifecycle,
//! the mode controller, the supervisory tick and every routine step.  There
//! is no ambient global lookup: whoever holds the `&mut Hardware` holds the
//! right to command actuators.

use crate::gateway::ActuatorGateway;
use crate::operator::OperatorInput;
use crate::power::PowerMonitor;
use crate::telemetry_store::TelemetryStore;
use crate::vision::VisionLink;

/// Every collaborator the control core consumes.
pub struct Hardware {
    pub gateway: Box<dyn ActuatorGateway>,
    pub telemetry: Box<dyn TelemetryStore>,
    pub power: Box<dyn PowerMonitor>,
    pub vision: Box<dyn VisionLink>,
    pub operator: Box<dyn OperatorInput>,
}

impl Hardware {
    /// Assemble a context from individually constructed drivers.
    pub fn new(
        gateway: Box<dyn ActuatorGateway>,
        telemetry: Box<dyn TelemetryStore>,
        power: Box<dyn PowerMonitor>,
        vision: Box<dyn VisionLink>,
        operator: Box<dyn OperatorInput>,
    ) -> Self {
        Self {
            gateway,
            telemetry,
            power,
            vision,
            operator,
        }
    }
}
