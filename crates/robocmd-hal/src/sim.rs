//! [`SimMotor`] – in-process motor stub for CI and scripted runs.
//!
//! | Behaviour | Stub |
//! |---|---|
//! | `set_output` | Clamps to `[-1, 1]` and stores the value while online. |
//! | `set_output` while offline | Returns [`RoboError::HardwareFault`]. |
//! | `output()` | Returns the last accepted value. |
//!
//! # Example
//!
//! ```rust
//! use robocmd_hal::{Motor, SimMotor};
//!
//! let mut yaw = SimMotor::new("yaw");
//! yaw.set_output(2.0).unwrap();
//! assert_eq!(yaw.output(), 1.0);
//!
//! yaw.set_online(false);
//! assert!(yaw.set_output(0.5).is_err());
//! ```

use robocmd_types::RoboError;
use tracing::trace;

use crate::motor::Motor;

/// Output limit applied by the stub, in normalised units.
pub const SIM_OUTPUT_LIMIT: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct SimMotor {
    id: String,
    output: f32,
    online: bool,
}

impl SimMotor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            output: 0.0,
            online: true,
        }
    }

    /// Simulate the device dropping off (or rejoining) the bus.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
        if !online {
            self.output = 0.0;
        }
    }
}

impl Motor for SimMotor {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_output(&mut self, output: f32) -> Result<(), RoboError> {
        if !self.online {
            return Err(RoboError::HardwareFault {
                component: self.id.clone(),
                details: "motor is offline".to_string(),
            });
        }
        self.output = output.clamp(-SIM_OUTPUT_LIMIT, SIM_OUTPUT_LIMIT);
        trace!(motor = %self.id, output = self.output, "sim motor output");
        Ok(())
    }

    fn output(&self) -> f32 {
        self.output
    }

    fn is_online(&self) -> bool {
        self.online
    }
}
