//! Generic `Motor` trait for wheel, gimbal, feeder and flywheel drives.
//!
//! Drivers implement this trait and are owned by a subsystem.  Commands never
//! hold a motor; they set subsystem setpoints and the subsystem writes the
//! motor outputs on its next refresh.

use robocmd_types::RoboError;

/// An output-controlled actuator (current, voltage or normalised duty).
pub trait Motor {
    /// Stable identifier, e.g. `"yaw"` or `"chassis_front_left"`.
    fn id(&self) -> &str;

    /// Command a new output.
    ///
    /// # Errors
    ///
    /// Returns [`RoboError::HardwareFault`] if the driver is offline or
    /// cannot accept the command.
    fn set_output(&mut self, output: f32) -> Result<(), RoboError>;

    /// Most recently commanded output.
    fn output(&self) -> f32;

    /// Whether the driver has heard from the device recently.
    fn is_online(&self) -> bool;
}
