//! `robocmd-hal` – actuator driver boundary.
//!
//! Subsystems own one or more [`Motor`]s and pump them from their
//! `refresh()`.  The rest of the stack never talks to a bus directly, so the
//! simulated drivers in [`sim`] can stand in for real hardware in tests and
//! in the CLI.
//!
//! # Modules
//!
//! - [`motor`] – [`Motor`][motor::Motor]: output-controlled actuator trait.
//! - [`sim`] – [`SimMotor`][sim::SimMotor]: in-process stub that records the
//!   last commanded output and can be taken offline.

pub mod motor;
pub mod sim;

pub use motor::Motor;
pub use sim::SimMotor;
