//! # robocmd-runtime
//!
//! Drives the command stack at a fixed period.
//!
//! - [`control_loop`] – [`ControlLoop`]: poll input, watch the link, evaluate
//!   mappings, run the scheduler; [`ControlLoop::run`] repeats that on a tokio
//!   interval and warns on overruns.
//! - [`watchdog`] – [`LinkWatchdog`]: tick-counted heartbeat per input link.
//! - [`source`] – [`InputSource`] trait and the [`QueuedInput`] frame queue.
//! - [`telemetry`] – [`init_tracing`]: `tracing-subscriber` with optional
//!   OTLP export.

pub mod control_loop;
pub mod source;
pub mod telemetry;
pub mod watchdog;

pub use control_loop::{ControlLoop, ControlLoopConfig, REMOTE_LINK, RunSummary, TickReport};
pub use source::{InputSource, QueuedInput};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use watchdog::{LinkHealth, LinkWatchdog};
