//! # robocmd-kernel
//!
//! The command-based control core: subsystems, commands, the ownership table
//! and the scheduler that ties them together.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`subsystem`] | [`Subsystem`] trait and the shared [`SubsystemHandle`] |
//! | [`command`] | [`Command`] lifecycle trait and the shared [`CommandHandle`] |
//! | [`ownership`] | [`OwnershipTable`]: at most one owner per subsystem |
//! | [`scheduler`] | [`CommandScheduler`]: refresh → execute → finish → defaults |
//! | [`timeout`] | [`TickTimeout`]: elapsed-tick countdown for multi-phase commands |
//!
//! Everything here is single-threaded.  Handles are `Rc<RefCell<_>>` and the
//! scheduler is driven from one control loop; no locks are taken.

pub mod command;
pub mod ownership;
pub mod scheduler;
pub mod subsystem;
pub mod timeout;

pub use command::{Command, CommandHandle, CommandId};
pub use ownership::OwnershipTable;
pub use scheduler::{CommandScheduler, SafeDisconnectFn};
pub use subsystem::{Subsystem, SubsystemHandle};
pub use timeout::TickTimeout;
