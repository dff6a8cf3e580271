//! # robocmd-control
//!
//! Composable policy on top of the kernel's [`Command`](robocmd_kernel::Command)
//! trait: governors that gate commands at runtime, and comprised commands
//! that sequence children through a nested scheduler.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`governor`] | [`Governor`] trait, [`GovernorSet`] conjunction, [`FnGovernor`] closure adapter |
//! | [`governor_limited`] | [`GovernorLimitedCommand`]: end the inner command when a governor denies |
//! | [`fallback`] | [`GovernorWithFallbackCommand`]: run a fallback instead of stopping |
//! | [`comprised`] | [`AlternatingCommand`], [`TimedSwitchCommand`] |

pub mod comprised;
pub mod fallback;
pub mod governor;
pub mod governor_limited;

#[cfg(test)]
mod test_support;

pub use comprised::{AlternatingCommand, TimedSwitchCommand};
pub use fallback::{ActiveChild, GovernorWithFallbackCommand};
pub use governor::{FnGovernor, Governor, GovernorSet};
pub use governor_limited::GovernorLimitedCommand;
