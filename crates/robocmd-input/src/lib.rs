//! # robocmd-input
//!
//! Declarative input-to-action bindings.  Each tick the control loop hands
//! the latest [`RemoteState`](robocmd_types::RemoteState) to the
//! [`CommandMapper`], which evaluates every registered mapping in order and
//! calls `add_command` / `remove_command` on the scheduler.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`map_state`] | [`RemoteMapState`]: switch/key/mouse predicate |
//! | [`mapping`] | Press, Hold, HoldRepeat and Toggle mappings |
//! | [`cycle`] | [`CycleStateMapping`]: step a setter through a value list |
//! | [`mapper`] | [`CommandMapper`]: ordered mapping table |
//! | [`operator`] | [`OperatorInterface`]: normalised chassis/turret setpoints |

pub mod cycle;
pub mod map_state;
pub mod mapper;
pub mod mapping;
pub mod operator;

pub use cycle::CycleStateMapping;
pub use map_state::RemoteMapState;
pub use mapper::CommandMapper;
pub use mapping::{
    CommandMapping, HoldMapping, HoldRepeatMapping, MappingKind, PressMapping, ToggleMapping,
};
pub use operator::{OperatorInterface, SharedRemoteState};
