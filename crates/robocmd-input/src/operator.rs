//! [`OperatorInterface`] – shapes the raw remote snapshot into normalised
//! chassis and turret setpoints.
//!
//! Keyboard and stick inputs are summed and clamped to `[-1, 1]`:
//!
//! | Axis | Stick | Keys |
//! |------|-------|------|
//! | chassis x (forward) | left vertical | `W` − `S` |
//! | chassis y (left) | −left horizontal | `A` − `D` |
//! | chassis r (ccw) | −right horizontal | `Q` − `E` |
//! | turret yaw | −right horizontal | −mouse x / 1000 |
//! | turret pitch | −right vertical | mouse y / 1000 |
//!
//! Holding `Ctrl` scales translation by 1/3 (slow mode).  Rotation is never
//! scaled.

use std::cell::RefCell;
use std::rc::Rc;

use robocmd_types::{Key, RemoteState};

/// The remote snapshot shared between the control loop (writer) and the
/// commands that read operator input.
pub type SharedRemoteState = Rc<RefCell<RemoteState>>;

pub const USER_MOUSE_YAW_MAX: i16 = 1000;
pub const USER_MOUSE_PITCH_MAX: i16 = 1000;
pub const SPEED_REDUCTION_SCALAR: f32 = 1.0 / 3.0;

#[derive(Clone)]
pub struct OperatorInterface {
    remote: SharedRemoteState,
}

impl OperatorInterface {
    pub fn new(remote: SharedRemoteState) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &SharedRemoteState {
        &self.remote
    }

    pub fn is_slow_mode(&self) -> bool {
        self.remote.borrow().key_pressed(Key::Ctrl)
    }

    pub fn chassis_x_input(&self) -> f32 {
        let r = self.remote.borrow();
        let keys = axis(&r, Key::W, Key::S);
        self.scale_translation(clamp_unit(r.left_vertical + keys))
    }

    pub fn chassis_y_input(&self) -> f32 {
        let r = self.remote.borrow();
        let keys = axis(&r, Key::A, Key::D);
        self.scale_translation(clamp_unit(-r.left_horizontal + keys))
    }

    pub fn chassis_r_input(&self) -> f32 {
        let r = self.remote.borrow();
        let keys = axis(&r, Key::Q, Key::E);
        clamp_unit(-r.right_horizontal + keys)
    }

    pub fn turret_yaw_input(&self) -> f32 {
        let r = self.remote.borrow();
        let mouse = r
            .mouse_x
            .saturating_neg()
            .clamp(-USER_MOUSE_YAW_MAX, USER_MOUSE_YAW_MAX);
        -r.right_horizontal + f32::from(mouse) / f32::from(USER_MOUSE_YAW_MAX)
    }

    pub fn turret_pitch_input(&self) -> f32 {
        let r = self.remote.borrow();
        let mouse = r.mouse_y.clamp(-USER_MOUSE_PITCH_MAX, USER_MOUSE_PITCH_MAX);
        -r.right_vertical + f32::from(mouse) / f32::from(USER_MOUSE_PITCH_MAX)
    }

    fn scale_translation(&self, value: f32) -> f32 {
        if self.is_slow_mode() {
            value * SPEED_REDUCTION_SCALAR
        } else {
            value
        }
    }
}

fn axis(remote: &RemoteState, positive: Key, negative: Key) -> f32 {
    let pressed = |key| f32::from(u8::from(remote.key_pressed(key)));
    pressed(positive) - pressed(negative)
}

fn clamp_unit(value: f32) -> f32 {
    value.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interface(remote: RemoteState) -> OperatorInterface {
        OperatorInterface::new(Rc::new(RefCell::new(remote)))
    }

    fn keys(keys: &[Key]) -> RemoteState {
        RemoteState {
            keys: keys.iter().copied().collect(),
            ..RemoteState::default()
        }
    }

    #[test]
    fn keys_and_stick_sum_then_clamp() {
        let mut remote = keys(&[Key::W]);
        remote.left_vertical = 0.5;
        assert_eq!(interface(remote).chassis_x_input(), 1.0);

        let remote = keys(&[Key::W, Key::S]);
        assert_eq!(interface(remote).chassis_x_input(), 0.0);
    }

    #[test]
    fn ctrl_slows_translation_only() {
        let op = interface(keys(&[Key::A, Key::Ctrl, Key::Q]));
        assert!(op.is_slow_mode());
        assert!((op.chassis_y_input() - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(op.chassis_r_input(), 1.0);
    }

    #[test]
    fn mouse_is_clamped_and_scaled() {
        let remote = RemoteState {
            mouse_x: -5000,
            mouse_y: 500,
            ..RemoteState::default()
        };
        let op = interface(remote);
        assert_eq!(op.turret_yaw_input(), 1.0);
        assert_eq!(op.turret_pitch_input(), 0.5);
    }

    #[test]
    fn reads_latest_shared_snapshot() {
        let shared = Rc::new(RefCell::new(RemoteState::default()));
        let op = OperatorInterface::new(shared.clone());
        assert_eq!(op.chassis_x_input(), 0.0);
        shared.borrow_mut().keys.insert(Key::S);
        assert_eq!(op.chassis_x_input(), -1.0);
    }
}
