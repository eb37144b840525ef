use bevy_math::Mat4;
use bevy_math::Vec3;
use tracing::trace;

// Win32 virtual-key codes.
const VK_LEFT: u8 = 0x25;
const VK_UP: u8 = 0x26;
const VK_RIGHT: u8 = 0x27;
const VK_DOWN: u8 = 0x28;

/// The four logical camera bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraKey {
    Forward,
    Back,
    YawLeft,
    YawRight,
}

impl CameraKey {
    /// Maps WASD and the arrow keys; anything else is not a camera key.
    pub fn from_virtual_key(key: u8) -> Option<Self> {
        match key {
            b'W' | VK_UP => Some(Self::Forward),
            b'S' | VK_DOWN => Some(Self::Back),
            b'A' | VK_LEFT => Some(Self::YawLeft),
            b'D' | VK_RIGHT => Some(Self::YawRight),
            _ => None,
        }
    }
}

/// Per-tick step sizes. Positive yaw turns from +Z towards +X (to the right
/// in a left-handed frame).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    pub move_step: f32,
    pub turn_step: f32,
    pub start_position: Vec3,
    pub start_angle: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_step: 0.01,
            turn_step: 0.01,
            start_position: Vec3::new(0.0, 1.0, 0.0),
            start_angle: 0.0,
        }
    }
}

/// Unit vector the camera looks along for a heading angle in radians.
pub fn heading_vector(angle: f32) -> Vec3 {
    Vec3::new(angle.sin(), 0.0, angle.cos())
}

/// First-person camera driven by held keys.
///
/// Forward/back share one delta and yaw-left/yaw-right share another, so each
/// axis is always zero or exactly its step with the sign of the last key
/// pressed on that axis.
#[derive(Clone, Debug)]
pub struct CameraController {
    settings: CameraSettings,
    eye_position: Vec3,
    angle: f32,
    forward_delta: f32,
    rotation_delta: f32,
    view: Mat4,
}

impl CameraController {
    pub fn new(settings: CameraSettings) -> Self {
        let mut camera = Self {
            settings,
            eye_position: settings.start_position,
            angle: settings.start_angle,
            forward_delta: 0.0,
            rotation_delta: 0.0,
            view: Mat4::IDENTITY,
        };
        camera.view = camera.look_at();
        camera
    }

    pub fn key_down(&mut self, key: CameraKey) {
        match key {
            CameraKey::Forward => self.forward_delta = self.settings.move_step,
            CameraKey::Back => self.forward_delta = -self.settings.move_step,
            CameraKey::YawLeft => self.rotation_delta = -self.settings.turn_step,
            CameraKey::YawRight => self.rotation_delta = self.settings.turn_step,
        }
    }

    pub fn key_up(&mut self, key: CameraKey) {
        match key {
            CameraKey::Forward | CameraKey::Back => self.forward_delta = 0.0,
            CameraKey::YawLeft | CameraKey::YawRight => self.rotation_delta = 0.0,
        }
    }

    /// Integrates one tick of the held deltas and rebuilds the view matrix.
    pub fn update(&mut self) -> Mat4 {
        self.angle += self.rotation_delta;
        self.eye_position += self.forward_delta * heading_vector(self.angle);
        self.view = self.look_at();
        trace!(eye = ?self.eye_position, angle = self.angle, "camera updated");
        self.view
    }

    fn look_at(&self) -> Mat4 {
        Mat4::look_at_lh(
            self.eye_position,
            self.eye_position + heading_vector(self.angle),
            Vec3::Y,
        )
    }

    pub fn eye_position(&self) -> Vec3 {
        self.eye_position
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn forward_delta(&self) -> f32 {
        self.forward_delta
    }

    pub fn rotation_delta(&self) -> f32 {
        self.rotation_delta
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn at_origin(move_step: f32, turn_step: f32) -> CameraController {
        CameraController::new(CameraSettings {
            move_step,
            turn_step,
            start_position: Vec3::ZERO,
            start_angle: 0.0,
        })
    }

    #[test]
    fn heading_at_zero_is_forward() {
        assert!(heading_vector(0.0).abs_diff_eq(Vec3::Z, EPSILON));
        assert!(heading_vector(std::f32::consts::FRAC_PI_2).abs_diff_eq(Vec3::X, EPSILON));
    }

    #[test]
    fn view_at_origin_is_identity() {
        let camera = at_origin(0.1, 0.1);
        assert!(camera.view().abs_diff_eq(Mat4::IDENTITY, EPSILON));
    }

    #[test]
    fn maps_wasd_and_arrows() {
        assert_eq!(CameraKey::from_virtual_key(b'W'), Some(CameraKey::Forward));
        assert_eq!(CameraKey::from_virtual_key(VK_DOWN), Some(CameraKey::Back));
        assert_eq!(CameraKey::from_virtual_key(b'A'), Some(CameraKey::YawLeft));
        assert_eq!(CameraKey::from_virtual_key(VK_RIGHT), Some(CameraKey::YawRight));
        assert_eq!(CameraKey::from_virtual_key(b'Q'), None);
    }

    #[test]
    fn axes_hold_zero_or_exact_step() {
        let keys = [
            CameraKey::Forward,
            CameraKey::YawLeft,
            CameraKey::Back,
            CameraKey::YawRight,
        ];
        let mut camera = at_origin(0.5, 0.25);
        // Walk a fixed pseudo-random press/release pattern over all keys.
        let mut state = 7u32;
        for _ in 0..200 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let key = keys[(state >> 16) as usize % keys.len()];
            if state & 1 == 0 {
                camera.key_down(key);
            } else {
                camera.key_up(key);
            }
            assert!([0.0, 0.5, -0.5].contains(&camera.forward_delta()));
            assert!([0.0, 0.25, -0.25].contains(&camera.rotation_delta()));
        }
    }

    #[test]
    fn key_up_resets_the_axis() {
        let mut camera = at_origin(1.0, 1.0);
        camera.key_down(CameraKey::Back);
        camera.key_down(CameraKey::YawLeft);
        assert_eq!(camera.forward_delta(), -1.0);
        assert_eq!(camera.rotation_delta(), -1.0);

        camera.key_up(CameraKey::Back);
        camera.key_up(CameraKey::YawLeft);
        assert_eq!(camera.forward_delta(), 0.0);
        assert_eq!(camera.rotation_delta(), 0.0);
    }

    #[test]
    fn idle_updates_change_nothing() {
        let mut camera = CameraController::new(CameraSettings::default());
        let eye = camera.eye_position();
        let angle = camera.angle();
        for _ in 0..100 {
            camera.update();
        }
        assert_eq!(camera.eye_position(), eye);
        assert_eq!(camera.angle(), angle);
    }

    #[test]
    fn walks_along_the_initial_heading() {
        let mut camera = at_origin(0.001, 0.0);
        camera.key_down(CameraKey::Forward);
        for _ in 0..1000 {
            camera.update();
        }
        let displacement = camera.eye_position();
        assert!((displacement.length() - 1.0).abs() < 1e-3);
        assert!(displacement.normalize().abs_diff_eq(Vec3::Z, EPSILON));
    }

    #[test]
    fn turning_rotates_the_heading() {
        let mut camera = at_origin(0.0, std::f32::consts::FRAC_PI_2);
        camera.key_down(CameraKey::YawRight);
        camera.update();
        assert!((camera.angle() - std::f32::consts::FRAC_PI_2).abs() < EPSILON);

        let view = camera.view();
        // Looking down +X, a point ahead lands on +Z in view space.
        let ahead = view.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), EPSILON));
    }
}
