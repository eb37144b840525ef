use bevy_math::Mat4;
use bevy_math::Vec3;

/// Constant buffer views must be sized in multiples of 256 bytes.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

pub const fn align_up(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionSettings {
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            fov_y_radians: 60f32.to_radians(),
            near: 0.01,
            far: 100.0,
        }
    }
}

/// The matrices feeding the vertex stage. Only `view` changes after
/// construction.
#[derive(Clone, Copy, Debug)]
pub struct TransformState {
    world: Mat4,
    view: Mat4,
    projection: Mat4,
}

impl TransformState {
    pub fn new(aspect_ratio: f32, settings: ProjectionSettings) -> Self {
        Self {
            world: Mat4::from_translation(Vec3::ZERO) * Mat4::from_scale(Vec3::splat(0.5)),
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_lh(
                settings.fov_y_radians,
                aspect_ratio,
                settings.near,
                settings.far,
            ),
        }
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Combined model-view-projection, applied to column vectors.
    pub fn mwp(&self) -> Mat4 {
        self.projection * self.view * self.world
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec4;

    use super::*;

    #[test]
    fn aligns_to_constant_buffer_granularity() {
        assert_eq!(align_up(64, CONSTANT_BUFFER_ALIGNMENT), 256);
        assert_eq!(align_up(256, CONSTANT_BUFFER_ALIGNMENT), 256);
        assert_eq!(align_up(257, CONSTANT_BUFFER_ALIGNMENT), 512);
        assert_eq!(align_up(0, CONSTANT_BUFFER_ALIGNMENT), 0);
    }

    #[test]
    fn world_scales_by_half() {
        let transforms = TransformState::new(16.0 / 9.0, ProjectionSettings::default());
        let p = transforms.world().transform_point3(Vec3::new(2.0, 4.0, -2.0));
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, -1.0), 1e-6));
    }

    #[test]
    fn mwp_applies_world_then_view_then_projection() {
        let mut transforms = TransformState::new(1.0, ProjectionSettings::default());
        transforms.set_view(Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));

        let point = Vec4::new(1.0, 1.0, 1.0, 1.0);
        let expected = transforms.projection() * (transforms.view() * (transforms.world() * point));
        assert!((transforms.mwp() * point).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn projection_keeps_points_ahead_inside_the_clip_volume() {
        let transforms = TransformState::new(1.0, ProjectionSettings::default());
        let clip = transforms.projection() * Vec4::new(0.0, 0.0, 10.0, 1.0);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
    }
}
