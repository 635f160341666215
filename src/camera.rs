//! Perspective camera and orbit-style controls.
//!
//! The controls keep the camera on a sphere around a target point. Pointer
//! and wheel input accumulate pending deltas which `OrbitControls::update`
//! applies once per frame, optionally decaying them for damped motion.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

use crate::input::{InputState, KeyCode, MouseButton};

const POLAR_EPSILON: f32 = 1e-6;
const MOVE_EPSILON: f32 = 1e-6;

/// Perspective camera looking at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov,
            aspect,
            near,
            far,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection with the `[0, 1]` depth range wgpu expects.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Screen-space right direction in world coordinates.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Screen-space up direction in world coordinates.
    pub fn screen_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn distance_to_target(&self) -> f32 {
        (self.position - self.target).length()
    }
}

/// Rotates, dollies and pans a camera around a target point.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Pixels panned per frame while an arrow key is held.
    pub key_pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Pending (azimuth, polar) rotation in radians.
    spherical_delta: Vec2,
    scale: f32,
    pan_offset: Vec3,
    last_pointer: Option<Vec2>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            key_pan_speed: 7.0,
            min_distance: 1.0,
            max_distance: 500.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Vec2::ZERO,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            last_pointer: None,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.x -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.y -= angle;
    }

    /// Moves the camera toward the target by `dolly_scale` (< 1).
    pub fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    /// Moves the camera away from the target by `dolly_scale` (< 1).
    pub fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Pans by a screen-space pixel delta on a viewport `height` pixels tall.
    pub fn pan(&mut self, dx: f32, dy: f32, height: f32, camera: &PerspectiveCamera) {
        let distance = (camera.position - self.target).length();
        let target_distance = distance * (camera.fov.to_radians() * 0.5).tan();
        let height = height.max(1.0);
        let left = 2.0 * dx * target_distance / height * self.pan_speed;
        let up = 2.0 * dy * target_distance / height * self.pan_speed;
        self.pan_offset += -camera.right() * left + camera.screen_up() * up;
    }

    /// Converts the current input snapshot into pending camera motion.
    pub fn apply_input(
        &mut self,
        input: &InputState,
        camera: &PerspectiveCamera,
        viewport: (u32, u32),
    ) {
        let height = viewport.1.max(1) as f32;
        let pointer = input.mouse_position();

        if let Some(last) = self.last_pointer {
            let delta = pointer - last;
            if input.is_mouse_button_down(MouseButton::LEFT) {
                self.rotate_left(TAU * delta.x / height * self.rotate_speed);
                self.rotate_up(TAU * delta.y / height * self.rotate_speed);
            }
            if input.is_mouse_button_down(MouseButton::MIDDLE) {
                if delta.y > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if delta.y < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            if input.is_mouse_button_down(MouseButton::RIGHT) {
                self.pan(delta.x, delta.y, height, camera);
            }
        }
        self.last_pointer = input.any_mouse_button_down().then_some(pointer);

        let wheel = input.take_wheel_delta();
        if wheel != 0.0 {
            // Positive wheel motion zooms out.
            self.scale *= self.zoom_scale().powf(-wheel);
        }

        let step = self.key_pan_speed;
        for (key, dx, dy) in [
            (KeyCode::Up, 0.0, step),
            (KeyCode::Down, 0.0, -step),
            (KeyCode::Left, step, 0.0),
            (KeyCode::Right, -step, 0.0),
        ] {
            if input.is_key_down(key) {
                self.pan(dx, dy, height, camera);
            }
        }
    }

    /// Applies pending motion to `camera`; returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length().max(POLAR_EPSILON);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.spherical_delta.x * factor;
        phi += self.spherical_delta.y * factor;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * factor;

        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let previous = (camera.position, camera.target);
        camera.position = self.target + offset;
        camera.target = self.target;

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous.0.distance_squared(camera.position) > MOVE_EPSILON
            || previous.1.distance_squared(camera.target) > MOVE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PerspectiveCamera, OrbitControls) {
        let mut camera = PerspectiveCamera::new(45.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.position = Vec3::new(0.0, 40.0, 110.0);
        let mut controls = OrbitControls::new(Vec3::new(0.0, 5.0, 0.0));
        controls.update(&mut camera);
        (camera, controls)
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let (camera, _) = setup();
        let clip = camera.view_proj() * camera.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn update_without_input_does_not_move() {
        let (mut camera, mut controls) = setup();
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn rotation_preserves_distance() {
        let (mut camera, mut controls) = setup();
        let before = camera.position;
        let distance = camera.distance_to_target();
        controls.rotate_left(0.5);
        assert!(controls.update(&mut camera));
        assert!((camera.distance_to_target() - distance).abs() < 1e-3);
        assert!(camera.position.distance(before) > 1.0);
        assert!((camera.position.y - before.y).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (mut camera, mut controls) = setup();
        controls.max_polar_angle = PI / 2.0;
        controls.rotate_up(-10.0);
        controls.update(&mut camera);
        assert!(camera.position.y >= controls.target.y - 1e-3);
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let offset = camera.position - controls.target;
        assert!(offset.x.abs() < 1e-3 && offset.z.abs() < 1e-3);
        assert!(offset.y > 0.0);
    }

    #[test]
    fn dolly_respects_distance_limits() {
        let (mut camera, mut controls) = setup();
        controls.min_distance = 10.0;
        controls.max_distance = 200.0;
        for _ in 0..200 {
            controls.dolly_in(controls.zoom_scale());
            controls.update(&mut camera);
        }
        assert!((camera.distance_to_target() - 10.0).abs() < 1e-3);
        for _ in 0..200 {
            controls.dolly_out(controls.zoom_scale());
            controls.update(&mut camera);
        }
        assert!((camera.distance_to_target() - 200.0).abs() < 1e-2);
    }

    #[test]
    fn pan_moves_camera_and_target_together() {
        let (mut camera, mut controls) = setup();
        let offset = camera.position - controls.target;
        let target = controls.target;
        controls.pan(100.0, 0.0, 720.0, &camera);
        controls.update(&mut camera);
        assert!(controls.target.x < target.x);
        assert!(((camera.position - controls.target) - offset).length() < 1e-3);
        assert_eq!(camera.target, controls.target);
    }

    #[test]
    fn left_drag_rotates_and_wheel_zooms() {
        let (mut camera, mut controls) = setup();
        let input = InputState::new();
        input.set_mouse_position(Vec2::new(100.0, 100.0));
        input.set_mouse_button_down(MouseButton::LEFT);
        controls.apply_input(&input, &camera, (1280, 720));
        input.set_mouse_position(Vec2::new(160.0, 100.0));
        controls.apply_input(&input, &camera, (1280, 720));
        let before = camera.position;
        assert!(controls.update(&mut camera));
        assert!(camera.position.x < before.x);

        input.set_mouse_button_up(MouseButton::LEFT);
        let distance = camera.distance_to_target();
        input.add_wheel_delta(1.0);
        controls.apply_input(&input, &camera, (1280, 720));
        controls.update(&mut camera);
        assert!(camera.distance_to_target() > distance);
    }

    #[test]
    fn drag_angle_depends_on_viewport_fraction_not_pixel_density() {
        let drag = |scale: f32| {
            let (mut camera, mut controls) = setup();
            let input = InputState::new();
            let viewport = (640 * scale as u32, 400 * scale as u32);
            input.set_mouse_position(Vec2::new(50.0, 50.0) * scale);
            input.set_mouse_button_down(MouseButton::LEFT);
            controls.apply_input(&input, &camera, viewport);
            input.set_mouse_position(Vec2::new(150.0, 50.0) * scale);
            controls.apply_input(&input, &camera, viewport);
            controls.update(&mut camera);
            camera.position
        };
        let css = drag(1.0);
        let doubled = drag(2.0);
        assert!(css.distance(doubled) < 1e-3, "{css} vs {doubled}");

        // 100 px across a 400 px tall viewport is a quarter turn of azimuth.
        assert!(css.z.abs() < 1e-2);
        assert!((css.x + 110.0).abs() < 1e-2);
    }

    #[test]
    fn held_arrow_key_pans_every_frame() {
        let (mut camera, mut controls) = setup();
        let input = InputState::new();
        input.set_key_down(KeyCode::Up);
        let start = controls.target;
        controls.apply_input(&input, &camera, (1280, 720));
        controls.update(&mut camera);
        let first = controls.target;
        controls.apply_input(&input, &camera, (1280, 720));
        controls.update(&mut camera);
        assert!(first.y > start.y);
        assert!(controls.target.y > first.y);
    }

    #[test]
    fn damping_spreads_motion_over_frames() {
        let (mut camera, mut controls) = setup();
        controls.enable_damping = true;
        controls.rotate_left(1.0);
        assert!(controls.update(&mut camera));
        let after_first = camera.position;
        assert!(controls.update(&mut camera));
        assert!(camera.position.distance(after_first) > 0.0);
    }
}
