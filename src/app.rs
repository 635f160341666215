use anyhow::{anyhow, Result};
use glam::Vec3;
use log::debug;

use crate::bounce::{Axis, Oscillator};
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::config::ViewerConfig;
use crate::input::InputState;
use crate::render::{CameraParams, LightParams};
use crate::scene::Scene;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

/// Platform-independent state of the mounted view.
///
/// The host (browser or native window) owns one `Viewer`, calls
/// [`Viewer::advance`] once per frame and then draws [`Viewer::scene`].
pub struct Viewer {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    oscillator: Oscillator,
    bounce_object: String,
    bounce_axis: Axis,
    viewport: (u32, u32),
    frames: u64,
}

impl Viewer {
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Result<Self> {
        config.validate()?;
        let mut scene = Scene::build(config)?;

        let bounce = &config.bounce;
        let object = scene
            .get_mut(&bounce.object)
            .ok_or_else(|| anyhow!("bounce object '{}' is not in the scene", bounce.object))?;
        let start = bounce.axis.component(object.position);
        let oscillator = Oscillator::new(start, bounce.speed, bounce.min, bounce.max);
        object.position = bounce.axis.apply(object.position, oscillator.position());

        let mut camera = PerspectiveCamera::new(config.fov, 1.0, NEAR_PLANE, FAR_PLANE);
        camera.position = config.camera_position;
        camera.target = config.camera_target;
        camera.set_aspect(width, height);

        let mut controls = OrbitControls::new(config.camera_target);
        controls.enable_damping = config.damping;
        controls.update(&mut camera);

        Ok(Self {
            scene,
            camera,
            controls,
            oscillator,
            bounce_object: bounce.object.clone(),
            bounce_axis: bounce.axis,
            viewport: (width.max(1), height.max(1)),
            frames: 0,
        })
    }

    /// Runs one frame of simulation: the bounce step, then the orbit controls.
    pub fn advance(&mut self, input: &InputState) {
        let value = self.oscillator.step();
        if let Some(object) = self.scene.get_mut(&self.bounce_object) {
            object.position = self.bounce_axis.apply(object.position, value);
        }

        self.controls
            .apply_input(input, &self.camera, self.viewport);
        if self.controls.update(&mut self.camera) {
            debug!("camera moved to {:?}", self.camera.position);
        }
        self.frames += 1;
    }

    /// Records a new drawing-buffer size and updates the camera aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.camera.set_aspect(width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Current position of the animated object along its axis.
    pub fn bounce_position(&self) -> f32 {
        self.oscillator.position()
    }

    pub fn camera_params(&self) -> CameraParams {
        CameraParams {
            view_proj: self.camera.view_proj(),
            position: self.camera.position,
        }
    }

    pub fn light_params(&self) -> LightParams {
        let light = &self.scene.light;
        LightParams {
            direction: light.direction,
            color: light.color,
            intensity: light.intensity,
            ambient: self.scene.ambient,
        }
    }
}

/// Returns the size the drawing buffer should take, or `None` when it
/// already matches the displayed size (or the display has no area yet).
pub fn display_size_changed(current: (u32, u32), display: (u32, u32)) -> Option<(u32, u32)> {
    if display.0 == 0 || display.1 == 0 || current == display {
        None
    } else {
        Some(display)
    }
}

pub fn print_scene_summary(scene: &Scene) {
    println!("Built scene with {} objects", scene.objects.len());
    for object in &scene.objects {
        println!(" - {} ({})", object.name, object.material.label());
    }
}

pub fn print_final_state(scene: &Scene) {
    println!("Final object states:");
    for object in &scene.objects {
        let Vec3 { x, y, z } = object.position;
        println!(" - {} pos=({x:.2}, {y:.2}, {z:.2})", object.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use glam::Vec2;

    fn viewer() -> Viewer {
        Viewer::new(&ViewerConfig::default(), 800, 600).unwrap()
    }

    #[test]
    fn square_follows_the_oscillator() {
        let mut viewer = viewer();
        let input = InputState::new();
        for _ in 0..120 {
            viewer.advance(&input);
        }
        let square = viewer.scene().get("square").unwrap();
        assert_eq!(square.position, Vec3::new(40.0, 10.0, 0.0));
        assert_eq!(viewer.bounce_position(), 40.0);
        assert_eq!(viewer.frames(), 120);
    }

    #[test]
    fn bounce_stays_in_bounds_over_many_frames() {
        let mut viewer = viewer();
        let input = InputState::new();
        for _ in 0..1000 {
            viewer.advance(&input);
            let x = viewer.scene().get("square").unwrap().position.x;
            assert!((-50.0..=50.0).contains(&x));
        }
    }

    #[test]
    fn other_objects_do_not_move() {
        let mut viewer = viewer();
        let input = InputState::new();
        viewer.advance(&input);
        assert_eq!(
            viewer.scene().get("cutout").unwrap().position,
            Vec3::new(0.0, 12.0, -25.0)
        );
        assert_eq!(viewer.scene().get("ground").unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn configured_axis_and_object_are_used() {
        let mut config = ViewerConfig::default();
        config.bounce.object = "cutout".into();
        config.bounce.axis = Axis::Y;
        config.bounce.speed = 2.0;
        let mut viewer = Viewer::new(&config, 640, 480).unwrap();
        viewer.advance(&InputState::new());
        assert_eq!(
            viewer.scene().get("cutout").unwrap().position,
            Vec3::new(0.0, 14.0, -25.0)
        );
        assert_eq!(
            viewer.scene().get("square").unwrap().position,
            Vec3::new(0.0, 10.0, 0.0)
        );
    }

    #[test]
    fn start_outside_bounds_is_clamped_before_the_first_frame() {
        let mut config = ViewerConfig::default();
        config.bounce.object = "cutout".into();
        config.bounce.axis = Axis::Y;
        config.bounce.min = 20.0;
        config.bounce.max = 30.0;
        let viewer = Viewer::new(&config, 640, 480).unwrap();
        assert_eq!(viewer.bounce_position(), 20.0);
        assert_eq!(
            viewer.scene().get("cutout").unwrap().position,
            Vec3::new(0.0, 20.0, -25.0)
        );
    }

    #[test]
    fn unknown_bounce_object_is_rejected() {
        let mut config = ViewerConfig::default();
        config.bounce.object = "missing".into();
        assert!(Viewer::new(&config, 640, 480).is_err());
    }

    #[test]
    fn camera_starts_at_configured_position() {
        let viewer = viewer();
        assert!((viewer.camera().position - Vec3::new(0.0, 40.0, 110.0)).length() < 1e-3);
        assert_eq!(viewer.camera().target, Vec3::new(0.0, 5.0, 0.0));
        assert!((viewer.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn dragging_rotates_without_changing_distance() {
        let mut viewer = viewer();
        let input = InputState::new();
        let before = viewer.camera().distance_to_target();
        let start = viewer.camera().position;

        input.set_mouse_position(Vec2::new(100.0, 100.0));
        input.set_mouse_button_down(MouseButton::LEFT);
        viewer.advance(&input);
        input.set_mouse_position(Vec2::new(160.0, 100.0));
        viewer.advance(&input);

        assert!((viewer.camera().distance_to_target() - before).abs() < 1e-3);
        assert!(viewer.camera().position.distance(start) > 1.0);
    }

    #[test]
    fn viewport_updates_aspect_and_ignores_zero() {
        let mut viewer = viewer();
        viewer.set_viewport(1000, 500);
        assert_eq!(viewer.viewport(), (1000, 500));
        assert!((viewer.camera().aspect - 2.0).abs() < 1e-6);
        viewer.set_viewport(0, 500);
        assert_eq!(viewer.viewport(), (1000, 500));
    }

    #[test]
    fn resize_only_when_display_differs() {
        assert_eq!(display_size_changed((300, 150), (300, 150)), None);
        assert_eq!(
            display_size_changed((300, 150), (1280, 720)),
            Some((1280, 720))
        );
        assert_eq!(display_size_changed((300, 150), (0, 720)), None);
        assert_eq!(display_size_changed((300, 150), (1280, 0)), None);
    }

    #[test]
    fn light_params_carry_ambient() {
        let light = viewer().light_params();
        assert_eq!(light.ambient, 0.3);
        assert_eq!(light.intensity, 1.0);
        assert!((light.direction.length() - 1.0).abs() < 1e-5);
    }
}
