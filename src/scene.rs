use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3};

use crate::config::ViewerConfig;
use crate::geometry::{self, MeshData};

/// Surface description understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lit with the ground texture, tiled `repeat` times across the mesh.
    Textured { repeat: Vec2 },
    /// Unlit flat colour.
    Emissive { color: Vec3 },
    /// Diffuse lit flat colour.
    Lambert { color: Vec3 },
}

impl Material {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Textured { .. } => "textured",
            Self::Emissive { .. } => "emissive",
            Self::Lambert { .. } => "lambert",
        }
    }

    pub fn color(&self) -> Vec3 {
        match self {
            Self::Textured { .. } => Vec3::ONE,
            Self::Emissive { color } | Self::Lambert { color } => *color,
        }
    }
}

/// Named node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshData,
    pub material: Material,
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, mesh: MeshData, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        let rotation = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        let scale = Mat4::from_scale(self.scale);
        translation * rotation * scale
    }
}

/// Directional light; `direction` points from the scene toward the light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, 2.0, 4.0).normalize(),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

/// Runtime representation of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub light: Light,
    pub ambient: f32,
    pub background: Vec3,
}

impl Scene {
    /// Assembles the ground plane, the emissive square and the cut-out shape.
    pub fn build(config: &ViewerConfig) -> Result<Self> {
        let size = config.ground_size;
        let ground = SceneObject::new(
            "ground",
            geometry::plane(size, size),
            Material::Textured {
                repeat: Vec2::splat(size / 2.0),
            },
        )
        .with_rotation(Vec3::new(-90.0, 0.0, 0.0));

        let square = SceneObject::new(
            "square",
            geometry::plane(10.0, 10.0),
            Material::Emissive {
                color: Vec3::new(1.0, 0.53, 0.0),
            },
        )
        .with_position(Vec3::new(0.0, 10.0, 0.0));

        let outline = geometry::rect_path(16.0, 16.0);
        let hole = geometry::circle_path(Vec2::ZERO, 4.0, 32);
        let cutout_mesh =
            geometry::shape_with_holes(&outline, &[hole]).context("failed to build cutout")?;
        let cutout = SceneObject::new(
            "cutout",
            cutout_mesh,
            Material::Lambert {
                color: Vec3::new(0.53, 0.67, 0.8),
            },
        )
        .with_position(Vec3::new(0.0, 12.0, -25.0));

        Ok(Self {
            objects: vec![ground, square, cutout],
            light: Light::default(),
            ambient: 0.3,
            background: config.background,
        })
    }

    pub fn get(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_three_objects() {
        let scene = Scene::build(&ViewerConfig::default()).unwrap();
        let names: Vec<&str> = scene.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["ground", "square", "cutout"]);
        assert_eq!(scene.get("square").unwrap().material.label(), "emissive");
        assert_eq!(scene.get("cutout").unwrap().material.label(), "lambert");
        match scene.get("ground").unwrap().material {
            Material::Textured { repeat } => assert_eq!(repeat, Vec2::splat(50.0)),
            other => panic!("unexpected ground material {other:?}"),
        }
    }

    #[test]
    fn ground_lies_flat_facing_up() {
        let scene = Scene::build(&ViewerConfig::default()).unwrap();
        let ground = scene.get("ground").unwrap();
        let normal = ground.model_matrix().transform_vector3(Vec3::Z);
        assert!((normal - Vec3::Y).length() < 1e-5);
        let corner = ground.model_matrix().transform_point3(Vec3::new(50.0, 50.0, 0.0));
        assert!(corner.y.abs() < 1e-4);
    }
}
