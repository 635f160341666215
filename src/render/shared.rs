use bytemuck::{Pod, Zeroable};
use glam::Mat3;

use crate::scene::{Material, SceneObject};

use super::common::{CameraParams, LightParams};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    /// `xyz` toward the light, `w` ambient term.
    light_direction: [f32; 4],
    /// `rgb` colour, `w` intensity.
    light_color: [f32; 4],
}

impl GlobalUniform {
    pub(crate) fn new(camera: &CameraParams, light: &LightParams) -> Self {
        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            light_direction: light
                .direction
                .normalize_or_zero()
                .extend(light.ambient)
                .into(),
            light_color: light.color.extend(light.intensity).into(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
    /// `x` lit flag, `y` textured flag, `zw` UV repeat.
    params: [f32; 4],
}

impl ObjectConstants {
    pub(crate) fn new(object: &SceneObject) -> Self {
        let model = object.model_matrix();
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let params = match object.material {
            Material::Textured { repeat } => [1.0, 1.0, repeat.x, repeat.y],
            Material::Emissive { .. } => [0.0, 0.0, 1.0, 1.0],
            Material::Lambert { .. } => [1.0, 0.0, 1.0, 1.0],
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: object.material.color().extend(1.0).into(),
            params,
        }
    }

    pub(crate) fn is_textured(&self) -> bool {
        self.params[1] > 0.5
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    light_direction: vec4<f32>,
    light_color: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

@group(2) @binding(0)
var base_texture: texture_2d<f32>;
@group(2) @binding(1)
var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;

    let world_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;

    out.normal = normalize(world_normal);
    out.uv = input.uv * object.params.zw;
    return out;
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    let texel = textureSample(base_texture, base_sampler, input.uv);
    let base = object.color.rgb * texel.rgb;
    if (object.params.x < 0.5) {
        return vec4<f32>(base, object.color.a);
    }

    var normal = normalize(input.normal);
    if (!front_facing) {
        normal = -normal;
    }
    let light_dir = normalize(globals.light_direction.xyz);
    let diffuse = max(dot(normal, light_dir), 0.0);
    let ambient = globals.light_direction.w;
    let intensity = globals.light_color.w;
    let lit_color = (ambient + diffuse * intensity) * base * globals.light_color.rgb;
    return vec4<f32>(lit_color, object.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::geometry;

    fn object(material: Material) -> SceneObject {
        SceneObject::new("test", geometry::plane(1.0, 1.0), material)
    }

    #[test]
    fn uniform_layouts_match_wgsl() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 112);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 144);
    }

    #[test]
    fn emissive_objects_are_unlit() {
        let constants = ObjectConstants::new(&object(Material::Emissive { color: Vec3::X }));
        assert_eq!(constants.params[0], 0.0);
        assert!(!constants.is_textured());
        assert_eq!(constants.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn textured_objects_carry_their_repeat() {
        let constants = ObjectConstants::new(&object(Material::Textured {
            repeat: Vec2::new(50.0, 25.0),
        }));
        assert_eq!(constants.params[0], 1.0);
        assert!(constants.is_textured());
        assert_eq!(&constants.params[2..], &[50.0, 25.0]);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let constants = ObjectConstants::new(
            &object(Material::Lambert { color: Vec3::ONE }).with_position(Vec3::new(4.0, 5.0, 6.0)),
        );
        assert_eq!(constants.model[3], [4.0, 5.0, 6.0, 1.0]);
        assert_eq!(constants.normal[0], [1.0, 0.0, 0.0, 0.0]);
    }
}
