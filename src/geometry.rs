//! CPU-side mesh builders for the scene's flat primitives.
//!
//! Vertices are interleaved as `position.xyz`, `normal.xyz`, `uv.xy`.

use std::f32::consts::TAU;

use anyhow::{anyhow, ensure, Result};
use glam::{Vec2, Vec3};

/// Number of `f32` values per interleaved vertex.
pub const VERTEX_STRIDE: usize = 8;

/// GPU ready mesh buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let start = index * VERTEX_STRIDE;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let start = index * VERTEX_STRIDE + 3;
        Vec3::from_slice(&self.vertices[start..start + 3])
    }

    pub fn uv(&self, index: usize) -> Vec2 {
        let start = index * VERTEX_STRIDE + 6;
        Vec2::from_slice(&self.vertices[start..start + 2])
    }

    /// Sum of the areas of all triangles.
    pub fn surface_area(&self) -> f32 {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                let a = self.position(tri[0] as usize);
                let b = self.position(tri[1] as usize);
                let c = self.position(tri[2] as usize);
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) {
        self.vertices.extend_from_slice(&[
            position.x, position.y, position.z, normal.x, normal.y, normal.z, uv.x, uv.y,
        ]);
    }
}

/// Builds a `width` x `height` plane centred on the origin in the XY plane, facing +Z.
pub fn plane(width: f32, height: f32) -> MeshData {
    let half_w = width * 0.5;
    let half_h = height * 0.5;
    let mut mesh = MeshData::default();
    let corners = [
        (Vec2::new(-half_w, half_h), Vec2::new(0.0, 0.0)),
        (Vec2::new(half_w, half_h), Vec2::new(1.0, 0.0)),
        (Vec2::new(-half_w, -half_h), Vec2::new(0.0, 1.0)),
        (Vec2::new(half_w, -half_h), Vec2::new(1.0, 1.0)),
    ];
    for (corner, uv) in corners {
        mesh.push_vertex(corner.extend(0.0), Vec3::Z, uv);
    }
    mesh.indices = vec![0, 2, 1, 2, 3, 1];
    mesh
}

/// Counter-clockwise rectangle outline centred on the origin.
pub fn rect_path(width: f32, height: f32) -> Vec<Vec2> {
    let half_w = width * 0.5;
    let half_h = height * 0.5;
    vec![
        Vec2::new(-half_w, -half_h),
        Vec2::new(half_w, -half_h),
        Vec2::new(half_w, half_h),
        Vec2::new(-half_w, half_h),
    ]
}

/// Polygonal approximation of a circle with `segments` points.
pub fn circle_path(center: Vec2, radius: f32, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let angle = TAU * i as f32 / segments as f32;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Triangulates a flat outline with holes in the XY plane, facing +Z.
///
/// UVs map the outline's bounding box onto `[0, 1]`.
pub fn shape_with_holes(outer: &[Vec2], holes: &[Vec<Vec2>]) -> Result<MeshData> {
    ensure!(outer.len() >= 3, "shape outline needs at least 3 points");

    let mut points: Vec<Vec2> = outer.to_vec();
    let mut hole_starts = Vec::with_capacity(holes.len());
    for hole in holes {
        ensure!(hole.len() >= 3, "shape hole needs at least 3 points");
        hole_starts.push(points.len());
        points.extend_from_slice(hole);
    }

    let coords: Vec<f64> = points
        .iter()
        .flat_map(|p| [f64::from(p.x), f64::from(p.y)])
        .collect();
    let triangles = earcutr::earcut(&coords, &hole_starts, 2)
        .map_err(|err| anyhow!("failed to triangulate shape: {err:?}"))?;
    ensure!(!triangles.is_empty(), "shape triangulation produced no triangles");

    let min = outer.iter().copied().fold(Vec2::splat(f32::MAX), Vec2::min);
    let max = outer.iter().copied().fold(Vec2::splat(f32::MIN), Vec2::max);
    let extent = (max - min).max(Vec2::splat(f32::EPSILON));

    let mut mesh = MeshData::default();
    for point in &points {
        let uv = (*point - min) / extent;
        mesh.push_vertex(point.extend(0.0), Vec3::Z, Vec2::new(uv.x, 1.0 - uv.y));
    }

    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        if signed_area(points[a], points[b], points[c]) < 0.0 {
            mesh.indices.extend([a as u32, c as u32, b as u32]);
        } else {
            mesh.indices.extend([a as u32, b as u32, c as u32]);
        }
    }
    Ok(mesh)
}

fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon_area(points: &[Vec2]) -> f32 {
        let mut sum = 0.0;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            sum += p.perp_dot(q);
        }
        (sum * 0.5).abs()
    }

    #[test]
    fn plane_has_two_front_facing_triangles() {
        let mesh = plane(10.0, 4.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!((mesh.surface_area() - 40.0).abs() < 1e-4);
        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.position(tri[0] as usize);
            let b = mesh.position(tri[1] as usize);
            let c = mesh.position(tri[2] as usize);
            assert!((b - a).cross(c - a).z > 0.0);
        }
        for i in 0..mesh.vertex_count() {
            assert_eq!(mesh.normal(i), Vec3::Z);
        }
    }

    #[test]
    fn plane_uvs_span_unit_square() {
        let mesh = plane(2.0, 2.0);
        let uvs: Vec<Vec2> = (0..4).map(|i| mesh.uv(i)).collect();
        assert!(uvs.contains(&Vec2::ZERO));
        assert!(uvs.contains(&Vec2::ONE));
    }

    #[test]
    fn hole_is_left_uncovered() {
        let outer = rect_path(16.0, 16.0);
        let hole = circle_path(Vec2::ZERO, 4.0, 32);
        let expected = polygon_area(&outer) - polygon_area(&hole);
        let mesh = shape_with_holes(&outer, &[hole]).unwrap();
        assert_eq!(mesh.vertex_count(), 36);
        assert!((mesh.surface_area() - expected).abs() < 1e-2);
        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.position(tri[0] as usize).truncate();
            let b = mesh.position(tri[1] as usize).truncate();
            let c = mesh.position(tri[2] as usize).truncate();
            assert!(signed_area(a, b, c) >= 0.0);
            let centroid = (a + b + c) / 3.0;
            assert!(centroid.length() > 3.5, "triangle inside hole at {centroid}");
        }
    }

    #[test]
    fn degenerate_outline_is_rejected() {
        let outer = vec![Vec2::ZERO, Vec2::X];
        assert!(shape_with_holes(&outer, &[]).is_err());
    }

    #[test]
    fn circle_path_has_requested_resolution() {
        let circle = circle_path(Vec2::new(1.0, 1.0), 2.0, 12);
        assert_eq!(circle.len(), 12);
        for point in circle {
            assert!(((point - Vec2::ONE).length() - 2.0).abs() < 1e-5);
        }
    }
}
