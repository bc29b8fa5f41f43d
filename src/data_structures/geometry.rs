//! CPU-side geometry and the procedural shapes offered by the activities.
//!
//! Grid based shapes emit `(w + 1) * (h + 1)` vertices for `w x h` segments.
//! Generators think in `v` up; texture coordinates are stored with `v`
//! pointing down (wgpu convention).

use std::{collections::HashSet, f32::consts::PI};

use cgmath::{InnerSpace, Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::data_structures::model::ModelVertex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

fn vertex(position: Vector3<f32>, uv: [f32; 2], normal: Vector3<f32>) -> ModelVertex {
    ModelVertex::new(position.into(), [uv[0], 1.0 - uv[1]], normal.into())
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Every triangle edge exactly once, as a line list.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut lines = Vec::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                if seen.insert((a.min(b), a.max(b))) {
                    lines.push(a);
                    lines.push(b);
                }
            }
        }
        lines
    }

    /// Axis aligned bounds as `(min, max)`; `None` without vertices.
    pub fn bounding_box(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(mut min, mut max), v| {
            for c in 0..3 {
                min[c] = min[c].min(v.position[c]);
                max[c] = max[c].max(v.position[c]);
            }
            (min, max)
        }))
    }

    pub fn translate(&mut self, offset: [f32; 3]) {
        self.vertices.iter_mut().for_each(|v| {
            for c in 0..3 {
                v.position[c] += offset[c];
            }
        });
    }

    /// Moves the geometry so that its bounding box is centred on the origin.
    pub fn center(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            self.translate([
                -(min[0] + max[0]) * 0.5,
                -(min[1] + max[1]) * 0.5,
                -(min[2] + max[2]) * 0.5,
            ]);
        }
    }

    pub fn append(&mut self, mut other: MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.append(&mut other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    fn push_grid_quads(&mut self, base: u32, columns: u32, rows: u32) {
        let stride = columns + 1;
        for iy in 0..rows {
            for ix in 0..columns {
                let a = base + ix + stride * iy;
                let b = base + ix + stride * (iy + 1);
                let c = base + (ix + 1) + stride * (iy + 1);
                let d = base + (ix + 1) + stride * iy;
                self.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
    }
}

/// The shapes selectable in the geometry activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Box,
    Sphere,
    Plane,
    Torus,
    TorusKnot,
    Cone,
    Cylinder,
    Circle,
    Custom,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 9] = [
        GeometryKind::Box,
        GeometryKind::Sphere,
        GeometryKind::Plane,
        GeometryKind::Torus,
        GeometryKind::TorusKnot,
        GeometryKind::Cone,
        GeometryKind::Cylinder,
        GeometryKind::Circle,
        GeometryKind::Custom,
    ];

    pub const NAMES: [&'static str; 9] = [
        "box",
        "sphere",
        "plane",
        "torus",
        "torusKnot",
        "cone",
        "cylinder",
        "circle",
        "custom",
    ];

    pub fn name(&self) -> &'static str {
        Self::NAMES[self.index()]
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Builds the shape with sizes similar to a unit cube.
    ///
    /// `width_segments` and `height_segments` map to the generator specific
    /// subdivisions (radial/tubular, segments, triangle count, ...).
    pub fn build(&self, width_segments: u32, height_segments: u32) -> MeshData {
        let w = width_segments.max(1);
        let h = height_segments.max(1);
        match self {
            GeometryKind::Box => box_geometry(1.0, 1.0, 1.0, w, h, w),
            GeometryKind::Sphere => sphere(0.7, w.max(3), h.max(2)),
            GeometryKind::Plane => plane(1.5, 1.5, w, h),
            GeometryKind::Torus => torus(0.5, 0.2, h.max(3), w.max(3) * 2),
            GeometryKind::TorusKnot => torus_knot(0.5, 0.15, w.max(3) * 4, h.max(3), 2, 3),
            GeometryKind::Cone => cylinder(0.0, 0.6, 1.2, w.max(3), h),
            GeometryKind::Cylinder => cylinder(0.5, 0.5, 1.2, w.max(3), h),
            GeometryKind::Circle => circle(0.7, w.max(3)),
            GeometryKind::Custom => random_triangles(w * h, 0x5eed),
        }
    }
}

pub fn box_geometry(
    width: f32,
    height: f32,
    depth: f32,
    width_segments: u32,
    height_segments: u32,
    depth_segments: u32,
) -> MeshData {
    let mut data = MeshData::default();
    // (u axis, v axis, w axis, u dir, v dir, width, height, depth, grid x, grid y)
    let faces: [(usize, usize, usize, f32, f32, f32, f32, f32, u32, u32); 6] = [
        (2, 1, 0, -1.0, -1.0, depth, height, width, depth_segments, height_segments),
        (2, 1, 0, 1.0, -1.0, depth, height, -width, depth_segments, height_segments),
        (0, 2, 1, 1.0, 1.0, width, depth, height, width_segments, depth_segments),
        (0, 2, 1, 1.0, -1.0, width, depth, -height, width_segments, depth_segments),
        (0, 1, 2, 1.0, -1.0, width, height, depth, width_segments, height_segments),
        (0, 1, 2, -1.0, -1.0, width, height, -depth, width_segments, height_segments),
    ];
    for (u, v, w, udir, vdir, fw, fh, fd, gx, gy) in faces {
        let base = data.vertices.len() as u32;
        let seg_w = fw / gx as f32;
        let seg_h = fh / gy as f32;
        for iy in 0..=gy {
            let y = iy as f32 * seg_h - fh / 2.0;
            for ix in 0..=gx {
                let x = ix as f32 * seg_w - fw / 2.0;
                let mut p = [0.0f32; 3];
                p[u] = x * udir;
                p[v] = y * vdir;
                p[w] = fd / 2.0;
                let mut n = [0.0f32; 3];
                n[w] = if fd > 0.0 { 1.0 } else { -1.0 };
                data.vertices.push(vertex(
                    p.into(),
                    [ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32],
                    n.into(),
                ));
            }
        }
        data.push_grid_quads(base, gx, gy);
    }
    data
}

pub fn plane(width: f32, height: f32, grid_x: u32, grid_y: u32) -> MeshData {
    let mut data = MeshData::default();
    let seg_w = width / grid_x as f32;
    let seg_h = height / grid_y as f32;
    for iy in 0..=grid_y {
        let y = iy as f32 * seg_h - height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * seg_w - width / 2.0;
            data.vertices.push(vertex(
                Vector3::new(x, -y, 0.0),
                [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
                Vector3::unit_z(),
            ));
        }
    }
    data.push_grid_quads(0, grid_x, grid_y);
    data
}

pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let mut data = MeshData::default();
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * PI * 2.0;
            let theta = v * PI;
            let p = Vector3::new(
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            );
            let n = if p.magnitude2() > 0.0 { p.normalize() } else { Vector3::unit_y() };
            data.vertices.push(vertex(p, [u, 1.0 - v], n));
        }
    }
    let stride = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    data
}

pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshData {
    let mut data = MeshData::default();
    for j in 0..=radial_segments {
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * PI * 2.0;
            let v = j as f32 / radial_segments as f32 * PI * 2.0;
            let p = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            data.vertices.push(vertex(
                p,
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
                (p - center).normalize(),
            ));
        }
    }
    let stride = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    data
}

pub fn torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
    p: u32,
    q: u32,
) -> MeshData {
    let curve = |u: f32| {
        let qu_over_p = q as f32 / p as f32 * u;
        let cs = qu_over_p.cos();
        Vector3::new(
            radius * (2.0 + cs) * 0.5 * u.cos(),
            radius * (2.0 + cs) * 0.5 * u.sin(),
            radius * qu_over_p.sin() * 0.5,
        )
    };
    let mut data = MeshData::default();
    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * p as f32 * PI * 2.0;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);
        let t = p2 - p1;
        let n = p2 + p1;
        let b = t.cross(n).normalize();
        let n = b.cross(t).normalize();
        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * PI * 2.0;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let pos = p1 + n * cx + b * cy;
            data.vertices.push(vertex(
                pos,
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
                (pos - p1).normalize(),
            ));
        }
    }
    let stride = radial_segments + 1;
    for j in 1..=tubular_segments {
        for i in 1..=radial_segments {
            let a = stride * (j - 1) + (i - 1);
            let b = stride * j + (i - 1);
            let c = stride * j + i;
            let d = stride * (j - 1) + i;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    data
}

/// Cylinder with open top when `radius_top` is zero (a cone).
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
) -> MeshData {
    let mut data = MeshData::default();
    let half = height / 2.0;
    let slope = (radius_bottom - radius_top) / height;
    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let r = v * (radius_bottom - radius_top) + radius_top;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * PI * 2.0;
            let (sin, cos) = theta.sin_cos();
            data.vertices.push(vertex(
                Vector3::new(r * sin, -v * height + half, r * cos),
                [u, 1.0 - v],
                Vector3::new(sin, slope, cos).normalize(),
            ));
        }
    }
    let stride = radial_segments + 1;
    for x in 0..radial_segments {
        for y in 0..height_segments {
            let a = y * stride + x;
            let b = (y + 1) * stride + x;
            let c = (y + 1) * stride + x + 1;
            let d = y * stride + x + 1;
            if radius_top > 0.0 || y != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if radius_bottom > 0.0 || y != height_segments - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    for (top, r) in [(true, radius_top), (false, radius_bottom)] {
        if r <= 0.0 {
            continue;
        }
        let sign = if top { 1.0 } else { -1.0 };
        let normal = Vector3::new(0.0, sign, 0.0);
        let center_start = data.vertices.len() as u32;
        for _ in 0..radial_segments {
            data.vertices
                .push(vertex(Vector3::new(0.0, half * sign, 0.0), [0.5, 0.5], normal));
        }
        let rim_start = data.vertices.len() as u32;
        for x in 0..=radial_segments {
            let theta = x as f32 / radial_segments as f32 * PI * 2.0;
            let (sin, cos) = theta.sin_cos();
            data.vertices.push(vertex(
                Vector3::new(r * sin, half * sign, r * cos),
                [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
                normal,
            ));
        }
        for x in 0..radial_segments {
            let c = center_start + x;
            let i = rim_start + x;
            if top {
                data.indices.extend_from_slice(&[i, i + 1, c]);
            } else {
                data.indices.extend_from_slice(&[i + 1, i, c]);
            }
        }
    }
    data
}

pub fn circle(radius: f32, segments: u32) -> MeshData {
    let mut data = MeshData::default();
    data.vertices
        .push(vertex(Vector3::new(0.0, 0.0, 0.0), [0.5, 0.5], Vector3::unit_z()));
    for s in 0..=segments {
        let theta = s as f32 / segments as f32 * PI * 2.0;
        let (x, y) = (radius * theta.cos(), radius * theta.sin());
        data.vertices.push(vertex(
            Vector3::new(x, y, 0.0),
            [(x / radius + 1.0) / 2.0, (y / radius + 1.0) / 2.0],
            Vector3::unit_z(),
        ));
    }
    for i in 1..=segments {
        data.indices.extend_from_slice(&[i, i + 1, 0]);
    }
    data
}

/// `count` unconnected triangles scattered in a 2x2x2 cube, flat shaded.
pub fn random_triangles(count: u32, seed: u64) -> MeshData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = MeshData::default();
    for t in 0..count {
        let corners: Vec<Vector3<f32>> = (0..3)
            .map(|_| {
                Vector3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                )
            })
            .collect();
        let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
        let normal = if normal.magnitude2() > 0.0 { normal.normalize() } else { Vector3::unit_z() };
        for (i, c) in corners.into_iter().enumerate() {
            let uv = [[0.0, 0.0], [1.0, 0.0], [0.5, 1.0]][i];
            data.vertices.push(vertex(c, uv, normal));
        }
        data.indices.extend_from_slice(&[t * 3, t * 3 + 1, t * 3 + 2]);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(data: &MeshData) {
        assert_eq!(data.indices.len() % 3, 0);
        assert!(!data.indices.is_empty());
        let n = data.vertices.len() as u32;
        assert!(data.indices.iter().all(|&i| i < n), "index out of range");
        for v in &data.vertices {
            let len = Vector3::from(v.normal).magnitude();
            assert!((len - 1.0).abs() < 1e-3, "normal not unit length: {len}");
            assert!(v.tex_coords.iter().all(|c| (-1e-5..=1.0 + 1e-5).contains(c)));
        }
    }

    #[test]
    fn every_kind_should_build_valid_geometry() {
        for kind in GeometryKind::ALL {
            let data = kind.build(4, 3);
            assert_well_formed(&data);
            assert_eq!(GeometryKind::from_index(kind.index()), kind);
        }
    }

    #[test]
    fn should_match_three_js_vertex_counts() {
        assert_eq!(sphere(1.0, 32, 16).vertices.len(), 33 * 17);
        assert_eq!(sphere(1.0, 32, 16).triangle_count(), 32 * 16 * 2 - 2 * 32);
        assert_eq!(plane(1.0, 1.0, 3, 2).vertices.len(), 4 * 3);
        assert_eq!(plane(1.0, 1.0, 3, 2).triangle_count(), 12);
        assert_eq!(box_geometry(1.0, 1.0, 1.0, 1, 1, 1).vertices.len(), 24);
        assert_eq!(box_geometry(1.0, 1.0, 1.0, 2, 2, 2).triangle_count(), 6 * 8);
        assert_eq!(torus(1.0, 0.4, 12, 48).vertices.len(), 13 * 49);
        assert_eq!(circle(1.0, 8).triangle_count(), 8);
        assert_eq!(cylinder(1.0, 1.0, 1.0, 8, 1).triangle_count(), 16 + 8 + 8);
        assert_eq!(cylinder(0.0, 1.0, 1.0, 8, 1).triangle_count(), 8 + 8);
    }

    #[test]
    fn box_should_span_its_size() {
        let data = box_geometry(2.0, 1.0, 0.5, 1, 1, 1);
        let (min, max) = data.bounding_box().unwrap();
        assert_eq!(min, [-1.0, -0.5, -0.25]);
        assert_eq!(max, [1.0, 0.5, 0.25]);
    }

    #[test]
    fn box_faces_should_wind_counter_clockwise_outwards() {
        let data = box_geometry(1.0, 1.0, 1.0, 1, 1, 1);
        for tri in data.indices.chunks_exact(3) {
            let p = |i: u32| Vector3::from(data.vertices[i as usize].position);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            let normal = Vector3::from(data.vertices[tri[0] as usize].normal);
            assert!(face.dot(normal) > 0.0);
        }
    }

    #[test]
    fn wireframe_should_list_each_edge_once() {
        let quad = plane(1.0, 1.0, 1, 1);
        // two triangles share the diagonal
        assert_eq!(quad.wireframe_indices().len(), 5 * 2);
    }

    #[test]
    fn center_should_move_bounds_around_origin() {
        let mut data = plane(2.0, 2.0, 1, 1);
        data.translate([3.0, -1.0, 2.0]);
        data.center();
        let (min, max) = data.bounding_box().unwrap();
        assert_eq!(min, [-1.0, -1.0, 0.0]);
        assert_eq!(max, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn append_should_offset_indices() {
        let mut a = circle(1.0, 3);
        let b = circle(1.0, 3);
        let base = a.vertices.len() as u32;
        a.append(b);
        assert_eq!(a.triangle_count(), 6);
        assert!(a.indices[9..].iter().all(|&i| i >= base));
    }

    #[test]
    fn random_triangles_should_be_deterministic_per_seed() {
        assert_eq!(random_triangles(10, 7), random_triangles(10, 7));
        assert_eq!(random_triangles(10, 7).triangle_count(), 10);
    }
}
