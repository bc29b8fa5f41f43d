//! Extrudes typeface shapes into solid, optionally bevelled, 3D text.

use cgmath::{InnerSpace, Vector2, Vector3};

use crate::data_structures::geometry::MeshData;
use crate::data_structures::model::ModelVertex;
use crate::data_structures::triangulate::{flatten, triangulate};
use crate::resources::font::{Shape, Typeface};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextParams {
    pub size: f32,
    pub depth: f32,
    pub curve_segments: u32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_offset: f32,
    pub bevel_segments: u32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            size: 0.5,
            depth: 0.2,
            curve_segments: 5,
            bevel_enabled: true,
            bevel_thickness: 0.03,
            bevel_size: 0.02,
            bevel_offset: 0.0,
            bevel_segments: 4,
        }
    }
}

impl TextParams {
    /// `(z, outward offset)` of every extrusion layer, back to front.
    fn layers(&self) -> Vec<(f32, f32)> {
        let quarter = std::f32::consts::FRAC_PI_2;
        let mut layers = Vec::new();
        if !self.bevel_enabled || self.bevel_segments == 0 {
            layers.push((0.0, 0.0));
            layers.push((self.depth, 0.0));
            return layers;
        }
        let bevel = |b: u32| {
            let t = b as f32 / self.bevel_segments as f32;
            (
                self.bevel_thickness * (t * quarter).cos(),
                self.bevel_size * (t * quarter).sin() + self.bevel_offset,
            )
        };
        let full = self.bevel_size + self.bevel_offset;
        for b in 0..self.bevel_segments {
            let (z, offset) = bevel(b);
            layers.push((-z, offset));
        }
        layers.push((0.0, full));
        layers.push((self.depth, full));
        for b in (0..self.bevel_segments).rev() {
            let (z, offset) = bevel(b);
            layers.push((self.depth + z, offset));
        }
        layers
    }
}

/// Builds the solid for `text`. The result starts at the pen origin; call
/// [`MeshData::center`] to centre it.
pub fn text_geometry(typeface: &Typeface, text: &str, params: &TextParams) -> MeshData {
    let shapes = typeface.generate_shapes(text, params.size, params.curve_segments.max(1));
    let layers = params.layers();
    let mut data = MeshData::default();
    for shape in shapes.iter().filter(|s| s.outer.len() >= 3) {
        data.append(extrude_shape(shape, &layers));
    }
    data
}

/// Unit-offset miter vectors pushing every point away from the solid.
///
/// Contours must keep the solid on their left (CCW outer, CW holes).
fn miter_vectors(contour: &[Vector2<f32>]) -> Vec<Vector2<f32>> {
    let n = contour.len();
    let right = |d: Vector2<f32>| {
        let len = d.magnitude();
        if len > 0.0 { Vector2::new(d.y, -d.x) / len } else { Vector2::new(0.0, 0.0) }
    };
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let p = contour[i];
            let next = contour[(i + 1) % n];
            let n1 = right(p - prev);
            let n2 = right(next - p);
            let denom = 1.0 + n1.dot(n2);
            let miter = if denom > 1e-3 { (n1 + n2) / denom } else { n1 };
            // very sharp spikes would shoot far out
            if miter.magnitude() > 4.0 { miter.normalize() * 4.0 } else { miter }
        })
        .collect()
}

fn extrude_shape(shape: &Shape, layers: &[(f32, f32)]) -> MeshData {
    let mut data = MeshData::default();
    let points = flatten(&shape.outer, &shape.holes);
    let mut miters = miter_vectors(&shape.outer);
    shape.holes.iter().for_each(|h| miters.extend(miter_vectors(h)));

    let at = |layer: usize, i: usize| {
        let (z, offset) = layers[layer];
        let p = points[i] + miters[i] * offset;
        Vector3::new(p.x, p.y, z)
    };
    let push = |data: &mut MeshData, p: Vector3<f32>, uv: [f32; 2], n: Vector3<f32>| {
        data.vertices
            .push(ModelVertex::new(p.into(), [uv[0], 1.0 - uv[1]], n.into()));
    };

    // caps
    let triangles = triangulate(&shape.outer, &shape.holes);
    let last = layers.len() - 1;
    for (layer, normal, flip) in [(0, -Vector3::unit_z(), true), (last, Vector3::unit_z(), false)] {
        let base = data.vertices.len() as u32;
        for i in 0..points.len() {
            let p = at(layer, i);
            push(&mut data, p, [p.x, p.y], normal);
        }
        for t in &triangles {
            if flip {
                data.indices.extend_from_slice(&[base + t[0], base + t[2], base + t[1]]);
            } else {
                data.indices.extend_from_slice(&[base + t[0], base + t[1], base + t[2]]);
            }
        }
    }

    // walls, one flat quad per contour edge and layer pair
    let mut ranges = vec![0..shape.outer.len()];
    let mut start = shape.outer.len();
    for hole in &shape.holes {
        ranges.push(start..start + hole.len());
        start += hole.len();
    }
    for range in ranges {
        let len = range.len();
        for k in 0..len {
            let i = range.start + k;
            let j = range.start + (k + 1) % len;
            for l in 0..last {
                let (a, b, c, d) = (at(l, i), at(l, j), at(l + 1, j), at(l + 1, i));
                let normal = (c - a).cross(d - b);
                if normal.magnitude2() <= f32::EPSILON * f32::EPSILON {
                    continue;
                }
                let normal = normal.normalize();
                let along_x = (a.y - b.y).abs() < (a.x - b.x).abs();
                let uv = |p: Vector3<f32>| if along_x { [p.x, 1.0 - p.z] } else { [p.y, 1.0 - p.z] };
                let base = data.vertices.len() as u32;
                for p in [a, b, c, d] {
                    push(&mut data, p, uv(p), normal);
                }
                data.indices
                    .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::font::tests::box_font;

    fn flat(depth: f32) -> TextParams {
        TextParams {
            size: 1.0,
            depth,
            bevel_enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn should_extrude_caps_and_walls() {
        let data = text_geometry(&box_font(), "i", &flat(0.5));
        // 2 + 2 cap triangles, 4 walls of 2 triangles
        assert_eq!(data.triangle_count(), 12);
        let (min, max) = data.bounding_box().unwrap();
        assert!((min[2] - 0.0).abs() < 1e-6 && (max[2] - 0.5).abs() < 1e-6);
        assert!((max[0] - 0.2).abs() < 1e-6 && (max[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn should_extrude_hole_walls() {
        let font = box_font();
        let data = text_geometry(&font, "o", &flat(0.1));
        let shape = &font.generate_shapes("o", 1.0, 4)[0];
        let caps = 2 * triangulate(&shape.outer, &shape.holes).len();
        assert_eq!(data.triangle_count(), caps + 8 * 2);
    }

    #[test]
    fn walls_should_face_outwards() {
        let data = text_geometry(&box_font(), "i", &flat(0.5));
        let center = Vector3::new(0.1, 0.5, 0.25);
        for tri in data.indices.chunks_exact(3) {
            let v = &data.vertices[tri[0] as usize];
            let p = Vector3::from(v.position);
            assert!((p - center).dot(Vector3::from(v.normal)) > 0.0);
        }
    }

    #[test]
    fn bevel_should_grow_outline_and_add_layers() {
        let params = TextParams {
            size: 1.0,
            depth: 0.5,
            bevel_enabled: true,
            bevel_thickness: 0.1,
            bevel_size: 0.05,
            bevel_offset: 0.0,
            bevel_segments: 3,
            ..Default::default()
        };
        assert_eq!(params.layers().len(), 3 + 2 + 3);
        let data = text_geometry(&box_font(), "i", &params);
        assert_eq!(data.triangle_count(), 4 + 4 * 7 * 2);
        let (min, max) = data.bounding_box().unwrap();
        assert!((min[0] + 0.05).abs() < 1e-5);
        assert!((max[0] - 0.25).abs() < 1e-5);
        assert!((min[2] + 0.1).abs() < 1e-5);
        assert!((max[2] - 0.6).abs() < 1e-5);
    }

    #[test]
    fn centred_text_should_straddle_the_origin() {
        let mut data = text_geometry(&box_font(), "oi", &TextParams::default());
        data.center();
        let (min, max) = data.bounding_box().unwrap();
        for c in 0..3 {
            assert!((min[c] + max[c]).abs() < 1e-4);
        }
    }

    #[test]
    fn blank_text_should_be_empty() {
        assert!(text_geometry(&box_font(), " ", &TextParams::default()).vertices.is_empty());
        assert!(text_geometry(&box_font(), "", &TextParams::default()).bounding_box().is_none());
    }
}
