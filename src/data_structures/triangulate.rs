//! Ear-clipping triangulation of simple polygons with holes.
//!
//! Holes are merged into the outer ring through a bridge to a mutually visible
//! vertex, turning the shape into one (weakly simple) ring which is then
//! clipped ear by ear. Triangles index the flat point list
//! `outer ++ holes[0] ++ holes[1] ...` so the result can be reused for every
//! layer of an extrusion.

use cgmath::Vector2;

const EPS: f32 = 1e-9;

fn cross(a: Vector2<f32>, b: Vector2<f32>, c: Vector2<f32>) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn same(a: Vector2<f32>, b: Vector2<f32>) -> bool {
    (a.x - b.x).abs() <= 1e-7 && (a.y - b.y).abs() <= 1e-7
}

/// True if the open segments `p1-p2` and `q1-q2` cross.
fn segments_cross(p1: Vector2<f32>, p2: Vector2<f32>, q1: Vector2<f32>, q2: Vector2<f32>) -> bool {
    if same(p1, q1) || same(p1, q2) || same(p2, q1) || same(p2, q2) {
        return false;
    }
    let d1 = cross(p1, p2, q1);
    let d2 = cross(p1, p2, q2);
    let d3 = cross(q1, q2, p1);
    let d4 = cross(q1, q2, p2);
    ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
}

/// Flattens `outer` and `holes` into one point list (the index space of the result).
pub fn flatten(outer: &[Vector2<f32>], holes: &[Vec<Vector2<f32>>]) -> Vec<Vector2<f32>> {
    let mut points = outer.to_vec();
    holes.iter().for_each(|h| points.extend_from_slice(h));
    points
}

/// Triangulates a counter-clockwise `outer` ring with clockwise `holes`.
///
/// Returns counter-clockwise triangles as indices into [`flatten`]`(outer, holes)`.
pub fn triangulate(outer: &[Vector2<f32>], holes: &[Vec<Vector2<f32>>]) -> Vec<[u32; 3]> {
    if outer.len() < 3 {
        return Vec::new();
    }
    let points = flatten(outer, holes);
    let mut ring: Vec<usize> = (0..outer.len()).collect();

    // hole index ranges in the flat list
    let mut ranges = Vec::with_capacity(holes.len());
    let mut start = outer.len();
    for hole in holes {
        ranges.push(start..start + hole.len());
        start += hole.len();
    }
    ranges.retain(|r| r.len() >= 3);
    // merge the right-most holes first
    ranges.sort_by(|a, b| {
        let max_x = |r: &std::ops::Range<usize>| {
            r.clone().map(|i| points[i].x).fold(f32::MIN, f32::max)
        };
        max_x(b).total_cmp(&max_x(a))
    });

    for (n, range) in ranges.iter().enumerate() {
        let pending = &ranges[n + 1..];
        bridge_hole(&points, &mut ring, range.clone(), pending);
    }

    clip_ears(&points, ring)
}

fn locally_inside(points: &[Vector2<f32>], ring: &[usize], k: usize, m: Vector2<f32>) -> bool {
    let n = ring.len();
    let a = points[ring[(k + n - 1) % n]];
    let p = points[ring[k]];
    let b = points[ring[(k + 1) % n]];
    if cross(a, p, b) > 0.0 {
        cross(p, b, m) >= 0.0 && cross(a, p, m) >= 0.0
    } else {
        cross(p, b, m) >= 0.0 || cross(a, p, m) >= 0.0
    }
}

fn bridge_hole(
    points: &[Vector2<f32>],
    ring: &mut Vec<usize>,
    hole: std::ops::Range<usize>,
    pending: &[std::ops::Range<usize>],
) {
    let m_idx = hole
        .clone()
        .max_by(|a, b| points[*a].x.total_cmp(&points[*b].x))
        .unwrap_or(hole.start);
    let m = points[m_idx];

    let mut candidates: Vec<usize> = (0..ring.len()).collect();
    let dist = |k: usize| {
        let p = points[ring[k]];
        (p.x - m.x).powi(2) + (p.y - m.y).powi(2)
    };
    candidates.sort_by(|a, b| dist(*a).total_cmp(&dist(*b)));

    let visible = |k: usize| {
        let p = points[ring[k]];
        if !locally_inside(points, ring, k, m) {
            return false;
        }
        let n = ring.len();
        let ring_edges = (0..n).map(|i| (ring[i], ring[(i + 1) % n]));
        let hole_edges = std::iter::once(&hole)
            .chain(pending.iter())
            .flat_map(|r| {
                let r = r.clone();
                let len = r.len();
                r.clone().map(move |i| (i, r.start + (i - r.start + 1) % len))
            });
        !ring_edges
            .chain(hole_edges)
            .any(|(i, j)| segments_cross(m, p, points[i], points[j]))
    };

    let k = match candidates.iter().copied().find(|k| visible(*k)) {
        Some(k) => k,
        None => {
            log::warn!("No visible bridge for hole at {:?}, using nearest vertex", m);
            candidates[0]
        }
    };

    let len = hole.len();
    let offset = m_idx - hole.start;
    let mut spliced: Vec<usize> = Vec::with_capacity(ring.len() + len + 2);
    spliced.extend_from_slice(&ring[..=k]);
    spliced.extend((0..=len).map(|i| hole.start + (offset + i) % len));
    spliced.push(ring[k]);
    spliced.extend_from_slice(&ring[k + 1..]);
    *ring = spliced;
}

fn blocks_ear(
    p: Vector2<f32>,
    a: Vector2<f32>,
    b: Vector2<f32>,
    c: Vector2<f32>,
) -> bool {
    if same(p, a) || same(p, b) || same(p, c) {
        return false;
    }
    let ab = cross(a, b, p);
    let bc = cross(b, c, p);
    let ca = cross(c, a, p);
    if ab > EPS && bc > EPS && ca > EPS {
        return true;
    }
    // a vertex sitting on the new diagonal c-a also blocks it
    ca.abs() <= EPS
        && ab > EPS
        && bc > EPS
}

fn clip_ears(points: &[Vector2<f32>], mut ring: Vec<usize>) -> Vec<[u32; 3]> {
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
    while ring.len() > 3 {
        let n = ring.len();
        let ear = (0..n).find(|&i| {
            let (ia, ib, ic) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            let (a, b, c) = (points[ia], points[ib], points[ic]);
            if cross(a, b, c) <= EPS {
                return false;
            }
            !ring
                .iter()
                .filter(|&&j| j != ia && j != ib && j != ic)
                .any(|&j| blocks_ear(points[j], a, b, c))
        });
        match ear {
            Some(i) => {
                let n = ring.len();
                triangles.push([
                    ring[(i + n - 1) % n] as u32,
                    ring[i] as u32,
                    ring[(i + 1) % n] as u32,
                ]);
                ring.remove(i);
            }
            None => {
                // collinear vertices cover no area and can go without a triangle
                let degenerate = (0..n).find(|&i| {
                    let a = points[ring[(i + n - 1) % n]];
                    let b = points[ring[i]];
                    let c = points[ring[(i + 1) % n]];
                    cross(a, b, c).abs() <= EPS
                });
                match degenerate {
                    Some(i) => {
                        ring.remove(i);
                    }
                    None => {
                        log::warn!("Polygon is not simple, clipping a reflex vertex");
                        triangles.push([ring[n - 1] as u32, ring[0] as u32, ring[1] as u32]);
                        ring.remove(0);
                    }
                }
            }
        }
    }
    if ring.len() == 3 {
        let (a, b, c) = (points[ring[0]], points[ring[1]], points[ring[2]]);
        if cross(a, b, c) > EPS {
            triangles.push([ring[0] as u32, ring[1] as u32, ring[2] as u32]);
        }
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(x, y)
    }

    fn area(points: &[Vector2<f32>], triangles: &[[u32; 3]]) -> f32 {
        triangles
            .iter()
            .map(|t| {
                cross(
                    points[t[0] as usize],
                    points[t[1] as usize],
                    points[t[2] as usize],
                ) * 0.5
            })
            .sum()
    }

    #[test]
    fn should_split_square_into_two_triangles() {
        let outer = vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)];
        let tris = triangulate(&outer, &[]);
        assert_eq!(tris.len(), 2);
        assert!((area(&outer, &tris) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn should_handle_concave_polygons() {
        // L shape, area 3
        let outer = vec![
            v(0.0, 0.0),
            v(2.0, 0.0),
            v(2.0, 1.0),
            v(1.0, 1.0),
            v(1.0, 2.0),
            v(0.0, 2.0),
        ];
        let tris = triangulate(&outer, &[]);
        assert_eq!(tris.len(), 4);
        assert!((area(&outer, &tris) - 3.0).abs() < 1e-5);
        assert!(tris.iter().all(|t| {
            cross(outer[t[0] as usize], outer[t[1] as usize], outer[t[2] as usize]) > 0.0
        }));
    }

    #[test]
    fn should_cut_out_holes() {
        let outer = vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)];
        let holes = vec![
            vec![v(1.0, 1.0), v(1.0, 2.0), v(2.0, 2.0), v(2.0, 1.0)],
            vec![v(2.5, 2.5), v(2.5, 3.5), v(3.5, 3.5), v(3.5, 2.5)],
        ];
        let points = flatten(&outer, &holes);
        let tris = triangulate(&outer, &holes);
        // at most n + 2h - 2 triangles for n vertices and h holes
        assert!(tris.len() >= 12 && tris.len() <= 12 + 4 - 2);
        assert!((area(&points, &tris) - 14.0).abs() < 1e-4);
        assert!(tris.iter().flatten().all(|&i| (i as usize) < points.len()));
    }

    #[test]
    fn should_ignore_collinear_vertices() {
        let outer = vec![
            v(0.0, 0.0),
            v(1.0, 0.0),
            v(2.0, 0.0),
            v(2.0, 1.0),
            v(1.0, 1.0),
            v(0.0, 1.0),
        ];
        let tris = triangulate(&outer, &[]);
        assert!((area(&outer, &tris) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn should_return_nothing_for_degenerate_input() {
        assert!(triangulate(&[v(0.0, 0.0), v(1.0, 0.0)], &[]).is_empty());
    }
}
