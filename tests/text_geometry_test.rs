use flow_activities::{
    data_structures::{
        geometry::{GeometryKind, MeshData},
        text::{TextParams, text_geometry},
    },
    resources::font::Typeface,
};

use crate::common::test_utils::TINY_FONT;

mod common;

fn font() -> Typeface {
    Typeface::from_json(TINY_FONT.as_bytes()).unwrap()
}

fn extent(data: &MeshData, axis: usize) -> f32 {
    let (min, max) = data.bounding_box().unwrap();
    max[axis] - min[axis]
}

fn assert_well_formed(data: &MeshData) {
    assert!(data.triangle_count() > 0);
    assert_eq!(data.indices.len() % 3, 0);
    let n = data.vertices.len() as u32;
    assert!(data.indices.iter().all(|&i| i < n));
    assert!(
        data.vertices
            .iter()
            .all(|v| v.position.iter().chain(v.normal.iter()).all(|c| c.is_finite()))
    );
}

#[test]
fn flat_text_should_match_font_metrics() {
    let params = TextParams {
        size: 2.0,
        depth: 0.5,
        bevel_enabled: false,
        ..Default::default()
    };
    let data = text_geometry(&font(), "Hi", &params);
    assert_well_formed(&data);
    // "H" is one em high, "i" starts after the 0.9 em advance
    assert!((extent(&data, 1) - 2.0).abs() < 1e-4);
    assert!((extent(&data, 0) - 2.2).abs() < 1e-4);
    assert!((extent(&data, 2) - 0.5).abs() < 1e-4);
}

#[test]
fn bevel_should_grow_the_solid_on_every_side() {
    let flat = TextParams {
        bevel_enabled: false,
        ..Default::default()
    };
    let bevelled = TextParams {
        bevel_enabled: true,
        bevel_size: 0.02,
        bevel_thickness: 0.03,
        ..flat
    };
    let a = text_geometry(&font(), "Hi", &flat);
    let b = text_geometry(&font(), "Hi", &bevelled);
    assert_well_formed(&b);
    assert!(b.triangle_count() > a.triangle_count());
    assert!((extent(&b, 0) - extent(&a, 0) - 0.04).abs() < 1e-4);
    assert!((extent(&b, 2) - extent(&a, 2) - 0.06).abs() < 1e-4);
}

#[test]
fn more_bevel_segments_should_add_triangles() {
    let coarse = TextParams {
        bevel_segments: 2,
        ..Default::default()
    };
    let fine = TextParams {
        bevel_segments: 6,
        ..Default::default()
    };
    let font = font();
    assert!(
        text_geometry(&font, "H", &fine).triangle_count()
            > text_geometry(&font, "H", &coarse).triangle_count()
    );
}

#[test]
fn blank_and_unknown_text_should_give_an_empty_mesh() {
    let data = text_geometry(&font(), "  ??", &TextParams::default());
    assert_eq!(data.triangle_count(), 0);
    assert!(data.bounding_box().is_none());
}

#[test]
fn centred_text_should_straddle_the_origin() {
    let mut data = text_geometry(&font(), "H i", &TextParams::default());
    data.center();
    let (min, max) = data.bounding_box().unwrap();
    for axis in 0..3 {
        assert!((min[axis] + max[axis]).abs() < 1e-4);
    }
}

#[test]
fn every_geometry_kind_should_be_well_formed_at_low_and_high_detail() {
    for kind in GeometryKind::ALL {
        for segments in [1, 16] {
            let data = kind.build(segments, segments);
            assert_well_formed(&data);
            assert_eq!(data.wireframe_indices().len() % 2, 0, "{}", kind.name());
        }
    }
}
