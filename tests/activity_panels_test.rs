use flow_activities::{
    activities::{animation, camera, geometries, materials, text, textures},
    config::{ActivityId, Config},
    data_structures::{geometry::GeometryKind, material::MaterialKind},
    gui::{DebugPanel, Effect},
};
use winit::keyboard::KeyCode;

fn titles() -> Vec<String> {
    vec![
        animation::panel().title,
        camera::panel().title,
        geometries::panel().title,
        textures::panel().title,
        materials::panel().title,
        text::panel().title,
    ]
}

#[test]
fn every_activity_is_reachable_from_the_url() {
    for (id, title) in ActivityId::ALL.into_iter().zip(titles()) {
        let config = Config::from_query(&format!("?activity={}", id.number()));
        assert_eq!(config.activity, id);
        assert_eq!(title, id.to_string());
    }
    assert_eq!(Config::from_query("?activity=42").activity, ActivityId::Animation);
}

fn walk_all<P>(panel: &mut DebugPanel<P>, params: &mut P) -> Vec<(&'static str, Effect)> {
    let mut changes = Vec::new();
    for _ in 0..panel.controls().len() {
        if let Some(changed) = panel.handle_key(params, KeyCode::ArrowRight) {
            changes.push((changed.name, changed.effect));
        }
        panel.handle_key(params, KeyCode::ArrowDown);
    }
    changes
}

#[test]
fn hidden_panel_should_ignore_input() {
    let mut panel = geometries::panel();
    let mut params = geometries::GeometryParams::default();
    panel.handle_key(&mut params, KeyCode::KeyH);
    assert!(!panel.visible);
    assert!(panel.handle_key(&mut params, KeyCode::ArrowRight).is_none());
    assert_eq!(params, geometries::GeometryParams::default());
    panel.handle_key(&mut params, KeyCode::KeyH);
    assert!(panel.handle_key(&mut params, KeyCode::ArrowRight).is_some());
}

#[test]
fn geometry_panel_should_only_rebuild_for_shape_controls() {
    let mut panel = geometries::panel();
    let mut params = geometries::GeometryParams::default();
    let changes = walk_all(&mut panel, &mut params);
    for (name, effect) in changes {
        let rebuild = matches!(name, "geometry" | "width segments" | "height segments");
        assert_eq!(effect == Effect::Rebuild, rebuild, "{name}");
    }
    assert_eq!(params.kind(), GeometryKind::Sphere);
}

#[test]
fn unloaded_assets_should_not_be_selectable() {
    let mut panel = textures::panel();
    let mut params = textures::TextureParams::default();
    assert!(panel.select("texture"));
    panel.adjust(&mut params, 1);
    panel.adjust(&mut params, 1);
    // door -> checkerboard -> gradient, minecraft is skipped
    assert_eq!(params.choice(), textures::TextureChoice::Gradient);

    panel.set_option_enabled("texture", textures::TextureChoice::Minecraft.name(), true);
    panel.adjust(&mut params, -1);
    assert_eq!(params.choice(), textures::TextureChoice::Minecraft);

    let mut panel = materials::panel();
    let mut params = materials::MaterialsParams::default();
    assert!(panel.select("matcap"));
    assert!(panel.adjust(&mut params, 1).is_none());
    panel.set_option_enabled("matcap", "3", true);
    assert_eq!(
        panel.adjust(&mut params, 1).map(|c| c.effect),
        Some(Effect::Rebuild)
    );
    assert_eq!(params.matcap_index, 2);
}

#[test]
fn material_kinds_should_get_their_second_texture() {
    let mut params = materials::MaterialsParams::default();
    let matcaps = vec![None; materials::MATCAP_COUNT];
    for kind in MaterialKind::ALL {
        params.material_type = kind.index();
        let aux = materials::aux_image(&params, &matcaps);
        let expected = matches!(kind, MaterialKind::Matcap | MaterialKind::Toon);
        assert_eq!(aux.is_some(), expected, "{kind:?}");
        assert_eq!(params.material().kind, kind);
    }
}

#[test]
fn keyboard_selection_should_follow_the_arrows() {
    let mut panel = camera::panel();
    let params = camera::CameraParams::default();
    assert_eq!(panel.controls().len(), 2);
    assert!(panel.selection(&params).is_some_and(|s| s.starts_with("fov")));
    panel.select_next();
    assert!(panel.selection(&params).is_some_and(|s| s.starts_with("damping")));
}

#[test]
fn every_panel_should_draw_as_a_gui_window() {
    fn shapes<P>(mut panel: DebugPanel<P>, mut params: P) -> usize {
        let gui = egui::Context::default();
        let mut drawn = 0;
        for _ in 0..3 {
            let output = gui.run(egui::RawInput::default(), |gui| {
                assert!(panel.show(gui, &mut params).is_empty());
            });
            drawn = output.shapes.len();
        }
        drawn
    }
    assert!(shapes(animation::panel(), animation::AnimationParams::default()) > 0);
    assert!(shapes(camera::panel(), camera::CameraParams::default()) > 0);
    assert!(shapes(geometries::panel(), geometries::GeometryParams::default()) > 0);
    assert!(shapes(textures::panel(), textures::TextureParams::default()) > 0);
    assert!(shapes(materials::panel(), materials::MaterialsParams::default()) > 0);
    assert!(shapes(text::panel(), text::TextActivityParams::default()) > 0);
}
