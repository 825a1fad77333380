//! Scene control panel.
//!
//! Every edit goes through a `SceneModel` setter, which restarts
//! accumulation before the next dispatch.

use egui::{CollapsingHeader, DragValue, RichText, Ui};
use glam::Vec3;

use crate::scene::{CameraDesc, Material, MaterialKind, SceneModel, Sphere, MAX_SPHERES};

/// Frame statistics shown at the top of the panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub fps: f32,
    pub frame_time_ms: f32,
}

/// Drag three components; true if any changed.
fn drag_vec3(ui: &mut Ui, value: &mut Vec3, speed: f32) -> bool {
    ui.horizontal(|ui| {
        let mut changed = false;
        for c in [&mut value.x, &mut value.y, &mut value.z] {
            changed |= ui.add(DragValue::new(c).speed(speed).max_decimals(3)).changed();
        }
        changed
    })
    .inner
}

pub fn scene_panel(ui: &mut Ui, scene: &mut SceneModel, stats: Option<FrameStats>) {
    if let Some(stats) = stats {
        ui.label(format!("FPS: {:.0} ({:.2} ms)", stats.fps, stats.frame_time_ms));
    }
    ui.horizontal(|ui| {
        ui.label(format!("Accumulated frames: {}", scene.frame_count()));
        if ui.button("Reset").clicked() {
            scene.invalidate();
        }
    });

    ui.separator();
    camera_section(ui, scene);
    ui.separator();

    ui.horizontal(|ui| {
        ui.label(RichText::new(format!("Spheres ({}/{MAX_SPHERES})", scene.len())).strong());
        let can_add = scene.len() < MAX_SPHERES;
        if ui.add_enabled(can_add, egui::Button::new("Add")).clicked() {
            let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.25);
            if let Err(e) = scene.push(sphere, Material::lambertian(Vec3::splat(0.5))) {
                tracing::warn!("{e}");
            }
        }
    });

    let mut remove = None;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for index in 0..scene.len() {
            let label = format!("Sphere {index} ({})", scene.materials()[index].kind.label());
            CollapsingHeader::new(label)
                .id_salt(("sphere", index))
                .show(ui, |ui| {
                    if sphere_editor(ui, scene, index) {
                        remove = Some(index);
                    }
                });
        }
    });
    if let Some(index) = remove {
        scene.remove(index);
    }
}

fn camera_section(ui: &mut Ui, scene: &mut SceneModel) {
    CollapsingHeader::new(RichText::new("Camera").strong())
        .default_open(false)
        .show(ui, |ui| {
            let mut desc = *scene.camera_desc();
            let mut changed = false;

            ui.label("Position");
            changed |= drag_vec3(ui, &mut desc.position, 0.01);
            ui.label("Look at");
            changed |= drag_vec3(ui, &mut desc.look_at, 0.01);
            ui.horizontal(|ui| {
                ui.label("Vertical FOV");
                changed |= ui
                    .add(DragValue::new(&mut desc.vertical_fov).speed(0.5).range(1.0..=179.0).suffix("°"))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Aperture");
                changed |= ui
                    .add(DragValue::new(&mut desc.aperture).speed(0.005).range(0.0..=2.0))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Focus distance");
                changed |= ui
                    .add(DragValue::new(&mut desc.focus_distance).speed(0.01).range(0.01..=100.0))
                    .changed();
            });

            if ui.button("Default camera").clicked() {
                desc = CameraDesc::default();
                changed = true;
            }
            if changed {
                scene.set_camera(desc);
            }
        });
}

/// Returns true when the sphere should be removed.
fn sphere_editor(ui: &mut Ui, scene: &mut SceneModel, index: usize) -> bool {
    let Sphere { mut center, mut radius } = scene.spheres()[index];
    let Material { kind, albedo, fuzziness } = scene.materials()[index];

    ui.label("Center");
    if drag_vec3(ui, &mut center, 0.01) {
        scene.set_sphere_center(index, center);
    }
    ui.horizontal(|ui| {
        ui.label("Radius");
        if ui.add(DragValue::new(&mut radius).speed(0.01)).changed() {
            scene.set_sphere_radius(index, radius);
        }
    });

    // Lights carry intensities above 1, which a colour picker would clamp
    let mut albedo = albedo;
    if kind == MaterialKind::Emissive {
        ui.label("Emission");
        if drag_vec3(ui, &mut albedo, 0.05) {
            scene.set_albedo(index, albedo.max(Vec3::ZERO));
        }
    } else {
        ui.horizontal(|ui| {
            ui.label("Albedo");
            let mut rgb = albedo.to_array();
            if ui.color_edit_button_rgb(&mut rgb).changed() {
                scene.set_albedo(index, Vec3::from_array(rgb));
            }
        });
    }

    if kind == MaterialKind::Metal {
        let mut fuzz = fuzziness;
        ui.horizontal(|ui| {
            ui.label("Fuzziness");
            if ui.add(egui::Slider::new(&mut fuzz, 0.0..=1.0)).changed() {
                scene.set_fuzziness(index, fuzz);
            }
        });
    }

    ui.horizontal(|ui| {
        for candidate in MaterialKind::ALL {
            if ui.selectable_label(kind == candidate, candidate.label()).clicked() && kind != candidate {
                scene.set_material_kind(index, candidate);
            }
        }
    });

    ui.button("Remove").clicked()
}
