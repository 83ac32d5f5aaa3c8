use sps_core::animation::AnimState;

use crate::debug_overlay::OverlayActions;

const HELP_TEXT: &str = "Drag: box / corner: resize / cross: anchor / empty: pan\n\
Wheel: zoom   Enter: commit   F: export   Tab: mode   F1: back to game";

/// Read-only view of the Studio session for one frame of UI.
#[derive(Debug, Clone, Copy)]
pub struct StudioPanel<'a> {
    pub mode_label: &'a str,
    pub frame_count: usize,
    pub target_state: AnimState,
    pub sheet_status: &'a str,
    /// A sheet load is in flight; Load stays disabled until it resolves.
    pub loading: bool,
    pub export_json: Option<&'a str>,
}

pub fn show_studio_panel(ctx: &egui::Context, panel: &StudioPanel<'_>, actions: &mut OverlayActions) {
    egui::Window::new("Studio")
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading(format!("MODE: {}", panel.mode_label));
            ui.label(format!("Frames: {}", panel.frame_count));
            ui.label(panel.sheet_status);
            ui.separator();

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!panel.loading, egui::Button::new("Load sprite sheet"))
                    .clicked()
                {
                    actions.load_sheet = true;
                }
                if ui.button("Reset view").clicked() {
                    actions.reset_view = true;
                }
            });

            ui.horizontal(|ui| {
                let mut selected = panel.target_state;
                egui::ComboBox::from_label("Sequence")
                    .selected_text(selected.name())
                    .show_ui(ui, |ui| {
                        for state in AnimState::ALL {
                            ui.selectable_value(&mut selected, *state, state.name());
                        }
                    });
                if selected != panel.target_state {
                    actions.select_state = Some(selected);
                }
            });

            let can_apply = panel.frame_count > 0;
            if ui
                .add_enabled(can_apply, egui::Button::new("Apply to player"))
                .clicked()
            {
                actions.apply_to_player = true;
            }

            ui.separator();
            ui.small(HELP_TEXT);
        });
}

pub fn show_export_window(ctx: &egui::Context, json: &str, actions: &mut OverlayActions) {
    egui::Window::new("Export")
        .default_size([320.0, 360.0])
        .collapsible(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Copy").clicked() {
                    ctx.copy_text(json.to_string());
                    log::info!("Frame JSON copied to clipboard");
                }
                if ui.button("Close").clicked() {
                    actions.close_export = true;
                }
            });
            egui::ScrollArea::vertical().show(ui, |ui| {
                let mut text = json;
                ui.add(
                    egui::TextEdit::multiline(&mut text)
                        .code_editor()
                        .desired_width(f32::INFINITY),
                );
            });
        });
}
