//! egui layer composited over the world or Studio scene.
//!
//! A frame of UI goes through four calls from the main loop:
//!
//!   1. `prepare()` -- run the UI for this frame; returns tessellated
//!      primitives, texture changes and the actions widgets raised
//!   2. `upload()`  -- push texture changes and vertex data (needs the encoder)
//!   3. `paint()`   -- draw into a `forget_lifetime()` render pass, since
//!      `egui_wgpu::Renderer::render()` wants `RenderPass<'static>`
//!   4. `cleanup()` -- free textures egui dropped this frame
//!
//! F3 toggles the debug window. The Studio panel and export window appear
//! whenever the caller passes a `StudioPanel`, independent of that flag.

use sps_core::animation::AnimState;
use sps_core::time::FrameClock;
use winit::window::Window;

use crate::studio_panel::{show_export_window, show_studio_panel, StudioPanel};

const SIM_HINT: &str = "A/D or arrows: move   Shift: sprint   Space/Up: jump   F1: Studio";

/// Per-frame numbers shown in the debug window.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub draw_calls: u32,
    pub quad_count: u32,
    pub level_id: String,
    pub player_state: String,
    pub player_position: (f32, f32),
    pub player_velocity: (f32, f32),
    pub grounded: bool,
    pub sheet_status: String,
}

/// Requests raised by overlay widgets this frame; applied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayActions {
    pub load_sheet: bool,
    pub reset_view: bool,
    pub apply_to_player: bool,
    pub select_state: Option<AnimState>,
    pub close_export: bool,
}

pub struct DebugOverlay {
    ctx: egui::Context,
    winit_state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    visible: bool,
}

impl DebugOverlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let winit_state =
            egui_winit::State::new(ctx.clone(), ctx.viewport_id(), window, None, None, None);
        let renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            ctx,
            winit_state,
            renderer,
            visible: false,
        }
    }

    /// Feed a window event to egui. Returns true when egui consumed it.
    pub fn handle_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.winit_state.on_window_event(window, event).consumed
    }

    /// True while egui wants pointer input (hovering or dragging a widget).
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input() || self.ctx.is_pointer_over_area()
    }

    pub fn wants_keyboard(&self) -> bool {
        self.ctx.wants_keyboard_input()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug window: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        stats: &OverlayStats,
        studio: Option<StudioPanel<'_>>,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta, OverlayActions) {
        let raw_input = self.winit_state.take_egui_input(window);
        let (output, actions) = run_frame(
            &self.ctx,
            raw_input,
            self.visible,
            clock,
            stats,
            studio.as_ref(),
        );

        self.winit_state
            .handle_platform_output(window, output.platform_output);
        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);

        (primitives, output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, delta) in &textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.renderer.render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        textures_delta
            .free
            .iter()
            .for_each(|id| self.renderer.free_texture(id));
    }
}

/// Tab belongs to the Studio (edit-mode toggle), so egui never sees it and
/// cannot move keyboard focus between widgets with it.
fn strip_focus_navigation(raw_input: &mut egui::RawInput) {
    raw_input
        .events
        .retain(|event| !matches!(event, egui::Event::Key { key: egui::Key::Tab, .. }));
}

/// Only text fields may hold keyboard focus across frames. A focused button
/// would make `wants_keyboard` swallow the game's Enter, F, F1 and Escape.
fn release_widget_focus(ctx: &egui::Context) {
    let Some(id) = ctx.memory(|m| m.focused()) else {
        return;
    };
    if egui::text_edit::TextEditState::load(ctx, id).is_none() {
        ctx.memory_mut(|m| m.surrender_focus(id));
    }
}

fn run_frame(
    ctx: &egui::Context,
    mut raw_input: egui::RawInput,
    debug_visible: bool,
    clock: &FrameClock,
    stats: &OverlayStats,
    studio: Option<&StudioPanel<'_>>,
) -> (egui::FullOutput, OverlayActions) {
    strip_focus_navigation(&mut raw_input);
    let mut actions = OverlayActions::default();
    let output = ctx.run(raw_input, |ctx| {
        build_ui(ctx, debug_visible, clock, stats, studio, &mut actions);
    });
    release_widget_focus(ctx);
    (output, actions)
}

fn build_ui(
    ctx: &egui::Context,
    debug_visible: bool,
    clock: &FrameClock,
    stats: &OverlayStats,
    studio: Option<&StudioPanel<'_>>,
    actions: &mut OverlayActions,
) {
    match studio {
        Some(panel) => {
            show_studio_panel(ctx, panel, actions);
            if let Some(json) = panel.export_json {
                show_export_window(ctx, json, actions);
            }
        }
        None => {
            egui::Area::new(egui::Id::new("sim_hint"))
                .anchor(egui::Align2::LEFT_BOTTOM, [10.0, -10.0])
                .show(ctx, |ui| {
                    ui.label(SIM_HINT);
                });
        }
    }

    if debug_visible {
        show_debug_window(ctx, clock, stats);
    }
}

fn show_debug_window(ctx: &egui::Context, clock: &FrameClock, stats: &OverlayStats) {
    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("debug_stats").num_columns(2).show(ui, |ui| {
                let mut row = |name: &str, value: String| {
                    ui.label(name);
                    ui.monospace(value);
                    ui.end_row();
                };
                row("FPS", format!("{:.1}", clock.smoothed_fps));
                row("Frame", format!("{:.2} ms", clock.smoothed_frame_time_ms));
                row("Ticks", clock.tick_count.to_string());
                row("Draw calls", stats.draw_calls.to_string());
                row("Quads", stats.quad_count.to_string());
                row("Level", stats.level_id.clone());
                row("Sheet", stats.sheet_status.clone());
                row("State", stats.player_state.clone());
                row(
                    "Position",
                    format!("{:.1}, {:.1}", stats.player_position.0, stats.player_position.1),
                );
                row(
                    "Velocity",
                    format!("{:.2}, {:.2}", stats.player_velocity.0, stats.player_velocity.1),
                );
                row("Grounded", stats.grounded.to_string());
            });
        });
}
