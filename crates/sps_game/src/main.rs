//! Sprite Platform Studio -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. Window
//! events are translated into `GameContext` calls as they arrive; everything
//! else happens in `RedrawRequested`, one logical tick per rendered frame:
//!
//!   1. `FrameClock::begin_tick()` -- measure wall-clock delta for the overlay
//!   2. `GameContext::tick()` -- global keys, async sheet results, then the
//!      active mode (platformer simulation or Studio editor)
//!   3. Rebuild the quad mesh for the active mode and point the camera at it
//!   4. Upload camera uniform, issue draw calls, composite the egui overlay
//!
//! Hot reload: the level and sprite-library JSON files are watched via mtime
//! polling and reloaded at tick boundaries. The sprite sheet loads on a
//! worker thread and is uploaded on the tick its result arrives.

mod animation;
mod collision;
mod context;
mod controller;
mod mesh;
#[cfg(test)]
mod replay;
mod sheet;
mod studio;
mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorIcon, Window, WindowId};

use context::{AppMode, GameContext};
use mesh::{build_studio, build_world, Mesh, TextureSlot};
use sheet::SheetImage;
use sps_core::input::Key;
use sps_core::time::FrameClock;
use sps_devtools::{DebugOverlay, OverlayStats, StudioPanel};
use sps_platform::window::PlatformConfig;
use sps_render::{Camera2D, GpuContext, SpritePipeline, SpriteVertex, Texture};
use studio::CursorHint;

const LEVEL_PATH: &str = "assets/levels/default_level.json";
const SPRITE_LIBRARY_PATH: &str = "assets/sprites/player_frames.json";
const DEFAULT_SHEET_PATH: &str = "assets/sprites/PA.png";

const WORLD_CLEAR: u32 = 0x202830;
const STUDIO_CLEAR: u32 = 0x1a1a1a;

struct GpuTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    fn new(pipeline: &SpritePipeline, device: &wgpu::Device, texture: Texture) -> Self {
        let bind_group = pipeline.create_texture_bind_group(device, &texture);
        Self {
            texture,
            bind_group,
        }
    }
}

/// All mutable engine state. Constructed in `ApplicationHandler::resumed` once
/// the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    game: GameContext,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,
    white: GpuTexture,
    sheet: Option<GpuTexture>,
    cursor: CursorHint,

    // The mesh is rebuilt on the CPU each tick, then streamed into these GPU
    // buffers. Buffers grow (power-of-two) but never shrink.
    mesh: Mesh,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        let white = GpuTexture::new(
            &sprite_pipeline,
            &gpu.device,
            Texture::white(&gpu.device, &gpu.queue)?,
        );

        let mut game = GameContext::new(
            Path::new(LEVEL_PATH),
            Path::new(SPRITE_LIBRARY_PATH),
            gpu.canvas_size(),
        );
        game.request_sheet(PathBuf::from(DEFAULT_SHEET_PATH));

        let camera = Camera2D::new(gpu.size.0, gpu.size.1);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Ok(Self {
            window,
            gpu,
            clock: FrameClock::new(),
            game,
            camera,
            sprite_pipeline,
            debug_overlay,
            white,
            sheet: None,
            cursor: CursorHint::Default,
            mesh: Mesh::new(),
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 1,
            mesh_index_capacity: 1,
        })
    }

    fn upload_sheet(&mut self, image: &SheetImage) {
        let label = image.path.display().to_string();
        match Texture::from_rgba8(
            &self.gpu.device,
            &self.gpu.queue,
            &image.rgba,
            image.width,
            image.height,
            &label,
        ) {
            Ok(texture) => {
                self.sheet = Some(GpuTexture::new(
                    &self.sprite_pipeline,
                    &self.gpu.device,
                    texture,
                ));
            }
            Err(err) => {
                log::warn!("{err}; keeping fallback rendering");
                self.game.sheet = None;
            }
        }
    }

    fn sheet_size(&self) -> Option<(u32, u32)> {
        self.sheet.as_ref().map(|s| s.texture.size)
    }

    /// Build this tick's mesh and aim the camera for the active mode.
    fn rebuild_mesh(&mut self) {
        let sheet = self.sheet_size();
        match (self.game.mode, self.game.studio.as_ref()) {
            (AppMode::Editing, Some(studio)) => {
                let scale = studio.viewport.scale();
                self.camera.position = -studio.viewport.origin / scale;
                self.camera.zoom = scale;
                build_studio(&mut self.mesh, studio, self.game.canvas, sheet);
            }
            _ => {
                self.camera.position = self.game.world.camera;
                self.camera.zoom = 1.0;
                build_world(&mut self.mesh, &self.game.world, sheet);
            }
        }

        self.ensure_mesh_capacity(self.mesh.vertices.len(), self.mesh.indices.len());
        if !self.mesh.vertices.is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.mesh.vertices),
            );
        }
        if !self.mesh.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.mesh.indices));
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn update_cursor(&mut self) {
        let hint = match (self.game.mode, self.game.studio.as_ref()) {
            (AppMode::Editing, Some(studio)) => studio.cursor,
            _ => CursorHint::Default,
        };
        if hint != self.cursor {
            self.cursor = hint;
            self.window.set_cursor(cursor_icon(hint));
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let player = &self.game.world.player;
        OverlayStats {
            draw_calls: self.mesh.draw_calls.len() as u32,
            quad_count: self.mesh.quad_count() as u32,
            level_id: self.game.world.level.level_id.clone(),
            player_state: player.state().to_string(),
            player_position: (player.body.x, player.body.y),
            player_velocity: (player.vx, player.vy),
            grounded: player.grounded,
            sheet_status: self.game.sheet_status(),
        }
    }

    /// One tick plus one frame. Returns false when the app should exit.
    fn redraw(&mut self) -> bool {
        self.clock.begin_tick();
        let outcome = self.game.tick();
        if outcome.exit {
            log::info!("Escape pressed, exiting.");
            return false;
        }
        if outcome.toggle_debug {
            self.debug_overlay.toggle();
        }
        if let Some(image) = outcome.sheet_loaded {
            self.upload_sheet(&image);
        }

        self.rebuild_mesh();
        self.update_cursor();

        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return true;
        };

        let stats = self.overlay_stats();
        let sheet_status = stats.sheet_status.clone();
        let panel = match (self.game.mode, self.game.studio.as_ref()) {
            (AppMode::Editing, Some(studio)) => Some(StudioPanel {
                mode_label: studio.edit_mode.label(),
                frame_count: studio.frames().len(),
                target_state: studio.target_state,
                sheet_status: &sheet_status,
                loading: self.game.sheet_loading(),
                export_json: studio.export_json.as_deref(),
            }),
            _ => None,
        };
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.clock, &stats, panel);
        self.game.apply_overlay_actions(&overlay_actions);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let clear = match self.game.mode {
                AppMode::Simulating => WORLD_CLEAR,
                AppMode::Editing => STUDIO_CLEAR,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(clear)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.mesh.draw_calls {
                let texture = match draw.texture {
                    TextureSlot::White => Some(&self.white),
                    TextureSlot::Sheet => self.sheet.as_ref(),
                };
                let Some(texture) = texture else {
                    continue;
                };
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        true
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let created = sps_platform::window::create_window(event_loop, &self.config)
            .and_then(EngineState::new);
        match created {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    state.game.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => state.game.focus_lost(),

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            // Releases always pass through so no key stays held.
                            ElementState::Pressed
                                if !egui_consumed && !state.debug_overlay.wants_keyboard() =>
                            {
                                state.game.input.key_down(key)
                            }
                            ElementState::Pressed => {}
                            ElementState::Released => state.game.input.key_up(key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state
                    .game
                    .pointer_moved(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed if !state.debug_overlay.wants_pointer() => {
                    let position = state.game.input.pointer.position;
                    state.game.pointer_down(position);
                }
                ElementState::Pressed => {}
                ElementState::Released => state.game.pointer_up(),
            },

            WindowEvent::MouseWheel { delta, .. } if !state.debug_overlay.wants_pointer() => {
                // winit reports scroll-up as positive; zoom expects it negative.
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
                };
                if amount != 0.0 {
                    state.game.wheel(amount);
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                if !state.redraw() {
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn clear_color(hex: u32) -> wgpu::Color {
    let [r, g, b, a] = mesh::color(hex, 1.0);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

fn cursor_icon(hint: CursorHint) -> CursorIcon {
    match hint {
        CursorHint::Default => CursorIcon::Default,
        CursorHint::Crosshair => CursorIcon::Crosshair,
        CursorHint::Resize => CursorIcon::NwseResize,
        CursorHint::Move => CursorIcon::Move,
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::Space => Some(Key::Space),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Key::Shift),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::KeyF => Some(Key::F),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::F1 => Some(Key::F1),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Sprite Platform Studio starting...");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {err}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_key_covers_bindings() {
        assert_eq!(map_key(KeyCode::KeyA), Some(Key::A));
        assert_eq!(map_key(KeyCode::ShiftRight), Some(Key::Shift));
        assert_eq!(map_key(KeyCode::NumpadEnter), Some(Key::Enter));
        assert_eq!(map_key(KeyCode::F1), Some(Key::F1));
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn cursor_icons_follow_hints() {
        assert_eq!(cursor_icon(CursorHint::Resize), CursorIcon::NwseResize);
        assert_eq!(cursor_icon(CursorHint::Default), CursorIcon::Default);
    }
}
