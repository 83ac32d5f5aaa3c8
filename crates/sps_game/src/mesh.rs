//! CPU-side quad batching for both modes.
//!
//! Everything on screen is a textured, tinted quad. Flat shapes sample the
//! 1x1 white texture; sheet regions sample the sprite sheet. Consecutive quads
//! that share a texture merge into one draw call, so a frame usually costs one
//! to three `draw_indexed` calls.

use glam::Vec2;
use sps_core::frame::Frame;
use sps_core::viewport::Viewport;
use sps_render::SpriteVertex;

use crate::collision::Rect;
use crate::context::World;
use crate::studio::StudioSession;

/// Grid spacing of the Studio backdrop, in screen pixels.
pub const GRID_SPACING: f32 = 50.0;

const FULL_UV: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    White,
    Sheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: TextureSlot,
    pub index_start: u32,
    pub index_count: u32,
}

/// sRGB hex color to the linear values the sRGB surface expects.
pub fn color(hex: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0), alpha]
}

#[derive(Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// `uv` is `[u0, v0, u1, v1]` for the top-left and bottom-right corners;
    /// swapping u0/u1 mirrors the quad horizontally.
    pub fn quad(&mut self, texture: TextureSlot, rect: Rect, uv: [f32; 4], color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        let [u0, v0, u1, v1] = uv;
        let (l, t, r, b) = (rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
        self.vertices.extend_from_slice(&[
            SpriteVertex {
                position: [l, t],
                tex_coords: [u0, v0],
                color,
            },
            SpriteVertex {
                position: [r, t],
                tex_coords: [u1, v0],
                color,
            },
            SpriteVertex {
                position: [r, b],
                tex_coords: [u1, v1],
                color,
            },
            SpriteVertex {
                position: [l, b],
                tex_coords: [u0, v1],
                color,
            },
        ]);

        let index_start = self.indices.len() as u32;
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self.push_draw_call(texture, index_start, 6);
    }

    pub fn fill(&mut self, rect: Rect, color: [f32; 4]) {
        self.quad(TextureSlot::White, rect, FULL_UV, color);
    }

    /// Four edge strips centred on the rectangle's border.
    pub fn outline(&mut self, rect: Rect, thickness: f32, color: [f32; 4]) {
        let h = thickness * 0.5;
        let (l, t, r, b) = (rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
        self.fill(Rect::new(l - h, t - h, rect.w + thickness, thickness), color);
        self.fill(Rect::new(l - h, b - h, rect.w + thickness, thickness), color);
        self.fill(Rect::new(l - h, t + h, thickness, rect.h - thickness), color);
        self.fill(Rect::new(r - h, t + h, thickness, rect.h - thickness), color);
    }

    fn push_draw_call(&mut self, texture: TextureSlot, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if last.texture == texture && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture,
            index_start,
            index_count,
        });
    }
}

fn frame_rect(frame: &Frame) -> Rect {
    Rect::new(
        frame.x as f32,
        frame.y as f32,
        frame.w as f32,
        frame.h as f32,
    )
}

fn sheet_uv(frame: &Frame, sheet: (u32, u32), mirrored: bool) -> [f32; 4] {
    let (sw, sh) = (sheet.0 as f32, sheet.1 as f32);
    let u0 = frame.x as f32 / sw;
    let u1 = frame.right() as f32 / sw;
    let v0 = frame.y as f32 / sh;
    let v1 = frame.bottom() as f32 / sh;
    if mirrored {
        [u1, v0, u0, v1]
    } else {
        [u0, v0, u1, v1]
    }
}

/// Destination of a player sprite frame: the frame's anchor sits on the
/// hitbox's top-centre, mirrored about it when facing left.
pub fn sprite_rect(frame: &Frame, anchor: Vec2, scale: f32, facing_right: bool) -> Rect {
    let ax = if facing_right {
        frame.ax as f32
    } else {
        (frame.w - frame.ax) as f32
    };
    Rect::new(
        anchor.x - ax * scale,
        anchor.y - frame.ay as f32 * scale,
        frame.w as f32 * scale,
        frame.h as f32 * scale,
    )
}

pub fn build_world(mesh: &mut Mesh, world: &World, sheet: Option<(u32, u32)>) {
    mesh.clear();
    let platform_color = color(0x555555, 1.0);
    for platform in world.level.platforms() {
        mesh.fill(*platform, platform_color);
    }

    let player = &world.player;
    let body = player.body;
    let frame = world.sprites.frame_for(&player.anim);
    match (frame, sheet) {
        (Some(frame), Some(sheet)) => {
            let anchor = Vec2::new(player.center_x(), body.y);
            let dest = sprite_rect(
                frame,
                anchor,
                player.config.sprite_scale,
                player.facing_right,
            );
            let uv = sheet_uv(frame, sheet, !player.facing_right);
            mesh.quad(TextureSlot::Sheet, dest, uv, [1.0; 4]);
        }
        _ => {
            mesh.fill(body, color(0xff4040, 1.0));
            let eye_x = if player.facing_right {
                body.x + body.w - 10.0
            } else {
                body.x + 4.0
            };
            mesh.fill(Rect::new(eye_x, body.y + 15.0, 6.0, 6.0), color(0xffffff, 1.0));
        }
    }

    if world.show_hitboxes {
        mesh.outline(body, 1.0, color(0x00ffff, 1.0));
    }
}

fn grid(mesh: &mut Mesh, viewport: &Viewport, canvas: Vec2) {
    let scale = viewport.scale();
    let top_left = viewport.screen_to_world(Vec2::ZERO);
    let extent = canvas / scale;
    let line = color(0x2a2a2a, 1.0);

    let mut sx = 0.0;
    while sx < canvas.x {
        let wx = viewport.screen_to_world(Vec2::new(sx, 0.0)).x;
        mesh.fill(Rect::new(wx, top_left.y, 1.0 / scale, extent.y), line);
        sx += GRID_SPACING;
    }
    let mut sy = 0.0;
    while sy < canvas.y {
        let wy = viewport.screen_to_world(Vec2::new(0.0, sy)).y;
        mesh.fill(Rect::new(top_left.x, wy, extent.x, 1.0 / scale), line);
        sy += GRID_SPACING;
    }
}

pub fn build_studio(
    mesh: &mut Mesh,
    session: &StudioSession,
    canvas: Vec2,
    sheet: Option<(u32, u32)>,
) {
    mesh.clear();
    grid(mesh, &session.viewport, canvas);

    if let Some((w, h)) = sheet {
        mesh.quad(
            TextureSlot::Sheet,
            Rect::new(0.0, 0.0, w as f32, h as f32),
            FULL_UV,
            [1.0; 4],
        );
    }

    let px = 1.0 / session.viewport.scale();
    let frames = session.frames();

    // Onion skin of the previous frame.
    if let Some(prev) = frames.last() {
        mesh.fill(frame_rect(prev), color(0xffffff, 0.12));
        mesh.outline(frame_rect(prev), px, color(0xffffff, 0.3));
    }

    let committed = color(0x00ff00, 1.0);
    for frame in frames.iter() {
        mesh.outline(frame_rect(frame), px, committed);
    }

    let current = session.current;
    let rect = frame_rect(&current);
    mesh.outline(rect, 2.0 * px, color(0xff0055, 1.0));

    let handle = 6.0 * px;
    mesh.fill(
        Rect::new(rect.x + rect.w - handle, rect.y + rect.h - handle, handle, handle),
        color(0xffffff, 1.0),
    );

    let anchor = Vec2::new(
        (current.x + current.ax) as f32,
        (current.y + current.ay) as f32,
    );
    let arm = 5.0 * px;
    let cyan = color(0x00ffff, 1.0);
    mesh.fill(Rect::new(anchor.x - arm, anchor.y - px * 0.5, 2.0 * arm, px), cyan);
    mesh.fill(Rect::new(anchor.x - px * 0.5, anchor.y - arm, px, 2.0 * arm), cyan);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::SpriteRegistry;
    use crate::collision::Level;
    use crate::controller::PlayerConfig;
    use std::path::Path;

    fn world() -> World {
        let sprites = SpriteRegistry::load_or_builtin(Path::new("missing/sps_mesh_test.json"));
        World::new(
            Level::builtin(),
            sprites,
            PlayerConfig::default(),
            Vec2::new(800.0, 600.0),
        )
    }

    #[test]
    fn consecutive_same_texture_quads_merge() {
        let mut mesh = Mesh::new();
        mesh.fill(Rect::new(0.0, 0.0, 1.0, 1.0), [1.0; 4]);
        mesh.fill(Rect::new(1.0, 0.0, 1.0, 1.0), [1.0; 4]);
        mesh.quad(TextureSlot::Sheet, Rect::new(0.0, 0.0, 4.0, 4.0), FULL_UV, [1.0; 4]);
        mesh.fill(Rect::new(2.0, 0.0, 1.0, 1.0), [1.0; 4]);

        assert_eq!(mesh.quad_count(), 4);
        assert_eq!(mesh.indices.len(), 24);
        let slots: Vec<_> = mesh.draw_calls.iter().map(|d| d.texture).collect();
        assert_eq!(
            slots,
            vec![TextureSlot::White, TextureSlot::Sheet, TextureSlot::White]
        );
        assert_eq!(mesh.draw_calls[0].index_count, 12);
        assert_eq!(mesh.draw_calls[2].index_start, 18);
    }

    #[test]
    fn world_without_sheet_draws_fallback_player() {
        let world = world();
        let mut mesh = Mesh::new();
        build_world(&mut mesh, &world, None);
        // Platforms, body, eye.
        assert_eq!(mesh.quad_count(), world.level.platforms().len() + 2);
        assert_eq!(mesh.draw_calls.len(), 1);
    }

    #[test]
    fn world_with_sheet_draws_sprite() {
        let world = world();
        let mut mesh = Mesh::new();
        build_world(&mut mesh, &world, Some((1100, 620)));
        assert_eq!(mesh.quad_count(), world.level.platforms().len() + 1);
        assert_eq!(
            mesh.draw_calls.last().map(|d| d.texture),
            Some(TextureSlot::Sheet)
        );
    }

    #[test]
    fn hitbox_outline_adds_four_strips() {
        let mut world = world();
        let mut mesh = Mesh::new();
        build_world(&mut mesh, &world, None);
        let base = mesh.quad_count();
        world.show_hitboxes = true;
        build_world(&mut mesh, &world, None);
        assert_eq!(mesh.quad_count(), base + 4);
    }

    #[test]
    fn sprite_anchor_lands_on_target_and_mirrors() {
        let frame = Frame::new(15, 13, 134, 290, 57, 43);
        let anchor = Vec2::new(100.0, 200.0);

        let right = sprite_rect(&frame, anchor, 0.5, true);
        assert_eq!(right.x + 57.0 * 0.5, 100.0);
        assert_eq!(right.y + 43.0 * 0.5, 200.0);
        assert_eq!((right.w, right.h), (67.0, 145.0));

        let left = sprite_rect(&frame, anchor, 0.5, false);
        assert_eq!(left.x + left.w - 57.0 * 0.5, 100.0);
        assert_eq!(left.y, right.y);

        let uv = sheet_uv(&frame, (1000, 1000), true);
        assert!(uv[0] > uv[2], "mirrored uv runs right to left");
    }

    #[test]
    fn studio_draws_grid_sheet_then_overlays() {
        let mut session = StudioSession::new(Vec2::new(200.0, 100.0));
        session.commit();
        let mut mesh = Mesh::new();
        build_studio(&mut mesh, &session, Vec2::new(200.0, 100.0), Some((64, 64)));

        let slots: Vec<_> = mesh.draw_calls.iter().map(|d| d.texture).collect();
        assert_eq!(
            slots,
            vec![TextureSlot::White, TextureSlot::Sheet, TextureSlot::White]
        );
        // 4 vertical + 2 horizontal grid lines, sheet, onion fill + outline,
        // one committed outline, working outline, handle, anchor cross.
        assert_eq!(mesh.quad_count(), 6 + 1 + 5 + 4 + 4 + 1 + 2);
    }

    #[test]
    fn studio_grid_lines_are_fifty_screen_pixels_apart() {
        let session = StudioSession::new(Vec2::new(300.0, 300.0));
        let mut mesh = Mesh::new();
        build_studio(&mut mesh, &session, Vec2::new(300.0, 300.0), None);
        let first = mesh.vertices[0].position[0];
        let second = mesh.vertices[4].position[0];
        let screen_gap = (second - first) * session.viewport.scale();
        assert!((screen_gap - GRID_SPACING).abs() < 1e-3);
    }

    #[test]
    fn color_converts_srgb_to_linear() {
        assert_eq!(color(0xffffff, 0.5), [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(color(0x000000, 1.0), [0.0, 0.0, 0.0, 1.0]);
        let mid = color(0x808080, 1.0);
        assert!((mid[0] - 0.2158).abs() < 1e-3);
    }
}
