//! Sprite-sheet editor session.
//!
//! The session owns a working frame (the draft being positioned on the sheet),
//! the committed sequence, and the editor viewport. Pointer input drives a
//! small drag state machine chosen at press time by hit-testing, in priority
//! order: the anchor cross, the resize corner, the frame body, and finally
//! empty space, which pans the view.
//!
//! Every drag records a grab offset at press time so the feature under the
//! cursor stays under the cursor; the first move event after a press is
//! therefore a no-op unless the pointer actually moved.

use glam::Vec2;

use sps_core::animation::AnimState;
use sps_core::frame::{Frame, FrameSequence};
use sps_core::input::{InputState, Key};
use sps_core::viewport::Viewport;

/// Hit radius of the anchor and resize handles, in screen pixels.
pub const HANDLE_RADIUS: f32 = 15.0;

/// Working frame for a fresh session: 32x32 at the sheet origin, anchored at
/// the bottom centre.
pub const INITIAL_FRAME: Frame = Frame::new(0, 0, 32, 32, 16, 32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    None,
    Pan,
    Box,
    Resize,
    Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Anchor,
    Resize,
    Body,
    Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    Crosshair,
    Resize,
    Move,
}

/// Label shown by the mode indicator. Toggled with Tab; display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Box,
    Anchor,
}

impl EditMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Box => "BOX",
            Self::Anchor => "ANCHOR",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Box => Self::Anchor,
            Self::Anchor => Self::Box,
        }
    }
}

pub struct StudioSession {
    pub viewport: Viewport,
    pub current: Frame,
    frames: FrameSequence,
    pub target_state: AnimState,
    pub edit_mode: EditMode,
    pub cursor: CursorHint,
    /// Last export, shown by the export window until closed.
    pub export_json: Option<String>,
    drag: DragMode,
    drag_offset: Vec2,
}

impl StudioSession {
    pub fn new(canvas_size: Vec2) -> Self {
        Self {
            viewport: Viewport::centered(canvas_size),
            current: INITIAL_FRAME,
            frames: FrameSequence::new(),
            target_state: AnimState::Idle,
            edit_mode: EditMode::default(),
            cursor: CursorHint::default(),
            export_json: None,
            drag: DragMode::None,
            drag_offset: Vec2::ZERO,
        }
    }

    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }

    #[cfg(test)]
    pub fn drag_mode(&self) -> DragMode {
        self.drag
    }

    pub fn reset_view(&mut self, canvas_size: Vec2) {
        self.viewport.reset(canvas_size);
    }

    fn frame_origin(&self) -> Vec2 {
        Vec2::new(self.current.x as f32, self.current.y as f32)
    }

    fn anchor_world(&self) -> Vec2 {
        self.frame_origin() + Vec2::new(self.current.ax as f32, self.current.ay as f32)
    }

    fn corner_world(&self) -> Vec2 {
        Vec2::new(self.current.right() as f32, self.current.bottom() as f32)
    }

    fn contains_world(&self, p: Vec2) -> bool {
        let f = &self.current;
        p.x >= f.x as f32 && p.x <= f.right() as f32 && p.y >= f.y as f32 && p.y <= f.bottom() as f32
    }

    pub fn hit_test(&self, screen: Vec2) -> Handle {
        let anchor = self.viewport.world_to_screen(self.anchor_world());
        if screen.distance(anchor) < HANDLE_RADIUS {
            return Handle::Anchor;
        }
        let corner = self.viewport.world_to_screen(self.corner_world());
        if screen.distance(corner) < HANDLE_RADIUS {
            return Handle::Resize;
        }
        if self.contains_world(self.viewport.screen_to_world(screen)) {
            return Handle::Body;
        }
        Handle::Empty
    }

    pub fn pointer_down(&mut self, screen: Vec2) {
        let world = self.viewport.screen_to_world(screen);
        let origin = self.frame_origin();
        let f = self.current;
        let (mode, offset) = match self.hit_test(screen) {
            Handle::Anchor => (
                DragMode::Anchor,
                world - origin - Vec2::new(f.ax as f32, f.ay as f32),
            ),
            Handle::Resize => (
                DragMode::Resize,
                world - origin - Vec2::new(f.w as f32, f.h as f32),
            ),
            Handle::Body => (DragMode::Box, world - origin),
            Handle::Empty => (DragMode::Pan, screen - self.viewport.origin),
        };
        log::debug!("Studio drag start: {:?}", mode);
        self.drag = mode;
        self.drag_offset = offset;
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        let world = self.viewport.screen_to_world(screen);
        let origin = self.frame_origin();
        match self.drag {
            DragMode::None => {
                self.cursor = match self.hit_test(screen) {
                    Handle::Anchor => CursorHint::Crosshair,
                    Handle::Resize => CursorHint::Resize,
                    Handle::Body => CursorHint::Move,
                    Handle::Empty => CursorHint::Default,
                };
            }
            DragMode::Pan => {
                self.viewport.pan_to(screen - self.drag_offset);
            }
            DragMode::Box => {
                let pos = (world - self.drag_offset).round();
                self.current.x = pos.x as i32;
                self.current.y = pos.y as i32;
            }
            DragMode::Resize => {
                let size = (world - origin - self.drag_offset).round().max(Vec2::ONE);
                self.current.w = size.x as i32;
                self.current.h = size.y as i32;
            }
            DragMode::Anchor => {
                let anchor = (world - origin - self.drag_offset).round();
                self.current.ax = anchor.x as i32;
                self.current.ay = anchor.y as i32;
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragMode::None;
    }

    pub fn zoom(&mut self, wheel_delta: f32, pivot: Vec2) {
        self.viewport.zoom(wheel_delta, pivot);
    }

    /// Append a copy of the working frame and lay out the next one directly
    /// to its right. Returns the committed count.
    pub fn commit(&mut self) -> usize {
        self.frames.push(self.current);
        self.current.x += self.current.w;
        self.frames.len()
    }

    /// Serialize the committed sequence and keep it for the export window.
    pub fn export(&mut self) -> Result<&str, String> {
        let json = self.frames.to_json()?;
        Ok(self.export_json.insert(json).as_str())
    }

    pub fn close_export(&mut self) {
        self.export_json = None;
    }

    /// Edge-triggered editor keys: Enter commits, F exports, Tab switches the
    /// mode label.
    pub fn handle_keys(&mut self, input: &mut InputState) {
        if input.is_pressed_edge(Key::Enter) {
            let count = self.commit();
            log::info!("Frame committed ({} in '{}')", count, self.target_state);
        }
        if input.is_pressed_edge(Key::F) {
            match self.export() {
                Ok(json) => log::info!("Exported {} bytes of frame JSON", json.len()),
                Err(err) => log::error!("Export failed: {err}"),
            }
        }
        if input.is_pressed_edge(Key::Tab) {
            self.edit_mode = self.edit_mode.toggled();
            log::debug!("Studio mode label: {}", self.edit_mode.label());
        }
    }
}
