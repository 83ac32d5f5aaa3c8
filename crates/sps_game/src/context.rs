//! Top-level game state and per-tick mode dispatch.
//!
//! `GameContext` owns everything the simulation and the Studio need, so the
//! main loop only translates window events into calls here and renders what
//! comes back. GPU resources stay in the main loop; this module never touches
//! wgpu.

use std::path::{Path, PathBuf};

use glam::Vec2;
use sps_core::input::{InputState, Key};
use sps_devtools::OverlayActions;

use crate::animation::SpriteRegistry;
use crate::collision::{load_level_from_path, Level};
use crate::controller::{Player, PlayerConfig, PlayerInput};
use crate::sheet::{pick_sheet_file, SheetEvent, SheetImage, SheetLoader};
use crate::studio::StudioSession;
use crate::watcher::FileWatcher;

/// Fraction of the remaining distance the camera covers each tick.
pub const CAMERA_LERP: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Simulating,
    Editing,
}

/// Size and origin of the sprite sheet currently on the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub fn read_player_input(input: &mut InputState) -> PlayerInput {
    PlayerInput {
        left: input.is_held(Key::A) || input.is_held(Key::Left),
        right: input.is_held(Key::D) || input.is_held(Key::Right),
        sprint: input.is_held(Key::Shift),
        jump_pressed: input.any_pressed_edge(&[Key::Space, Key::Up]),
    }
}

pub struct World {
    pub player: Player,
    pub level: Level,
    /// World point at the top-left of the canvas.
    pub camera: Vec2,
    pub sprites: SpriteRegistry,
    pub show_hitboxes: bool,
}

impl World {
    pub fn new(level: Level, sprites: SpriteRegistry, config: PlayerConfig, canvas: Vec2) -> Self {
        let player = Player::new(level.spawn.x, level.spawn.y, config);
        let mut world = Self {
            player,
            level,
            camera: Vec2::ZERO,
            sprites,
            show_hitboxes: false,
        };
        world.camera = world.camera_target(canvas);
        world
    }

    /// Camera position that puts the player's centre mid-canvas.
    pub fn camera_target(&self, canvas: Vec2) -> Vec2 {
        Vec2::new(self.player.center_x(), self.player.center_y()) - canvas * 0.5
    }

    pub fn tick(&mut self, input: PlayerInput, canvas: Vec2) {
        let sprites = &self.sprites;
        self.player
            .step(input, &self.level, |state| sprites.len_of(state));
        let target = self.camera_target(canvas);
        self.camera += (target - self.camera) * CAMERA_LERP;
    }

    /// Swap in new geometry and put the player back on its spawn.
    pub fn replace_level(&mut self, level: Level) {
        let config = self.player.config;
        self.player = Player::new(level.spawn.x, level.spawn.y, config);
        self.level = level;
    }
}

/// What the main loop must act on after a tick.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub exit: bool,
    pub toggle_debug: bool,
    /// Freshly decoded sheet to upload.
    pub sheet_loaded: Option<SheetImage>,
}

pub struct GameContext {
    pub mode: AppMode,
    pub input: InputState,
    pub world: World,
    /// Created on first entry to the editor and kept across toggles.
    pub studio: Option<StudioSession>,
    pub sheet: Option<SheetInfo>,
    pub canvas: Vec2,
    sheet_loader: SheetLoader,
    level_watcher: FileWatcher,
    sprite_watcher: FileWatcher,
}

impl GameContext {
    pub fn new(level_path: &Path, sprite_path: &Path, canvas: Vec2) -> Self {
        let level = match load_level_from_path(level_path) {
            Ok(level) => {
                log::info!(
                    "Loaded level '{}' ({} platforms)",
                    level.level_id,
                    level.platforms().len()
                );
                level
            }
            Err(err) => {
                log::warn!("{err}; using built-in level");
                Level::builtin()
            }
        };
        let sprites = SpriteRegistry::load_or_builtin(sprite_path);

        Self {
            mode: AppMode::Simulating,
            input: InputState::new(),
            world: World::new(level, sprites, PlayerConfig::default(), canvas),
            studio: None,
            sheet: None,
            canvas,
            sheet_loader: SheetLoader::new(),
            level_watcher: FileWatcher::new(level_path.to_path_buf()),
            sprite_watcher: FileWatcher::new(sprite_path.to_path_buf()),
        }
    }

    pub fn request_sheet(&mut self, path: PathBuf) {
        self.sheet_loader.request(path);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas = Vec2::new(width as f32, height as f32);
    }

    pub fn sheet_loading(&self) -> bool {
        self.sheet_loader.is_loading()
    }

    pub fn sheet_status(&self) -> String {
        if let Some(path) = self.sheet_loader.pending_path() {
            return format!("Loading {}...", path.display());
        }
        match &self.sheet {
            Some(info) => format!(
                "Sheet: {} ({}x{})",
                info.path.display(),
                info.width,
                info.height
            ),
            None => "No sprite sheet loaded".to_string(),
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AppMode::Simulating => {
                let canvas = self.canvas;
                self.studio
                    .get_or_insert_with(|| StudioSession::new(canvas));
                AppMode::Editing
            }
            AppMode::Editing => {
                if let Some(studio) = self.studio.as_mut() {
                    studio.pointer_up();
                }
                AppMode::Simulating
            }
        };
        log::info!("Mode: {:?}", self.mode);
    }

    pub fn handle_sheet_event(&mut self, event: SheetEvent) -> Option<SheetImage> {
        match event {
            SheetEvent::Loaded(image) => {
                log::info!(
                    "Sprite sheet loaded: {} ({}x{})",
                    image.path.display(),
                    image.width,
                    image.height
                );
                self.sheet = Some(SheetInfo {
                    path: image.path.clone(),
                    width: image.width,
                    height: image.height,
                });
                let canvas = self.canvas;
                if let Some(studio) = self.studio.as_mut() {
                    studio.reset_view(canvas);
                }
                Some(image)
            }
            SheetEvent::Failed(err) => {
                log::warn!("{err}; keeping fallback rendering");
                None
            }
        }
    }

    fn reload_level(&mut self, reason: &str) {
        let path = self.level_watcher.path().to_path_buf();
        match load_level_from_path(&path) {
            Ok(level) => {
                log::info!("Reloaded level '{}' ({})", level.level_id, reason);
                self.world.replace_level(level);
            }
            Err(err) => log::warn!("Level reload failed ({}): {}", reason, err),
        }
    }

    fn reload_sprites(&mut self, reason: &str) {
        match self.world.sprites.reload() {
            Ok(()) => log::info!(
                "Reloaded sprite library '{}' ({})",
                self.world.sprites.path().display(),
                reason
            ),
            Err(err) => log::warn!("Sprite library reload failed ({}): {}", reason, err),
        }
    }

    /// One logical tick: global keys, async results, then the active mode.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let Some(event) = self.sheet_loader.poll() {
            outcome.sheet_loaded = self.handle_sheet_event(event);
        }

        if self.input.is_pressed_edge(Key::Escape) {
            outcome.exit = true;
            return outcome;
        }
        if self.input.is_pressed_edge(Key::F3) {
            outcome.toggle_debug = true;
        }
        if self.input.is_pressed_edge(Key::F1) {
            self.toggle_mode();
        }

        match self.mode {
            AppMode::Simulating => self.tick_simulation(),
            AppMode::Editing => {
                if let Some(studio) = self.studio.as_mut() {
                    studio.handle_keys(&mut self.input);
                }
            }
        }
        outcome
    }

    fn tick_simulation(&mut self) {
        if self.input.is_pressed_edge(Key::R) {
            self.reload_level("manual trigger (R)");
            self.reload_sprites("manual trigger (R)");
        } else {
            if self.level_watcher.should_reload() {
                self.reload_level("file watcher");
            }
            if self.sprite_watcher.should_reload() {
                self.reload_sprites("file watcher");
            }
        }
        if self.input.is_pressed_edge(Key::F4) {
            self.world.show_hitboxes = !self.world.show_hitboxes;
            log::info!(
                "Hitbox outlines: {}",
                if self.world.show_hitboxes { "ON" } else { "OFF" }
            );
        }

        let player_input = read_player_input(&mut self.input);
        self.world.tick(player_input, self.canvas);
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.input.pointer_moved(position);
        if let (AppMode::Editing, Some(studio)) = (self.mode, self.studio.as_mut()) {
            studio.pointer_move(position);
        }
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.input.pointer_down(position);
        if let (AppMode::Editing, Some(studio)) = (self.mode, self.studio.as_mut()) {
            studio.pointer_down(position);
        }
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_up();
        if let Some(studio) = self.studio.as_mut() {
            studio.pointer_up();
        }
    }

    /// Wheel zoom is editor-only.
    pub fn wheel(&mut self, delta: f32) {
        let pivot = self.input.pointer.position;
        if let (AppMode::Editing, Some(studio)) = (self.mode, self.studio.as_mut()) {
            studio.zoom(delta, pivot);
        }
    }

    pub fn focus_lost(&mut self) {
        self.input.release_all();
        if let Some(studio) = self.studio.as_mut() {
            studio.pointer_up();
        }
    }

    pub fn apply_overlay_actions(&mut self, actions: &OverlayActions) {
        if actions.load_sheet && self.sheet_loading() {
            log::info!("Sprite sheet load already in progress");
        } else if actions.load_sheet {
            match pick_sheet_file() {
                Some(path) => self.request_sheet(path),
                None => log::info!("Sprite sheet selection cancelled"),
            }
        }

        let canvas = self.canvas;
        let Some(studio) = self.studio.as_mut() else {
            return;
        };
        if actions.reset_view {
            studio.reset_view(canvas);
        }
        if let Some(state) = actions.select_state {
            studio.target_state = state;
        }
        if actions.apply_to_player {
            self.world
                .sprites
                .apply_sequence(studio.target_state, studio.frames().clone());
        }
        if actions.close_export {
            studio.close_export();
        }
    }
}
