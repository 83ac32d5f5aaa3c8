//! Player animation state machine and tick-based frame selection.
//!
//! The discrete state is a pure function of the physics outcome
//! `(grounded, vx, vy)`; there is no transition table. Playback counts whole
//! simulation ticks, so the displayed frame only depends on how many ticks the
//! current state has been active:
//!
//! ```text
//! index = floor(timer / anim_speed) mod sequence_len
//! ```
//!
//! Sprite libraries are stored as JSON keyed by state name, each value being
//! the exact frame array the Studio exports.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::frame::{Frame, FrameSequence};

/// Horizontal speed (px/tick) below which a grounded player counts as idle.
pub const RUN_DEADZONE: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnimState {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
}

impl AnimState {
    pub const ALL: &'static [AnimState] = &[
        AnimState::Idle,
        AnimState::Run,
        AnimState::Jump,
        AnimState::Fall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Jump => "jump",
            Self::Fall => "fall",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl std::fmt::Display for AnimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn derive_state(grounded: bool, vx: f32, vy: f32) -> AnimState {
    if !grounded {
        if vy < 0.0 {
            AnimState::Jump
        } else {
            AnimState::Fall
        }
    } else if vx.abs() > RUN_DEADZONE {
        AnimState::Run
    } else {
        AnimState::Idle
    }
}

/// Frame index for a looping sequence of `len` frames, `None` when empty.
pub fn frame_index_at(timer: u32, anim_speed: u32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let per_frame = anim_speed.max(1);
    Some((timer / per_frame) as usize % len)
}

/// Runtime playback state for the player's current animation.
#[derive(Debug, Clone, Default)]
pub struct AnimationPlayer {
    pub state: AnimState,
    pub timer: u32,
    pub frame_index: usize,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `next`. Any change of state restarts playback from frame 0.
    /// Returns whether the state changed.
    pub fn set_state(&mut self, next: AnimState) -> bool {
        if next == self.state {
            return false;
        }
        self.state = next;
        self.timer = 0;
        self.frame_index = 0;
        true
    }

    /// Advance one tick against a sequence of `len` frames.
    pub fn tick(&mut self, anim_speed: u32, len: usize) {
        self.timer = self.timer.wrapping_add(1);
        self.frame_index = frame_index_at(self.timer, anim_speed, len).unwrap_or(0);
    }
}

/// One frame sequence per animation state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteLibrary {
    sequences: HashMap<AnimState, FrameSequence>,
}

impl SpriteLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(&self, state: AnimState) -> Option<&FrameSequence> {
        self.sequences.get(&state).filter(|s| !s.is_empty())
    }

    pub fn set_sequence(&mut self, state: AnimState, sequence: FrameSequence) {
        self.sequences.insert(state, sequence);
    }

    pub fn frame_for(&self, player: &AnimationPlayer) -> Option<&Frame> {
        self.sequence(player.state)
            .and_then(|seq| seq.get(player.frame_index))
    }

    pub fn len_of(&self, state: AnimState) -> usize {
        self.sequences.get(&state).map_or(0, FrameSequence::len)
    }
}

/// Parse a sprite library from its JSON text.
pub fn parse_sprite_library(raw: &str) -> Result<SpriteLibrary, String> {
    let json: HashMap<String, Vec<Frame>> =
        serde_json::from_str(raw).map_err(|e| format!("invalid sprite library JSON: {e}"))?;
    validate_sprite_library_json(&json)?;

    let mut library = SpriteLibrary::new();
    for (name, frames) in json {
        if let Some(state) = AnimState::from_name(&name) {
            library.set_sequence(state, FrameSequence::from_frames(frames));
        }
    }
    Ok(library)
}

/// Load a sprite library definition file from disk.
pub fn load_sprite_library(path: &Path) -> Result<SpriteLibrary, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sprite library {}: {e}", path.display()))?;
    parse_sprite_library(&raw)
        .map_err(|e| format!("Failed to load sprite library {}: {e}", path.display()))
}

fn validate_sprite_library_json(json: &HashMap<String, Vec<Frame>>) -> Result<(), String> {
    for (name, frames) in json {
        if AnimState::from_name(name).is_none() {
            log::warn!("Sprite library entry '{}' is not an animation state; ignored", name);
            continue;
        }
        for (i, frame) in frames.iter().enumerate() {
            frame
                .validate()
                .map_err(|e| format!("sequence '{}' frame {}: {}", name, i, e))?;
        }
    }
    Ok(())
}
