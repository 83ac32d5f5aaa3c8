//! Sprite registry for the player.
//!
//! Wraps `sps_core::animation::SpriteLibrary` with a file source and the
//! built-in frame definitions for the bundled sheet. Sequences authored in the
//! Studio are applied on top and survive until the next file reload.

use std::path::{Path, PathBuf};

use sps_core::animation::{load_sprite_library, AnimState, AnimationPlayer, SpriteLibrary};
use sps_core::frame::{Frame, FrameSequence};

/// Frame definitions for the bundled `PA.png` sheet.
pub fn builtin_library() -> SpriteLibrary {
    let idle = [
        Frame::new(15, 13, 134, 290, 57, 43),
        Frame::new(353, 14, 134, 290, 57, 43),
        Frame::new(819, 15, 134, 290, 57, 43),
    ];
    let run = [
        Frame::new(14, 335, 147, 271, 86, 42),
        Frame::new(351, 335, 147, 271, 86, 42),
        Frame::new(524, 334, 147, 271, 86, 44),
        Frame::new(909, 336, 159, 270, 107, 41),
    ];
    let airborne = Frame::new(15, 13, 134, 290, 57, 43);

    let mut library = SpriteLibrary::new();
    library.set_sequence(AnimState::Idle, FrameSequence::from_frames(idle.to_vec()));
    library.set_sequence(AnimState::Run, FrameSequence::from_frames(run.to_vec()));
    library.set_sequence(AnimState::Jump, FrameSequence::from_frames(vec![airborne]));
    library.set_sequence(AnimState::Fall, FrameSequence::from_frames(vec![airborne]));
    library
}

pub struct SpriteRegistry {
    path: PathBuf,
    library: SpriteLibrary,
}

impl SpriteRegistry {
    /// Load from `path`, falling back to the built-in definitions when the
    /// file is missing or invalid.
    pub fn load_or_builtin(path: &Path) -> Self {
        let library = match load_sprite_library(path) {
            Ok(library) => {
                log::info!("Loaded sprite library '{}'", path.display());
                library
            }
            Err(err) => {
                log::warn!("{err}; using built-in sprite frames");
                builtin_library()
            }
        };
        Self {
            path: path.to_path_buf(),
            library,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file. On failure the current library is kept.
    pub fn reload(&mut self) -> Result<(), String> {
        self.library = load_sprite_library(&self.path)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn library(&self) -> &SpriteLibrary {
        &self.library
    }

    pub fn len_of(&self, state: AnimState) -> usize {
        self.library.len_of(state)
    }

    pub fn frame_for(&self, player: &AnimationPlayer) -> Option<&Frame> {
        self.library.frame_for(player)
    }

    /// Install a Studio-authored sequence for `state`.
    pub fn apply_sequence(&mut self, state: AnimState, sequence: FrameSequence) {
        log::info!(
            "Applied {} studio frame(s) to '{}'",
            sequence.len(),
            state
        );
        self.library.set_sequence(state, sequence);
    }
}
