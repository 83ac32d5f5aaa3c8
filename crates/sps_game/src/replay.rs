//! Scripted input for driving the player headlessly. A script is a JSON list
//! of held-input spans:
//!
//! ```json
//! { "frames": [ { "right": true, "repeat": 30 }, { "jump_pressed": true } ] }
//! ```
//!
//! Every field defaults to false, and `repeat` defaults to one tick.

use std::fs;
use std::iter;
use std::path::Path;

use serde::Deserialize;

use crate::collision::{Level, Rect};
use crate::controller::{Player, PlayerInput};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReplayFrame {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub sprint: bool,
    #[serde(default)]
    pub jump_pressed: bool,
    #[serde(default = "one_tick")]
    pub repeat: u32,
}

impl ReplayFrame {
    fn input(&self) -> PlayerInput {
        PlayerInput {
            left: self.left,
            right: self.right,
            sprint: self.sprint,
            jump_pressed: self.jump_pressed,
        }
    }
}

impl ReplaySequence {
    /// One `PlayerInput` per tick, spans unrolled. A zero repeat counts as one.
    pub fn inputs(&self) -> impl Iterator<Item = PlayerInput> + '_ {
        self.frames
            .iter()
            .flat_map(|f| iter::repeat(f.input()).take(f.repeat.max(1) as usize))
    }

    pub fn tick_count(&self) -> usize {
        self.frames.iter().map(|f| f.repeat.max(1) as usize).sum()
    }
}

pub fn parse_replay(raw: &str) -> Result<ReplaySequence, String> {
    let replay: ReplaySequence =
        serde_json::from_str(raw).map_err(|e| format!("invalid replay JSON: {e}"))?;
    if replay.frames.is_empty() {
        return Err("replay has no frames".to_string());
    }
    Ok(replay)
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read replay {}: {e}", path.display()))?;
    parse_replay(&raw).map_err(|e| format!("Failed to load replay {}: {e}", path.display()))
}

/// Step `player` through every tick of `replay`, returning the hitbox after
/// each tick. Sequence lengths come from `sequence_len` as in the live game.
pub fn run_replay(
    player: &mut Player,
    level: &Level,
    replay: &ReplaySequence,
    sequence_len: impl Fn(sps_core::animation::AnimState) -> usize,
) -> Vec<Rect> {
    replay
        .inputs()
        .map(|input| {
            player.step(input, level, &sequence_len);
            player.body
        })
        .collect()
}

const fn one_tick() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PlayerConfig;
    use sps_core::animation::AnimState;
    use std::time::{SystemTime, UNIX_EPOCH};

    const RUN_AND_JUMP: &str = r#"{
      "frames": [
        { "right": true, "repeat": 60 },
        { "right": true, "jump_pressed": true },
        { "right": true, "sprint": true, "repeat": 120 },
        { "left": true, "repeat": 45 }
      ]
    }"#;

    fn spawn_player(level: &Level) -> Player {
        Player::new(level.spawn.x, level.spawn.y, PlayerConfig::default())
    }

    #[test]
    fn spans_unroll_into_ticks() {
        let replay = parse_replay(
            r#"{ "frames": [ { "right": true, "repeat": 3 }, { "jump_pressed": true, "repeat": 0 } ] }"#,
        )
        .expect("replay should parse");

        let inputs: Vec<_> = replay.inputs().collect();
        assert_eq!(inputs.len(), 4);
        assert_eq!(replay.tick_count(), 4);
        assert!(inputs[0].right && !inputs[0].jump_pressed);
        assert!(inputs[3].jump_pressed && !inputs[3].right);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let err = parse_replay(r#"{ "frames": [] }"#).expect_err("empty replay should fail");
        assert!(err.contains("no frames"));
    }

    #[test]
    fn replay_loads_from_disk() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "sps_replay_test_{}_{}.json",
            std::process::id(),
            nanos
        ));
        fs::write(&path, RUN_AND_JUMP).expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        assert_eq!(replay.tick_count(), 226);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn same_script_gives_same_trace() {
        let replay = parse_replay(RUN_AND_JUMP).expect("replay should parse");
        let level = Level::builtin();

        let mut a = spawn_player(&level);
        let mut b = spawn_player(&level);
        let trace_a = run_replay(&mut a, &level, &replay, |_| 4);
        let trace_b = run_replay(&mut b, &level, &replay, |_| 4);

        assert_eq!(trace_a, trace_b);
        assert_eq!((a.vx, a.vy, a.grounded), (b.vx, b.vy, b.grounded));
        assert_eq!(a.anim.frame_index, b.anim.frame_index);
    }

    #[test]
    fn idle_player_settles_on_spawn_ledge() {
        // The builtin spawn overlaps the ledge at y=350, so the first downward
        // pass seats the player on top of it.
        let replay = parse_replay(r#"{ "frames": [ { "repeat": 120 } ] }"#)
            .expect("replay should parse");
        let level = Level::builtin();
        let mut player = spawn_player(&level);

        let trace = run_replay(&mut player, &level, &replay, |_| 3);

        assert!(player.grounded);
        assert_eq!(player.vy, 0.0);
        assert_eq!(player.body.y + player.body.h, 350.0);
        assert!(trace.iter().all(|body| body.x == level.spawn.x));
        assert_eq!(player.state(), AnimState::Idle);
    }
}
