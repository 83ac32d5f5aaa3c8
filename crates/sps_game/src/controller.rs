use sps_core::animation::{derive_state, AnimState, AnimationPlayer};

use crate::collision::{Level, Rect};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump_pressed: bool,
}

/// Tuning values in pixels and ticks. One tick is one rendered frame.
#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    pub speed: f32,
    pub sprint_multiplier: f32,
    pub friction: f32,
    pub gravity: f32,
    pub jump_force: f32,
    pub coyote_ticks: u32,
    pub jump_buffer_ticks: u32,
    pub respawn_y: f32,
    pub anim_speed: u32,
    pub sprite_scale: f32,
    pub hitbox_w: f32,
    pub hitbox_h: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            sprint_multiplier: 1.5,
            friction: 0.85,
            gravity: 0.5,
            jump_force: -12.0,
            coyote_ticks: 10,
            jump_buffer_ticks: 10,
            respawn_y: 2000.0,
            anim_speed: 8,
            sprite_scale: 0.35,
            hitbox_w: 30.0,
            hitbox_h: 95.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: Rect,
    pub vx: f32,
    pub vy: f32,
    pub facing_right: bool,
    pub grounded: bool,
    pub coyote_timer: u32,
    pub jump_buffer: u32,
    pub anim: AnimationPlayer,
    pub config: PlayerConfig,
}

impl Player {
    pub fn new(x: f32, y: f32, config: PlayerConfig) -> Self {
        Self {
            body: Rect::new(x, y, config.hitbox_w, config.hitbox_h),
            vx: 0.0,
            vy: 0.0,
            facing_right: true,
            grounded: false,
            coyote_timer: 0,
            jump_buffer: 0,
            anim: AnimationPlayer::new(),
            config,
        }
    }

    pub fn state(&self) -> AnimState {
        self.anim.state
    }

    pub fn center_x(&self) -> f32 {
        self.body.x + self.body.w * 0.5
    }

    pub fn center_y(&self) -> f32 {
        self.body.y + self.body.h * 0.5
    }

    /// Advance one tick. `sequence_len` is the frame count of the sprite
    /// sequence for whatever state the player ends the tick in; pass a
    /// closure so the lookup happens after the state is known.
    pub fn step(
        &mut self,
        input: PlayerInput,
        level: &Level,
        sequence_len: impl Fn(AnimState) -> usize,
    ) {
        let cfg = self.config;
        let accel = if input.sprint {
            cfg.speed * cfg.sprint_multiplier
        } else {
            cfg.speed
        };

        if input.right {
            self.vx += accel;
            self.facing_right = true;
        }
        if input.left {
            self.vx -= accel;
            self.facing_right = false;
        }

        // Exponential decay toward zero, applied with or without input.
        self.vx *= cfg.friction;
        self.vy += cfg.gravity;

        if input.jump_pressed {
            self.jump_buffer = cfg.jump_buffer_ticks;
        }
        if self.grounded {
            self.coyote_timer = cfg.coyote_ticks;
        } else {
            self.coyote_timer = self.coyote_timer.saturating_sub(1);
        }

        // Buffer and coyote windows must overlap: a press shortly before
        // landing or shortly after leaving a ledge still jumps.
        if self.jump_buffer > 0 && self.coyote_timer > 0 {
            self.vy = cfg.jump_force;
            self.grounded = false;
            self.jump_buffer = 0;
            self.coyote_timer = 0;
        } else {
            self.jump_buffer = self.jump_buffer.saturating_sub(1);
        }

        self.body.x += self.vx;
        if level.resolve_x(&mut self.body, self.vx).blocked {
            self.vx = 0.0;
        }

        self.grounded = false;
        self.body.y += self.vy;
        let contact_y = level.resolve_y(&mut self.body, self.vy);
        if contact_y.blocked {
            if contact_y.from_positive {
                self.grounded = true;
            }
            self.vy = 0.0;
        }

        if self.body.y > cfg.respawn_y {
            log::info!(
                "Player fell past y={} in level '{}', respawning",
                cfg.respawn_y,
                level.level_id
            );
            self.body.x = level.spawn.x;
            self.body.y = level.spawn.y;
            self.vy = 0.0;
        }

        let next = derive_state(self.grounded, self.vx, self.vy);
        if self.anim.set_state(next) {
            log::trace!("Player state -> {}", next);
        } else {
            self.anim.tick(cfg.anim_speed, sequence_len(next));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::SpawnPoint;

    fn flat_level() -> Level {
        Level::new(
            "flat",
            SpawnPoint { x: 100.0, y: 300.0 },
            vec![Rect::new(0.0, 600.0, 2000.0, 200.0)],
        )
    }

    fn standing_player(level: &Level) -> Player {
        let cfg = PlayerConfig::default();
        let mut player = Player::new(100.0, 600.0 - cfg.hitbox_h, cfg);
        player.grounded = true;
        // Settle onto the floor so timers reflect a grounded state.
        player.step(PlayerInput::default(), level, |_| 0);
        player
    }

    #[test]
    fn rest_on_ground_stays_idle() {
        let level = flat_level();
        let mut player = standing_player(&level);
        assert!(player.grounded);

        player.step(PlayerInput::default(), &level, |_| 0);
        assert_eq!(player.state(), AnimState::Idle);
        assert!(player.vx.abs() < 1e-6);
        assert_eq!(player.vy, 0.0);
        assert!(player.grounded);
        assert_eq!(player.body.y, 600.0 - player.body.h);
    }

    #[test]
    fn jump_executes_when_buffer_and_coyote_positive() {
        let level = flat_level();
        let mut player = standing_player(&level);
        player.step(
            PlayerInput {
                jump_pressed: true,
                ..Default::default()
            },
            &level,
            |_| 0,
        );
        assert!(player.vy < 0.0);
        assert!(!player.grounded);
        assert_eq!(player.jump_buffer, 0);
        assert_eq!(player.coyote_timer, 0);
        assert_eq!(player.state(), AnimState::Jump);
    }

    #[test]
    fn jump_ignored_without_coyote_time() {
        let level = flat_level();
        let cfg = PlayerConfig::default();
        let mut player = Player::new(100.0, 100.0, cfg);
        player.step(
            PlayerInput {
                jump_pressed: true,
                ..Default::default()
            },
            &level,
            |_| 0,
        );
        // Only gravity acted on vy.
        assert_eq!(player.vy, cfg.gravity);
        assert_eq!(player.state(), AnimState::Fall);
        assert_eq!(player.jump_buffer, cfg.jump_buffer_ticks - 1);
    }

    #[test]
    fn coyote_time_allows_late_jump() {
        let level = flat_level();
        let mut player = standing_player(&level);
        // Walked off a ledge: airborne but coyote window still open.
        player.grounded = false;
        player.body.y = 200.0;
        player.coyote_timer = 3;
        player.step(
            PlayerInput {
                jump_pressed: true,
                ..Default::default()
            },
            &level,
            |_| 0,
        );
        assert!(player.vy < 0.0);
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let level = flat_level();
        let cfg = PlayerConfig::default();
        // Just above the floor, falling.
        let mut player = Player::new(100.0, 600.0 - cfg.hitbox_h - 2.0, cfg);
        player.vy = 3.0;
        player.step(
            PlayerInput {
                jump_pressed: true,
                ..Default::default()
            },
            &level,
            |_| 0,
        );
        assert!(player.grounded, "landed this tick");
        assert!(player.jump_buffer > 0, "press is remembered");

        player.step(PlayerInput::default(), &level, |_| 0);
        assert!(player.vy < 0.0, "buffered jump executed");
    }

    #[test]
    fn early_press_expires_before_a_long_fall_lands() {
        let level = flat_level();
        let cfg = PlayerConfig::default();
        // Floor top is at 600; from y=100 the fall takes far longer than the
        // buffer window.
        let mut player = Player::new(100.0, 100.0, cfg);
        player.step(
            PlayerInput {
                jump_pressed: true,
                ..Default::default()
            },
            &level,
            |_| 0,
        );

        let mut airborne_ticks = 1;
        while !player.grounded {
            player.step(PlayerInput::default(), &level, |_| 0);
            assert!(player.vy >= 0.0, "no jump while falling");
            airborne_ticks += 1;
            assert!(airborne_ticks < 200, "player never landed");
        }
        assert!(airborne_ticks > cfg.jump_buffer_ticks);
        assert_eq!(player.jump_buffer, 0);

        for _ in 0..5 {
            player.step(PlayerInput::default(), &level, |_| 0);
            assert!(player.grounded);
            assert_eq!(player.vy, 0.0);
        }
        assert_eq!(player.body.y, 600.0 - player.body.h);
    }

    #[test]
    fn friction_decays_without_input() {
        let level = flat_level();
        let mut player = standing_player(&level);
        player.vx = 8.0;
        player.step(PlayerInput::default(), &level, |_| 0);
        assert!((player.vx - 8.0 * 0.85).abs() < 1e-5);
        assert_eq!(player.state(), AnimState::Run);
        for _ in 0..60 {
            player.step(PlayerInput::default(), &level, |_| 0);
        }
        assert!(player.vx.abs() < 0.01);
        assert_eq!(player.state(), AnimState::Idle);
    }

    #[test]
    fn sprint_accelerates_faster() {
        let level = flat_level();
        let mut walker = standing_player(&level);
        let mut sprinter = standing_player(&level);
        let walk = PlayerInput {
            right: true,
            ..Default::default()
        };
        let sprint = PlayerInput {
            right: true,
            sprint: true,
            ..Default::default()
        };
        walker.step(walk, &level, |_| 0);
        sprinter.step(sprint, &level, |_| 0);
        assert!(sprinter.vx > walker.vx);
        assert!(sprinter.facing_right);
    }

    #[test]
    fn facing_follows_direction() {
        let level = flat_level();
        let mut player = standing_player(&level);
        player.step(
            PlayerInput {
                left: true,
                ..Default::default()
            },
            &level,
            |_| 0,
        );
        assert!(!player.facing_right);
        assert!(player.vx < 0.0);
    }

    #[test]
    fn wall_blocks_and_zeroes_vx() {
        let level = Level::new(
            "wall",
            SpawnPoint { x: 0.0, y: 0.0 },
            vec![
                Rect::new(0.0, 600.0, 2000.0, 200.0),
                Rect::new(200.0, 400.0, 50.0, 200.0),
            ],
        );
        let mut player = Player::new(160.0, 505.0, PlayerConfig::default());
        for _ in 0..30 {
            player.step(
                PlayerInput {
                    right: true,
                    ..Default::default()
                },
                &level,
                |_| 0,
            );
            for platform in level.platforms() {
                assert!(!player.body.overlaps(platform));
            }
        }
        assert_eq!(player.body.x, 200.0 - player.body.w);
        assert_eq!(player.vx, 0.0);
    }

    #[test]
    fn falling_past_threshold_respawns() {
        let level = Level::new("void", SpawnPoint { x: 100.0, y: 300.0 }, Vec::new());
        let mut player = Player::new(100.0, 1990.0, PlayerConfig::default());
        player.vy = 20.0;
        player.step(PlayerInput::default(), &level, |_| 0);
        assert_eq!(player.body.x, 100.0);
        assert_eq!(player.body.y, 300.0);
        assert_eq!(player.vy, 0.0);
    }

    #[test]
    fn animation_advances_with_sequence_length() {
        let level = flat_level();
        let mut player = standing_player(&level);
        for _ in 0..16 {
            player.step(PlayerInput::default(), &level, |_| 3);
        }
        assert_eq!(player.state(), AnimState::Idle);
        assert_eq!(player.anim.frame_index, (player.anim.timer / 8) as usize % 3);
    }
}
