//! Level geometry and axis-separated AABB collision.
//!
//! World space is y-down, in pixels. A level is a spawn point plus a list of
//! static axis-aligned platforms; there is no grid or broad phase since levels
//! hold a handful of rectangles.
//!
//! Resolution is **axis-separable**: the caller applies horizontal motion and
//! resolves it against every platform, then applies vertical motion and
//! resolves that. Each pass pushes the body out along its own axis only, to
//! the side it came from (the sign of the velocity on that axis), which gives
//! the usual "slide along walls, land on floors" behaviour.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Strict overlap: rectangles that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub spawn: SpawnPoint,
    pub platforms: Vec<Rect>,
}

/// Outcome of resolving one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisContact {
    /// Pushed back against the direction of travel on this axis.
    pub blocked: bool,
    /// Resolved while moving toward +axis (right, or down for the y axis).
    pub from_positive: bool,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub level_id: String,
    pub spawn: SpawnPoint,
    platforms: Vec<Rect>,
}

impl Level {
    pub fn new(level_id: &str, spawn: SpawnPoint, platforms: Vec<Rect>) -> Self {
        Self {
            level_id: level_id.to_string(),
            spawn,
            platforms,
        }
    }

    pub fn from_file(file: LevelFile) -> Self {
        Self {
            level_id: file.level_id,
            spawn: file.spawn,
            platforms: file.platforms,
        }
    }

    /// The built-in level used when no level file is available.
    pub fn builtin() -> Self {
        Self::new(
            "builtin",
            SpawnPoint { x: 100.0, y: 300.0 },
            vec![
                Rect::new(0.0, 600.0, 2000.0, 200.0),
                Rect::new(500.0, 550.0, 100.0, 50.0),
                Rect::new(600.0, 500.0, 100.0, 100.0),
                Rect::new(700.0, 450.0, 100.0, 150.0),
                Rect::new(800.0, 300.0, 50.0, 300.0),
                Rect::new(200.0, 450.0, 150.0, 20.0),
                Rect::new(50.0, 350.0, 100.0, 20.0),
                Rect::new(250.0, 250.0, 150.0, 20.0),
                Rect::new(400.0, 150.0, 400.0, 20.0),
            ],
        )
    }

    pub fn platforms(&self) -> &[Rect] {
        &self.platforms
    }

    /// Push `body` out of every overlapping platform along x. `vx` is the
    /// horizontal velocity that produced the overlap.
    pub fn resolve_x(&self, body: &mut Rect, vx: f32) -> AxisContact {
        let mut contact = AxisContact::default();
        for platform in &self.platforms {
            if !body.overlaps(platform) {
                continue;
            }
            if vx > 0.0 {
                body.x = platform.x - body.w;
                contact = AxisContact {
                    blocked: true,
                    from_positive: true,
                };
            } else if vx < 0.0 {
                body.x = platform.x + platform.w;
                contact = AxisContact {
                    blocked: true,
                    from_positive: false,
                };
            }
        }
        contact
    }

    /// Push `body` out of every overlapping platform along y. `vy > 0` means
    /// falling, so a positive contact is a landing.
    pub fn resolve_y(&self, body: &mut Rect, vy: f32) -> AxisContact {
        let mut contact = AxisContact::default();
        for platform in &self.platforms {
            if !body.overlaps(platform) {
                continue;
            }
            if vy > 0.0 {
                body.y = platform.y - body.h;
                contact = AxisContact {
                    blocked: true,
                    from_positive: true,
                };
            } else if vy < 0.0 {
                body.y = platform.y + platform.h;
                contact = AxisContact {
                    blocked: true,
                    from_positive: false,
                };
            }
        }
        contact
    }
}

pub fn load_level_from_path(path: &Path) -> Result<Level, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let file: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level_file(&file)?;
    Ok(Level::from_file(file))
}

fn validate_level_file(file: &LevelFile) -> Result<(), String> {
    if file.version != "0.1" {
        return Err(format!(
            "Level validation failed: unsupported version '{}'",
            file.version
        ));
    }
    if file.level_id.is_empty() {
        return Err("Level validation failed: level_id is empty".to_string());
    }
    if file.platforms.is_empty() {
        return Err("Level validation failed: platforms array is empty".to_string());
    }
    for (i, platform) in file.platforms.iter().enumerate() {
        if platform.w <= 0.0 || platform.h <= 0.0 {
            return Err(format!(
                "Level validation failed: platform {} has non-positive size {}x{}",
                i, platform.w, platform.h
            ));
        }
    }
    Ok(())
}
