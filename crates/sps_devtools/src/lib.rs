pub mod debug_overlay;
pub mod studio_panel;

pub use debug_overlay::{DebugOverlay, OverlayActions, OverlayStats};
pub use studio_panel::StudioPanel;
