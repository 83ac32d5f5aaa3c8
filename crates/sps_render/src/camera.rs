use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera over a y-down world. `position` is the world point
/// shown at the top-left corner of the surface; `zoom` is surface pixels per
/// world unit.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn viewport_size(&self) -> Vec2 {
        Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32)
    }

    /// Extent of the visible world region.
    pub fn visible_size(&self) -> Vec2 {
        self.viewport_size() / self.zoom
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let size = self.visible_size();
        // bottom/top swapped relative to a y-up projection so +y points down.
        let proj = Mat4::orthographic_rh(
            self.position.x,
            self.position.x + size.x,
            self.position.y + size.y,
            self.position.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}
