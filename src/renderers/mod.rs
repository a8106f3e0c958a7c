//! Renderers module for the neume editor
//!
//! This module contains the render engine seam, the glyph sprite sheet and
//! the recording engine whose display list the host replays on its canvas.

pub mod display_list;
pub mod engine;
pub mod glyphs;

// Re-export commonly used types
pub use display_list::{CanvasSpec, DisplayList, DisplayListEngine, DrawCommand, LiveDrawing};
pub use engine::{
    calc_scale_from_staff, DrawOptions, DrawRequest, Drawing, DrawingId, RenderEngine, Shape,
};
pub use glyphs::{GlyphSet, GlyphSprite};
