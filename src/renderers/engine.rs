//! The render engine seam
//!
//! Views never touch a canvas directly. They describe what to draw with
//! [`DrawRequest`]s and hand them to a [`RenderEngine`]. In the browser the
//! engine is backed by the host canvas library; natively (and in tests) the
//! [`DisplayListEngine`](super::display_list::DisplayListEngine) records the
//! commands instead.
//!
//! Glyph positions follow the canvas library convention: `left`/`top` are the
//! centre point of the object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{ElementId, Zone};

use super::glyphs::GlyphSprite;

/// Handle to something drawn on the canvas
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DrawingId(pub u32);

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drawing#{}", self.0)
    }
}

/// A primitive inside a drawing
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    /// Sprite glyph centred on (`left`, `top`), already scaled
    Glyph {
        glyph: String,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Shape {
    /// Place a sprite so that its centre sits at (`left`, `top`)
    pub fn glyph(sprite: &GlyphSprite, left: f64, top: f64) -> Self {
        Shape::Glyph {
            glyph: sprite.id.clone(),
            left,
            top,
            width: sprite.width,
            height: sprite.height,
        }
    }

    pub fn line(coords: [f64; 4]) -> Self {
        Shape::Line {
            x1: coords[0],
            y1: coords[1],
            x2: coords[2],
            y2: coords[3],
        }
    }

    /// (min x, min y, max x, max y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Shape::Glyph {
                left,
                top,
                width,
                height,
                ..
            } => (
                left - width / 2.0,
                top - height / 2.0,
                left + width / 2.0,
                top + height / 2.0,
            ),
            Shape::Line { x1, y1, x2, y2 } => (x1.min(*x2), y1.min(*y2), x1.max(*x2), y1.max(*y2)),
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Shape::Glyph { left, top, .. } => {
                *left += dx;
                *top += dy;
            }
            Shape::Line { x1, y1, x2, y2 } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
        }
    }
}

/// Shapes to draw. `fixed` shapes are decoration (staff lines, ledger
/// lines); `modify` shapes are the ones the user can interact with.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DrawRequest {
    pub fixed: Vec<Shape>,
    pub modify: Vec<Shape>,
}

impl DrawRequest {
    pub fn fixed(shapes: Vec<Shape>) -> Self {
        Self {
            fixed: shapes,
            modify: Vec::new(),
        }
    }

    pub fn modify(shapes: Vec<Shape>) -> Self {
        Self {
            fixed: Vec::new(),
            modify: shapes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.modify.is_empty()
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.fixed.iter().chain(self.modify.iter())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawOptions {
    pub group: bool,
    pub selectable: bool,
    pub lock_movement_x: bool,
    pub lock_movement_y: bool,
    /// Model element the drawing represents
    pub element: Option<ElementId>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            group: true,
            selectable: true,
            lock_movement_x: false,
            lock_movement_y: false,
            element: None,
        }
    }
}

impl DrawOptions {
    pub fn decoration() -> Self {
        Self {
            selectable: false,
            ..Self::default()
        }
    }
}

/// A drawn group; `left`/`top` is its centre
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Drawing {
    pub id: DrawingId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Drawing {
    /// Bounding box of a set of shapes as a drawing
    pub fn enclosing<'a, I>(id: DrawingId, shapes: I) -> Drawing
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        let bounds = shapes.into_iter().map(Shape::bounds).fold(None, |acc: Option<(f64, f64, f64, f64)>, b| {
            Some(match acc {
                None => b,
                Some(a) => (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)),
            })
        });
        let (x0, y0, x1, y1) = bounds.unwrap_or_default();
        Drawing {
            id,
            left: (x0 + x1) / 2.0,
            top: (y0 + y1) / 2.0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Zone covered by the drawing, rounded to pixels
    pub fn zone(&self) -> Zone {
        Zone::from_rect(
            self.left - self.width / 2.0,
            self.top - self.height / 2.0,
            self.width,
            self.height,
        )
    }
}

/// Canvas operations the views rely on
pub trait RenderEngine {
    /// Scaled glyph from the sprite sheet
    fn glyph(&self, name: &str) -> Option<GlyphSprite>;

    /// Glyph scale factor, once computed
    fn scale(&self) -> Option<f64>;

    fn set_scale(&mut self, scale: f64);

    fn draw(&mut self, request: DrawRequest, options: DrawOptions) -> Drawing;

    /// Debug outline of a facsimile zone
    fn outline_bounding_box(&mut self, zone: &Zone, fill: &str) -> DrawingId;

    /// Move a drawing so that its centre is at (`left`, `top`)
    fn move_drawing(&mut self, id: DrawingId, left: f64, top: f64) -> Option<Drawing>;

    fn remove(&mut self, id: DrawingId);

    fn set_active(&mut self, id: DrawingId);

    fn repaint(&mut self);
}

/// Set the global glyph scale from a staff zone: a punctum spans the
/// distance between two staff lines. Keeps an existing scale unless
/// `overwrite` is set.
pub fn calc_scale_from_staff(engine: &mut dyn RenderEngine, zone: &Zone, num_lines: u32, overwrite: bool) {
    if engine.scale().is_some() && !overwrite {
        return;
    }
    if num_lines < 2 {
        return;
    }

    let delta_y = zone.height() as f64 / (num_lines - 1) as f64;
    // sprites come back already scaled, so undo the current factor first
    let current = engine.scale().unwrap_or(1.0);
    let scale = match engine.glyph("punctum") {
        Some(p) if p.height > 0.0 => delta_y / (p.height / current),
        _ => 1.0,
    };
    log::debug!("glyph scale set to {:.3} (delta_y {:.1})", scale, delta_y);
    engine.set_scale(scale);
}
