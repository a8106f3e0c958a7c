//! Views: one per drawn model object
//!
//! A view remembers the drawings it created so it can move, select or erase
//! them later. It never mutates the model; geometry changes are reported back
//! as zones that the controllers apply.

pub mod clef;
pub mod custos;
pub mod division;
pub mod neume;
pub mod system;

pub use clef::ClefView;
pub use custos::CustosView;
pub use division::DivisionView;
pub use neume::NeumeView;
pub use system::SystemView;

use crate::error::{NeonError, Result};
use crate::models::System;
use crate::renderers::{DrawOptions, DrawRequest, Drawing, DrawingId, GlyphSprite, RenderEngine, Shape};

/// Fail with "invalid render context" when no canvas is attached yet
pub fn render_context<'a>(
    engine: Option<&'a mut dyn RenderEngine>,
    context: &'static str,
) -> Result<&'a mut dyn RenderEngine> {
    engine.ok_or(NeonError::InvalidRenderContext(context))
}

/// Sprite by name, falling back to a plain punctum
pub(crate) fn sprite(engine: &dyn RenderEngine, name: &str, context: &'static str) -> Result<GlyphSprite> {
    engine
        .glyph(name)
        .or_else(|| {
            log::warn!("{}: no glyph '{}', drawing a punctum instead", context, name);
            engine.glyph("punctum")
        })
        .ok_or_else(|| NeonError::invalid(context, &format!("glyph '{}' is not loaded", name)))
}

/// Ledger lines for a glyph at `system_pos` centred on `centre`, reaching
/// `width` to each side. Above the staff they run from the top line up to
/// the glyph; below it from the bottom line down.
pub fn ledger_lines(system: &System, system_pos: i32, centre: f64, width: f64) -> Vec<Shape> {
    let mut ledgers = Vec::new();
    if !system.is_staff() {
        return ledgers;
    }

    let line = |i: i32| {
        let y = system.y_of_system_pos(i);
        Shape::line([centre - width, y, centre + width, y])
    };

    let bottom = system.bottom_system_pos();
    if system_pos > 0 {
        let mut i = 0;
        while i <= system_pos {
            ledgers.push(line(i));
            i += 2;
        }
    } else if system_pos < bottom {
        let mut i = bottom;
        while i >= system_pos {
            ledgers.push(line(i));
            i -= 2;
        }
    }
    ledgers
}

/// Drawings shared by every glyph view
#[derive(Debug, Default, Clone)]
pub struct DrawingSlots {
    pub drawing: Option<Drawing>,
    pub ledger_lines: Option<DrawingId>,
    pub outline: Option<DrawingId>,
}

impl DrawingSlots {
    /// Draw ledger lines as their own unselectable group
    pub fn draw_ledger_lines(&mut self, engine: &mut dyn RenderEngine, shapes: Vec<Shape>) {
        self.remove_ledger_lines(engine);
        if shapes.is_empty() {
            return;
        }
        let drawing = engine.draw(DrawRequest::fixed(shapes), DrawOptions::decoration());
        self.ledger_lines = Some(drawing.id);
    }

    pub fn remove_ledger_lines(&mut self, engine: &mut dyn RenderEngine) {
        if let Some(id) = self.ledger_lines.take() {
            engine.remove(id);
        }
    }

    pub fn outline(&mut self, engine: &mut dyn RenderEngine, zone: &crate::models::Zone, fill: &str) {
        if let Some(id) = self.outline.take() {
            engine.remove(id);
        }
        self.outline = Some(engine.outline_bounding_box(zone, fill));
    }

    /// Remove everything this view drew and repaint
    pub fn erase(&mut self, engine: &mut dyn RenderEngine) {
        if let Some(drawing) = self.drawing.take() {
            engine.remove(drawing.id);
        }
        self.remove_ledger_lines(engine);
        if let Some(id) = self.outline.take() {
            engine.remove(id);
        }
        engine.repaint();
    }

    pub fn select(&self, engine: &mut dyn RenderEngine) {
        if let Some(drawing) = &self.drawing {
            engine.set_active(drawing.id);
        }
    }
}
