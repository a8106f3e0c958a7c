//! View for neumes
//!
//! Components are laid out left to right from the zone's left edge. On a
//! staff each component sits on its own staff position; on a staffless
//! system the whole neume is centred vertically in its zone.

use crate::error::{NeonError, Result};
use crate::models::{Neume, System, Zone};
use crate::renderers::{DrawOptions, DrawRequest, RenderEngine, Shape};

use super::{ledger_lines, render_context, sprite, DrawingSlots};

const CONTEXT: &str = "Neume";

#[derive(Debug, Default, Clone)]
pub struct NeumeView {
    pub slots: DrawingSlots,
}

impl NeumeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_neume(
        &mut self,
        neume: &Neume,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
    ) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        let (glyphs, ledgers) = self.layout(neume, system, engine)?;

        if let Some(old) = self.slots.drawing.take() {
            engine.remove(old.id);
        }
        self.slots.draw_ledger_lines(engine, ledgers);

        let options = DrawOptions {
            group: true,
            selectable: neume.interact,
            lock_movement_x: false,
            lock_movement_y: false,
            element: Some(neume.id.clone()),
        };
        self.slots.drawing = Some(engine.draw(DrawRequest::modify(glyphs), options));
        Ok(())
    }

    /// Redraw after a vertical move; returns the new zone of the drawing
    pub fn update_system_position(
        &mut self,
        neume: &Neume,
        system: &System,
        engine: &mut dyn RenderEngine,
    ) -> Result<Zone> {
        if self.slots.drawing.is_none() {
            return Err(NeonError::NoDrawing(CONTEXT));
        }
        self.render_neume(neume, system, Some(&mut *engine))?;
        engine.repaint();

        self.slots
            .drawing
            .map(|d| d.zone())
            .ok_or(NeonError::NoDrawing(CONTEXT))
    }

    pub fn render_bounding_box(&mut self, neume: &Neume, engine: &mut dyn RenderEngine) {
        self.slots.outline(engine, &neume.zone, "green");
    }

    pub fn erase_drawing(&mut self, engine: &mut dyn RenderEngine) {
        self.slots.erase(engine);
    }

    pub fn select_drawing(&self, engine: &mut dyn RenderEngine) {
        self.slots.select(engine);
    }

    /// Glyph shapes and ledger lines for every component
    fn layout(
        &self,
        neume: &Neume,
        system: &System,
        engine: &dyn RenderEngine,
    ) -> Result<(Vec<Shape>, Vec<Shape>)> {
        let mut glyphs = Vec::with_capacity(neume.components.len());
        let mut ledgers = Vec::new();
        let mut x = neume.zone.ulx as f64;

        for component in &neume.components {
            let head = sprite(engine, component.head.glyph_name(), CONTEXT)?;
            let centre_x = x + head.centre.0;

            let centre_y = if system.is_staff() {
                let pos = neume.root_system_pos + component.pitch_diff;
                ledgers.extend(ledger_lines(system, pos, centre_x, 0.75 * head.width));
                system.y_of_system_pos(pos)
            } else {
                neume.zone.centre().1
            };
            glyphs.push(Shape::glyph(&head, centre_x, centre_y));

            if component.dot.is_some() {
                if let Some(dot) = engine.glyph("dot") {
                    glyphs.push(Shape::glyph(&dot, centre_x + head.width, centre_y));
                }
            }

            // a podatus stacks its upper note over the lower one
            let podatus = system.is_staff()
                && neume.components.len() == 2
                && neume.components[1].pitch_diff > neume.components[0].pitch_diff;
            if !podatus {
                x += head.width;
            }
        }

        Ok((glyphs, ledgers))
    }
}
