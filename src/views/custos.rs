//! View for the custos

use crate::error::{NeonError, Result};
use crate::models::{Custos, System, Zone};
use crate::renderers::{DrawOptions, DrawRequest, RenderEngine, Shape};

use super::{ledger_lines, render_context, sprite, DrawingSlots};

const CONTEXT: &str = "Custos";

#[derive(Debug, Default, Clone)]
pub struct CustosView {
    pub slots: DrawingSlots,
}

impl CustosView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the custos on its staff, with ledger lines when it sits above or
    /// below the staff
    pub fn render_custos(
        &mut self,
        custos: &Custos,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
    ) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        let glyph = sprite(engine, "custos", CONTEXT)?;

        let custos_y = system.y_of_system_pos(custos.root_system_pos);
        let nc_x = custos.zone.ulx as f64 + glyph.centre.0;
        let shape = Shape::glyph(&glyph, nc_x, custos_y - glyph.centre.1 / 2.0);

        if let Some(old) = self.slots.drawing.take() {
            engine.remove(old.id);
        }
        let lines = ledger_lines(system, custos.root_system_pos, nc_x, 0.75 * 4.0 * glyph.centre.0);
        self.slots.draw_ledger_lines(engine, lines);

        let options = DrawOptions {
            group: true,
            selectable: custos.interact,
            lock_movement_x: true,
            lock_movement_y: true,
            element: Some(custos.id.clone()),
        };
        self.slots.drawing = Some(engine.draw(DrawRequest::modify(vec![shape]), options));
        Ok(())
    }

    pub fn render_bounding_box(&mut self, custos: &Custos, engine: &mut dyn RenderEngine) {
        self.slots.outline(engine, &custos.zone, "purple");
    }

    /// Move the drawing to the custos' current staff position. Returns the
    /// zone the drawing now covers so the model can be updated.
    pub fn update_system_position(
        &mut self,
        custos: &Custos,
        system: &System,
        engine: &mut dyn RenderEngine,
    ) -> Result<Zone> {
        let drawing = self.slots.drawing.ok_or(NeonError::NoDrawing(CONTEXT))?;
        self.slots.remove_ledger_lines(engine);

        let glyph_top = system.y_of_system_pos(custos.root_system_pos) - drawing.height / 4.0;
        let moved = engine
            .move_drawing(drawing.id, drawing.left, glyph_top)
            .ok_or(NeonError::NoDrawing(CONTEXT))?;
        self.slots.drawing = Some(moved);

        let lines = ledger_lines(system, custos.root_system_pos, moved.left, 1.5 * moved.width * 0.75);
        self.slots.draw_ledger_lines(engine, lines);

        engine.repaint();
        Ok(moved.zone())
    }

    pub fn erase_drawing(&mut self, engine: &mut dyn RenderEngine) {
        self.slots.erase(engine);
    }

    pub fn select_drawing(&self, engine: &mut dyn RenderEngine) {
        self.slots.select(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementId, SystemId, SystemOptions};
    use crate::renderers::{CanvasSpec, DisplayListEngine, GlyphSet, GlyphSprite};

    fn setup() -> (DisplayListEngine, System, Custos) {
        let mut glyphs = GlyphSet::new();
        glyphs.insert(GlyphSprite::new("custos", 8.0, 20.0));
        let engine = DisplayListEngine::new(CanvasSpec::new("c", 1000, 1000), glyphs);
        let system = System::new(SystemId(0), Zone::new(0, 100, 800, 160), SystemOptions::staff(4));
        let mut custos = Custos::new(ElementId::from("cu1"), Zone::new(780, 120, 788, 140), None);
        custos.root_system_pos = -2;
        (engine, system, custos)
    }

    #[test]
    fn test_render_without_context_fails() {
        let (_, system, custos) = setup();
        let mut view = CustosView::new();
        let err = view.render_custos(&custos, &system, None).unwrap_err();
        assert_eq!(err.to_string(), "Custos: Invalid render context");
    }

    #[test]
    fn test_render_places_glyph_on_staff_position() {
        let (mut engine, system, custos) = setup();
        let mut view = CustosView::new();
        view.render_custos(&custos, &system, Some(&mut engine)).unwrap();

        let drawing = view.slots.drawing.unwrap();
        // x: ulx + centre; y: line at -2 (120) minus a quarter glyph
        assert_eq!(drawing.left, 784.0);
        assert_eq!(drawing.top, 115.0);
        assert!(view.slots.ledger_lines.is_none());
    }

    #[test]
    fn test_update_requires_drawing() {
        let (mut engine, system, custos) = setup();
        let mut view = CustosView::new();
        let err = view.update_system_position(&custos, &system, &mut engine).unwrap_err();
        assert!(matches!(err, NeonError::NoDrawing("Custos")));
    }

    #[test]
    fn test_update_moves_and_adds_ledger_lines() {
        let (mut engine, system, mut custos) = setup();
        let mut view = CustosView::new();
        view.render_custos(&custos, &system, Some(&mut engine)).unwrap();

        custos.root_system_pos = 2;
        let zone = view.update_system_position(&custos, &system, &mut engine).unwrap();
        // y of position 2 is 80; top = 80 - 20/4
        assert_eq!(view.slots.drawing.unwrap().top, 75.0);
        assert_eq!(zone, Zone::new(780, 65, 788, 85));
        assert!(view.slots.ledger_lines.is_some());
    }

    #[test]
    fn test_erase_removes_everything() {
        let (mut engine, system, mut custos) = setup();
        custos.root_system_pos = 3;
        let mut view = CustosView::new();
        view.render_custos(&custos, &system, Some(&mut engine)).unwrap();
        view.render_bounding_box(&custos, &mut engine);
        assert_eq!(engine.live_count(), 3);

        view.erase_drawing(&mut engine);
        assert_eq!(engine.live_count(), 0);
    }
}
