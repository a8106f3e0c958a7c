//! View for clefs

use crate::error::{NeonError, Result};
use crate::models::{Clef, System, Zone};
use crate::renderers::{DrawOptions, DrawRequest, RenderEngine, Shape};

use super::{render_context, sprite, DrawingSlots};

const CONTEXT: &str = "Clef";

#[derive(Debug, Default, Clone)]
pub struct ClefView {
    pub slots: DrawingSlots,
}

impl ClefView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the clef glyph centred on the line it marks
    pub fn render_clef(&mut self, clef: &Clef, system: &System, engine: Option<&mut dyn RenderEngine>) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        let glyph = sprite(engine, clef.shape.glyph_name(), CONTEXT)?;

        let x = clef.zone.ulx as f64 + glyph.centre.0;
        let y = system.y_of_system_pos(clef.system_pos(system.num_lines));

        if let Some(old) = self.slots.drawing.take() {
            engine.remove(old.id);
        }
        let options = DrawOptions {
            group: true,
            selectable: clef.interact,
            lock_movement_x: false,
            lock_movement_y: false,
            element: Some(clef.id.clone()),
        };
        self.slots.drawing = Some(engine.draw(DrawRequest::modify(vec![Shape::glyph(&glyph, x, y)]), options));
        Ok(())
    }

    /// Redraw after the clef moved to another line
    pub fn update_system_position(
        &mut self,
        clef: &Clef,
        system: &System,
        engine: &mut dyn RenderEngine,
    ) -> Result<Zone> {
        let drawing = self.slots.drawing.ok_or(NeonError::NoDrawing(CONTEXT))?;
        let y = system.y_of_system_pos(clef.system_pos(system.num_lines));
        let moved = engine
            .move_drawing(drawing.id, drawing.left, y)
            .ok_or(NeonError::NoDrawing(CONTEXT))?;
        self.slots.drawing = Some(moved);
        engine.repaint();
        Ok(moved.zone())
    }

    pub fn render_bounding_box(&mut self, clef: &Clef, engine: &mut dyn RenderEngine) {
        self.slots.outline(engine, &clef.zone, "red");
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
    use crate::models::{ClefShape, ElementId, SystemId, SystemOptions};
    use crate::renderers::{CanvasSpec, DisplayListEngine, GlyphSet, GlyphSprite};

    fn setup() -> (DisplayListEngine, System) {
        let mut glyphs = GlyphSet::new();
        glyphs.insert(GlyphSprite::new("c_clef", 12.0, 20.0));
        glyphs.insert(GlyphSprite::new("punctum", 10.0, 10.0));
        let engine = DisplayListEngine::new(CanvasSpec::new("c", 1000, 1000), glyphs);
        let system = System::new(SystemId(0), Zone::new(0, 100, 800, 160), SystemOptions::staff(4));
        (engine, system)
    }

    #[test]
    fn test_clef_sits_on_its_line() {
        let (mut e, system) = setup();
        let clef = Clef::new(ElementId::from("c1"), ClefShape::C, 3, Zone::new(10, 110, 22, 130));
        let mut view = ClefView::new();
        view.render_clef(&clef, &system, Some(&mut e)).unwrap();
        let d = view.slots.drawing.unwrap();
        // line 3 of 4 is the second line from the top
        assert_eq!((d.left, d.top), (16.0, 120.0));
    }

    #[test]
    fn test_missing_f_clef_glyph_falls_back_to_punctum() {
        let (mut e, system) = setup();
        let clef = Clef::new(ElementId::from("c1"), ClefShape::F, 2, Zone::new(10, 130, 22, 150));
        let mut view = ClefView::new();
        view.render_clef(&clef, &system, Some(&mut e)).unwrap();
        let live = e.live(view.slots.drawing.unwrap().id).unwrap();
        assert!(matches!(&live.shapes[0], Shape::Glyph { glyph, .. } if glyph == "punctum"));
    }

    #[test]
    fn test_move_to_new_line() {
        let (mut e, system) = setup();
        let mut clef = Clef::new(ElementId::from("c1"), ClefShape::C, 3, Zone::new(10, 110, 22, 130));
        let mut view = ClefView::new();
        view.render_clef(&clef, &system, Some(&mut e)).unwrap();

        clef.line = 4;
        let zone = view.update_system_position(&clef, &system, &mut e).unwrap();
        assert_eq!(zone, Zone::new(10, 90, 22, 110));
    }

    #[test]
    fn test_red_outline() {
        let (mut e, _) = setup();
        let clef = Clef::new(ElementId::from("c1"), ClefShape::C, 3, Zone::new(10, 110, 22, 130));
        let mut view = ClefView::new();
        view.render_bounding_box(&clef, &mut e);
        let live = e.live(view.slots.outline.unwrap()).unwrap();
        assert_eq!(live.outline.as_deref(), Some("red"));
    }
}
