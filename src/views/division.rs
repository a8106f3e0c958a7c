//! View for divisions
//!
//! Divisions are drawn as vertical strokes. Their length depends on the
//! form: a small division is a tick across the top of the staff, a minor one
//! covers the middle half, major and final divisions cover the whole staff
//! and a final division is doubled.

use crate::error::Result;
use crate::models::{Division, DivisionForm, System};
use crate::renderers::{DrawOptions, DrawRequest, RenderEngine, Shape};

use super::{render_context, DrawingSlots};

const CONTEXT: &str = "Division";

#[derive(Debug, Default, Clone)]
pub struct DivisionView {
    pub slots: DrawingSlots,
}

impl DivisionView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_division(
        &mut self,
        division: &Division,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
    ) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        let strokes = strokes(division, system);

        if let Some(old) = self.slots.drawing.take() {
            engine.remove(old.id);
        }
        let options = DrawOptions {
            group: true,
            selectable: division.interact,
            lock_movement_x: false,
            lock_movement_y: true,
            element: Some(division.id.clone()),
        };
        self.slots.drawing = Some(engine.draw(DrawRequest::modify(strokes), options));
        Ok(())
    }

    pub fn render_bounding_box(&mut self, division: &Division, engine: &mut dyn RenderEngine) {
        self.slots.outline(engine, &division.zone, "yellow");
    }

    pub fn erase_drawing(&mut self, engine: &mut dyn RenderEngine) {
        self.slots.erase(engine);
    }

    pub fn select_drawing(&self, engine: &mut dyn RenderEngine) {
        self.slots.select(engine);
    }
}

fn strokes(division: &Division, system: &System) -> Vec<Shape> {
    // staffless systems take the extent of the division's own zone
    let (top, bottom, gap) = if system.is_staff() {
        (
            system.y_of_system_pos(0),
            system.y_of_system_pos(system.bottom_system_pos()),
            system.delta_y / 2.0,
        )
    } else {
        (division.zone.uly as f64, division.zone.lry as f64, 4.0)
    };
    let height = bottom - top;
    let x = division.zone.ulx as f64;

    let stroke = |x: f64, y1: f64, y2: f64| Shape::line([x, y1, x, y2]);
    match division.form {
        DivisionForm::Small => vec![stroke(x, top - height / 8.0, top + height / 8.0)],
        DivisionForm::Minor => vec![stroke(x, top + height / 4.0, top + 3.0 * height / 4.0)],
        DivisionForm::Major => vec![stroke(x, top, bottom)],
        DivisionForm::Final => {
            let second = (division.zone.lrx as f64).max(x + gap);
            vec![stroke(x, top, bottom), stroke(second, top, bottom)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementId, SystemId, SystemOptions, Zone};
    use crate::renderers::{CanvasSpec, DisplayListEngine, GlyphSet};

    fn staff() -> System {
        System::new(SystemId(0), Zone::new(0, 100, 800, 180), SystemOptions::staff(5))
    }

    #[test]
    fn test_major_division_spans_staff() {
        let d = Division::new(ElementId::from("d"), Zone::new(300, 100, 302, 180), DivisionForm::Major);
        assert_eq!(strokes(&d, &staff()), vec![Shape::line([300.0, 100.0, 300.0, 180.0])]);
    }

    #[test]
    fn test_minor_division_covers_middle_half() {
        let d = Division::new(ElementId::from("d"), Zone::new(300, 120, 302, 160), DivisionForm::Minor);
        assert_eq!(strokes(&d, &staff()), vec![Shape::line([300.0, 120.0, 300.0, 160.0])]);
    }

    #[test]
    fn test_final_division_is_doubled() {
        let d = Division::new(ElementId::from("d"), Zone::new(300, 100, 300, 180), DivisionForm::Final);
        let s = strokes(&d, &staff());
        assert_eq!(s.len(), 2);
        // lines are 20px apart, so the second stroke is half a space away
        assert_eq!(s[1], Shape::line([310.0, 100.0, 310.0, 180.0]));
    }

    #[test]
    fn test_staffless_division_uses_zone() {
        let system = System::new(SystemId(0), Zone::new(0, 100, 800, 180), SystemOptions::cheironomic());
        let d = Division::new(ElementId::from("d"), Zone::new(300, 110, 302, 150), DivisionForm::Major);
        assert_eq!(strokes(&d, &system), vec![Shape::line([300.0, 110.0, 300.0, 150.0])]);
    }

    #[test]
    fn test_render_and_erase() {
        let mut e = DisplayListEngine::new(CanvasSpec::new("c", 1000, 1000), GlyphSet::new());
        let d = Division::new(ElementId::from("d"), Zone::new(300, 100, 302, 180), DivisionForm::Small);
        let mut view = DivisionView::new();
        assert!(view.render_division(&d, &staff(), None).is_err());

        view.render_division(&d, &staff(), Some(&mut e)).unwrap();
        view.render_bounding_box(&d, &mut e);
        assert_eq!(e.live_count(), 2);
        view.erase_drawing(&mut e);
        assert_eq!(e.live_count(), 0);
    }
}
