//! View for systems: staff lines and the debug outline

use crate::error::Result;
use crate::models::System;
use crate::renderers::{DrawOptions, DrawRequest, DrawingId, RenderEngine, Shape};

use super::render_context;

const CONTEXT: &str = "System";

#[derive(Debug, Default, Clone)]
pub struct SystemView {
    pub lines: Option<DrawingId>,
    pub outline: Option<DrawingId>,
}

impl SystemView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the staff lines across the system zone. Staffless systems draw
    /// nothing but still need a render context.
    pub fn render_system(&mut self, system: &System, engine: Option<&mut dyn RenderEngine>) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        if let Some(old) = self.lines.take() {
            engine.remove(old);
        }
        if !system.is_staff() {
            return Ok(());
        }

        let (left, right) = (system.zone.ulx as f64, system.zone.lrx as f64);
        let lines: Vec<Shape> = system
            .line_positions()
            .into_iter()
            .map(|y| Shape::line([left, y, right, y]))
            .collect();

        let drawing = engine.draw(DrawRequest::fixed(lines), DrawOptions::decoration());
        self.lines = Some(drawing.id);
        Ok(())
    }

    pub fn render_system_bounding_box(&mut self, system: &System, engine: &mut dyn RenderEngine) {
        if let Some(old) = self.outline.take() {
            engine.remove(old);
        }
        self.outline = Some(engine.outline_bounding_box(&system.zone, "blue"));
    }

    pub fn erase(&mut self, engine: &mut dyn RenderEngine) {
        for id in [self.lines.take(), self.outline.take()].into_iter().flatten() {
            engine.remove(id);
        }
        engine.repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SystemId, SystemOptions, Zone};
    use crate::renderers::{CanvasSpec, DisplayListEngine, GlyphSet};

    fn engine() -> DisplayListEngine {
        DisplayListEngine::new(CanvasSpec::new("c", 1000, 1000), GlyphSet::new())
    }

    #[test]
    fn test_staff_lines_span_the_zone() {
        let mut e = engine();
        let system = System::new(SystemId(0), Zone::new(50, 100, 850, 160), SystemOptions::staff(4));
        let mut view = SystemView::new();
        view.render_system(&system, Some(&mut e)).unwrap();

        let live = e.live(view.lines.unwrap()).unwrap();
        assert_eq!(live.shapes.len(), 4);
        assert_eq!(live.shapes[0], Shape::line([50.0, 100.0, 850.0, 100.0]));
        assert_eq!(live.shapes[3], Shape::line([50.0, 160.0, 850.0, 160.0]));
        assert!(!live.options.selectable);
    }

    #[test]
    fn test_rerender_replaces_lines() {
        let mut e = engine();
        let system = System::new(SystemId(0), Zone::new(50, 100, 850, 160), SystemOptions::staff(4));
        let mut view = SystemView::new();
        view.render_system(&system, Some(&mut e)).unwrap();
        view.render_system(&system, Some(&mut e)).unwrap();
        assert_eq!(e.live_count(), 1);
    }

    #[test]
    fn test_cheironomic_system_has_no_lines() {
        let mut e = engine();
        let system = System::new(SystemId(0), Zone::new(50, 100, 850, 160), SystemOptions::cheironomic());
        let mut view = SystemView::new();
        view.render_system(&system, Some(&mut e)).unwrap();
        assert!(view.lines.is_none());
        assert_eq!(e.live_count(), 0);
    }

    #[test]
    fn test_erase_removes_outline_too() {
        let mut e = engine();
        let system = System::new(SystemId(0), Zone::new(50, 100, 850, 160), SystemOptions::staff(4));
        let mut view = SystemView::new();
        view.render_system_bounding_box(&system, &mut e);
        view.render_system(&system, Some(&mut e)).unwrap();
        assert_eq!(e.live_count(), 2);
        view.erase(&mut e);
        assert_eq!(e.live_count(), 0);
    }
}
