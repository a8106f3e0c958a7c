//! Controller for divisions

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{Division, ElementId, System};
use crate::renderers::RenderEngine;
use crate::views::{render_context, DivisionView};

#[derive(Debug, Default)]
pub struct DivisionController {
    views: HashMap<ElementId, DivisionView>,
}

impl DivisionController {
    pub fn render(
        &mut self,
        division: &Division,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
        debug: bool,
    ) -> Result<()> {
        let engine = render_context(engine, "Division")?;
        let view = self.views.entry(division.id.clone()).or_default();
        if debug {
            view.render_bounding_box(division, engine);
        }
        view.render_division(division, system, Some(engine))
    }

    pub fn erase(&mut self, id: &ElementId, engine: Option<&mut dyn RenderEngine>) -> bool {
        let Some(mut view) = self.views.remove(id) else {
            return false;
        };
        if let Some(engine) = engine {
            view.erase_drawing(engine);
        }
        true
    }

    pub fn select(&self, id: &ElementId, engine: Option<&mut dyn RenderEngine>) {
        if let (Some(view), Some(engine)) = (self.views.get(id), engine) {
            view.select_drawing(engine);
        }
    }

    pub fn view(&self, id: &ElementId) -> Option<&DivisionView> {
        self.views.get(id)
    }
}
