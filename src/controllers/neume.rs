//! Controller for neumes

use std::collections::HashMap;

use crate::error::{NeonError, Result};
use crate::models::{ElementId, Neume, System, Zone};
use crate::renderers::RenderEngine;
use crate::views::{render_context, NeumeView};

const CONTEXT: &str = "Neume";

#[derive(Debug, Default)]
pub struct NeumeController {
    views: HashMap<ElementId, NeumeView>,
}

impl NeumeController {
    pub fn render(
        &mut self,
        neume: &Neume,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
        debug: bool,
    ) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        let view = self.views.entry(neume.id.clone()).or_default();
        if debug {
            view.render_bounding_box(neume, engine);
        }
        view.render_neume(neume, system, Some(engine))
    }

    pub fn update_system_position(
        &mut self,
        neume: &Neume,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
    ) -> Result<Zone> {
        let engine = render_context(engine, CONTEXT)?;
        let view = self.views.get_mut(&neume.id).ok_or(NeonError::NoDrawing(CONTEXT))?;
        view.update_system_position(neume, system, engine)
    }

    /// Drop the view, erasing its drawings. False when nothing was drawn.
    pub fn erase(&mut self, id: &ElementId, engine: Option<&mut dyn RenderEngine>) -> bool {
        match self.views.remove(id) {
            Some(mut view) => {
                if let Some(engine) = engine {
                    view.erase_drawing(engine);
                }
                true
            }
            None => false,
        }
    }

    pub fn select(&self, id: &ElementId, engine: Option<&mut dyn RenderEngine>) {
        if let (Some(view), Some(engine)) = (self.views.get(id), engine) {
            view.select_drawing(engine);
        }
    }

    pub fn view(&self, id: &ElementId) -> Option<&NeumeView> {
        self.views.get(id)
    }
}
