//! Controller for custodes

use std::collections::HashMap;

use crate::error::{NeonError, Result};
use crate::models::{Custos, ElementId, System, Zone};
use crate::renderers::RenderEngine;
use crate::views::{render_context, CustosView};

const CONTEXT: &str = "Custos";

#[derive(Debug, Default)]
pub struct CustosController {
    views: HashMap<ElementId, CustosView>,
}

impl CustosController {
    pub fn render(
        &mut self,
        custos: &Custos,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
        debug: bool,
    ) -> Result<()> {
        let engine = render_context(engine, CONTEXT)?;
        let view = self.views.entry(custos.id.clone()).or_default();
        if debug {
            view.render_bounding_box(custos, engine);
        }
        view.render_custos(custos, system, Some(engine))
    }

    pub fn update_system_position(
        &mut self,
        custos: &Custos,
        system: &System,
        engine: Option<&mut dyn RenderEngine>,
    ) -> Result<Zone> {
        let engine = render_context(engine, CONTEXT)?;
        let view = self.views.get_mut(&custos.id).ok_or(NeonError::NoDrawing(CONTEXT))?;
        view.update_system_position(custos, system, engine)
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

    pub fn view(&self, id: &ElementId) -> Option<&CustosView> {
        self.views.get(id)
    }
}
