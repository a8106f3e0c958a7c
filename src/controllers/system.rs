//! Controller for systems

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{System, SystemId};
use crate::renderers::RenderEngine;
use crate::views::{render_context, SystemView};

#[derive(Debug, Default)]
pub struct SystemController {
    views: HashMap<SystemId, SystemView>,
}

impl SystemController {
    /// vRenderSystem: outline first when debugging, then the staff
    pub fn render(&mut self, system: &System, engine: Option<&mut dyn RenderEngine>, debug: bool) -> Result<()> {
        let engine = render_context(engine, "System")?;
        let view = self.views.entry(system.id).or_default();
        if debug {
            view.render_system_bounding_box(system, engine);
        }
        view.render_system(system, Some(engine))
    }

    pub fn render_bounding_box(&mut self, system: &System, engine: Option<&mut dyn RenderEngine>) -> Result<()> {
        let engine = render_context(engine, "System")?;
        self.views
            .entry(system.id)
            .or_default()
            .render_system_bounding_box(system, engine);
        Ok(())
    }

    pub fn erase(&mut self, id: SystemId, engine: Option<&mut dyn RenderEngine>) {
        if let (Some(mut view), Some(engine)) = (self.views.remove(&id), engine) {
            view.erase(engine);
        }
    }

    pub fn view(&self, id: SystemId) -> Option<&SystemView> {
        self.views.get(&id)
    }
}
