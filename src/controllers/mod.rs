//! Controllers: route model events to the views
//!
//! The [`Dispatcher`] drains the page's event queue. Every event is handed to
//! the controller that owns the view for its target; geometry the views
//! report back is queued as [`ModelEvent::UpdateBoundingBox`] and applied to
//! the page on the same drain.

pub mod clef;
pub mod custos;
pub mod division;
pub mod neume;
pub mod system;

pub use clef::ClefController;
pub use custos::CustosController;
pub use division::DivisionController;
pub use neume::NeumeController;
pub use system::SystemController;

use crate::error::{NeonError, Result};
use crate::events::ModelEvent;
use crate::models::{ElementId, Glyph, GlyphKind, Page, System};
use crate::renderers::RenderEngine;

/// Reborrow an optional engine for a single call
pub(crate) fn reborrow<'a>(engine: &'a mut Option<&mut dyn RenderEngine>) -> Option<&'a mut dyn RenderEngine> {
    match engine {
        Some(engine) => Some(&mut **engine),
        None => None,
    }
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    pub systems: SystemController,
    pub neumes: NeumeController,
    pub custodes: CustosController,
    pub clefs: ClefController,
    pub divisions: DivisionController,
    /// Outline bounding boxes while rendering
    pub debug: bool,
}

impl Dispatcher {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            ..Self::default()
        }
    }

    /// Handle events until the queue is empty. Returns how many were handled.
    /// Events about glyphs or systems that are gone by the time they are
    /// handled are skipped.
    pub fn dispatch(&mut self, page: &mut Page, mut engine: Option<&mut dyn RenderEngine>) -> Result<usize> {
        let mut handled = 0;
        while let Some(event) = page.next_event() {
            let name = event.name();
            log::trace!("dispatch {}", name);
            match self.handle(page, event, reborrow(&mut engine)) {
                Ok(()) => handled += 1,
                Err(err @ (NeonError::UnknownElement(_) | NeonError::UnknownSystem(_))) => {
                    log::warn!("skipping stale {}: {}", name, err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(handled)
    }

    fn handle(&mut self, page: &mut Page, event: ModelEvent, mut engine: Option<&mut dyn RenderEngine>) -> Result<()> {
        let debug = self.debug;
        match event {
            ModelEvent::RenderSystem(id) => self.systems.render(page.system(id)?, engine, debug),
            ModelEvent::RenderSystemBoundingBox(id) => {
                self.systems.render_bounding_box(page.system(id)?, engine)
            }
            ModelEvent::EraseSystem(id) => {
                self.systems.erase(id, engine);
                Ok(())
            }
            ModelEvent::RenderNeume(id) => {
                let neume = page.neume(&id)?;
                let system = owning_system(page, &id)?;
                self.neumes.render(neume, system, engine, debug)
            }
            ModelEvent::RenderCustos(id) => {
                let custos = page.custos(&id)?;
                let system = owning_system(page, &id)?;
                self.custodes.render(custos, system, engine, debug)
            }
            ModelEvent::RenderClef(id) => {
                let clef = page.clef(&id)?;
                let system = owning_system(page, &id)?;
                self.clefs.render(clef, system, engine, debug)
            }
            ModelEvent::RenderDivision(id) => {
                let division = page.division(&id)?;
                let system = owning_system(page, &id)?;
                self.divisions.render(division, system, engine, debug)
            }
            ModelEvent::UpdateSystemPosition(id) => {
                let system = owning_system(page, &id)?;
                let zone = match page.glyph(&id) {
                    Some(Glyph::Neume(neume)) => self.neumes.update_system_position(neume, system, engine)?,
                    Some(Glyph::Custos(custos)) => self.custodes.update_system_position(custos, system, engine)?,
                    Some(Glyph::Clef(clef)) => self.clefs.update_system_position(clef, system, engine)?,
                    Some(Glyph::Division(_)) => return Ok(()),
                    None => return Err(NeonError::UnknownElement(id)),
                };
                page.events_mut().fire(ModelEvent::UpdateBoundingBox(id, zone));
                Ok(())
            }
            ModelEvent::EraseDrawing(id) => {
                let erased = self.neumes.erase(&id, reborrow(&mut engine))
                    || self.custodes.erase(&id, reborrow(&mut engine))
                    || self.clefs.erase(&id, reborrow(&mut engine))
                    || self.divisions.erase(&id, reborrow(&mut engine));
                if !erased {
                    log::debug!("nothing drawn for {}", id);
                }
                Ok(())
            }
            ModelEvent::SelectDrawing(id) => {
                match page.glyph(&id).map(Glyph::kind) {
                    Some(GlyphKind::Neume) => self.neumes.select(&id, engine),
                    Some(GlyphKind::Custos) => self.custodes.select(&id, engine),
                    Some(GlyphKind::Clef) => self.clefs.select(&id, engine),
                    Some(GlyphKind::Division) => self.divisions.select(&id, engine),
                    None => return Err(NeonError::UnknownElement(id)),
                }
                Ok(())
            }
            ModelEvent::UpdateBoundingBox(id, zone) => page.update_bounding_box(&id, zone),
        }
    }
}

fn owning_system<'p>(page: &'p Page, id: &ElementId) -> Result<&'p System> {
    let glyph = page
        .glyph(id)
        .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
    let system = glyph
        .system()
        .ok_or_else(|| NeonError::invalid(glyph.kind().as_str(), "element is not mounted"))?;
    page.system(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AddOptions, Clef, ClefShape, Custos, HeadShape, Neume, Pitch, PitchName, SystemOptions, Zone,
    };
    use crate::renderers::{CanvasSpec, DisplayListEngine, GlyphSet, GlyphSprite};

    fn engine() -> DisplayListEngine {
        let mut glyphs = GlyphSet::new();
        for (name, w, h) in [("punctum", 10.0, 10.0), ("custos", 8.0, 20.0), ("c_clef", 12.0, 20.0)] {
            glyphs.insert(GlyphSprite::new(name, w, h));
        }
        DisplayListEngine::new(CanvasSpec::new("neon-canvas", 1000, 1000), glyphs)
    }

    fn page() -> Page {
        let mut page = Page::new();
        let s = page.add_system(Zone::new(0, 100, 800, 160), SystemOptions::staff(4));
        let clef = Clef::new(ElementId::from("clef"), ClefShape::C, 4, Zone::new(5, 90, 17, 110));
        page.add_clef(s, clef, AddOptions::just_push()).unwrap();
        let n = Neume::punctum(
            ElementId::from("n1"),
            Zone::new(100, 95, 110, 105),
            HeadShape::Punctum,
            Some(Pitch::new(PitchName::C, 4)),
        );
        page.add_neume(s, n, AddOptions::just_push()).unwrap();
        let c = Custos::new(ElementId::from("cu"), Zone::new(780, 95, 788, 105), Some(Pitch::new(PitchName::C, 4)));
        page.add_custos(s, c, AddOptions::just_push()).unwrap();
        page
    }

    #[test]
    fn test_stale_events_do_not_block_the_queue() {
        let mut page = page();
        let mut e = engine();
        let mut dispatcher = Dispatcher::new(false);
        page.events_mut().fire(ModelEvent::RenderNeume(ElementId::from("gone")));
        page.events_mut().fire(ModelEvent::RenderCustos(ElementId::from("cu")));

        let handled = dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();
        assert_eq!(handled, 5);
        assert!(page.events().is_empty());
    }

    #[test]
    fn test_dispatch_renders_everything() {
        let mut page = page();
        let mut e = engine();
        let mut dispatcher = Dispatcher::new(false);
        let handled = dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();
        assert_eq!(handled, 4);
        assert!(page.events().is_empty());
        // staff lines, clef, neume, custos
        assert_eq!(e.live_count(), 4);
    }

    #[test]
    fn test_debug_adds_outlines() {
        let mut page = page();
        let mut e = engine();
        let mut dispatcher = Dispatcher::new(true);
        dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();
        assert_eq!(e.live_count(), 8);
    }

    #[test]
    fn test_dispatch_without_engine_fails() {
        let mut page = page();
        let mut dispatcher = Dispatcher::new(false);
        let err = dispatcher.dispatch(&mut page, None).unwrap_err();
        assert_eq!(err.to_string(), "System: Invalid render context");
    }

    #[test]
    fn test_custos_move_feeds_zone_back() {
        let mut page = page();
        let mut e = engine();
        let mut dispatcher = Dispatcher::new(false);
        dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();

        let id = ElementId::from("cu");
        page.update_custos_system_pos(&id, -6).unwrap();
        // update position, then the bounding box coming back from the view
        assert_eq!(dispatcher.dispatch(&mut page, Some(&mut e)).unwrap(), 2);
        let custos = page.custos(&id).unwrap();
        assert_eq!(custos.pitch, Some(Pitch::new(PitchName::D, 3)));
        // bottom line is at 160; top = 160 - 20/4, centre-origin drawing
        assert_eq!(custos.zone, Zone::new(780, 145, 788, 165));
    }

    #[test]
    fn test_remove_erases_view() {
        let mut page = page();
        let mut e = engine();
        let mut dispatcher = Dispatcher::new(false);
        dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();

        page.remove_element(&ElementId::from("n1")).unwrap();
        dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();
        assert_eq!(e.live_count(), 3);
        assert!(dispatcher.neumes.view(&ElementId::from("n1")).is_none());
    }

    #[test]
    fn test_select_marks_active_drawing() {
        let mut page = page();
        let mut e = engine();
        let mut dispatcher = Dispatcher::new(false);
        dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();

        page.select(&ElementId::from("n1")).unwrap();
        dispatcher.dispatch(&mut page, Some(&mut e)).unwrap();
        let drawing = dispatcher.neumes.view(&ElementId::from("n1")).unwrap().slots.drawing.unwrap();
        assert_eq!(e.active(), Some(drawing.id));
    }
}
