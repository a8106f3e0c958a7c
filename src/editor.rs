//! One editor instance: page model, canvas and MEI document
//!
//! The host fetches the glyph sprite sheet and the MEI file itself and hands
//! the responses in. Each load round is tagged with a [`LoadTicket`]; a
//! response carrying an older ticket arrived after a reload and is dropped.
//! Once every response is in, the host calls [`Editor::loaded`].
//!
//! Editing operations change the page model, drain its events into the
//! canvas and write the same change into the MEI document when there is one.
//! The canvas operations they produced are collected with
//! [`Editor::take_display_list`].

use serde::{Deserialize, Serialize};

use crate::config::{NeonSettings, Notation};
use crate::controllers::Dispatcher;
use crate::error::{MeiError, NeonError, Result};
use crate::events::ModelEvent;
use crate::mei::{calc_page_dimensions, load_page, ClefDeletion, LoadOptions, ModifyDocument};
use crate::models::{
    AddOptions, ClefShape, Clef, Custos, Division, DivisionForm, ElementId, Glyph, GlyphKind, HeadShape, Neume,
    NeumeComponent, NeumeType, Page, PitchUpdate, SystemId, SystemOptions, Zone,
};
use crate::renderers::{calc_scale_from_staff, CanvasSpec, DisplayList, DisplayListEngine, GlyphSet, RenderEngine};

/// Tag of one load round
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct LoadTicket(pub u32);

#[derive(Debug)]
pub struct Editor {
    settings: NeonSettings,
    page: Page,
    dispatcher: Dispatcher,
    engine: Option<DisplayListEngine>,
    glyphs: Option<GlyphSet>,
    mei: Option<ModifyDocument>,
    generation: u32,
}

impl Editor {
    pub fn new(settings: NeonSettings) -> Self {
        let dispatcher = Dispatcher::new(settings.debug);
        let page = fresh_page(&settings);
        Self {
            settings,
            page,
            dispatcher,
            engine: None,
            glyphs: None,
            mei: None,
            generation: 0,
        }
    }

    pub fn settings(&self) -> &NeonSettings {
        &self.settings
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn engine(&self) -> Option<&DisplayListEngine> {
        self.engine.as_ref()
    }

    pub fn mei(&self) -> Option<&ModifyDocument> {
        self.mei.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    // --- loading ---

    /// Start a load round. Everything loaded so far is dropped.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.page = fresh_page(&self.settings);
        self.dispatcher = Dispatcher::new(self.settings.debug);
        self.engine = None;
        self.glyphs = None;
        self.mei = None;
        LoadTicket(self.generation)
    }

    fn is_current(&self, ticket: LoadTicket, what: &str) -> bool {
        if ticket.0 == self.generation {
            return true;
        }
        log::warn!(
            "ignoring stale {} response (ticket {}, current {})",
            what,
            ticket.0,
            self.generation
        );
        false
    }

    /// Sprite sheet response. Returns false when the ticket is stale.
    pub fn set_glyphs(&mut self, ticket: LoadTicket, svg: &str) -> Result<bool> {
        if !self.is_current(ticket, "glyph") {
            return Ok(false);
        }
        log::info!("loading SVG glyphs ...");
        self.glyphs = Some(GlyphSet::from_svg(svg)?);
        Ok(true)
    }

    /// MEI response: the page takes the size of the facsimile. Returns false
    /// when the ticket is stale.
    pub fn set_mei(&mut self, ticket: LoadTicket, text: &str) -> Result<bool> {
        if !self.is_current(ticket, "MEI") {
            return Ok(false);
        }
        log::info!("loading MEI file ...");
        let mei = ModifyDocument::parse(text)?;
        calc_page_dimensions(mei.document(), &mut self.page)?;
        self.mei = Some(mei);
        Ok(true)
    }

    /// Every response is in: create the canvas and, with auto load on,
    /// build and draw the page from the MEI document
    pub fn loaded(&mut self) -> Result<DisplayList> {
        if self.engine.is_some() {
            return Err(NeonError::invalid("Editor", "already loaded, start a new load round first"));
        }
        let (width, height) = self.page.dimensions().ok_or(NeonError::DimensionsNotSet)?;

        let canvas = CanvasSpec::new(self.settings.canvas_id(), width, height);
        let mut engine = DisplayListEngine::new(canvas, self.glyphs.clone().unwrap_or_default());

        if self.settings.auto_load {
            match &self.mei {
                Some(mei) => {
                    let options = LoadOptions {
                        notation: self.settings.notation,
                        num_lines: self.settings.num_lines,
                    };
                    let summary = load_page(mei.document(), &mut self.page, &options)?;
                    if let Some(zone) = summary.first_system_zone {
                        calc_scale_from_staff(&mut engine, &zone, self.settings.num_lines, true);
                    }
                }
                None => log::warn!("auto load is on but no MEI document arrived"),
            }
        }

        self.engine = Some(engine);
        self.redraw()?;
        log::info!("Load successful. Neon ready.");
        self.take_display_list()
    }

    /// Canvas operations recorded since the last call
    pub fn take_display_list(&mut self) -> Result<DisplayList> {
        self.engine
            .as_mut()
            .map(DisplayListEngine::take_commands)
            .ok_or(NeonError::InvalidRenderContext("Editor"))
    }

    /// Current MEI document as text
    pub fn mei_text(&self) -> Result<Option<String>> {
        Ok(self.mei.as_ref().map(ModifyDocument::to_xml_string).transpose()?)
    }

    // --- neumes ---

    /// Place a punctum; its pitch follows from where it lands on the staff
    pub fn insert_punctum(&mut self, zone: Zone) -> Result<ElementId> {
        self.transact(|editor| {
            let (system, anchor) = editor.placement(&zone)?;
            let id = editor
                .sync(|mei| mei.insert_punctum(anchor.as_deref(), None, None, zone))?
                .unwrap_or_else(ElementId::generate);

            let punctum = Neume::punctum(id.clone(), zone, HeadShape::Punctum, None);
            editor.page.add_neume(system, punctum, AddOptions::default())?;
            editor.sync_pitches(&id)?;
            editor.redraw()?;
            Ok(id)
        })
    }

    /// Move a neume up (positive) or down by `steps` staff positions
    pub fn move_neume(&mut self, id: &ElementId, steps: i32) -> Result<()> {
        self.transact(|editor| {
            editor.page.shift_neume(id, steps)?;
            editor.redraw()?;

            let neume = editor.page.neume(id)?;
            let pitches = neume.pitches();
            let zone = neume.zone;
            let anchor = editor.anchor_after(id)?;
            editor.sync(|mei| mei.move_neume(id.as_str(), anchor.as_deref(), pitches.as_deref(), zone))?;
            Ok(())
        })
    }

    /// Drag a neume along its system to `zone`. The neume keeps its staff
    /// position, so crossing a clef changes its pitch. Returns every pitch
    /// that changed on the staff.
    pub fn drag_neume(&mut self, id: &ElementId, zone: Zone) -> Result<Vec<PitchUpdate>> {
        self.transact(|editor| {
            editor.page.neume(id)?;
            let system = editor.page.move_element(id, zone)?;
            let updates = editor.page.refresh_pitches(system)?;
            editor.redraw()?;

            let neume = editor.page.neume(id)?;
            let pitches = neume.pitches();
            let zone = neume.zone;
            let anchor = editor.anchor_after(id)?;
            editor.sync(|mei| {
                mei.move_neume(id.as_str(), anchor.as_deref(), pitches.as_deref(), zone)?;
                mei.update_pitched_elements(&updates)
            })?;
            Ok(updates)
        })
    }

    pub fn update_neume_head_shape(&mut self, id: &ElementId, shape: HeadShape) -> Result<()> {
        self.transact(|editor| {
            editor.page.update_neume(id, |neume| {
                neume.name = shape.neume_name().to_string();
                if let Some(first) = neume.components.first_mut() {
                    first.head = shape;
                }
            })?;
            editor.redraw()?;

            let zone = editor.page.neume(id)?.zone;
            editor.sync(|mei| mei.update_neume_head_shape(id.as_str(), shape, zone))?;
            Ok(())
        })
    }

    /// Group neumes on one system into a single neume of type `type_id`
    pub fn neumify(&mut self, ids: &[ElementId], type_id: &str) -> Result<ElementId> {
        self.transact(|editor| {
            if ids.iter().enumerate().any(|(i, id)| ids[..i].contains(id)) {
                return Err(NeonError::invalid("Neume", "an element is listed twice"));
            }
            let neumes = ids
                .iter()
                .map(|id| editor.page.neume(id).cloned())
                .collect::<Result<Vec<Neume>>>()?;
            let Some(first) = neumes.first() else {
                return Err(NeonError::invalid("Neume", "nothing to group"));
            };
            let system = first.system;
            if neumes.iter().any(|n| n.system != system) {
                return Err(NeonError::invalid("Neume", "grouped neumes must share a system"));
            }
            let system = system.ok_or_else(|| NeonError::invalid("Neume", "element is not mounted"))?;

            let zone = Zone::enclosing(neumes.iter().map(|n| &n.zone)).unwrap_or(first.zone);
            let neume_type = NeumeType::parse(type_id);
            let root = first.root_pitch;

            // components keep their pitch, now relative to the first note
            let mut components = Vec::new();
            for neume in &neumes {
                for component in &neume.components {
                    let pitch_diff = match (root, neume.root_pitch) {
                        (Some(root), Some(own)) => root.steps_to(&own.step(component.pitch_diff)),
                        _ => component.pitch_diff,
                    };
                    let mut merged = NeumeComponent::new(component.head, pitch_diff);
                    merged.dot = component.dot.clone();
                    components.push(merged);
                }
            }
            let heads: Vec<HeadShape> = components.iter().map(|c| c.head).collect();

            let id_strs: Vec<&str> = ids.iter().map(ElementId::as_str).collect();
            let id = editor
                .sync(|mei| mei.neumify(&id_strs, type_id, &heads, zone))?
                .unwrap_or_else(ElementId::generate);

            let mut grouped = Neume::new(id.clone(), zone);
            grouped.name = neume_type.name;
            grouped.variant = neume_type.variant;
            grouped.root_pitch = root;
            for component in components {
                grouped.add_component(component);
            }

            for old in ids {
                editor.page.remove_element(old)?;
            }
            editor.page.add_neume(system, grouped, AddOptions::default())?;
            editor.redraw()?;
            Ok(id)
        })
    }

    /// Split a neume into puncta, one per note, laid out left to right
    /// across the neume's zone
    pub fn ungroup(&mut self, id: &ElementId) -> Result<Vec<ElementId>> {
        self.transact(|editor| {
            let neume = editor.page.neume(id)?.clone();
            let system = neume
                .system
                .ok_or_else(|| NeonError::invalid("Neume", "element is not mounted"))?;

            let count = neume.components.len().max(1) as i32;
            let step = neume.zone.width() / count;
            let zones: Vec<Zone> = (0..count)
                .map(|i| {
                    let lrx = if i == count - 1 { neume.zone.lrx } else { neume.zone.ulx + (i + 1) * step };
                    Zone::new(neume.zone.ulx + i * step, neume.zone.uly, lrx, neume.zone.lry)
                })
                .collect();

            let new_ids = match editor.sync(|mei| mei.ungroup(&[id.as_str()], &[zones.clone()]))? {
                Some(mut ids) if !ids.is_empty() => ids.swap_remove(0),
                _ => zones.iter().map(|_| ElementId::generate()).collect(),
            };

            editor.page.remove_element(id)?;
            let pitches = neume.pitches();
            for (i, (component, (new_id, zone))) in neume.components.iter().zip(new_ids.iter().zip(&zones)).enumerate() {
                let pitch = pitches.as_ref().and_then(|p| p.get(i).copied());
                let mut punctum = Neume::punctum(new_id.clone(), *zone, HeadShape::Punctum, pitch);
                punctum.components[0].dot = component.dot.clone();
                editor.page.add_neume(system, punctum, AddOptions::default())?;
            }
            editor.redraw()?;
            Ok(new_ids)
        })
    }

    /// Add a dot to a single-note neume
    pub fn add_dot(&mut self, id: &ElementId, form: &str) -> Result<()> {
        self.set_dot(id, Some(form))
    }

    pub fn delete_dot(&mut self, id: &ElementId) -> Result<()> {
        self.set_dot(id, None)
    }

    fn set_dot(&mut self, id: &ElementId, form: Option<&str>) -> Result<()> {
        self.transact(|editor| {
            if editor.page.neume(id)?.components.len() != 1 {
                return Err(NeonError::invalid("Neume", "dots only go on single-note neumes"));
            }
            editor.page.update_neume(id, |neume| {
                if let Some(first) = neume.components.first_mut() {
                    first.dot = form.map(str::to_string);
                }
            })?;
            editor.redraw()?;

            let zone = editor.page.neume(id)?.zone;
            editor.sync(|mei| match form {
                Some(form) => mei.add_dot(id.as_str(), form, zone),
                None => mei.delete_dot(id.as_str(), zone),
            })?;
            Ok(())
        })
    }

    // --- divisions, clefs and custodes ---

    pub fn insert_division(&mut self, zone: Zone, form: DivisionForm) -> Result<ElementId> {
        self.transact(|editor| {
            let (system, anchor) = editor.placement(&zone)?;
            let id = editor
                .sync(|mei| mei.insert_division(anchor.as_deref(), form.as_str(), zone))?
                .unwrap_or_else(ElementId::generate);

            editor.page
                .add_division(system, Division::new(id.clone(), zone, form), AddOptions::default())?;
            editor.redraw()?;
            Ok(id)
        })
    }

    /// Drag a division along its system. A final division takes the staff
    /// split with it.
    pub fn move_division(&mut self, id: &ElementId, zone: Zone) -> Result<()> {
        self.transact(|editor| {
            editor.page.division(id)?;
            editor.page.move_element(id, zone)?;
            editor.redraw()?;

            let anchor = editor.anchor_after(id)?;
            editor.sync(|mei| mei.move_division(id.as_str(), anchor.as_deref(), zone))?;
            Ok(())
        })
    }

    /// Place a clef; pitches on the staff are recomputed against it
    pub fn insert_clef(&mut self, zone: Zone, shape: ClefShape, line: i32) -> Result<ElementId> {
        self.transact(|editor| {
            let (system, anchor) = editor.placement(&zone)?;
            let id = editor
                .sync(|mei| mei.insert_clef(line, shape, &[], anchor.as_deref(), zone))?
                .unwrap_or_else(ElementId::generate);

            editor.page
                .add_clef(system, Clef::new(id.clone(), shape, line, zone), AddOptions::default())?;
            let updates = editor.page.refresh_pitches(system)?;
            editor.sync(|mei| mei.update_pitched_elements(&updates))?;
            editor.redraw()?;
            Ok(id)
        })
    }

    pub fn move_clef(&mut self, id: &ElementId, line: i32) -> Result<Vec<PitchUpdate>> {
        self.transact(|editor| {
            let updates = editor.page.update_clef_line(id, line)?;
            editor.redraw()?;

            let zone = editor.page.clef(id)?.zone;
            editor.sync(|mei| mei.move_clef(id.as_str(), line, &updates, zone))?;
            Ok(updates)
        })
    }

    pub fn update_clef_shape(&mut self, id: &ElementId, shape: ClefShape) -> Result<Vec<PitchUpdate>> {
        self.transact(|editor| {
            let updates = editor.page.update_clef_shape(id, shape)?;
            editor.redraw()?;

            let zone = editor.page.clef(id)?.zone;
            editor.sync(|mei| mei.update_clef_shape(id.as_str(), shape, &updates, zone))?;
            Ok(updates)
        })
    }

    pub fn insert_custos(&mut self, zone: Zone) -> Result<ElementId> {
        self.transact(|editor| {
            let (system, anchor) = editor.placement(&zone)?;
            let id = editor
                .sync(|mei| mei.insert_custos(None, anchor.as_deref(), zone))?
                .unwrap_or_else(ElementId::generate);

            editor.page
                .add_custos(system, Custos::new(id.clone(), zone, None), AddOptions::default())?;
            editor.sync_pitches(&id)?;
            editor.redraw()?;
            Ok(id)
        })
    }

    /// Move a custos to another staff position
    pub fn move_custos(&mut self, id: &ElementId, system_pos: i32) -> Result<()> {
        self.transact(|editor| {
            editor.page.update_custos_system_pos(id, system_pos)?;
            editor.redraw()?;

            let custos = editor.page.custos(id)?;
            let (pitch, zone) = (custos.pitch, custos.zone);
            editor.sync(|mei| mei.move_custos(id.as_str(), pitch, zone))?;
            Ok(())
        })
    }

    /// Delete glyphs of any kind. Removing a clef re-pitches its staff.
    pub fn delete(&mut self, ids: &[ElementId]) -> Result<()> {
        self.transact(|editor| {
            for id in ids {
                let glyph = editor.page.remove_element(id)?;
                match glyph {
                    Glyph::Neume(_) => {
                        editor.sync(|mei| mei.delete_neume(&[id.as_str()]))?;
                    }
                    Glyph::Custos(_) => {
                        editor.sync(|mei| mei.delete_custos(&[id.as_str()]))?;
                    }
                    Glyph::Division(_) => {
                        editor.sync(|mei| mei.delete_division(&[id.as_str()]))?;
                    }
                    Glyph::Clef(clef) => {
                        let updates = match clef.system {
                            Some(system) => editor.page.refresh_pitches(system)?,
                            None => Vec::new(),
                        };
                        let deletion = ClefDeletion {
                            id: id.clone(),
                            pitch_info: Some(updates),
                        };
                        editor.sync(|mei| mei.delete_clef(&[deletion]))?;
                    }
                }
            }
            editor.redraw()?;
            Ok(())
        })
    }

    pub fn select(&mut self, id: &ElementId) -> Result<()> {
        self.require_loaded()?;
        self.page.select(id)?;
        self.redraw()?;
        Ok(())
    }

    // --- systems ---

    /// Add a system with a system break at its place in reading order
    pub fn insert_system(&mut self, zone: Zone) -> Result<SystemId> {
        self.transact(|editor| {
            let options = match editor.settings.notation {
                Notation::Square => SystemOptions::staff(editor.settings.num_lines),
                Notation::Cheironomic => SystemOptions::cheironomic(),
            };
            let system = editor.page.add_system(zone, options);

            let next_sb = editor.following_system_break(system)?;
            let ids = editor.sync(|mei| {
                let page_id = mei
                    .document()
                    .elements_by_name("page")
                    .first()
                    .and_then(|p| mei.document().xml_id(*p))
                    .map(str::to_string)
                    .ok_or_else(|| MeiError::MissingElement("page".to_string()))?;
                let system_id = mei.insert_system(&page_id, zone)?;
                let sb_id = mei.insert_system_break(system_id.as_str(), 0, next_sb.as_deref())?;
                Ok((system_id, sb_id))
            })?;

            if let Some((system_id, sb_id)) = ids {
                let model = editor.page.system_mut(system)?;
                model.mei_system_id = Some(system_id.to_string());
                model.mei_sb_id = Some(sb_id.to_string());
                editor.renumber_system_breaks()?;
            }
            editor.redraw()?;
            Ok(system)
        })
    }

    /// Remove a system with everything on it
    pub fn delete_system(&mut self, id: SystemId) -> Result<()> {
        self.transact(|editor| {
            let glyphs: Vec<(ElementId, GlyphKind)> = editor
                .page
                .system_glyphs(id)?
                .into_iter()
                .map(|g| (g.id().clone(), g.kind()))
                .collect();
            let system = editor.page.remove_system(id)?;

            editor.sync(|mei| {
                for (glyph, kind) in &glyphs {
                    let ids = [glyph.as_str()];
                    match kind {
                        GlyphKind::Neume => mei.delete_neume(&ids)?,
                        GlyphKind::Custos => mei.delete_custos(&ids)?,
                        GlyphKind::Division => mei.delete_division(&ids)?,
                        GlyphKind::Clef => mei.delete_clef(&[ClefDeletion {
                            id: glyph.clone(),
                            pitch_info: None,
                        }])?,
                    }
                }
                if let Some(sb) = &system.mei_sb_id {
                    mei.delete_system_break(&[sb.as_str()])?;
                }
                if let Some(system) = &system.mei_system_id {
                    mei.delete_system(&[system.as_str()])?;
                }
                Ok(())
            })?;
            editor.renumber_system_breaks()?;
            editor.redraw()?;
            Ok(())
        })
    }

    pub fn update_system_zone(&mut self, id: SystemId, zone: Zone) -> Result<()> {
        self.transact(|editor| {
            editor.page.update_system_zone(id, zone)?;
            editor.redraw()?;

            if let Some(system_id) = editor.page.system(id)?.mei_system_id.clone() {
                editor.sync(|mei| mei.update_system_zone(&system_id, zone))?;
            }
            Ok(())
        })
    }

    // --- helpers ---

    /// Run one edit against the page and the document. When any step fails,
    /// both go back to how they were and the canvas is redrawn to match.
    fn transact<T, F>(&mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.require_loaded()?;
        let page = self.page.clone();
        let mei = self.mei.clone();
        match edit(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                log::warn!("edit failed, page and document restored: {}", err);
                self.rollback(page, mei);
                Err(err)
            }
        }
    }

    fn rollback(&mut self, page: Page, mei: Option<ModifyDocument>) {
        let failed = std::mem::replace(&mut self.page, page);
        self.mei = mei;

        // drawings made for glyphs and systems the restored page never had
        let glyphs: Vec<ElementId> = failed
            .glyphs()
            .map(|g| g.id().clone())
            .filter(|id| self.page.glyph(id).is_none())
            .collect();
        let systems: Vec<SystemId> = failed
            .systems()
            .iter()
            .map(|s| s.id)
            .filter(|id| self.page.system(*id).is_err())
            .collect();

        let events = self.page.events_mut();
        events.clear();
        for id in glyphs {
            events.fire(ModelEvent::EraseDrawing(id));
        }
        for id in systems {
            events.fire(ModelEvent::EraseSystem(id));
        }
        self.page.render();
        if let Err(err) = self.redraw() {
            log::error!("could not redraw the restored page: {}", err);
        }
    }

    fn require_loaded(&self) -> Result<()> {
        if self.engine.is_none() {
            return Err(NeonError::InvalidRenderContext("Editor"));
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<usize> {
        let engine = self.engine.as_mut().map(|e| e as &mut dyn RenderEngine);
        self.dispatcher.dispatch(&mut self.page, engine)
    }

    /// Apply an edit to the MEI document, if one is loaded
    fn sync<T, F>(&mut self, edit: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut ModifyDocument) -> std::result::Result<T, MeiError>,
    {
        match self.mei.as_mut() {
            Some(mei) => Ok(Some(edit(mei)?)),
            None => Ok(None),
        }
    }

    /// Write the page's pitch for a newly mounted glyph into the document
    fn sync_pitches(&mut self, id: &ElementId) -> Result<()> {
        let update = match self.page.glyph(id) {
            Some(Glyph::Neume(neume)) => neume.pitches().map(|pitches| PitchUpdate {
                id: id.clone(),
                kind: GlyphKind::Neume,
                pitches,
            }),
            Some(Glyph::Custos(custos)) => custos.pitch.map(|pitch| PitchUpdate {
                id: id.clone(),
                kind: GlyphKind::Custos,
                pitches: vec![pitch],
            }),
            _ => None,
        };
        if let Some(update) = update {
            self.sync(|mei| mei.update_pitched_elements(&[update]))?;
        }
        Ok(())
    }

    /// System a new glyph lands on and the document element it goes before
    fn placement(&self, zone: &Zone) -> Result<(SystemId, Option<String>)> {
        let y = zone.centre().1.round() as i32;
        let system = self
            .page
            .closest_system(y)
            .ok_or_else(|| NeonError::invalid("Page", "there is no system to place on"))?;
        let index = self
            .page
            .system(system)?
            .entries()
            .partition_point(|e| e.ulx <= zone.ulx);
        Ok((system, self.anchor(system, index)?))
    }

    /// Document element that follows a mounted glyph
    fn anchor_after(&self, id: &ElementId) -> Result<Option<String>> {
        let glyph = self.page.glyph(id).ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        let system = glyph
            .system()
            .ok_or_else(|| NeonError::invalid(glyph.kind().as_str(), "element is not mounted"))?;
        let index = self
            .page
            .system(system)?
            .element_index(id)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        self.anchor(system, index + 1)
    }

    /// Element at list position `index` of a system, or the break opening
    /// the next system when the position is past the end
    fn anchor(&self, system: SystemId, index: usize) -> Result<Option<String>> {
        if let Some(entry) = self.page.system(system)?.entries().get(index) {
            return Ok(Some(entry.id.to_string()));
        }
        self.following_system_break(system)
    }

    fn following_system_break(&self, system: SystemId) -> Result<Option<String>> {
        let systems = self.page.systems();
        let position = systems
            .iter()
            .position(|s| s.id == system)
            .ok_or(NeonError::UnknownSystem(system))?;
        Ok(systems[position + 1..].iter().find_map(|s| s.mei_sb_id.clone()))
    }

    /// Number system breaks by page order, starting at 1
    fn renumber_system_breaks(&mut self) -> Result<()> {
        let breaks: Vec<String> = self
            .page
            .systems()
            .iter()
            .filter_map(|s| s.mei_sb_id.clone())
            .collect();
        self.sync(|mei| {
            for (i, sb) in breaks.iter().enumerate() {
                mei.modify_system_break(sb, i as u32 + 1)?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

/// Empty page; without auto load it takes its size from the settings
fn fresh_page(settings: &NeonSettings) -> Page {
    let mut page = Page::new();
    if !settings.auto_load {
        page.set_dimensions(settings.width, settings.height);
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pitch, PitchName};

    const PAGE: &str = include_str!("../tests/fixtures/two_systems.mei");
    const GLYPHS: &str = include_str!("../tests/fixtures/glyphs.svg");

    fn auto_load() -> NeonSettings {
        NeonSettings::from_json(r#"{"autoLoad": true, "filename": "folio_18r"}"#).unwrap()
    }

    fn loaded_editor() -> Editor {
        let mut editor = Editor::new(auto_load());
        let ticket = editor.begin_load();
        assert!(editor.set_glyphs(ticket, GLYPHS).unwrap());
        assert!(editor.set_mei(ticket, PAGE).unwrap());
        editor.loaded().unwrap();
        editor
    }

    #[test]
    fn test_manual_page_uses_settings_size() {
        let mut editor = Editor::new(NeonSettings::default());
        editor.begin_load();
        let display = editor.loaded().unwrap();
        assert_eq!((display.canvas.width, display.canvas.height), (1000, 1000));
        assert_eq!(display.canvas.id, "neon-canvas");
        assert!(editor.page().systems().is_empty());
    }

    #[test]
    fn test_auto_load_without_mei_has_no_dimensions() {
        let mut editor = Editor::new(auto_load());
        editor.begin_load();
        assert_eq!(editor.loaded().unwrap_err(), NeonError::DimensionsNotSet);
        assert_eq!(editor.loaded().unwrap_err().to_string(), "Page dimensions have not been set.");
    }

    #[test]
    fn test_stale_responses_are_ignored() {
        let mut editor = Editor::new(auto_load());
        let old = editor.begin_load();
        let current = editor.begin_load();
        assert!(!editor.set_mei(old, PAGE).unwrap());
        assert!(editor.mei().is_none());
        assert!(editor.set_mei(current, PAGE).unwrap());
        assert_eq!(editor.page().dimensions(), Some((900, 460)));
    }

    #[test]
    fn test_auto_load_draws_page() {
        let mut editor = loaded_editor();
        assert_eq!(editor.page().systems().len(), 2);
        // two staves, two clefs, four neumes, a custos and a division
        assert_eq!(editor.engine().unwrap().live_count(), 10);
        // the first system's lines are 20px apart and the punctum is 10 high
        assert_eq!(editor.engine().unwrap().scale(), Some(2.0));
        assert!(editor.take_display_list().unwrap().commands.is_empty());
        assert!(editor.loaded().is_err());
    }

    #[test]
    fn test_edits_need_a_canvas() {
        let mut editor = Editor::new(NeonSettings::default());
        let err = editor.insert_punctum(Zone::new(0, 0, 10, 10)).unwrap_err();
        assert_eq!(err.to_string(), "Editor: Invalid render context");
    }

    #[test]
    fn test_insert_punctum_writes_document() {
        let mut editor = loaded_editor();
        // centre on the second line from the top of system 1: a3 under the c clef
        let id = editor.insert_punctum(Zone::new(250, 210, 265, 230)).unwrap();

        let neume = editor.page().neume(&id).unwrap();
        assert_eq!(neume.root_pitch, Some(Pitch::new(PitchName::A, 3)));

        let mei = editor.mei().unwrap().document();
        let node = mei.require(id.as_str()).unwrap();
        let layer = mei.parent(node).unwrap();
        let order: Vec<&str> = mei.children(layer).into_iter().filter_map(|c| mei.xml_id(c)).collect();
        let at = order.iter().position(|i| *i == id.as_str()).unwrap();
        assert_eq!(order[at + 1], "n2");
        let note = mei.descendants_by_name(node, "note")[0];
        assert_eq!(mei.attribute(note, "pname"), Some("a"));
        assert_eq!(mei.attribute(note, "oct"), Some("3"));
    }

    #[test]
    fn test_move_neume_repitches_document() {
        let mut editor = loaded_editor();
        editor.move_neume(&ElementId::from("n1"), 2).unwrap();
        assert_eq!(
            editor.page().neume(&ElementId::from("n1")).unwrap().root_pitch,
            Some(Pitch::new(PitchName::C, 4))
        );
        let mei = editor.mei().unwrap().document();
        let note = mei.require("note1").unwrap();
        assert_eq!(mei.attribute(note, "pname"), Some("c"));
        assert_eq!(mei.attribute(note, "oct"), Some("4"));
    }

    #[test]
    fn test_neumify_and_ungroup() {
        let mut editor = loaded_editor();
        let ids = [ElementId::from("n1"), ElementId::from("n2")];
        let grouped = editor.neumify(&ids, "torculus").unwrap();

        let neume = editor.page().neume(&grouped).unwrap();
        assert_eq!(neume.name, "torculus");
        assert_eq!(neume.components.iter().map(|c| c.pitch_diff).collect::<Vec<_>>(), vec![0, 1, 0]);
        assert!(editor.page().glyph(&ids[0]).is_none());

        let puncta = editor.ungroup(&grouped).unwrap();
        assert_eq!(puncta.len(), 3);
        let pitches: Vec<Option<Pitch>> = puncta
            .iter()
            .map(|id| editor.page().neume(id).unwrap().root_pitch)
            .collect();
        assert_eq!(
            pitches,
            vec![
                Some(Pitch::new(PitchName::A, 3)),
                Some(Pitch::new(PitchName::B, 3)),
                Some(Pitch::new(PitchName::A, 3)),
            ]
        );
        assert!(editor.mei().unwrap().document().get_element_by_id(grouped.as_str()).is_none());
    }

    #[test]
    fn test_delete_clef_repitches_staff() {
        let mut editor = loaded_editor();
        let clef = editor.insert_clef(Zone::new(350, 215, 362, 245), ClefShape::F, 3).unwrap();
        // with f3 on the second line the g3 punctum after the clef reads e3
        assert_eq!(
            editor.page().neume(&ElementId::from("n3")).unwrap().root_pitch,
            Some(Pitch::new(PitchName::E, 3))
        );

        editor.delete(&[clef.clone()]).unwrap();
        assert_eq!(
            editor.page().neume(&ElementId::from("n3")).unwrap().root_pitch,
            Some(Pitch::new(PitchName::G, 3))
        );
        let mei = editor.mei().unwrap().document();
        assert!(mei.get_element_by_id(clef.as_str()).is_none());
        assert_eq!(mei.attribute(mei.require("note4").unwrap(), "pname"), Some("g"));
    }

    #[test]
    fn test_failed_edit_restores_page_and_document() {
        let mut editor = loaded_editor();
        // the page still has n1 but the document no longer does
        editor.mei.as_mut().unwrap().delete_neume(&["n1"]).unwrap();
        let before = editor.mei_text().unwrap();
        let live = editor.engine().unwrap().live_count();

        let err = editor.move_neume(&ElementId::from("n1"), 2).unwrap_err();
        assert!(matches!(err, NeonError::Mei(MeiError::ElementNotFound(_))));
        assert_eq!(editor.mei_text().unwrap(), before);
        assert_eq!(
            editor.page().neume(&ElementId::from("n1")).unwrap().root_pitch,
            Some(Pitch::new(PitchName::A, 3))
        );
        assert_eq!(editor.engine().unwrap().live_count(), live);
        assert!(editor.page().events().is_empty());
    }

    #[test]
    fn test_insert_and_delete_system() {
        let mut editor = loaded_editor();
        let system = editor.insert_system(Zone::new(100, 300, 900, 360)).unwrap();
        let sb = editor.page().system(system).unwrap().mei_sb_id.clone().unwrap();

        let mei = editor.mei().unwrap().document();
        let sb_node = mei.require(&sb).unwrap();
        assert_eq!(mei.attribute(sb_node, "n"), Some("2"));
        assert_eq!(mei.attribute(mei.require("sb2").unwrap(), "n"), Some("3"));

        editor.delete_system(system).unwrap();
        let mei = editor.mei().unwrap().document();
        assert!(mei.get_element_by_id(&sb).is_none());
        assert_eq!(mei.attribute(mei.require("sb2").unwrap(), "n"), Some("2"));
        assert_eq!(editor.page().systems().len(), 2);
    }
}
