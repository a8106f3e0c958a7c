//! The page: systems plus the glyph store
//!
//! Glyphs live in an id-keyed store owned by the page. Systems only hold ids,
//! and each glyph keeps a `SystemId` back-reference. All mounting goes
//! through the page so that the back-reference and the system list never
//! disagree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{NeonError, Result};
use crate::events::{EventQueue, ModelEvent};

use super::clef::{Clef, ClefShape};
use super::custos::Custos;
use super::division::Division;
use super::glyph::{ElementId, Glyph, GlyphKind, SystemId};
use super::neume::Neume;
use super::pitch::Pitch;
use super::system::{System, SystemOptions};
use super::zone::Zone;

/// Options for mounting a glyph on a system
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Append instead of sorted insert (bulk load from a document that is
    /// already in reading order)
    pub just_push: bool,
}

impl AddOptions {
    pub fn just_push() -> Self {
        Self { just_push: true }
    }
}

/// New pitches of one element after a clef change
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PitchUpdate {
    pub id: ElementId,
    pub kind: GlyphKind,
    pub pitches: Vec<Pitch>,
}

#[derive(Debug, Default, Clone)]
pub struct Page {
    pub width: Option<u32>,
    pub height: Option<u32>,
    systems: Vec<System>,
    glyphs: HashMap<ElementId, Glyph>,
    next_system_id: u32,
    events: EventQueue,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = Some(width);
        self.height = Some(height);
    }

    /// Page size is the extent of the furthest zone
    pub fn calc_dimensions<'a, I>(&mut self, zones: I)
    where
        I: IntoIterator<Item = &'a Zone>,
    {
        let (w, h) = zones
            .into_iter()
            .fold((0, 0), |(w, h), z| (w.max(z.lrx), h.max(z.lry)));
        self.set_dimensions(w.max(0) as u32, h.max(0) as u32);
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    // --- events ---

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn next_event(&mut self) -> Option<ModelEvent> {
        self.events.pop()
    }

    // --- systems ---

    /// Add a system; systems stay ordered top to bottom
    pub fn add_system(&mut self, zone: Zone, options: SystemOptions) -> SystemId {
        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;

        let index = self.systems.partition_point(|s| s.zone.uly <= zone.uly);
        self.systems.insert(index, System::new(id, zone, options));
        self.events.fire(ModelEvent::RenderSystem(id));
        id
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn system(&self, id: SystemId) -> Result<&System> {
        self.systems
            .iter()
            .find(|s| s.id == id)
            .ok_or(NeonError::UnknownSystem(id))
    }

    pub fn system_mut(&mut self, id: SystemId) -> Result<&mut System> {
        self.systems
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(NeonError::UnknownSystem(id))
    }

    pub fn system_by_mei_id(&self, mei_id: &str) -> Option<&System> {
        self.systems
            .iter()
            .find(|s| s.mei_system_id.as_deref() == Some(mei_id))
    }

    /// System nearest to a vertical coordinate (0 distance when inside)
    pub fn closest_system(&self, y: i32) -> Option<SystemId> {
        self.systems
            .iter()
            .min_by_key(|s| {
                if y < s.zone.uly {
                    s.zone.uly - y
                } else if y > s.zone.lry {
                    y - s.zone.lry
                } else {
                    0
                }
            })
            .map(|s| s.id)
    }

    /// Resize a system; its glyphs are redrawn against the new lines
    pub fn update_system_zone(&mut self, id: SystemId, zone: Zone) -> Result<()> {
        let system = self.system_mut(id)?;
        system.set_zone(zone);
        let ids: Vec<ElementId> = system.elements().cloned().collect();

        self.events.fire(ModelEvent::RenderSystem(id));
        for element in ids {
            if let Some(glyph) = self.glyphs.get(&element) {
                self.events.fire(render_event(glyph));
            }
        }
        Ok(())
    }

    /// Remove a system and every glyph mounted on it
    pub fn remove_system(&mut self, id: SystemId) -> Result<System> {
        let index = self
            .systems
            .iter()
            .position(|s| s.id == id)
            .ok_or(NeonError::UnknownSystem(id))?;
        let system = self.systems.remove(index);
        for element in system.elements() {
            if self.glyphs.remove(element).is_some() {
                self.events.fire(ModelEvent::EraseDrawing(element.clone()));
            }
        }
        self.events.fire(ModelEvent::EraseSystem(id));
        Ok(system)
    }

    // --- glyphs ---

    pub fn glyph(&self, id: &ElementId) -> Option<&Glyph> {
        self.glyphs.get(id)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    pub fn neume(&self, id: &ElementId) -> Result<&Neume> {
        self.glyph(id)
            .and_then(Glyph::as_neume)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))
    }

    pub fn custos(&self, id: &ElementId) -> Result<&Custos> {
        self.glyph(id)
            .and_then(Glyph::as_custos)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))
    }

    pub fn clef(&self, id: &ElementId) -> Result<&Clef> {
        self.glyph(id)
            .and_then(Glyph::as_clef)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))
    }

    pub fn division(&self, id: &ElementId) -> Result<&Division> {
        self.glyph(id)
            .and_then(Glyph::as_division)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))
    }

    /// Glyphs of a system in list order
    pub fn system_glyphs(&self, id: SystemId) -> Result<Vec<&Glyph>> {
        let system = self.system(id)?;
        Ok(system.elements().filter_map(|e| self.glyphs.get(e)).collect())
    }

    /// Clef in force at list position `index` of a system: the last clef
    /// before it, else the first clef on the system.
    pub fn active_clef(&self, system: SystemId, index: usize) -> Option<&Clef> {
        let system = self.system(system).ok()?;
        let clefs = || {
            system
                .elements()
                .enumerate()
                .filter_map(|(i, e)| self.glyphs.get(e).and_then(Glyph::as_clef).map(|c| (i, c)))
        };
        clefs()
            .filter(|(i, _)| *i < index)
            .last()
            .or_else(|| clefs().next())
            .map(|(_, c)| c)
    }

    pub fn add_neume(&mut self, system: SystemId, neume: Neume, options: AddOptions) -> Result<usize> {
        self.mount(system, Glyph::Neume(neume), options)
    }

    pub fn add_custos(&mut self, system: SystemId, custos: Custos, options: AddOptions) -> Result<usize> {
        self.mount(system, Glyph::Custos(custos), options)
    }

    pub fn add_clef(&mut self, system: SystemId, clef: Clef, options: AddOptions) -> Result<usize> {
        self.mount(system, Glyph::Clef(clef), options)
    }

    pub fn add_division(&mut self, system: SystemId, division: Division, options: AddOptions) -> Result<usize> {
        self.mount(system, Glyph::Division(division), options)
    }

    /// Mount a glyph on a system and fire its render event
    pub fn mount(&mut self, system_id: SystemId, mut glyph: Glyph, options: AddOptions) -> Result<usize> {
        let context = glyph.kind().as_str();
        if glyph.system().is_some() || self.glyphs.contains_key(glyph.id()) {
            return Err(NeonError::invalid(
                context,
                &format!("{} is already mounted on a system", glyph.id()),
            ));
        }

        let system = self.system(system_id)?;
        let ulx = glyph.zone().ulx;
        let index = if options.just_push {
            system.len()
        } else {
            system.entries().partition_point(|e| e.ulx <= ulx)
        };

        match &mut glyph {
            Glyph::Clef(_) if !system.is_staff() => {
                return Err(NeonError::invalid(context, "clefs can only be mounted on a staff"));
            }
            Glyph::Neume(neume) => {
                if system.is_staff() {
                    let clef = self.active_clef(system_id, index);
                    let y = neume.zone.centre().1;
                    let (pos, pitch) = resolve_position(system, clef, neume.root_pitch, y, context)?;
                    neume.root_system_pos = pos;
                    neume.root_pitch = pitch;
                }
            }
            Glyph::Custos(custos) => {
                if system.is_staff() {
                    let clef = self.active_clef(system_id, index);
                    let y = custos.zone.centre().1;
                    let (pos, pitch) = resolve_position(system, clef, custos.pitch, y, context)?;
                    custos.root_system_pos = pos;
                    custos.pitch = pitch;
                }
            }
            _ => {}
        }

        let id = glyph.id().clone();
        let system = self.system_mut(system_id)?;
        let index = if options.just_push {
            system.push_element(id.clone(), ulx)
        } else {
            system.insert_element(id.clone(), ulx)
        };
        glyph.set_system(Some(system_id));

        let event = render_event(&glyph);
        log::debug!("mounted {} {} on {} at {}", context, id, system_id, index);
        self.glyphs.insert(id, glyph);
        self.events.fire(event);
        Ok(index)
    }

    /// Unmount and drop a glyph; its drawing is erased
    pub fn remove_element(&mut self, id: &ElementId) -> Result<Glyph> {
        let mut glyph = self
            .glyphs
            .remove(id)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        if let Some(system_id) = glyph.system() {
            self.system_mut(system_id)?.remove_element(id);
        }
        glyph.set_system(None);
        self.events.fire(ModelEvent::EraseDrawing(id.clone()));
        Ok(glyph)
    }

    /// Record the zone a view reported for a glyph
    pub fn update_bounding_box(&mut self, id: &ElementId, zone: Zone) -> Result<()> {
        let glyph = self
            .glyphs
            .get_mut(id)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        let moved = glyph.zone().ulx != zone.ulx;
        glyph.set_zone(zone);

        if moved {
            if let Some(system_id) = glyph.system() {
                self.system_mut(system_id)?.reposition_element(id, zone.ulx);
            }
        }
        Ok(())
    }

    /// Move a glyph along its system to `zone` and redraw it. It keeps its
    /// staff position; call [`Page::refresh_pitches`] for the pitch.
    pub fn move_element(&mut self, id: &ElementId, zone: Zone) -> Result<SystemId> {
        let (system_id, _) = self.locate(id)?;
        self.update_bounding_box(id, zone)?;
        let event = self
            .glyphs
            .get(id)
            .map(render_event)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        self.events.fire(event);
        Ok(system_id)
    }

    /// Move a custos to a new staff position; its pitch follows the clef
    pub fn update_custos_system_pos(&mut self, id: &ElementId, system_pos: i32) -> Result<()> {
        let (system_id, index) = self.locate(id)?;
        let pitch = self.pitch_at(system_id, index, system_pos);

        match self.glyphs.get_mut(id) {
            Some(Glyph::Custos(custos)) => {
                custos.root_system_pos = system_pos;
                if pitch.is_some() {
                    custos.pitch = pitch;
                }
            }
            Some(_) => return Err(NeonError::invalid("Custos", "invalid custos")),
            None => return Err(NeonError::UnknownElement(id.clone())),
        }
        self.events.fire(ModelEvent::UpdateSystemPosition(id.clone()));
        Ok(())
    }

    /// Move a neume vertically by `steps` staff positions
    pub fn shift_neume(&mut self, id: &ElementId, steps: i32) -> Result<()> {
        match self.glyphs.get_mut(id) {
            Some(Glyph::Neume(neume)) => neume.shift(steps),
            Some(_) => return Err(NeonError::invalid("Neume", "invalid neume")),
            None => return Err(NeonError::UnknownElement(id.clone())),
        }
        self.events.fire(ModelEvent::UpdateSystemPosition(id.clone()));
        Ok(())
    }

    /// Edit a neume in place and redraw it
    pub fn update_neume<F>(&mut self, id: &ElementId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Neume),
    {
        match self.glyphs.get_mut(id) {
            Some(Glyph::Neume(neume)) => edit(neume),
            Some(_) => return Err(NeonError::invalid("Neume", "invalid neume")),
            None => return Err(NeonError::UnknownElement(id.clone())),
        }
        self.events.fire(ModelEvent::RenderNeume(id.clone()));
        Ok(())
    }

    /// Move a clef to another staff line. Glyphs keep their staff
    /// positions, so their pitches are recomputed.
    pub fn update_clef_line(&mut self, id: &ElementId, line: i32) -> Result<Vec<PitchUpdate>> {
        let system_id = match self.glyphs.get_mut(id) {
            Some(Glyph::Clef(clef)) => {
                clef.line = line;
                clef.system
            }
            Some(_) => return Err(NeonError::invalid("Clef", "invalid clef")),
            None => return Err(NeonError::UnknownElement(id.clone())),
        };
        self.events.fire(ModelEvent::UpdateSystemPosition(id.clone()));
        match system_id {
            Some(system_id) => self.refresh_pitches(system_id),
            None => Ok(Vec::new()),
        }
    }

    pub fn update_clef_shape(&mut self, id: &ElementId, shape: ClefShape) -> Result<Vec<PitchUpdate>> {
        let system_id = match self.glyphs.get_mut(id) {
            Some(Glyph::Clef(clef)) => {
                clef.shape = shape;
                clef.system
            }
            Some(_) => return Err(NeonError::invalid("Clef", "invalid clef")),
            None => return Err(NeonError::UnknownElement(id.clone())),
        };
        self.events.fire(ModelEvent::RenderClef(id.clone()));
        match system_id {
            Some(system_id) => self.refresh_pitches(system_id),
            None => Ok(Vec::new()),
        }
    }

    pub fn select(&mut self, id: &ElementId) -> Result<()> {
        if !self.glyphs.contains_key(id) {
            return Err(NeonError::UnknownElement(id.clone()));
        }
        self.events.fire(ModelEvent::SelectDrawing(id.clone()));
        Ok(())
    }

    /// Recompute pitches on a staff from staff positions, e.g. after a clef
    /// was added, moved or removed. Returns the elements whose pitch changed.
    pub fn refresh_pitches(&mut self, system_id: SystemId) -> Result<Vec<PitchUpdate>> {
        let system = self.system(system_id)?;
        if !system.is_staff() {
            return Ok(Vec::new());
        }

        let mut changes: Vec<(ElementId, Pitch)> = Vec::new();
        for (index, element) in system.elements().enumerate() {
            let (pos, current) = match self.glyphs.get(element) {
                Some(Glyph::Neume(n)) => (n.root_system_pos, n.root_pitch),
                Some(Glyph::Custos(c)) => (c.root_system_pos, c.pitch),
                _ => continue,
            };
            if let Some(pitch) = self.pitch_at(system_id, index, pos) {
                if current != Some(pitch) {
                    changes.push((element.clone(), pitch));
                }
            }
        }

        let mut updates = Vec::with_capacity(changes.len());
        for (id, pitch) in changes {
            match self.glyphs.get_mut(&id) {
                Some(Glyph::Neume(n)) => {
                    n.root_pitch = Some(pitch);
                    updates.push(PitchUpdate {
                        id,
                        kind: GlyphKind::Neume,
                        pitches: n.pitches().unwrap_or_default(),
                    });
                }
                Some(Glyph::Custos(c)) => {
                    c.pitch = Some(pitch);
                    updates.push(PitchUpdate {
                        id,
                        kind: GlyphKind::Custos,
                        pitches: vec![pitch],
                    });
                }
                _ => {}
            }
        }
        Ok(updates)
    }

    /// Re-fire render events for everything on the page
    pub fn render(&mut self) {
        for system in &self.systems {
            self.events.fire(ModelEvent::RenderSystem(system.id));
            for element in system.elements() {
                if let Some(glyph) = self.glyphs.get(element) {
                    self.events.fire(render_event(glyph));
                }
            }
        }
    }

    fn locate(&self, id: &ElementId) -> Result<(SystemId, usize)> {
        let glyph = self
            .glyphs
            .get(id)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        let system_id = glyph
            .system()
            .ok_or_else(|| NeonError::invalid(glyph.kind().as_str(), "element is not mounted"))?;
        let index = self
            .system(system_id)?
            .element_index(id)
            .ok_or_else(|| NeonError::UnknownElement(id.clone()))?;
        Ok((system_id, index))
    }

    fn pitch_at(&self, system_id: SystemId, index: usize, system_pos: i32) -> Option<Pitch> {
        let num_lines = self.system(system_id).ok()?.num_lines;
        self.active_clef(system_id, index)
            .map(|clef| clef.pitch_at(system_pos, num_lines))
    }
}

fn render_event(glyph: &Glyph) -> ModelEvent {
    let id = glyph.id().clone();
    match glyph {
        Glyph::Neume(_) => ModelEvent::RenderNeume(id),
        Glyph::Custos(_) => ModelEvent::RenderCustos(id),
        Glyph::Clef(_) => ModelEvent::RenderClef(id),
        Glyph::Division(_) => ModelEvent::RenderDivision(id),
    }
}

/// Staff position and pitch of a pitched glyph being mounted on a staff.
/// A known pitch wins; otherwise the position comes from the zone.
fn resolve_position(
    system: &System,
    clef: Option<&Clef>,
    pitch: Option<Pitch>,
    y: f64,
    context: &str,
) -> Result<(i32, Option<Pitch>)> {
    match (pitch, clef) {
        (Some(pitch), Some(clef)) => Ok((clef.system_pos_of(&pitch, system.num_lines), Some(pitch))),
        (Some(_), None) => Err(NeonError::invalid(
            context,
            "cannot mount a pitched element on a staff without a clef",
        )),
        (None, clef) => {
            let pos = system.system_pos_of_y(y).unwrap_or(0);
            Ok((pos, clef.map(|c| c.pitch_at(pos, system.num_lines))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clef::ClefShape;
    use crate::models::neume::HeadShape;
    use crate::models::pitch::PitchName;

    fn page_with_staff() -> (Page, SystemId) {
        let mut page = Page::new();
        let s = page.add_system(Zone::new(100, 200, 900, 260), SystemOptions::staff(4));
        let clef = Clef::new(ElementId::from("clef1"), ClefShape::C, 3, Zone::new(105, 215, 120, 245));
        page.add_clef(s, clef, AddOptions::default()).unwrap();
        page.events_mut().clear();
        (page, s)
    }

    fn punctum(id: &str, ulx: i32, pitch: Option<Pitch>) -> Neume {
        Neume::punctum(ElementId::from(id), Zone::new(ulx, 215, ulx + 15, 225), HeadShape::Punctum, pitch)
    }

    #[test]
    fn test_add_neume_resolves_position_from_pitch() {
        let (mut page, s) = page_with_staff();
        let idx = page
            .add_neume(s, punctum("n1", 300, Some(Pitch::new(PitchName::D, 4))), AddOptions::default())
            .unwrap();
        assert_eq!(idx, 1);
        let n = page.neume(&ElementId::from("n1")).unwrap();
        // c clef on line 3 is position -2; d4 is one step higher
        assert_eq!(n.root_system_pos, -1);
        assert_eq!(n.system, Some(s));
        assert_eq!(page.next_event(), Some(ModelEvent::RenderNeume(ElementId::from("n1"))));
    }

    #[test]
    fn test_add_neume_without_pitch_uses_zone() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, None), AddOptions::default()).unwrap();
        let n = page.neume(&ElementId::from("n1")).unwrap();
        // zone centre y = 220 → position -2 → c4
        assert_eq!(n.root_system_pos, -2);
        assert_eq!(n.root_pitch, Some(Pitch::new(PitchName::C, 4)));
    }

    #[test]
    fn test_double_mount_rejected() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, None), AddOptions::default()).unwrap();
        let err = page.add_neume(s, punctum("n1", 400, None), AddOptions::default());
        assert!(matches!(err, Err(NeonError::InvalidArgument(_))));

        let mut mounted = punctum("n2", 400, None);
        mounted.system = Some(s);
        assert!(page.add_neume(s, mounted, AddOptions::default()).is_err());
    }

    #[test]
    fn test_pitched_neume_on_staff_without_clef() {
        let mut page = Page::new();
        let s = page.add_system(Zone::new(0, 0, 500, 60), SystemOptions::staff(4));
        let err = page.add_neume(s, punctum("n1", 10, Some(Pitch::new(PitchName::C, 4))), AddOptions::default());
        assert!(matches!(err, Err(NeonError::InvalidArgument(_))));
    }

    #[test]
    fn test_remove_element_unmounts_and_erases() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, None), AddOptions::default()).unwrap();
        page.events_mut().clear();

        let glyph = page.remove_element(&ElementId::from("n1")).unwrap();
        assert_eq!(glyph.system(), None);
        assert_eq!(page.system(s).unwrap().len(), 1);
        assert_eq!(page.next_event(), Some(ModelEvent::EraseDrawing(ElementId::from("n1"))));
    }

    #[test]
    fn test_refresh_pitches_after_clef_change() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, Some(Pitch::new(PitchName::C, 4))), AddOptions::default())
            .unwrap();
        page.remove_element(&ElementId::from("clef1")).unwrap();
        let f = Clef::new(ElementId::from("clef2"), ClefShape::F, 3, Zone::new(105, 215, 120, 245));
        page.add_clef(s, f, AddOptions::default()).unwrap();

        let updates = page.refresh_pitches(s).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].pitches, vec![Pitch::new(PitchName::F, 3)]);
    }

    #[test]
    fn test_moving_clef_repitches_glyphs() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, Some(Pitch::new(PitchName::C, 4))), AddOptions::default())
            .unwrap();
        page.events_mut().clear();

        let updates = page.update_clef_line(&ElementId::from("clef1"), 4).unwrap();
        assert_eq!(
            page.next_event(),
            Some(ModelEvent::UpdateSystemPosition(ElementId::from("clef1")))
        );
        // the neume stays two steps below the top line, which is now c4
        assert_eq!(updates[0].pitches, vec![Pitch::new(PitchName::A, 3)]);
        assert!(page.update_clef_line(&ElementId::from("n1"), 2).is_err());
    }

    #[test]
    fn test_update_neume_redraws() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, None), AddOptions::default()).unwrap();
        page.events_mut().clear();

        page.update_neume(&ElementId::from("n1"), |n| n.components[0].head = HeadShape::Virga)
            .unwrap();
        assert_eq!(page.next_event(), Some(ModelEvent::RenderNeume(ElementId::from("n1"))));
        assert_eq!(page.neume(&ElementId::from("n1")).unwrap().components[0].head, HeadShape::Virga);
        assert!(page.update_neume(&ElementId::from("clef1"), |_| {}).is_err());
    }

    #[test]
    fn test_move_element_reorders_and_redraws() {
        let (mut page, s) = page_with_staff();
        page.add_neume(s, punctum("n1", 300, None), AddOptions::default()).unwrap();
        page.add_neume(s, punctum("n2", 500, None), AddOptions::default()).unwrap();
        page.events_mut().clear();

        let moved = page.move_element(&ElementId::from("n1"), Zone::new(600, 225, 615, 235)).unwrap();
        assert_eq!(moved, s);
        let order: Vec<&str> = page.system(s).unwrap().elements().map(ElementId::as_str).collect();
        assert_eq!(order, vec!["clef1", "n2", "n1"]);
        assert_eq!(page.next_event(), Some(ModelEvent::RenderNeume(ElementId::from("n1"))));
        assert!(page.move_element(&ElementId::from("ghost"), Zone::default()).is_err());
    }

    #[test]
    fn test_systems_sorted_top_to_bottom() {
        let mut page = Page::new();
        let low = page.add_system(Zone::new(0, 500, 100, 560), SystemOptions::default());
        let high = page.add_system(Zone::new(0, 100, 100, 160), SystemOptions::default());
        let ids: Vec<SystemId> = page.systems().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![high, low]);
        assert_eq!(page.closest_system(130), Some(high));
        assert_eq!(page.closest_system(400), Some(low));
    }

    #[test]
    fn test_calc_dimensions() {
        let mut page = Page::new();
        assert_eq!(page.dimensions(), None);
        page.calc_dimensions([Zone::new(0, 0, 800, 40), Zone::new(10, 900, 20, 1200)].iter());
        assert_eq!(page.dimensions(), Some((800, 1200)));
    }
}
