//! Edits applied to the MEI document when the page is saved
//!
//! Every editing action on the page has a counterpart here that writes the
//! same change into the encoding and its facsimile zones. New elements get a
//! generated id which is handed back so the page model can adopt it.
//!
//! Final divisions close a staff: inserting one splits the enclosing
//! `staff`/`layer` pair at the division and removing one merges the next pair
//! back. Staves and their `staffDef`s are renumbered after every split or
//! merge so that `n` always follows document order.

use serde::{Deserialize, Serialize};

use crate::error::MeiError;
use crate::models::{ClefShape, ElementId, GlyphKind, HeadShape, NeumeType, Pitch, PitchUpdate, Zone};

use super::document::{MeiDocument, NodeId, XML_ID};

type Result<T> = std::result::Result<T, MeiError>;

/// A clef to delete together with the pitches that change once it is gone
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClefDeletion {
    pub id: ElementId,
    #[serde(default)]
    pub pitch_info: Option<Vec<PitchUpdate>>,
}

#[derive(Debug, Clone)]
pub struct ModifyDocument {
    mei: MeiDocument,
}

impl ModifyDocument {
    pub fn new(mei: MeiDocument) -> Self {
        Self { mei }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::new(MeiDocument::parse(text)?))
    }

    pub fn document(&self) -> &MeiDocument {
        &self.mei
    }

    pub fn into_document(self) -> MeiDocument {
        self.mei
    }

    /// Serialised document, ready to be written back
    pub fn to_xml_string(&self) -> Result<String> {
        self.mei.to_xml_string()
    }

    // --- neumes ---

    /// Insert a punctum before `before_id`, or at the end of the last layer
    pub fn insert_punctum(
        &mut self,
        before_id: Option<&str>,
        pitch: Option<Pitch>,
        dot_form: Option<&str>,
        zone: Zone,
    ) -> Result<ElementId> {
        let punctum = self.mei.create_element("neume");
        self.mei.set_attribute(punctum, "name", "punctum");
        let nc = self.mei.create_element("nc");
        let note = self.mei.create_element("note");
        if let Some(pitch) = pitch {
            set_pitch(&mut self.mei, note, &pitch);
        }
        if let Some(form) = dot_form {
            let dot = self.mei.create_element("dot");
            self.mei.set_attribute(dot, "form", form);
            self.mei.add_child(note, dot);
        }
        self.mei.add_child(nc, note);
        self.mei.add_child(punctum, nc);

        self.insert(punctum, before_id)?;
        self.update_or_add_zone(punctum, zone)?;
        Ok(self.id_of(punctum))
    }

    /// Re-pitch and reposition a neume. `pitches` are given note by note.
    pub fn move_neume(
        &mut self,
        id: &str,
        before_id: Option<&str>,
        pitches: Option<&[Pitch]>,
        zone: Zone,
    ) -> Result<()> {
        let neume = self.mei.require(id)?;
        if let Some(pitches) = pitches {
            self.set_note_pitches(neume, pitches);
        }
        self.mei.detach(neume);
        self.insert(neume, before_id)?;
        self.update_or_add_zone(neume, zone)
    }

    pub fn delete_neume(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            let neume = self.mei.require(id)?;
            self.remove_zone(neume);
            self.mei.detach(neume);
        }
        Ok(())
    }

    /// Change the head of a single-note neume; the neume name follows the head
    pub fn update_neume_head_shape(&mut self, id: &str, shape: HeadShape, zone: Zone) -> Result<()> {
        let neume = self.mei.require(id)?;
        let nc = self
            .mei
            .children_by_name(neume, "nc")
            .first()
            .copied()
            .ok_or_else(|| MeiError::MissingElement(format!("nc in neume {}", id)))?;

        self.mei.set_attributes(nc, shape.nc_attributes());
        self.mei.set_attribute(neume, "name", shape.neume_name());
        self.update_or_add_zone(neume, zone)
    }

    /// Merge the notes of `ids` into one neume of type `type_id`
    ///
    /// Notes are regrouped into `nc` elements by head shape: a run of notes
    /// with the same punctum-like head shares one `nc`, any other head joins
    /// the current one.
    pub fn neumify(&mut self, ids: &[&str], type_id: &str, head_shapes: &[HeadShape], zone: Zone) -> Result<ElementId> {
        let neumes = ids
            .iter()
            .map(|id| self.mei.require(id))
            .collect::<Result<Vec<NodeId>>>()?;
        let Some(&first) = neumes.first() else {
            return Err(MeiError::MissingElement("neume to group".to_string()));
        };
        let parent = self.parent_of(first)?;

        let notes: Vec<NodeId> = neumes
            .iter()
            .flat_map(|n| self.mei.descendants_by_name(*n, "note"))
            .collect();
        if head_shapes.len() < notes.len() {
            return Err(MeiError::InvalidValue {
                element: "neume".to_string(),
                attribute: "headShapes".to_string(),
                value: format!("{} shapes for {} notes", head_shapes.len(), notes.len()),
            });
        }

        let neume_type = NeumeType::parse(type_id);
        let grouped = self.mei.create_element("neume");
        self.mei.set_attribute(grouped, "name", &neume_type.name);
        if let Some(variant) = &neume_type.variant {
            self.mei.set_attribute(grouped, "variant", variant);
        }

        let mut ncs: Vec<NodeId> = Vec::new();
        let mut current: Option<HeadShape> = None;
        for (note, head) in notes.into_iter().zip(head_shapes.iter().copied()) {
            let opens = match head {
                HeadShape::Punctum
                | HeadShape::PunctumInclinatum
                | HeadShape::PunctumInclinatumParvum
                | HeadShape::Quilisma => current != Some(head),
                _ => current.is_none(),
            };
            if opens {
                let nc = self.mei.create_element("nc");
                self.mei.set_attributes(nc, head.nc_attributes());
                ncs.push(nc);
                current = Some(if head.neume_name() == "punctum" { head } else { HeadShape::Punctum });
            }
            if let Some(&nc) = ncs.last() {
                self.mei.add_child(nc, note);
            }
        }
        self.mei.set_children(grouped, &ncs);
        self.mei.add_child_before(parent, first, grouped)?;

        for neume in neumes {
            self.remove_zone(neume);
            self.mei.detach(neume);
        }
        self.update_or_add_zone(grouped, zone)?;
        log::debug!("grouped {} neumes into {}", ids.len(), neume_type);
        Ok(self.id_of(grouped))
    }

    /// Split each neume into puncta, one per note. `zones[i]` lists the
    /// bounding boxes of the puncta made from `ids[i]`.
    pub fn ungroup(&mut self, ids: &[&str], zones: &[Vec<Zone>]) -> Result<Vec<Vec<ElementId>>> {
        let mut new_ids = Vec::with_capacity(ids.len());
        for (id, boxes) in ids.iter().zip(zones) {
            let neume = self.mei.require(id)?;
            let parent = self.parent_of(neume)?;

            let mut puncta = Vec::new();
            for (note, zone) in self.mei.descendants_by_name(neume, "note").into_iter().zip(boxes) {
                let punctum = self.mei.create_element("neume");
                self.mei.set_attribute(punctum, "name", "punctum");
                let nc = self.mei.create_element("nc");
                self.mei.add_child(nc, note);
                self.mei.add_child(punctum, nc);
                self.update_or_add_zone(punctum, *zone)?;
                self.mei.add_child_before(parent, neume, punctum)?;
                puncta.push(self.id_of(punctum));
            }
            new_ids.push(puncta);

            self.remove_zone(neume);
            self.mei.detach(neume);
        }
        Ok(new_ids)
    }

    // --- divisions ---

    pub fn insert_division(&mut self, before_id: Option<&str>, form: &str, zone: Zone) -> Result<ElementId> {
        let division = self.mei.create_element("division");
        self.mei.set_attribute(division, "form", form);
        self.insert(division, before_id)?;
        self.update_or_add_zone(division, zone)?;

        if form == "final" {
            if let Some(before) = before_id {
                let before = self.mei.require(before)?;
                self.split_staff(before)?;
            }
        }
        Ok(self.id_of(division))
    }

    pub fn move_division(&mut self, id: &str, before_id: Option<&str>, zone: Zone) -> Result<()> {
        let division = self.mei.require(id)?;
        self.update_or_add_zone(division, zone)?;

        let is_final = self.mei.attribute(division, "form") == Some("final");
        if is_final {
            let layer = self.parent_of(division)?;
            self.merge_next_staff(layer)?;
        }

        self.mei.detach(division);
        self.insert(division, before_id)?;

        if is_final {
            if let Some(before) = before_id {
                let before = self.mei.require(before)?;
                self.split_staff(before)?;
            }
        }
        Ok(())
    }

    pub fn delete_division(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            let division = self.mei.require(id)?;
            self.remove_zone(division);
            let layer = self.parent_of(division)?;
            if self.mei.attribute(division, "form") == Some("final") {
                self.merge_next_staff(layer)?;
            }
            self.mei.detach(division);
        }
        Ok(())
    }

    // --- dots ---

    /// Add a dot to a single-note neume. Other elements are left alone.
    pub fn add_dot(&mut self, id: &str, form: &str, zone: Zone) -> Result<()> {
        let punctum = self.mei.require(id)?;
        let notes = self.mei.descendants_by_name(punctum, "note");
        if self.mei.name(punctum) != "neume" || notes.len() != 1 {
            log::warn!("dots only go on single-note neumes, {} left alone", id);
            return Ok(());
        }

        if self.mei.children_by_name(notes[0], "dot").is_empty() {
            let dot = self.mei.create_element("dot");
            self.mei.set_attribute(dot, "form", form);
            self.mei.add_child(notes[0], dot);
        }
        self.update_or_add_zone(punctum, zone)
    }

    pub fn delete_dot(&mut self, id: &str, zone: Zone) -> Result<()> {
        let punctum = self.mei.require(id)?;
        if self.mei.name(punctum) != "neume" {
            return Ok(());
        }

        if let Some(&note) = self.mei.descendants_by_name(punctum, "note").first() {
            let dots = self.mei.children_by_name(note, "dot");
            if let [dot] = dots[..] {
                self.mei.remove_child(note, dot);
            }
        }
        self.update_or_add_zone(punctum, zone)
    }

    // --- clefs ---

    pub fn insert_clef(
        &mut self,
        line: i32,
        shape: ClefShape,
        pitch_info: &[PitchUpdate],
        before_id: Option<&str>,
        zone: Zone,
    ) -> Result<ElementId> {
        let clef = self.mei.create_element("clef");
        self.mei.set_attribute(clef, "shape", shape.as_str());
        self.mei.set_attribute(clef, "line", &line.to_string());

        self.insert(clef, before_id)?;
        self.update_or_add_zone(clef, zone)?;
        self.update_pitched_elements(pitch_info)?;
        Ok(self.id_of(clef))
    }

    /// Move a clef to another line of the same staff
    pub fn move_clef(&mut self, id: &str, line: i32, pitch_info: &[PitchUpdate], zone: Zone) -> Result<()> {
        let clef = self.mei.require(id)?;
        self.mei.set_attribute(clef, "line", &line.to_string());
        self.update_or_add_zone(clef, zone)?;
        self.update_pitched_elements(pitch_info)
    }

    pub fn update_clef_shape(&mut self, id: &str, shape: ClefShape, pitch_info: &[PitchUpdate], zone: Zone) -> Result<()> {
        let clef = self.mei.require(id)?;
        self.mei.set_attribute(clef, "shape", shape.as_str());
        self.update_or_add_zone(clef, zone)?;
        self.update_pitched_elements(pitch_info)
    }

    pub fn delete_clef(&mut self, clefs: &[ClefDeletion]) -> Result<()> {
        for deletion in clefs {
            let clef = self.mei.require(deletion.id.as_str())?;
            self.remove_zone(clef);
            self.mei.detach(clef);
            if let Some(pitch_info) = &deletion.pitch_info {
                self.update_pitched_elements(pitch_info)?;
            }
        }
        Ok(())
    }

    // --- custodes ---

    pub fn insert_custos(&mut self, pitch: Option<Pitch>, before_id: Option<&str>, zone: Zone) -> Result<ElementId> {
        let custos = self.mei.create_element("custos");
        if let Some(pitch) = pitch {
            set_pitch(&mut self.mei, custos, &pitch);
        }
        self.insert(custos, before_id)?;
        self.update_or_add_zone(custos, zone)?;
        Ok(self.id_of(custos))
    }

    pub fn move_custos(&mut self, id: &str, pitch: Option<Pitch>, zone: Zone) -> Result<()> {
        let custos = self.mei.require(id)?;
        if let Some(pitch) = pitch {
            set_pitch(&mut self.mei, custos, &pitch);
        }
        self.update_or_add_zone(custos, zone)
    }

    pub fn delete_custos(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            let custos = self.mei.require(id)?;
            self.remove_zone(custos);
            self.mei.detach(custos);
        }
        Ok(())
    }

    // --- systems ---

    /// Append a `system` to the given `page` element
    pub fn insert_system(&mut self, page_id: &str, zone: Zone) -> Result<ElementId> {
        let page = self.mei.require(page_id)?;
        let system = self.mei.create_element("system");
        self.mei.add_child(page, system);
        self.update_or_add_zone(system, zone)?;
        Ok(self.id_of(system))
    }

    /// Insert a system break referring to `system_id` before `next_sb_id`,
    /// or at the end of the last layer
    pub fn insert_system_break(&mut self, system_id: &str, order_number: u32, next_sb_id: Option<&str>) -> Result<ElementId> {
        let sb = self.mei.create_element("sb");
        self.mei.set_attribute(sb, "n", &order_number.to_string());
        self.mei.set_attribute(sb, "systemref", system_id);
        self.insert(sb, next_sb_id)?;
        Ok(self.id_of(sb))
    }

    pub fn modify_system_break(&mut self, sb_id: &str, order_number: u32) -> Result<()> {
        let sb = self.mei.require(sb_id)?;
        self.mei.set_attribute(sb, "n", &order_number.to_string());
        Ok(())
    }

    pub fn delete_system(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            let system = self.mei.require(id)?;
            self.remove_zone(system);
            self.mei.detach(system);
        }
        Ok(())
    }

    pub fn delete_system_break(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            let sb = self.mei.require(id)?;
            self.mei.detach(sb);
        }
        Ok(())
    }

    pub fn update_system_zone(&mut self, system_id: &str, zone: Zone) -> Result<()> {
        let system = self.mei.require(system_id)?;
        self.update_or_add_zone(system, zone)
    }

    // --- zones and pitches ---

    /// Write `zone` into the element's facsimile zone, creating the zone on
    /// the first surface when the element has none
    pub fn update_or_add_zone(&mut self, element: NodeId, zone: Zone) -> Result<()> {
        let target = match self.mei.attribute(element, "facs") {
            Some(facs) => {
                let facs = facs.trim_start_matches('#').to_string();
                self.mei.require(&facs)?
            }
            None => {
                let surface = self
                    .mei
                    .elements_by_name("surface")
                    .first()
                    .copied()
                    .ok_or_else(|| MeiError::MissingElement("surface".to_string()))?;
                let created = self.mei.create_element("zone");
                let created_id = self.id_of(created);
                self.mei.set_attribute(element, "facs", created_id.as_str());
                self.mei.add_child(surface, created);
                created
            }
        };

        let bb = zone.to_bb();
        for (name, value) in ["ulx", "uly", "lrx", "lry"].into_iter().zip(bb) {
            self.mei.set_attribute(target, name, &value.to_string());
        }
        Ok(())
    }

    /// Drop the facsimile zone of an element that is about to be removed
    pub fn remove_zone(&mut self, element: NodeId) {
        let Some(facs) = self.mei.attribute(element, "facs") else {
            return;
        };
        let facs = facs.trim_start_matches('#').to_string();
        match self.mei.get_element_by_id(&facs) {
            Some(zone) => self.mei.detach(zone),
            None => log::warn!("zone {} is already gone", facs),
        }
    }

    /// Rewrite pitches of neumes and custodes after a clef change
    pub fn update_pitched_elements(&mut self, pitch_info: &[PitchUpdate]) -> Result<()> {
        for update in pitch_info {
            let element = self.mei.require(update.id.as_str())?;
            match update.kind {
                GlyphKind::Custos => {
                    if let Some(pitch) = update.pitches.first() {
                        set_pitch(&mut self.mei, element, pitch);
                    }
                }
                GlyphKind::Neume => self.set_note_pitches(element, &update.pitches),
                other => log::debug!("{} {} has no pitch", other.as_str(), update.id),
            }
        }
        Ok(())
    }

    // --- helpers ---

    fn id_of(&self, node: NodeId) -> ElementId {
        self.mei.xml_id(node).map(ElementId::from).unwrap_or_else(ElementId::generate)
    }

    fn parent_of(&self, node: NodeId) -> Result<NodeId> {
        self.mei
            .parent(node)
            .ok_or_else(|| MeiError::MissingElement(format!("parent of <{}>", self.mei.name(node))))
    }

    fn set_note_pitches(&mut self, neume: NodeId, pitches: &[Pitch]) {
        for (note, pitch) in self.mei.descendants_by_name(neume, "note").into_iter().zip(pitches) {
            set_pitch(&mut self.mei, note, pitch);
        }
    }

    /// Put `element` before the element with id `before_id`, or at the end
    /// of the last layer when there is nothing to insert before
    fn insert(&mut self, element: NodeId, before_id: Option<&str>) -> Result<()> {
        match before_id {
            Some(before_id) => {
                let before = self.mei.require(before_id)?;
                let parent = self.parent_of(before)?;
                self.mei.add_child_before(parent, before, element)
            }
            None => {
                let layer = self
                    .mei
                    .elements_by_name("layer")
                    .last()
                    .copied()
                    .ok_or_else(|| MeiError::MissingElement("layer".to_string()))?;
                self.mei.add_child(layer, element);
                Ok(())
            }
        }
    }

    /// Close the staff of `before` so that `before` and everything after it
    /// in the layer move to a new staff right after it
    fn split_staff(&mut self, before: NodeId) -> Result<()> {
        let layer = self.parent_of(before)?;
        let staff = self.parent_of(layer)?;
        let section = self.parent_of(staff)?;

        let new_staff = self.mei.create_element("staff");
        let new_layer = self.mei.create_element("layer");
        self.mei.set_attribute(new_layer, "n", "1");
        let peers = self.mei.children(layer);
        if let Some(start) = peers.iter().position(|p| *p == before) {
            for element in &peers[start..] {
                self.mei.add_child(new_layer, *element);
            }
        }
        self.mei.add_child(new_staff, new_layer);

        let staves = self.mei.children_by_name(section, "staff");
        let index = staves
            .iter()
            .position(|s| *s == staff)
            .ok_or_else(|| MeiError::MissingElement(format!("staff around {}", self.id_of(before))))?;
        match staves.get(index + 1) {
            Some(&next) => self.mei.add_child_before(section, next, new_staff)?,
            None => self.mei.add_child(section, new_staff),
        }

        if let Some(group) = self.mei.elements_by_name("staffGrp").first().copied() {
            let defs = self.mei.children_by_name(group, "staffDef");
            if defs.len() == staves.len() {
                let def = self.mei.create_element("staffDef");
                // the new staff has the same shape as the one it was split from
                let template: Vec<(String, String)> = self.mei.attributes(defs[index]).to_vec();
                for (name, value) in template.iter().filter(|(k, _)| k != XML_ID) {
                    self.mei.set_attribute(def, name, value);
                }
                match defs.get(index + 1) {
                    Some(&next) => self.mei.add_child_before(group, next, def)?,
                    None => self.mei.add_child(group, def),
                }
            }
        }

        self.renumber_staves(section);
        Ok(())
    }

    /// Move the content of the staff after `layer`'s staff back into `layer`
    /// and drop that staff
    fn merge_next_staff(&mut self, layer: NodeId) -> Result<()> {
        let staff = self.parent_of(layer)?;
        let section = self.parent_of(staff)?;
        let staves = self.mei.children_by_name(section, "staff");
        let Some(index) = staves.iter().position(|s| *s == staff) else {
            return Ok(());
        };
        let Some(&next) = staves.get(index + 1) else {
            return Ok(());
        };
        let Some(&next_layer) = self.mei.children_by_name(next, "layer").first() else {
            return Ok(());
        };

        for element in self.mei.children(next_layer) {
            self.mei.add_child(layer, element);
        }
        self.mei.detach(next);

        if let Some(group) = self.mei.elements_by_name("staffGrp").first().copied() {
            let defs = self.mei.children_by_name(group, "staffDef");
            if defs.len() == staves.len() {
                self.mei.detach(defs[index + 1]);
            }
        }

        self.renumber_staves(section);
        Ok(())
    }

    fn renumber_staves(&mut self, section: NodeId) {
        for (i, staff) in self.mei.children_by_name(section, "staff").into_iter().enumerate() {
            self.mei.set_attribute(staff, "n", &(i + 1).to_string());
        }
        if let Some(group) = self.mei.elements_by_name("staffGrp").first().copied() {
            for (i, def) in self.mei.children_by_name(group, "staffDef").into_iter().enumerate() {
                self.mei.set_attribute(def, "n", &(i + 1).to_string());
            }
        }
    }
}

fn set_pitch(mei: &mut MeiDocument, node: NodeId, pitch: &Pitch) {
    mei.set_attribute(node, "pname", pitch.pname.as_str());
    mei.set_attribute(node, "oct", &pitch.oct.to_string());
}
