//! WASM API for the neume editor
//!
//! Every host element gets at most one [`Editor`], kept in a process-wide
//! registry keyed by the element's DOM id. All calls name the element they
//! act on.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::NeonSettings;
use crate::editor::{Editor, LoadTicket};
use crate::models::{ClefShape, DivisionForm, ElementId, HeadShape, SystemId, Zone};
use crate::renderers::DisplayList;
use crate::{wasm_error, wasm_info, wasm_warn};

use super::canvas::mount_canvas;
use super::helpers::{deserialize, deserialize_or_default, editor_error, serialize, validation_error};

lazy_static! {
    static ref EDITORS: Mutex<HashMap<String, Editor>> = Mutex::new(HashMap::new());
}

// ============================================================================
// Result structures
// ============================================================================

/// Result of an editing call: what the operation returned plus the canvas
/// operations it caused
#[derive(Serialize, Debug)]
pub struct EditResult<T> {
    pub result: T,
    pub display: DisplayList,
}

// ============================================================================
// Registry access
// ============================================================================

fn with_editor<T, F>(element_id: &str, context: &str, f: F) -> Result<T, JsValue>
where
    F: FnOnce(&mut Editor) -> crate::error::Result<T>,
{
    let mut editors = EDITORS
        .lock()
        .map_err(|_| validation_error(format!("{}: editor registry is poisoned", context)))?;
    let editor = editors
        .get_mut(element_id)
        .ok_or_else(|| validation_error(format!("{}: no editor attached to '{}'", context, element_id)))?;
    f(editor).map_err(|e| editor_error(context, e))
}

/// Run an editing operation and hand back its result with the display list
fn edit<T, F>(element_id: &str, context: &str, f: F) -> Result<JsValue, JsValue>
where
    T: Serialize,
    F: FnOnce(&mut Editor) -> crate::error::Result<T>,
{
    let outcome = with_editor(element_id, context, |editor| {
        let result = f(editor)?;
        let display = editor.take_display_list()?;
        Ok(EditResult { result, display })
    })?;
    serialize(&outcome, context)
}

fn parse_shape<T: std::str::FromStr<Err = String>>(value: &str, context: &str) -> Result<T, JsValue> {
    value
        .parse::<T>()
        .map_err(|e| validation_error(format!("{}: {}", context, e)))
}

// ============================================================================
// Attachment and loading
// ============================================================================

/// Attach an editor to a DOM element. Returns false when the element already
/// has one; the existing editor is kept untouched.
#[wasm_bindgen(js_name = attach)]
pub fn attach(element_id: &str, options: JsValue) -> Result<bool, JsValue> {
    let settings: NeonSettings = deserialize_or_default(options, "attach settings")?;
    let mut editors = EDITORS
        .lock()
        .map_err(|_| validation_error("attach: editor registry is poisoned"))?;

    if editors.contains_key(element_id) {
        wasm_warn!("#{} already has an editor attached", element_id);
        return Ok(false);
    }
    wasm_info!(
        "attaching editor to #{} (autoLoad={}, filename='{}')",
        element_id,
        settings.auto_load,
        settings.filename
    );
    editors.insert(element_id.to_string(), Editor::new(settings));
    Ok(true)
}

#[wasm_bindgen(js_name = detach)]
pub fn detach(element_id: &str) -> Result<bool, JsValue> {
    let mut editors = EDITORS
        .lock()
        .map_err(|_| validation_error("detach: editor registry is poisoned"))?;
    Ok(editors.remove(element_id).is_some())
}

/// Settings in effect, with the fixed canvas id filled in
#[wasm_bindgen(js_name = getSettings)]
pub fn get_settings(element_id: &str) -> Result<JsValue, JsValue> {
    let settings = with_editor(element_id, "getSettings", |editor| Ok(editor.settings().clone()))?;
    serialize(&settings, "getSettings")
}

/// URL of the glyph sprite sheet
#[wasm_bindgen(js_name = glyphUrl)]
pub fn glyph_url(element_id: &str) -> Result<String, JsValue> {
    with_editor(element_id, "glyphUrl", |editor| Ok(editor.settings().glyph_url().to_string()))
}

/// URL of the MEI document, used when auto load is on
#[wasm_bindgen(js_name = meiUrl)]
pub fn mei_url(element_id: &str) -> Result<String, JsValue> {
    with_editor(element_id, "meiUrl", |editor| Ok(editor.settings().mei_url()))
}

/// Start a load round; pass the returned ticket back with every response
#[wasm_bindgen(js_name = beginLoad)]
pub fn begin_load(element_id: &str) -> Result<u32, JsValue> {
    with_editor(element_id, "beginLoad", |editor| Ok(editor.begin_load().0))
}

#[wasm_bindgen(js_name = setGlyphs)]
pub fn set_glyphs(element_id: &str, ticket: u32, svg: &str) -> Result<bool, JsValue> {
    with_editor(element_id, "setGlyphs", |editor| editor.set_glyphs(LoadTicket(ticket), svg))
}

#[wasm_bindgen(js_name = setMei)]
pub fn set_mei(element_id: &str, ticket: u32, mei: &str) -> Result<bool, JsValue> {
    with_editor(element_id, "setMei", |editor| editor.set_mei(LoadTicket(ticket), mei))
}

/// All responses are in: mount the canvas and return the first display list
#[wasm_bindgen(js_name = loaded)]
pub fn loaded(element_id: &str) -> Result<JsValue, JsValue> {
    let display = with_editor(element_id, "loaded", |editor| editor.loaded())?;
    mount_canvas(element_id, &display.canvas).map_err(|e| {
        wasm_error!("could not mount the canvas in #{}: {:?}", element_id, e);
        e
    })?;
    wasm_info!("Load successful. Neon ready.");
    serialize(&display, "loaded")
}

#[wasm_bindgen(js_name = takeDisplayList)]
pub fn take_display_list(element_id: &str) -> Result<JsValue, JsValue> {
    let display = with_editor(element_id, "takeDisplayList", |editor| editor.take_display_list())?;
    serialize(&display, "takeDisplayList")
}

/// The edited MEI document, or undefined when none was loaded
#[wasm_bindgen(js_name = getMei)]
pub fn get_mei(element_id: &str) -> Result<Option<String>, JsValue> {
    with_editor(element_id, "getMei", |editor| editor.mei_text())
}

// ============================================================================
// Neumes
// ============================================================================

#[wasm_bindgen(js_name = insertPunctum)]
pub fn insert_punctum(element_id: &str, zone: JsValue) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "insertPunctum zone")?;
    edit(element_id, "insertPunctum", |editor| editor.insert_punctum(zone))
}

#[wasm_bindgen(js_name = moveNeume)]
pub fn move_neume(element_id: &str, id: &str, steps: i32) -> Result<JsValue, JsValue> {
    edit(element_id, "moveNeume", |editor| editor.move_neume(&ElementId::from(id), steps))
}

/// Drag a neume along its system; returns the pitch changes this causes
#[wasm_bindgen(js_name = dragNeume)]
pub fn drag_neume(element_id: &str, id: &str, zone: JsValue) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "dragNeume zone")?;
    edit(element_id, "dragNeume", |editor| editor.drag_neume(&ElementId::from(id), zone))
}

#[wasm_bindgen(js_name = updateNeumeHeadShape)]
pub fn update_neume_head_shape(element_id: &str, id: &str, shape: &str) -> Result<JsValue, JsValue> {
    let shape: HeadShape = parse_shape(shape, "updateNeumeHeadShape")?;
    edit(element_id, "updateNeumeHeadShape", |editor| {
        editor.update_neume_head_shape(&ElementId::from(id), shape)
    })
}

#[wasm_bindgen(js_name = neumify)]
pub fn neumify(element_id: &str, ids: JsValue, type_id: &str) -> Result<JsValue, JsValue> {
    let ids: Vec<ElementId> = deserialize(ids, "neumify ids")?;
    edit(element_id, "neumify", |editor| editor.neumify(&ids, type_id))
}

#[wasm_bindgen(js_name = ungroup)]
pub fn ungroup(element_id: &str, id: &str) -> Result<JsValue, JsValue> {
    edit(element_id, "ungroup", |editor| editor.ungroup(&ElementId::from(id)))
}

#[wasm_bindgen(js_name = addDot)]
pub fn add_dot(element_id: &str, id: &str, form: &str) -> Result<JsValue, JsValue> {
    edit(element_id, "addDot", |editor| editor.add_dot(&ElementId::from(id), form))
}

#[wasm_bindgen(js_name = deleteDot)]
pub fn delete_dot(element_id: &str, id: &str) -> Result<JsValue, JsValue> {
    edit(element_id, "deleteDot", |editor| editor.delete_dot(&ElementId::from(id)))
}

// ============================================================================
// Divisions, clefs and custodes
// ============================================================================

#[wasm_bindgen(js_name = insertDivision)]
pub fn insert_division(element_id: &str, zone: JsValue, form: &str) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "insertDivision zone")?;
    let form: DivisionForm = parse_shape(form, "insertDivision")?;
    edit(element_id, "insertDivision", |editor| editor.insert_division(zone, form))
}

#[wasm_bindgen(js_name = moveDivision)]
pub fn move_division(element_id: &str, id: &str, zone: JsValue) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "moveDivision zone")?;
    edit(element_id, "moveDivision", |editor| editor.move_division(&ElementId::from(id), zone))
}

#[wasm_bindgen(js_name = insertClef)]
pub fn insert_clef(element_id: &str, zone: JsValue, shape: &str, line: i32) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "insertClef zone")?;
    let shape: ClefShape = parse_shape(shape, "insertClef")?;
    edit(element_id, "insertClef", |editor| editor.insert_clef(zone, shape, line))
}

/// Returns the pitch changes on the staff along with the display list
#[wasm_bindgen(js_name = moveClef)]
pub fn move_clef(element_id: &str, id: &str, line: i32) -> Result<JsValue, JsValue> {
    edit(element_id, "moveClef", |editor| editor.move_clef(&ElementId::from(id), line))
}

#[wasm_bindgen(js_name = updateClefShape)]
pub fn update_clef_shape(element_id: &str, id: &str, shape: &str) -> Result<JsValue, JsValue> {
    let shape: ClefShape = parse_shape(shape, "updateClefShape")?;
    edit(element_id, "updateClefShape", |editor| {
        editor.update_clef_shape(&ElementId::from(id), shape)
    })
}

#[wasm_bindgen(js_name = insertCustos)]
pub fn insert_custos(element_id: &str, zone: JsValue) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "insertCustos zone")?;
    edit(element_id, "insertCustos", |editor| editor.insert_custos(zone))
}

#[wasm_bindgen(js_name = moveCustos)]
pub fn move_custos(element_id: &str, id: &str, system_pos: i32) -> Result<JsValue, JsValue> {
    edit(element_id, "moveCustos", |editor| editor.move_custos(&ElementId::from(id), system_pos))
}

/// Delete glyphs of any kind, given as an array of ids
#[wasm_bindgen(js_name = deleteElements)]
pub fn delete_elements(element_id: &str, ids: js_sys::Array) -> Result<JsValue, JsValue> {
    let ids: Vec<ElementId> = ids
        .iter()
        .map(|v| {
            v.as_string()
                .map(ElementId::from)
                .ok_or_else(|| validation_error("deleteElements: ids must be strings"))
        })
        .collect::<Result<_, _>>()?;
    edit(element_id, "deleteElements", |editor| editor.delete(&ids))
}

#[wasm_bindgen(js_name = selectElement)]
pub fn select_element(element_id: &str, id: &str) -> Result<JsValue, JsValue> {
    edit(element_id, "selectElement", |editor| editor.select(&ElementId::from(id)))
}

// ============================================================================
// Systems
// ============================================================================

#[wasm_bindgen(js_name = insertSystem)]
pub fn insert_system(element_id: &str, zone: JsValue) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "insertSystem zone")?;
    edit(element_id, "insertSystem", |editor| editor.insert_system(zone))
}

#[wasm_bindgen(js_name = deleteSystem)]
pub fn delete_system(element_id: &str, system_id: u32) -> Result<JsValue, JsValue> {
    edit(element_id, "deleteSystem", |editor| editor.delete_system(SystemId(system_id)))
}

#[wasm_bindgen(js_name = updateSystemZone)]
pub fn update_system_zone(element_id: &str, system_id: u32, zone: JsValue) -> Result<JsValue, JsValue> {
    let zone: Zone = deserialize(zone, "updateSystemZone zone")?;
    edit(element_id, "updateSystemZone", |editor| {
        editor.update_system_zone(SystemId(system_id), zone)
    })
}
