// Editing sessions driven end to end through the Editor: load the fixture
// page, edit it, and check both the page model and the saved MEI.

use neon_wasm::editor::Editor;
use neon_wasm::models::{ClefShape, DivisionForm, ElementId, GlyphKind, Pitch, PitchName, Zone};
use neon_wasm::renderers::DrawCommand;
use neon_wasm::NeonSettings;

const PAGE: &str = include_str!("fixtures/two_systems.mei");
const GLYPHS: &str = include_str!("fixtures/glyphs.svg");

fn open(mei: &str) -> Editor {
    let settings = NeonSettings::from_json(r#"{"autoLoad": true, "filename": "folio_18r"}"#)
        .expect("settings should parse");
    let mut editor = Editor::new(settings);
    let ticket = editor.begin_load();
    editor.set_glyphs(ticket, GLYPHS).expect("glyphs should load");
    editor.set_mei(ticket, mei).expect("MEI should parse");
    editor.loaded().expect("page should load");
    editor
}

fn pitch(name: PitchName, oct: i32) -> Option<Pitch> {
    Some(Pitch::new(name, oct))
}

#[test]
fn test_edits_survive_save_and_reload() {
    let mut editor = open(PAGE);
    let custos = ElementId::from("cu1");
    // the c clef sits on the top line, so staff position 0 is c4
    editor.move_custos(&custos, 0).unwrap();
    editor.move_neume(&ElementId::from("n4"), 1).unwrap();
    assert_eq!(editor.page().custos(&custos).unwrap().pitch, pitch(PitchName::C, 4));

    let saved = editor.mei_text().unwrap().expect("a document was loaded");
    let reopened = open(&saved);
    assert_eq!(reopened.page().custos(&custos).unwrap().pitch, pitch(PitchName::C, 4));
    assert_eq!(
        reopened.page().neume(&ElementId::from("n4")).unwrap().root_pitch,
        pitch(PitchName::G, 3)
    );
    assert_eq!(reopened.page().systems().len(), 2);
}

#[test]
fn test_clef_shape_change_repitches_staff() {
    let mut editor = open(PAGE);
    let updates = editor.update_clef_shape(&ElementId::from("clef1"), ClefShape::F).unwrap();

    // every pitched glyph on the first staff moves down a sixth
    assert_eq!(updates.len(), 4);
    assert!(updates.iter().any(|u| u.kind == GlyphKind::Custos));
    assert_eq!(
        editor.page().neume(&ElementId::from("n1")).unwrap().root_pitch,
        pitch(PitchName::D, 3)
    );

    let mei = editor.mei().unwrap().document();
    assert_eq!(mei.attribute(mei.require("clef1").unwrap(), "shape"), Some("F"));
    assert_eq!(mei.attribute(mei.require("note1").unwrap(), "pname"), Some("d"));
    assert_eq!(mei.attribute(mei.require("cu1").unwrap(), "pname"), Some("d"));
}

#[test]
fn test_final_division_splits_staff_until_deleted() {
    let mut editor = open(PAGE);
    let division = editor
        .insert_division(Zone::new(350, 200, 353, 260), DivisionForm::Final)
        .unwrap();

    let mei = editor.mei().unwrap().document();
    assert_eq!(mei.elements_by_name("staff").len(), 2);
    let node = mei.require(division.as_str()).unwrap();
    // the division closes the first staff; n3 opens the new one
    let peers = mei.peers(node);
    assert!(!peers.iter().any(|n| mei.xml_id(*n) == Some("n3")));

    editor.delete(&[division]).unwrap();
    let mei = editor.mei().unwrap().document();
    assert_eq!(mei.elements_by_name("staff").len(), 1);
    assert!(mei.require("n3").is_ok());
}

#[test]
fn test_selection_reaches_the_canvas() {
    let mut editor = open(PAGE);
    editor.select(&ElementId::from("n2")).unwrap();
    let display = editor.take_display_list().unwrap();
    assert!(display
        .commands
        .iter()
        .any(|c| matches!(c, DrawCommand::SetActive { .. })));
}

#[test]
fn test_unknown_element_is_reported() {
    let mut editor = open(PAGE);
    let err = editor.move_neume(&ElementId::from("nope"), 1).unwrap_err();
    assert!(err.to_string().contains("nope"));
}

fn layer_order(editor: &Editor, id: &str) -> Vec<String> {
    let mei = editor.mei().unwrap().document();
    let node = mei.require(id).unwrap();
    mei.peers(node)
        .into_iter()
        .filter_map(|n| mei.xml_id(n).map(str::to_string))
        .collect()
}

fn position(order: &[String], id: &str) -> usize {
    order.iter().position(|i| i == id).unwrap()
}

#[test]
fn test_drag_neume_across_clef() {
    let mut editor = open(PAGE);
    let clef = editor.insert_clef(Zone::new(350, 215, 362, 245), ClefShape::F, 3).unwrap();
    let n1 = ElementId::from("n1");

    let updates = editor.drag_neume(&n1, Zone::new(370, 215, 385, 235)).unwrap();
    // same staff position, now read against the f clef on the second line
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, n1);
    assert_eq!(editor.page().neume(&n1).unwrap().root_pitch, pitch(PitchName::F, 3));

    let order = layer_order(&editor, "n1");
    assert!(position(&order, "n2") < position(&order, clef.as_str()));
    assert!(position(&order, clef.as_str()) < position(&order, "n1"));
    assert!(position(&order, "n1") < position(&order, "n3"));
    let mei = editor.mei().unwrap().document();
    assert_eq!(mei.attribute(mei.require("note1").unwrap(), "pname"), Some("f"));
}

#[test]
fn test_move_division_reorders_document() {
    let mut editor = open(PAGE);
    let div = ElementId::from("div1");
    editor.move_division(&div, Zone::new(150, 400, 153, 460)).unwrap();

    let system = editor.page().division(&div).unwrap().system.unwrap();
    let on_page: Vec<&str> = editor
        .page()
        .system(system)
        .unwrap()
        .elements()
        .map(ElementId::as_str)
        .collect();
    assert_eq!(on_page, vec!["clef2", "div1", "n4"]);

    let order = layer_order(&editor, "div1");
    assert_eq!(position(&order, "div1") + 1, position(&order, "n4"));
    let mei = editor.mei().unwrap().document();
    let zone = mei.attribute(mei.require("div1").unwrap(), "facs").unwrap().trim_start_matches('#').to_string();
    assert_eq!(mei.attribute(mei.require(&zone).unwrap(), "ulx"), Some("150"));
}

#[test]
fn test_rejected_neumify_changes_nothing() {
    let mut editor = open(PAGE);
    let before = editor.mei_text().unwrap();
    let n1 = ElementId::from("n1");

    assert!(editor.neumify(&[n1.clone(), n1.clone()], "clivis").is_err());
    assert_eq!(editor.mei_text().unwrap(), before);
    assert!(editor.page().neume(&n1).is_ok());
    assert_eq!(editor.page().glyphs().count(), 8);
}
