//! WASM build test
//!
//! Drives the exported plugin API in a browser: attaching, the load round
//! and a first edit.

#![cfg(target_arch = "wasm32")]

use neon_wasm::api;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const PAGE: &str = include_str!("fixtures/two_systems.mei");
const GLYPHS: &str = include_str!("fixtures/glyphs.svg");

fn host(id: &str) {
    let document = web_sys::window().unwrap().document().unwrap();
    let div = document.create_element("div").unwrap();
    div.set_id(id);
    document.body().unwrap().append_child(&div).unwrap();
}

fn json(text: &str) -> JsValue {
    js_sys::JSON::parse(text).unwrap()
}

#[wasm_bindgen_test]
fn test_attach_is_idempotent() {
    host("neon-attach");
    assert!(api::attach("neon-attach", JsValue::UNDEFINED).unwrap());
    assert!(!api::attach("neon-attach", JsValue::UNDEFINED).unwrap());
    assert_eq!(api::glyph_url("neon-attach").unwrap(), "/static/img/neumes_concat.svg");
    assert!(api::detach("neon-attach").unwrap());
    assert!(!api::detach("neon-attach").unwrap());
}

#[wasm_bindgen_test]
fn test_unattached_element_is_rejected() {
    assert!(api::begin_load("neon-missing").is_err());
}

#[wasm_bindgen_test]
fn test_load_round_mounts_canvas() {
    host("neon-load");
    let settings = json(r#"{"autoLoad": true, "filename": "folio_18r"}"#);
    assert!(api::attach("neon-load", settings).unwrap());
    assert_eq!(api::mei_url("neon-load").unwrap(), "/folio_18r/mei");

    let ticket = api::begin_load("neon-load").unwrap();
    assert!(api::set_glyphs("neon-load", ticket, GLYPHS).unwrap());
    assert!(api::set_mei("neon-load", ticket, PAGE).unwrap());
    assert!(!api::set_mei("neon-load", ticket + 1, PAGE).unwrap());
    api::loaded("neon-load").unwrap();

    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document.get_element_by_id("neon-canvas").unwrap();
    assert_eq!(canvas.get_attribute("width").as_deref(), Some("900"));

    let zone = json(r#"{"ulx": 250, "uly": 210, "lrx": 265, "lry": 230}"#);
    assert!(api::insert_punctum("neon-load", zone).is_ok());
    assert!(api::get_mei("neon-load").unwrap().unwrap().contains("neume"));
    api::detach("neon-load").unwrap();
}
