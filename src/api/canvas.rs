//! Canvas element management
//!
//! The editor draws on a single `<canvas>` placed at the top of the element
//! it is attached to.

use wasm_bindgen::prelude::*;

use crate::renderers::CanvasSpec;

/// Create the canvas described by `spec` and prepend it to the host element.
/// A canvas left over from an earlier load is replaced.
pub fn mount_canvas(element_id: &str, spec: &CanvasSpec) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document to attach the canvas to"))?;
    let host = document
        .get_element_by_id(element_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", element_id)))?;

    if let Some(old) = document.get_element_by_id(&spec.id) {
        old.remove();
    }

    let canvas = document.create_element("canvas")?;
    canvas.set_id(&spec.id);
    canvas.set_attribute("width", &spec.width.to_string())?;
    canvas.set_attribute("height", &spec.height.to_string())?;
    canvas.set_attribute("style", &spec.style)?;
    host.prepend_with_node_1(&canvas)?;

    crate::wasm_log!("canvas #{} ({}x{}) mounted in #{}", spec.id, spec.width, spec.height, element_id);
    Ok(())
}
