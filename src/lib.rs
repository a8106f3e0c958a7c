//! Neume Editor WASM Module
//!
//! Editor for neume notation on digitized manuscript pages. MEI documents
//! with facsimile zones are loaded into a page model, drawn through views
//! onto a canvas display list, and edits are mirrored back into the MEI.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod mei;
pub mod renderers;
pub mod views;
pub mod controllers;
pub mod editor;
pub mod api;

// Re-export commonly used types
pub use config::NeonSettings;
pub use editor::{Editor, LoadTicket};
pub use error::{MeiError, NeonError, Result};
pub use models::*;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already initialized: {}", e).into());
    }

    log::info!("Neume editor WASM module initialized");
}
