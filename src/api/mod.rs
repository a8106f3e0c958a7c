//! Neume editor WASM API
//!
//! The JavaScript-facing surface of the editor.
//!
//! # Module Structure
//!
//! - `helpers`: console logging, serde conversion and error mapping
//! - `canvas`: creation of the editor canvas in the host element
//! - `core`: the editor registry and every exported operation

pub mod helpers;
pub mod canvas;
pub mod core;

pub use core::*;
