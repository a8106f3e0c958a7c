//! Models module for the neume editor
//!
//! This module contains the page, system and glyph models that the MEI
//! loader builds and the views draw.

pub mod clef;
pub mod custos;
pub mod division;
pub mod glyph;
pub mod neume;
pub mod page;
pub mod pitch;
pub mod system;
pub mod zone;

// Re-export commonly used types
pub use clef::{Clef, ClefShape};
pub use custos::Custos;
pub use division::{Division, DivisionForm};
pub use glyph::{ElementId, Glyph, GlyphKind, SystemId};
pub use neume::{HeadShape, Neume, NeumeComponent, NeumeType};
pub use page::{AddOptions, Page, PitchUpdate};
pub use pitch::{Pitch, PitchName};
pub use system::{System, SystemKind, SystemOptions};
pub use zone::Zone;
