//! MEI input and output
//!
//! [`parser`] builds the page model from a document, [`modify`] writes
//! editing actions back into it. Both work on the same owned element tree.

pub mod document;
pub mod modify;
pub mod parser;

pub use document::{MeiDocument, NodeId, XML_ID};
pub use modify::{ClefDeletion, ModifyDocument};
pub use parser::{calc_page_dimensions, load_page, neume_from_mei, LoadOptions, LoadSummary};
