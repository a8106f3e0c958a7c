//! Error types for the neume editor
//!
//! `NeonError` is the crate-level error. MEI document problems are kept in
//! their own `MeiError` hierarchy and wrapped on the way up.

use thiserror::Error;

use crate::models::{ElementId, SystemId};

/// Crate-level result type
pub type Result<T> = std::result::Result<T, NeonError>;

/// Top-level editor error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NeonError {
    /// Wrong kind of object passed to a model operation
    #[error("{0}")]
    InvalidArgument(String),

    /// A view was asked to draw but no canvas has been attached yet
    #[error("{0}: Invalid render context")]
    InvalidRenderContext(&'static str),

    /// A view update was requested before anything was drawn
    #[error("{0}: update method called, but there exists no drawing to update.")]
    NoDrawing(&'static str),

    /// `loaded()` was reached before width/height were known
    #[error("Page dimensions have not been set.")]
    DimensionsNotSet,

    #[error("Unknown system: {0}")]
    UnknownSystem(SystemId),

    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),

    /// MEI document failure
    #[error("MEI error: {0}")]
    Mei(#[from] MeiError),
}

impl NeonError {
    pub fn invalid(context: &str, message: &str) -> Self {
        NeonError::InvalidArgument(format!("{}: {}", context, message))
    }
}

/// MEI parsing and editing errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeiError {
    /// XML is not well-formed
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// Required structural element is missing
    #[error("Missing required element: {0}")]
    MissingElement(String),

    #[error("Element <{element}> is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
    },

    /// An xml:id reference points nowhere
    #[error("No element with id '{0}'")]
    ElementNotFound(String),

    #[error("Failed to write MEI: {0}")]
    Write(String),
}
