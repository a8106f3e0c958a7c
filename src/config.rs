//! Editor settings
//!
//! Settings arrive from the host page as a plain object. Every field has a
//! default; the canvas id is fixed and cannot be overridden.

use serde::{Deserialize, Serialize};

/// DOM id of the editor canvas
pub const CANVAS_ID: &str = "neon-canvas";

/// Sprite sheet with every glyph
pub const GLYPH_URL: &str = "/static/img/neumes_concat.svg";

/// Notation family of the manuscript
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    /// Square notation on a four line staff
    #[default]
    Square,
    /// Staffless (cheironomic) neumes
    Cheironomic,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NeonSettings {
    pub width: u32,
    pub height: u32,
    /// Fetch and render the MEI file named by `filename` once loading ends
    pub auto_load: bool,
    pub filename: String,
    /// Outline bounding boxes while rendering
    pub debug: bool,
    pub notation: Notation,
    /// Lines per staff for square notation
    pub num_lines: u32,
    #[serde(skip_deserializing)]
    canvas_id: String,
}

impl Default for NeonSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            auto_load: false,
            filename: String::new(),
            debug: false,
            notation: Notation::Square,
            num_lines: 4,
            canvas_id: CANVAS_ID.to_string(),
        }
    }
}

impl NeonSettings {
    pub fn canvas_id(&self) -> &str {
        &self.canvas_id
    }

    pub fn glyph_url(&self) -> &'static str {
        GLYPH_URL
    }

    /// Where the host fetches the MEI document from
    pub fn mei_url(&self) -> String {
        format!("/{}/mei", self.filename)
    }

    /// Settings from a JSON object, missing fields defaulted
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = NeonSettings::default();
        assert_eq!((settings.width, settings.height), (1000, 1000));
        assert!(!settings.auto_load);
        assert_eq!(settings.canvas_id(), "neon-canvas");
        assert_eq!(settings.glyph_url(), "/static/img/neumes_concat.svg");
    }

    #[test]
    fn test_overrides_keep_other_defaults() {
        let settings = NeonSettings::from_json(r#"{"autoLoad": true, "filename": "salzinnes_018", "notation": "cheironomic"}"#)
            .unwrap();
        assert!(settings.auto_load);
        assert_eq!(settings.width, 1000);
        assert_eq!(settings.notation, Notation::Cheironomic);
        assert_eq!(settings.mei_url(), "/salzinnes_018/mei");
    }

    #[test]
    fn test_canvas_id_cannot_be_overridden() {
        let settings = NeonSettings::from_json(r#"{"canvasId": "mine"}"#).unwrap();
        assert_eq!(settings.canvas_id(), "neon-canvas");
    }
}
