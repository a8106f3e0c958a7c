//! Glyph sprite sheet
//!
//! The neume glyphs ship as one concatenated SVG document: an outer `<svg>`
//! holding one inner `<svg>` per glyph, each with a single `<path id="...">`
//! naming the glyph.

use roxmltree::Document as XmlDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::MeiError;

/// One glyph from the sprite sheet, in unscaled sheet units unless it came
/// back from [`GlyphSprite::scaled`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GlyphSprite {
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Centre point relative to the glyph's upper-left corner
    pub centre: (f64, f64),
    /// Raw SVG source for the host canvas
    #[serde(skip)]
    pub svg: String,
}

impl GlyphSprite {
    pub fn new(id: &str, width: f64, height: f64) -> Self {
        Self {
            id: id.to_string(),
            width,
            height,
            centre: (width / 2.0, height / 2.0),
            svg: String::new(),
        }
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            id: self.id.clone(),
            width: self.width * scale,
            height: self.height * scale,
            centre: (self.centre.0 * scale, self.centre.1 * scale),
            svg: self.svg.clone(),
        }
    }
}

/// All glyphs keyed by id
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GlyphSet {
    glyphs: BTreeMap<String, GlyphSprite>,
}

impl GlyphSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a concatenated SVG sprite sheet
    pub fn from_svg(text: &str) -> Result<Self, MeiError> {
        let doc = XmlDocument::parse(text).map_err(|e| MeiError::InvalidXml(e.to_string()))?;
        let mut set = GlyphSet::new();

        for svg in doc.descendants().filter(|n| n.has_tag_name("svg")) {
            // only the innermost svg elements describe glyphs
            if svg.descendants().skip(1).any(|n| n.has_tag_name("svg")) {
                continue;
            }
            let Some(path) = svg.descendants().find(|n| n.has_tag_name("path")) else {
                continue;
            };
            let Some(id) = path.attribute("id") else {
                log::warn!("sprite sheet: glyph path without id skipped");
                continue;
            };

            let (vb_w, vb_h) = svg
                .attribute("viewBox")
                .and_then(parse_view_box)
                .unwrap_or((0.0, 0.0));
            let width = svg.attribute("width").and_then(parse_length).unwrap_or(vb_w);
            let height = svg.attribute("height").and_then(parse_length).unwrap_or(vb_h);

            let mut sprite = GlyphSprite::new(id, width, height);
            sprite.svg = text[svg.range()].to_string();
            set.insert(sprite);
        }

        log::info!("loaded {} glyphs", set.len());
        Ok(set)
    }

    pub fn insert(&mut self, sprite: GlyphSprite) {
        self.glyphs.insert(sprite.id.clone(), sprite);
    }

    pub fn get(&self, id: &str) -> Option<&GlyphSprite> {
        self.glyphs.get(id)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.glyphs.keys().map(String::as_str)
    }
}

/// "12.5px" → 12.5
fn parse_length(value: &str) -> Option<f64> {
    let numeric: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    numeric.parse().ok()
}

fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, w, h] => Some((*w, *h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <svg width="20px" height="18"><path id="punctum" d="M0 0h20v18H0z"/></svg>
  <svg viewBox="0 0 12 40"><path id="custos" d="M0 0h12v40H0z"/></svg>
  <svg width="5" height="5"><path d="M0 0"/></svg>
</svg>"#;

    #[test]
    fn test_parse_sprite_sheet() {
        let set = GlyphSet::from_svg(SHEET).unwrap();
        assert_eq!(set.len(), 2);

        let punctum = set.get("punctum").unwrap();
        assert_eq!((punctum.width, punctum.height), (20.0, 18.0));
        assert_eq!(punctum.centre, (10.0, 9.0));
        assert!(punctum.svg.starts_with("<svg"));

        let custos = set.get("custos").unwrap();
        assert_eq!((custos.width, custos.height), (12.0, 40.0));
    }

    #[test]
    fn test_scaled() {
        let g = GlyphSprite::new("punctum", 20.0, 10.0).scaled(0.5);
        assert_eq!((g.width, g.height, g.centre), (10.0, 5.0, (5.0, 2.5)));
    }

    #[test]
    fn test_invalid_sheet() {
        assert!(matches!(GlyphSet::from_svg("<svg"), Err(MeiError::InvalidXml(_))));
    }
}
