//! Identifiers and the glyph enum shared by all systems

use serde::{Deserialize, Serialize};
use std::fmt;

use super::clef::Clef;
use super::custos::Custos;
use super::division::Division;
use super::neume::Neume;
use super::zone::Zone;

/// Glyph identifier (the MEI `xml:id` when loaded from a document)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    /// Fresh id in the `m-<uuid>` form used by MEI tooling
    pub fn generate() -> Self {
        ElementId(format!("m-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        ElementId(s)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page-local system handle
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SystemId(pub u32);

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system#{}", self.0)
    }
}

/// Kind tag, used in error messages and display-list metadata
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GlyphKind {
    Neume,
    Custos,
    Clef,
    Division,
}

impl GlyphKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GlyphKind::Neume => "Neume",
            GlyphKind::Custos => "Custos",
            GlyphKind::Clef => "Clef",
            GlyphKind::Division => "Division",
        }
    }
}

/// Any element that can be mounted on a system
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Glyph {
    Neume(Neume),
    Custos(Custos),
    Clef(Clef),
    Division(Division),
}

impl Glyph {
    pub fn id(&self) -> &ElementId {
        match self {
            Glyph::Neume(n) => &n.id,
            Glyph::Custos(c) => &c.id,
            Glyph::Clef(c) => &c.id,
            Glyph::Division(d) => &d.id,
        }
    }

    pub fn kind(&self) -> GlyphKind {
        match self {
            Glyph::Neume(_) => GlyphKind::Neume,
            Glyph::Custos(_) => GlyphKind::Custos,
            Glyph::Clef(_) => GlyphKind::Clef,
            Glyph::Division(_) => GlyphKind::Division,
        }
    }

    pub fn zone(&self) -> &Zone {
        match self {
            Glyph::Neume(n) => &n.zone,
            Glyph::Custos(c) => &c.zone,
            Glyph::Clef(c) => &c.zone,
            Glyph::Division(d) => &d.zone,
        }
    }

    pub fn set_zone(&mut self, zone: Zone) {
        match self {
            Glyph::Neume(n) => n.zone = zone,
            Glyph::Custos(c) => c.zone = zone,
            Glyph::Clef(c) => c.zone = zone,
            Glyph::Division(d) => d.zone = zone,
        }
    }

    /// Owning system, if mounted
    pub fn system(&self) -> Option<SystemId> {
        match self {
            Glyph::Neume(n) => n.system,
            Glyph::Custos(c) => c.system,
            Glyph::Clef(c) => c.system,
            Glyph::Division(d) => d.system,
        }
    }

    pub(crate) fn set_system(&mut self, system: Option<SystemId>) {
        match self {
            Glyph::Neume(n) => n.system = system,
            Glyph::Custos(c) => c.system = system,
            Glyph::Clef(c) => c.system = system,
            Glyph::Division(d) => d.system = system,
        }
    }

    pub fn as_neume(&self) -> Option<&Neume> {
        match self {
            Glyph::Neume(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_custos(&self) -> Option<&Custos> {
        match self {
            Glyph::Custos(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_clef(&self) -> Option<&Clef> {
        match self {
            Glyph::Clef(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_division(&self) -> Option<&Division> {
        match self {
            Glyph::Division(d) => Some(d),
            _ => None,
        }
    }
}
