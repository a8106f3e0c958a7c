//! Neumes and their components
//!
//! A neume is a group of note components (`nc`). The first component carries
//! the root pitch; every other component is stored as a difference in
//! diatonic steps from that root, so moving a neume vertically only touches
//! the root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::glyph::{ElementId, SystemId};
use super::pitch::Pitch;
use super::zone::Zone;

/// Note head shape of a single neume component
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeadShape {
    Punctum,
    PunctumInclinatum,
    PunctumInclinatumParvum,
    Quilisma,
    Virga,
    Cavum,
    Tractulus,
    Gravis,
    Oriscus,
    Stropha,
}

impl HeadShape {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadShape::Punctum => "punctum",
            HeadShape::PunctumInclinatum => "punctum_inclinatum",
            HeadShape::PunctumInclinatumParvum => "punctum_inclinatum_parvum",
            HeadShape::Quilisma => "quilisma",
            HeadShape::Virga => "virga",
            HeadShape::Cavum => "cavum",
            HeadShape::Tractulus => "tractulus",
            HeadShape::Gravis => "gravis",
            HeadShape::Oriscus => "oriscus",
            HeadShape::Stropha => "stropha",
        }
    }

    /// Sprite sheet glyph used to draw this head
    pub fn glyph_name(self) -> &'static str {
        match self {
            HeadShape::Punctum => "punctum",
            HeadShape::PunctumInclinatum => "diamond",
            HeadShape::PunctumInclinatumParvum => "diamond_small",
            HeadShape::Quilisma => "quilisma",
            HeadShape::Virga => "virga",
            HeadShape::Cavum => "cavum",
            HeadShape::Tractulus => "tractulus",
            HeadShape::Gravis => "gravis",
            HeadShape::Oriscus => "oriscus",
            HeadShape::Stropha => "stropha",
        }
    }

    /// Neume name a single component with this head is encoded as
    pub fn neume_name(self) -> &'static str {
        match self {
            HeadShape::Punctum
            | HeadShape::PunctumInclinatum
            | HeadShape::PunctumInclinatumParvum
            | HeadShape::Quilisma => "punctum",
            other => other.as_str(),
        }
    }

    /// Attributes carried by the `nc` element
    pub fn nc_attributes(self) -> &'static [(&'static str, &'static str)] {
        match self {
            HeadShape::PunctumInclinatum => &[("inclinatum", "true")],
            HeadShape::PunctumInclinatumParvum => &[("inclinatum", "true"), ("deminutus", "true")],
            HeadShape::Quilisma => &[("quilisma", "true")],
            _ => &[],
        }
    }

    /// Head shape from `nc` flags and the enclosing neume name
    pub fn from_nc(inclinatum: bool, deminutus: bool, quilisma: bool, neume_name: &str) -> Self {
        if quilisma {
            HeadShape::Quilisma
        } else if inclinatum && deminutus {
            HeadShape::PunctumInclinatumParvum
        } else if inclinatum {
            HeadShape::PunctumInclinatum
        } else {
            match neume_name {
                "virga" => HeadShape::Virga,
                "cavum" => HeadShape::Cavum,
                "tractulus" => HeadShape::Tractulus,
                "gravis" => HeadShape::Gravis,
                "oriscus" => HeadShape::Oriscus,
                "stropha" => HeadShape::Stropha,
                _ => HeadShape::Punctum,
            }
        }
    }
}

impl FromStr for HeadShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "punctum" => Ok(HeadShape::Punctum),
            "punctum_inclinatum" => Ok(HeadShape::PunctumInclinatum),
            "punctum_inclinatum_parvum" => Ok(HeadShape::PunctumInclinatumParvum),
            "quilisma" => Ok(HeadShape::Quilisma),
            "virga" => Ok(HeadShape::Virga),
            "cavum" => Ok(HeadShape::Cavum),
            "tractulus" => Ok(HeadShape::Tractulus),
            "gravis" => Ok(HeadShape::Gravis),
            "oriscus" => Ok(HeadShape::Oriscus),
            "stropha" => Ok(HeadShape::Stropha),
            other => Err(format!("unknown head shape '{}'", other)),
        }
    }
}

/// One note of a neume
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NeumeComponent {
    pub head: HeadShape,
    /// Diatonic steps from the neume root
    pub pitch_diff: i32,
    /// Dot ornament form, if any
    pub dot: Option<String>,
}

impl NeumeComponent {
    pub fn new(head: HeadShape, pitch_diff: i32) -> Self {
        Self {
            head,
            pitch_diff,
            dot: None,
        }
    }
}

/// Neume name plus optional variant, e.g. `torculus.resupinus`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NeumeType {
    pub name: String,
    pub variant: Option<String>,
}

impl NeumeType {
    pub fn new(name: &str, variant: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            variant: variant.map(str::to_string),
        }
    }

    /// Parse a dotted type id; a trailing numeric part is a glyph
    /// disambiguator and is dropped.
    pub fn parse(type_id: &str) -> Self {
        let mut parts: Vec<&str> = type_id.split('.').collect();
        if parts.len() > 1 && parts.last().is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
            parts.pop();
        }

        if parts.len() == 1 {
            Self::new(parts[0], None)
        } else {
            let variant = parts[1..].join(" ");
            Self::new(parts[0], Some(&variant))
        }
    }

    /// Dotted form
    pub fn type_id(&self) -> String {
        match &self.variant {
            Some(v) => format!("{}.{}", self.name, v.replace(' ', ".")),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for NeumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(v) => write!(f, "{} {}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Neume {
    pub id: ElementId,
    pub zone: Zone,
    pub name: String,
    pub variant: Option<String>,
    pub components: Vec<NeumeComponent>,
    /// Pitch of the first component; `None` on staffless systems
    pub root_pitch: Option<Pitch>,
    /// Staff position of the first component, filled in when mounted
    pub root_system_pos: i32,
    pub system: Option<SystemId>,
    pub interact: bool,
}

impl Neume {
    pub fn new(id: ElementId, zone: Zone) -> Self {
        Self {
            id,
            zone,
            name: String::new(),
            variant: None,
            components: Vec::new(),
            root_pitch: None,
            root_system_pos: 0,
            system: None,
            interact: true,
        }
    }

    /// Single-note neume
    pub fn punctum(id: ElementId, zone: Zone, head: HeadShape, pitch: Option<Pitch>) -> Self {
        let mut neume = Self::new(id, zone);
        neume.name = head.neume_name().to_string();
        neume.root_pitch = pitch;
        neume.components.push(NeumeComponent::new(head, 0));
        neume
    }

    pub fn add_component(&mut self, component: NeumeComponent) {
        self.components.push(component);
    }

    /// Absolute pitch of each component, when the root is known
    pub fn pitches(&self) -> Option<Vec<Pitch>> {
        let root = self.root_pitch?;
        Some(self.components.iter().map(|c| root.step(c.pitch_diff)).collect())
    }

    /// Staff position of each component
    pub fn component_system_positions(&self) -> Vec<i32> {
        self.components
            .iter()
            .map(|c| self.root_system_pos + c.pitch_diff)
            .collect()
    }

    /// Melodic contour: `u`, `d` or `s` between successive components
    pub fn contour(&self) -> String {
        self.components
            .windows(2)
            .map(|w| match w[1].pitch_diff.cmp(&w[0].pitch_diff) {
                std::cmp::Ordering::Greater => 'u',
                std::cmp::Ordering::Less => 'd',
                std::cmp::Ordering::Equal => 's',
            })
            .collect()
    }

    /// Name the neume from its contour
    pub fn derive_name(&self) -> NeumeType {
        if self.components.len() == 1 {
            let head = self.components[0].head;
            return NeumeType::new(head.neume_name(), None);
        }

        match self.contour().as_str() {
            "" => NeumeType::new("punctum", None),
            "u" => NeumeType::new("podatus", None),
            "d" => NeumeType::new("clivis", None),
            "s" => NeumeType::new("distropha", None),
            "uu" => NeumeType::new("scandicus", None),
            "dd" => NeumeType::new("climacus", None),
            "ud" => NeumeType::new("torculus", None),
            "du" => NeumeType::new("porrectus", None),
            "ss" => NeumeType::new("tristropha", None),
            "udu" => NeumeType::new("torculus", Some("resupinus")),
            "dud" => NeumeType::new("porrectus", Some("flexus")),
            "uud" => NeumeType::new("scandicus", Some("flexus")),
            "udd" => NeumeType::new("podatus", Some("subpunctis")),
            "ddd" => NeumeType::new("climacus", None),
            _ => NeumeType::new("compound", None),
        }
    }

    /// Shift the whole neume by `steps` diatonic steps
    pub fn shift(&mut self, steps: i32) {
        self.root_system_pos += steps;
        if let Some(root) = self.root_pitch {
            self.root_pitch = Some(root.step(steps));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pitch::PitchName;

    fn neume_with_diffs(diffs: &[i32]) -> Neume {
        let mut n = Neume::new(ElementId::from("n1"), Zone::default());
        for d in diffs {
            n.add_component(NeumeComponent::new(HeadShape::Punctum, *d));
        }
        n
    }

    #[test]
    fn test_derive_name_from_contour() {
        assert_eq!(neume_with_diffs(&[0]).derive_name().type_id(), "punctum");
        assert_eq!(neume_with_diffs(&[0, 1]).derive_name().type_id(), "podatus");
        assert_eq!(neume_with_diffs(&[0, -2]).derive_name().type_id(), "clivis");
        assert_eq!(neume_with_diffs(&[0, 2, 1]).derive_name().type_id(), "torculus");
        assert_eq!(neume_with_diffs(&[0, -1, 1]).derive_name().type_id(), "porrectus");
        assert_eq!(
            neume_with_diffs(&[0, 1, 0, 2]).derive_name().type_id(),
            "torculus.resupinus"
        );
        assert_eq!(neume_with_diffs(&[0, 1, 2, 3, 2, 1]).derive_name().type_id(), "compound");
    }

    #[test]
    fn test_single_virga_keeps_its_name() {
        let n = Neume::punctum(ElementId::from("v"), Zone::default(), HeadShape::Virga, None);
        assert_eq!(n.derive_name().name, "virga");
    }

    #[test]
    fn test_neume_type_parse() {
        assert_eq!(NeumeType::parse("podatus"), NeumeType::new("podatus", None));
        assert_eq!(NeumeType::parse("podatus.2"), NeumeType::new("podatus", None));
        assert_eq!(
            NeumeType::parse("torculus.resupinus.3"),
            NeumeType::new("torculus", Some("resupinus"))
        );
        assert_eq!(
            NeumeType::parse("porrectus.flexus.liquescent"),
            NeumeType::new("porrectus", Some("flexus liquescent"))
        );
    }

    #[test]
    fn test_shift_moves_root_pitch_and_position() {
        let mut n = neume_with_diffs(&[0, 1]);
        n.root_pitch = Some(Pitch::new(PitchName::A, 3));
        n.root_system_pos = -3;
        n.shift(2);
        assert_eq!(n.root_system_pos, -1);
        assert_eq!(
            n.pitches(),
            Some(vec![Pitch::new(PitchName::C, 4), Pitch::new(PitchName::D, 4)])
        );
    }

    #[test]
    fn test_head_shape_from_nc() {
        assert_eq!(HeadShape::from_nc(true, true, false, "punctum"), HeadShape::PunctumInclinatumParvum);
        assert_eq!(HeadShape::from_nc(false, false, true, "punctum"), HeadShape::Quilisma);
        assert_eq!(HeadShape::from_nc(false, false, false, "virga"), HeadShape::Virga);
    }
}
