//! C and F clefs and the staff position ↔ pitch mapping
//!
//! Staff positions count half-lines from the top line of the system: the top
//! line is 0, the space below it is -1, the next line -2, and so on. Clef lines
//! are numbered the MEI way, from the bottom line up starting at 1.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::glyph::{ElementId, SystemId};
use super::pitch::{Pitch, PitchName};
use super::zone::Zone;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClefShape {
    C,
    F,
}

impl ClefShape {
    /// Pitch of the line the clef sits on
    pub fn reference_pitch(self) -> Pitch {
        match self {
            ClefShape::C => Pitch::new(PitchName::C, 4),
            ClefShape::F => Pitch::new(PitchName::F, 3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClefShape::C => "C",
            ClefShape::F => "F",
        }
    }

    /// Glyph name in the sprite sheet
    pub fn glyph_name(self) -> &'static str {
        match self {
            ClefShape::C => "c_clef",
            ClefShape::F => "f_clef",
        }
    }
}

impl FromStr for ClefShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "c" | "C" => Ok(ClefShape::C),
            "f" | "F" => Ok(ClefShape::F),
            other => Err(format!("unknown clef shape '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Clef {
    pub id: ElementId,
    pub shape: ClefShape,
    /// Staff line, 1 = bottom line
    pub line: i32,
    pub zone: Zone,
    pub system: Option<SystemId>,
    pub interact: bool,
}

impl Clef {
    pub fn new(id: ElementId, shape: ClefShape, line: i32, zone: Zone) -> Self {
        Self {
            id,
            shape,
            line,
            zone,
            system: None,
            interact: true,
        }
    }

    /// Staff position of the clef line on a staff with `num_lines` lines
    pub fn system_pos(&self, num_lines: u32) -> i32 {
        2 * (self.line - num_lines as i32)
    }

    /// Pitch at a staff position under this clef
    pub fn pitch_at(&self, system_pos: i32, num_lines: u32) -> Pitch {
        self.shape
            .reference_pitch()
            .step(system_pos - self.system_pos(num_lines))
    }

    /// Staff position of a pitch under this clef
    pub fn system_pos_of(&self, pitch: &Pitch, num_lines: u32) -> i32 {
        self.system_pos(num_lines) + self.shape.reference_pitch().steps_to(pitch)
    }
}
