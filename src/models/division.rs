//! Divisions (breath marks and phrase boundaries)

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::glyph::{ElementId, SystemId};
use super::zone::Zone;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DivisionForm {
    Small,
    Minor,
    Major,
    /// Closes the current staff; anything after it starts a new staff
    Final,
}

impl DivisionForm {
    pub fn as_str(self) -> &'static str {
        match self {
            DivisionForm::Small => "small",
            DivisionForm::Minor => "minor",
            DivisionForm::Major => "major",
            DivisionForm::Final => "final",
        }
    }
}

impl FromStr for DivisionForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "small" => Ok(DivisionForm::Small),
            "minor" => Ok(DivisionForm::Minor),
            "major" => Ok(DivisionForm::Major),
            "final" => Ok(DivisionForm::Final),
            other => Err(format!("unknown division form '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Division {
    pub id: ElementId,
    pub zone: Zone,
    pub form: DivisionForm,
    pub system: Option<SystemId>,
    pub interact: bool,
}

impl Division {
    pub fn new(id: ElementId, zone: Zone, form: DivisionForm) -> Self {
        Self {
            id,
            zone,
            form,
            system: None,
            interact: true,
        }
    }
}
