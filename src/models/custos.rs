//! Custos: the guide glyph at the end of a system announcing the next pitch

use serde::{Deserialize, Serialize};

use super::glyph::{ElementId, SystemId};
use super::pitch::Pitch;
use super::zone::Zone;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Custos {
    pub id: ElementId,
    pub zone: Zone,
    pub pitch: Option<Pitch>,
    /// Staff position, filled in when mounted
    pub root_system_pos: i32,
    pub system: Option<SystemId>,
    pub interact: bool,
}

impl Custos {
    pub fn new(id: ElementId, zone: Zone, pitch: Option<Pitch>) -> Self {
        Self {
            id,
            zone,
            pitch,
            root_system_pos: 0,
            system: None,
            interact: true,
        }
    }
}
