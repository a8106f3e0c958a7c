//! Systems: one line of music on the page
//!
//! A square-note system is a staff with lines; a cheironomic system is the
//! same container without lines, used for staffless neumes. Either way the
//! system owns an ordered list of element ids sorted by horizontal position.

use serde::{Deserialize, Serialize};

use super::glyph::{ElementId, SystemId};
use super::zone::Zone;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Staff,
    Cheironomic,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SystemOptions {
    pub num_lines: u32,
    pub interact: bool,
}

impl SystemOptions {
    pub fn staff(num_lines: u32) -> Self {
        Self {
            num_lines,
            interact: true,
        }
    }

    pub fn cheironomic() -> Self {
        Self {
            num_lines: 0,
            interact: true,
        }
    }
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self::staff(4)
    }
}

/// Position-tagged element reference
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SystemEntry {
    pub id: ElementId,
    pub ulx: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct System {
    pub id: SystemId,
    pub kind: SystemKind,
    pub zone: Zone,
    pub num_lines: u32,
    /// Distance between two staff lines in pixels
    pub delta_y: f64,
    pub interact: bool,
    /// `xml:id` of the MEI `system` element
    pub mei_system_id: Option<String>,
    /// `xml:id` of the MEI `sb` element that opens this system
    pub mei_sb_id: Option<String>,
    entries: Vec<SystemEntry>,
}

impl System {
    pub fn new(id: SystemId, zone: Zone, options: SystemOptions) -> Self {
        let kind = if options.num_lines == 0 {
            SystemKind::Cheironomic
        } else {
            SystemKind::Staff
        };
        let delta_y = if options.num_lines > 1 {
            zone.height() as f64 / (options.num_lines - 1) as f64
        } else {
            0.0
        };

        Self {
            id,
            kind,
            zone,
            num_lines: options.num_lines,
            delta_y,
            interact: options.interact,
            mei_system_id: None,
            mei_sb_id: None,
            entries: Vec::new(),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.kind == SystemKind::Staff
    }

    /// Replace the zone and recompute the line spacing
    pub fn set_zone(&mut self, zone: Zone) {
        self.zone = zone;
        if self.num_lines > 1 {
            self.delta_y = zone.height() as f64 / (self.num_lines - 1) as f64;
        }
    }

    /// Element ids, left to right
    pub fn elements(&self) -> impl Iterator<Item = &ElementId> {
        self.entries.iter().map(|e| &e.id)
    }

    pub fn entries(&self) -> &[SystemEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted insert by horizontal position; equal positions keep insertion
    /// order. Returns the index of the new element.
    pub fn insert_element(&mut self, id: ElementId, ulx: i32) -> usize {
        let index = self.entries.partition_point(|e| e.ulx <= ulx);
        self.entries.insert(index, SystemEntry { id, ulx });
        index
    }

    /// Append without sorting. Used when bulk-loading from a document that is
    /// already in reading order.
    pub fn push_element(&mut self, id: ElementId, ulx: i32) -> usize {
        self.entries.push(SystemEntry { id, ulx });
        self.entries.len() - 1
    }

    pub fn remove_element(&mut self, id: &ElementId) -> Option<usize> {
        let index = self.element_index(id)?;
        self.entries.remove(index);
        Some(index)
    }

    pub fn element_index(&self, id: &ElementId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    /// First element strictly to the right of `x`
    pub fn next_element_after(&self, x: i32) -> Option<&ElementId> {
        self.entries.iter().find(|e| e.ulx > x).map(|e| &e.id)
    }

    /// Re-sort one element after its zone moved horizontally
    pub fn reposition_element(&mut self, id: &ElementId, ulx: i32) -> Option<usize> {
        self.remove_element(id)?;
        Some(self.insert_element(id.clone(), ulx))
    }

    /// True when the element list is in non-decreasing `ulx` order
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].ulx <= w[1].ulx)
    }

    /// Staff position of the bottom line
    pub fn bottom_system_pos(&self) -> i32 {
        2 * (1 - self.num_lines as i32)
    }

    /// Vertical pixel coordinate of a staff position
    pub fn y_of_system_pos(&self, system_pos: i32) -> f64 {
        self.zone.uly as f64 - system_pos as f64 * self.delta_y / 2.0
    }

    /// Nearest staff position to a vertical pixel coordinate
    pub fn system_pos_of_y(&self, y: f64) -> Option<i32> {
        if !self.is_staff() || self.delta_y <= 0.0 {
            return None;
        }
        Some(((self.zone.uly as f64 - y) / (self.delta_y / 2.0)).round() as i32)
    }

    /// Y coordinates of the staff lines, top to bottom
    pub fn line_positions(&self) -> Vec<f64> {
        (0..self.num_lines)
            .map(|i| self.zone.uly as f64 + i as f64 * self.delta_y)
            .collect()
    }
}
