//! Model ↔ view events
//!
//! Models never call views. A mutation pushes an event onto the queue; the
//! dispatcher drains the queue and hands each event to the controller that
//! owns the matching view. Views report geometry back with
//! [`ModelEvent::UpdateBoundingBox`], which the controllers apply to the model.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::models::{ElementId, SystemId, Zone};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "target")]
pub enum ModelEvent {
    RenderSystem(SystemId),
    RenderSystemBoundingBox(SystemId),
    EraseSystem(SystemId),
    RenderNeume(ElementId),
    RenderCustos(ElementId),
    RenderClef(ElementId),
    RenderDivision(ElementId),
    /// The glyph moved vertically on its staff
    UpdateSystemPosition(ElementId),
    EraseDrawing(ElementId),
    SelectDrawing(ElementId),
    /// View → model: the drawing now occupies this zone
    UpdateBoundingBox(ElementId, Zone),
}

impl ModelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::RenderSystem(_) => "vRenderSystem",
            ModelEvent::RenderSystemBoundingBox(_) => "vRenderSystemBoundingBox",
            ModelEvent::EraseSystem(_) => "vEraseSystem",
            ModelEvent::RenderNeume(_) => "vRenderNeume",
            ModelEvent::RenderCustos(_) => "vRenderCustos",
            ModelEvent::RenderClef(_) => "vRenderClef",
            ModelEvent::RenderDivision(_) => "vRenderDivision",
            ModelEvent::UpdateSystemPosition(_) => "vUpdateSystemPosition",
            ModelEvent::EraseDrawing(_) => "vEraseDrawing",
            ModelEvent::SelectDrawing(_) => "vSelectDrawing",
            ModelEvent::UpdateBoundingBox(_, _) => "mUpdateBoundingBox",
        }
    }

    /// Element the event targets, if it targets an element
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            ModelEvent::RenderNeume(id)
            | ModelEvent::RenderCustos(id)
            | ModelEvent::RenderClef(id)
            | ModelEvent::RenderDivision(id)
            | ModelEvent::UpdateSystemPosition(id)
            | ModelEvent::EraseDrawing(id)
            | ModelEvent::SelectDrawing(id)
            | ModelEvent::UpdateBoundingBox(id, _) => Some(id),
            ModelEvent::RenderSystem(_)
            | ModelEvent::RenderSystemBoundingBox(_)
            | ModelEvent::EraseSystem(_) => None,
        }
    }
}

/// FIFO of pending events
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<ModelEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&mut self, event: ModelEvent) {
        log::trace!("fire {} {:?}", event.name(), event.element());
        self.pending.push_back(event);
    }

    pub fn pop(&mut self) -> Option<ModelEvent> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything without dispatching
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelEvent> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut q = EventQueue::new();
        q.fire(ModelEvent::RenderSystem(SystemId(0)));
        q.fire(ModelEvent::RenderNeume(ElementId::from("n1")));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(ModelEvent::RenderSystem(SystemId(0))));
        assert_eq!(q.pop(), Some(ModelEvent::RenderNeume(ElementId::from("n1"))));
        assert!(q.pop().is_none());
    }
}
