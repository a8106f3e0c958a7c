//! Display List for canvas rendering
//!
//! This module defines the output structure returned to JavaScript. The
//! `DisplayListEngine` implements [`RenderEngine`] by recording every canvas
//! operation as a [`DrawCommand`]; the host replays them on its canvas
//! library without doing any layout of its own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Zone;

use super::engine::{DrawOptions, DrawRequest, Drawing, DrawingId, RenderEngine, Shape};
use super::glyphs::{GlyphSet, GlyphSprite};

/// Canvas element the host must create
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CanvasSpec {
    /// DOM id of the canvas element
    pub id: String,
    pub width: u32,
    pub height: u32,
    /// Inline CSS for the canvas element
    pub style: String,
}

impl CanvasSpec {
    pub fn new(id: &str, width: u32, height: u32) -> Self {
        Self {
            id: id.to_string(),
            width,
            height,
            style: "border: 4px black solid;".to_string(),
        }
    }
}

/// One recorded canvas operation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Draw {
        drawing: Drawing,
        fixed: Vec<Shape>,
        modify: Vec<Shape>,
        options: DrawOptions,
    },
    Outline {
        id: DrawingId,
        zone: Zone,
        fill: String,
    },
    Move {
        id: DrawingId,
        left: f64,
        top: f64,
    },
    Remove {
        id: DrawingId,
    },
    SetActive {
        id: DrawingId,
    },
    Repaint,
}

/// Top-level display list handed to the host
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DisplayList {
    pub canvas: CanvasSpec,
    pub commands: Vec<DrawCommand>,
}

/// A drawing currently on the canvas
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LiveDrawing {
    pub drawing: Drawing,
    pub shapes: Vec<Shape>,
    pub options: DrawOptions,
    /// Outline colour for bounding-box outlines
    pub outline: Option<String>,
}

/// Recording render engine
#[derive(Debug, Clone)]
pub struct DisplayListEngine {
    canvas: CanvasSpec,
    glyphs: GlyphSet,
    scale: Option<f64>,
    next_id: u32,
    live: BTreeMap<DrawingId, LiveDrawing>,
    active: Option<DrawingId>,
    commands: Vec<DrawCommand>,
}

impl DisplayListEngine {
    pub fn new(canvas: CanvasSpec, glyphs: GlyphSet) -> Self {
        Self {
            canvas,
            glyphs,
            scale: None,
            next_id: 1,
            live: BTreeMap::new(),
            active: None,
            commands: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &CanvasSpec {
        &self.canvas
    }

    /// Commands recorded since the last call, emptied
    pub fn take_commands(&mut self) -> DisplayList {
        DisplayList {
            canvas: self.canvas.clone(),
            commands: std::mem::take(&mut self.commands),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn live(&self, id: DrawingId) -> Option<&LiveDrawing> {
        self.live.get(&id)
    }

    pub fn live_drawings(&self) -> impl Iterator<Item = &LiveDrawing> {
        self.live.values()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn active(&self) -> Option<DrawingId> {
        self.active
    }

    fn allocate(&mut self) -> DrawingId {
        let id = DrawingId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl RenderEngine for DisplayListEngine {
    fn glyph(&self, name: &str) -> Option<GlyphSprite> {
        let sprite = self.glyphs.get(name)?;
        Some(sprite.scaled(self.scale.unwrap_or(1.0)))
    }

    fn scale(&self) -> Option<f64> {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = Some(scale);
    }

    fn draw(&mut self, request: DrawRequest, options: DrawOptions) -> Drawing {
        let id = self.allocate();
        let drawing = Drawing::enclosing(id, request.shapes());
        let shapes: Vec<Shape> = request.shapes().cloned().collect();

        self.live.insert(
            id,
            LiveDrawing {
                drawing,
                shapes,
                options: options.clone(),
                outline: None,
            },
        );
        self.commands.push(DrawCommand::Draw {
            drawing,
            fixed: request.fixed,
            modify: request.modify,
            options,
        });
        drawing
    }

    fn outline_bounding_box(&mut self, zone: &Zone, fill: &str) -> DrawingId {
        let id = self.allocate();
        let shapes = vec![
            Shape::line([zone.ulx as f64, zone.uly as f64, zone.lrx as f64, zone.uly as f64]),
            Shape::line([zone.ulx as f64, zone.lry as f64, zone.lrx as f64, zone.lry as f64]),
        ];
        let drawing = Drawing::enclosing(id, shapes.iter());

        self.live.insert(
            id,
            LiveDrawing {
                drawing,
                shapes,
                options: DrawOptions::decoration(),
                outline: Some(fill.to_string()),
            },
        );
        self.commands.push(DrawCommand::Outline {
            id,
            zone: *zone,
            fill: fill.to_string(),
        });
        id
    }

    fn move_drawing(&mut self, id: DrawingId, left: f64, top: f64) -> Option<Drawing> {
        let live = self.live.get_mut(&id)?;
        let dx = left - live.drawing.left;
        let dy = top - live.drawing.top;
        for shape in &mut live.shapes {
            shape.translate(dx, dy);
        }
        live.drawing.left = left;
        live.drawing.top = top;

        self.commands.push(DrawCommand::Move { id, left, top });
        Some(live.drawing)
    }

    fn remove(&mut self, id: DrawingId) {
        if self.live.remove(&id).is_some() {
            if self.active == Some(id) {
                self.active = None;
            }
            self.commands.push(DrawCommand::Remove { id });
        }
    }

    fn set_active(&mut self, id: DrawingId) {
        if self.live.contains_key(&id) {
            self.active = Some(id);
            self.commands.push(DrawCommand::SetActive { id });
        }
    }

    fn repaint(&mut self) {
        self.commands.push(DrawCommand::Repaint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DisplayListEngine {
        let mut glyphs = GlyphSet::new();
        glyphs.insert(GlyphSprite::new("punctum", 20.0, 10.0));
        DisplayListEngine::new(CanvasSpec::new("neon-canvas", 1000, 1000), glyphs)
    }

    #[test]
    fn test_glyphs_come_back_scaled() {
        let mut e = engine();
        assert_eq!(e.glyph("punctum").unwrap().height, 10.0);
        e.set_scale(2.0);
        assert_eq!(e.glyph("punctum").unwrap().height, 20.0);
        assert!(e.glyph("virga").is_none());
    }

    #[test]
    fn test_draw_move_remove() {
        let mut e = engine();
        let sprite = e.glyph("punctum").unwrap();
        let d = e.draw(
            DrawRequest::modify(vec![Shape::glyph(&sprite, 100.0, 50.0)]),
            DrawOptions::default(),
        );
        assert_eq!(d.zone(), Zone::new(90, 45, 110, 55));

        let moved = e.move_drawing(d.id, 100.0, 70.0).unwrap();
        assert_eq!(moved.zone(), Zone::new(90, 65, 110, 75));

        e.set_active(d.id);
        assert_eq!(e.active(), Some(d.id));
        e.remove(d.id);
        assert_eq!(e.active(), None);
        assert_eq!(e.live_count(), 0);

        let list = e.take_commands();
        assert_eq!(list.commands.len(), 4);
        assert!(e.commands().is_empty());
    }

    #[test]
    fn test_removing_unknown_drawing_records_nothing() {
        let mut e = engine();
        e.remove(DrawingId(42));
        assert!(e.commands().is_empty());
    }
}
