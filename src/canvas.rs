//! Drawing surface abstraction.
//!
//! The compositor only speaks to [`Canvas`]. The OpenCV backend rasterizes
//! onto a `Mat`; [`DrawList`] records the calls, which is what the headless
//! backend writes out and what the tests inspect.

use crate::Result;
use serde::{Deserialize, Serialize};

/// 8-bit color in blue, green, red channel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Color {
    pub const WHITE: Color = Color::bgr(255, 255, 255);

    #[must_use]
    pub const fn bgr(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

impl From<[u8; 3]> for Color {
    fn from([b, g, r]: [u8; 3]) -> Self {
        Self { b, g, r }
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

/// Integer pixel position on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// How a closed shape is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stroke {
    Filled,
    Outline(i32),
}

/// Ellipse or elliptic arc geometry, angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseArc {
    pub center: Point,
    pub axes: (i32, i32),
    pub rotation: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl EllipseArc {
    /// A full, unrotated ellipse
    #[must_use]
    pub const fn full(center: Point, axes: (i32, i32)) -> Self {
        Self {
            center,
            axes,
            rotation: 0.0,
            start_angle: 0.0,
            end_angle: 360.0,
        }
    }

    /// The lower half of an ellipse (0 to 180 degrees, y pointing down)
    #[must_use]
    pub const fn lower_half(center: Point, axes: (i32, i32), rotation: f64) -> Self {
        Self {
            center,
            axes,
            rotation,
            start_angle: 0.0,
            end_angle: 180.0,
        }
    }
}

/// A drawing surface with the primitive set the avatar needs
pub trait Canvas {
    /// Canvas size in pixels
    fn size(&self) -> (u32, u32);

    /// Paint the whole canvas
    fn fill(&mut self, color: Color) -> Result<()>;

    fn circle(&mut self, center: Point, radius: i32, color: Color, stroke: Stroke) -> Result<()>;

    fn ellipse(&mut self, arc: EllipseArc, color: Color, stroke: Stroke) -> Result<()>;

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: i32) -> Result<()>;

    fn polyline(&mut self, points: &[Point], closed: bool, color: Color, thickness: i32) -> Result<()>;

    fn rectangle(&mut self, top_left: Point, bottom_right: Point, color: Color, stroke: Stroke) -> Result<()>;

    /// Draw a text line with its baseline starting at `origin`
    fn text(&mut self, text: &str, origin: Point, scale: f64, color: Color, thickness: i32) -> Result<()>;
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Fill {
        color: Color,
    },
    Circle {
        center: Point,
        radius: i32,
        color: Color,
        stroke: Stroke,
    },
    Ellipse {
        arc: EllipseArc,
        color: Color,
        stroke: Stroke,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        thickness: i32,
    },
    Polyline {
        points: Vec<Point>,
        closed: bool,
        color: Color,
        thickness: i32,
    },
    Rectangle {
        top_left: Point,
        bottom_right: Point,
        color: Color,
        stroke: Stroke,
    },
    Text {
        text: String,
        origin: Point,
        scale: f64,
        color: Color,
        thickness: i32,
    },
}

/// Canvas that records every call in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// All text lines drawn so far, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether any text line contains `needle`
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }
}

impl Canvas for DrawList {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Color) -> Result<()> {
        self.commands.push(DrawCommand::Fill { color });
        Ok(())
    }

    fn circle(&mut self, center: Point, radius: i32, color: Color, stroke: Stroke) -> Result<()> {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
            stroke,
        });
        Ok(())
    }

    fn ellipse(&mut self, arc: EllipseArc, color: Color, stroke: Stroke) -> Result<()> {
        self.commands.push(DrawCommand::Ellipse { arc, color, stroke });
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: i32) -> Result<()> {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            thickness,
        });
        Ok(())
    }

    fn polyline(&mut self, points: &[Point], closed: bool, color: Color, thickness: i32) -> Result<()> {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            closed,
            color,
            thickness,
        });
        Ok(())
    }

    fn rectangle(&mut self, top_left: Point, bottom_right: Point, color: Color, stroke: Stroke) -> Result<()> {
        self.commands.push(DrawCommand::Rectangle {
            top_left,
            bottom_right,
            color,
            stroke,
        });
        Ok(())
    }

    fn text(&mut self, text: &str, origin: Point, scale: f64, color: Color, thickness: i32) -> Result<()> {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            scale,
            color,
            thickness,
        });
        Ok(())
    }
}
