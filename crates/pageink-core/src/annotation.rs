//! Annotation data model and wire representation.

use kurbo::Point;
use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Stable page identifier.
pub type PageId = String;

/// Live annotations grouped by page, in drawing order.
pub type AnnotationSet = BTreeMap<PageId, Vec<Annotation>>;

/// Available annotation tools.
///
/// Serialized as the lowercase tool name used on the wire (`"pen"`, `"arc"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
    Ruler,
    Compass,
    Rectangle,
    Disk,
    Arrow,
    Angle,
    Arc,
    Grid,
    Eraser,
}

impl ToolKind {
    /// Tools drawn with one press-move-release gesture.
    pub fn is_single_stroke(self) -> bool {
        matches!(
            self,
            ToolKind::Pen
                | ToolKind::Highlighter
                | ToolKind::Ruler
                | ToolKind::Compass
                | ToolKind::Rectangle
                | ToolKind::Disk
                | ToolKind::Arrow
        )
    }

    /// Tools constructed in two confirmed steps (anchor + two rays).
    pub fn is_two_step(self) -> bool {
        matches!(self, ToolKind::Angle | ToolKind::Arc)
    }

    /// Freehand strokes, which the eraser splits instead of removing.
    pub fn is_freehand(self) -> bool {
        matches!(self, ToolKind::Pen | ToolKind::Highlighter)
    }

    /// Wire name of the tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Highlighter => "highlighter",
            ToolKind::Ruler => "ruler",
            ToolKind::Compass => "compass",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Disk => "disk",
            ToolKind::Arrow => "arrow",
            ToolKind::Angle => "angle",
            ToolKind::Arc => "arc",
            ToolKind::Grid => "grid",
            ToolKind::Eraser => "eraser",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque RGB ink color, serialized as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl InkColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Parse `#rgb` or `#rrggbb`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::new(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Paint color at `opacity` (clamped to 0.0..=1.0).
    pub fn with_opacity(self, opacity: f64) -> Color {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }
}

impl Default for InkColor {
    fn default() -> Self {
        Self::black()
    }
}

impl TryFrom<String> for InkColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color {value:?}, expected #RRGGBB"))
    }
}

impl From<InkColor> for String {
    fn from(color: InkColor) -> Self {
        color.to_hex()
    }
}

fn default_pressure() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

/// A sampled input point in page-local raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_pressure")]
    pub pressure: f64,
}

impl AnnotationPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, pressure: 1.0 }
    }

    pub fn with_pressure(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure }
    }

    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl From<Point> for AnnotationPoint {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

/// A committed piece of markup on one page.
///
/// Annotations are immutable once committed; corrections go through the
/// eraser (remove and re-add) or the history cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub tool: ToolKind,
    pub color: InkColor,
    pub size: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub points: Vec<AnnotationPoint>,
    /// Raster width covered by a grid overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Raster height covered by a grid overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Fields this version does not know, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    pub fn new(tool: ToolKind, color: InkColor, size: f64, opacity: f64, points: Vec<AnnotationPoint>) -> Self {
        Self {
            tool,
            color,
            size,
            opacity,
            points,
            width: None,
            height: None,
            extra: Map::new(),
        }
    }

    /// A page-sized grid overlay.
    pub fn grid(color: InkColor, size: f64, width: u32, height: u32) -> Self {
        Self {
            tool: ToolKind::Grid,
            color,
            size,
            opacity: 1.0,
            points: Vec::new(),
            width: Some(width),
            height: Some(height),
            extra: Map::new(),
        }
    }

    pub fn is_grid(&self) -> bool {
        self.tool == ToolKind::Grid
    }

    /// Same tool and style, different points.
    pub fn with_points(&self, points: Vec<AnnotationPoint>) -> Self {
        Self {
            points,
            ..self.clone()
        }
    }

    /// Point positions as kurbo points.
    pub fn positions(&self) -> Vec<Point> {
        self.points.iter().map(AnnotationPoint::pos).collect()
    }

    pub fn first_pos(&self) -> Option<Point> {
        self.points.first().map(AnnotationPoint::pos)
    }

    pub fn last_pos(&self) -> Option<Point> {
        self.points.last().map(AnnotationPoint::pos)
    }
}

/// Deserialize an annotation set, skipping annotations that do not parse.
///
/// One unreadable entry (an unknown tool, a malformed point) costs only that
/// entry; the rest of the page and the document still load.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<AnnotationSet, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<PageId, Vec<Value>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(page, values)| {
            let annotations = values
                .into_iter()
                .enumerate()
                .filter_map(|(index, value)| match serde_json::from_value::<Annotation>(value) {
                    Ok(annotation) => Some(annotation),
                    Err(e) => {
                        log::warn!("Skipping annotation {index} on page {page}: {e}");
                        None
                    }
                })
                .collect();
            (page, annotations)
        })
        .collect())
}

/// Parse a stored annotation set with [`deserialize_lenient`].
pub fn annotation_set_from_str(json: &str) -> serde_json::Result<AnnotationSet> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let set = deserialize_lenient(&mut deserializer)?;
    deserializer.end()?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let color = InkColor::from_hex("#1a2B3c").unwrap();
        assert_eq!(color, InkColor::new(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_hex(), "#1A2B3C");
        assert_eq!(InkColor::from_hex("#fff"), Some(InkColor::new(255, 255, 255)));
        assert_eq!(InkColor::from_hex("red"), None);
        assert_eq!(InkColor::from_hex("#12345"), None);
    }

    #[test]
    fn test_with_opacity() {
        let rgba = InkColor::new(10, 20, 30).with_opacity(0.5).to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (10, 20, 30, 128));
        assert_eq!(InkColor::black().with_opacity(3.0).to_rgba8().a, 255);
    }

    #[test]
    fn test_annotation_wire_shape() {
        let ann = Annotation::new(
            ToolKind::Pen,
            InkColor::new(255, 0, 0),
            3.0,
            0.5,
            vec![AnnotationPoint::with_pressure(1.0, 2.0, 0.7)],
        );
        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["tool"], "pen");
        assert_eq!(json["color"], "#FF0000");
        assert_eq!(json["points"][0]["pressure"], 0.7);
        assert!(json.get("width").is_none());
    }

    #[test]
    fn test_annotation_defaults_on_load() {
        let json = r##"{"tool":"highlighter","color":"#00ff00","size":4,"points":[{"x":1,"y":2}]}"##;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.tool, ToolKind::Highlighter);
        assert!((ann.opacity - 1.0).abs() < f64::EPSILON);
        assert!((ann.points[0].pressure - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_tool_skipped_others_kept() {
        let json = r##"{"1":[
            {"tool":"pen","color":"#000000","size":2,"points":[{"x":0,"y":0},{"x":4,"y":4}]},
            {"tool":"lasso","color":"#000000","size":2,"points":[]},
            {"tool":"arrow","color":"#ff0000","size":3,"points":[{"x":1,"y":1},{"x":9,"y":9}]}
        ],"2":[{"tool":"disk","color":"nope","size":1}]}"##;
        let set = annotation_set_from_str(json).unwrap();
        let tools: Vec<ToolKind> = set["1"].iter().map(|a| a.tool).collect();
        assert_eq!(tools, vec![ToolKind::Pen, ToolKind::Arrow]);
        assert!(set["2"].is_empty());
        assert!(annotation_set_from_str("[1, 2").is_err());
    }

    #[test]
    fn test_unknown_fields_written_back() {
        let json = r##"{"tool":"pen","color":"#000000","size":2,"points":[],"layer":"teacher","tags":["a"]}"##;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.extra["layer"], "teacher");
        let out = serde_json::to_value(&ann).unwrap();
        assert_eq!(out["layer"], "teacher");
        assert_eq!(out["tags"][0], "a");
        assert!(Annotation::new(ToolKind::Pen, InkColor::black(), 1.0, 1.0, Vec::new()).extra.is_empty());
    }

    #[test]
    fn test_grid_fields() {
        let grid = Annotation::grid(InkColor::black(), 1.0, 800, 600);
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["tool"], "grid");
        assert_eq!(json["width"], 800);
        assert_eq!(json["height"], 600);
    }

    #[test]
    fn test_tool_classes() {
        assert!(ToolKind::Pen.is_single_stroke());
        assert!(ToolKind::Arc.is_two_step());
        assert!(!ToolKind::Grid.is_single_stroke());
        assert!(!ToolKind::Eraser.is_two_step());
        assert!(ToolKind::Highlighter.is_freehand());
    }
}
