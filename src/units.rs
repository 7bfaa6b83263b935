//! # Units and Geometry
//!
//! Length values as they appear in styles (points, millimetres, inches,
//! percentages and ems), plus the resolved geometry the layout tree is made
//! of: points, sizes, rectangles and per-side thicknesses.
//!
//! All resolved values are in PDF points (1/72 inch).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

const PT_PER_INCH: f64 = 72.0;
const PT_PER_MM: f64 = 72.0 / 25.4;

/// A length as declared in a style, before resolution.
///
/// Deserializes from a bare number (points), a string such as `"50%"`,
/// `"1.5em"`, `"10mm"`, `"1in"`, `"12pt"` or `"auto"`, or the tagged form
/// (`{"Pt": 10}`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionRepr")]
pub enum Dimension {
    /// Fixed size in points (1/72 inch).
    Pt(f64),
    Mm(f64),
    In(f64),
    /// Percentage of the reference dimension.
    Percent(f64),
    /// Multiple of the current font size.
    Em(f64),
    /// Size determined by content.
    Auto,
}

/// Which side of a containing box a percentage is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Dimension {
    /// Resolve against a reference dimension and the current font size.
    /// Returns None for Auto.
    pub fn resolve(&self, reference: f64, font_size: f64) -> Option<f64> {
        match *self {
            Dimension::Pt(v) => Some(v),
            Dimension::Mm(v) => Some(v * PT_PER_MM),
            Dimension::In(v) => Some(v * PT_PER_INCH),
            Dimension::Percent(p) => Some(reference * p / 100.0),
            Dimension::Em(v) => Some(font_size * v),
            Dimension::Auto => None,
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Dimension::Auto);
        }
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("Invalid length '{}'", s))?;
        match suffix.trim().to_ascii_lowercase().as_str() {
            "" | "pt" => Ok(Dimension::Pt(value)),
            "mm" => Ok(Dimension::Mm(value)),
            "cm" => Ok(Dimension::Mm(value * 10.0)),
            "in" => Ok(Dimension::In(value)),
            "%" => Ok(Dimension::Percent(value)),
            "em" => Ok(Dimension::Em(value)),
            other => Err(format!("Unknown length unit '{}' in '{}'", other, s)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionRepr {
    Number(f64),
    Text(String),
    Tagged(TaggedDimension),
}

#[derive(Deserialize)]
enum TaggedDimension {
    Pt(f64),
    Mm(f64),
    In(f64),
    Percent(f64),
    Em(f64),
}

impl TryFrom<DimensionRepr> for Dimension {
    type Error = String;

    fn try_from(repr: DimensionRepr) -> Result<Self, Self::Error> {
        match repr {
            DimensionRepr::Number(v) => Ok(Dimension::Pt(v)),
            DimensionRepr::Text(s) => s.parse(),
            DimensionRepr::Tagged(TaggedDimension::Pt(v)) => Ok(Dimension::Pt(v)),
            DimensionRepr::Tagged(TaggedDimension::Mm(v)) => Ok(Dimension::Mm(v)),
            DimensionRepr::Tagged(TaggedDimension::In(v)) => Ok(Dimension::In(v)),
            DimensionRepr::Tagged(TaggedDimension::Percent(v)) => Ok(Dimension::Percent(v)),
            DimensionRepr::Tagged(TaggedDimension::Em(v)) => Ok(Dimension::Em(v)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle, top-left origin, Y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The placeholder used for lines an inline element spans without
    /// contributing any content.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrink by the given thickness on every side.
    pub fn inset(&self, edges: &Edges) -> Rect {
        Rect::new(
            self.x + edges.left,
            self.y + edges.top,
            (self.width - edges.horizontal()).max(0.0),
            (self.height - edges.vertical()).max(0.0),
        )
    }
}

/// Per-side thickness: margins, padding, border widths.
///
/// Deserializes from a single number (all sides) or an object with any
/// subset of `top`, `right`, `bottom`, `left`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "EdgesRepr")]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// Side-wise sum of two thicknesses.
    pub fn add(&self, other: &Edges) -> Edges {
        Edges {
            top: self.top + other.top,
            right: self.right + other.right,
            bottom: self.bottom + other.bottom,
            left: self.left + other.left,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EdgesRepr {
    Uniform(f64),
    Sides {
        #[serde(default)]
        top: f64,
        #[serde(default)]
        right: f64,
        #[serde(default)]
        bottom: f64,
        #[serde(default)]
        left: f64,
    },
}

impl From<EdgesRepr> for Edges {
    fn from(repr: EdgesRepr) -> Self {
        match repr {
            EdgesRepr::Uniform(v) => Edges::uniform(v),
            EdgesRepr::Sides {
                top,
                right,
                bottom,
                left,
            } => Edges {
                top,
                right,
                bottom,
                left,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_resolves_against_reference() {
        assert_eq!(Dimension::Percent(50.0).resolve(580.0, 12.0), Some(290.0));
        assert_eq!(Dimension::Auto.resolve(580.0, 12.0), None);
    }

    #[test]
    fn percent_resolution_is_idempotent() {
        let d = Dimension::Percent(33.3);
        let first = d.resolve(517.0, 12.0);
        let second = d.resolve(517.0, 12.0);
        assert_eq!(first, second);
    }

    #[test]
    fn em_resolves_against_font_size() {
        assert_eq!(Dimension::Em(1.5).resolve(1000.0, 20.0), Some(30.0));
    }

    #[test]
    fn parses_strings_and_numbers() {
        let d: Dimension = serde_json::from_str("\"50%\"").unwrap();
        assert_eq!(d, Dimension::Percent(50.0));
        let d: Dimension = serde_json::from_str("120").unwrap();
        assert_eq!(d, Dimension::Pt(120.0));
        let d: Dimension = serde_json::from_str("\"2em\"").unwrap();
        assert_eq!(d, Dimension::Em(2.0));
        let d: Dimension = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(d, Dimension::Auto);
        let d: Dimension = serde_json::from_str("{\"Pt\": 7}").unwrap();
        assert_eq!(d, Dimension::Pt(7.0));
    }

    #[test]
    fn millimetres_convert_to_points() {
        let d: Dimension = "25.4mm".parse().unwrap();
        let pt = d.resolve(0.0, 12.0).unwrap();
        assert!((pt - 72.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_unknown_units() {
        assert!("12furlongs".parse::<Dimension>().is_err());
    }

    #[test]
    fn edges_from_number_or_object() {
        let e: Edges = serde_json::from_str("10").unwrap();
        assert_eq!(e, Edges::uniform(10.0));
        let e: Edges = serde_json::from_str("{\"top\": 5, \"left\": 2}").unwrap();
        assert_eq!(e.vertical(), 5.0);
        assert_eq!(e.horizontal(), 2.0);
    }

    #[test]
    fn inset_shrinks_on_every_side() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0).inset(&Edges::uniform(10.0));
        assert_eq!(r, Rect::new(10.0, 10.0, 80.0, 30.0));
    }

    #[test]
    fn empty_rect_is_flagged() {
        assert!(Rect::empty().is_empty());
        assert!(!Rect::new(0.0, 0.0, 0.0, 24.0).is_empty());
    }
}
