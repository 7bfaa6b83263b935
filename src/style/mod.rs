//! # Style System
//!
//! Per-node style declarations, already cascaded by whoever produced the
//! document, and the immutable [`ResolvedStyle`] snapshot the layout engine
//! passes down the tree.
//!
//! Resolution handles inheritance (font, color, leading, alignment, overflow
//! policy), relative font sizes, and the paint descriptors for borders and
//! backgrounds. Percentages are resolved late, against whatever container
//! the layout engine is filling, through [`ResolvedStyle::resolve_length`].

use crate::units::{Axis, Dimension, Edges, Size};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";
pub const DEFAULT_FONT_SIZE: f64 = 12.0;
pub const DEFAULT_LINE_HEIGHT: f64 = 1.2;
/// Gutter between columns when a style doesn't set one.
pub const DEFAULT_ALLEY_WIDTH: f64 = 10.0;
const DEFAULT_BORDER_WIDTH: f64 = 1.0;

/// The complete set of style properties for a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    // ── Box Model ──────────────────────────────────────────────
    /// Explicit border-box width.
    pub width: Option<Dimension>,
    /// Explicit border-box height.
    pub height: Option<Dimension>,
    pub min_width: Option<Dimension>,
    pub min_height: Option<Dimension>,
    pub max_width: Option<Dimension>,
    pub max_height: Option<Dimension>,

    /// Padding inside the border.
    pub padding: Option<Edges>,
    /// Margin outside the border.
    pub margin: Option<Edges>,

    // ── Typography ─────────────────────────────────────────────
    pub font_family: Option<String>,
    /// Points, or relative to the parent font size (`em`, `%`).
    pub font_size: Option<Dimension>,
    /// Font weight (100-900).
    pub font_weight: Option<u32>,
    pub font_style: Option<FontStyle>,
    /// Line height as a multiplier of font size.
    pub line_height: Option<f64>,
    /// Explicit leading. Wins over `line_height`.
    pub leading: Option<Dimension>,
    /// Horizontal alignment of lines within their column.
    pub text_align: Option<TextAlign>,
    /// Vertical alignment of content within an explicit-height block.
    pub vertical_align: Option<VerticalAlign>,

    // ── Color & Background ─────────────────────────────────────
    pub color: Option<Color>,
    pub background_color: Option<Color>,
    pub background_image: Option<BackgroundImage>,

    // ── Border ─────────────────────────────────────────────────
    /// Shorthand for all four sides.
    pub border: Option<BorderSide>,
    pub border_top: Option<BorderSide>,
    pub border_right: Option<BorderSide>,
    pub border_bottom: Option<BorderSide>,
    pub border_left: Option<BorderSide>,
    pub border_radius: Option<f64>,

    // ── Positioning ─────────────────────────────────────────────
    pub position: Option<Position>,
    pub display: Option<Display>,
    pub top: Option<Dimension>,
    pub right: Option<Dimension>,
    pub bottom: Option<Dimension>,
    pub left: Option<Dimension>,

    // ── Columns & Flow ─────────────────────────────────────────
    pub column_count: Option<u32>,
    /// Gutter between columns.
    pub alley_width: Option<f64>,
    /// What happens when content doesn't fit. Inherited.
    pub overflow_action: Option<OverflowAction>,
    /// Force a page break before this node.
    pub break_before: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Position {
    /// Normal flow.
    #[default]
    Static,
    /// Normal flow, rendered offset by top/left/bottom/right.
    Relative,
    /// Taken out of flow, placed against the containing block.
    Absolute,
    /// Flows inside a line like a word would.
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Display {
    Block,
    Inline,
    None,
}

/// Overflow policy for content that doesn't fit its column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum OverflowAction {
    /// Continue in the next column, or on a new page.
    #[default]
    NewPage,
    /// Keep laying out past the bottom edge.
    Clip,
    /// Drop whatever doesn't fit.
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// Explicitly no border, as opposed to an unset one.
    None,
}

/// One border declaration. Unset fields fall back to the shorthand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderSide {
    pub width: Option<f64>,
    pub style: Option<BorderStyle>,
    pub color: Option<Color>,
}

impl BorderSide {
    pub fn solid(width: f64, color: Color) -> Self {
        Self {
            width: Some(width),
            style: Some(BorderStyle::Solid),
            color: Some(color),
        }
    }

    pub fn none() -> Self {
        Self {
            width: None,
            style: Some(BorderStyle::None),
            color: None,
        }
    }

    /// Field-by-field merge: values set here beat `fallback`.
    fn over(self, fallback: Option<BorderSide>) -> BorderSide {
        match fallback {
            Some(f) => BorderSide {
                width: self.width.or(f.width),
                style: self.style.or(f.style),
                color: self.color.or(f.color),
            },
            None => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// How a tiling background image repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PatternRepeat {
    #[default]
    Repeat,
    RepeatX,
    RepeatY,
    NoRepeat,
    /// Scale to cover the whole box, preserving aspect ratio.
    Fill,
}

/// A background image painted as a tiling pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundImage {
    pub src: String,
    #[serde(default)]
    pub repeat: PatternRepeat,
    /// Tile width. Height scales proportionally when only this is set.
    pub size_x: Option<f64>,
    pub size_y: Option<f64>,
    /// Horizontal repeat pitch; defaults to the tile width.
    pub step_x: Option<f64>,
    pub step_y: Option<f64>,
    /// Offset of the first tile from the box's top-left corner.
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// An RGBA color, each channel 0.0 - 1.0.
///
/// Deserializes from `{"r":..,"g":..,"b":..,"a":..}` or a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. The `#` is optional.
    pub fn hex(hex: &str) -> Result<Self, String> {
        let digits = hex.trim().trim_start_matches('#');
        let nibbles: Vec<u8> = digits
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| format!("Invalid hex color '{}'", hex))?;
        let channels: Vec<f64> = match nibbles.len() {
            3 => nibbles.iter().map(|n| (n * 17) as f64 / 255.0).collect(),
            6 | 8 => nibbles
                .chunks(2)
                .map(|pair| (pair[0] * 16 + pair[1]) as f64 / 255.0)
                .collect(),
            _ => return Err(format!("Hex color '{}' needs 3, 6 or 8 digits", hex)),
        };
        Ok(Color {
            r: channels[0],
            g: channels[1],
            b: channels[2],
            a: channels.get(3).copied().unwrap_or(1.0),
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Channels {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
}

fn opaque() -> f64 {
    1.0
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(s) => Color::hex(&s),
            ColorRepr::Channels { r, g, b, a } => Ok(Color { r, g, b, a }),
        }
    }
}

/// A stroke used to paint one side of a border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pen {
    pub width: f64,
    pub color: Color,
    pub style: BorderStyle,
}

/// The resolved paint state of a border side that has a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BorderPen {
    /// Explicitly set to `none`.
    NoPen,
    Stroke(Pen),
}

impl BorderPen {
    pub fn width(&self) -> f64 {
        match self {
            BorderPen::NoPen => 0.0,
            BorderPen::Stroke(pen) => pen.width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Brush {
    Solid(Color),
}

/// Fully resolved style with inheritance applied.
///
/// Sizes stay as [`Dimension`]s: percentages depend on the container the
/// node ends up in, which only the layout engine knows.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedStyle {
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Option<Dimension>,
    pub min_height: Option<Dimension>,
    pub max_width: Option<Dimension>,
    pub max_height: Option<Dimension>,
    pub padding: Edges,
    pub margin: Edges,

    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub font_style: FontStyle,
    pub line_height: f64,
    /// Explicit leading in points, inherited.
    pub leading: Option<f64>,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,

    pub color: Color,
    pub background_color: Option<Color>,
    pub background_image: Option<BackgroundImage>,

    pub border_top: Option<BorderSide>,
    pub border_right: Option<BorderSide>,
    pub border_bottom: Option<BorderSide>,
    pub border_left: Option<BorderSide>,
    pub border_radius: f64,

    pub position: Position,
    pub display: Option<Display>,
    pub top: Option<Dimension>,
    pub right: Option<Dimension>,
    pub bottom: Option<Dimension>,
    pub left: Option<Dimension>,

    pub column_count: u32,
    pub alley_width: f64,
    pub overflow_action: OverflowAction,
    pub break_before: bool,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Style::default().resolve(None)
    }
}

impl Style {
    /// Resolve this style against its parent's resolved style.
    pub fn resolve(&self, parent: Option<&ResolvedStyle>) -> ResolvedStyle {
        let parent_font_size = parent.map(|p| p.font_size).unwrap_or(DEFAULT_FONT_SIZE);
        let font_size = match self.font_size {
            Some(Dimension::Auto) | None => parent_font_size,
            Some(d) => d
                .resolve(parent_font_size, parent_font_size)
                .unwrap_or(parent_font_size),
        };

        let leading = match self.leading {
            Some(d) => d.resolve(font_size, font_size),
            None => parent.and_then(|p| p.leading),
        };

        let side = |own: Option<BorderSide>| match own {
            Some(s) => Some(s.over(self.border)),
            None => self.border,
        };

        ResolvedStyle {
            width: self.width.unwrap_or(Dimension::Auto),
            height: self.height.unwrap_or(Dimension::Auto),
            min_width: self.min_width,
            min_height: self.min_height,
            max_width: self.max_width,
            max_height: self.max_height,
            padding: self.padding.unwrap_or_default(),
            margin: self.margin.unwrap_or_default(),

            font_family: self
                .font_family
                .clone()
                .or_else(|| parent.map(|p| p.font_family.clone()))
                .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
            font_size,
            font_weight: self
                .font_weight
                .or_else(|| parent.map(|p| p.font_weight))
                .unwrap_or(400),
            font_style: self
                .font_style
                .or_else(|| parent.map(|p| p.font_style))
                .unwrap_or_default(),
            line_height: self
                .line_height
                .or_else(|| parent.map(|p| p.line_height))
                .unwrap_or(DEFAULT_LINE_HEIGHT),
            leading,
            text_align: self
                .text_align
                .or_else(|| parent.map(|p| p.text_align))
                .unwrap_or_default(),
            vertical_align: self.vertical_align.unwrap_or_default(),

            color: self
                .color
                .or_else(|| parent.map(|p| p.color))
                .unwrap_or_default(),
            background_color: self.background_color,
            background_image: self.background_image.clone(),

            border_top: side(self.border_top),
            border_right: side(self.border_right),
            border_bottom: side(self.border_bottom),
            border_left: side(self.border_left),
            border_radius: self.border_radius.unwrap_or(0.0),

            position: self.position.unwrap_or_default(),
            display: self.display,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            left: self.left,

            column_count: self.column_count.unwrap_or(1).max(1),
            alley_width: self.alley_width.unwrap_or(DEFAULT_ALLEY_WIDTH),
            overflow_action: self
                .overflow_action
                .or_else(|| parent.map(|p| p.overflow_action))
                .unwrap_or_default(),
            break_before: self.break_before.unwrap_or(false),
        }
    }
}

impl ResolvedStyle {
    /// Resolve a length. Percentages take the side of `containing` (the
    /// content box of the nearest sizing ancestor) along `axis`, and stay
    /// unresolved when that side is unbounded. `em` uses this style's font
    /// size. Returns None for `auto`.
    pub fn resolve_length(&self, value: Dimension, containing: Size, axis: Axis) -> Option<f64> {
        let reference = match axis {
            Axis::Horizontal => containing.width,
            Axis::Vertical => containing.height,
        };
        match value {
            Dimension::Percent(_) if !reference.is_finite() => None,
            _ => value.resolve(reference, self.font_size),
        }
    }

    /// The line height a run in this style contributes: the explicit
    /// leading if any, else the font's natural leading.
    pub fn effective_leading(&self) -> f64 {
        self.leading.unwrap_or(self.font_size * self.line_height)
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.font_style, FontStyle::Italic)
    }

    fn border_side(&self, side: Side) -> Option<BorderSide> {
        match side {
            Side::Top => self.border_top,
            Side::Right => self.border_right,
            Side::Bottom => self.border_bottom,
            Side::Left => self.border_left,
        }
    }

    /// The pen for one side of the border.
    ///
    /// `None` when nothing was set for the side (neither per-side nor the
    /// shorthand), `NoPen` when the side is explicitly `none`, otherwise a
    /// stroke with width 1 and black filling in unset fields.
    pub fn create_border_pen(&self, side: Side) -> Option<BorderPen> {
        let declared = self.border_side(side)?;
        let style = declared.style.unwrap_or_default();
        if style == BorderStyle::None {
            return Some(BorderPen::NoPen);
        }
        Some(BorderPen::Stroke(Pen {
            width: declared.width.unwrap_or(DEFAULT_BORDER_WIDTH),
            color: declared.color.unwrap_or_default(),
            style,
        }))
    }

    /// Border thickness per side as consumed by the box model.
    pub fn border_widths(&self) -> Edges {
        let w = |side| {
            self.create_border_pen(side)
                .map(|pen| pen.width())
                .unwrap_or(0.0)
        };
        Edges {
            top: w(Side::Top),
            right: w(Side::Right),
            bottom: w(Side::Bottom),
            left: w(Side::Left),
        }
    }

    /// The background fill, if this node sets one. Never inherited.
    pub fn create_background_brush(&self) -> Option<Brush> {
        self.background_color.map(Brush::Solid)
    }
}
