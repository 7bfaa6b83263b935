//! # Document Model
//!
//! The input representation for the layout engine. A document is a tree of
//! nodes, each with a kind, already-cascaded style properties, and children.
//! It can be built in code with the constructor helpers below or described
//! as JSON.
//!
//! **Section** is the page-owning node: every section starts on a new page
//! and produces as many continuation pages as its content needs, each with
//! its own header and footer.

use crate::style::Style;
use crate::units::Edges;
use serde::{Deserialize, Serialize};

/// A complete document ready for layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The root nodes of the document. Typically one or more Section nodes,
    /// but can also be content nodes that get auto-wrapped in a section.
    pub children: Vec<Node>,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// Page configuration for sections that don't carry their own.
    #[serde(default)]
    pub default_page: PageConfig,

    /// Custom fonts to register before layout. Only their metrics are used.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            metadata: Metadata::default(),
            default_page: PageConfig::default(),
            fonts: vec![],
        }
    }
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name (e.g. "Inter", "Roboto").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    /// Font weight (100-900). Defaults to 400.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Whether this is an italic variant.
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u32 {
    400
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Configuration for a page: size, orientation, margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default)]
    pub size: PageSize,

    /// Swap width and height.
    #[serde(default)]
    pub landscape: bool,

    /// Page margins in points (1/72 inch).
    #[serde(default)]
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            landscape: false,
            margin: Edges::default(),
        }
    }
}

impl PageConfig {
    pub fn custom(width: f64, height: f64) -> Self {
        Self {
            size: PageSize::Custom { width, height },
            ..Self::default()
        }
    }

    /// (width, height) in points after applying orientation.
    pub fn dimensions(&self) -> (f64, f64) {
        let (w, h) = self.size.dimensions();
        if self.landscape {
            (h, w)
        } else {
            (w, h)
        }
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// What kind of node this is.
    pub kind: NodeKind,

    /// Resolved (already cascaded) style properties for this node.
    #[serde(default)]
    pub style: Style,

    #[serde(default)]
    pub children: Vec<Node>,

    /// Identifier used as a link destination (`#id`).
    #[serde(default)]
    pub id: Option<String>,

    /// Secondary name, reported alongside the id in the layout tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Creates a document outline (bookmark) entry for this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<OutlineEntry>,
}

/// The different kinds of nodes in the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// A page-owning container. Starts a new page and repeats its header
    /// and footer on every page its content flows onto.
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<PageConfig>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<Box<Node>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        footer: Option<Box<Node>>,
        /// Used instead of `header` on the 2nd and later pages.
        #[serde(
            default,
            rename = "continuationHeader",
            skip_serializing_if = "Option::is_none"
        )]
        continuation_header: Option<Box<Node>>,
        #[serde(
            default,
            rename = "continuationFooter",
            skip_serializing_if = "Option::is_none"
        )]
        continuation_footer: Option<Box<Node>>,
    },

    /// A generic block container, analogous to a <div>.
    Div,

    /// An inline container, analogous to a <span>.
    Span,

    /// A text literal.
    Text { content: String },

    /// An image. Inline unless its style says `display: block`.
    Image {
        /// Data URI, base64-encoded image data, or a file path.
        src: String,
        /// Width in points (optional, intrinsic if not set).
        #[serde(default)]
        width: Option<f64>,
        /// Height in points (optional, intrinsic if not set).
        #[serde(default)]
        height: Option<f64>,
    },

    /// An inline hyperlink around its children.
    Link { action: LinkAction },

    /// Ends the current line.
    LineBreak,

    /// Ends the current column (or page, when no column is left).
    ColumnBreak,

    /// Ends the current page.
    PageBreak,
}

/// What a link does when activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum LinkAction {
    Uri {
        uri: String,
    },
    /// Jump to the component whose id matches `target` (with or without `#`).
    Destination {
        target: String,
        #[serde(default)]
        fit: DestinationFit,
    },
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
}

/// How the viewer should fit a destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum DestinationFit {
    #[default]
    FullPage,
    PageWidth,
    PageHeight,
    BoundingBox,
}

/// An entry in the document outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    /// Whether child entries are shown expanded.
    #[serde(default)]
    pub open: bool,
}

impl Node {
    fn of_kind(kind: NodeKind, style: Style, children: Vec<Node>) -> Self {
        Self {
            kind,
            style,
            children,
            id: None,
            name: None,
            outline: None,
        }
    }

    /// Create a Section node with its own page configuration.
    pub fn section(page: Option<PageConfig>, style: Style, children: Vec<Node>) -> Self {
        Self::of_kind(
            NodeKind::Section {
                page,
                header: None,
                footer: None,
                continuation_header: None,
                continuation_footer: None,
            },
            style,
            children,
        )
    }

    /// Create a Div node with children.
    pub fn div(style: Style, children: Vec<Node>) -> Self {
        Self::of_kind(NodeKind::Div, style, children)
    }

    /// Create a Span node with children.
    pub fn span(style: Style, children: Vec<Node>) -> Self {
        Self::of_kind(NodeKind::Span, style, children)
    }

    /// Create a text literal.
    pub fn text(content: &str) -> Self {
        Self::of_kind(
            NodeKind::Text {
                content: content.to_string(),
            },
            Style::default(),
            vec![],
        )
    }

    pub fn image(src: &str, style: Style) -> Self {
        Self::of_kind(
            NodeKind::Image {
                src: src.to_string(),
                width: None,
                height: None,
            },
            style,
            vec![],
        )
    }

    pub fn link(action: LinkAction, style: Style, children: Vec<Node>) -> Self {
        Self::of_kind(NodeKind::Link { action }, style, children)
    }

    pub fn line_break() -> Self {
        Self::of_kind(NodeKind::LineBreak, Style::default(), vec![])
    }

    pub fn column_break() -> Self {
        Self::of_kind(NodeKind::ColumnBreak, Style::default(), vec![])
    }

    pub fn page_break() -> Self {
        Self::of_kind(NodeKind::PageBreak, Style::default(), vec![])
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_outline(mut self, title: &str) -> Self {
        self.outline = Some(OutlineEntry {
            title: title.to_string(),
            open: false,
        });
        self
    }

    /// Attach a header template. Only meaningful on sections.
    pub fn with_header(mut self, node: Node) -> Self {
        if let NodeKind::Section { header, .. } = &mut self.kind {
            *header = Some(Box::new(node));
        }
        self
    }

    pub fn with_footer(mut self, node: Node) -> Self {
        if let NodeKind::Section { footer, .. } = &mut self.kind {
            *footer = Some(Box::new(node));
        }
        self
    }

    pub fn with_continuation_header(mut self, node: Node) -> Self {
        if let NodeKind::Section {
            continuation_header,
            ..
        } = &mut self.kind
        {
            *continuation_header = Some(Box::new(node));
        }
        self
    }

    pub fn with_continuation_footer(mut self, node: Node) -> Self {
        if let NodeKind::Section {
            continuation_footer,
            ..
        } = &mut self.kind
        {
            *continuation_footer = Some(Box::new(node));
        }
        self
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, NodeKind::Section { .. })
    }

    /// Short label used in logs and the layout tree.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Section { .. } => "Section",
            NodeKind::Div => "Div",
            NodeKind::Span => "Span",
            NodeKind::Text { .. } => "Text",
            NodeKind::Image { .. } => "Image",
            NodeKind::Link { .. } => "Link",
            NodeKind::LineBreak => "LineBreak",
            NodeKind::ColumnBreak => "ColumnBreak",
            NodeKind::PageBreak => "PageBreak",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_swaps_dimensions() {
        let config = PageConfig {
            landscape: true,
            ..PageConfig::default()
        };
        assert_eq!(config.dimensions(), (841.89, 595.28));
    }

    #[test]
    fn parses_section_with_templates() {
        let json = r#"{
            "children": [{
                "type": "Section",
                "page": { "size": { "Custom": { "width": 200, "height": 300 } } },
                "header": { "type": "Div", "style": { "height": 20 } },
                "continuationHeader": { "type": "Div", "style": { "height": 10 } },
                "children": [{ "type": "Text", "content": "Hello" }]
            }]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        match &doc.children[0].kind {
            NodeKind::Section {
                page,
                header,
                continuation_header,
                footer,
                ..
            } => {
                assert_eq!(page.as_ref().unwrap().dimensions(), (200.0, 300.0));
                assert!(header.is_some());
                assert!(continuation_header.is_some());
                assert!(footer.is_none());
            }
            other => panic!("expected a section, got {:?}", other),
        }
    }

    #[test]
    fn parses_link_actions() {
        let json = r##"{ "type": "Link", "action": { "kind": "Destination", "target": "#intro" } }"##;
        let node: Node = serde_json::from_str(json).unwrap();
        match node.kind {
            NodeKind::Link { action } => assert_eq!(
                action,
                LinkAction::Destination {
                    target: "#intro".to_string(),
                    fit: DestinationFit::FullPage
                }
            ),
            other => panic!("expected a link, got {:?}", other),
        }
    }

    #[test]
    fn header_builders_ignore_non_sections() {
        let div = Node::div(Style::default(), vec![]).with_header(Node::text("x"));
        assert!(matches!(div.kind, NodeKind::Div));
    }
}
