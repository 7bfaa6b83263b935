//! # Layout Engine
//!
//! Turns a document tree into a tree of pages, blocks, columns, lines and
//! runs with every position resolved.
//!
//! The page is the unit of layout: content flows *into* columns and pages,
//! and every overflow decision is taken against the real remaining space of
//! the current column. The pass is single-threaded and depth-first, because
//! each block's position depends on everything placed before it.
//!
//! ```text
//!   flow      sections, pages, headers/footers, overflow and breaks
//!     ↓
//!   block     box model, columns, the open-block stack
//!     ↓
//!   line      inline runs into lines
//!     ↓
//!   paint     background rectangles for wrapped text runs
//!   position  arrangements (final render bounds)
//!   pattern   tiling image backgrounds
//!   artefacts links, outlines, named destinations
//! ```

pub mod artefacts;
pub mod block;
pub mod flow;
pub mod line;
pub mod page_break;
pub mod paint;
pub mod pattern;
pub mod position;

use crate::error::FolioError;
use crate::font::FontContext;
use crate::model::{Document, LinkAction, Metadata, Node, NodeKind, OutlineEntry};
use crate::resources::{load_image_info, ImageInfo};
use crate::style::{BorderPen, Brush, Position, ResolvedStyle, Side};
use crate::units::{Edges, Rect, Size};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

pub use artefacts::{DocumentArtefacts, PageArtefacts};
pub use pattern::{SharedResources, TilingPattern, NO_REPEAT_STEP};
pub use position::{Arrangement, RelativeOffsets};

/// Pre-order index of a node in the document, assigned at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Back-reference from the layout tree to the component that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRef {
    pub id: NodeId,
    pub kind: &'static str,
    /// The node's `id`, or its `name` when it has no id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The finished layout of a whole document.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutDocument {
    /// Carried over from the input for whoever renders the pages.
    pub metadata: Metadata,
    pub pages: Vec<LayoutPage>,
    /// Every placement of every arranged component, in placement order.
    pub arrangements: BTreeMap<NodeId, Vec<Arrangement>>,
    pub artefacts: DocumentArtefacts,
    pub resources: SharedResources,
    /// Lookup from node `id`/`name` to its component.
    pub names: BTreeMap<String, NodeId>,
}

impl LayoutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The component registered under a node `id` or `name`.
    pub fn component(&self, name: &str) -> Option<NodeId> {
        self.names.get(name.trim_start_matches('#')).copied()
    }

    pub fn arrangements_for(&self, id: NodeId) -> &[Arrangement] {
        self.arrangements
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The first arrangement of a named component.
    pub fn first_arrangement(&self, name: &str) -> Option<&Arrangement> {
        self.component(name)
            .and_then(|id| self.arrangements_for(id).first())
    }
}

/// A single laid-out page.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutPage {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    /// The section that owns this page. None for the implicit section.
    pub section: Option<ComponentRef>,
    /// Page number within its section, starting at 0.
    pub section_page: usize,
    pub is_continuation: bool,
    pub margins: Edges,
    pub header: Option<LayoutBlock>,
    pub footer: Option<LayoutBlock>,
    pub content: LayoutBlock,
    pub artefacts: PageArtefacts,
}

/// A block-level box, or one fragment of a box split across regions.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutBlock {
    pub owner: Option<ComponentRef>,
    /// Outer width, margins included.
    pub width: f64,
    /// Outer height, margins included.
    pub height: f64,
    /// Outer box relative to the parent column's content origin (page
    /// origin for header, footer and content blocks).
    pub total_bounds: Rect,
    pub margins: Edges,
    pub border: Edges,
    pub padding: Edges,
    pub columns: Vec<LayoutRegion>,
    /// Out-of-flow regions, each holding one absolutely positioned block.
    pub positioned_regions: Vec<LayoutRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageContent>,
    pub position: Position,
    pub fragment_index: usize,
    pub is_continuation: bool,
    pub explicit_height: bool,
    #[serde(skip)]
    pub full_style: ResolvedStyle,
}

impl LayoutBlock {
    /// The border box, in the same coordinate space as `total_bounds`.
    pub fn border_bounds(&self) -> Rect {
        self.total_bounds.inset(&self.margins)
    }

    /// The content box, in the same coordinate space as `total_bounds`.
    pub fn content_bounds(&self) -> Rect {
        self.border_bounds()
            .inset(&self.border)
            .inset(&self.padding)
    }

    pub fn background(&self) -> Option<Brush> {
        self.full_style.create_background_brush()
    }

    pub fn border_pen(&self, side: Side) -> Option<BorderPen> {
        self.full_style.create_border_pen(side)
    }

    /// All lines placed directly in this block, in column order.
    pub fn lines(&self) -> impl Iterator<Item = &LayoutLine> {
        self.columns.iter().flat_map(|c| {
            c.contents.iter().filter_map(|item| match item {
                LayoutItem::Line(line) => Some(line),
                LayoutItem::Block(_) => None,
            })
        })
    }

    /// All blocks placed directly in this block, in column order.
    pub fn blocks(&self) -> impl Iterator<Item = &LayoutBlock> {
        self.columns.iter().flat_map(|c| {
            c.contents.iter().filter_map(|item| match item {
                LayoutItem::Block(block) => Some(block),
                LayoutItem::Line(_) => None,
            })
        })
    }
}

/// One column of a block, or one out-of-flow positioned region.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutRegion {
    /// Relative to the owning block's content origin.
    pub total_bounds: Rect,
    pub contents: Vec<LayoutItem>,
    /// Cumulative height of everything placed, which can exceed the
    /// region's bounds when content was clipped.
    pub used_height: f64,
}

impl LayoutRegion {
    pub fn new(total_bounds: Rect) -> Self {
        Self {
            total_bounds,
            contents: Vec::new(),
            used_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum LayoutItem {
    Line(LayoutLine),
    Block(LayoutBlock),
}

impl LayoutItem {
    pub fn height(&self) -> f64 {
        match self {
            LayoutItem::Line(line) => line.height,
            LayoutItem::Block(block) => block.height,
        }
    }
}

/// One visual line of inline content.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutLine {
    /// Horizontal alignment shift within the column.
    pub offset_x: f64,
    /// Top of the line within the column.
    pub offset_y: f64,
    /// Consumed width.
    pub width: f64,
    pub available_width: f64,
    pub height: f64,
    /// Distance from the line top to the baseline.
    pub baseline: f64,
    pub runs: Vec<Run>,
}

/// The atomic paint/measure units of a line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "run")]
pub enum Run {
    InlineBegin(InlineMarker),
    InlineEnd(InlineMarker),
    TextRunBegin(TextRunBegin),
    TextRunEnd(InlineMarker),
    TextRunCharacter(TextRunCharacter),
    TextRunSpacer(TextRunSpacer),
    TextRunNewLine(TextRunNewLine),
    Component(ComponentRun),
    PositionedRegion(PositionedRegionRun),
}

impl Run {
    /// Horizontal position relative to the line start.
    pub fn offset_x(&self) -> f64 {
        match self {
            Run::InlineBegin(m) | Run::InlineEnd(m) | Run::TextRunEnd(m) => m.offset_x,
            Run::TextRunBegin(b) => b.offset_x,
            Run::TextRunCharacter(c) => c.offset_x,
            Run::TextRunSpacer(s) => s.offset_x,
            Run::Component(c) => c.offset_x,
            Run::TextRunNewLine(_) | Run::PositionedRegion(_) => 0.0,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Run::TextRunCharacter(c) => c.width,
            Run::TextRunSpacer(s) => s.width,
            Run::Component(c) => c.width,
            _ => 0.0,
        }
    }

    fn shift(&mut self, dx: f64) {
        match self {
            Run::InlineBegin(m) | Run::InlineEnd(m) | Run::TextRunEnd(m) => m.offset_x += dx,
            Run::TextRunBegin(b) => b.offset_x += dx,
            Run::TextRunCharacter(c) => c.offset_x += dx,
            Run::TextRunSpacer(s) => s.offset_x += dx,
            Run::Component(c) => c.offset_x += dx,
            Run::TextRunNewLine(_) | Run::PositionedRegion(_) => {}
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineMarker {
    pub owner: ComponentRef,
    pub offset_x: f64,
    /// Set on the `InlineBegin` of a relatively positioned span or link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offsets: Option<RelativeOffsets>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextRunBegin {
    pub owner: ComponentRef,
    pub offset_x: f64,
    pub options: TextRenderOptions,
    /// One rectangle per physical line this run touches, relative to the
    /// owning block's content origin. Empty rectangles mark lines where the
    /// run placed no characters.
    pub calculated_bounds: Vec<Rect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextRunCharacter {
    pub characters: String,
    pub offset_x: f64,
    pub width: f64,
    /// Extra width added to each space when justified.
    pub word_spacing: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextRunSpacer {
    pub offset_x: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextRunNewLine {
    /// From this line's run start to the next line's run start.
    pub offset: Size,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentRun {
    pub owner: ComponentRef,
    pub offset_x: f64,
    pub width: f64,
    pub height: f64,
    /// Relative offsets of an inline image. Inline blocks carry their own
    /// style instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offsets: Option<RelativeOffsets>,
    pub content: ComponentContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ComponentContent {
    Image(ImageContent),
    Block(Box<LayoutBlock>),
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionedRegionRun {
    pub owner: ComponentRef,
    /// Index into the containing block's `positioned_regions`.
    pub region: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageContent {
    pub src: String,
    pub width_px: u32,
    pub height_px: u32,
}

/// How a text run is painted.
#[derive(Debug, Clone, Serialize)]
pub struct TextRenderOptions {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub italic: bool,
    pub leading: f64,
    pub color: crate::style::Color,
    /// Fill from the enclosing inline element.
    pub background: Option<Brush>,
    pub padding: Edges,
    #[serde(skip_serializing_if = "InlineBorders::is_empty")]
    pub border: InlineBorders,
    pub border_radius: f64,
}

/// Border pens of the enclosing inline element, one per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InlineBorders {
    pub top: Option<BorderPen>,
    pub right: Option<BorderPen>,
    pub bottom: Option<BorderPen>,
    pub left: Option<BorderPen>,
}

impl InlineBorders {
    pub fn of(style: &ResolvedStyle) -> Self {
        Self {
            top: style.create_border_pen(Side::Top),
            right: style.create_border_pen(Side::Right),
            bottom: style.create_border_pen(Side::Bottom),
            left: style.create_border_pen(Side::Left),
        }
    }

    pub fn is_empty(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(Option::is_none)
    }
}

/// Everything we know about one node of the document.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub component: ComponentRef,
    pub parent: Option<NodeId>,
    pub outline: Option<OutlineEntry>,
    pub link: Option<LinkAction>,
}

/// Identity for every node in the document, assigned in pre-order.
pub struct ComponentRegistry {
    ids: HashMap<*const Node, NodeId>,
    components: Vec<ComponentInfo>,
    names: BTreeMap<String, NodeId>,
}

impl ComponentRegistry {
    pub fn build(document: &Document) -> Self {
        let mut registry = ComponentRegistry {
            ids: HashMap::new(),
            components: Vec::new(),
            names: BTreeMap::new(),
        };
        for node in &document.children {
            registry.visit(node, None);
        }
        registry
    }

    fn visit(&mut self, node: &Node, parent: Option<NodeId>) {
        let id = NodeId(self.components.len());
        self.ids.insert(node as *const Node, id);

        let name = node.id.clone().or_else(|| node.name.clone());
        for key in [&node.id, &node.name].into_iter().flatten() {
            self.names.entry(key.clone()).or_insert(id);
        }
        let link = match &node.kind {
            NodeKind::Link { action } => Some(action.clone()),
            _ => None,
        };
        self.components.push(ComponentInfo {
            component: ComponentRef {
                id,
                kind: node.kind_name(),
                name,
            },
            parent,
            outline: node.outline.clone(),
            link,
        });

        if let NodeKind::Section {
            header,
            footer,
            continuation_header,
            continuation_footer,
            ..
        } = &node.kind
        {
            for template in [header, footer, continuation_header, continuation_footer]
                .into_iter()
                .flatten()
            {
                self.visit(template, Some(id));
            }
        }
        for child in &node.children {
            self.visit(child, Some(id));
        }
    }

    /// The component reference for a node of the document being laid out.
    pub fn component(&self, node: &Node) -> Result<ComponentRef, FolioError> {
        self.ids
            .get(&(node as *const Node))
            .and_then(|id| self.components.get(id.0))
            .map(|info| info.component.clone())
            .ok_or_else(|| {
                FolioError::Layout(format!(
                    "{} node is not part of the document being laid out",
                    node.kind_name()
                ))
            })
    }

    pub fn info(&self, id: NodeId) -> Option<&ComponentInfo> {
        self.components.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.components.iter()
    }

    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.names.get(name.trim_start_matches('#')).copied()
    }

    pub fn names(&self) -> &BTreeMap<String, NodeId> {
        &self.names
    }
}

/// Shared, read-only state for one layout pass.
pub struct LayoutContext<'a> {
    pub engine: &'a LayoutEngine,
    pub fonts: &'a FontContext,
    pub registry: &'a ComponentRegistry,
}

impl LayoutContext<'_> {
    pub fn image_info(&self, src: &str) -> Option<ImageInfo> {
        self.engine.image_info(src)
    }
}

/// The layout engine. Holds caches that live across passes.
pub struct LayoutEngine {
    image_dim_cache: RefCell<HashMap<String, Option<ImageInfo>>>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            image_dim_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Image dimensions, loaded once per source. Failures are logged and
    /// cached so a missing image only warns once.
    pub fn image_info(&self, src: &str) -> Option<ImageInfo> {
        if let Some(info) = self.image_dim_cache.borrow().get(src) {
            return *info;
        }
        let info = match load_image_info(src) {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("Image '{}' could not be loaded: {}", short_src(src), e);
                None
            }
        };
        self.image_dim_cache
            .borrow_mut()
            .insert(src.to_string(), info);
        info
    }

    /// Lay out a document into pages.
    pub fn layout(
        &self,
        document: &Document,
        fonts: &FontContext,
    ) -> Result<LayoutDocument, FolioError> {
        let registry = ComponentRegistry::build(document);
        let ctx = LayoutContext {
            engine: self,
            fonts,
            registry: &registry,
        };

        let mut pages: Vec<LayoutPage> = Vec::new();
        let mut loose: Vec<&Node> = Vec::new();
        for child in &document.children {
            if child.is_section() {
                if !loose.is_empty() {
                    let frame = flow::SectionFrame::implicit(&document.default_page);
                    pages.extend(flow::layout_section(&ctx, frame, &loose, pages.len())?);
                    loose.clear();
                }
                let frame = flow::SectionFrame::from_node(&ctx, child, &document.default_page)?;
                let children: Vec<&Node> = child.children.iter().collect();
                pages.extend(flow::layout_section(&ctx, frame, &children, pages.len())?);
            } else {
                loose.push(child);
            }
        }
        if !loose.is_empty() || pages.is_empty() {
            let frame = flow::SectionFrame::implicit(&document.default_page);
            pages.extend(flow::layout_section(&ctx, frame, &loose, pages.len())?);
        }

        for page in &mut pages {
            paint::calculate_page_bounds(page);
        }
        let arranged = position::arrange_pages(&pages);
        let resources = pattern::build_resources(&ctx, &arranged.backgrounds);
        let artefacts = artefacts::build(&mut pages, &arranged.arrangements, &registry);

        log::debug!("Layout complete: {} pages", pages.len());

        Ok(LayoutDocument {
            metadata: document.metadata.clone(),
            pages,
            arrangements: arranged.arrangements,
            artefacts,
            resources,
            names: registry.names().clone(),
        })
    }
}

/// Trim data URIs down to something readable in log messages.
fn short_src(src: &str) -> &str {
    if src.len() > 48 {
        src.get(..48).unwrap_or(src)
    } else {
        src
    }
}
