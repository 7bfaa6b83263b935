//! # Block Layout
//!
//! The box model and the node walk. A block-level node opens an
//! [`OpenBlock`] on the flow's stack, lays its children out into it and
//! closes it into its parent. Runs of inline-level siblings are collected
//! into a paragraph and handed to the line builder.
//!
//! Widths and heights as declared are border-box sizes; the outer size of a
//! laid-out block adds its margins. Percentages resolve against the parent's
//! column width and the content height of the nearest block with a known
//! height: the page, or an explicit-height ancestor.

use super::flow::{layout_detached, Flow};
use super::line::{text_options, LineBuilder, LineOutput, TextInput};
use super::{
    ComponentContent, ComponentRef, ImageContent, LayoutBlock, LayoutItem, LayoutLine,
    LayoutRegion, PositionedRegionRun, RelativeOffsets, Run,
};
use crate::error::FolioError;
use crate::model::{Node, NodeKind};
use crate::style::{Display, Position, ResolvedStyle, VerticalAlign};
use crate::units::{Axis, Dimension, Edges, Rect, Size};

/// Everything needed to (re)open a block, fixed when it is first opened.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub owner: Option<ComponentRef>,
    pub style: ResolvedStyle,
    pub margins: Edges,
    pub border: Edges,
    pub padding: Edges,
    /// Margins included.
    pub outer_width: f64,
    /// Border-box heights.
    pub explicit_height: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub position: Position,
}

impl BlockSpec {
    pub fn content_width(&self) -> f64 {
        (self.outer_width
            - self.margins.horizontal()
            - self.border.horizontal()
            - self.padding.horizontal())
        .max(0.0)
    }

    fn chrome_height(&self) -> f64 {
        self.border.vertical() + self.padding.vertical()
    }
}

/// A block to reopen after a column or page change.
#[derive(Debug, Clone)]
pub struct BlockSeed {
    pub spec: BlockSpec,
    pub fragment_index: usize,
    pub is_continuation: bool,
}

/// A block currently receiving content.
#[derive(Debug)]
pub struct OpenBlock {
    pub spec: BlockSpec,
    pub fragment_index: usize,
    pub is_continuation: bool,
    pub columns: Vec<LayoutRegion>,
    pub column: usize,
    /// Height used in the current column.
    pub cursor_y: f64,
    /// Content height available per column.
    pub capacity: f64,
    /// Height percentages of children resolve against. Auto-height blocks
    /// pass on their parent's.
    pub percent_reference: f64,
    /// Set once content was dropped under the `None` overflow policy.
    pub truncated: bool,
    positioned: Vec<LayoutRegion>,
    /// `bottom` offsets of positioned regions, applied once the height is known.
    pending_bottoms: Vec<Option<f64>>,
}

impl OpenBlock {
    pub fn new(spec: BlockSpec, capacity: f64, fragment_index: usize, is_continuation: bool) -> Self {
        let count = spec.style.column_count.max(1) as usize;
        let alley = spec.style.alley_width;
        let column_width = column_width(spec.content_width(), count, alley);
        let columns = (0..count)
            .map(|i| {
                LayoutRegion::new(Rect::new(
                    i as f64 * (column_width + alley),
                    0.0,
                    column_width,
                    0.0,
                ))
            })
            .collect();
        Self {
            spec,
            fragment_index,
            is_continuation,
            columns,
            column: 0,
            cursor_y: 0.0,
            capacity,
            percent_reference: capacity,
            truncated: false,
            positioned: Vec::new(),
            pending_bottoms: Vec::new(),
        }
    }

    pub fn with_percent_reference(mut self, reference: f64) -> Self {
        self.percent_reference = reference;
        self
    }

    /// The box children size themselves against.
    pub fn containing(&self) -> Size {
        Size::new(self.column_width(), self.percent_reference)
    }

    pub fn remaining(&self) -> f64 {
        self.capacity - self.cursor_y
    }

    pub fn column_width(&self) -> f64 {
        self.columns
            .first()
            .map(|c| c.total_bounds.width)
            .unwrap_or(0.0)
    }

    pub fn has_spare_column(&self) -> bool {
        self.column + 1 < self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positioned.is_empty() && self.columns.iter().all(|c| c.contents.is_empty())
    }

    /// Append to the current column at the cursor, without any fit check.
    pub fn push(&mut self, mut item: LayoutItem) {
        match &mut item {
            LayoutItem::Line(line) => line.offset_y = self.cursor_y,
            LayoutItem::Block(block) => block.total_bounds.y = self.cursor_y,
        }
        self.cursor_y += item.height();
        if let Some(column) = self.columns.get_mut(self.column) {
            column.used_height = self.cursor_y;
            column.contents.push(item);
        }
    }

    fn push_positioned(&mut self, region: LayoutRegion, bottom: Option<f64>) -> usize {
        self.positioned.push(region);
        self.pending_bottoms.push(bottom);
        self.positioned.len() - 1
    }

    /// Close this fragment.
    pub fn into_block(self) -> LayoutBlock {
        let OpenBlock {
            spec,
            fragment_index,
            is_continuation,
            mut columns,
            mut positioned,
            pending_bottoms,
            ..
        } = self;
        let chrome = spec.chrome_height();
        let used = columns.iter().map(|c| c.used_height).fold(0.0, f64::max);

        let content_height = match spec.explicit_height {
            Some(height) => (height - chrome).max(0.0),
            None => {
                let mut height = used;
                if let Some(min) = spec.min_height {
                    height = height.max(min - chrome);
                }
                if let Some(max) = spec.max_height {
                    height = height.min((max - chrome).max(0.0));
                }
                height.max(0.0)
            }
        };

        if spec.explicit_height.is_some() {
            for column in &mut columns {
                let free = content_height - column.used_height;
                let shift = match spec.style.vertical_align {
                    VerticalAlign::Top => 0.0,
                    VerticalAlign::Middle => free / 2.0,
                    VerticalAlign::Bottom => free,
                };
                if shift > 0.0 {
                    for item in &mut column.contents {
                        match item {
                            LayoutItem::Line(line) => line.offset_y += shift,
                            LayoutItem::Block(block) => block.total_bounds.y += shift,
                        }
                    }
                }
            }
        }
        for column in &mut columns {
            column.total_bounds.height = content_height;
        }
        for (region, bottom) in positioned.iter_mut().zip(pending_bottoms) {
            if let Some(bottom) = bottom {
                region.total_bounds.y = content_height - bottom - region.total_bounds.height;
            }
        }

        let height = content_height + chrome + spec.margins.vertical();
        LayoutBlock {
            owner: spec.owner,
            width: spec.outer_width,
            height,
            total_bounds: Rect::new(0.0, 0.0, spec.outer_width, height),
            margins: spec.margins,
            border: spec.border,
            padding: spec.padding,
            columns,
            positioned_regions: positioned,
            image: None,
            position: spec.position,
            fragment_index,
            is_continuation,
            explicit_height: spec.explicit_height.is_some(),
            full_style: spec.style,
        }
    }
}

/// Width of each of `count` columns separated by `alley`.
pub fn column_width(content_width: f64, count: usize, alley: f64) -> f64 {
    let count = count.max(1);
    ((content_width - (count - 1) as f64 * alley) / count as f64).max(0.0)
}

fn is_inline_level(node: &Node, style: &ResolvedStyle) -> bool {
    match node.kind {
        NodeKind::Text { .. } | NodeKind::Span | NodeKind::Link { .. } | NodeKind::LineBreak => true,
        NodeKind::Image { .. } => {
            style.display != Some(Display::Block) && style.position != Position::Absolute
        }
        NodeKind::Div => {
            style.position == Position::Inline || style.display == Some(Display::Inline)
        }
        _ => false,
    }
}

impl<'a> Flow<'a> {
    /// Lay out a list of sibling nodes into the top of the stack.
    pub(super) fn layout_nodes(
        &mut self,
        nodes: &[&'a Node],
        parent_style: &ResolvedStyle,
    ) -> Result<(), FolioError> {
        let mut inline: Vec<&'a Node> = Vec::new();
        for &node in nodes {
            let style = node.style.resolve(Some(parent_style));
            if style.display == Some(Display::None) {
                continue;
            }
            if is_inline_level(node, &style) {
                inline.push(node);
                continue;
            }
            self.flush_paragraph(&mut inline, parent_style)?;
            match node.kind {
                NodeKind::ColumnBreak => self.column_break()?,
                NodeKind::PageBreak => self.page_break()?,
                _ if style.position == Position::Absolute => self.layout_absolute(node, &style)?,
                NodeKind::Image { .. } => self.layout_image_block(node, &style)?,
                _ => self.layout_block_node(node, &style)?,
            }
        }
        self.flush_paragraph(&mut inline, parent_style)
    }

    // ── Box Model ───────────────────────────────────────────────────

    fn block_spec(&self, node: &Node, style: &ResolvedStyle) -> Result<BlockSpec, FolioError> {
        let containing = self.top()?.containing();
        let across = |d: Dimension| style.resolve_length(d, containing, Axis::Horizontal);
        let down = |d: Dimension| style.resolve_length(d, containing, Axis::Vertical);

        let margins = style.margin;
        let border = style.border_widths();
        let padding = style.padding;
        let chrome_width = border.horizontal() + padding.horizontal();

        let mut border_width = across(style.width).unwrap_or(containing.width - margins.horizontal());
        if let Some(min) = style.min_width.and_then(across) {
            border_width = border_width.max(min);
        }
        if let Some(max) = style.max_width.and_then(across) {
            border_width = border_width.min(max);
        }
        border_width = border_width.max(chrome_width);

        let chrome_height = border.vertical() + padding.vertical();
        let explicit_height = down(style.height).map(|h| h.max(chrome_height));
        let min_height = style.min_height.and_then(down);
        let max_height = style.max_height.and_then(down);

        Ok(BlockSpec {
            owner: Some(self.ctx.registry.component(node)?),
            style: style.clone(),
            margins,
            border,
            padding,
            outer_width: border_width + margins.horizontal(),
            explicit_height,
            min_height,
            max_height,
            position: style.position,
        })
    }

    // ── Blocks ──────────────────────────────────────────────────────

    /// A block container. Explicit-height blocks move whole to where they
    /// fit; auto-height blocks open where they are and split as needed.
    pub(super) fn layout_block_node(
        &mut self,
        node: &'a Node,
        style: &ResolvedStyle,
    ) -> Result<(), FolioError> {
        if self.top()?.truncated {
            return Ok(());
        }
        if style.break_before && !self.chain_is_fresh() {
            self.page_break()?;
        }

        let spec = self.block_spec(node, style)?;
        if let Some(height) = spec.explicit_height {
            if !self.reserve(height + spec.margins.vertical())? {
                return Ok(());
            }
        }

        let depth = self.stack.len();
        self.open_block(spec, 0, false)?;
        let children: Vec<&'a Node> = node.children.iter().collect();
        self.layout_nodes(&children, style)?;
        self.close_block(depth)
    }

    pub(super) fn layout_image_block(
        &mut self,
        node: &'a Node,
        style: &ResolvedStyle,
    ) -> Result<(), FolioError> {
        if self.top()?.truncated {
            return Ok(());
        }
        let containing = self.top()?.containing();
        let (width, height, content) = self.image_box(node, style, containing)?;
        let block = self.image_block(node, style, width, height, content)?;
        self.place(LayoutItem::Block(block))
    }

    fn image_block(
        &self,
        node: &Node,
        style: &ResolvedStyle,
        width: f64,
        height: f64,
        content: ImageContent,
    ) -> Result<LayoutBlock, FolioError> {
        let margins = style.margin;
        let border = style.border_widths();
        let padding = style.padding;
        let outer_width = width + padding.horizontal() + border.horizontal() + margins.horizontal();
        let outer_height = height + padding.vertical() + border.vertical() + margins.vertical();
        Ok(LayoutBlock {
            owner: Some(self.ctx.registry.component(node)?),
            width: outer_width,
            height: outer_height,
            total_bounds: Rect::new(0.0, 0.0, outer_width, outer_height),
            margins,
            border,
            padding,
            columns: Vec::new(),
            positioned_regions: Vec::new(),
            image: Some(content),
            position: style.position,
            fragment_index: 0,
            is_continuation: false,
            explicit_height: true,
            full_style: style.clone(),
        })
    }

    /// Content size of an image. Declared sizes win; a single declared
    /// side scales the other; otherwise one pixel is one point. Images
    /// wider than the available width are scaled down to it.
    fn image_box(
        &self,
        node: &Node,
        style: &ResolvedStyle,
        containing: Size,
    ) -> Result<(f64, f64, ImageContent), FolioError> {
        let NodeKind::Image { src, width, height } = &node.kind else {
            return Err(FolioError::Layout(format!(
                "{} node laid out as an image",
                node.kind_name()
            )));
        };
        let info = self.ctx.image_info(src);
        let (natural_w, natural_h) = info
            .map(|i| (i.width_px as f64, i.height_px as f64))
            .unwrap_or((0.0, 0.0));

        let declared_w =
            width.or_else(|| style.resolve_length(style.width, containing, Axis::Horizontal));
        let declared_h =
            height.or_else(|| style.resolve_length(style.height, containing, Axis::Vertical));
        let (mut w, mut h) = match (declared_w, declared_h) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if natural_w > 0.0 => (w, w * natural_h / natural_w),
            (None, Some(h)) if natural_h > 0.0 => (h * natural_w / natural_h, h),
            (Some(w), None) => (w, 0.0),
            (None, Some(h)) => (0.0, h),
            (None, None) => (natural_w, natural_h),
        };

        let chrome = style.border_widths().horizontal()
            + style.padding.horizontal()
            + style.margin.horizontal();
        let room = containing.width - chrome;
        if w > room && room > 0.0 {
            let scale = room / w;
            w *= scale;
            h *= scale;
        }

        Ok((
            w,
            h,
            ImageContent {
                src: src.clone(),
                width_px: info.map(|i| i.width_px).unwrap_or(0),
                height_px: info.map(|i| i.height_px).unwrap_or(0),
            },
        ))
    }

    /// Lay out a block out of flow and anchor it to the top block's content
    /// box. A zero-height marker line keeps its place in the flow.
    fn layout_absolute(&mut self, node: &'a Node, style: &ResolvedStyle) -> Result<(), FolioError> {
        if self.top()?.truncated {
            return Ok(());
        }
        let owner = self.ctx.registry.component(node)?;
        let parent = self.top()?;
        let container = Size::new(parent.spec.content_width(), parent.percent_reference);
        let static_y = parent.cursor_y;
        let column_width = parent.column_width();

        let block = layout_detached(self.ctx, node, container.width, &parent.spec.style)?;

        let across = |d: Dimension| style.resolve_length(d, container, Axis::Horizontal);
        let down = |d: Dimension| style.resolve_length(d, container, Axis::Vertical);
        let x = match (style.left, style.right) {
            (Some(left), _) => across(left),
            (None, Some(right)) => across(right).map(|r| container.width - r - block.width),
            (None, None) => None,
        }
        .unwrap_or(0.0);
        let top = style.top.and_then(down);
        let bottom = match top {
            Some(_) => None,
            None => style.bottom.and_then(down),
        };

        let region = LayoutRegion {
            total_bounds: Rect::new(x, top.unwrap_or(static_y), block.width, block.height),
            used_height: block.height,
            contents: vec![LayoutItem::Block(block)],
        };
        let index = self.top_mut()?.push_positioned(region, bottom);

        let marker = LayoutLine {
            offset_x: 0.0,
            offset_y: 0.0,
            width: 0.0,
            available_width: column_width,
            height: 0.0,
            baseline: 0.0,
            runs: vec![Run::PositionedRegion(PositionedRegionRun {
                owner,
                region: index,
            })],
        };
        self.place(LayoutItem::Line(marker))
    }

    // ── Paragraphs ──────────────────────────────────────────────────

    fn flush_paragraph(
        &mut self,
        inline: &mut Vec<&'a Node>,
        parent_style: &ResolvedStyle,
    ) -> Result<(), FolioError> {
        if inline.is_empty() {
            return Ok(());
        }
        let nodes = std::mem::take(inline);
        if self.top()?.truncated {
            return Ok(());
        }
        let width = self.top()?.column_width();
        let mut builder = LineBuilder::new(self.ctx.fonts, width, parent_style.text_align);
        for node in nodes {
            self.flatten_inline(&mut builder, node, parent_style, None, (0.0, 0.0), width)?;
        }

        for output in builder.finish() {
            match output {
                LineOutput::Line(line) => self.place(LayoutItem::Line(line))?,
                LineOutput::ColumnBreak => self.column_break()?,
                LineOutput::PageBreak => self.page_break()?,
            }
        }
        Ok(())
    }

    /// Feed one inline-level node to the line builder. `inline` is the
    /// style of the nearest enclosing span or link; `padding` is the
    /// (left, right) inline padding this literal carries.
    fn flatten_inline(
        &self,
        builder: &mut LineBuilder<'_>,
        node: &'a Node,
        parent_style: &ResolvedStyle,
        inline: Option<&ResolvedStyle>,
        padding: (f64, f64),
        width: f64,
    ) -> Result<(), FolioError> {
        let style = node.style.resolve(Some(parent_style));
        if style.display == Some(Display::None) {
            return Ok(());
        }
        let owner = self.ctx.registry.component(node)?;

        match &node.kind {
            NodeKind::Text { content } => builder.push_text(TextInput {
                owner,
                style: &style,
                options: text_options(&style, inline),
                text: content,
                pad_left: padding.0,
                pad_right: padding.1,
            }),
            NodeKind::Span | NodeKind::Link { .. } => {
                let texts: Vec<usize> = node
                    .children
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| matches!(c.kind, NodeKind::Text { .. }))
                    .map(|(i, _)| i)
                    .collect();
                let first = texts.first().copied();
                let last = texts.last().copied();

                builder.begin_inline(owner.clone(), RelativeOffsets::of(&style));
                for (i, child) in node.children.iter().enumerate() {
                    let pad_left = if Some(i) == first { style.padding.left } else { 0.0 };
                    let pad_right = if Some(i) == last { style.padding.right } else { 0.0 };
                    self.flatten_inline(
                        builder,
                        child,
                        &style,
                        Some(&style),
                        (pad_left, pad_right),
                        width,
                    )?;
                }
                builder.end_inline(owner);
            }
            NodeKind::LineBreak => builder.push_line_break(&style),
            NodeKind::ColumnBreak => builder.column_break(),
            NodeKind::PageBreak => builder.page_break(),
            NodeKind::Image { .. } => {
                let reference = self.top()?.percent_reference;
                let (w, h, content) = self.image_box(node, &style, Size::new(width, reference))?;
                let chrome = style.border_widths().add(&style.padding).add(&style.margin);
                builder.push_component(
                    owner,
                    w + chrome.horizontal(),
                    h + chrome.vertical(),
                    RelativeOffsets::of(&style),
                    ComponentContent::Image(content),
                );
            }
            NodeKind::Div | NodeKind::Section { .. } => {
                let block = layout_detached(self.ctx, node, width, parent_style)?;
                builder.push_component(
                    owner,
                    block.width,
                    block.height,
                    None,
                    ComponentContent::Block(Box::new(block)),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::layout::{LayoutDocument, LayoutEngine};
    use crate::model::{Document, PageConfig};
    use crate::resources::tests::png_data_uri;
    use crate::style::{BorderSide, Color, Style};

    fn spec(width: f64, columns: u32) -> BlockSpec {
        let style = Style {
            column_count: Some(columns),
            ..Default::default()
        };
        BlockSpec {
            owner: None,
            style: style.resolve(None),
            margins: Edges::default(),
            border: Edges::default(),
            padding: Edges::default(),
            outer_width: width,
            explicit_height: None,
            min_height: None,
            max_height: None,
            position: Position::Static,
        }
    }

    fn line(height: f64) -> LayoutItem {
        LayoutItem::Line(LayoutLine {
            offset_x: 0.0,
            offset_y: 0.0,
            width: 0.0,
            available_width: 0.0,
            height,
            baseline: 0.0,
            runs: vec![],
        })
    }

    fn run(children: Vec<Node>) -> LayoutDocument {
        let section = Node::section(Some(PageConfig::custom(200.0, 300.0)), Style::default(), children);
        LayoutEngine::new()
            .layout(&Document::new(vec![section]), &FontContext::new())
            .unwrap()
    }

    #[test]
    fn columns_split_content_width_with_alley() {
        let open = OpenBlock::new(spec(310.0, 3), 100.0, 0, false);
        assert_eq!(open.columns.len(), 3);
        assert_eq!(open.column_width(), 96.66666666666667);
        assert!((open.columns[2].total_bounds.x - 2.0 * (96.66666666666667 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn auto_height_is_tallest_column() {
        let mut open = OpenBlock::new(spec(210.0, 2), 100.0, 0, false);
        open.push(line(30.0));
        open.column = 1;
        open.cursor_y = 0.0;
        open.push(line(50.0));
        let block = open.into_block();
        assert_eq!(block.height, 50.0);
        assert!(block.columns.iter().all(|c| c.total_bounds.height == 50.0));
        assert_eq!(block.columns[0].used_height, 30.0);
    }

    #[test]
    fn min_height_applies_to_auto_blocks() {
        let mut s = spec(100.0, 1);
        s.min_height = Some(40.0);
        let mut open = OpenBlock::new(s, 100.0, 0, false);
        open.push(line(10.0));
        assert_eq!(open.into_block().height, 40.0);
    }

    #[test]
    fn vertical_align_moves_explicit_content() {
        let mut s = spec(100.0, 1);
        s.explicit_height = Some(100.0);
        s.style.vertical_align = VerticalAlign::Bottom;
        let mut open = OpenBlock::new(s, 100.0, 0, false);
        open.push(line(20.0));
        let block = open.into_block();
        match &block.columns[0].contents[0] {
            LayoutItem::Line(l) => assert_eq!(l.offset_y, 80.0),
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn box_model_adds_margins_border_and_padding() {
        let style = Style {
            margin: Some(Edges::uniform(10.0)),
            padding: Some(Edges::uniform(5.0)),
            border: Some(BorderSide::solid(2.0, Color::BLACK)),
            ..Default::default()
        };
        let child = Node::div(
            Style {
                height: Some(Dimension::Pt(20.0)),
                ..Default::default()
            },
            vec![],
        );
        let doc = run(vec![Node::div(style, vec![child])]);
        let block = doc.pages[0].content.blocks().next().unwrap();
        assert_eq!(block.width, 200.0);
        assert_eq!(block.height, 54.0);
        let content = block.content_bounds();
        assert_eq!(content.x, 17.0);
        assert_eq!(content.width, 166.0);
        assert_eq!(block.blocks().next().unwrap().width, 166.0);
    }

    #[test]
    fn percent_width_uses_parent_column() {
        let style = Style {
            width: Some(Dimension::Percent(50.0)),
            height: Some(Dimension::Percent(10.0)),
            ..Default::default()
        };
        let doc = run(vec![Node::div(style, vec![])]);
        let block = doc.pages[0].content.blocks().next().unwrap();
        assert_eq!(block.width, 100.0);
        assert_eq!(block.height, 30.0);
    }

    #[test]
    fn percent_height_skips_auto_parents() {
        let half = Style {
            height: Some(Dimension::Percent(50.0)),
            ..Default::default()
        };
        let doc = run(vec![
            Node::div(
                Style {
                    height: Some(Dimension::Pt(100.0)),
                    ..Default::default()
                },
                vec![],
            ),
            Node::div(Style::default(), vec![Node::div(half.clone(), vec![]).with_id("nested")]),
            Node::page_break(),
            Node::div(half, vec![]).with_id("direct"),
        ]);
        let nested = doc.first_arrangement("nested").unwrap();
        let direct = doc.first_arrangement("direct").unwrap();
        assert_eq!(nested.static_bounds.height, 150.0);
        assert_eq!(direct.static_bounds.height, 150.0);
    }

    #[test]
    fn percent_height_uses_explicit_parent_content_box() {
        let parent = Style {
            height: Some(Dimension::Pt(80.0)),
            padding: Some(Edges::uniform(10.0)),
            ..Default::default()
        };
        let child = Style {
            height: Some(Dimension::Percent(50.0)),
            ..Default::default()
        };
        let doc = run(vec![Node::div(parent, vec![Node::div(child, vec![]).with_id("child")])]);
        assert_eq!(doc.first_arrangement("child").unwrap().static_bounds.height, 30.0);
    }

    #[test]
    fn absolute_block_goes_to_positioned_region() {
        let style = Style {
            position: Some(Position::Absolute),
            left: Some(Dimension::Pt(20.0)),
            top: Some(Dimension::Pt(30.0)),
            width: Some(Dimension::Pt(50.0)),
            height: Some(Dimension::Pt(40.0)),
            ..Default::default()
        };
        let doc = run(vec![Node::div(style, vec![])]);
        let content = &doc.pages[0].content;
        assert_eq!(
            content.positioned_regions[0].total_bounds,
            Rect::new(20.0, 30.0, 50.0, 40.0)
        );
        let marker = content.lines().next().unwrap();
        assert_eq!(marker.height, 0.0);
        assert!(matches!(marker.runs[0], Run::PositionedRegion(_)));
    }

    #[test]
    fn absolute_block_anchors_to_bottom_right() {
        let style = Style {
            position: Some(Position::Absolute),
            right: Some(Dimension::Pt(10.0)),
            bottom: Some(Dimension::Pt(10.0)),
            width: Some(Dimension::Pt(50.0)),
            height: Some(Dimension::Pt(40.0)),
            ..Default::default()
        };
        let doc = run(vec![Node::div(style, vec![])]);
        let region = &doc.pages[0].content.positioned_regions[0];
        assert_eq!(region.total_bounds, Rect::new(140.0, 250.0, 50.0, 40.0));
    }

    #[test]
    fn inline_block_is_a_component_run() {
        let inline_block = Node::div(
            Style {
                position: Some(Position::Inline),
                width: Some(Dimension::Pt(50.0)),
                height: Some(Dimension::Pt(20.0)),
                ..Default::default()
            },
            vec![],
        );
        let doc = run(vec![Node::div(
            Style::default(),
            vec![Node::text("Before "), inline_block, Node::text(" after")],
        )]);
        let outer = doc.pages[0].content.blocks().next().unwrap();
        let line = outer.lines().next().unwrap();
        let component = line
            .runs
            .iter()
            .find_map(|r| match r {
                Run::Component(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(component.width, 50.0);
        assert_eq!(line.height, 20.0);
    }

    #[test]
    fn inline_image_uses_natural_size() {
        let uri = png_data_uri(30, 20);
        let doc = run(vec![Node::image(&uri, Style::default())]);
        let line = doc.pages[0].content.lines().next().unwrap();
        match &line.runs[0] {
            Run::Component(c) => {
                assert_eq!(c.width, 30.0);
                assert_eq!(c.height, 20.0);
            }
            other => panic!("expected component, got {:?}", other),
        }
    }

    #[test]
    fn block_image_scales_from_one_side() {
        let uri = png_data_uri(30, 20);
        let style = Style {
            display: Some(Display::Block),
            width: Some(Dimension::Pt(60.0)),
            ..Default::default()
        };
        let doc = run(vec![Node::image(&uri, style)]);
        let block = doc.pages[0].content.blocks().next().unwrap();
        assert_eq!(block.width, 60.0);
        assert_eq!(block.height, 40.0);
        assert!(block.image.is_some());
    }

    #[test]
    fn hidden_nodes_are_skipped() {
        let style = Style {
            display: Some(Display::None),
            height: Some(Dimension::Pt(20.0)),
            ..Default::default()
        };
        let doc = run(vec![Node::div(style, vec![])]);
        assert_eq!(doc.pages[0].content.blocks().count(), 0);
    }
}
