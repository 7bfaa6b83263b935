//! # Page and Column Flow
//!
//! Owns the stack of open blocks, from the page content block at the bottom
//! to the innermost block currently receiving content at the top. Items are
//! placed into the top of the stack; when one doesn't fit, the overflow
//! decision either moves to the next column of some enclosing multi-column
//! block, starts a new page, clips or drops.
//!
//! Moving on splits every block above the level that advances: each one
//! closes its current fragment into its parent and is reopened, as a
//! continuation, at the top of the new column or page. Layout code further
//! up the call stack never notices; it keeps writing into whatever block
//! sits at its depth.

use super::block::{BlockSeed, BlockSpec, OpenBlock};
use super::page_break::{decide_break, BreakContext, BreakDecision, FIT_EPSILON};
use super::{ComponentRef, LayoutBlock, LayoutContext, LayoutItem, LayoutPage, PageArtefacts};
use crate::error::FolioError;
use crate::model::{Node, NodeKind, PageConfig};
use crate::style::{Position, ResolvedStyle, Style};
use crate::units::{Edges, Rect};

/// Everything a section contributes to its pages.
pub struct SectionFrame<'a> {
    pub owner: Option<ComponentRef>,
    pub config: PageConfig,
    pub margins: Edges,
    pub style: ResolvedStyle,
    pub header: Option<&'a Node>,
    pub footer: Option<&'a Node>,
    pub continuation_header: Option<&'a Node>,
    pub continuation_footer: Option<&'a Node>,
}

impl<'a> SectionFrame<'a> {
    /// The section wrapping top-level content that isn't in one.
    pub fn implicit(default_page: &PageConfig) -> Self {
        Self {
            owner: None,
            config: default_page.clone(),
            margins: default_page.margin,
            style: Style::default().resolve(None),
            header: None,
            footer: None,
            continuation_header: None,
            continuation_footer: None,
        }
    }

    pub fn from_node(
        ctx: &LayoutContext<'_>,
        node: &'a Node,
        default_page: &PageConfig,
    ) -> Result<Self, FolioError> {
        let NodeKind::Section {
            page,
            header,
            footer,
            continuation_header,
            continuation_footer,
        } = &node.kind
        else {
            return Err(FolioError::Layout(format!(
                "{} node cannot start a section",
                node.kind_name()
            )));
        };
        let config = page.clone().unwrap_or_else(|| default_page.clone());
        Ok(Self {
            owner: Some(ctx.registry.component(node)?),
            margins: node.style.margin.unwrap_or(config.margin),
            config,
            style: node.style.resolve(None),
            header: header.as_deref(),
            footer: footer.as_deref(),
            continuation_header: continuation_header.as_deref(),
            continuation_footer: continuation_footer.as_deref(),
        })
    }
}

/// Lay out one section's content into as many pages as it needs.
pub fn layout_section<'a>(
    ctx: &'a LayoutContext<'a>,
    frame: SectionFrame<'a>,
    children: &[&'a Node],
    first_page_index: usize,
) -> Result<Vec<LayoutPage>, FolioError> {
    let style = frame.style.clone();
    let mut flow = Flow::paged(ctx, frame, first_page_index);
    flow.start_page(false)?;
    flow.layout_nodes(children, &style)?;
    flow.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FlowMode {
    /// Overflow may start new pages.
    Paged,
    /// Unbounded height: headers, footers, inline-blocks, absolute blocks.
    Detached,
}

/// Header, footer and geometry of the page being filled.
struct PageShell {
    width: f64,
    height: f64,
    margins: Edges,
    header: Option<LayoutBlock>,
    footer: Option<LayoutBlock>,
    is_continuation: bool,
}

pub struct Flow<'a> {
    pub(super) ctx: &'a LayoutContext<'a>,
    pub(super) mode: FlowMode,
    pub(super) stack: Vec<OpenBlock>,
    frame: Option<SectionFrame<'a>>,
    shell: Option<PageShell>,
    pages: Vec<LayoutPage>,
    first_page_index: usize,
}

impl<'a> Flow<'a> {
    pub fn paged(ctx: &'a LayoutContext<'a>, frame: SectionFrame<'a>, first_page_index: usize) -> Self {
        Self {
            ctx,
            mode: FlowMode::Paged,
            stack: Vec::new(),
            frame: Some(frame),
            shell: None,
            pages: Vec::new(),
            first_page_index,
        }
    }

    /// A flow with a single root block of unbounded height.
    pub fn detached(ctx: &'a LayoutContext<'a>, width: f64, parent_style: &ResolvedStyle) -> Self {
        let mut style = parent_style.clone();
        style.column_count = 1;
        let spec = BlockSpec {
            owner: None,
            style,
            margins: Edges::default(),
            border: Edges::default(),
            padding: Edges::default(),
            outer_width: width,
            explicit_height: None,
            min_height: None,
            max_height: None,
            position: Position::Static,
        };
        Self {
            ctx,
            mode: FlowMode::Detached,
            stack: vec![OpenBlock::new(spec, f64::INFINITY, 0, false)],
            frame: None,
            shell: None,
            pages: Vec::new(),
            first_page_index: 0,
        }
    }

    pub(super) fn top(&self) -> Result<&OpenBlock, FolioError> {
        self.stack
            .last()
            .ok_or_else(|| FolioError::Layout("no open block to place content into".to_string()))
    }

    pub(super) fn top_mut(&mut self) -> Result<&mut OpenBlock, FolioError> {
        self.stack
            .last_mut()
            .ok_or_else(|| FolioError::Layout("no open block to place content into".to_string()))
    }

    // ── Pages ───────────────────────────────────────────────────────

    pub(super) fn start_page(&mut self, is_continuation: bool) -> Result<(), FolioError> {
        let ctx = self.ctx;
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| FolioError::Layout("page started outside a section".to_string()))?;

        let (width, height) = frame.config.dimensions();
        let margins = frame.margins;
        let content_width = (width - margins.horizontal()).max(0.0);

        let (header_node, footer_node) = if is_continuation {
            (
                frame.continuation_header.or(frame.header),
                frame.continuation_footer.or(frame.footer),
            )
        } else {
            (frame.header, frame.footer)
        };
        let header = header_node
            .map(|node| layout_detached(ctx, node, content_width, &frame.style))
            .transpose()?;
        let footer = footer_node
            .map(|node| layout_detached(ctx, node, content_width, &frame.style))
            .transpose()?;

        let header_height = header.as_ref().map(|b| b.height).unwrap_or(0.0);
        let footer_height = footer.as_ref().map(|b| b.height).unwrap_or(0.0);
        let content_height = (height - margins.vertical() - header_height - footer_height).max(0.0);

        let border = frame.style.border_widths();
        let padding = frame.style.padding;
        let spec = BlockSpec {
            owner: frame.owner.clone(),
            style: frame.style.clone(),
            margins: Edges::default(),
            border,
            padding,
            outer_width: content_width,
            explicit_height: Some(content_height),
            min_height: None,
            max_height: None,
            position: Position::Static,
        };
        let capacity = (content_height - border.vertical() - padding.vertical()).max(0.0);
        let fragment_index = self.pages.len();

        log::debug!(
            "Page {} started ({}x{}, content height {:.1}, continuation: {})",
            self.first_page_index + fragment_index,
            width,
            height,
            content_height,
            is_continuation
        );

        self.stack
            .push(OpenBlock::new(spec, capacity, fragment_index, is_continuation));
        self.shell = Some(PageShell {
            width,
            height,
            margins,
            header,
            footer,
            is_continuation,
        });
        Ok(())
    }

    fn finish_page(&mut self) -> Result<(), FolioError> {
        let root = self
            .stack
            .pop()
            .ok_or_else(|| FolioError::Layout("page finished with no content block".to_string()))?;
        if !self.stack.is_empty() {
            return Err(FolioError::Layout(format!(
                "{} blocks still open at the end of a page",
                self.stack.len()
            )));
        }
        let shell = self
            .shell
            .take()
            .ok_or_else(|| FolioError::Layout("page finished before it started".to_string()))?;
        let section = self.frame.as_ref().and_then(|f| f.owner.clone());

        let margins = shell.margins;
        let header_height = shell.header.as_ref().map(|b| b.height).unwrap_or(0.0);

        let mut content = root.into_block();
        content.total_bounds = Rect::new(
            margins.left,
            margins.top + header_height,
            content.width,
            content.height,
        );
        let header = shell.header.map(|mut block| {
            block.total_bounds = Rect::new(margins.left, margins.top, block.width, block.height);
            block
        });
        let footer = shell.footer.map(|mut block| {
            block.total_bounds = Rect::new(
                margins.left,
                shell.height - margins.bottom - block.height,
                block.width,
                block.height,
            );
            block
        });

        let section_page = self.pages.len();
        self.pages.push(LayoutPage {
            index: self.first_page_index + section_page,
            width: shell.width,
            height: shell.height,
            section,
            section_page,
            is_continuation: shell.is_continuation,
            margins,
            header,
            footer,
            content,
            artefacts: PageArtefacts::default(),
        });
        Ok(())
    }

    fn new_page(&mut self) -> Result<(), FolioError> {
        let seeds = self.split_above(0)?;
        self.finish_page()?;
        self.start_page(true)?;
        self.reopen(seeds)
    }

    pub fn finish(mut self) -> Result<Vec<LayoutPage>, FolioError> {
        if !self.stack.is_empty() {
            self.finish_page()?;
        }
        Ok(self.pages)
    }

    /// Close the root of a detached flow. A single laid-out block is
    /// returned as itself, anything else wrapped in the root.
    pub fn finish_detached(mut self) -> Result<LayoutBlock, FolioError> {
        let root = self
            .stack
            .pop()
            .ok_or_else(|| FolioError::Layout("detached layout has no root".to_string()))?;
        let mut root = root.into_block();
        let only_block = root.columns.len() == 1
            && root.positioned_regions.is_empty()
            && matches!(root.columns[0].contents.as_slice(), [LayoutItem::Block(_)]);
        if only_block {
            if let Some(LayoutItem::Block(block)) = root.columns[0].contents.pop() {
                return Ok(block);
            }
        }
        Ok(root)
    }

    // ── Open-block stack ────────────────────────────────────────────

    pub(super) fn open_block(
        &mut self,
        spec: BlockSpec,
        fragment_index: usize,
        is_continuation: bool,
    ) -> Result<(), FolioError> {
        let parent = self.top()?;
        let remaining = parent.remaining();
        let inherited_reference = parent.percent_reference;
        let chrome = spec.border.vertical() + spec.padding.vertical();
        let capacity = match spec.explicit_height {
            Some(height) => (height - chrome).max(0.0),
            None => {
                let available = (remaining - spec.margins.vertical() - chrome).max(0.0);
                match spec.max_height {
                    Some(max) => available.min((max - chrome).max(0.0)),
                    None => available,
                }
            }
        };
        let percent_reference = match spec.explicit_height {
            Some(_) => capacity,
            None => inherited_reference,
        };
        self.stack.push(
            OpenBlock::new(spec, capacity, fragment_index, is_continuation)
                .with_percent_reference(percent_reference),
        );
        Ok(())
    }

    /// Close the block opened at `depth` and place it in its parent.
    pub(super) fn close_block(&mut self, depth: usize) -> Result<(), FolioError> {
        if self.stack.len() != depth + 1 {
            return Err(FolioError::Layout(format!(
                "open block stack out of step: expected depth {}, found {}",
                depth + 1,
                self.stack.len()
            )));
        }
        let open = self
            .stack
            .pop()
            .ok_or_else(|| FolioError::Layout("no open block to close".to_string()))?;
        let block = open.into_block();
        self.top_mut()?.push(LayoutItem::Block(block));
        Ok(())
    }

    /// Close every block above `level` as a fragment. Returns what is
    /// needed to reopen them, outermost first. Fragments with no content
    /// are discarded and reopen as if never started.
    fn split_above(&mut self, level: usize) -> Result<Vec<BlockSeed>, FolioError> {
        let mut seeds = Vec::new();
        while self.stack.len() > level + 1 {
            let open = self
                .stack
                .pop()
                .ok_or_else(|| FolioError::Layout("open block stack underflow".to_string()))?;
            if open.is_empty() {
                seeds.push(BlockSeed {
                    fragment_index: open.fragment_index,
                    is_continuation: open.is_continuation,
                    spec: open.spec,
                });
            } else {
                seeds.push(BlockSeed {
                    spec: open.spec.clone(),
                    fragment_index: open.fragment_index + 1,
                    is_continuation: true,
                });
                let block = open.into_block();
                self.top_mut()?.push(LayoutItem::Block(block));
            }
        }
        seeds.reverse();
        Ok(seeds)
    }

    fn reopen(&mut self, seeds: Vec<BlockSeed>) -> Result<(), FolioError> {
        for seed in seeds {
            self.open_block(seed.spec, seed.fragment_index, seed.is_continuation)?;
        }
        Ok(())
    }

    fn advance_column(&mut self, level: usize) -> Result<(), FolioError> {
        let seeds = self.split_above(level)?;
        let open = self
            .stack
            .get_mut(level)
            .ok_or_else(|| FolioError::Layout(format!("no open block at level {}", level)))?;
        open.column += 1;
        open.cursor_y = 0.0;
        log::trace!("Advanced to column {} at level {}", open.column, level);
        self.reopen(seeds)
    }

    /// The innermost open block with a column left to move into.
    fn spare_column_level(&self) -> Option<usize> {
        self.stack.iter().rposition(|b| b.has_spare_column())
    }

    /// Nothing placed yet in the current column, at any level.
    pub(super) fn chain_is_fresh(&self) -> bool {
        self.stack.iter().all(|b| b.cursor_y <= FIT_EPSILON)
    }

    // ── Placement ───────────────────────────────────────────────────

    /// Make room for `height` in the top block, moving to another column
    /// or page if needed. Returns false when the item must be dropped.
    pub(super) fn reserve(&mut self, height: f64) -> Result<bool, FolioError> {
        loop {
            let top = self.top()?;
            if top.truncated {
                return Ok(false);
            }
            let spare = self.spare_column_level();
            let break_ctx = BreakContext {
                remaining: top.remaining(),
                fresh: self.chain_is_fresh(),
                has_spare_column: spare.is_some(),
                can_paginate: self.mode == FlowMode::Paged,
                action: top.spec.style.overflow_action,
            };
            match decide_break(height, &break_ctx) {
                BreakDecision::Place => return Ok(true),
                BreakDecision::Clip => {
                    log::trace!("Clipping {:.1}pt past the bottom of the column", height);
                    return Ok(true);
                }
                BreakDecision::NextColumn => {
                    let level = spare.ok_or_else(|| {
                        FolioError::Layout("column advance with no spare column".to_string())
                    })?;
                    self.advance_column(level)?;
                }
                BreakDecision::NewPage => self.new_page()?,
                BreakDecision::Drop => {
                    let top = self.top_mut()?;
                    top.truncated = true;
                    log::debug!(
                        "Dropping content that does not fit in {}",
                        top.spec
                            .owner
                            .as_ref()
                            .map(|o| o.kind)
                            .unwrap_or("page")
                    );
                    return Ok(false);
                }
            }
        }
    }

    /// Place a finished line or atomic block.
    pub(super) fn place(&mut self, item: LayoutItem) -> Result<(), FolioError> {
        if self.reserve(item.height())? {
            self.top_mut()?.push(item);
        }
        Ok(())
    }

    pub(super) fn column_break(&mut self) -> Result<(), FolioError> {
        match self.spare_column_level() {
            Some(level) => self.advance_column(level),
            None => self.page_break(),
        }
    }

    pub(super) fn page_break(&mut self) -> Result<(), FolioError> {
        match self.mode {
            FlowMode::Paged => self.new_page(),
            FlowMode::Detached => {
                log::debug!("Break ignored outside the page flow");
                Ok(())
            }
        }
    }
}

/// Lay out a node on its own, with unbounded height and a fixed width.
/// Used for headers, footers, inline-blocks and absolutely positioned blocks.
pub(super) fn layout_detached<'a>(
    ctx: &'a LayoutContext<'a>,
    node: &'a Node,
    width: f64,
    parent_style: &ResolvedStyle,
) -> Result<LayoutBlock, FolioError> {
    let mut flow = Flow::detached(ctx, width, parent_style);
    let style = node.style.resolve(Some(parent_style));
    match node.kind {
        NodeKind::Div | NodeKind::Section { .. } => flow.layout_block_node(node, &style)?,
        NodeKind::Image { .. } => flow.layout_image_block(node, &style)?,
        _ => flow.layout_nodes(&[node], parent_style)?,
    }
    flow.finish_detached()
}

#[cfg(test)]
mod tests {
    use crate::font::FontContext;
    use crate::layout::{LayoutDocument, LayoutEngine, LayoutItem};
    use crate::model::{Document, Node, PageConfig};
    use crate::style::{OverflowAction, Style};
    use crate::units::Dimension;

    fn run(children: Vec<Node>) -> LayoutDocument {
        LayoutEngine::new()
            .layout(&Document::new(children), &FontContext::new())
            .unwrap()
    }

    fn page(width: f64, height: f64, style: Style, children: Vec<Node>) -> Node {
        Node::section(Some(PageConfig::custom(width, height)), style, children)
    }

    fn div_h(height: f64) -> Node {
        Node::div(
            Style {
                height: Some(Dimension::Pt(height)),
                ..Default::default()
            },
            vec![],
        )
    }

    #[test]
    fn oversized_block_moves_to_new_page() {
        let doc = run(vec![page(
            200.0,
            300.0,
            Style::default(),
            vec![div_h(200.0), div_h(150.0)],
        )]);
        assert_eq!(doc.pages.len(), 2);
        for page in &doc.pages {
            let block = page.content.blocks().next().unwrap();
            assert_eq!(block.total_bounds.y, 0.0);
        }
        assert!(doc.pages[1].is_continuation);
    }

    #[test]
    fn columns_fill_before_new_page() {
        let style = Style {
            column_count: Some(2),
            ..Default::default()
        };
        let doc = run(vec![page(
            210.0,
            100.0,
            style,
            vec![div_h(60.0), div_h(60.0), div_h(60.0)],
        )]);
        assert_eq!(doc.pages.len(), 2);
        let columns = &doc.pages[0].content.columns;
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].contents.len(), 1);
        assert_eq!(columns[1].contents.len(), 1);
        assert_eq!(columns[1].total_bounds.x, 110.0);
        assert_eq!(columns[0].total_bounds.width, 100.0);
    }

    #[test]
    fn clip_keeps_a_single_page() {
        let style = Style {
            overflow_action: Some(OverflowAction::Clip),
            ..Default::default()
        };
        let doc = run(vec![page(
            200.0,
            100.0,
            style,
            vec![div_h(60.0), div_h(60.0)],
        )]);
        assert_eq!(doc.pages.len(), 1);
        let blocks: Vec<_> = doc.pages[0].content.blocks().collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].total_bounds.y, 60.0);
    }

    #[test]
    fn none_drops_what_does_not_fit() {
        let style = Style {
            overflow_action: Some(OverflowAction::None),
            ..Default::default()
        };
        let doc = run(vec![page(
            200.0,
            100.0,
            style,
            vec![div_h(60.0), div_h(60.0), div_h(10.0)],
        )]);
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].content.blocks().count(), 1);
    }

    #[test]
    fn auto_block_splits_across_pages() {
        let doc = run(vec![page(
            200.0,
            100.0,
            Style::default(),
            vec![Node::div(
                Style::default(),
                vec![div_h(60.0), div_h(60.0)],
            )
            .with_id("outer")],
        )]);
        assert_eq!(doc.pages.len(), 2);
        let first = doc.pages[0].content.blocks().next().unwrap();
        let second = doc.pages[1].content.blocks().next().unwrap();
        assert_eq!(first.fragment_index, 0);
        assert!(!first.is_continuation);
        assert_eq!(second.fragment_index, 1);
        assert!(second.is_continuation);
        assert_eq!(first.height, 60.0);
    }

    #[test]
    fn page_break_starts_new_page() {
        let doc = run(vec![page(
            200.0,
            300.0,
            Style::default(),
            vec![div_h(10.0), Node::page_break(), div_h(10.0)],
        )]);
        assert_eq!(doc.pages.len(), 2);
    }

    #[test]
    fn column_break_moves_to_next_column() {
        let style = Style {
            column_count: Some(2),
            ..Default::default()
        };
        let doc = run(vec![page(
            210.0,
            300.0,
            style,
            vec![div_h(10.0), Node::column_break(), div_h(10.0)],
        )]);
        assert_eq!(doc.pages.len(), 1);
        let columns = &doc.pages[0].content.columns;
        assert!(matches!(columns[1].contents[0], LayoutItem::Block(_)));
    }

    #[test]
    fn headers_reduce_content_height() {
        let section = page(200.0, 300.0, Style::default(), vec![div_h(10.0)])
            .with_header(div_h(40.0))
            .with_footer(div_h(20.0));
        let doc = run(vec![section]);
        let page = &doc.pages[0];
        assert_eq!(page.content.total_bounds.y, 40.0);
        assert_eq!(page.content.height, 240.0);
        assert_eq!(page.footer.as_ref().unwrap().total_bounds.y, 280.0);
    }

    #[test]
    fn continuation_header_used_after_first_page() {
        let section = page(
            200.0,
            100.0,
            Style::default(),
            vec![div_h(50.0), div_h(50.0)],
        )
        .with_header(div_h(10.0))
        .with_continuation_header(div_h(20.0));
        let doc = run(vec![section]);
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].header.as_ref().unwrap().height, 10.0);
        assert_eq!(doc.pages[1].header.as_ref().unwrap().height, 20.0);
    }

    #[test]
    fn loose_nodes_get_an_implicit_section() {
        let doc = run(vec![Node::text("Hello")]);
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].section.is_none());
        assert_eq!(doc.pages[0].content.lines().count(), 1);
    }
}
