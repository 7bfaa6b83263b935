//! # Arrangements
//!
//! Walks the finished pages and records, for every component that produced
//! a box, where it ended up in page coordinates. Blocks get one arrangement
//! per fragment; spans and links get one per line segment they cover.
//!
//! Relative and inline positioning happen here, after layout: the static
//! bounds are where normal flow put the box, the render bounds add the
//! `top`/`left`/`bottom`/`right` offsets. Descendants move with their
//! parent's render bounds.

use super::{
    ComponentContent, ComponentRef, LayoutBlock, LayoutItem, LayoutLine, LayoutPage, NodeId, Run,
};
use crate::style::{BackgroundImage, Position, ResolvedStyle};
use crate::units::{Dimension, Point, Rect, Size};
use serde::Serialize;
use std::collections::BTreeMap;

/// One placement of a component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrangement {
    pub page_index: usize,
    /// Ordinal of this placement among the component's arrangements.
    pub fragment_index: usize,
    /// Border box where normal flow placed it.
    pub static_bounds: Rect,
    /// Border box after relative offsets.
    pub render_bounds: Rect,
}

/// A block with a background image, for pattern building.
#[derive(Debug, Clone)]
pub struct BackgroundUse {
    pub owner: Option<ComponentRef>,
    pub page_index: usize,
    pub page_height: f64,
    /// Border box in page coordinates.
    pub bounds: Rect,
    pub image: BackgroundImage,
}

#[derive(Debug, Default)]
pub struct Arranged {
    pub arrangements: BTreeMap<NodeId, Vec<Arrangement>>,
    pub backgrounds: Vec<BackgroundUse>,
}

pub fn arrange_pages(pages: &[LayoutPage]) -> Arranged {
    let mut arranger = Arranger {
        page_index: 0,
        page_height: 0.0,
        out: Arranged::default(),
    };
    for page in pages {
        arranger.page_index = page.index;
        arranger.page_height = page.height;
        let page_rect = Rect::new(0.0, 0.0, page.width, page.height);
        for block in [page.header.as_ref(), Some(&page.content), page.footer.as_ref()]
            .into_iter()
            .flatten()
        {
            arranger.block(block, Point::new(0.0, 0.0), page_rect);
        }
    }
    arranger.out
}

/// The `top`/`left`/`bottom`/`right` of a relatively or inline positioned
/// box, kept unresolved until the containing column is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelativeOffsets {
    pub left: Option<Dimension>,
    pub right: Option<Dimension>,
    pub top: Option<Dimension>,
    pub bottom: Option<Dimension>,
    /// For `em` offsets.
    pub font_size: f64,
}

impl RelativeOffsets {
    /// None unless the style is relative or inline and sets an offset.
    pub fn of(style: &ResolvedStyle) -> Option<Self> {
        if !matches!(style.position, Position::Relative | Position::Inline) {
            return None;
        }
        let offsets = Self {
            left: style.left,
            right: style.right,
            top: style.top,
            bottom: style.bottom,
            font_size: style.font_size,
        };
        [offsets.left, offsets.right, offsets.top, offsets.bottom]
            .iter()
            .any(Option::is_some)
            .then_some(offsets)
    }

    /// `(left - right, top - bottom)`, percentages against `containing`.
    pub fn resolve(&self, containing: Size) -> (f64, f64) {
        let len = |value: Option<Dimension>, reference: f64| {
            value
                .and_then(|d| d.resolve(reference, self.font_size))
                .unwrap_or(0.0)
        };
        (
            len(self.left, containing.width) - len(self.right, containing.width),
            len(self.top, containing.height) - len(self.bottom, containing.height),
        )
    }
}

fn offset(offsets: Option<&RelativeOffsets>, containing: Rect) -> (f64, f64) {
    offsets
        .map(|o| o.resolve(containing.size()))
        .unwrap_or((0.0, 0.0))
}

/// A span or link still open on the line being walked.
struct OpenInline {
    owner: ComponentRef,
    start: f64,
    offsets: Option<RelativeOffsets>,
}

struct Arranger {
    page_index: usize,
    page_height: f64,
    out: Arranged,
}

impl Arranger {
    fn push(&mut self, owner: &ComponentRef, static_bounds: Rect, render_bounds: Rect) {
        let list = self.out.arrangements.entry(owner.id).or_default();
        let fragment_index = list.len();
        list.push(Arrangement {
            page_index: self.page_index,
            fragment_index,
            static_bounds,
            render_bounds,
        });
    }

    /// An inline segment or component, moved by its relative offsets.
    fn push_offset(
        &mut self,
        owner: &ComponentRef,
        static_bounds: Rect,
        offsets: Option<&RelativeOffsets>,
        containing: Rect,
    ) {
        let (dx, dy) = offset(offsets, containing);
        self.push(owner, static_bounds, static_bounds.translate(dx, dy));
    }

    /// `origin` is the point `block.total_bounds` is relative to.
    fn block(&mut self, block: &LayoutBlock, origin: Point, containing: Rect) {
        let static_bounds = block
            .total_bounds
            .translate(origin.x, origin.y)
            .inset(&block.margins);
        let (dx, dy) = offset(RelativeOffsets::of(&block.full_style).as_ref(), containing);
        let render_bounds = static_bounds.translate(dx, dy);

        if let Some(owner) = &block.owner {
            self.push(owner, static_bounds, render_bounds);
        }
        if let Some(image) = &block.full_style.background_image {
            self.out.backgrounds.push(BackgroundUse {
                owner: block.owner.clone(),
                page_index: self.page_index,
                page_height: self.page_height,
                bounds: render_bounds,
                image: image.clone(),
            });
        }

        let content = render_bounds.inset(&block.border).inset(&block.padding);
        let mut open: Vec<OpenInline> = Vec::new();
        for column in &block.columns {
            let column_rect = column.total_bounds.translate(content.x, content.y);
            let column_origin = Point::new(column_rect.x, column_rect.y);
            for item in &column.contents {
                match item {
                    LayoutItem::Block(child) => self.block(child, column_origin, column_rect),
                    LayoutItem::Line(line) => self.line(line, column_origin, column_rect, &mut open),
                }
            }
        }

        for region in &block.positioned_regions {
            let region_origin = Point::new(
                content.x + region.total_bounds.x,
                content.y + region.total_bounds.y,
            );
            for item in &region.contents {
                if let LayoutItem::Block(child) = item {
                    self.block(child, region_origin, content);
                }
            }
        }
    }

    /// `open` carries spans and links still open from the previous line.
    fn line(
        &mut self,
        line: &LayoutLine,
        origin: Point,
        containing: Rect,
        open: &mut Vec<OpenInline>,
    ) {
        let x = origin.x + line.offset_x;
        let y = origin.y + line.offset_y;
        for inline in open.iter_mut() {
            inline.start = 0.0;
        }

        for run in &line.runs {
            match run {
                Run::InlineBegin(marker) => open.push(OpenInline {
                    owner: marker.owner.clone(),
                    start: marker.offset_x,
                    offsets: marker.offsets,
                }),
                Run::InlineEnd(marker) => {
                    if let Some(pos) = open.iter().rposition(|o| o.owner.id == marker.owner.id) {
                        let inline = open.remove(pos);
                        let rect = Rect::new(
                            x + inline.start,
                            y,
                            marker.offset_x - inline.start,
                            line.height,
                        );
                        self.push_offset(&inline.owner, rect, inline.offsets.as_ref(), containing);
                    }
                }
                Run::Component(component) => {
                    let top = y + (line.baseline - component.height).max(0.0);
                    let left = x + component.offset_x;
                    match &component.content {
                        ComponentContent::Image(_) => {
                            let rect = Rect::new(left, top, component.width, component.height);
                            self.push_offset(
                                &component.owner,
                                rect,
                                component.offsets.as_ref(),
                                containing,
                            );
                        }
                        ComponentContent::Block(block) => {
                            self.block(block, Point::new(left, top), containing);
                        }
                    }
                }
                _ => {}
            }
        }

        for inline in open.iter() {
            let width = (line.width - inline.start).max(0.0);
            let rect = Rect::new(x + inline.start, y, width, line.height);
            self.push_offset(&inline.owner, rect, inline.offsets.as_ref(), containing);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::font::FontContext;
    use crate::layout::{LayoutDocument, LayoutEngine};
    use crate::model::{Document, Node, PageConfig};
    use crate::resources::tests::png_data_uri;
    use crate::style::{Position, Style};
    use crate::units::{Dimension, Edges, Rect};

    fn run(page_margin: f64, children: Vec<Node>) -> LayoutDocument {
        let mut config = PageConfig::custom(200.0, 300.0);
        config.margin = Edges::uniform(page_margin);
        let section = Node::section(Some(config), Style::default(), children);
        LayoutEngine::new()
            .layout(&Document::new(vec![section]), &FontContext::new())
            .unwrap()
    }

    fn sized(height: f64) -> Style {
        Style {
            height: Some(Dimension::Pt(height)),
            ..Default::default()
        }
    }

    #[test]
    fn blocks_are_arranged_in_page_coordinates() {
        let doc = run(
            10.0,
            vec![
                Node::div(sized(20.0), vec![]).with_id("a"),
                Node::div(sized(30.0), vec![]).with_id("b"),
            ],
        );
        let b = doc.first_arrangement("b").unwrap();
        assert_eq!(b.page_index, 0);
        assert_eq!(b.static_bounds, Rect::new(10.0, 30.0, 180.0, 30.0));
        assert_eq!(b.render_bounds, b.static_bounds);
    }

    #[test]
    fn relative_offsets_move_render_bounds_only() {
        let style = Style {
            position: Some(Position::Relative),
            left: Some(Dimension::Pt(5.0)),
            top: Some(Dimension::Percent(10.0)),
            ..sized(20.0)
        };
        let doc = run(
            0.0,
            vec![
                Node::div(style, vec![]).with_id("r"),
                Node::div(sized(20.0), vec![]).with_id("next"),
            ],
        );
        let r = doc.first_arrangement("r").unwrap();
        assert_eq!(r.static_bounds, Rect::new(0.0, 0.0, 200.0, 20.0));
        assert_eq!(r.render_bounds, Rect::new(5.0, 30.0, 200.0, 20.0));
        let next = doc.first_arrangement("next").unwrap();
        assert_eq!(next.static_bounds.y, 20.0);
    }

    #[test]
    fn children_follow_relative_parent() {
        let style = Style {
            position: Some(Position::Relative),
            top: Some(Dimension::Pt(10.0)),
            ..Default::default()
        };
        let child = Node::div(sized(20.0), vec![]).with_id("child");
        let doc = run(0.0, vec![Node::div(style, vec![child])]);
        let child = doc.first_arrangement("child").unwrap();
        assert_eq!(child.render_bounds.y, 10.0);
    }

    #[test]
    fn spans_get_one_arrangement_per_line() {
        let div = Node::div(
            Style {
                width: Some(Dimension::Pt(60.0)),
                ..Default::default()
            },
            vec![Node::span(Style::default(), vec![Node::text("aaa bbb ccc")]).with_id("s")],
        );
        let doc = run(0.0, vec![div]);
        let id = doc.component("s").unwrap();
        let arrangements = doc.arrangements_for(id);
        assert_eq!(arrangements.len(), 2);
        assert!((arrangements[0].render_bounds.width - 46.704).abs() < 1e-9);
        assert!((arrangements[1].render_bounds.y - 14.4).abs() < 1e-9);
        assert_eq!(arrangements[1].fragment_index, 1);
    }

    fn nudged(top: Dimension, left: Dimension) -> Style {
        Style {
            position: Some(Position::Relative),
            top: Some(top),
            left: Some(left),
            ..Default::default()
        }
    }

    #[test]
    fn relative_span_moves_its_segments() {
        let span = Node::span(
            nudged(Dimension::Pt(5.0), Dimension::Percent(10.0)),
            vec![Node::text("aaa")],
        )
        .with_id("s");
        let doc = run(0.0, vec![Node::div(Style::default(), vec![span])]);
        let s = doc.first_arrangement("s").unwrap();
        assert_eq!((s.static_bounds.x, s.static_bounds.y), (0.0, 0.0));
        assert!((s.static_bounds.height - 14.4).abs() < 1e-9);
        assert_eq!(s.render_bounds, s.static_bounds.translate(20.0, 5.0));
    }

    #[test]
    fn wrapped_relative_span_moves_every_line() {
        let div = Node::div(
            Style {
                width: Some(Dimension::Pt(60.0)),
                ..Default::default()
            },
            vec![Node::span(
                nudged(Dimension::Pt(-2.0), Dimension::Pt(3.0)),
                vec![Node::text("aaa bbb ccc")],
            )
            .with_id("s")],
        );
        let doc = run(0.0, vec![div]);
        let id = doc.component("s").unwrap();
        let arrangements = doc.arrangements_for(id);
        assert_eq!(arrangements.len(), 2);
        for a in arrangements {
            assert_eq!(a.render_bounds, a.static_bounds.translate(3.0, -2.0));
        }
    }

    #[test]
    fn relative_inline_image_is_nudged() {
        let uri = png_data_uri(30, 20);
        let image = Node::image(&uri, nudged(Dimension::Pt(5.0), Dimension::Pt(7.0))).with_id("img");
        let doc = run(0.0, vec![image]);
        let img = doc.first_arrangement("img").unwrap();
        assert_eq!(img.static_bounds, Rect::new(0.0, 0.0, 30.0, 20.0));
        assert_eq!(img.render_bounds, Rect::new(7.0, 5.0, 30.0, 20.0));
    }

    #[test]
    fn fragments_get_an_arrangement_per_page() {
        let outer = Node::div(
            Style::default(),
            vec![
                Node::div(sized(200.0), vec![]),
                Node::div(sized(200.0), vec![]),
            ],
        )
        .with_id("outer");
        let doc = run(0.0, vec![outer]);
        let id = doc.component("outer").unwrap();
        let pages: Vec<usize> = doc.arrangements_for(id).iter().map(|a| a.page_index).collect();
        assert_eq!(pages, vec![0, 1]);
    }
}
