//! # Text Run Bounds
//!
//! A text run can wrap over several lines, and a background or border
//! behind it has to be painted line by line. Once a page is finished, each
//! `TextRunBegin` gets one rectangle per physical line the run touches,
//! relative to the owning block's content origin. Lines where the run
//! placed no characters (it wrapped before its first word, say) get an
//! empty rectangle so the list still lines up with the lines.

use super::{
    ComponentContent, LayoutBlock, LayoutItem, LayoutLine, LayoutPage, NodeId, Run,
};
use crate::units::Rect;

/// Fill in `calculated_bounds` for every text run on the page.
pub fn calculate_page_bounds(page: &mut LayoutPage) {
    if let Some(header) = &mut page.header {
        calculate_block_bounds(header);
    }
    calculate_block_bounds(&mut page.content);
    if let Some(footer) = &mut page.footer {
        calculate_block_bounds(footer);
    }
}

pub fn calculate_block_bounds(block: &mut LayoutBlock) {
    for column in &mut block.columns {
        for item in &mut column.contents {
            match item {
                LayoutItem::Block(child) => calculate_block_bounds(child),
                LayoutItem::Line(line) => {
                    for run in &mut line.runs {
                        if let Run::Component(component) = run {
                            if let ComponentContent::Block(child) = &mut component.content {
                                calculate_block_bounds(child);
                            }
                        }
                    }
                }
            }
        }
    }
    for region in &mut block.positioned_regions {
        for item in &mut region.contents {
            if let LayoutItem::Block(child) = item {
                calculate_block_bounds(child);
            }
        }
    }

    let mut found: Vec<(usize, usize, Vec<Rect>)> = Vec::new();
    {
        let lines: Vec<(Rect, &LayoutLine)> = block
            .columns
            .iter()
            .flat_map(|column| {
                column.contents.iter().filter_map(move |item| match item {
                    LayoutItem::Line(line) => Some((column.total_bounds, line)),
                    LayoutItem::Block(_) => None,
                })
            })
            .collect();
        for (line_index, (_, line)) in lines.iter().enumerate() {
            for (run_index, run) in line.runs.iter().enumerate() {
                if let Run::TextRunBegin(begin) = run {
                    let rects = run_bounds(&lines, line_index, run_index, begin.owner.id);
                    found.push((line_index, run_index, rects));
                }
            }
        }
    }

    let mut found = found.into_iter().peekable();
    let lines = block.columns.iter_mut().flat_map(|column| {
        column.contents.iter_mut().filter_map(|item| match item {
            LayoutItem::Line(line) => Some(line),
            LayoutItem::Block(_) => None,
        })
    });
    for (line_index, line) in lines.enumerate() {
        while let Some((_, run_index, rects)) = found.next_if(|(l, _, _)| *l == line_index) {
            if let Some(Run::TextRunBegin(begin)) = line.runs.get_mut(run_index) {
                begin.calculated_bounds = rects;
            }
        }
    }
}

/// Walk from a run's begin marker to its end, one rectangle per line.
fn run_bounds(
    lines: &[(Rect, &LayoutLine)],
    line_index: usize,
    run_index: usize,
    owner: NodeId,
) -> Vec<Rect> {
    let mut rects = Vec::new();
    for (i, (column, line)) in lines.iter().enumerate().skip(line_index) {
        let runs = if i == line_index {
            line.runs.get(run_index..).unwrap_or(&[])
        } else {
            &line.runs[..]
        };

        let mut extent: Option<(f64, f64)> = None;
        let mut has_chars = false;
        let mut ended = false;
        for run in runs {
            let span = match run {
                Run::TextRunCharacter(c) => {
                    has_chars = true;
                    Some((c.offset_x, c.offset_x + c.width))
                }
                Run::TextRunSpacer(s) => Some((s.offset_x, s.offset_x + s.width)),
                Run::TextRunEnd(m) if m.owner.id == owner => {
                    ended = true;
                    break;
                }
                Run::TextRunNewLine(_) => break,
                _ => None,
            };
            if let Some((start, end)) = span {
                extent = Some(match extent {
                    Some((a, b)) => (a.min(start), b.max(end)),
                    None => (start, end),
                });
            }
        }

        rects.push(match extent {
            Some((start, end)) if has_chars => Rect::new(
                column.x + line.offset_x + start,
                column.y + line.offset_y,
                end - start,
                line.height,
            ),
            _ => Rect::empty(),
        });
        if ended {
            break;
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::layout::LayoutEngine;
    use crate::model::{Document, Node, PageConfig};
    use crate::style::{Color, Style};
    use crate::units::{Dimension, Edges};

    fn span_lines(span_style: Style, width: f64, text: &str) -> Vec<LayoutLine> {
        let div = Node::div(
            Style {
                width: Some(Dimension::Pt(width)),
                ..Default::default()
            },
            vec![Node::span(span_style, vec![Node::text(text)])],
        );
        let section = Node::section(Some(PageConfig::custom(200.0, 300.0)), Style::default(), vec![div]);
        let doc = LayoutEngine::new()
            .layout(&Document::new(vec![section]), &FontContext::new())
            .unwrap();
        let block = doc.pages[0].content.blocks().next().unwrap().clone();
        block.lines().cloned().collect()
    }

    fn begin_bounds(lines: &[LayoutLine]) -> Vec<Rect> {
        lines
            .iter()
            .flat_map(|l| l.runs.iter())
            .find_map(|r| match r {
                Run::TextRunBegin(b) => Some(b.calculated_bounds.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn one_rect_per_wrapped_line() {
        let style = Style {
            background_color: Some(Color::rgb(1.0, 1.0, 0.0)),
            ..Default::default()
        };
        let lines = span_lines(style, 60.0, "aaa bbb ccc");
        assert_eq!(lines.len(), 2);

        let rects = begin_bounds(&lines);
        assert_eq!(rects.len(), 2);
        assert!((rects[0].width - 46.704).abs() < 1e-9);
        assert_eq!(rects[0].y, 0.0);
        assert!((rects[0].height - 14.4).abs() < 1e-9);
        assert_eq!(rects[1].x, 0.0);
        assert!((rects[1].y - 14.4).abs() < 1e-9);
        assert!((rects[1].width - 20.016).abs() < 1e-9);
    }

    #[test]
    fn padding_widens_first_and_last_rect() {
        let style = Style {
            padding: Some(Edges::symmetric(0.0, 4.0)),
            ..Default::default()
        };
        let lines = span_lines(style, 200.0, "aaa");
        let rects = begin_bounds(&lines);
        assert_eq!(rects.len(), 1);
        assert!((rects[0].width - (20.016 + 8.0)).abs() < 1e-9);
    }

    #[test]
    fn whitespace_only_run_gets_empty_rect() {
        let lines = span_lines(Style::default(), 200.0, "   ");
        let rects = begin_bounds(&lines);
        assert_eq!(rects.len(), 1);
        assert!(rects[0].is_empty());
    }
}
