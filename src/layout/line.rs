//! # Line Building
//!
//! Breaks a paragraph's inline content into lines. The whole paragraph is
//! built before any line is placed, so the block engine only ever sees
//! finished lines with known heights.
//!
//! Every text literal becomes a `TextRunBegin` ... `TextRunEnd` bracket.
//! When a literal wraps, the line it leaves ends with a `TextRunNewLine`
//! and the next line opens with a zero-width `TextRunSpacer`, so a painter
//! walking the runs can always tell where the literal continues.

use super::page_break::FIT_EPSILON;
use super::{
    ComponentContent, ComponentRef, ComponentRun, InlineBorders, InlineMarker, LayoutLine,
    RelativeOffsets, Run, TextRenderOptions, TextRunBegin, TextRunCharacter, TextRunNewLine,
    TextRunSpacer,
};
use crate::font::FontContext;
use crate::style::{ResolvedStyle, TextAlign};
use crate::text;
use crate::units::Size;

/// What the line builder hands back to the block engine.
#[derive(Debug, Clone)]
pub enum LineOutput {
    Line(LayoutLine),
    ColumnBreak,
    PageBreak,
}

/// One text literal ready to be broken into lines.
pub struct TextInput<'t> {
    pub owner: ComponentRef,
    pub style: &'t ResolvedStyle,
    pub options: TextRenderOptions,
    pub text: &'t str,
    /// Padding of the enclosing inline element, applied before the first
    /// and after the last character of this literal.
    pub pad_left: f64,
    pub pad_right: f64,
}

/// Paint options for a text literal. `inline` is the enclosing span or
/// link, which supplies the background, border and padding.
pub fn text_options(style: &ResolvedStyle, inline: Option<&ResolvedStyle>) -> TextRenderOptions {
    TextRenderOptions {
        font_family: style.font_family.clone(),
        font_size: style.font_size,
        font_weight: style.font_weight,
        italic: style.is_italic(),
        leading: style.effective_leading(),
        color: style.color,
        background: inline.and_then(|s| s.create_background_brush()),
        padding: inline.map(|s| s.padding).unwrap_or_default(),
        border: inline.map(InlineBorders::of).unwrap_or_default(),
        border_radius: inline.map(|s| s.border_radius).unwrap_or(0.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LineEnd {
    /// Content ran out of room.
    Wrap,
    /// An explicit line, column or page break.
    Break,
    /// End of the paragraph.
    Last,
}

#[derive(Default)]
struct PendingLine {
    runs: Vec<Run>,
    x: f64,
    /// Width of the whitespace ending the line, left out when aligning.
    trailing: f64,
    height: f64,
    baseline: f64,
    has_content: bool,
}

/// Characters of the current literal not yet committed as a run.
struct CharBuffer {
    text: String,
    start_x: f64,
    width: f64,
}

pub struct LineBuilder<'f> {
    fonts: &'f FontContext,
    available: f64,
    align: TextAlign,
    line: PendingLine,
    out: Vec<LineOutput>,
}

impl<'f> LineBuilder<'f> {
    pub fn new(fonts: &'f FontContext, available: f64, align: TextAlign) -> Self {
        Self {
            fonts,
            available: available.max(0.0),
            align,
            line: PendingLine::default(),
            out: Vec::new(),
        }
    }

    pub fn begin_inline(&mut self, owner: ComponentRef, offsets: Option<RelativeOffsets>) {
        let offset_x = self.line.x;
        self.line.runs.push(Run::InlineBegin(InlineMarker {
            owner,
            offset_x,
            offsets,
        }));
    }

    pub fn end_inline(&mut self, owner: ComponentRef) {
        let offset_x = self.line.x;
        self.line.runs.push(Run::InlineEnd(InlineMarker {
            owner,
            offset_x,
            offsets: None,
        }));
    }

    pub fn push_text(&mut self, input: TextInput<'_>) {
        let TextInput {
            owner,
            style,
            options,
            text,
            pad_left,
            pad_right,
        } = input;
        let collapsed = text::collapse_whitespace(text);
        let leading = style.effective_leading();
        let baseline = self.text_baseline(style);

        self.line.runs.push(Run::TextRunBegin(TextRunBegin {
            owner: owner.clone(),
            offset_x: self.line.x,
            options,
            calculated_bounds: Vec::new(),
        }));
        let mut run_start = self.line.x;
        if pad_left > 0.0 {
            self.push_spacer(pad_left);
        }

        let mut chars = CharBuffer {
            text: String::new(),
            start_x: self.line.x,
            width: 0.0,
        };

        for segment in text::segments(&collapsed) {
            let mut rest = segment;
            while !rest.is_empty() {
                if !self.line.has_content && chars.text.is_empty() {
                    rest = rest.trim_start();
                    if rest.is_empty() {
                        break;
                    }
                    chars.start_x = self.line.x;
                }

                let (word, space) = text::split_trailing_whitespace(rest);
                let word_width = text::measure(self.fonts, word, style);
                if self.line.x + word_width <= self.available + FIT_EPSILON {
                    let space_width = text::measure(self.fonts, space, style);
                    chars.text.push_str(rest);
                    chars.width += word_width + space_width;
                    self.line.x += word_width + space_width;
                    self.line.trailing = space_width;
                    break;
                }

                if self.line.has_content || !chars.text.is_empty() {
                    self.flush_chars(&mut chars, leading, baseline);
                    self.line.runs.push(Run::TextRunNewLine(TextRunNewLine {
                        offset: Size::new(-run_start, 0.0),
                    }));
                    self.end_line(LineEnd::Wrap);
                    self.line.runs.push(Run::TextRunSpacer(TextRunSpacer {
                        offset_x: 0.0,
                        width: 0.0,
                        height: 0.0,
                    }));
                    run_start = 0.0;
                    chars.start_x = 0.0;
                    continue;
                }

                // Alone on the line and still too wide: break inside the word.
                let cut = text::fit_prefix(self.fonts, word, style, self.available - self.line.x);
                let (head, tail) = rest.split_at(cut);
                let width = text::measure(self.fonts, head, style);
                chars.text.push_str(head);
                chars.width += width;
                self.line.x += width;
                self.line.trailing = 0.0;
                rest = tail;
            }
        }

        self.flush_chars(&mut chars, leading, baseline);
        if pad_right > 0.0 {
            self.push_spacer(pad_right);
        }
        let offset_x = self.line.x;
        self.line.runs.push(Run::TextRunEnd(InlineMarker {
            owner,
            offset_x,
            offsets: None,
        }));
    }

    /// End the current line. A break on an empty line still produces a
    /// line, as tall as the break's own leading.
    pub fn push_line_break(&mut self, style: &ResolvedStyle) {
        if !self.line.has_content {
            let leading = style.effective_leading();
            let offset_x = self.line.x;
            self.line.runs.push(Run::TextRunSpacer(TextRunSpacer {
                offset_x,
                width: 0.0,
                height: leading,
            }));
            self.line.height = self.line.height.max(leading);
            self.line.baseline = self.line.baseline.max(self.text_baseline(style));
            self.line.has_content = true;
        }
        self.end_line(LineEnd::Break);
    }

    /// An atomic inline box: an image or an inline-block.
    pub fn push_component(
        &mut self,
        owner: ComponentRef,
        width: f64,
        height: f64,
        offsets: Option<RelativeOffsets>,
        content: ComponentContent,
    ) {
        if self.line.has_content && self.line.x + width > self.available + FIT_EPSILON {
            self.end_line(LineEnd::Wrap);
        }
        self.line.runs.push(Run::Component(ComponentRun {
            owner,
            offset_x: self.line.x,
            width,
            height,
            offsets,
            content,
        }));
        self.line.x += width;
        self.line.trailing = 0.0;
        self.line.height = self.line.height.max(height);
        self.line.baseline = self.line.baseline.max(height);
        self.line.has_content = true;
    }

    pub fn column_break(&mut self) {
        self.close_line();
        self.out.push(LineOutput::ColumnBreak);
    }

    pub fn page_break(&mut self) {
        self.close_line();
        self.out.push(LineOutput::PageBreak);
    }

    /// Finish the paragraph. Markers left on an empty trailing line are
    /// attached to the line before.
    pub fn finish(mut self) -> Vec<LineOutput> {
        if self.line.has_content {
            self.end_line(LineEnd::Last);
        } else if !self.line.runs.is_empty() {
            let mut runs = std::mem::take(&mut self.line.runs);
            match self.out.last_mut() {
                Some(LineOutput::Line(prev)) => {
                    for run in &mut runs {
                        let dx = prev.width - run.offset_x();
                        run.shift(dx);
                    }
                    prev.runs.extend(runs);
                }
                _ => {
                    self.line.runs = runs;
                    self.end_line(LineEnd::Last);
                }
            }
        }
        self.link_new_lines();
        self.out
    }

    fn close_line(&mut self) {
        if self.line.has_content {
            self.end_line(LineEnd::Break);
        }
    }

    fn push_spacer(&mut self, width: f64) {
        self.line.runs.push(Run::TextRunSpacer(TextRunSpacer {
            offset_x: self.line.x,
            width,
            height: 0.0,
        }));
        self.line.x += width;
        self.line.trailing = 0.0;
    }

    fn flush_chars(&mut self, chars: &mut CharBuffer, leading: f64, baseline: f64) {
        if chars.text.is_empty() {
            return;
        }
        self.line.runs.push(Run::TextRunCharacter(TextRunCharacter {
            characters: std::mem::take(&mut chars.text),
            offset_x: chars.start_x,
            width: chars.width,
            word_spacing: 0.0,
        }));
        chars.width = 0.0;
        chars.start_x = self.line.x;
        self.line.height = self.line.height.max(leading);
        self.line.baseline = self.line.baseline.max(baseline);
        self.line.has_content = true;
    }

    /// Baseline distance from the line top, half-leading above the ascent.
    fn text_baseline(&self, style: &ResolvedStyle) -> f64 {
        let (ascent, descent) = text::face(self.fonts, style).extents(style.font_size);
        (style.effective_leading() - (ascent + descent)) / 2.0 + ascent
    }

    fn end_line(&mut self, end: LineEnd) {
        let PendingLine {
            mut runs,
            x,
            trailing,
            height,
            baseline,
            ..
        } = std::mem::take(&mut self.line);

        let mut width = x;
        let visible = x - trailing;
        let mut offset_x = 0.0;
        match self.align {
            TextAlign::Left => {}
            TextAlign::Right => offset_x = (self.available - visible).max(0.0),
            TextAlign::Center => offset_x = ((self.available - visible) / 2.0).max(0.0),
            TextAlign::Justify => {
                if end == LineEnd::Wrap {
                    width = justify(&mut runs, width, self.available);
                }
            }
        }

        if let Some(Run::TextRunNewLine(new_line)) = runs.last_mut() {
            new_line.offset.height = height;
        }

        self.out.push(LineOutput::Line(LayoutLine {
            offset_x,
            offset_y: 0.0,
            width,
            available_width: self.available,
            height,
            baseline,
            runs,
        }));
    }

    /// Alignment shifts are only known once a line is finished, so the
    /// horizontal part of each new-line offset is completed here.
    fn link_new_lines(&mut self) {
        for i in 0..self.out.len() {
            let next_offset = match self.out.get(i + 1) {
                Some(LineOutput::Line(next)) => next.offset_x,
                _ => continue,
            };
            if let Some(LineOutput::Line(line)) = self.out.get_mut(i) {
                let own_offset = line.offset_x;
                if let Some(Run::TextRunNewLine(new_line)) = line.runs.last_mut() {
                    new_line.offset.width += next_offset - own_offset;
                }
            }
        }
    }
}

/// Spread the free space of a wrapped line across its word gaps. Returns
/// the new line width.
fn justify(runs: &mut [Run], width: f64, available: f64) -> f64 {
    let extra = available - width;
    if extra <= 0.0 {
        return width;
    }
    let last_chars = runs
        .iter()
        .rposition(|r| matches!(r, Run::TextRunCharacter(_)));
    let gaps_in = |i: usize, text: &str| {
        let text = if Some(i) == last_chars {
            text.trim_end()
        } else {
            text
        };
        text.matches(' ').count()
    };

    let gaps: usize = runs
        .iter()
        .enumerate()
        .map(|(i, run)| match run {
            Run::TextRunCharacter(c) => gaps_in(i, &c.characters),
            _ => 0,
        })
        .sum();
    if gaps == 0 {
        return width;
    }

    let per_gap = extra / gaps as f64;
    let mut shift = 0.0;
    for (i, run) in runs.iter_mut().enumerate() {
        run.shift(shift);
        if let Run::TextRunCharacter(c) = run {
            let added = per_gap * gaps_in(i, &c.characters) as f64;
            c.word_spacing = per_gap;
            c.width += added;
            shift += added;
        }
    }
    width + shift
}
