//! Source file rendering with optional syntax highlighting.
//!
//! Each file starts with its path as a heading over a thin rule, followed by
//! its lines wrapped to the page width. A heading is never left alone at the
//! bottom of a page: it moves to the next page unless at least one code row
//! fits under it.

use super::{rule, show_text, PageFlow};
use crate::error::Error;
use crate::estimate::{source_lines, wrap_line, Segment, HEADING_SPACE_BEFORE, MONOSPACE_ADVANCE};
use crate::selection::CandidateFile;
use crate::sinks::pdf::fonts::{bold_variant, encode_win_ansi};
use crate::sinks::pdf::highlight::{self, Highlighter, Span};
use pdf_writer::Str;

pub fn render(
    flow: &mut PageFlow<'_>,
    file: &CandidateFile,
    highlighter: Option<&Highlighter>,
) -> Result<(), Error> {
    let config = flow.config();
    let metrics = flow.metrics();

    flow.ensure_room(metrics.header_lines + 1);
    render_heading(flow, &file.path.display().to_string());
    flow.advance(metrics.header_lines);

    let lines: Vec<String> = source_lines(&file.contents).collect();
    let spans = match highlighter {
        Some(h) => h.highlight(&file.path, &lines)?,
        None => highlight::plain(&lines),
    };

    let char_width = config.fonts.code.size * MONOSPACE_ADVANCE;
    for (line, spans) in lines.iter().zip(spans.iter()) {
        let chars: Vec<char> = line.chars().collect();
        for segment in wrap_line(line, metrics.max_chars_per_line) {
            flow.ensure_room(1);
            let x = flow.left() + segment.indent as f32 * char_width;
            let y = flow.slot_top() - config.fonts.code.size;
            render_row(flow, &chars, spans, segment, (x, y));
            flow.advance(1);
        }
    }

    Ok(())
}

fn render_heading(flow: &mut PageFlow<'_>, path: &str) {
    let config = flow.config();
    let font = &config.fonts.file_path;
    let y = flow.slot_top() - HEADING_SPACE_BEFORE - font.size;
    let (x1, x2) = (flow.left(), flow.right());
    let name = flow.fonts().name(&font.family);

    let content = flow.content();
    show_text(content, name, font.size, 0.25, (x1, y), path);
    rule(content, x1, x2, y - 3.0);
}

/// Writes the part of a highlighted line that falls within `segment`.
fn render_row(
    flow: &mut PageFlow<'_>,
    chars: &[char],
    spans: &[Span],
    segment: Segment,
    (x, y): (f32, f32),
) {
    let pieces: Vec<(&Span, String)> = spans
        .iter()
        .filter_map(|span| {
            let start = span.start.max(segment.start);
            let end = span.end.min(segment.end).min(chars.len());
            (start < end).then(|| (span, chars[start..end].iter().collect()))
        })
        .collect();
    if pieces.iter().all(|(_, text)| text.trim().is_empty()) {
        return;
    }

    let config = flow.config();
    let code = &config.fonts.code;
    let regular = flow.fonts().name(&code.family);
    let bold = flow.fonts().name(bold_variant(&code.family));

    let content = flow.content();
    content.begin_text().next_line(x, y);
    for (span, text) in pieces {
        let (r, g, b) = span.colour;
        let encoded = encode_win_ansi(&text);
        content
            .set_font(if span.bold { bold } else { regular }, code.size)
            .set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
            .show(Str(&encoded));
    }
    content.end_text();
}
