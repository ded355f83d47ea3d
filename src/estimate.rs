//! Page count estimation for rendered listings.
//!
//! The renderer flows every file onto a grid of fixed-height code lines, so a
//! file's footprint is its wrapped line count plus the slots its path heading
//! takes up. Estimating pages is then a division by the number of lines that
//! fit on a page. The same wrapping routine feeds both this estimate and the
//! renderer, which keeps the two in agreement for anything but page-break
//! placement of headings.
//!
//! All code fonts are base-14 monospaced faces whose glyphs advance 600/1000
//! of an em, so characters per line follow directly from the font size.

use crate::config::Configuration;

/// Advance width of a glyph in the monospaced base-14 fonts, in ems.
pub const MONOSPACE_ADVANCE: f32 = 0.6;

/// Space above a file path heading, in points.
pub const HEADING_SPACE_BEFORE: f32 = 15.0;

/// Space between a file path heading and its first code line, in points.
pub const HEADING_SPACE_AFTER: f32 = 10.0;

/// Extra indentation given to the continuation of a wrapped line.
const CONTINUATION_INDENT: usize = 4;

/// Line grid derived from the page layout and fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetrics {
    /// Code lines that fit between the top and bottom margins
    pub lines_per_page: usize,
    /// Characters that fit between the left and right margins
    pub max_chars_per_line: usize,
    /// Code line slots taken by a file path heading
    pub header_lines: usize,
}

impl PageMetrics {
    pub fn from_config(config: &Configuration) -> PageMetrics {
        let (width, height) = config.layout.page_size.dimensions();
        let margins = &config.layout.margins;
        let code = &config.fonts.code;

        let content_height = height - margins.top - margins.bottom;
        let content_width = width - margins.left - margins.right;
        let leading = code.leading();

        let lines_per_page = (content_height / leading).floor().max(1.0) as usize;
        let max_chars_per_line = (content_width / (code.size * MONOSPACE_ADVANCE))
            .floor()
            .max(0.0) as usize;
        let heading_height =
            HEADING_SPACE_BEFORE + config.fonts.file_path.leading() + HEADING_SPACE_AFTER;
        let header_lines = ((heading_height / leading).ceil() as usize).max(2);

        PageMetrics {
            lines_per_page,
            max_chars_per_line,
            header_lines,
        }
    }

    /// Estimated pages occupied by a file with `rendered_lines` wrapped lines.
    ///
    /// Never zero: the heading alone takes up space.
    pub fn estimate(&self, rendered_lines: usize) -> f32 {
        (self.header_lines + rendered_lines) as f32 / self.lines_per_page as f32
    }

    /// Number of lines `contents` occupies once wrapped.
    pub fn rendered_lines(&self, contents: &str) -> usize {
        source_lines(contents)
            .map(|line| wrap_line(&line, self.max_chars_per_line).len())
            .sum()
    }
}

/// One printed row of a wrapped source line: `indent` spaces followed by the
/// characters `start..end` of the (tab-expanded) source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub indent: usize,
    pub start: usize,
    pub end: usize,
}

/// Splits `contents` into lines with tabs expanded to 4 spaces and carriage
/// returns dropped.
pub fn source_lines(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents.split('\n').map(|line| {
        let mut out = String::with_capacity(line.len());
        for c in line.chars() {
            match c {
                '\t' => out.push_str("    "),
                '\r' => {}
                c => out.push(c),
            }
        }
        out
    })
}

/// Wraps a single line to at most `max_chars` characters per row.
///
/// The first row keeps the line's own indentation. The rest of the line is
/// left-trimmed and continued on rows indented 4 spaces past the original
/// indentation, or by 4 spaces alone when that leaves no room.
pub fn wrap_line(line: &str, max_chars: usize) -> Vec<Segment> {
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    if len <= max_chars || max_chars == 0 {
        return vec![Segment {
            indent: 0,
            start: 0,
            end: len,
        }];
    }

    let indent = chars.iter().take_while(|c| c.is_whitespace()).count();
    let mut segments = vec![Segment {
        indent: 0,
        start: 0,
        end: max_chars,
    }];

    let mut pos = max_chars;
    while pos < len && chars[pos].is_whitespace() {
        pos += 1;
    }

    while pos < len {
        let mut continuation = indent + CONTINUATION_INDENT;
        if continuation >= max_chars {
            continuation = CONTINUATION_INDENT;
        }
        if continuation >= max_chars {
            break;
        }
        let available = max_chars - continuation;
        let end = (pos + available).min(len);
        segments.push(Segment {
            indent: continuation,
            start: pos,
            end,
        });
        pos = end;
    }

    segments
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::PageSize;

    #[test]
    fn default_layout_metrics() {
        let config = Configuration::default();
        let metrics = PageMetrics::from_config(&config);
        // A4, 1in margins, 8pt Courier on 9.6pt leading
        assert_eq!(metrics.lines_per_page, 72);
        assert_eq!(metrics.max_chars_per_line, 94);
        // 15 + 14.4 + 10 = 39.4pt of heading over 9.6pt lines
        assert_eq!(metrics.header_lines, 5);
    }

    #[test]
    fn letter_pages_hold_fewer_lines() {
        let mut config = Configuration::default();
        config.layout.page_size = PageSize::Letter;
        let metrics = PageMetrics::from_config(&config);
        assert_eq!(metrics.lines_per_page, 67);
        assert_eq!(metrics.max_chars_per_line, 97);
    }

    #[test]
    fn empty_files_still_cost_something() {
        let metrics = PageMetrics {
            lines_per_page: 50,
            max_chars_per_line: 80,
            header_lines: 2,
        };
        assert!(metrics.estimate(0) > 0.0);
        assert_eq!(metrics.estimate(98), 2.0);
        assert_eq!(metrics.estimate(48), 1.0);
    }

    #[test]
    fn short_lines_are_not_wrapped() {
        assert_eq!(
            wrap_line("let x = 1;", 20),
            vec![Segment {
                indent: 0,
                start: 0,
                end: 10
            }]
        );
        assert_eq!(wrap_line("", 20).len(), 1);
    }

    #[test]
    fn long_lines_continue_past_their_indentation() {
        // 2 spaces of indent, then 30 characters
        let line = format!("  {}", "a".repeat(30));
        let segments = wrap_line(&line, 20);
        assert_eq!(
            segments,
            vec![
                Segment {
                    indent: 0,
                    start: 0,
                    end: 20
                },
                Segment {
                    indent: 6,
                    start: 20,
                    end: 32
                },
            ]
        );
    }

    #[test]
    fn whitespace_at_the_break_is_dropped() {
        let line = format!("{}   {}", "a".repeat(20), "b".repeat(5));
        let segments = wrap_line(&line, 20);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start, 23);
        assert_eq!(segments[1].end, 28);
    }

    #[test]
    fn deep_indentation_falls_back_to_a_small_continuation() {
        let line = format!("{}{}", " ".repeat(18), "c".repeat(10));
        let segments = wrap_line(&line, 20);
        assert_eq!(segments[1].indent, 4);
        assert_eq!(segments.iter().map(|s| s.end - s.start).sum::<usize>(), 28);
    }

    #[test]
    fn rendered_lines_count_wrapped_rows_and_tabs() {
        let metrics = PageMetrics {
            lines_per_page: 50,
            max_chars_per_line: 20,
            header_lines: 2,
        };
        // a tab expands to four spaces, pushing this line over the limit
        let contents = format!("fn main() {{\n\t{}\n}}", "x".repeat(17));
        assert_eq!(metrics.rendered_lines(&contents), 4);
        assert_eq!(metrics.rendered_lines("a\r\nb\r\n"), 3);
    }
}
