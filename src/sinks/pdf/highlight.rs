//! Syntax highlighting of listing lines.
//!
//! Lines are highlighted before they are wrapped, so the result is expressed
//! as character ranges into each line rather than owned strings; the renderer
//! slices those ranges to fit every wrapped row.

use crate::error::Error;
use std::path::Path;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

const THEME: &str = "InspiredGitHub";

/// A run of characters `start..end` sharing one colour and weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub colour: (u8, u8, u8),
    pub bold: bool,
}

impl Span {
    fn plain(len: usize) -> Span {
        Span {
            start: 0,
            end: len,
            colour: (0, 0, 0),
            bold: false,
        }
    }
}

pub struct Highlighter {
    ss: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    pub fn new() -> Result<Highlighter, Error> {
        let ss = SyntaxSet::load_defaults_nonewlines();
        let mut ts = ThemeSet::load_defaults();
        let theme = ts
            .themes
            .remove(THEME)
            .ok_or_else(|| Error::render(format!("syntax theme `{THEME}` is missing")))?;
        Ok(Highlighter { ss, theme })
    }

    /// Highlights `lines` using the syntax matching `path`'s extension.
    ///
    /// Files without a known syntax come back as one black span per line.
    pub fn highlight(&self, path: &Path, lines: &[String]) -> Result<Vec<Vec<Span>>, Error> {
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or_default();
        let Some(syntax) = self.ss.find_syntax_by_extension(extension) else {
            return Ok(plain(lines));
        };

        let mut h = HighlightLines::new(syntax, &self.theme);
        let mut highlighted = Vec::with_capacity(lines.len());
        for line in lines {
            let ranges = h.highlight_line(line, &self.ss).map_err(|e| {
                Error::render(format!(
                    "failed to highlight `{}`: {e}",
                    path.display()
                ))
            })?;

            let mut spans = Vec::with_capacity(ranges.len());
            let mut start = 0;
            for (style, text) in ranges {
                let end = start + text.chars().count();
                if end > start {
                    spans.push(Span {
                        start,
                        end,
                        colour: (style.foreground.r, style.foreground.g, style.foreground.b),
                        bold: style.font_style.intersects(FontStyle::BOLD),
                    });
                }
                start = end;
            }
            highlighted.push(spans);
        }

        Ok(highlighted)
    }
}

/// One unstyled span per line.
pub fn plain(lines: &[String]) -> Vec<Vec<Span>> {
    lines
        .iter()
        .map(|line| vec![Span::plain(line.chars().count())])
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_extensions_are_plain() {
        let h = Highlighter::new().expect("can load highlighter");
        let lines = vec!["hello world".to_string(), String::new()];
        let spans = h
            .highlight(Path::new("notes.unknownext"), &lines)
            .expect("can highlight");
        assert_eq!(spans, plain(&lines));
        assert_eq!(spans[0][0].end, 11);
    }

    #[test]
    fn spans_cover_every_character() {
        let h = Highlighter::new().expect("can load highlighter");
        let lines = vec![
            "fn main() {".to_string(),
            "    let caf\u{e9} = \"x\";".to_string(),
            "}".to_string(),
        ];
        let spans = h
            .highlight(Path::new("src/main.rs"), &lines)
            .expect("can highlight");
        assert_eq!(spans.len(), 3);
        for (line, spans) in lines.iter().zip(spans.iter()) {
            let covered: usize = spans.iter().map(|s| s.end - s.start).sum();
            assert_eq!(covered, line.chars().count());
            assert!(spans.windows(2).all(|w| w[0].end == w[1].start));
        }
    }
}
