//! Base-14 font handling.
//!
//! Listings only use the fonts every PDF viewer ships with, so nothing needs
//! embedding and the monospaced Courier faces have a known, constant advance
//! width. Text is written in WinAnsi encoding.

use crate::estimate::MONOSPACE_ADVANCE;

/// The standard fonts every conforming PDF reader provides.
pub const BASE_14: &[&str] = &[
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Symbol",
    "ZapfDingbats",
];

pub fn is_base14(family: &str) -> bool {
    BASE_14.contains(&family)
}

pub fn is_monospaced(family: &str) -> bool {
    family.starts_with("Courier") && is_base14(family)
}

/// The bold face of a family, used for bold syntax highlighting tokens.
///
/// Families without a bold face map to themselves.
pub fn bold_variant(family: &str) -> &str {
    match family {
        "Courier" => "Courier-Bold",
        "Courier-Oblique" => "Courier-BoldOblique",
        "Helvetica" => "Helvetica-Bold",
        "Helvetica-Oblique" => "Helvetica-BoldOblique",
        "Times-Roman" => "Times-Bold",
        "Times-Italic" => "Times-BoldItalic",
        other => other,
    }
}

/// Approximate width of `text` set in `family` at `size` points.
///
/// Exact for Courier; proportional faces use an average glyph width, which is
/// good enough for centring a title or a page number.
pub fn text_width(text: &str, family: &str, size: f32) -> f32 {
    let advance = if family.starts_with("Courier") {
        MONOSPACE_ADVANCE
    } else if family.starts_with("Helvetica") {
        0.55
    } else {
        0.5
    };
    text.chars().count() as f32 * advance * size
}

/// Encodes text for a WinAnsi-encoded simple font.
///
/// Latin-1 printable characters map to themselves, control characters become
/// spaces and everything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            0x00..=0x1f | 0x7f..=0x9f => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recognises_base14_names() {
        assert!(is_base14("Courier"));
        assert!(is_base14("Times-BoldItalic"));
        assert!(!is_base14("courier"));
        assert!(!is_base14("Fira Mono"));
        assert!(is_monospaced("Courier-Oblique"));
        assert!(!is_monospaced("Helvetica"));
    }

    #[test]
    fn bold_variants() {
        assert_eq!(bold_variant("Courier"), "Courier-Bold");
        assert_eq!(bold_variant("Courier-Bold"), "Courier-Bold");
        assert_eq!(bold_variant("Times-Roman"), "Times-Bold");
        assert_eq!(bold_variant("Symbol"), "Symbol");
    }

    #[test]
    fn courier_width_is_exact() {
        assert_eq!(text_width("abcde", "Courier", 10.0), 30.0);
        assert_eq!(text_width("", "Helvetica", 10.0), 0.0);
    }

    #[test]
    fn encodes_latin1_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("a=1;"), b"a=1;".to_vec());
        assert_eq!(encode_win_ansi("caf\u{e9}"), vec![b'c', b'a', b'f', 0xe9]);
        assert_eq!(encode_win_ansi("\u{2192}\u{1f600}"), b"??".to_vec());
        assert_eq!(encode_win_ansi("\u{c}"), b" ".to_vec());
    }
}
