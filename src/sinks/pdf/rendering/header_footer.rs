//! Page furniture drawn in the margins.

use super::{show_text, FontTable};
use crate::config::Configuration;
use crate::sinks::pdf::fonts::text_width;
use pdf_writer::Content;

/// Centres the page number in the bottom margin.
pub fn render_page_number(
    content: &mut Content,
    config: &Configuration,
    fonts: &FontTable,
    number: usize,
) {
    let font = &config.fonts.code;
    let text = number.to_string();
    let (width, _) = config.layout.page_size.dimensions();
    let x = (width - text_width(&text, &font.family, font.size)) / 2.0;
    let y = config.layout.margins.bottom / 2.0;
    show_text(content, fonts.name(&font.family), font.size, 0.25, (x, y), &text);
}
