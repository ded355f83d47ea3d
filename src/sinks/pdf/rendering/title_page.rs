//! Title block at the top of the first page.

use super::{show_text, PageFlow};
use crate::config::Alignment;
use crate::sinks::pdf::fonts::text_width;

/// Space below the title before the first file heading, in points.
const TITLE_SPACE_AFTER: f32 = 40.0;

/// Code-line slots the title block occupies.
pub fn slots(flow: &PageFlow<'_>) -> usize {
    let config = flow.config();
    let height = config.fonts.title.leading() + TITLE_SPACE_AFTER;
    (height / config.fonts.code.leading()).ceil() as usize
}

pub fn render(flow: &mut PageFlow<'_>, title: &str) {
    let config = flow.config();
    let font = &config.fonts.title;
    let slots = slots(flow);
    flow.ensure_room(slots);

    let x = match font.alignment {
        Alignment::Left => flow.left(),
        Alignment::Center => {
            let available = flow.right() - flow.left();
            let width = text_width(title, &font.family, font.size);
            flow.left() + ((available - width) / 2.0).max(0.0)
        }
    };
    let y = flow.slot_top() - font.size;

    let name = flow.fonts().name(&font.family);
    show_text(flow.content(), name, font.size, 0.0, (x, y), title);
    flow.advance(slots);
}
