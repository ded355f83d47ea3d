//! Page composition.
//!
//! A listing is laid out on a grid of code-line slots: every page holds
//! `lines_per_page` slots between its top and bottom margins, the title and
//! each file heading claim a fixed number of slots, and every wrapped code row
//! claims one. [`PageFlow`] tracks the current slot, breaks pages when a block
//! no longer fits, and hands back the finished content streams.

pub mod header_footer;
pub mod source_file;
pub mod title_page;

use crate::config::Configuration;
use crate::estimate::PageMetrics;
use crate::sinks::pdf::fonts::{self, bold_variant};
use pdf_writer::types::LineCapStyle;
use pdf_writer::{Content, Name, Str};

/// Resource names of the fonts a listing uses, shared by every page.
#[derive(Debug)]
pub struct FontTable {
    entries: Vec<(String, String)>,
}

impl FontTable {
    pub fn for_config(config: &Configuration) -> FontTable {
        let families = [
            config.fonts.title.family.as_str(),
            config.fonts.file_path.family.as_str(),
            config.fonts.code.family.as_str(),
            bold_variant(&config.fonts.code.family),
        ];

        let mut entries: Vec<(String, String)> = Vec::new();
        for family in families {
            if !entries.iter().any(|(f, _)| f == family) {
                let name = format!("F{}", entries.len() + 1);
                entries.push((family.to_string(), name));
            }
        }
        FontTable { entries }
    }

    /// The resource name for `family`; unknown families fall back to the
    /// first registered font.
    pub fn name(&self, family: &str) -> Name<'_> {
        let (_, name) = self
            .entries
            .iter()
            .find(|(f, _)| f == family)
            .unwrap_or(&self.entries[0]);
        Name(name.as_bytes())
    }

    /// `(family, resource name)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(family, name)| (family.as_str(), name.as_str()))
    }
}

pub struct PageFlow<'a> {
    config: &'a Configuration,
    fonts: &'a FontTable,
    metrics: PageMetrics,
    pages: Vec<Vec<u8>>,
    content: Content,
    slot: usize,
    dirty: bool,
}

impl<'a> PageFlow<'a> {
    pub fn new(config: &'a Configuration, fonts: &'a FontTable, metrics: PageMetrics) -> Self {
        PageFlow {
            config,
            fonts,
            metrics,
            pages: Vec::new(),
            content: Content::new(),
            slot: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> &'a Configuration {
        self.config
    }

    pub fn fonts(&self) -> &'a FontTable {
        self.fonts
    }

    pub fn metrics(&self) -> PageMetrics {
        self.metrics
    }

    pub fn left(&self) -> f32 {
        self.config.layout.margins.left
    }

    pub fn right(&self) -> f32 {
        self.config.layout.page_size.dimensions().0 - self.config.layout.margins.right
    }

    /// Y coordinate of the top edge of the current slot.
    pub fn slot_top(&self) -> f32 {
        let height = self.config.layout.page_size.dimensions().1;
        height - self.config.layout.margins.top
            - self.slot as f32 * self.config.fonts.code.leading()
    }

    /// Starts a new page unless `slots` more slots fit on this one. A fresh
    /// page always accepts the block, however tall.
    pub fn ensure_room(&mut self, slots: usize) {
        if self.slot > 0 && self.slot + slots > self.metrics.lines_per_page {
            self.break_page();
        }
    }

    pub fn advance(&mut self, slots: usize) {
        self.slot += slots;
        self.dirty = true;
    }

    pub fn content(&mut self) -> &mut Content {
        self.dirty = true;
        &mut self.content
    }

    pub fn break_page(&mut self) {
        let content = std::mem::replace(&mut self.content, Content::new());
        self.close_page(content);
        self.slot = 0;
        self.dirty = false;
    }

    fn close_page(&mut self, mut content: Content) {
        let number = self.pages.len() + 1;
        if self.config.layout.page_numbers {
            header_footer::render_page_number(&mut content, self.config, self.fonts, number);
        }
        self.pages.push(content.finish());
    }

    /// Finishes the last page and returns every page's content stream.
    pub fn finish(mut self) -> Vec<Vec<u8>> {
        if self.dirty || self.pages.is_empty() {
            let content = std::mem::replace(&mut self.content, Content::new());
            self.close_page(content);
        }
        self.pages
    }
}

/// Writes a single run of text at `(x, y)`.
pub fn show_text(
    content: &mut Content,
    font: Name<'_>,
    size: f32,
    grey: f32,
    (x, y): (f32, f32),
    text: &str,
) {
    let encoded = fonts::encode_win_ansi(text);
    content
        .begin_text()
        .set_font(font, size)
        .set_fill_gray(grey)
        .next_line(x, y)
        .show(Str(&encoded))
        .end_text();
}

/// Draws a thin grey horizontal rule from `x1` to `x2`.
pub fn rule(content: &mut Content, x1: f32, x2: f32, y: f32) {
    content
        .set_stroke_gray(0.75)
        .set_line_cap(LineCapStyle::ButtCap)
        .set_line_width(0.25)
        .move_to(x1, y)
        .line_to(x2, y)
        .stroke();
}
