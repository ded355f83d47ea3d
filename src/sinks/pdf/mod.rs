//! PDF output.
//!
//! Pages are composed by [`rendering::PageFlow`] into content streams, then
//! assembled into a document with one shared set of base-14 font resources.
//! The page count is known exactly once composition is done, so no second
//! pass over the written file is needed.

pub mod fonts;
mod highlight;
mod rendering;

use crate::config::Configuration;
use crate::error::Error;
use crate::estimate::PageMetrics;
use crate::sinks::{Listing, Render, RenderStats};
use pdf_writer::{Name, Pdf, Rect, Ref, TextStr};
use highlight::Highlighter;
use rendering::{source_file, title_page, FontTable, PageFlow};

const CREATOR: &str = concat!("src-pages v", env!("CARGO_PKG_VERSION"));

pub struct PdfRenderer {
    config: Configuration,
    metrics: PageMetrics,
    highlighter: Option<Highlighter>,
}

impl PdfRenderer {
    pub fn new(config: &Configuration) -> Result<PdfRenderer, Error> {
        let highlighter = if config.layout.highlight {
            Some(Highlighter::new()?)
        } else {
            None
        };
        Ok(PdfRenderer {
            config: config.clone(),
            metrics: PageMetrics::from_config(config),
            highlighter,
        })
    }

    /// Lays out the listing and returns the finished document bytes along
    /// with the number of pages.
    pub fn compose(&self, listing: &Listing<'_>) -> Result<(Vec<u8>, usize), Error> {
        let fonts = FontTable::for_config(&self.config);
        let mut flow = PageFlow::new(&self.config, &fonts, self.metrics);

        title_page::render(&mut flow, listing.title);
        for file in listing.files {
            tracing::debug!(
                path = %file.path.display(),
                lines = file.line_count,
                rendered_lines = file.rendered_lines,
                "rendering file"
            );
            source_file::render(&mut flow, file, self.highlighter.as_ref())?;
        }

        let pages = flow.finish();
        let page_count = pages.len();
        let bytes = write_document(&self.config, &fonts, listing.title, &pages);
        Ok((bytes, page_count))
    }
}

impl Render for PdfRenderer {
    fn render(&self, listing: &Listing<'_>) -> Result<RenderStats, Error> {
        let (bytes, page_count) = self.compose(listing)?;

        if let Some(parent) = listing.outfile.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::render(format!(
                        "failed to create output folder {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        std::fs::write(listing.outfile, bytes).map_err(|e| {
            Error::render(format!(
                "failed to write {}: {e}",
                listing.outfile.display()
            ))
        })?;

        tracing::info!(
            path = %listing.outfile.display(),
            pages = page_count,
            "wrote PDF"
        );
        Ok(RenderStats { page_count })
    }
}

fn write_document(
    config: &Configuration,
    fonts: &FontTable,
    title: &str,
    pages: &[Vec<u8>],
) -> Vec<u8> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let tree_id = alloc.bump();
    let info_id = alloc.bump();
    let font_ids: Vec<(Ref, &str, &str)> = fonts
        .entries()
        .map(|(family, name)| (alloc.bump(), family, name))
        .collect();
    let page_ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc.bump(), alloc.bump())).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().map(|(page_id, _)| *page_id))
        .count(page_ids.len() as i32);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .creator(TextStr(CREATOR));

    for (id, family, _) in font_ids.iter() {
        pdf.type1_font(*id)
            .base_font(Name(family.as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let (width, height) = config.layout.page_size.dimensions();
    for ((page_id, content_id), data) in page_ids.iter().zip(pages) {
        {
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, width, height));
            page.parent(tree_id);
            page.contents(*content_id);
            let mut resources = page.resources();
            let mut dict = resources.fonts();
            for (id, _, name) in font_ids.iter() {
                dict.pair(Name(name.as_bytes()), *id);
            }
        }
        pdf.stream(*content_id, data);
    }

    pdf.finish()
}
