use crate::error::Error;
use crate::selection::CandidateFile;
use std::path::Path;

mod pdf;
pub use pdf::*;

/// Everything a sink needs to produce one listing document.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a> {
    pub title: &'a str,
    pub files: &'a [CandidateFile],
    pub outfile: &'a Path,
}

/// Statistics from rendering a listing, used for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    /// Number of pages actually written
    pub page_count: usize,
}

pub trait Render {
    fn render(&self, listing: &Listing<'_>) -> Result<RenderStats, Error>;
}
