//! A complete listing run, from discovery to the updated ignore list.

use crate::config::Configuration;
use crate::discovery;
use crate::error::Error;
use crate::estimate::PageMetrics;
use crate::ignore_list::IgnoreList;
use crate::selection::{self, SelectionResult};
use crate::sinks::{Listing, Render};
use crate::summary::{self, Summarizer, SummaryService};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Consider every file, even those on the ignore list
    pub no_ignore: bool,
    /// Show a progress bar while reading files
    pub progress: bool,
}

/// What a run did, for reporting back to the user.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Files found before selection
    pub discovered: usize,
    pub selection: SelectionResult,
    /// Where the PDF was written; `None` when there was nothing to list
    pub output: Option<PathBuf>,
    /// Pages in the written PDF
    pub page_count: usize,
    pub title_file: Option<PathBuf>,
    /// `(language, summary)` pairs
    pub summaries: Vec<(String, String)>,
    /// Paths newly added to the ignore list
    pub recorded: usize,
}

pub fn run(
    config: &Configuration,
    options: &RunOptions,
    renderer: &dyn Render,
    service: Option<&dyn SummaryService>,
) -> Result<RunReport, Error> {
    let budget = config.budget()?;
    let metrics = PageMetrics::from_config(config);
    let mut report = RunReport::default();

    let mut ignore = match IgnoreList::load(&config.ignore_file, &config.code_folder) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("{e}; continuing without an ignore list");
            IgnoreList::empty(&config.ignore_file, &config.code_folder)
        }
    };

    if options.no_ignore && !ignore.is_empty() {
        tracing::info!(entries = ignore.len(), "not applying the ignore list");
    }
    let filter = (!options.no_ignore).then_some(&ignore);
    let paths = discovery::discover(config, filter)?;
    report.discovered = paths.len();
    if paths.is_empty() {
        tracing::info!("no files to process");
        return Ok(report);
    }

    let progress = if options.progress {
        let progress = ProgressBar::new(paths.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress
    } else {
        ProgressBar::hidden()
    };
    let (candidates, unreadable) =
        discovery::load_candidates(&config.code_folder, &paths, &metrics, &progress);
    progress.finish_and_clear();

    let mut selection = selection::select(candidates, &budget);
    let mut skipped = unreadable;
    skipped.append(&mut selection.skipped);
    selection.skipped = skipped;
    tracing::info!(
        included = selection.included.len(),
        skipped = selection.skipped.len(),
        estimated_pages = selection.total_pages,
        "selected files"
    );
    if selection.is_empty() {
        report.selection = selection;
        return Ok(report);
    }

    let output = config.output_path();
    let stats = renderer.render(&Listing {
        title: &config.defaults.title,
        files: &selection.included,
        outfile: &output,
    })?;

    let included: Vec<PathBuf> = selection.included.iter().map(|f| f.path.clone()).collect();
    let summaries = Summarizer::new(service, &config.ai).summarize(&included, stats.page_count);
    let title_file = summary::title_file_path(&output);
    match summary::write_title_file(
        &title_file,
        &output,
        stats.page_count,
        included.len(),
        &summaries,
    ) {
        Ok(()) => report.title_file = Some(title_file),
        Err(e) => tracing::warn!("{e}; no title file written"),
    }

    if config.defaults.update_ignore {
        match ignore.record(&included, chrono::Local::now()) {
            Ok(added) => report.recorded = added,
            Err(e) => tracing::warn!("{e}; ignore list not updated"),
        }
    }

    report.selection = selection;
    report.output = Some(output);
    report.page_count = stats.page_count;
    report.summaries = summaries;
    Ok(report)
}
