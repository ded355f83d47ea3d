//! Page-budgeted file selection.
//!
//! Candidates are considered strictly in the order given (the discoverer hands
//! them over sorted by path). Each one is included when it keeps the running
//! total within `target + overrun`, and skipped otherwise; a skip never ends
//! the scan, since a later, smaller file may still fit. Once the target is
//! reached the scan carries on to use up the overrun window.
//!
//! This is a greedy in-order policy, not a bin packer: the same candidate list
//! always yields the same selection.

use derive_builder::Builder;
use std::fmt;
use std::path::PathBuf;

/// Slack used when comparing summed page estimates against the ceiling.
const EPSILON: f32 = 1e-4;

/// A discovered file together with its rendered size.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    /// Path relative to the code folder
    pub path: PathBuf,
    pub contents: String,
    /// Lines in the source file
    pub line_count: usize,
    /// Lines after wrapping to the page width
    pub rendered_lines: usize,
    pub estimated_pages: f32,
}

#[derive(Builder, Debug, Clone, Copy, PartialEq, Eq)]
#[builder(setter(into))]
pub struct Budget {
    pub target_pages: u32,
    #[builder(default = "3")]
    pub max_overrun_pages: u32,
    #[builder(setter(into, strip_option), default)]
    pub max_files: Option<usize>,
}

impl Budget {
    /// Highest running total a selection may reach.
    pub fn ceiling(&self) -> f32 {
        (self.target_pages + self.max_overrun_pages) as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Including the file would push the total past the ceiling
    ExceedsLimit { projected_total: f32 },
    /// The configured file limit was already reached
    FileLimit,
    /// The file couldn't be read
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExceedsLimit { projected_total } => write!(
                f,
                "would exceed limit by too much (estimated {projected_total:.1} pages)"
            ),
            SkipReason::FileLimit => write!(f, "file limit reached"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult {
    pub included: Vec<CandidateFile>,
    /// Sum of the included files' estimated pages
    pub total_pages: f32,
    pub skipped: Vec<SkippedFile>,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    fn include(&mut self, candidate: CandidateFile) {
        self.total_pages += candidate.estimated_pages;
        self.included.push(candidate);
    }

    fn skip(&mut self, path: PathBuf, reason: SkipReason) {
        self.skipped.push(SkippedFile { path, reason });
    }
}

/// Selects files from `candidates`, in order, to land within the budget.
pub fn select<I>(candidates: I, budget: &Budget) -> SelectionResult
where
    I: IntoIterator<Item = CandidateFile>,
{
    let ceiling = budget.ceiling();
    let target = budget.target_pages as f32;
    let mut result = SelectionResult::default();
    let mut candidates = candidates.into_iter();

    for candidate in candidates.by_ref() {
        let projected_total = result.total_pages + candidate.estimated_pages;
        if projected_total > ceiling + EPSILON {
            tracing::info!(
                path = %candidate.path.display(),
                projected_total,
                ceiling,
                "skipping file, trying the next one"
            );
            result.skip(candidate.path, SkipReason::ExceedsLimit { projected_total });
            continue;
        }

        if projected_total > target {
            tracing::info!(
                path = %candidate.path.display(),
                over_by = projected_total - target,
                "including file past the target page count"
            );
        } else {
            tracing::debug!(path = %candidate.path.display(), projected_total, "including file");
        }
        result.include(candidate);

        let file_limit_hit = budget
            .max_files
            .is_some_and(|max| result.included.len() >= max);
        let ceiling_hit = ceiling - result.total_pages <= EPSILON;
        if file_limit_hit || ceiling_hit {
            break;
        }
    }

    // anything left over was never considered
    let limit_reached = budget
        .max_files
        .is_some_and(|max| result.included.len() >= max);
    for candidate in candidates {
        let reason = if limit_reached {
            SkipReason::FileLimit
        } else {
            SkipReason::ExceedsLimit {
                projected_total: result.total_pages + candidate.estimated_pages,
            }
        };
        result.skip(candidate.path, reason);
    }

    result
}
