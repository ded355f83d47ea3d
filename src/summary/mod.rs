//! One-line descriptions of what a listing contains.
//!
//! A summary service is asked first when one is configured; transient
//! failures are retried with exponential backoff, and any remaining failure
//! falls back to the rule-based summary. The result is written next to the
//! PDF as `<name>_title.txt`.

mod anthropic;
mod rule_based;

pub use anthropic::AnthropicClient;

use crate::config::{Ai, MAX_RETRY_DELAY_SECS};
use crate::error::{Error, SummaryServiceError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum number of file names listed in a prompt.
const PROMPT_FILE_LIMIT: usize = 20;

pub trait SummaryService {
    fn summarize(&self, prompt: &str) -> Result<String, SummaryServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(ai: &Ai) -> RetryPolicy {
        RetryPolicy {
            attempts: ai.retry_attempts.max(1),
            initial_delay: Duration::try_from_secs_f32(
                ai.retry_delay_secs.clamp(0.0, MAX_RETRY_DELAY_SECS),
            )
            .unwrap_or_default(),
        }
    }

    /// Calls `f` until it succeeds, fails permanently, or runs out of
    /// attempts. The delay doubles after every transient failure.
    pub fn run<T, F>(&self, mut f: F) -> Result<T, SummaryServiceError>
    where
        F: FnMut() -> Result<T, SummaryServiceError>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    tracing::warn!(
                        attempt,
                        attempts = self.attempts,
                        delay_secs = delay.as_secs_f32(),
                        "{e}, retrying"
                    );
                    std::thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub struct Summarizer<'a> {
    service: Option<&'a dyn SummaryService>,
    retry: RetryPolicy,
    languages: Vec<String>,
}

impl<'a> Summarizer<'a> {
    pub fn new(service: Option<&'a dyn SummaryService>, ai: &Ai) -> Summarizer<'a> {
        let mut languages = ai.languages.clone();
        if languages.is_empty() {
            languages.push("English".to_string());
        }
        Summarizer {
            service,
            retry: RetryPolicy::from_config(ai),
            languages,
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Summarizer<'a> {
        self.retry = retry;
        self
    }

    /// One `(language, summary)` pair per configured language.
    pub fn summarize(&self, files: &[PathBuf], page_count: usize) -> Vec<(String, String)> {
        self.languages
            .iter()
            .map(|language| (language.clone(), self.summarize_in(language, files, page_count)))
            .collect()
    }

    fn summarize_in(&self, language: &str, files: &[PathBuf], page_count: usize) -> String {
        if files.is_empty() {
            return rule_based::summarize(files, page_count);
        }
        let Some(service) = self.service else {
            return rule_based::summarize(files, page_count);
        };

        let prompt = prompt(files, page_count, language);
        match self.retry.run(|| service.summarize(&prompt)) {
            Ok(summary) => with_page_count(summary.trim(), page_count),
            Err(e) => {
                tracing::warn!(language, "{e}; using rule-based summary");
                rule_based::summarize(files, page_count)
            }
        }
    }
}

/// The request sent to the summary service.
pub fn prompt(files: &[PathBuf], page_count: usize, language: &str) -> String {
    let mut listed = String::new();
    for file in files.iter().take(PROMPT_FILE_LIMIT) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = file
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let _ = writeln!(listed, "- {name} ({ext})");
    }
    if files.len() > PROMPT_FILE_LIMIT {
        listed.push_str("...\n");
    }

    format!(
        "Analyze this list of code files and create a brief summary describing what was added to this PDF.

Files ({count} total, {page_count} pages):
{listed}
Generate a summary in this format: \"Added [technology/component type] [purpose/functionality]. Added new [X] pages.\"

Examples:
- \"Added React components for user interface. Added new 15 pages.\"
- \"Added Python backend API functions. Added new 8 pages.\"
- \"Added CSS styling for web components. Added new 12 pages.\"

Focus on the main technology, the kind of component and its purpose.
Write the summary in {language}. Respond with ONLY the summary in the specified format.",
        count = files.len(),
    )
}

fn with_page_count(summary: &str, page_count: usize) -> String {
    if summary.contains(&page_count.to_string()) {
        summary.to_string()
    } else {
        format!("{summary}. {page_count} pages.")
    }
}

/// `<dir>/<stem>_title.txt` for a PDF at `<dir>/<stem>.pdf`.
pub fn title_file_path(pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    pdf.with_file_name(format!("{stem}_title.txt"))
}

pub fn write_title_file(
    path: &Path,
    pdf: &Path,
    page_count: usize,
    file_count: usize,
    summaries: &[(String, String)],
) -> Result<(), Error> {
    let pdf_name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut contents = format!("PDF: {pdf_name}\nPages: {page_count}\nFiles: {file_count}\n");
    match summaries {
        [(_, summary)] => {
            let _ = writeln!(contents, "Summary: {summary}");
        }
        many => {
            for (language, summary) in many {
                let _ = writeln!(contents, "Summary ({language}): {summary}");
            }
        }
    }

    std::fs::write(path, contents).map_err(|e| Error::FileAccess {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "wrote title file");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use std::cell::RefCell;

    /// Replays canned responses and remembers the prompts it saw.
    struct Scripted {
        responses: RefCell<Vec<Result<String, SummaryServiceError>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<String, SummaryServiceError>>) -> Scripted {
            responses.reverse();
            Scripted {
                responses: RefCell::new(responses),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    impl SummaryService for Scripted {
        fn summarize(&self, prompt: &str) -> Result<String, SummaryServiceError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.responses
                .borrow_mut()
                .pop()
                .unwrap_or(Err(SummaryServiceError::Server(500)))
        }
    }

    fn no_delay(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_delay: Duration::ZERO,
        }
    }

    #[test]
    fn retry_policy_never_panics_on_huge_delays() {
        for delay in [1e20, f32::INFINITY, f32::NAN, -5.0] {
            let ai = Ai {
                retry_delay_secs: delay,
                ..Ai::default()
            };
            let policy = RetryPolicy::from_config(&ai);
            assert!(policy.initial_delay <= Duration::from_secs_f32(MAX_RETRY_DELAY_SECS));
        }
    }

    fn files() -> Vec<PathBuf> {
        vec![PathBuf::from("src/main.rs"), PathBuf::from("src/lib.rs")]
    }

    #[test]
    fn retries_transient_failures() {
        let service = Scripted::new(vec![
            Err(SummaryServiceError::Overloaded(529)),
            Err(SummaryServiceError::RateLimited),
            Ok("Added Rust CLI tools. Added new 7 pages.".to_string()),
        ]);
        let summarizer = Summarizer::new(Some(&service), &Ai::default()).with_retry(no_delay(3));
        let summaries = summarizer.summarize(&files(), 7);
        assert_eq!(service.calls(), 3);
        assert_eq!(
            summaries,
            vec![(
                "English".to_string(),
                "Added Rust CLI tools. Added new 7 pages.".to_string()
            )]
        );
    }

    #[test]
    fn gives_up_after_the_last_attempt() {
        let service = Scripted::new(vec![
            Err(SummaryServiceError::Overloaded(529)),
            Err(SummaryServiceError::Overloaded(529)),
            Ok("too late".to_string()),
        ]);
        let summarizer = Summarizer::new(Some(&service), &Ai::default()).with_retry(no_delay(2));
        let summaries = summarizer.summarize(&files(), 3);
        assert_eq!(service.calls(), 2);
        assert_eq!(summaries[0].1, "2 Rust files. 3 pages.");
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let service = Scripted::new(vec![Err(SummaryServiceError::Auth(401))]);
        let summarizer = Summarizer::new(Some(&service), &Ai::default()).with_retry(no_delay(5));
        let summaries = summarizer.summarize(&files(), 3);
        assert_eq!(service.calls(), 1);
        assert_eq!(summaries[0].1, "2 Rust files. 3 pages.");
    }

    #[test]
    fn page_count_is_appended_when_missing() {
        let service = Scripted::new(vec![Ok("Added Rust CLI tools".to_string())]);
        let summarizer = Summarizer::new(Some(&service), &Ai::default()).with_retry(no_delay(1));
        assert_eq!(
            summarizer.summarize(&files(), 12)[0].1,
            "Added Rust CLI tools. 12 pages."
        );
    }

    #[test]
    fn one_summary_per_language() {
        let service = Scripted::new(vec![
            Ok("Added Rust tools. Added new 2 pages.".to_string()),
            Ok("Rust-Werkzeuge hinzugefügt. 2 neue Seiten.".to_string()),
        ]);
        let ai = Ai {
            languages: vec!["English".to_string(), "German".to_string()],
            ..Ai::default()
        };
        let summaries = Summarizer::new(Some(&service), &ai)
            .with_retry(no_delay(1))
            .summarize(&files(), 2);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].0, "German");
        assert!(service.prompts.borrow()[1].contains("Write the summary in German."));
    }

    #[test]
    fn without_a_service_the_rules_apply() {
        let summarizer = Summarizer::new(None, &Ai::default());
        assert_eq!(
            summarizer.summarize(&[], 0)[0].1,
            "Empty PDF. No files processed."
        );
        assert_eq!(
            summarizer.summarize(&files(), 1)[0].1,
            "2 Rust files. 1 pages."
        );
    }

    #[test]
    fn prompt_lists_at_most_twenty_files() {
        let files: Vec<PathBuf> = (0..25)
            .map(|i| PathBuf::from(format!("pkg/mod{i}.PY")))
            .collect();
        let prompt = prompt(&files, 40, "English");
        assert!(prompt.contains("Files (25 total, 40 pages):"));
        assert!(prompt.contains("- mod0.PY (.py)"));
        assert!(prompt.contains("- mod19.PY (.py)"));
        assert!(!prompt.contains("mod20.PY"));
        assert!(prompt.contains("...\n"));
    }

    #[test]
    fn title_file_layout() {
        let temp = TempDir::new().expect("can create temp dir");
        let pdf = temp.path().join("listing.pdf");
        let title = title_file_path(&pdf);
        assert_eq!(title, temp.path().join("listing_title.txt"));

        write_title_file(
            &title,
            &pdf,
            12,
            4,
            &[("English".to_string(), "4 Python files. 12 pages.".to_string())],
        )
        .expect("can write");
        temp.child("listing_title.txt").assert(
            "PDF: listing.pdf\nPages: 12\nFiles: 4\nSummary: 4 Python files. 12 pages.\n",
        );

        write_title_file(
            &title,
            &pdf,
            1,
            1,
            &[
                ("English".to_string(), "a".to_string()),
                ("French".to_string(), "b".to_string()),
            ],
        )
        .expect("can write");
        temp.child("listing_title.txt").assert(
            "PDF: listing.pdf\nPages: 1\nFiles: 1\nSummary (English): a\nSummary (French): b\n",
        );
    }
}
