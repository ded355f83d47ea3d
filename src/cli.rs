use crate::config::{Overrides, DEFAULT_CONFIG_FILE};
use clap::Parser;
use std::path::PathBuf;

/// Prints a page-budgeted selection of a source tree as a PDF listing
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output PDF file name
    #[arg(long)]
    pub filename: Option<String>,

    /// Title printed on the first page
    #[arg(long)]
    pub title: Option<String>,

    /// Number of pages to aim for
    #[arg(long)]
    pub pages: Option<u32>,

    /// Maximum number of files to include
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Pages the listing may run past the target
    #[arg(long)]
    pub overrun: Option<u32>,

    /// Folder to list files from
    #[arg(long)]
    pub code_folder: Option<PathBuf>,

    /// Folder to write the PDF and title file to
    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    /// File listing already printed paths and ignore patterns
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Consider every file, even those on the ignore list
    #[arg(long)]
    pub no_ignore: bool,

    /// Add the listed files to the ignore list afterwards
    #[arg(long)]
    pub update_ignore: bool,

    /// Skip the summary service and use the rule-based summary
    #[arg(long)]
    pub no_ai: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Log more (-v for progress details, -vv for debugging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            title: self.title.clone(),
            filename: self.filename.clone(),
            pages: self.pages,
            overrun: self.overrun,
            max_files: self.max_files,
            code_folder: self.code_folder.clone(),
            output_folder: self.output_folder.clone(),
            ignore_file: self.ignore_file.clone(),
            update_ignore: self.update_ignore,
            no_ai: self.no_ai,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "src-pages",
            "--pages",
            "12",
            "--overrun",
            "0",
            "--max-files",
            "4",
            "--title",
            "Week 3",
            "--update-ignore",
            "--no-ai",
            "-vv",
        ])
        .expect("can parse");
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(cli.verbose, 2);

        let overrides = cli.overrides();
        assert_eq!(overrides.pages, Some(12));
        assert_eq!(overrides.overrun, Some(0));
        assert_eq!(overrides.max_files, Some(4));
        assert_eq!(overrides.title.as_deref(), Some("Week 3"));
        assert!(overrides.update_ignore);
        assert!(overrides.no_ai);
        assert!(overrides.filename.is_none());
    }

    #[test]
    fn rejects_non_numeric_pages() {
        assert!(Cli::try_parse_from(["src-pages", "--pages", "many"]).is_err());
    }
}
