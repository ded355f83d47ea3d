//! Finding and loading the files that may go into a listing.

use crate::config::Configuration;
use crate::error::Error;
use crate::estimate::PageMetrics;
use crate::ignore_list::{slash_path, IgnoreList};
use crate::selection::{CandidateFile, SkipReason, SkippedFile};
use ignore::WalkBuilder;
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Scratch and log files that are never worth printing.
const SKIPPED_SUFFIXES: [&str; 3] = [".tmp", ".log", ".cache"];

/// Walks the code folder and returns the paths (relative to it) of every
/// file that should be considered, sorted.
pub fn discover(config: &Configuration, ignore: Option<&IgnoreList>) -> Result<Vec<PathBuf>, Error> {
    let root = canonical(&config.code_folder).ok_or_else(|| {
        Error::configuration(format!(
            "code folder `{}` isn't accessible",
            config.code_folder.display()
        ))
    })?;

    let extensions: HashSet<String> = config
        .discovery
        .extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();
    let output_folder = canonical(&config.output_folder);
    let ignore_file = canonical(&config.ignore_file);

    let respect_gitignore = config.discovery.respect_gitignore;
    let walker = WalkBuilder::new(&root)
        .hidden(false)
        .parents(respect_gitignore)
        .ignore(respect_gitignore)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore)
        .git_exclude(respect_gitignore)
        .require_git(false)
        .filter_entry(move |entry| {
            let is_git_dir =
                entry.file_type().is_some_and(|t| t.is_dir()) && entry.file_name() == ".git";
            !is_git_dir
                && output_folder
                    .as_deref()
                    .map_or(true, |out| entry.path() != out)
        })
        .build();

    let mut paths: Vec<PathBuf> = Vec::default();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("failed to walk code folder: {e}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if ignore_file.as_deref() == Some(entry.path()) {
            continue;
        }

        // hidden directories are walked, hidden files are not
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || SKIPPED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            continue;
        }
        let extension = entry
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !extensions.contains(&extension) {
            continue;
        }

        let Ok(rel) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let rel_str = slash_path(rel);
        if ignore.is_some_and(|list| list.matches(&rel_str)) {
            tracing::debug!(path = rel_str, "skipping ignored file");
            continue;
        }
        paths.push(PathBuf::from(rel_str));
    }

    paths.sort();
    tracing::info!(root = %root.display(), files = paths.len(), "discovered files");
    Ok(paths)
}

/// Reads every path under `root`, estimating its footprint. Files that can't
/// be read are reported as skipped rather than failing the run.
pub fn load_candidates(
    root: &Path,
    paths: &[PathBuf],
    metrics: &PageMetrics,
    progress: &ProgressBar,
) -> (Vec<CandidateFile>, Vec<SkippedFile>) {
    let mut candidates = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::default();

    for path in paths {
        progress.set_message(path.display().to_string());
        match load(root, path, metrics) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                let cause = match &e {
                    Error::FileAccess { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                tracing::warn!("{e}: {cause}");
                unreadable.push(SkippedFile {
                    path: path.clone(),
                    reason: SkipReason::Unreadable(cause),
                });
            }
        }
        progress.inc(1);
    }

    (candidates, unreadable)
}

fn load(root: &Path, path: &Path, metrics: &PageMetrics) -> Result<CandidateFile, Error> {
    let full = root.join(path);
    let bytes = std::fs::read(&full).map_err(|e| Error::FileAccess {
        path: full.clone(),
        source: e,
    })?;
    let contents = decode(bytes);

    let rendered_lines = metrics.rendered_lines(&contents);
    Ok(CandidateFile {
        path: path.to_path_buf(),
        line_count: contents.lines().count(),
        rendered_lines,
        estimated_pages: metrics.estimate(rendered_lines),
        contents,
    })
}

/// UTF-8, or Latin-1 when the bytes aren't valid UTF-8.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(path).ok()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    fn tree() -> TempDir {
        let temp = TempDir::new().expect("can create temp dir");
        for (path, contents) in [
            ("main.py", "print('hi')\n"),
            ("src/lib.rs", "pub fn f() {}\n"),
            ("src/App.JSX", "export default 1;\n"),
            ("assets/site.css", "body {}\n"),
            ("other/assets/x.css", "a {}\n"),
            ("debug.log", "log\n"),
            ("notes.md.tmp", "tmp\n"),
            ("image.png", "not text"),
            (".hidden.py", "x = 1\n"),
            (".config/settings.json", "{}\n"),
            (".config/.secret.json", "{}\n"),
            (".git/config.json", "{}\n"),
            ("output/old.txt", "previous run\n"),
            ("processed_files.txt", "main.py\n"),
        ] {
            temp.child(path).write_str(contents).expect("can write file");
        }
        temp
    }

    fn config_for(temp: &TempDir) -> Configuration {
        Configuration {
            code_folder: temp.path().to_path_buf(),
            output_folder: temp.path().join("output"),
            ignore_file: temp.path().join("processed_files.txt"),
            ..Configuration::default()
        }
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| slash_path(p)).collect()
    }

    #[test]
    fn discovers_allowed_files_sorted() {
        let temp = tree();
        let paths = discover(&config_for(&temp), None).expect("can discover");
        assert_eq!(
            names(&paths),
            vec![
                ".config/settings.json",
                "assets/site.css",
                "main.py",
                "other/assets/x.css",
                "src/App.JSX",
                "src/lib.rs",
            ]
        );
    }

    #[test]
    fn ignore_list_excludes_matches() {
        let temp = tree();
        temp.child("processed_files.txt")
            .write_str("main.py\nassets/*\n*.rs\n")
            .expect("can write ignore file");
        let config = config_for(&temp);
        let list = IgnoreList::load(&config.ignore_file, temp.path()).expect("can load");
        let paths = discover(&config, Some(&list)).expect("can discover");
        assert_eq!(
            names(&paths),
            vec![".config/settings.json", "other/assets/x.css", "src/App.JSX"]
        );
    }

    #[test]
    fn gitignore_is_only_honoured_when_asked() {
        let temp = tree();
        temp.child(".gitignore")
            .write_str("src/\n")
            .expect("can write gitignore");
        let mut config = config_for(&temp);
        assert!(names(&discover(&config, None).expect("can discover"))
            .contains(&"src/lib.rs".to_string()));

        config.discovery.respect_gitignore = true;
        assert!(!names(&discover(&config, None).expect("can discover"))
            .contains(&"src/lib.rs".to_string()));
    }

    #[test]
    fn loads_utf8_and_latin1() {
        let temp = TempDir::new().expect("can create temp dir");
        temp.child("a.txt").write_str("caf\u{e9}\nline 2\n").expect("can write");
        temp.child("b.txt")
            .write_binary(&[b'c', b'a', b'f', 0xE9, b'\n'])
            .expect("can write");

        let config = Configuration::default();
        let metrics = PageMetrics::from_config(&config);
        let paths = vec![
            PathBuf::from("a.txt"),
            PathBuf::from("b.txt"),
            PathBuf::from("missing.txt"),
        ];
        let (candidates, skipped) =
            load_candidates(temp.path(), &paths, &metrics, &ProgressBar::hidden());

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].contents, "caf\u{e9}\nline 2\n");
        assert_eq!(candidates[0].line_count, 2);
        assert_eq!(candidates[1].contents, "caf\u{e9}\n");
        assert!(candidates[0].estimated_pages > 0.0);

        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path, PathBuf::from("missing.txt"));
        assert!(matches!(skipped[0].reason, SkipReason::Unreadable(_)));
    }
}
