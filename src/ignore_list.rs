//! The persisted list of files that shouldn't be listed again.
//!
//! The list is a plain text file with one entry per line. Blank lines and
//! `#` comments are ignored, lines containing `*` are patterns and anything
//! else is a path relative to the code folder. After a run, the files that
//! made it into the PDF can be appended under a timestamped header so the
//! next run picks up where this one left off.

use crate::error::Error;
use chrono::{DateTime, Local};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum IgnorePattern {
    /// `dir/*`: the directory itself and everything below it
    DirPrefix(String),
    /// `*.ext`: anything ending in `.ext`, at any depth
    Suffix(String),
    /// any other pattern containing `*`, where `*` also crosses `/`
    Wildcard(GlobMatcher),
}

impl IgnorePattern {
    /// Parses a pattern line. Returns `None` for lines that aren't patterns
    /// or that fail to compile.
    pub fn parse(line: &str) -> Option<IgnorePattern> {
        if !line.contains('*') {
            return None;
        }
        if let Some(dir) = line.strip_suffix("/*") {
            return Some(IgnorePattern::DirPrefix(dir.to_string()));
        }
        if let Some(ext) = line.strip_prefix('*').filter(|rest| rest.starts_with('.')) {
            return Some(IgnorePattern::Suffix(ext.to_string()));
        }
        match GlobBuilder::new(line).literal_separator(false).build() {
            Ok(glob) => Some(IgnorePattern::Wildcard(glob.compile_matcher())),
            Err(e) => {
                tracing::warn!(pattern = line, "ignoring invalid pattern: {e}");
                None
            }
        }
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        match self {
            IgnorePattern::DirPrefix(dir) => {
                rel_path == dir.as_str()
                    || rel_path
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            IgnorePattern::Suffix(ext) => rel_path.ends_with(ext.as_str()),
            IgnorePattern::Wildcard(glob) => glob.is_match(rel_path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IgnoreList {
    path: PathBuf,
    root: PathBuf,
    files: HashSet<String>,
    patterns: Vec<IgnorePattern>,
}

impl IgnoreList {
    /// An empty list that will be written to `path` if anything is recorded.
    pub fn empty<P: Into<PathBuf>, R: Into<PathBuf>>(path: P, root: R) -> IgnoreList {
        let root: PathBuf = root.into();
        IgnoreList {
            path: path.into(),
            root: std::fs::canonicalize(&root).unwrap_or(root),
            files: HashSet::default(),
            patterns: Vec::default(),
        }
    }

    /// Reads the list at `path`. A missing file is an empty list.
    pub fn load<P: Into<PathBuf>, R: Into<PathBuf>>(path: P, root: R) -> Result<IgnoreList, Error> {
        let mut list = IgnoreList::empty(path, root);
        let contents = match std::fs::read_to_string(&list.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %list.path.display(), "no ignore file yet");
                return Ok(list);
            }
            Err(e) => {
                return Err(Error::FileAccess {
                    path: list.path.clone(),
                    source: e,
                })
            }
        };

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.contains('*') {
                if let Some(pattern) = IgnorePattern::parse(line) {
                    list.patterns.push(pattern);
                }
            } else {
                let entry = list.relative(line);
                list.files.insert(entry);
            }
        }

        tracing::info!(
            path = %list.path.display(),
            files = list.files.len(),
            patterns = list.patterns.len(),
            "loaded ignore list"
        );
        Ok(list)
    }

    /// Number of exact entries and patterns.
    pub fn len(&self) -> usize {
        self.files.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `rel_path` (relative to the code folder, `/`-separated) is
    /// listed or matches a pattern.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.files.contains(rel_path) || self.patterns.iter().any(|p| p.matches(rel_path))
    }

    /// Appends the paths in `included` that aren't already listed, sorted and
    /// under a header stamped with `now`. Returns how many were added; the
    /// file is left alone when there is nothing new.
    pub fn record<P: AsRef<Path>>(
        &mut self,
        included: &[P],
        now: DateTime<Local>,
    ) -> Result<usize, Error> {
        let new: BTreeSet<String> = included
            .iter()
            .map(|p| slash_path(p.as_ref()))
            .filter(|p| !self.files.contains(p))
            .collect();
        if new.is_empty() {
            tracing::info!("no new files to add to the ignore list");
            return Ok(0);
        }

        let mut block = format!("\n# Files processed on {}\n", now.format("%Y-%m-%d %H:%M:%S"));
        for path in new.iter() {
            block.push_str(path);
            block.push('\n');
        }

        let to_access_error = |e| Error::FileAccess {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(to_access_error)?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_access_error)?;
        file.write_all(block.as_bytes()).map_err(to_access_error)?;

        let added = new.len();
        self.files.extend(new);
        tracing::info!(path = %self.path.display(), added, "updated ignore list");
        Ok(added)
    }

    /// Exact entries are stored relative to the code folder; absolute ones
    /// under it are rewritten.
    fn relative(&self, entry: &str) -> String {
        let path = Path::new(entry);
        if path.is_absolute() {
            let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if let Ok(rel) = path.strip_prefix(&self.root) {
                return slash_path(rel);
            }
        }
        entry.replace('\\', "/")
    }
}

/// Renders a relative path with `/` separators on every platform.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use chrono::TimeZone;

    fn pattern(line: &str) -> IgnorePattern {
        IgnorePattern::parse(line).expect("is a pattern")
    }

    #[test]
    fn suffix_patterns_match_at_any_depth() {
        let p = pattern("*.log");
        assert!(matches!(p, IgnorePattern::Suffix(_)));
        assert!(p.matches("debug.log"));
        assert!(p.matches("a/b/c.log"));
        assert!(!p.matches("log.txt"));
    }

    #[test]
    fn directory_patterns_match_from_the_start() {
        let p = pattern("assets/*");
        assert!(matches!(p, IgnorePattern::DirPrefix(_)));
        assert!(p.matches("assets/x.css"));
        assert!(p.matches("assets/deep/y.png"));
        assert!(p.matches("assets"));
        assert!(!p.matches("other/assets/x.css"));
        assert!(!p.matches("assets2/x.css"));
    }

    #[test]
    fn wildcards_cross_directories() {
        let p = pattern("*test*");
        assert!(matches!(p, IgnorePattern::Wildcard(_)));
        assert!(p.matches("src/tests/a.py"));
        assert!(p.matches("my_test.py"));
        assert!(!p.matches("src/main.py"));

        let p = pattern("src/*.min.js");
        assert!(p.matches("src/vendor/jquery.min.js"));
        assert!(!p.matches("lib/jquery.min.js"));
    }

    #[test]
    fn plain_lines_are_not_patterns() {
        assert!(IgnorePattern::parse("src/main.rs").is_none());
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().expect("can create temp dir");
        let list = IgnoreList::load(temp.path().join("nope.txt"), temp.path())
            .expect("missing file is fine");
        assert!(list.is_empty());
        assert!(!list.matches("anything.py"));
    }

    #[test]
    fn loads_entries_and_patterns() {
        let temp = TempDir::new().expect("can create temp dir");
        let ignore = temp.child("processed.txt");
        let root = std::fs::canonicalize(temp.path()).expect("can canonicalize");
        let absolute = root.join("abs").join("file.py");
        ignore
            .write_str(&format!(
                "# comment\n\n  src/a.py  \n*.log\nbuild/*\n{}\n",
                absolute.display()
            ))
            .expect("can write ignore file");

        let list = IgnoreList::load(ignore.path(), temp.path()).expect("can load");
        assert_eq!(list.len(), 4);
        assert!(list.matches("src/a.py"));
        assert!(list.matches("abs/file.py"));
        assert!(list.matches("x/debug.log"));
        assert!(list.matches("build/out.js"));
        assert!(!list.matches("src/b.py"));
        assert!(!list.matches("# comment"));
    }

    #[test]
    fn absolute_entries_resolve_against_a_relative_root() {
        let temp = TempDir::new().expect("can create temp dir");
        let ignore = temp.child("processed.txt");
        let cwd = std::env::current_dir().expect("has a working directory");
        ignore
            .write_str(&format!("{}\n", cwd.join("src").join("main.rs").display()))
            .expect("can write ignore file");

        let list = IgnoreList::load(ignore.path(), ".").expect("can load");
        assert!(list.matches("src/main.rs"));
    }

    #[test]
    fn record_appends_new_files_under_a_header() {
        let temp = TempDir::new().expect("can create temp dir");
        let ignore = temp.child("processed.txt");
        ignore.write_str("src/a.py\n").expect("can write ignore file");
        let now = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .expect("valid time");

        let mut list = IgnoreList::load(ignore.path(), temp.path()).expect("can load");
        let added = list
            .record(
                &[
                    PathBuf::from("src/c.py"),
                    PathBuf::from("src/a.py"),
                    PathBuf::from("src/b.py"),
                ],
                now,
            )
            .expect("can record");
        assert_eq!(added, 2);
        ignore.assert("src/a.py\n\n# Files processed on 2024-03-09 14:05:07\nsrc/b.py\nsrc/c.py\n");

        let reloaded = IgnoreList::load(ignore.path(), temp.path()).expect("can reload");
        assert!(reloaded.matches("src/b.py"));
        assert!(reloaded.matches("src/c.py"));
    }

    #[test]
    fn record_leaves_the_file_alone_when_nothing_is_new() {
        let temp = TempDir::new().expect("can create temp dir");
        let ignore = temp.child("processed.txt");
        ignore.write_str("src/a.py\n").expect("can write ignore file");

        let mut list = IgnoreList::load(ignore.path(), temp.path()).expect("can load");
        let added = list
            .record(&[PathBuf::from("src/a.py")], Local::now())
            .expect("can record");
        assert_eq!(added, 0);
        ignore.assert("src/a.py\n");
    }

    #[test]
    fn record_creates_the_file() {
        let temp = TempDir::new().expect("can create temp dir");
        let mut list = IgnoreList::empty(temp.path().join("out").join("list.txt"), temp.path());
        list.record(&[PathBuf::from("main.go")], Local::now())
            .expect("can record");
        let contents =
            std::fs::read_to_string(temp.path().join("out").join("list.txt")).expect("exists");
        assert!(contents.starts_with("\n# Files processed on "));
        assert!(contents.ends_with("\nmain.go\n"));
    }
}
