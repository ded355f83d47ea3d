//! Summaries built from file extensions alone, used whenever the summary
//! service is disabled or unavailable.

use std::path::PathBuf;

const EMPTY: &str = "Empty PDF. No files processed.";

/// Human-readable names for common extensions.
fn language_name(ext: &str) -> Option<&'static str> {
    let name = match ext {
        "js" => "JavaScript",
        "jsx" => "React JSX",
        "ts" => "TypeScript",
        "tsx" => "React TSX",
        "py" => "Python",
        "html" => "HTML",
        "css" => "CSS",
        "styl" => "Stylus",
        "pug" => "Pug templates",
        "json" => "JSON config",
        "md" => "Markdown",
        "txt" => "Text files",
        "sh" => "Shell scripts",
        "sql" => "SQL queries",
        "php" => "PHP",
        "java" => "Java",
        "cpp" => "C++",
        "c" => "C",
        "h" => "Header files",
        "xml" => "XML",
        "yaml" | "yml" => "YAML",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "scala" => "Scala",
        "vue" => "Vue.js",
        "svelte" => "Svelte",
        _ => return None,
    };
    Some(name)
}

fn display_name(ext: &str) -> String {
    language_name(ext)
        .map(ToString::to_string)
        .unwrap_or_else(|| ext.to_uppercase())
}

/// Hints added when any listed path mentions a well-known folder; the first
/// match wins.
const CONTEXT_HINTS: [(&str, &str); 4] = [
    ("components", " UI components included."),
    ("views", " Page templates included."),
    ("gulp", " Build scripts included."),
    ("assets", " Asset files included."),
];

/// Describes `files` by their three most common extensions, e.g.
/// `"3 Python, 1 CSS. 12 pages."`.
pub fn summarize(files: &[PathBuf], page_count: usize) -> String {
    if files.is_empty() {
        return EMPTY.to_string();
    }

    // first-seen order breaks ties between equally common extensions
    let mut counts: Vec<(String, usize)> = Vec::new();
    for file in files {
        let Some(ext) = file.extension() else {
            continue;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        match counts.iter_mut().find(|(e, _)| *e == ext) {
            Some((_, count)) => *count += 1,
            None => counts.push((ext, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(3);

    let mut summary = match counts.as_slice() {
        [] => format!("{} files. {page_count} pages.", files.len()),
        [(ext, 1)] => format!("Single {} file. {page_count} pages.", display_name(ext)),
        [(ext, count)] => format!("{count} {} files. {page_count} pages.", display_name(ext)),
        many => {
            let parts: Vec<String> = many
                .iter()
                .map(|(ext, count)| format!("{count} {}", display_name(ext)))
                .collect();
            format!("{}. {page_count} pages.", parts.join(", "))
        }
    };

    let paths: Vec<String> = files.iter().map(|f| f.to_string_lossy().into_owned()).collect();
    if let Some((_, hint)) = CONTEXT_HINTS
        .iter()
        .find(|(needle, _)| paths.iter().any(|p| p.contains(needle)))
    {
        summary.push_str(hint);
    }

    summary
}

#[cfg(test)]
mod test {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn empty_listing() {
        assert_eq!(summarize(&[], 0), "Empty PDF. No files processed.");
    }

    #[test]
    fn single_file() {
        assert_eq!(
            summarize(&paths(&["src/main.rs"]), 4),
            "Single Rust file. 4 pages."
        );
    }

    #[test]
    fn one_language() {
        assert_eq!(
            summarize(&paths(&["a.go", "b.go", "cmd/c.go", "d.go", "e.go"]), 9),
            "5 Go files. 9 pages."
        );
    }

    #[test]
    fn two_languages_most_common_first() {
        assert_eq!(
            summarize(&paths(&["style.css", "a.py", "b.py", "c.PY"]), 12),
            "3 Python, 1 CSS. 12 pages."
        );
    }

    #[test]
    fn at_most_three_languages_with_unknown_extensions_uppercased() {
        assert_eq!(
            summarize(
                &paths(&["a.py", "b.py", "c.js", "d.js", "e.zig", "f.md"]),
                7
            ),
            "2 Python, 2 JavaScript, 1 ZIG. 7 pages."
        );
    }

    #[test]
    fn context_hints() {
        assert_eq!(
            summarize(&paths(&["src/components/Button.jsx"]), 2),
            "Single React JSX file. 2 pages. UI components included."
        );
        assert_eq!(
            summarize(&paths(&["assets/site.css", "views/index.pug"]), 3),
            "1 CSS, 1 Pug templates. 3 pages. Page templates included."
        );
    }
}
