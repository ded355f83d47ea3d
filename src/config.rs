use crate::error::Error;
use crate::estimate::PageMetrics;
use crate::selection::{Budget, BudgetBuilder};
use crate::sinks::fonts;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "src-pages.toml";

/// Smallest code line width we are willing to lay out; narrower pages wrap
/// almost every line and make the continuation indent meaningless.
const MIN_CHARS_PER_LINE: usize = 20;

/// Longest initial delay between summary service retries, in seconds.
pub const MAX_RETRY_DELAY_SECS: f32 = 60.0;

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub enum PageSize {
    #[default]
    #[serde(rename = "A4", alias = "a4")]
    A4,
    #[serde(rename = "letter", alias = "Letter")]
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.2756, 841.8898),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::A4 => write!(f, "A4"),
            PageSize::Letter => write!(f, "letter"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// A font family (one of the PDF base-14 names) and a size in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    #[serde(default)]
    pub alignment: Alignment,
}

impl FontSpec {
    fn new(family: &str, size: f32) -> FontSpec {
        FontSpec {
            family: family.to_string(),
            size,
            alignment: Alignment::Left,
        }
    }

    /// Vertical distance between consecutive baselines.
    pub fn leading(&self) -> f32 {
        self.size * 1.2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub title: FontSpec,
    pub file_path: FontSpec,
    pub code: FontSpec,
}

impl Default for Fonts {
    fn default() -> Self {
        Fonts {
            title: FontSpec {
                alignment: Alignment::Center,
                ..FontSpec::new("Helvetica-Bold", 18.0)
            },
            file_path: FontSpec::new("Helvetica-Bold", 12.0),
            code: FontSpec::new("Courier", 8.0),
        }
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: 72.0,
            bottom: 72.0,
            left: 72.0,
            right: 72.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub page_size: PageSize,
    /// Colour code with syntax highlighting where the extension is known
    #[serde(default = "default_true")]
    pub highlight: bool,
    /// Print a page number in the bottom margin
    #[serde(default = "default_true")]
    pub page_numbers: bool,
    #[serde(default)]
    pub margins: Margins,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            page_size: PageSize::default(),
            highlight: true,
            page_numbers: true,
            margins: Margins::default(),
        }
    }
}

/// Per-run defaults, most of which can be overridden from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    /// Target page count
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// How many pages past the target a selection may run
    #[serde(default = "default_max_overrun_pages")]
    pub max_overrun_pages: u32,
    #[serde(default)]
    pub max_files: Option<usize>,
    /// Append the included files to the ignore file after a successful run
    #[serde(default)]
    pub update_ignore: bool,
}

fn default_title() -> String {
    "Source Code Listing".to_string()
}
fn default_filename() -> String {
    "code_listing.pdf".to_string()
}
fn default_pages() -> u32 {
    20
}
fn default_max_overrun_pages() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            title: default_title(),
            filename: default_filename(),
            pages: default_pages(),
            max_overrun_pages: default_max_overrun_pages(),
            max_files: None,
            update_ignore: false,
        }
    }
}

/// Which files the discoverer considers at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Discovery {
    /// Lower-case extensions (without the dot) of files that count as code
    pub extensions: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for Discovery {
    fn default() -> Self {
        let extensions = [
            "py", "js", "html", "css", "php", "java", "cpp", "c", "h", "json", "xml", "yaml",
            "yml", "md", "txt", "sh", "bash", "sql", "r", "rb", "go", "rs", "swift", "kt",
            "scala", "ts", "jsx", "tsx", "vue", "svelte", "pug", "styl",
        ];
        Discovery {
            extensions: extensions.iter().map(ToString::to_string).collect(),
            respect_gitignore: false,
        }
    }
}

/// Summary service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ai {
    pub enabled: bool,
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// One summary is produced per language
    pub languages: Vec<String>,
    /// Total attempts per summary, including the first
    pub retry_attempts: u32,
    /// Delay before the first retry; doubles on every further retry
    pub retry_delay_secs: f32,
}

impl Default for Ai {
    fn default() -> Self {
        Ai {
            enabled: true,
            api_key: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: None,
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 50,
            temperature: 0.3,
            languages: vec!["English".to_string()],
            retry_attempts: 3,
            retry_delay_secs: 1.0,
        }
    }
}

impl Ai {
    /// The configured key, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Complete configuration for a src-pages run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_code_folder")]
    pub code_folder: PathBuf,
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
    #[serde(default = "default_ignore_file")]
    pub ignore_file: PathBuf,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub fonts: Fonts,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub discovery: Discovery,
    #[serde(default)]
    pub ai: Ai,
}

fn default_code_folder() -> PathBuf {
    PathBuf::from(".")
}
fn default_output_folder() -> PathBuf {
    PathBuf::from("output")
}
fn default_ignore_file() -> PathBuf {
    PathBuf::from("processed_files.txt")
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            code_folder: default_code_folder(),
            output_folder: default_output_folder(),
            ignore_file: default_ignore_file(),
            defaults: Defaults::default(),
            fonts: Fonts::default(),
            layout: Layout::default(),
            discovery: Discovery::default(),
            ai: Ai::default(),
        }
    }
}

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub title: Option<String>,
    pub filename: Option<String>,
    pub pages: Option<u32>,
    pub overrun: Option<u32>,
    pub max_files: Option<usize>,
    pub code_folder: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub ignore_file: Option<PathBuf>,
    pub update_ignore: bool,
    pub no_ai: bool,
}

impl Configuration {
    /// Loads a configuration file, resolving the relative paths it contains
    /// against the directory the file lives in.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Configuration, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file `{}`: {e}",
                path.display()
            ))
        })?;
        let mut config: Configuration = toml::from_str(&contents).map_err(|e| {
            Error::configuration(format!(
                "failed to parse config file `{}`: {e}",
                path.display()
            ))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.code_folder = resolve(base, &config.code_folder);
        config.output_folder = resolve(base, &config.output_folder);
        config.ignore_file = resolve(base, &config.ignore_file);
        tracing::info!(path = %path.display(), "loaded configuration");

        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(title) = &overrides.title {
            self.defaults.title = title.clone();
        }
        if let Some(filename) = &overrides.filename {
            self.defaults.filename = filename.clone();
        }
        if let Some(pages) = overrides.pages {
            self.defaults.pages = pages;
        }
        if let Some(overrun) = overrides.overrun {
            self.defaults.max_overrun_pages = overrun;
        }
        if let Some(max_files) = overrides.max_files {
            self.defaults.max_files = Some(max_files);
        }
        if let Some(code_folder) = &overrides.code_folder {
            self.code_folder = code_folder.clone();
        }
        if let Some(output_folder) = &overrides.output_folder {
            self.output_folder = output_folder.clone();
        }
        if let Some(ignore_file) = &overrides.ignore_file {
            self.ignore_file = ignore_file.clone();
        }
        if overrides.update_ignore {
            self.defaults.update_ignore = true;
        }
        if overrides.no_ai {
            self.ai.enabled = false;
        }
    }

    /// Checks everything that can be checked before touching the code folder.
    pub fn validate(&self) -> Result<(), Error> {
        if self.defaults.pages == 0 {
            return Err(Error::configuration("`defaults.pages` must be at least 1"));
        }
        if self.defaults.max_files == Some(0) {
            return Err(Error::configuration(
                "`defaults.max_files` must be at least 1 when set",
            ));
        }

        for (section, font) in [
            ("title", &self.fonts.title),
            ("file_path", &self.fonts.file_path),
            ("code", &self.fonts.code),
        ] {
            if !(font.size > 0.0) {
                return Err(Error::configuration(format!(
                    "`fonts.{section}.size` must be positive"
                )));
            }
            if !fonts::is_base14(&font.family) {
                return Err(Error::configuration(format!(
                    "`fonts.{section}.family` must be one of {}; got `{}`",
                    fonts::BASE_14.join(", "),
                    font.family
                )));
            }
        }
        if !fonts::is_monospaced(&self.fonts.code.family) {
            return Err(Error::configuration(format!(
                "`fonts.code.family` must be a Courier face; got `{}`",
                self.fonts.code.family
            )));
        }

        let (width, height) = self.layout.page_size.dimensions();
        let margins = &self.layout.margins;
        if [margins.top, margins.bottom, margins.left, margins.right]
            .iter()
            .any(|m| *m < 0.0)
        {
            return Err(Error::configuration("margins cannot be negative"));
        }
        if width - margins.left - margins.right <= 0.0
            || height - margins.top - margins.bottom <= self.fonts.code.leading()
        {
            return Err(Error::configuration(format!(
                "margins leave no room for text on a {} page",
                self.layout.page_size
            )));
        }
        let metrics = PageMetrics::from_config(self);
        if metrics.max_chars_per_line < MIN_CHARS_PER_LINE {
            return Err(Error::configuration(format!(
                "only {} characters fit on a code line; at least {MIN_CHARS_PER_LINE} are needed",
                metrics.max_chars_per_line
            )));
        }

        if self.ai.retry_attempts == 0 {
            return Err(Error::configuration("`ai.retry_attempts` must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.ai.temperature) {
            return Err(Error::configuration(
                "`ai.temperature` must be between 0.0 and 1.0",
            ));
        }
        if !(0.0..=MAX_RETRY_DELAY_SECS).contains(&self.ai.retry_delay_secs) {
            return Err(Error::configuration(format!(
                "`ai.retry_delay_secs` must be between 0 and {MAX_RETRY_DELAY_SECS}"
            )));
        }

        if !self.code_folder.is_dir() {
            return Err(Error::configuration(format!(
                "code folder `{}` isn't a directory",
                self.code_folder.display()
            )));
        }

        Ok(())
    }

    pub fn budget(&self) -> Result<Budget, Error> {
        let mut builder = BudgetBuilder::default();
        builder
            .target_pages(self.defaults.pages)
            .max_overrun_pages(self.defaults.max_overrun_pages);
        if let Some(max_files) = self.defaults.max_files {
            builder.max_files(max_files);
        }
        builder
            .build()
            .map_err(|e| Error::configuration(format!("invalid page budget: {e}")))
    }

    /// Where the PDF is written. A filename already pointing into the output
    /// folder (or anywhere absolute) is used as-is.
    pub fn output_path(&self) -> PathBuf {
        let filename = PathBuf::from(&self.defaults.filename);
        let mut path = if filename.is_absolute() || filename.starts_with(&self.output_folder) {
            filename
        } else {
            self.output_folder.join(filename)
        };
        let ext = path
            .extension()
            .map(std::ffi::OsStr::to_ascii_lowercase)
            .unwrap_or_default();
        if ext != *"pdf" {
            path.set_extension("pdf");
        }
        path
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
