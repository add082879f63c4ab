//! File reference extraction from free-form user input.
//!
//! [`FileExtractor`] scans a prompt for path-like substrings, resolves them to
//! absolute paths, and returns the prompt with the references removed plus a
//! sorted, deduplicated list of [`ExtractedFile`]s. Problems are reported as
//! [`PathWarning`]s and never abort extraction.

use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Extensions recognized for bare filenames like `notes.txt`.
const KNOWN_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "csv", "tsv", "json", "jsonl", "yaml", "yml", "toml", "xml",
    "html", "htm", "css", "js", "ts", "tsx", "jsx", "py", "rs", "go", "java", "c", "h", "cpp",
    "hpp", "cs", "rb", "php", "sh", "bash", "zsh", "sql", "log", "ini", "cfg", "conf", "env",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "png", "jpg", "jpeg", "gif", "svg", "webp",
];

/// Characters that never appear in a path we are willing to attach.
const UNSAFE_CHARS: &[char] = &['<', '>', '|', '*', '?', '\n', '\r'];

/// One pattern category. Categories run in order; earlier ones claim spans first.
struct Category {
    regex: Regex,
    /// Remove the whole match (quotes, scheme) rather than just the path.
    strip_whole_match: bool,
}

static CATEGORIES: LazyLock<Vec<Category>> = LazyLock::new(|| {
    let extensions = KNOWN_EXTENSIONS.join("|");
    let category = |pattern: &str, strip_whole_match: bool| Category {
        regex: Regex::new(pattern).expect("file reference pattern must compile"),
        strip_whole_match,
    };
    vec![
        // "path/to/file.ext" or 'path/to/file.ext'
        category(
            r#""([^"\n]+\.[A-Za-z0-9]+)"|'([^'\n]+\.[A-Za-z0-9]+)'"#,
            true,
        ),
        // file:///path/to/file.ext
        category(r"(?i)file://(\S+)", true),
        // C:\path\file.ext
        category(r"\b([A-Za-z]:[/\\][\w\-./\\]*\.[A-Za-z0-9]+)\b", false),
        // /absolute/path/file.ext
        category(r"(?:^|\s)(/[\w\-./]*\.[A-Za-z0-9]+)\b", false),
        // ~/docs/file.pdf, ./file.txt, ../file.txt
        category(
            r"(?:^|\s)((?:~[\w\-]*|\.{1,2})/[\w\-./]*\.[A-Za-z0-9]+)\b",
            false,
        ),
        // notes/todo.txt, report.pdf
        category(
            &format!(r"(?:^|\s)([\w\-][\w\-./]*\.(?i:{extensions}))\b"),
            false,
        ),
    ]
});

/// A file referenced in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Absolute, resolved path.
    pub path: PathBuf,
    /// Whether the path names an existing regular file.
    pub exists: bool,
}

/// Non-fatal problems found while extracting references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathWarning {
    #[error("Could not resolve {candidate}: {reason}")]
    Unresolvable { candidate: String, reason: String },
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),
}

/// Output of [`FileExtractor::extract`].
#[derive(Debug, Default)]
pub struct Extraction {
    /// Prompt with attached references removed and whitespace collapsed.
    pub text: String,
    /// Sorted by path, no duplicates.
    pub files: Vec<ExtractedFile>,
    pub warnings: Vec<PathWarning>,
}

impl Extraction {
    /// Paths of the references that exist and can be attached.
    pub fn attachable(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.exists)
            .map(|f| f.path.clone())
            .collect()
    }
}

/// Pulls file references out of prompts.
pub struct FileExtractor {
    /// Directory relative references are resolved against.
    base_dir: PathBuf,
    home_dir: Option<PathBuf>,
    /// Remove candidates that fail to resolve from the cleaned text.
    strip_unresolved: bool,
}

impl FileExtractor {
    pub fn new(base_dir: PathBuf, strip_unresolved: bool) -> Self {
        Self {
            base_dir,
            home_dir: dirs::home_dir(),
            strip_unresolved,
        }
    }

    #[cfg(test)]
    pub fn with_home_dir(mut self, home: Option<PathBuf>) -> Self {
        self.home_dir = home;
        self
    }

    /// Extracts file references from `prompt`.
    ///
    /// Each category scans the text left over by the previous ones. Matches
    /// within a category are handled last-to-first so removing a span keeps
    /// the byte offsets of the remaining matches valid.
    pub fn extract(&self, prompt: &str) -> Extraction {
        let mut cleaned = prompt.to_string();
        let mut found: BTreeMap<PathBuf, bool> = BTreeMap::new();
        let mut warnings = Vec::new();

        for category in CATEGORIES.iter() {
            let spans: Vec<(Range<usize>, String)> = category
                .regex
                .captures_iter(&cleaned)
                .filter_map(|caps| {
                    let path = caps.iter().skip(1).flatten().next()?;
                    let span = if category.strip_whole_match {
                        caps.get(0)?.range()
                    } else {
                        path.range()
                    };
                    Some((span, path.as_str().to_string()))
                })
                .collect();

            for (span, candidate) in spans.into_iter().rev() {
                if !is_path_like(&candidate) {
                    continue;
                }
                let strip = match self.resolve(&candidate) {
                    Ok(path) => {
                        let is_file = path.is_file();
                        let first_sighting = found.insert(path.clone(), is_file).is_none();
                        if first_sighting && !is_file {
                            let warning = if path.exists() {
                                PathWarning::NotAFile(path)
                            } else {
                                PathWarning::NotFound(path)
                            };
                            tracing::warn!(%warning, "file reference not attachable");
                            warnings.push(warning);
                        }
                        is_file
                    }
                    Err(reason) => {
                        tracing::warn!(%candidate, %reason, "unresolvable file reference");
                        warnings.push(PathWarning::Unresolvable { candidate, reason });
                        self.strip_unresolved
                    }
                };
                if strip {
                    cleaned.replace_range(span, "");
                }
            }
        }

        Extraction {
            text: cleaned.split_whitespace().collect::<Vec<_>>().join(" "),
            files: found
                .into_iter()
                .map(|(path, exists)| ExtractedFile { path, exists })
                .collect(),
            warnings,
        }
    }

    /// Expands `~` and turns `candidate` into an absolute path.
    ///
    /// Existing paths are canonicalized so symlinks and `..` collapse to one
    /// spelling; missing ones are normalized lexically.
    fn resolve(&self, candidate: &str) -> Result<PathBuf, String> {
        if is_drive_path(candidate) && !cfg!(windows) {
            return Err("drive-letter paths are not supported on this platform".into());
        }

        let expanded = if let Some(rest) = candidate.strip_prefix('~') {
            let home = self
                .home_dir
                .as_ref()
                .ok_or_else(|| "home directory is unknown".to_string())?;
            match rest.strip_prefix(['/', '\\']) {
                Some(tail) => home.join(tail),
                None if rest.is_empty() => home.clone(),
                None => return Err("~user expansion is not supported".into()),
            }
        } else {
            PathBuf::from(candidate)
        };

        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            self.base_dir.join(expanded)
        };

        Ok(absolute
            .canonicalize()
            .unwrap_or_else(|_| normalize_lexically(&absolute)))
    }
}

/// Rejects matches that cannot plausibly be a file the user meant to attach.
fn is_path_like(candidate: &str) -> bool {
    if candidate.chars().count() < 2 {
        return false;
    }
    if candidate.contains(UNSAFE_CHARS) {
        return false;
    }
    if candidate.contains("://") {
        return false;
    }
    candidate.split_whitespace().count() <= 3
}

fn is_drive_path(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Resolves `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, FileExtractor) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/todo.txt"), "- [ ] buy milk\n").unwrap();
        fs::write(dir.path().join("report.pdf"), b"%PDF-1.4").unwrap();
        let base = dir.path().canonicalize().unwrap();
        let extractor = FileExtractor::new(base.clone(), false).with_home_dir(Some(base));
        (dir, extractor)
    }

    fn root(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().canonicalize().unwrap()
    }

    #[test]
    fn test_quoted_and_absolute_paths() {
        let (dir, extractor) = fixture();
        let report = root(&dir).join("report.pdf");
        let prompt = format!(
            "Please check \"notes/todo.txt\" and also {}",
            report.display()
        );

        let result = extractor.extract(&prompt);

        assert_eq!(result.text, "Please check and also");
        let paths: Vec<_> = result.files.iter().map(|f| f.path.clone()).collect();
        let mut expected = vec![root(&dir).join("notes/todo.txt"), report];
        expected.sort();
        assert_eq!(paths, expected);
        assert!(result.files.iter().all(|f| f.exists));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_several_matches_per_category_all_removed() {
        let (dir, extractor) = fixture();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("a.md"), "# a\n").unwrap();
        fs::write(dir.path().join("data/b.txt"), "b\n").unwrap();
        let a = root(&dir).join("a.md");
        let b = root(&dir).join("data/b.txt");
        let prompt = format!(
            "compare {} with {}, then \"notes/todo.txt\" and 'report.pdf' last",
            a.display(),
            b.display()
        );

        let result = extractor.extract(&prompt);

        assert_eq!(result.text, "compare with , then and last");
        let mut expected = vec![
            a,
            b,
            root(&dir).join("notes/todo.txt"),
            root(&dir).join("report.pdf"),
        ];
        expected.sort();
        assert_eq!(result.attachable(), expected);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_same_file_spelled_three_ways_counts_once() {
        let (dir, extractor) = fixture();
        let result =
            extractor.extract("./notes/todo.txt and notes/todo.txt and 'notes/../notes/todo.txt'");

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path, root(&dir).join("notes/todo.txt"));
        assert_eq!(result.text, "and and");
    }

    #[test]
    fn test_missing_file_is_reported_and_kept_in_text() {
        let (dir, extractor) = fixture();
        let result = extractor.extract("summarize missing.txt please");

        assert_eq!(result.text, "summarize missing.txt please");
        assert_eq!(
            result.files,
            vec![ExtractedFile {
                path: root(&dir).join("missing.txt"),
                exists: false,
            }]
        );
        assert!(matches!(result.warnings[0], PathWarning::NotFound(_)));
        assert!(result.attachable().is_empty());
    }

    #[test]
    fn test_missing_file_warned_once() {
        let (_dir, extractor) = fixture();
        let result = extractor.extract("gone.md and ./gone.md");
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_directory_is_not_attachable() {
        let (dir, extractor) = fixture();
        fs::create_dir(dir.path().join("notes/old.d")).unwrap();
        let result = extractor.extract("look in ./notes/old.d please");

        assert_eq!(result.text, "look in ./notes/old.d please");
        assert!(result.attachable().is_empty());
        assert!(matches!(result.warnings[0], PathWarning::NotAFile(_)));
    }

    #[test]
    fn test_unresolvable_kept_by_default() {
        let (_dir, extractor) = fixture();
        let result = extractor.extract("see ~nobody/plan.txt now");

        assert_eq!(result.text, "see ~nobody/plan.txt now");
        assert!(result.files.is_empty());
        assert!(matches!(
            result.warnings[0],
            PathWarning::Unresolvable { .. }
        ));
    }

    #[test]
    fn test_unresolvable_stripped_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = FileExtractor::new(dir.path().to_path_buf(), true)
            .with_home_dir(Some(dir.path().to_path_buf()));
        let result = extractor.extract("see ~nobody/plan.txt now");

        assert_eq!(result.text, "see now");
        assert!(result.files.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_home_expansion() {
        let (dir, extractor) = fixture();
        let result = extractor.extract("read ~/report.pdf");
        assert_eq!(result.text, "read");
        assert_eq!(result.files[0].path, root(&dir).join("report.pdf"));
    }

    #[test]
    fn test_no_home_is_unresolvable() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = FileExtractor::new(dir.path().to_path_buf(), false).with_home_dir(None);
        let result = extractor.extract("read ~/report.pdf");
        assert!(result.files.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_file_uri() {
        let (dir, extractor) = fixture();
        let uri = format!("file://{}", root(&dir).join("report.pdf").display());
        let result = extractor.extract(&format!("open {uri} now"));
        assert_eq!(result.text, "open now");
        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn test_urls_are_not_files() {
        let (_dir, extractor) = fixture();
        let result = extractor.extract("fetch \"https://example.com/index.html\" for me");
        assert!(result.files.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.text, "fetch \"https://example.com/index.html\" for me");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_drive_letter_unresolvable_off_windows() {
        let (_dir, extractor) = fixture();
        let result = extractor.extract(r"open C:\Users\me\notes.txt");
        assert!(result.files.is_empty());
        assert!(matches!(
            result.warnings[0],
            PathWarning::Unresolvable { .. }
        ));
    }

    #[test]
    fn test_plain_text_only_collapses_whitespace() {
        let (_dir, extractor) = fixture();
        let result = extractor.extract("  hello    world \n again ");
        assert_eq!(result.text, "hello world again");
        assert!(result.files.is_empty());
    }

    #[test]
    fn test_path_like_filter() {
        assert!(!is_path_like("a"));
        assert!(!is_path_like("a*.txt"));
        assert!(!is_path_like("http://x/y.txt"));
        assert!(!is_path_like("one two three four.txt"));
        assert!(is_path_like("my notes.txt"));
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d.txt")),
            PathBuf::from("/a/c/d.txt")
        );
    }
}
