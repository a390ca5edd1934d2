//! [`IgnoreRules`]: the exclusion rule set for a single directory sync.

use std::fs;
use std::io;
use std::path::Path;

use ignore::gitignore::Gitignore;
use tracing::{debug, warn};

use crate::error::IgnoreResult;
use crate::matcher::{compile, is_match, parse_patterns};
use crate::IGNORE_FILE_NAME;

/// An ordered set of exclusion patterns.
///
/// A path is excluded when *any* pattern matches it. Rule sets are cheap to
/// build and are meant to be loaded fresh for every sync, then dropped.
#[derive(Clone, Debug)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    matcher: Gitignore,
}

impl IgnoreRules {
    /// A rule set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            matcher: Gitignore::empty(),
        }
    }

    /// Build a rule set from already-split patterns.
    ///
    /// Fails on the first pattern that does not compile or that is negated.
    pub fn from_patterns<I, S>(patterns: I) -> IgnoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let matcher = compile(&patterns)?;
        Ok(Self { patterns, matcher })
    }

    /// Build a rule set from the text of an ignore file.
    pub fn parse(text: &str) -> IgnoreResult<Self> {
        Self::from_patterns(parse_patterns(text))
    }

    /// Read `<directory_root>/.replicateignore`.
    ///
    /// Returns `Ok(None)` when the file does not exist. Unreadable, non-UTF-8
    /// and malformed files are errors.
    pub fn read(directory_root: &Path) -> IgnoreResult<Option<Self>> {
        let path = directory_root.join(IGNORE_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load the rule set for a sync rooted at `directory_root`.
    ///
    /// Never fails: a missing file yields an empty set, and an unreadable or
    /// malformed one is logged and also yields an empty set, so the sync still
    /// uploads everything.
    pub fn load(directory_root: &Path) -> Self {
        match Self::read(directory_root) {
            Ok(Some(rules)) => {
                debug!(
                    root = %directory_root.display(),
                    patterns = rules.len(),
                    "loaded ignore rules"
                );
                rules
            }
            Ok(None) => {
                debug!(root = %directory_root.display(), "no ignore file");
                Self::empty()
            }
            Err(e) => {
                warn!(
                    root = %directory_root.display(),
                    error = %e,
                    "ignoring unusable {IGNORE_FILE_NAME}; syncing without exclusions"
                );
                Self::empty()
            }
        }
    }

    /// Returns `true` if the file at `relative_path` must be skipped.
    ///
    /// `relative_path` is `/`-separated and relative to the sync root.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        !self.is_empty() && is_match(&self.matcher, relative_path, false)
    }

    /// Returns `true` if the directory at `relative_path` must be skipped
    /// along with everything under it.
    pub fn is_excluded_dir(&self, relative_path: &str) -> bool {
        !self.is_empty() && is_match(&self.matcher, relative_path, true)
    }

    /// The patterns in file order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IgnoreError;
    use tempfile::TempDir;

    const FIXTURE: &str = "\n# this is a comment\nbaz.txt\n*.xyz\n";

    fn write_ignore(dir: &TempDir, contents: &[u8]) {
        fs::write(dir.path().join(IGNORE_FILE_NAME), contents).unwrap();
    }

    #[test]
    fn empty_excludes_nothing() {
        let rules = IgnoreRules::empty();
        assert!(rules.is_empty());
        assert!(!rules.is_excluded("foo.txt"));
        assert!(!rules.is_excluded_dir("bar"));
    }

    #[test]
    fn parse_keeps_file_order() {
        let rules = IgnoreRules::parse(FIXTURE).unwrap();
        assert_eq!(rules.patterns(), ["baz.txt", "*.xyz"]);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn any_pattern_excludes() {
        let rules = IgnoreRules::parse(FIXTURE).unwrap();
        assert!(!rules.is_excluded("foo.txt"));
        assert!(rules.is_excluded("bar/baz.txt"));
        assert!(rules.is_excluded("bar/quux.xyz"));
        assert!(!rules.is_excluded("bar/new-qux.txt"));
        assert!(rules.is_excluded("qux.xyz"));
    }

    #[test]
    fn excluded_dir_prunes_contents() {
        let rules = IgnoreRules::from_patterns(["build/"]).unwrap();
        assert!(rules.is_excluded_dir("build"));
        assert!(rules.is_excluded("build/out/app.bin"));
        assert!(!rules.is_excluded("build.rs"));
    }

    #[test]
    fn from_patterns_rejects_negation() {
        let err = IgnoreRules::from_patterns(["*.log", "!keep.log"]).unwrap_err();
        assert!(matches!(err, IgnoreError::NegationUnsupported(_)));
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(IgnoreRules::read(dir.path()).unwrap().is_none());
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(IgnoreRules::load(dir.path()).is_empty());
    }

    #[test]
    fn load_reads_ignore_file() {
        let dir = TempDir::new().unwrap();
        write_ignore(&dir, FIXTURE.as_bytes());

        let rules = IgnoreRules::load(dir.path());
        assert_eq!(rules.len(), 2);
        assert!(rules.is_excluded("bar/baz.txt"));
    }

    #[test]
    fn load_malformed_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        write_ignore(&dir, b"ok.txt\na{b\n");

        assert!(IgnoreRules::read(dir.path()).is_err());
        let rules = IgnoreRules::load(dir.path());
        assert!(rules.is_empty());
        assert!(!rules.is_excluded("ok.txt"));
    }

    #[test]
    fn load_non_utf8_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        write_ignore(&dir, &[0xff, 0xfe, b'\n', b'x']);

        assert!(matches!(
            IgnoreRules::read(dir.path()),
            Err(IgnoreError::Io(_))
        ));
        assert!(IgnoreRules::load(dir.path()).is_empty());
    }

    #[test]
    fn load_sees_fresh_contents() {
        let dir = TempDir::new().unwrap();
        write_ignore(&dir, b"*.log\n");
        assert!(IgnoreRules::load(dir.path()).is_excluded("a.log"));

        write_ignore(&dir, b"*.tmp\n");
        let rules = IgnoreRules::load(dir.path());
        assert!(!rules.is_excluded("a.log"));
        assert!(rules.is_excluded("a.tmp"));
    }
}
