//! The pattern matcher behind [`IgnoreRules`](crate::IgnoreRules).
//!
//! Patterns use gitignore glob syntax compiled by the `ignore` crate:
//!
//! - A pattern without a `/` (ignoring a trailing one) matches the basename of
//!   a path, or of any of its parent directories, at any depth.
//! - A pattern containing a `/` is anchored at the sync root and matched
//!   against the full relative path.
//! - `*` stays within one path segment, `**` crosses segments.
//!
//! Everything here is pure: no filesystem access.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{IgnoreError, IgnoreResult};

/// Split ignore-file text into patterns.
///
/// Lines are trimmed; blank lines and lines starting with `#` are dropped.
pub fn parse_patterns(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Returns `true` if `pattern` excludes the file at `relative_path`.
///
/// A pattern that does not compile, such as `a{b` or `[z-a]`, matches
/// nothing.
///
/// # Examples
///
/// ```
/// use rpl_ignore::pattern_matches;
///
/// assert!(pattern_matches("baz.txt", "bar/baz.txt"));
/// assert!(pattern_matches("*.xyz", "bar/quux.xyz"));
/// assert!(!pattern_matches("*.xyz", "bar/new-qux.txt"));
/// assert!(pattern_matches("bar/*.txt", "bar/baz.txt"));
/// assert!(!pattern_matches("bar/*.txt", "other/bar/baz.txt"));
/// ```
pub fn pattern_matches(pattern: &str, relative_path: &str) -> bool {
    match compile([pattern]) {
        Ok(matcher) => is_match(&matcher, relative_path, false),
        Err(_) => false,
    }
}

/// Compile patterns into a single matcher.
///
/// Negated patterns are refused: with OR semantics there is nothing for a
/// re-include to override.
pub(crate) fn compile<I, S>(patterns: I) -> IgnoreResult<Gitignore>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = GitignoreBuilder::new(".");
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if pattern.starts_with('!') {
            return Err(IgnoreError::NegationUnsupported(pattern.to_string()));
        }
        builder
            .add_line(None, pattern)
            .map_err(|e| IgnoreError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
    }
    builder.build().map_err(|e| IgnoreError::InvalidPattern {
        pattern: String::new(),
        reason: e.to_string(),
    })
}

/// Match a relative path (or any of its parents) against a compiled matcher.
pub(crate) fn is_match(matcher: &Gitignore, relative_path: &str, is_dir: bool) -> bool {
    let path = strip_leading(relative_path);
    if path.is_empty() {
        return false;
    }
    matcher
        .matched_path_or_any_parents(Path::new(path), is_dir)
        .is_ignore()
}

/// Drop leading `/` and `./` so the matcher always sees a root-relative path.
fn strip_leading(mut path: &str) -> &str {
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blanks() {
        let text = "\n# this is a comment\nbaz.txt\n\n   \n*.xyz\n";
        assert_eq!(parse_patterns(text), vec!["baz.txt", "*.xyz"]);
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(parse_patterns("  build/  \r\n\t# indented comment\n"), vec!["build/"]);
    }

    #[test]
    fn bare_name_matches_basename_at_any_depth() {
        assert!(pattern_matches("baz.txt", "baz.txt"));
        assert!(pattern_matches("baz.txt", "bar/baz.txt"));
        assert!(pattern_matches("baz.txt", "a/b/c/baz.txt"));
        assert!(!pattern_matches("baz.txt", "bar/baz.txt.bak"));
        assert!(!pattern_matches("baz.txt", "bar/new-baz.txt"));
    }

    #[test]
    fn star_stays_in_one_segment() {
        assert!(pattern_matches("*.xyz", "qux.xyz"));
        assert!(pattern_matches("*.xyz", "bar/quux.xyz"));
        assert!(!pattern_matches("*.xyz", "foo.txt"));
        assert!(!pattern_matches("bar*", "foo/baz.txt"));
    }

    #[test]
    fn qualified_pattern_is_anchored() {
        assert!(pattern_matches("bar/*.txt", "bar/baz.txt"));
        assert!(!pattern_matches("bar/*.txt", "baz.txt"));
        assert!(!pattern_matches("bar/*.txt", "nested/bar/baz.txt"));
        assert!(!pattern_matches("bar/*.txt", "bar/deeper/baz.txt"));
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(pattern_matches("bar/**/*.txt", "bar/deeper/baz.txt"));
        assert!(pattern_matches("bar/**/*.txt", "bar/baz.txt"));
    }

    #[test]
    fn directory_pattern_excludes_contents() {
        assert!(pattern_matches("build/", "build/out.bin"));
        assert!(pattern_matches("build/", "src/build/out.bin"));
        assert!(pattern_matches("build", "build/nested/out.bin"));
        assert!(!pattern_matches("build/", "builder.rs"));
    }

    #[test]
    fn leading_separators_are_ignored() {
        assert!(pattern_matches("baz.txt", "/bar/baz.txt"));
        assert!(pattern_matches("bar/*.txt", "./bar/baz.txt"));
    }

    #[test]
    fn empty_path_never_matches() {
        assert!(!pattern_matches("*", ""));
        assert!(!pattern_matches("*", "/"));
    }

    #[test]
    fn invalid_pattern_matches_nothing() {
        assert!(!pattern_matches("a{b", "a{b"));
        assert!(!pattern_matches("[z-a]", "z"));
    }

    #[test]
    fn negation_is_refused() {
        let err = compile(["!keep.txt"]).unwrap_err();
        assert!(matches!(err, IgnoreError::NegationUnsupported(_)));
        assert!(!pattern_matches("!keep.txt", "keep.txt"));
    }

    #[test]
    fn compile_reports_offending_pattern() {
        let err = compile(["ok.txt", "[z-a]"]).unwrap_err();
        match err {
            IgnoreError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "[z-a]"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
