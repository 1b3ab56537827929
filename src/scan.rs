//! Candidate discovery for the manifest builder
//!
//! Walks the project tree and matches relative paths against glob-style
//! patterns. `*` matches within a path segment, `**` matches across
//! segments, and a leading `!` negates. Supports the pattern shapes the
//! bounds validator reviews; it is not a full glob engine.

use crate::error::{CachetError, CachetResult};
use crate::manifest::Candidate;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Discover candidate files under `root` matching the pattern list.
///
/// A file is a candidate when it matches at least one include pattern and
/// no negated pattern. Urls are the relative paths with a leading `/`.
/// Output is sorted by url.
pub fn scan_candidates(root: &Path, patterns: &[String]) -> CachetResult<Vec<Candidate>> {
    let (negated, included): (Vec<&String>, Vec<&String>) =
        patterns.iter().partition(|p| p.starts_with('!'));

    let mut files = Vec::new();
    walk(root, root, &mut files)?;

    let mut candidates: Vec<Candidate> = files
        .into_iter()
        .filter_map(|path| {
            let relative = path
                .strip_prefix(root)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");

            let is_included = included.iter().any(|p| glob_match(&relative, p));
            let is_ignored = negated
                .iter()
                .any(|p| glob_match(&relative, p.trim_start_matches('!')));

            (is_included && !is_ignored).then(|| Candidate {
                url: format!("/{relative}"),
                file_path: path,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.url.cmp(&b.url));
    debug!("Scanned {} candidates under {}", candidates.len(), root.display());
    Ok(candidates)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> CachetResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CachetError::io(format!("scanning {}", dir.display()), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| CachetError::io(format!("scanning {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Segment-wise glob match: `**` spans segments, `*` matches within one.
pub fn glob_match(path: &str, pattern: &str) -> bool {
    let path_segments: Vec<&str> = path.split('/').collect();
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    match_segments(&path_segments, &pattern_segments)
}

fn match_segments(path: &[&str], pattern: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            // Zero or more segments
            (0..=path.len()).any(|skip| match_segments(&path[skip..], &pattern[1..]))
        }
        Some(seg) => match path.first() {
            Some(first) if match_segment(first, seg) => {
                match_segments(&path[1..], &pattern[1..])
            }
            _ => false,
        },
    }
}

/// Single-segment wildcard match with `*`
fn match_segment(text: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return text == pattern;
    }

    let mut remaining = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match remaining.strip_prefix(part) {
                Some(rest) => remaining = rest,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return remaining.ends_with(part);
        } else {
            match remaining.find(part) {
                Some(pos) => remaining = &remaining[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn glob_match_exact_and_wildcards() {
        assert!(glob_match("dist/app.js", "dist/app.js"));
        assert!(glob_match("dist/app.js", "dist/*.js"));
        assert!(!glob_match("dist/app.css", "dist/*.js"));
        assert!(!glob_match("dist/sub/app.js", "dist/*.js"));
    }

    #[test]
    fn glob_match_recursive() {
        assert!(glob_match("dist/app.js", "dist/**"));
        assert!(glob_match("dist/sub/deep/app.js", "dist/**"));
        assert!(glob_match("dist/sub/app.js", "dist/**/*.js"));
        assert!(glob_match("dist/app.js", "dist/**/*.js"));
        assert!(glob_match("node_modules/pkg/index.js", "node_modules/**"));
        assert!(!glob_match("src/app.js", "dist/**"));
    }

    #[test]
    fn glob_match_inner_star() {
        assert!(glob_match("app.min.js", "app.*.js"));
        assert!(glob_match("main-abc123.js", "main-*.js"));
        assert!(!glob_match("vendor-abc.js", "main-*.js"));
    }

    #[test]
    fn scan_includes_and_negates() {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(dist.join("sub")).unwrap();
        std::fs::write(dist.join("app.js"), "a").unwrap();
        std::fs::write(dist.join("app.js.map"), "m").unwrap();
        std::fs::write(dist.join("sub").join("x.js"), "x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "r").unwrap();

        let patterns = vec!["dist/**".to_string(), "!**/*.map".to_string()];
        let candidates = scan_candidates(dir.path(), &patterns).unwrap();

        let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["/dist/app.js", "/dist/sub/x.js"]);
    }

    #[test]
    fn scan_empty_dir() {
        let dir = TempDir::new().unwrap();
        let candidates =
            scan_candidates(dir.path(), &["dist/**".to_string()]).unwrap();
        assert!(candidates.is_empty());
    }
}
