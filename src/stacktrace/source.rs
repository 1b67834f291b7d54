//! # Source lookup for frame context lines.
//!
//! The normalizer asks a [`SourceLookup`] for the lines around a frame. The
//! crate ships [`SourceCodeMap`], an in-memory map of file → lines; anything
//! else (a compile-time embedded map, a remote symbol store) can implement the
//! trait.
//!
//! ## Rules
//! - Lines are 1-based.
//! - A miss (unknown file, line out of range) is `None`, never an error.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Lines around a frame's location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceContext {
    pub pre_context: Vec<String>,
    pub context_line: String,
    pub post_context: Vec<String>,
}

/// Pluggable source-file lookup.
pub trait SourceLookup: Send + Sync + 'static {
    /// Returns the context around `line` of `file`, if known.
    fn lookup(&self, file: &str, line: u32) -> Option<SourceContext>;
}

/// In-memory source map.
#[derive(Clone, Debug, Default)]
pub struct SourceCodeMap {
    files: HashMap<String, Vec<String>>,
    context_lines: usize,
}

impl SourceCodeMap {
    /// Default number of lines before and after the frame line.
    pub const DEFAULT_CONTEXT_LINES: usize = 3;

    pub fn new(context_lines: usize) -> Self {
        Self {
            files: HashMap::new(),
            context_lines,
        }
    }

    /// Registers `contents` under `path` (the path frames report).
    pub fn insert(&mut self, path: impl Into<String>, contents: &str) {
        self.files
            .insert(path.into(), contents.lines().map(str::to_owned).collect());
    }

    /// Reads `root/relative` from disk and registers it under `relative`.
    pub fn load(&mut self, root: &Path, relative: &str) -> io::Result<()> {
        let contents = std::fs::read_to_string(root.join(relative))?;
        self.insert(relative, &contents);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceLookup for SourceCodeMap {
    fn lookup(&self, file: &str, line: u32) -> Option<SourceContext> {
        let lines = self.files.get(file)?;
        let idx = (line as usize).checked_sub(1)?;
        let context_line = lines.get(idx)?.clone();

        let start = idx.saturating_sub(self.context_lines);
        let end = idx
            .saturating_add(1)
            .saturating_add(self.context_lines)
            .min(lines.len());

        Some(SourceContext {
            pre_context: lines[start..idx].to_vec(),
            context_line,
            post_context: lines[idx + 1..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "l1\nl2\nl3\nl4\nl5\nl6\nl7";

    #[test]
    fn returns_surrounding_lines() {
        let mut map = SourceCodeMap::new(2);
        map.insert("src/lib.rs", SRC);

        let ctx = map.lookup("src/lib.rs", 4).unwrap();
        assert_eq!(ctx.pre_context, vec!["l2", "l3"]);
        assert_eq!(ctx.context_line, "l4");
        assert_eq!(ctx.post_context, vec!["l5", "l6"]);
    }

    #[test]
    fn clamps_at_file_edges() {
        let mut map = SourceCodeMap::new(3);
        map.insert("a.rs", SRC);

        let first = map.lookup("a.rs", 1).unwrap();
        assert!(first.pre_context.is_empty());
        assert_eq!(first.post_context, vec!["l2", "l3", "l4"]);

        let last = map.lookup("a.rs", 7).unwrap();
        assert_eq!(last.pre_context, vec!["l4", "l5", "l6"]);
        assert!(last.post_context.is_empty());
    }

    #[test]
    fn unbounded_context_takes_whole_file() {
        let mut map = SourceCodeMap::new(usize::MAX);
        map.insert("src/lib.rs", SRC);

        let ctx = map.lookup("src/lib.rs", 3).unwrap();
        assert_eq!(ctx.pre_context, vec!["l1", "l2"]);
        assert_eq!(ctx.context_line, "l3");
        assert_eq!(ctx.post_context, vec!["l4", "l5", "l6", "l7"]);
    }

    #[test]
    fn misses_are_none() {
        let mut map = SourceCodeMap::new(3);
        map.insert("a.rs", SRC);
        assert!(map.lookup("b.rs", 1).is_none());
        assert!(map.lookup("a.rs", 0).is_none());
        assert!(map.lookup("a.rs", 8).is_none());
    }
}
