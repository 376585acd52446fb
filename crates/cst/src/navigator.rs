//! Builds and serves the full-path index over an [`Entry`] tree.

use crate::entry::Entry;
use crate::error::{CstError, Result};
use crate::path::FullPath;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Indexes an `Entry` tree by full path, in depth-first left-to-right order,
/// and serves path-keyed lookups. Built once per parsed unit and shared
/// read-only afterwards (§5 concurrency model: append-only-then-read-only).
#[derive(Debug, Clone)]
pub struct EntryNavigator {
    root_tag: String,
    index: IndexMap<String, Entry>,
}

impl EntryNavigator {
    /// Indexes `root` under its own tag as the root path.
    pub fn new(root: Entry) -> Self {
        let root_tag = root.tag.clone();
        let mut index = IndexMap::new();
        full_pathfy(&root, root_tag.clone(), &mut index);
        Self { root_tag, index }
    }

    pub fn root_path(&self) -> FullPath {
        FullPath::new(self.root_tag.clone())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn pluck(&self, path: &str) -> Result<&Entry> {
        self.index.get(path).ok_or_else(|| CstError::NotFound {
            path: path.to_string(),
        })
    }

    /// Every indexed path with entries in the same left-to-right order they
    /// were discovered in, paired with the entry. Callers regex-filter this
    /// for sibling/children/expand queries.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.index.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All indexed paths at or under `prefix` (a dotted-path prefix match,
    /// not a string prefix match — `a.bc` is not under `a.b`).
    pub fn group_by(&self, prefix: &str) -> Vec<(&str, &Entry)> {
        let prefix_dot = format!("{prefix}.");
        self.index
            .iter()
            .filter(|(path, _)| path.as_str() == prefix || path.starts_with(&prefix_dot))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

/// Recreates py2cpp's `ASTFinder.full_pathfy`: children sharing a tag get an
/// indexed form (`tag[i]`); a tag that occurs exactly once under its parent
/// keeps the bare form.
fn full_pathfy(entry: &Entry, path: String, out: &mut IndexMap<String, Entry>) {
    out.insert(path.clone(), entry.clone());
    if !entry.has_children() {
        return;
    }

    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    for child in &entry.children {
        *tag_counts.entry(child.tag.as_str()).or_insert(0) += 1;
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for child in &entry.children {
        let count = tag_counts[child.tag.as_str()];
        let segment = if count > 1 {
            let idx = seen.entry(child.tag.as_str()).or_insert(0);
            let s = format!("{}[{}]", child.tag, idx);
            *idx += 1;
            s
        } else {
            child.tag.clone()
        };
        let child_path = format!("{path}.{segment}");
        full_pathfy(child, child_path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        Entry::node(
            "file_input",
            vec![
                Entry::node(
                    "class_def",
                    vec![Entry::leaf("class_symbol", "Foo"), Entry::node("block", vec![])],
                ),
                Entry::node(
                    "class_def",
                    vec![Entry::leaf("class_symbol", "Bar"), Entry::node("block", vec![])],
                ),
                Entry::leaf("import_stmt", "os"),
            ],
        )
    }

    #[test]
    fn bare_tag_for_single_occurrence_indexed_for_repeats() {
        let nav = EntryNavigator::new(sample());
        assert!(nav.exists("file_input.class_def[0]"));
        assert!(nav.exists("file_input.class_def[1]"));
        assert!(nav.exists("file_input.import_stmt"));
        assert!(!nav.exists("file_input.class_def"));
    }

    #[test]
    fn pluck_missing_path_is_not_found() {
        let nav = EntryNavigator::new(sample());
        assert!(nav.pluck("file_input.does_not_exist").is_err());
    }

    #[test]
    fn group_by_matches_prefix_boundaries_only() {
        let nav = EntryNavigator::new(sample());
        let under_first_class = nav.group_by("file_input.class_def[0]");
        assert!(under_first_class
            .iter()
            .all(|(p, _)| !p.starts_with("file_input.class_def[1]")));
    }
}
