//! Dotted-path utilities.
//!
//! `domain_path` is the pure string-algebra layer used for symbol domain ids
//! (`scope.symbol`); `FullPath` layers indexed-segment addressing on top of
//! it for CST navigation (`tag` vs `tag[i]`).

use once_cell::sync::Lazy;
use regex::Regex;

/// Splits a dotted string into its non-empty elements.
pub fn elements(path: &str) -> Vec<&str> {
    path.split('.').filter(|part| !part.is_empty()).collect()
}

/// Joins any number of path fragments, dropping empty fragments, and
/// re-joining with `.`. Mirrors py2cpp's `DSN.join`, which is tolerant of
/// empty scope/symbol fragments so callers don't need to special-case the
/// module root.
pub fn join<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .flat_map(|part| {
            elements(part.as_ref())
                .into_iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join(".")
}

pub fn left(path: &str, count: usize) -> String {
    elements(path)
        .into_iter()
        .take(count)
        .collect::<Vec<_>>()
        .join(".")
}

pub fn right(path: &str, count: usize) -> String {
    let elems = elements(path);
    let start = elems.len().saturating_sub(count);
    elems[start..].join(".")
}

pub fn root(path: &str) -> Option<String> {
    elements(path).first().map(|s| s.to_string())
}

pub fn parent(path: &str) -> Option<String> {
    let elems = elements(path);
    if elems.len() < 2 {
        return None;
    }
    Some(elems[elems.len() - 2].to_string())
}

/// Reserved tag used for an entry whose grammar slot was present but
/// carried no content (an unmatched optional rule).
pub const EMPTY_TAG: &str = "__empty__";

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\[(\d+)\]$").unwrap());

/// A single path segment: either a bare tag (the only child with that tag
/// under its parent) or an indexed tag (`tag[i]`, one of several same-tag
/// siblings).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    raw: String,
}

impl Segment {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn normalize(tag: &str, index: Option<usize>) -> Self {
        match index {
            Some(i) => Self::new(format!("{tag}[{i}]")),
            None => Self::new(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The bare tag, with any `[i]` suffix stripped.
    pub fn tag(&self) -> &str {
        match SEGMENT_RE.captures(&self.raw) {
            Some(caps) => caps.get(1).unwrap().as_str(),
            None => &self.raw,
        }
    }

    pub fn index(&self) -> Option<usize> {
        SEGMENT_RE
            .captures(&self.raw)
            .and_then(|caps| caps.get(2))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// An indexed CST address: a dotted sequence of segments, each either a bare
/// tag or a `tag[i]` form, built by `EntryNavigator::full_pathfy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullPath {
    raw: String,
}

impl FullPath {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.raw
            .split('.')
            .filter(|s| !s.is_empty())
            .map(Segment::new)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.segments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn join(&self, segment: impl Into<String>) -> FullPath {
        let seg = segment.into();
        if self.raw.is_empty() {
            FullPath::new(seg)
        } else {
            FullPath::new(format!("{}.{}", self.raw, seg))
        }
    }

    /// The last segment's bare tag, or `""` for an empty path.
    pub fn last_tag(&self) -> String {
        self.segments()
            .last()
            .map(|s| s.tag().to_string())
            .unwrap_or_default()
    }

    /// Drops `n` segments from the front (`n > 0`) or `-n` segments from the
    /// back (`n < 0`). Matches py2cpp's `EntryPath.shift`.
    pub fn shift(&self, n: isize) -> FullPath {
        let segs = self.segments();
        let kept: Vec<String> = if n >= 0 {
            segs.into_iter()
                .skip(n as usize)
                .map(|s| s.as_str().to_string())
                .collect()
        } else {
            let drop = (-n) as usize;
            let keep = segs.len().saturating_sub(drop);
            segs.into_iter()
                .take(keep)
                .map(|s| s.as_str().to_string())
                .collect()
        };
        FullPath::new(kept.join("."))
    }

    /// The nearest ancestor path (including this one) whose last segment's
    /// bare tag equals `tag`, searching from the leaf upward. Mirrors
    /// py2cpp's `Nodes.ancestor`, which scans the de-identified path in
    /// reverse for the first match.
    pub fn ancestor_with_tag(&self, tag: &str) -> Option<FullPath> {
        let segs = self.segments();
        for take in (1..=segs.len()).rev() {
            if segs[take - 1].tag() == tag {
                let kept: Vec<&str> = segs[..take].iter().map(|s| s.as_str()).collect();
                return Some(FullPath::new(kept.join(".")));
            }
        }
        None
    }

    /// A regex that matches exactly one more segment under this path.
    pub fn escaped(&self) -> String {
        regex::escape(&self.raw)
    }
}

impl std::fmt::Display for FullPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_drops_empty_fragments() {
        assert_eq!(join(["", "a", "", "b.c"]), "a.b.c");
    }

    #[test]
    fn left_right_root_parent() {
        assert_eq!(left("a.b.c", 2), "a.b");
        assert_eq!(right("a.b.c", 2), "b.c");
        assert_eq!(root("a.b.c"), Some("a".to_string()));
        assert_eq!(parent("a.b.c"), Some("b".to_string()));
        assert_eq!(parent("a"), None);
    }

    #[test]
    fn segment_tag_and_index() {
        let s = Segment::new("class_def[1]");
        assert_eq!(s.tag(), "class_def");
        assert_eq!(s.index(), Some(1));
        let bare = Segment::new("class_def");
        assert_eq!(bare.tag(), "class_def");
        assert_eq!(bare.index(), None);
    }

    #[test]
    fn full_path_shift() {
        let p = FullPath::new("file_input.class_def[0].block");
        assert_eq!(p.shift(-1).as_str(), "file_input.class_def[0]");
        assert_eq!(p.shift(1).as_str(), "class_def[0].block");
        assert_eq!(p.last_tag(), "block");
    }

    #[test]
    fn ancestor_with_tag_scans_from_leaf() {
        let p = FullPath::new("file_input.class_def[0].function_def[1].block");
        let found = p.ancestor_with_tag("class_def").unwrap();
        assert_eq!(found.as_str(), "file_input.class_def[0]");
        assert!(p.ancestor_with_tag("import_stmt").is_none());
    }
}
