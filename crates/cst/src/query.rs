//! Query surface over a resolved AST: the one place traversal happens.

use crate::ast::{ASTNode, NodeKind};
use crate::error::{CstError, Result};
use crate::navigator::EntryNavigator;
use crate::path::FullPath;
use crate::registry::{is_wrapper_tag, refine_function, BuildCtx, NodeRegistry};
use regex::Regex;
use std::rc::Rc;

/// Resolves CST entries into AST nodes on demand, memoized by path, and
/// answers the structural queries spec'd for traversal. This is the only
/// type that threads entry navigation and node resolution together; nodes
/// themselves stay inert values addressed by path.
pub struct NodeQuery {
    navigator: EntryNavigator,
    registry: NodeRegistry,
}

impl NodeQuery {
    pub fn new(navigator: EntryNavigator) -> Self {
        Self {
            navigator,
            registry: NodeRegistry::new(),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.navigator.exists(path)
    }

    pub fn root_path(&self) -> FullPath {
        self.navigator.root_path()
    }

    /// Resolves `path` to an AST node, constructing and caching it on first
    /// access. Repeat calls return the same `Rc`, giving identity-stable
    /// sharing within a session.
    pub fn by(&self, path: &str) -> Result<Rc<ASTNode>> {
        if let Some(cached) = self.registry.cached(path) {
            return Ok(cached);
        }
        tracing::info!(path, "resolving AST node");
        let entry = self.navigator.pluck(path)?;
        let full_path = FullPath::new(path);
        let tag = full_path.last_tag();

        if is_wrapper_tag(&tag) {
            let inner = entry.children.first().ok_or_else(|| CstError::NotFound {
                path: path.to_string(),
            })?;
            let deeper_path = full_path.join(inner.tag.as_str());
            let node = self.by(deeper_path.as_str())?;
            self.registry.cache(path.to_string(), node.clone());
            return Ok(node);
        }

        let mut kind = match self.registry.constructor(&tag) {
            Some(constructor) => {
                let ctx = BuildCtx {
                    entry,
                    full_path: &full_path,
                };
                constructor(&ctx)
            }
            // No constructor for this tag: a terminal entry falls back to
            // `Terminal` (punctuation, skipped whitespace, any CST leaf the
            // grammar produces that the AST doesn't model); a non-terminal
            // with no constructor is a genuine miss.
            None if entry.is_terminal => NodeKind::Terminal {
                value: entry.value.clone(),
            },
            None => {
                return Err(CstError::NotFound {
                    path: path.to_string(),
                })
            }
        };

        if let NodeKind::Function(f) = kind {
            let owner_class = self.enclosing_class(&full_path);
            let first_param_symbol = match f.params.first() {
                Some(param_path) => match &self.by(param_path.as_str())?.kind {
                    NodeKind::Parameter { symbol, .. } => Some(symbol.clone()),
                    _ => None,
                },
                None => None,
            };
            kind = NodeKind::Function(refine_function(
                f,
                owner_class,
                first_param_symbol.as_deref(),
            ));
        }

        let scope = self.scope_of(&full_path)?;
        let namespace = self.namespace_of(&full_path)?;
        let node = Rc::new(ASTNode::new(full_path.clone(), scope, namespace, kind));
        self.registry.cache(path.to_string(), node.clone());
        Ok(node)
    }

    /// Walks upward from `path` to the nearest resolvable ancestor (a CST
    /// node the registry has a constructor for), not including `path`
    /// itself.
    pub fn parent(&self, path: &str) -> Result<Rc<ASTNode>> {
        let mut forwards = FullPath::new(path).shift(-1);
        while !forwards.is_empty() {
            if self.registry.can_resolve(&forwards.last_tag()) {
                return self.by(forwards.as_str());
            }
            forwards = forwards.shift(-1);
        }
        Err(CstError::NotFound {
            path: path.to_string(),
        })
    }

    /// Walks upward from `path` to the nearest ancestor whose bare tag
    /// equals `tag`, searching from the leaf.
    pub fn ancestor(&self, path: &str, tag: &str) -> Result<Rc<ASTNode>> {
        let found = FullPath::new(path)
            .ancestor_with_tag(tag)
            .ok_or_else(|| CstError::NotFound {
                path: path.to_string(),
            })?;
        self.by(found.as_str())
    }

    /// All entries one level under `path`'s parent (including `path`
    /// itself), in left-to-right order.
    pub fn siblings(&self, path: &str) -> Result<Vec<Rc<ASTNode>>> {
        let uplayer = FullPath::new(path).shift(-1);
        let pattern = one_more_segment(&uplayer);
        self.resolvable_matches(&uplayer, &pattern)
    }

    /// All entries one level under `path`, in left-to-right order.
    pub fn children(&self, path: &str) -> Result<Vec<Rc<ASTNode>>> {
        let via = FullPath::new(path);
        let pattern = one_more_segment(&via);
        self.resolvable_matches(&via, &pattern)
    }

    fn resolvable_matches(&self, prefix: &FullPath, pattern: &Regex) -> Result<Vec<Rc<ASTNode>>> {
        let group = if prefix.is_empty() {
            self.navigator.group_by(self.navigator.root_path().as_str())
        } else {
            self.navigator.group_by(prefix.as_str())
        };
        let mut out = Vec::new();
        for (candidate_path, _) in group {
            if pattern.is_match(candidate_path) {
                let tag = FullPath::new(candidate_path).last_tag();
                if self.registry.can_resolve(&tag) {
                    out.push(self.by(candidate_path)?);
                }
            }
        }
        Ok(out)
    }

    /// Resolved descendants of `path`, skipping any CST tag the registry
    /// has no node for and descending into it instead. Once a resolvable
    /// descendant is found, nothing further under it is visited.
    pub fn expand(&self, path: &str) -> Result<Vec<Rc<ASTNode>>> {
        let via = FullPath::new(path);
        let group = self.navigator.group_by(via.as_str());
        let mut out = Vec::new();
        let mut covered: Vec<String> = Vec::new();

        for (candidate_path, entry) in group {
            if candidate_path == via.as_str() {
                continue;
            }
            if covered
                .iter()
                .any(|c| candidate_path == c || candidate_path.starts_with(&format!("{c}.")))
            {
                continue;
            }
            let candidate = FullPath::new(candidate_path);
            let tag = candidate.last_tag();
            if self.registry.can_resolve(&tag) {
                out.push(self.by(candidate_path)?);
                covered.push(candidate_path.to_string());
                continue;
            }
            // Fallback terminal: a leaf with no resolvable tag anywhere in
            // its own relative path still surfaces, as a `Terminal` node,
            // rather than being silently dropped — it may carry a value
            // (an operator glyph, a raw token) a caller still wants.
            if entry.is_terminal {
                out.push(self.by(candidate_path)?);
                covered.push(candidate_path.to_string());
                continue;
            }
            // A non-terminal with no resolvable tag (a role-tag wrapper, or
            // any other un-modeled container) carries no AST meaning of its
            // own; skip it and keep descending into its children.
        }
        Ok(out)
    }

    /// Terminal values of every entry at or under `path`, left to right,
    /// skipping entries with no value.
    pub fn values(&self, path: &str) -> Vec<String> {
        self.navigator
            .group_by(path)
            .into_iter()
            .filter_map(|(_, entry)| entry.value.clone())
            .collect()
    }

    /// Walks up through intervening blocks/statements to the nearest
    /// `Class`; stops and returns `None` the moment it crosses into a
    /// `Module` or another `Function` first (a nested function is not a
    /// method just because something further out belongs to a class).
    fn enclosing_class(&self, path: &FullPath) -> Option<FullPath> {
        let mut current = self.parent(path.as_str()).ok()?;
        loop {
            match &current.kind {
                NodeKind::Class { .. } => return Some(current.full_path.clone()),
                NodeKind::Module { .. } | NodeKind::Function(_) => return None,
                _ => current = self.parent(current.full_path.as_str()).ok()?,
            }
        }
    }

    fn nearest_scope_ancestor(&self, path: &FullPath) -> Result<Rc<ASTNode>> {
        let mut current = self.parent(path.as_str())?;
        while !current.kind.contributes_scope() {
            current = self.parent(current.full_path.as_str())?;
        }
        Ok(current)
    }

    fn scope_of(&self, path: &FullPath) -> Result<String> {
        if path.as_str() == self.navigator.root_path().as_str() {
            // The module's own scope is itself.
            let entry = self.navigator.pluck(path.as_str())?;
            return Ok(entry
                .child("module_name")
                .and_then(|c| c.value.clone())
                .unwrap_or_else(|| "__main__".to_string()));
        }
        let ancestor = self.nearest_scope_ancestor(path)?;
        match &ancestor.kind {
            NodeKind::Module { module_path, .. } => Ok(module_path.clone()),
            _ => Ok(crate::path::join([
                ancestor.scope.as_str(),
                ancestor.kind.scope_contribution().unwrap_or(""),
            ])),
        }
    }

    fn namespace_of(&self, path: &FullPath) -> Result<String> {
        if path.as_str() == self.navigator.root_path().as_str() {
            return self.scope_of(path);
        }
        // Walk to the nearest Module/Class ancestor only; functions don't
        // contribute to the C++-facing namespace.
        let mut current = self.parent(path.as_str())?;
        loop {
            match &current.kind {
                NodeKind::Module { module_path, .. } => return Ok(module_path.clone()),
                NodeKind::Class { symbol, .. } => {
                    return Ok(crate::path::join([current.namespace.as_str(), symbol.as_str()]))
                }
                _ => current = self.parent(current.full_path.as_str())?,
            }
        }
    }
}

fn one_more_segment(prefix: &FullPath) -> Regex {
    let pattern = if prefix.is_empty() {
        r"^[^.]+$".to_string()
    } else {
        format!("^{}\\.[^.]+$", prefix.escaped())
    };
    Regex::new(&pattern).expect("generated sibling/children pattern is valid regex")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;

    fn sample_module() -> EntryNavigator {
        // file_input -> class_def(class_symbol=Foo, block -> function_def(__init__, parameter(self), block))
        let init_block = Entry::node("block", vec![]);
        let init_fn = Entry::node(
            "function_def",
            vec![
                Entry::leaf("function_symbol", "__init__"),
                Entry::node("parameter", vec![Entry::leaf("param_symbol", "self")]),
                init_block,
            ],
        );
        let class_block = Entry::node("block", vec![init_fn]);
        let class_def = Entry::node(
            "class_def",
            vec![Entry::leaf("class_symbol", "Foo"), class_block],
        );
        let root = Entry::node(
            "file_input",
            vec![Entry::leaf("module_name", "pkg.mod"), class_def],
        );
        EntryNavigator::new(root)
    }

    #[test]
    fn resolves_module_and_class_scope() {
        let query = NodeQuery::new(sample_module());
        let module = query.by("file_input").unwrap();
        assert!(matches!(&module.kind, NodeKind::Module { module_path, .. } if module_path == "pkg.mod"));

        let class = query.by("file_input.class_def").unwrap();
        assert_eq!(class.scope, "pkg.mod");
        assert!(matches!(&class.kind, NodeKind::Class { symbol, .. } if symbol == "Foo"));
    }

    #[test]
    fn constructor_is_refined_and_scoped_under_class() {
        let query = NodeQuery::new(sample_module());
        let ctor_path = "file_input.class_def.block.function_def";
        let ctor = query.by(ctor_path).unwrap();
        match &ctor.kind {
            NodeKind::Function(f) => {
                assert_eq!(f.kind, crate::ast::FunctionKind::Constructor);
                assert_eq!(ctor.scope, "pkg.mod.Foo");
            }
            _ => panic!("expected Function"),
        }
    }

    #[test]
    fn by_is_identity_stable() {
        let query = NodeQuery::new(sample_module());
        let a = query.by("file_input.class_def").unwrap();
        let b = query.by("file_input.class_def").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn parent_skips_unresolvable_cst_tags() {
        let query = NodeQuery::new(sample_module());
        let parent = query
            .parent("file_input.class_def.block.function_def.parameter")
            .unwrap();
        assert!(matches!(parent.kind, NodeKind::Function(_)));
    }

    #[test]
    fn by_redirects_through_a_role_tag_wrapper_to_its_wrapped_child() {
        // return_type wraps a var_symbol naming the annotation.
        let block = Entry::node("block", vec![]);
        let function = Entry::node(
            "function_def",
            vec![
                Entry::leaf("function_symbol", "f"),
                Entry::node("return_type", vec![Entry::leaf("var_symbol", "int")]),
                block,
            ],
        );
        let root = Entry::node(
            "file_input",
            vec![Entry::leaf("module_name", "pkg"), function],
        );
        let query = NodeQuery::new(EntryNavigator::new(root));
        let wrapper = query.by("file_input.function_def.return_type").unwrap();
        assert!(matches!(&wrapper.kind, NodeKind::Symbol { name } if name == "int"));

        let direct = query
            .by("file_input.function_def.return_type.var_symbol")
            .unwrap();
        assert!(Rc::ptr_eq(&wrapper, &direct));
    }
}
