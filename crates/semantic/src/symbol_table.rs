//! The symbol table: one row per declared symbol, keyed by its dotted
//! domain id (`scope.symbol`), built by a single post-order walk of the
//! AST and read-only from then on.

use crate::error::{AnalysisError, Result};
use crate::primitives::primitive_rows;
use indexmap::IndexMap;
use py2cpp_cst::{AssignNode, FullPath, GenericTypeNode, NodeKind, NodeQuery};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Class { domain_id: String },
    Function { domain_id: String },
}

impl SymbolKind {
    pub fn domain_id(&self) -> &str {
        match self {
            SymbolKind::Class { domain_id } | SymbolKind::Function { domain_id } => domain_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRow {
    pub domain_id: String,
    pub scope: String,
    pub symbol: String,
    pub kind: SymbolKind,
    /// The declaration this row was built from; `None` for primitives,
    /// which have no CST location.
    pub decl: Option<FullPath>,
    /// The original type-annotation node (`Symbol` or `GenericType`), when
    /// one was written down. Kept alongside the resolved `kind` so
    /// inference can re-inspect generic parameters (`Indexer`, the second
    /// parameter of a dunder method) without losing them the way folding
    /// straight into `kind` would.
    pub type_expr: Option<FullPath>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    rows: IndexMap<String, SymbolRow>,
    /// Declared-order parent domain ids per class domain id, resolved once
    /// at build time so later lookups never need to re-walk the AST.
    class_parents: HashMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn get(&self, domain_id: &str) -> Option<&SymbolRow> {
        self.rows.get(domain_id)
    }

    pub fn parents_of(&self, class_domain_id: &str) -> &[String] {
        self.class_parents
            .get(class_domain_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &SymbolRow> {
        self.rows.values()
    }

    fn insert(&mut self, row: SymbolRow) {
        tracing::debug!(domain_id = %row.domain_id, "inserting symbol row");
        self.rows.insert(row.domain_id.clone(), row);
    }

    /// Longest-prefix-first candidate lookup: `scope.name`, then
    /// `module.name`, then `lib.name` (the primitive/library fallback
    /// reachable from anywhere).
    pub(crate) fn find_symbol(&self, scope: &str, module: &str, name: &str) -> Option<&SymbolRow> {
        self.rows
            .get(&py2cpp_cst::domain_path::join([scope, name]))
            .or_else(|| self.rows.get(&py2cpp_cst::domain_path::join([module, name])))
            .or_else(|| self.rows.get(&crate::primitives::domain_id_of(name)))
    }
}

/// Walks the AST once, in post order, inserting a row for every declared
/// symbol. Primitives are seeded first so user declarations can shadow
/// them by domain id if a scope ever collides (it won't, since primitives
/// are scope-less).
pub fn build_symbol_table(query: &NodeQuery) -> Result<SymbolTable> {
    tracing::info!("building symbol table");
    let mut table = SymbolTable::default();
    for row in primitive_rows() {
        table.insert(row);
    }

    let module = query.by(query.root_path().as_str())?;
    let module_path = match &module.kind {
        NodeKind::Module { module_path, .. } => module_path.clone(),
        _ => return Err(AnalysisError::Logic("root entry is not a module".into())),
    };
    walk_statements(query, &mut table, &module_path, &module.full_path)?;
    Ok(table)
}

fn walk_statements(
    query: &NodeQuery,
    table: &mut SymbolTable,
    module: &str,
    container_path: &FullPath,
) -> Result<()> {
    let node = query.by(container_path.as_str())?;
    let statements: Vec<FullPath> = match &node.kind {
        NodeKind::Module { statements, .. } => statements.clone(),
        NodeKind::Block { statements } => statements.clone(),
        _ => return Ok(()),
    };
    for stmt_path in statements {
        walk_statement(query, table, module, &stmt_path)?;
    }
    Ok(())
}

fn walk_statement(
    query: &NodeQuery,
    table: &mut SymbolTable,
    module: &str,
    stmt_path: &FullPath,
) -> Result<()> {
    let node = query.by(stmt_path.as_str())?;
    match &node.kind {
        NodeKind::Class { symbol, parents, body } => {
            let domain_id = py2cpp_cst::domain_path::join([node.scope.as_str(), symbol.as_str()]);
            table.insert(SymbolRow {
                domain_id: domain_id.clone(),
                scope: node.scope.clone(),
                symbol: symbol.clone(),
                kind: SymbolKind::Class {
                    domain_id: domain_id.clone(),
                },
                decl: Some(node.full_path.clone()),
                type_expr: None,
            });

            let mut parent_domain_ids = Vec::new();
            for parent_path in parents {
                let parent_node = query.by(parent_path.as_str())?;
                if let NodeKind::Symbol { name } = &parent_node.kind {
                    if let Some(row) = table.find_symbol(&node.scope, module, name) {
                        parent_domain_ids.push(row.domain_id.clone());
                    }
                }
            }
            table.class_parents.insert(domain_id, parent_domain_ids);

            walk_statements(query, table, module, body)?;
        }
        NodeKind::Function(f) => {
            let domain_id = py2cpp_cst::domain_path::join([node.scope.as_str(), f.name.as_str()]);
            table.insert(SymbolRow {
                domain_id: domain_id.clone(),
                scope: node.scope.clone(),
                symbol: f.name.clone(),
                kind: SymbolKind::Function {
                    domain_id: domain_id.clone(),
                },
                decl: Some(node.full_path.clone()),
                type_expr: None,
            });

            for param_path in &f.params {
                let param_node = query.by(param_path.as_str())?;
                if let NodeKind::Parameter { symbol, var_type } = &param_node.kind {
                    let kind = match var_type {
                        Some(type_path) => {
                            resolve_type_ref(query, table, &domain_id, module, type_path)?
                        }
                        None => SymbolKind::Class {
                            domain_id: crate::primitives::unknown_domain_id(),
                        },
                    };
                    table.insert(SymbolRow {
                        domain_id: py2cpp_cst::domain_path::join([domain_id.as_str(), symbol.as_str()]),
                        scope: domain_id.clone(),
                        symbol: symbol.clone(),
                        kind,
                        decl: Some(param_node.full_path.clone()),
                        type_expr: var_type.clone(),
                    });
                }
            }

            walk_statements(query, table, module, &f.body)?;
        }
        NodeKind::If { body, .. } | NodeKind::ElseIf { body, .. } | NodeKind::While { body, .. } => {
            walk_statements(query, table, module, body)?;
        }
        NodeKind::For { target, body, .. } => {
            if let NodeKind::Symbol { name } = &query.by(target.as_str())?.kind {
                table.insert(SymbolRow {
                    domain_id: py2cpp_cst::domain_path::join([node.scope.as_str(), name.as_str()]),
                    scope: node.scope.clone(),
                    symbol: name.clone(),
                    kind: SymbolKind::Class {
                        domain_id: crate::primitives::unknown_domain_id(),
                    },
                    decl: Some(target.clone()),
                    type_expr: None,
                });
            }
            walk_statements(query, table, module, body)?;
        }
        NodeKind::Assign(assign) => walk_assign(query, table, module, &node.scope, assign)?,
        _ => {}
    }
    Ok(())
}

fn walk_assign(
    query: &NodeQuery,
    table: &mut SymbolTable,
    module: &str,
    scope: &str,
    assign: &AssignNode,
) -> Result<()> {
    match assign {
        AssignNode::Move { symbol, value } => {
            let (target_scope, name) = binding_target(query, scope, symbol)?;
            let kind = crate::inference::result_of(query, table, module, value)?;
            table.insert(SymbolRow {
                domain_id: py2cpp_cst::domain_path::join([target_scope.as_str(), name.as_str()]),
                scope: target_scope,
                symbol: name,
                kind,
                decl: Some(symbol.clone()),
                type_expr: None,
            });
        }
        AssignNode::Anno {
            symbol,
            var_type,
            value: _,
        } => {
            let (target_scope, name) = binding_target(query, scope, symbol)?;
            let kind = resolve_type_ref(query, table, &target_scope, module, var_type)?;
            table.insert(SymbolRow {
                domain_id: py2cpp_cst::domain_path::join([target_scope.as_str(), name.as_str()]),
                scope: target_scope,
                symbol: name,
                kind,
                decl: Some(symbol.clone()),
                type_expr: Some(var_type.clone()),
            });
        }
        AssignNode::Aug { .. } => {
            // Augmented assignment never introduces a new binding; the
            // target must already resolve.
        }
    }
    Ok(())
}

/// The scope a binding is inserted under and the bare name it binds.
///
/// A bare `Symbol` binds in its own statement's `scope`. A `ThisVar`
/// (`self.x`) binds one level up, in the *containing class's* scope
/// (`join(containing_class.scope, "x")`) rather than the enclosing
/// function's scope.
fn binding_target(query: &NodeQuery, scope: &str, path: &FullPath) -> Result<(String, String)> {
    match &query.by(path.as_str())?.kind {
        NodeKind::Symbol { name } => Ok((scope.to_string(), name.clone())),
        NodeKind::ThisVar { name } => {
            let count = py2cpp_cst::domain_path::elements(scope).len();
            let owner_class = py2cpp_cst::domain_path::left(scope, count.saturating_sub(1));
            Ok((owner_class, name.clone()))
        }
        _ => Err(AnalysisError::Logic(format!(
            "expected a symbol at `{path}`"
        ))),
    }
}

/// Resolves a type-annotation position (a `Symbol` or `GenericType` node)
/// to the class domain id it names.
pub fn resolve_type_ref(
    query: &NodeQuery,
    table: &SymbolTable,
    scope: &str,
    module: &str,
    path: &FullPath,
) -> Result<SymbolKind> {
    let node = query.by(path.as_str())?;
    match &node.kind {
        NodeKind::Symbol { name } => table
            .find_symbol(scope, module, name)
            .map(|row| row.kind.clone())
            .ok_or_else(|| AnalysisError::SymbolUnresolved {
                scope: scope.to_string(),
                symbol: name.clone(),
            }),
        NodeKind::GenericType(GenericTypeNode::List { symbol, .. })
        | NodeKind::GenericType(GenericTypeNode::Dict { symbol, .. })
        | NodeKind::GenericType(GenericTypeNode::Plain { symbol, .. }) => {
            resolve_type_ref(query, table, scope, module, symbol)
        }
        NodeKind::GenericType(GenericTypeNode::Union { .. }) => {
            Err(AnalysisError::OperationUnsupported {
                node: path.to_string(),
            })
        }
        other => Err(AnalysisError::Logic(format!(
            "`{path}` is not a type-position node: {other:?}"
        ))),
    }
}

#[cfg(test)]
impl SymbolTable {
    pub fn insert_for_test(&mut self, row: SymbolRow) {
        self.insert(row);
    }

    pub fn set_parents_for_test(&mut self, class_domain_id: &str, parents: Vec<String>) {
        self.class_parents
            .insert(class_domain_id.to_string(), parents);
    }
}
