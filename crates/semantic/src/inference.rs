//! Expression-type inference: `result_of(expression)`.
//!
//! A static dispatch table keyed by AST variant, walked post-order — every
//! sub-expression is resolved to a [`SymbolKind`] before the enclosing
//! expression's own handler runs. Each handler below corresponds to one
//! `on_*` case of the variant it's named after.

use crate::error::{AnalysisError, Result};
use crate::symbol_table::{resolve_type_ref, SymbolKind, SymbolTable};
use py2cpp_cst::{BinaryOperator, FullPath, FunctionKind, GenericTypeNode, NodeKind};
use py2cpp_cst::{domain_path, NodeQuery};

pub fn result_of(
    query: &NodeQuery,
    table: &SymbolTable,
    module: &str,
    path: &FullPath,
) -> Result<SymbolKind> {
    let node = query.by(path.as_str())?;
    tracing::debug!(path = %path, "inferring expression type");

    match &node.kind {
        NodeKind::Symbol { name } => on_symbol(table, module, &node.scope, name),
        NodeKind::This => on_this(&node.scope),
        NodeKind::ThisVar { name } => on_this_var(table, module, &node.scope, name),
        NodeKind::Indexer { container, key } => on_indexer(query, table, module, container, key),
        NodeKind::GenericType(generic) => on_generic_type(query, table, module, &node.scope, generic, path),
        NodeKind::FuncCall { callee, .. } => on_func_call(query, table, module, callee),
        NodeKind::Super => on_super(table, &node.scope, path),
        NodeKind::Argument { value } => result_of(query, table, module, value),
        NodeKind::BinaryOp { op, left, right } => {
            on_binary_op(query, table, module, *op, left, right, path)
        }
        NodeKind::Literal { .. } => on_literal(table, path),
        other => Err(AnalysisError::OperationUnsupported {
            node: format!("{path} ({other:?})"),
        }),
    }
}

fn on_symbol(table: &SymbolTable, module: &str, scope: &str, name: &str) -> Result<SymbolKind> {
    crate::resolver::resolve(table, scope, module, name).map(|row| row.kind)
}

/// The enclosing class: one element short of the function's own scope
/// chain (`module.Class.method` -> `module.Class`).
fn enclosing_class_domain(scope: &str) -> String {
    let count = domain_path::elements(scope).len();
    domain_path::left(scope, count.saturating_sub(1))
}

fn on_this(scope: &str) -> Result<SymbolKind> {
    let class_domain = enclosing_class_domain(scope);
    Ok(SymbolKind::Class {
        domain_id: class_domain,
    })
}

fn on_this_var(table: &SymbolTable, module: &str, scope: &str, name: &str) -> Result<SymbolKind> {
    let class_domain = enclosing_class_domain(scope);
    crate::resolver::resolve(table, &class_domain, module, name).map(|row| row.kind)
}

fn on_super(table: &SymbolTable, scope: &str, path: &FullPath) -> Result<SymbolKind> {
    let class_domain = enclosing_class_domain(scope);
    table
        .parents_of(&class_domain)
        .first()
        .map(|parent| SymbolKind::Class {
            domain_id: parent.clone(),
        })
        .ok_or_else(|| AnalysisError::OperationNotAllowed {
            node: path.to_string(),
            left: class_domain.clone(),
            right: class_domain,
            op: "super".to_string(),
        })
}

fn on_indexer(
    query: &NodeQuery,
    table: &SymbolTable,
    module: &str,
    container: &FullPath,
    _key: &FullPath,
) -> Result<SymbolKind> {
    // Indexing needs the container's *declared* generic shape, not just
    // its resolved class domain id, so it walks back to the declaration's
    // original type expression rather than re-deriving it from `kind`.
    let container_node = query.by(container.as_str())?;
    let declared = match &container_node.kind {
        NodeKind::Symbol { name } => {
            let row = crate::resolver::resolve(table, &container_node.scope, module, name)?;
            row.type_expr
        }
        NodeKind::ThisVar { name } => {
            let class_domain = enclosing_class_domain(&container_node.scope);
            let row = crate::resolver::resolve(table, &class_domain, module, name)?;
            row.type_expr
        }
        _ => None,
    };

    let declared = declared.ok_or_else(|| AnalysisError::OperationUnsupported {
        node: container.to_string(),
    })?;
    let declared_node = query.by(declared.as_str())?;
    match &declared_node.kind {
        NodeKind::GenericType(GenericTypeNode::List { element, .. }) => {
            resolve_type_ref(query, table, &declared_node.scope, module, element)
        }
        NodeKind::GenericType(GenericTypeNode::Dict { value, .. }) => {
            resolve_type_ref(query, table, &declared_node.scope, module, value)
        }
        _ => Err(AnalysisError::OperationUnsupported {
            node: declared.to_string(),
        }),
    }
}

fn on_generic_type(
    query: &NodeQuery,
    table: &SymbolTable,
    module: &str,
    scope: &str,
    generic: &GenericTypeNode,
    path: &FullPath,
) -> Result<SymbolKind> {
    match generic {
        GenericTypeNode::List { symbol, .. }
        | GenericTypeNode::Dict { symbol, .. }
        | GenericTypeNode::Plain { symbol, .. } => resolve_type_ref(query, table, scope, module, symbol),
        GenericTypeNode::Union { .. } => Err(AnalysisError::OperationUnsupported {
            node: path.to_string(),
        }),
    }
}

fn on_func_call(
    query: &NodeQuery,
    table: &SymbolTable,
    module: &str,
    callee: &FullPath,
) -> Result<SymbolKind> {
    let callee_kind = result_of(query, table, module, callee)?;
    match callee_kind {
        SymbolKind::Class { domain_id } => {
            // Calling a class name constructs an instance of it.
            Ok(SymbolKind::Class { domain_id })
        }
        SymbolKind::Function { domain_id } => {
            let row = table.get(&domain_id).ok_or_else(|| AnalysisError::Logic(
                format!("function row `{domain_id}` vanished from the table"),
            ))?;
            let decl = row.decl.clone().ok_or_else(|| {
                AnalysisError::Logic(format!("function `{domain_id}` has no declaration"))
            })?;
            let function_node = query.by(decl.as_str())?;
            match &function_node.kind {
                NodeKind::Function(f) => {
                    if f.kind == FunctionKind::Constructor {
                        let owner = f.owner_class.clone().ok_or_else(|| {
                            AnalysisError::Logic(format!("constructor `{domain_id}` has no owner class"))
                        })?;
                        let owner_node = query.by(owner.as_str())?;
                        match &owner_node.kind {
                            NodeKind::Class { symbol, .. } => Ok(SymbolKind::Class {
                                domain_id: domain_path::join([owner_node.scope.as_str(), symbol.as_str()]),
                            }),
                            _ => Err(AnalysisError::Logic("constructor owner is not a class".into())),
                        }
                    } else {
                        match &f.return_type {
                            Some(return_type) => {
                                resolve_type_ref(query, table, &function_node.scope, module, return_type)
                            }
                            None => Ok(SymbolKind::Class {
                                domain_id: crate::primitives::unknown_domain_id(),
                            }),
                        }
                    }
                }
                _ => Err(AnalysisError::Logic("callee declaration is not a function".into())),
            }
        }
    }
}

fn on_binary_op(
    query: &NodeQuery,
    table: &SymbolTable,
    module: &str,
    op: BinaryOperator,
    left: &FullPath,
    right: &FullPath,
    node_path: &FullPath,
) -> Result<SymbolKind> {
    let left_kind = result_of(query, table, module, left)?;
    let right_kind = result_of(query, table, module, right)?;
    let left_domain_any = left_kind.domain_id().to_string();
    let right_domain_any = right_kind.domain_id().to_string();

    let left_domain = match &left_kind {
        SymbolKind::Class { domain_id } => domain_id.clone(),
        SymbolKind::Function { .. } => {
            return Err(AnalysisError::OperationNotAllowed {
                node: node_path.to_string(),
                left: left_domain_any,
                right: right_domain_any,
                op: op.dunder().to_string(),
            })
        }
    };
    let right_domain = match &right_kind {
        SymbolKind::Class { domain_id } => domain_id.clone(),
        SymbolKind::Function { .. } => {
            return Err(AnalysisError::OperationNotAllowed {
                node: node_path.to_string(),
                left: left_domain_any,
                right: right_domain_any,
                op: op.dunder().to_string(),
            })
        }
    };

    let method = crate::resolver::resolve(table, &left_domain, module, op.dunder()).map_err(|_| {
        AnalysisError::OperationNotAllowed {
            node: node_path.to_string(),
            left: left_domain.clone(),
            right: right_domain.clone(),
            op: op.dunder().to_string(),
        }
    })?;
    let method_decl = method
        .decl
        .clone()
        .ok_or_else(|| AnalysisError::Logic(format!("`{}` has no declaration", op.dunder())))?;
    let method_node = query.by(method_decl.as_str())?;
    let method_fn = match &method_node.kind {
        NodeKind::Function(f) => f,
        _ => return Err(AnalysisError::Logic("dunder method is not a function".into())),
    };

    // params[0] is `self`; the operand type lives in params[1].
    let other_param_path = method_fn
        .params
        .get(1)
        .ok_or_else(|| AnalysisError::Logic(format!("`{}` takes no operand parameter", op.dunder())))?;
    let other_param = query.by(other_param_path.as_str())?;
    let var_type = match &other_param.kind {
        NodeKind::Parameter { var_type, .. } => var_type.clone(),
        _ => None,
    };
    let var_type = var_type.ok_or_else(|| AnalysisError::OperationUnsupported {
        node: other_param_path.to_string(),
    })?;
    let var_type_node = query.by(var_type.as_str())?;

    let matches_right = match &var_type_node.kind {
        NodeKind::GenericType(GenericTypeNode::Union { alternatives }) => {
            let mut matched = false;
            for alt in alternatives {
                if let Ok(alt_kind) = resolve_type_ref(query, table, &method_node.scope, module, alt) {
                    if alt_kind.domain_id() == right_domain {
                        matched = true;
                        break;
                    }
                }
            }
            matched
        }
        _ => {
            let declared = resolve_type_ref(query, table, &method_node.scope, module, &var_type)?;
            declared.domain_id() == right_domain
        }
    };

    if !matches_right {
        return Err(AnalysisError::OperationNotAllowed {
            node: node_path.to_string(),
            left: left_domain.clone(),
            right: right_domain.clone(),
            op: op.dunder().to_string(),
        });
    }

    match &method_fn.return_type {
        Some(return_type) => resolve_type_ref(query, table, &method_node.scope, module, return_type),
        None => Ok(SymbolKind::Class {
            domain_id: crate::primitives::unknown_domain_id(),
        }),
    }
}

fn on_literal(table: &SymbolTable, path: &FullPath) -> Result<SymbolKind> {
    let tag = path.last_tag();
    let class_name = py2cpp_cst::literal_class_alias(&tag).ok_or_else(|| {
        AnalysisError::Logic(format!("`{tag}` has no literal class alias"))
    })?;
    let domain_id = crate::primitives::domain_id_of(class_name);
    table
        .get(&domain_id)
        .map(|row| row.kind.clone())
        .ok_or_else(|| AnalysisError::Logic(format!("primitive `{domain_id}` is not registered")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_class_domain_strips_one_element() {
        assert_eq!(enclosing_class_domain("app.counter.Counter.__init__"), "app.counter.Counter");
        assert_eq!(enclosing_class_domain("app.counter.Counter"), "app.counter");
    }
}
