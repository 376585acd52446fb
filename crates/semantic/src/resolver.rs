//! Symbol-path resolution: `resolve(scope, module, path)`.
//!
//! Consumes `path` one dotted element at a time. Each element is looked up
//! against `scope.element` then `module.element` then the bare element
//! (the primitive/library fallback); on a hit that still has a remaining
//! suffix, resolution recurses into the matched row's own domain id as the
//! new scope (a class's members live at `class_domain_id.member`). A miss
//! falls back to walking the class chain of `scope` itself, parent by
//! parent, left to right — the MRO py2cpp calls into when a name isn't a
//! member of the class being searched but is inherited.

use crate::config::{AnalysisConfig, UnresolvedSymbolMode};
use crate::error::{AnalysisError, Result};
use crate::symbol_table::{SymbolKind, SymbolRow, SymbolTable};

/// `resolve`, but honoring `AnalysisConfig::unresolved_symbol_mode`: in
/// `Sentinel` mode a `SymbolUnresolved` failure is swallowed and the
/// `lib.Unknown` row returned instead; in `Error` mode the failure
/// propagates even though the sentinel is registered.
pub fn resolve_with_config(
    table: &SymbolTable,
    scope: &str,
    module: &str,
    path: &str,
    config: &AnalysisConfig,
) -> Result<SymbolRow> {
    match resolve(table, scope, module, path) {
        Ok(row) => Ok(row),
        Err(AnalysisError::SymbolUnresolved { .. })
            if config.unresolved_symbol_mode == UnresolvedSymbolMode::Sentinel =>
        {
            table
                .get(&crate::primitives::unknown_domain_id())
                .cloned()
                .ok_or_else(|| AnalysisError::Logic("Unknown sentinel is not registered".into()))
        }
        Err(err) => Err(err),
    }
}

pub fn resolve(table: &SymbolTable, scope: &str, module: &str, path: &str) -> Result<SymbolRow> {
    let mut elements: Vec<String> = py2cpp_cst::domain_path::elements(path)
        .into_iter()
        .map(str::to_string)
        .collect();
    if elements.is_empty() {
        return Err(AnalysisError::Logic("empty symbol path".into()));
    }
    let first = elements.remove(0);
    let remain = elements.join(".");

    let row = find_with_chain(table, scope, module, &first).ok_or_else(|| {
        AnalysisError::SymbolUnresolved {
            scope: scope.to_string(),
            symbol: path.to_string(),
        }
    })?;

    if remain.is_empty() {
        return Ok(row);
    }

    match &row.kind {
        SymbolKind::Class { domain_id } => resolve(table, domain_id, module, &remain),
        SymbolKind::Function { .. } => Err(AnalysisError::SymbolUnresolved {
            scope: scope.to_string(),
            symbol: path.to_string(),
        }),
    }
}

fn find_with_chain(table: &SymbolTable, scope: &str, module: &str, name: &str) -> Option<SymbolRow> {
    if let Some(row) = table.find_symbol(scope, module, name) {
        return Some(row.clone());
    }
    if let Some(class_row) = table.get(scope) {
        if matches!(class_row.kind, SymbolKind::Class { .. }) {
            for parent_domain_id in table.parents_of(scope) {
                if let Some(found) = find_with_chain(table, parent_domain_id, module, name) {
                    return Some(found);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::primitive_rows;
    use crate::symbol_table::SymbolTable;

    fn table_with(rows: Vec<SymbolRow>) -> SymbolTable {
        let mut table = SymbolTable::default();
        for row in primitive_rows() {
            // Not inserted via the public API on purpose in this unit
            // test: exercise the same insertion path `build_symbol_table`
            // would, through the crate-visible helper.
            table.insert_for_test(row);
        }
        for row in rows {
            table.insert_for_test(row);
        }
        table
    }

    #[test]
    fn resolves_bare_primitive_from_any_scope() {
        let table = table_with(vec![]);
        let row = resolve(&table, "app.counter.Counter.__init__", "app.counter", "int").unwrap();
        assert_eq!(row.domain_id, "lib.int");
    }

    #[test]
    fn recurses_into_matched_class_for_member_access() {
        let table = table_with(vec![
            SymbolRow {
                domain_id: "app.counter.Counter".to_string(),
                scope: "app.counter".to_string(),
                symbol: "Counter".to_string(),
                kind: SymbolKind::Class {
                    domain_id: "app.counter.Counter".to_string(),
                },
                decl: None,
                type_expr: None,
            },
            SymbolRow {
                domain_id: "app.counter.Counter.value".to_string(),
                scope: "app.counter.Counter".to_string(),
                symbol: "value".to_string(),
                kind: SymbolKind::Class {
                    domain_id: "int".to_string(),
                },
                decl: None,
                type_expr: None,
            },
        ]);
        let row = resolve(&table, "app.counter", "app.counter", "Counter.value").unwrap();
        assert_eq!(row.domain_id, "int");
    }

    #[test]
    fn falls_back_to_parent_class_member() {
        let mut table = table_with(vec![
            SymbolRow {
                domain_id: "app.shapes.Base".to_string(),
                scope: "app.shapes".to_string(),
                symbol: "Base".to_string(),
                kind: SymbolKind::Class {
                    domain_id: "app.shapes.Base".to_string(),
                },
                decl: None,
                type_expr: None,
            },
            SymbolRow {
                domain_id: "app.shapes.Base.area".to_string(),
                scope: "app.shapes.Base".to_string(),
                symbol: "area".to_string(),
                kind: SymbolKind::Function {
                    domain_id: "app.shapes.Base.area".to_string(),
                },
                decl: None,
                type_expr: None,
            },
            SymbolRow {
                domain_id: "app.shapes.Square".to_string(),
                scope: "app.shapes".to_string(),
                symbol: "Square".to_string(),
                kind: SymbolKind::Class {
                    domain_id: "app.shapes.Square".to_string(),
                },
                decl: None,
                type_expr: None,
            },
        ]);
        table.set_parents_for_test("app.shapes.Square", vec!["app.shapes.Base".to_string()]);

        let row = find_with_chain(&table, "app.shapes.Square", "app.shapes", "area").unwrap();
        assert_eq!(row.domain_id, "app.shapes.Base.area");
    }

    #[test]
    fn unresolved_symbol_is_an_error() {
        let table = table_with(vec![]);
        let err = resolve(&table, "app.counter", "app.counter", "nope").unwrap_err();
        assert!(matches!(err, AnalysisError::SymbolUnresolved { .. }));
    }

    #[test]
    fn sentinel_mode_substitutes_unknown_for_an_unresolved_symbol() {
        let table = table_with(vec![]);
        let config = crate::config::AnalysisConfig::default();
        let row = resolve_with_config(&table, "app.counter", "app.counter", "nope", &config).unwrap();
        assert_eq!(row.domain_id, "lib.Unknown");
    }

    #[test]
    fn error_mode_still_fails_even_with_the_sentinel_registered() {
        let table = table_with(vec![]);
        let mut config = crate::config::AnalysisConfig::default();
        config.unresolved_symbol_mode = crate::config::UnresolvedSymbolMode::Error;
        let err = resolve_with_config(&table, "app.counter", "app.counter", "nope", &config).unwrap_err();
        assert!(matches!(err, AnalysisError::SymbolUnresolved { .. }));
    }
}
