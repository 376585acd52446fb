//! The primitive/library module: the handful of always-available symbols
//! (`int`, `float`, `str`, `bool`, `tuple`, `list`, `dict`, `None`,
//! `Unknown`, `super`) every session shares read-only, plus the literal-tag
//! to primitive-class alias table used to type literal expressions.

use crate::symbol_table::{SymbolKind, SymbolRow};

/// The synthetic module path under which primitives are registered, so a
/// primitive's `domain_id` reads `lib.int`, `lib.Unknown`, etc., in the
/// `<library-module>.<name>` form.
pub const PRIMITIVE_MODULE: &str = "lib";

pub const PRIMITIVE_NAMES: &[&str] = &[
    "int", "float", "str", "bool", "tuple", "list", "dict", "None", "Unknown", "super",
];

pub fn primitive_rows() -> Vec<SymbolRow> {
    PRIMITIVE_NAMES
        .iter()
        .map(|name| {
            let domain_id = py2cpp_cst::domain_path::join([PRIMITIVE_MODULE, name]);
            SymbolRow {
                domain_id: domain_id.clone(),
                scope: PRIMITIVE_MODULE.to_string(),
                symbol: name.to_string(),
                kind: SymbolKind::Class { domain_id },
                decl: None,
                type_expr: None,
            }
        })
        .collect()
}

/// Re-exported so callers building AST literal nodes don't need to reach
/// into `py2cpp_cst` directly for this one table.
pub use py2cpp_cst::literal_class_alias;

/// The sentinel type returned for an unresolved symbol when
/// `UnresolvedSymbolMode::Sentinel` is configured.
pub const UNKNOWN: &str = "Unknown";

/// `lib.Unknown` — the full domain id of the sentinel row.
pub fn unknown_domain_id() -> String {
    py2cpp_cst::domain_path::join([PRIMITIVE_MODULE, UNKNOWN])
}

/// `lib.<name>`, for building a primitive-lookup key directly.
pub fn domain_id_of(name: &str) -> String {
    py2cpp_cst::domain_path::join([PRIMITIVE_MODULE, name])
}
