//! End-to-end scenarios covering symbol-table construction and expression
//! type inference together, from raw CST entries down to resolved domain
//! ids.

use crate::config::{AnalysisConfig, UnresolvedSymbolMode};
use crate::symbol_table::build_symbol_table;
use crate::{inference, resolver};
use py2cpp_cst::{Entry, EntryNavigator, NodeQuery};

fn query_for(root: Entry) -> NodeQuery {
    NodeQuery::new(EntryNavigator::new(root))
}

#[test]
fn annotated_int_literal_resolves_through_the_annotation_and_the_literal() {
    // n: int = 1
    let assign = Entry::node(
        "anno_assign",
        vec![
            Entry::node("assign_symbol", vec![Entry::leaf("var_symbol", "n")]),
            Entry::node("assign_type", vec![Entry::leaf("var_symbol", "int")]),
            Entry::node("assign_value", vec![Entry::leaf("int_literal", "1")]),
        ],
    );
    let root = Entry::node(
        "file_input",
        vec![Entry::leaf("module_name", "main"), assign],
    );
    let query = query_for(root);
    let table = build_symbol_table(&query).unwrap();

    let row = table.get("main.n").unwrap();
    assert_eq!(row.kind.domain_id(), "lib.int");

    let literal_path = query.root_path().join("anno_assign").join("assign_value").join("int_literal");
    let literal_kind = inference::result_of(&query, &table, "main", &literal_path).unwrap();
    assert_eq!(literal_kind.domain_id(), "lib.int");
}

fn class_a_with_constructor(extra_statements: Vec<Entry>) -> Entry {
    let ctor_block = Entry::node("block", vec![]);
    let ctor = Entry::node(
        "function_def",
        vec![
            Entry::leaf("function_symbol", "__init__"),
            Entry::node("parameter", vec![Entry::leaf("param_symbol", "self")]),
            Entry::node("return_type", vec![Entry::leaf("var_symbol", "None")]),
            ctor_block,
        ],
    );
    let class_block = Entry::node("block", vec![ctor]);
    let class_def = Entry::node(
        "class_def",
        vec![Entry::leaf("class_symbol", "A"), class_block],
    );
    let mut children = vec![Entry::leaf("module_name", "main"), class_def];
    children.extend(extra_statements);
    Entry::node("file_input", children)
}

#[test]
fn constructor_call_resolves_to_the_owning_class() {
    // class A: def __init__(self) -> None: ...
    // b = A()
    let call = Entry::node(
        "move_assign",
        vec![
            Entry::node("assign_symbol", vec![Entry::leaf("var_symbol", "b")]),
            Entry::node(
                "assign_value",
                vec![Entry::node(
                    "func_call",
                    vec![Entry::node("callee", vec![Entry::leaf("var_symbol", "A")])],
                )],
            ),
        ],
    );
    let root = class_a_with_constructor(vec![call]);
    let query = query_for(root);
    let table = build_symbol_table(&query).unwrap();

    let row = table.get("main.b").unwrap();
    assert_eq!(row.kind.domain_id(), "main.A");
}

#[test]
fn list_attribute_assignment_reads_back_as_a_list() {
    // class A: def __init__(self): self.n: list[int] = []
    let anno = Entry::node(
        "anno_assign",
        vec![
            Entry::node(
                "assign_symbol",
                vec![Entry::leaf("this_var", "n")],
            ),
            Entry::node(
                "assign_type",
                vec![Entry::node(
                    "list_type",
                    vec![
                        Entry::node("type_symbol", vec![Entry::leaf("var_symbol", "list")]),
                        Entry::node("element_type", vec![Entry::leaf("var_symbol", "int")]),
                    ],
                )],
            ),
            Entry::node("assign_value", vec![Entry::node("list_literal", vec![])]),
        ],
    );
    let ctor = Entry::node(
        "function_def",
        vec![
            Entry::leaf("function_symbol", "__init__"),
            Entry::node("parameter", vec![Entry::leaf("param_symbol", "self")]),
            Entry::node("block", vec![anno]),
        ],
    );
    let class_def = Entry::node(
        "class_def",
        vec![
            Entry::leaf("class_symbol", "A"),
            Entry::node("block", vec![ctor]),
        ],
    );
    let root = Entry::node(
        "file_input",
        vec![Entry::leaf("module_name", "main"), class_def],
    );
    let query = query_for(root);
    let table = build_symbol_table(&query).unwrap();

    let row = table.get("main.A.n").unwrap();
    assert_eq!(row.kind.domain_id(), "lib.list");
}

#[test]
fn method_resolves_via_inheritance() {
    // class A: def m(self) -> str: ...
    // class B(A): ...
    let method_block = Entry::node("block", vec![]);
    let method = Entry::node(
        "function_def",
        vec![
            Entry::leaf("function_symbol", "m"),
            Entry::node("parameter", vec![Entry::leaf("param_symbol", "self")]),
            Entry::node("return_type", vec![Entry::leaf("var_symbol", "str")]),
            method_block,
        ],
    );
    let class_a = Entry::node(
        "class_def",
        vec![
            Entry::leaf("class_symbol", "A"),
            Entry::node("block", vec![method]),
        ],
    );
    let class_b = Entry::node(
        "class_def",
        vec![
            Entry::leaf("class_symbol", "B"),
            Entry::node("parent_symbol", vec![Entry::leaf("var_symbol", "A")]),
            Entry::node("block", vec![]),
        ],
    );
    let root = Entry::node(
        "file_input",
        vec![Entry::leaf("module_name", "main"), class_a, class_b],
    );
    let query = query_for(root);
    let table = build_symbol_table(&query).unwrap();

    let row = resolver::resolve(&table, "main.B", "main", "m").unwrap();
    assert_eq!(row.domain_id, "main.A.m");
    assert_eq!(row.kind.domain_id(), "main.A.m");

    // calling B().m() ultimately reads the method's declared return type
    let method_decl = row.decl.unwrap();
    let method_node = query.by(method_decl.as_str()).unwrap();
    let return_type = match &method_node.kind {
        py2cpp_cst::NodeKind::Function(f) => f.return_type.clone().unwrap(),
        _ => panic!("expected a function"),
    };
    let return_kind =
        crate::symbol_table::resolve_type_ref(&query, &table, &method_node.scope, "main", &return_type)
            .unwrap();
    assert_eq!(return_kind.domain_id(), "lib.str");
}

#[test]
fn unresolved_reference_honors_the_configured_mode() {
    let root = Entry::node(
        "file_input",
        vec![Entry::leaf("module_name", "main")],
    );
    let query = query_for(root);
    let table = build_symbol_table(&query).unwrap();

    let sentinel_config = AnalysisConfig::default();
    let row = resolver::resolve_with_config(&table, "main", "main", "ghost", &sentinel_config).unwrap();
    assert_eq!(row.domain_id, "lib.Unknown");

    let mut strict_config = AnalysisConfig::default();
    strict_config.unresolved_symbol_mode = UnresolvedSymbolMode::Error;
    let err = resolver::resolve_with_config(&table, "main", "main", "ghost", &strict_config).unwrap_err();
    assert!(matches!(err, crate::error::AnalysisError::SymbolUnresolved { .. }));
}

#[test]
fn binary_operator_dispatch_matches_a_union_alternative_and_rejects_the_other() {
    // class V: def __add__(self, o: "V | float") -> "V": ...
    let add_block = Entry::node("block", vec![]);
    let add_method = Entry::node(
        "function_def",
        vec![
            Entry::leaf("function_symbol", "__add__"),
            Entry::node("parameter", vec![Entry::leaf("param_symbol", "self")]),
            Entry::node(
                "parameter",
                vec![
                    Entry::leaf("param_symbol", "o"),
                    Entry::node(
                        "param_type",
                        vec![Entry::node(
                            "union_type",
                            vec![
                                Entry::node("union_member", vec![Entry::leaf("var_symbol", "V")]),
                                Entry::node("union_member", vec![Entry::leaf("var_symbol", "float")]),
                            ],
                        )],
                    ),
                ],
            ),
            Entry::node("return_type", vec![Entry::leaf("var_symbol", "V")]),
            add_block,
        ],
    );
    let class_v = Entry::node(
        "class_def",
        vec![
            Entry::leaf("class_symbol", "V"),
            Entry::node("block", vec![add_method]),
        ],
    );

    // ok = V() + V()
    let lhs_call = Entry::node(
        "func_call",
        vec![Entry::node("callee", vec![Entry::leaf("var_symbol", "V")])],
    );
    let rhs_call = Entry::node(
        "func_call",
        vec![Entry::node("callee", vec![Entry::leaf("var_symbol", "V")])],
    );
    let good_add = Entry::node(
        "sum_op",
        vec![
            Entry::node("left", vec![lhs_call]),
            Entry::node("right", vec![rhs_call]),
        ],
    );
    let good_assign = Entry::node(
        "move_assign",
        vec![
            Entry::node("assign_symbol", vec![Entry::leaf("var_symbol", "ok")]),
            Entry::node("assign_value", vec![good_add]),
        ],
    );

    // V() + "text", left unassigned at module scope so table-building skips
    // over it (not a recognized statement kind) but it stays reachable by
    // path through the same query for a direct `result_of` call.
    let lhs_call_2 = Entry::node(
        "func_call",
        vec![Entry::node("callee", vec![Entry::leaf("var_symbol", "V")])],
    );
    let bad_add = Entry::node(
        "sum_op",
        vec![
            Entry::node("left", vec![lhs_call_2]),
            Entry::node("right", vec![Entry::leaf("string_literal", "text")]),
        ],
    );

    let root = Entry::node(
        "file_input",
        vec![
            Entry::leaf("module_name", "main"),
            class_v,
            good_assign,
            bad_add,
        ],
    );
    let query = query_for(root);
    let table = build_symbol_table(&query).unwrap();

    let ok_row = table.get("main.ok").unwrap();
    assert_eq!(ok_row.kind.domain_id(), "main.V");

    let bad_path = query.root_path().join("sum_op");
    let err = inference::result_of(&query, &table, "main", &bad_path).unwrap_err();
    assert!(matches!(err, crate::error::AnalysisError::OperationNotAllowed { .. }));
}
