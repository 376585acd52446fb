//! Tag-to-class registry: maps a CST tag to an AST-node constructor, with a
//! second "actualization" pass that refines a constructed node into a more
//! specific shape (`Function` -> `Constructor`/`ClassMethod`/`Method`).

use crate::ast::{
    AssignNode, BinaryOperator, FunctionKind, FunctionNode, GenericTypeNode, LiteralKind, NodeKind,
};
use crate::entry::Entry;
use crate::path::FullPath;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Everything a tag constructor needs to pull typed children out of the raw
/// entry, addressed by the role-tag convention a grammar producing this CST
/// is expected to follow (`assign_symbol`, `return_type`, `block`, ...)
/// rather than by fixed child position.
pub struct BuildCtx<'a> {
    pub entry: &'a Entry,
    pub full_path: &'a FullPath,
}

impl<'a> BuildCtx<'a> {
    fn child_path(&self, tag: &str) -> Option<FullPath> {
        self.entry.child(tag)?;
        let siblings = self.entry.children_tagged(tag);
        let segment = if siblings.len() > 1 {
            format!("{tag}[0]")
        } else {
            tag.to_string()
        };
        Some(self.full_path.join(segment))
    }

    fn children_paths(&self, tag: &str) -> Vec<FullPath> {
        let count = self.entry.children_tagged(tag).len();
        (0..count)
            .map(|i| {
                let segment = if count > 1 {
                    format!("{tag}[{i}]")
                } else {
                    tag.to_string()
                };
                self.full_path.join(segment)
            })
            .collect()
    }

    fn terminal_value(&self, tag: &str) -> Option<String> {
        self.entry.child(tag).and_then(|c| c.value.clone())
    }
}

type Constructor = fn(&BuildCtx) -> NodeKind;

fn build_module(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Module {
        module_path: ctx
            .terminal_value("module_name")
            .unwrap_or_else(|| "__main__".to_string()),
        statements: ctx
            .entry
            .children
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let tag = &ctx.entry.children[i].tag;
                let count = ctx.entry.children_tagged(tag).len();
                let idx_within = ctx.entry.children[..=i]
                    .iter()
                    .filter(|c| &c.tag == tag)
                    .count()
                    - 1;
                let segment = if count > 1 {
                    format!("{tag}[{idx_within}]")
                } else {
                    tag.clone()
                };
                ctx.full_path.join(segment)
            })
            .collect(),
    }
}

fn build_class(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Class {
        symbol: ctx.terminal_value("class_symbol").unwrap_or_default(),
        parents: ctx.children_paths("parent_symbol"),
        body: ctx
            .child_path("block")
            .unwrap_or_else(|| ctx.full_path.join("block")),
    }
}

fn build_function(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Function(FunctionNode {
        kind: FunctionKind::Plain,
        name: ctx.terminal_value("function_symbol").unwrap_or_default(),
        decorators: ctx
            .entry
            .children_tagged("decorator")
            .iter()
            .filter_map(|d| d.value.clone())
            .collect(),
        params: ctx.children_paths("parameter"),
        return_type: ctx.child_path("return_type"),
        body: ctx
            .child_path("block")
            .unwrap_or_else(|| ctx.full_path.join("block")),
        owner_class: None,
    })
}

fn build_block(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Block {
        statements: ctx
            .entry
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                let count = ctx.entry.children_tagged(&child.tag).len();
                let idx_within = ctx.entry.children[..=i]
                    .iter()
                    .filter(|c| c.tag == child.tag)
                    .count()
                    - 1;
                let segment = if count > 1 {
                    format!("{}[{}]", child.tag, idx_within)
                } else {
                    child.tag.clone()
                };
                ctx.full_path.join(segment)
            })
            .collect(),
    }
}

fn build_parameter(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Parameter {
        symbol: ctx.terminal_value("param_symbol").unwrap_or_default(),
        var_type: ctx.child_path("param_type"),
    }
}

fn build_decorator(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Decorator {
        name: ctx
            .entry
            .value
            .clone()
            .or_else(|| ctx.terminal_value("decorator_name"))
            .unwrap_or_default(),
    }
}

fn build_argument(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Argument {
        value: ctx
            .child_path("argument_value")
            .unwrap_or_else(|| ctx.full_path.join("argument_value")),
    }
}

fn build_if(ctx: &BuildCtx) -> NodeKind {
    NodeKind::If {
        condition: ctx
            .child_path("condition")
            .unwrap_or_else(|| ctx.full_path.join("condition")),
        body: ctx
            .child_path("block")
            .unwrap_or_else(|| ctx.full_path.join("block")),
    }
}

fn build_elif(ctx: &BuildCtx) -> NodeKind {
    NodeKind::ElseIf {
        condition: ctx
            .child_path("condition")
            .unwrap_or_else(|| ctx.full_path.join("condition")),
        body: ctx
            .child_path("block")
            .unwrap_or_else(|| ctx.full_path.join("block")),
    }
}

fn build_while(ctx: &BuildCtx) -> NodeKind {
    NodeKind::While {
        condition: ctx
            .child_path("condition")
            .unwrap_or_else(|| ctx.full_path.join("condition")),
        body: ctx
            .child_path("block")
            .unwrap_or_else(|| ctx.full_path.join("block")),
    }
}

fn build_for(ctx: &BuildCtx) -> NodeKind {
    NodeKind::For {
        target: ctx
            .child_path("for_target")
            .unwrap_or_else(|| ctx.full_path.join("for_target")),
        iterable: ctx
            .child_path("iterable")
            .unwrap_or_else(|| ctx.full_path.join("iterable")),
        body: ctx
            .child_path("block")
            .unwrap_or_else(|| ctx.full_path.join("block")),
    }
}

fn build_move_assign(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Assign(AssignNode::Move {
        symbol: ctx
            .child_path("assign_symbol")
            .unwrap_or_else(|| ctx.full_path.join("assign_symbol")),
        value: ctx
            .child_path("assign_value")
            .unwrap_or_else(|| ctx.full_path.join("assign_value")),
    })
}

fn build_anno_assign(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Assign(AssignNode::Anno {
        symbol: ctx
            .child_path("assign_symbol")
            .unwrap_or_else(|| ctx.full_path.join("assign_symbol")),
        var_type: ctx
            .child_path("assign_type")
            .unwrap_or_else(|| ctx.full_path.join("assign_type")),
        value: ctx.child_path("assign_value"),
    })
}

fn build_aug_assign(ctx: &BuildCtx) -> NodeKind {
    let op = match ctx.terminal_value("assign_op").as_deref() {
        Some("-=") => BinaryOperator::Sub,
        Some("*=") => BinaryOperator::Mul,
        Some("/=") => BinaryOperator::Div,
        _ => BinaryOperator::Add,
    };
    NodeKind::Assign(AssignNode::Aug {
        symbol: ctx
            .child_path("assign_symbol")
            .unwrap_or_else(|| ctx.full_path.join("assign_symbol")),
        op,
        value: ctx
            .child_path("assign_value")
            .unwrap_or_else(|| ctx.full_path.join("assign_value")),
    })
}

fn build_return(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Return {
        value: ctx.child_path("return_value"),
    }
}

fn build_import(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Import {
        module: ctx
            .entry
            .value
            .clone()
            .or_else(|| ctx.terminal_value("module_name"))
            .unwrap_or_default(),
    }
}

fn build_symbol(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Symbol {
        name: ctx.entry.value.clone().unwrap_or_default(),
    }
}

fn build_this(_ctx: &BuildCtx) -> NodeKind {
    NodeKind::This
}

fn build_this_var(ctx: &BuildCtx) -> NodeKind {
    NodeKind::ThisVar {
        name: ctx
            .entry
            .value
            .clone()
            .or_else(|| ctx.terminal_value("var_name"))
            .unwrap_or_default(),
    }
}

fn build_indexer(ctx: &BuildCtx) -> NodeKind {
    NodeKind::Indexer {
        container: ctx
            .child_path("container")
            .unwrap_or_else(|| ctx.full_path.join("container")),
        key: ctx
            .child_path("key")
            .unwrap_or_else(|| ctx.full_path.join("key")),
    }
}

fn build_list_type(ctx: &BuildCtx) -> NodeKind {
    NodeKind::GenericType(GenericTypeNode::List {
        symbol: ctx
            .child_path("type_symbol")
            .unwrap_or_else(|| ctx.full_path.join("type_symbol")),
        element: ctx
            .child_path("element_type")
            .unwrap_or_else(|| ctx.full_path.join("element_type")),
    })
}

fn build_dict_type(ctx: &BuildCtx) -> NodeKind {
    NodeKind::GenericType(GenericTypeNode::Dict {
        symbol: ctx
            .child_path("type_symbol")
            .unwrap_or_else(|| ctx.full_path.join("type_symbol")),
        key: ctx
            .child_path("key_type")
            .unwrap_or_else(|| ctx.full_path.join("key_type")),
        value: ctx
            .child_path("value_type")
            .unwrap_or_else(|| ctx.full_path.join("value_type")),
    })
}

fn build_union_type(ctx: &BuildCtx) -> NodeKind {
    NodeKind::GenericType(GenericTypeNode::Union {
        alternatives: ctx.children_paths("union_member"),
    })
}

fn build_generic_type(ctx: &BuildCtx) -> NodeKind {
    NodeKind::GenericType(GenericTypeNode::Plain {
        symbol: ctx
            .child_path("type_symbol")
            .unwrap_or_else(|| ctx.full_path.join("type_symbol")),
        type_args: ctx.children_paths("type_arg"),
    })
}

fn build_func_call(ctx: &BuildCtx) -> NodeKind {
    NodeKind::FuncCall {
        callee: ctx
            .child_path("callee")
            .unwrap_or_else(|| ctx.full_path.join("callee")),
        arguments: ctx.children_paths("argument"),
    }
}

fn build_super(_ctx: &BuildCtx) -> NodeKind {
    NodeKind::Super
}

fn binary_op(op: BinaryOperator) -> Constructor {
    match op {
        BinaryOperator::Add => |ctx| build_binary_op(ctx, BinaryOperator::Add),
        BinaryOperator::Sub => |ctx| build_binary_op(ctx, BinaryOperator::Sub),
        BinaryOperator::Mul => |ctx| build_binary_op(ctx, BinaryOperator::Mul),
        BinaryOperator::Div => |ctx| build_binary_op(ctx, BinaryOperator::Div),
    }
}

fn build_binary_op(ctx: &BuildCtx, op: BinaryOperator) -> NodeKind {
    NodeKind::BinaryOp {
        op,
        left: ctx
            .child_path("left")
            .unwrap_or_else(|| ctx.full_path.join("left")),
        right: ctx
            .child_path("right")
            .unwrap_or_else(|| ctx.full_path.join("right")),
    }
}

fn literal(kind: LiteralKind) -> Constructor {
    match kind {
        LiteralKind::Integer => |ctx| build_literal(ctx, LiteralKind::Integer),
        LiteralKind::Float => |ctx| build_literal(ctx, LiteralKind::Float),
        LiteralKind::String => |ctx| build_literal(ctx, LiteralKind::String),
        LiteralKind::Truthy => |ctx| build_literal(ctx, LiteralKind::Truthy),
        LiteralKind::Falsy => |ctx| build_literal(ctx, LiteralKind::Falsy),
        LiteralKind::List => |ctx| build_literal(ctx, LiteralKind::List),
        LiteralKind::Dict => |ctx| build_literal(ctx, LiteralKind::Dict),
    }
}

fn build_literal(ctx: &BuildCtx, kind: LiteralKind) -> NodeKind {
    NodeKind::Literal {
        kind,
        elements: ctx.children_paths("element"),
    }
}

/// Role-position tags: a grammar slot that holds exactly one nested real
/// node (whose own tag drives construction) rather than being a node class
/// in its own right. `BuildCtx::child_path`/`children_paths` address these
/// by the role name the grammar tags them with (`assign_value`,
/// `return_type`, `callee`, ...); [`NodeQuery::by`] redirects a path ending
/// in one of these straight through to its single child before dispatching
/// to a constructor, so the role name never needs its own entry in the
/// constructor table.
const WRAPPER_TAGS: &[&str] = &[
    "assign_symbol",
    "assign_value",
    "assign_type",
    "return_type",
    "return_value",
    "param_type",
    "type_symbol",
    "element_type",
    "key_type",
    "value_type",
    "union_member",
    "parent_symbol",
    "condition",
    "container",
    "key",
    "callee",
    "left",
    "right",
    "for_target",
    "iterable",
    "argument_value",
    "element",
    "type_arg",
];

pub fn is_wrapper_tag(tag: &str) -> bool {
    WRAPPER_TAGS.contains(&tag)
}

/// `tag -> primitive class name` used both to build a `Symbol` node for a
/// bare literal tag and to seed the primitive-alias table the semantic
/// layer consumes (`crates/semantic/src/primitives.rs`).
pub fn literal_class_alias(tag: &str) -> Option<&'static str> {
    match tag {
        "int_literal" => Some("int"),
        "float_literal" => Some("float"),
        "string_literal" => Some("str"),
        "truthy_literal" | "falsy_literal" => Some("bool"),
        "list_literal" => Some("list"),
        "dict_literal" => Some("dict"),
        _ => None,
    }
}

/// Returns `true` if the base `Function` node should be refined into
/// `Constructor`: its name is `__init__`.
fn matches_constructor(f: &FunctionNode) -> bool {
    f.name == "__init__"
}

/// `true` if the function's first decorator is `classmethod`.
fn matches_classmethod(f: &FunctionNode) -> bool {
    f.decorators.first().map(|d| d.as_str()) == Some("classmethod")
}

/// `true` if the function's enclosing scope is a class and its first
/// parameter is `self` (the only "is This" signal available at the
/// parameter-declaration level in this grammar).
fn matches_method(f: &FunctionNode, owner_class: &Option<FullPath>, first_param_symbol: Option<&str>) -> bool {
    owner_class.is_some() && first_param_symbol == Some("self")
}

/// Refines a freshly built `Function` node in declaration order: the first
/// matching predicate wins and the rest are never tried, mirroring
/// py2cpp's `actualized(via=...)` / `match_feature` mechanism.
pub fn refine_function(
    mut f: FunctionNode,
    owner_class: Option<FullPath>,
    first_param_symbol: Option<&str>,
) -> FunctionNode {
    f.owner_class = owner_class.clone();
    f.kind = if matches_constructor(&f) {
        FunctionKind::Constructor
    } else if matches_classmethod(&f) {
        FunctionKind::ClassMethod
    } else if matches_method(&f, &owner_class, first_param_symbol) {
        FunctionKind::Method
    } else {
        FunctionKind::Plain
    };
    f
}

/// Tag -> constructor table: the only place a CST tag string is mapped to
/// the function that builds its `NodeKind`.
fn constructors() -> HashMap<&'static str, Constructor> {
    let mut m: HashMap<&'static str, Constructor> = HashMap::new();
    m.insert("file_input", build_module);
    m.insert("class_def", build_class);
    m.insert("function_def", build_function);
    m.insert("block", build_block);
    m.insert("parameter", build_parameter);
    m.insert("decorator", build_decorator);
    m.insert("argument", build_argument);
    m.insert("if_stmt", build_if);
    m.insert("elif_stmt", build_elif);
    m.insert("while_stmt", build_while);
    m.insert("for_stmt", build_for);
    m.insert("move_assign", build_move_assign);
    m.insert("anno_assign", build_anno_assign);
    m.insert("aug_assign", build_aug_assign);
    m.insert("return_stmt", build_return);
    m.insert("import_stmt", build_import);
    m.insert("var_symbol", build_symbol);
    m.insert("this", build_this);
    m.insert("this_var", build_this_var);
    m.insert("indexer", build_indexer);
    m.insert("list_type", build_list_type);
    m.insert("dict_type", build_dict_type);
    m.insert("union_type", build_union_type);
    m.insert("generic_type", build_generic_type);
    m.insert("func_call", build_func_call);
    m.insert("super", build_super);
    m.insert("sum_op", binary_op(BinaryOperator::Add));
    m.insert("sub_op", binary_op(BinaryOperator::Sub));
    m.insert("mul_op", binary_op(BinaryOperator::Mul));
    m.insert("div_op", binary_op(BinaryOperator::Div));
    m.insert("int_literal", literal(LiteralKind::Integer));
    m.insert("float_literal", literal(LiteralKind::Float));
    m.insert("string_literal", literal(LiteralKind::String));
    m.insert("truthy_literal", literal(LiteralKind::Truthy));
    m.insert("falsy_literal", literal(LiteralKind::Falsy));
    m.insert("list_literal", literal(LiteralKind::List));
    m.insert("dict_literal", literal(LiteralKind::Dict));
    m
}

/// Tag-to-node-class mapping plus the path-memoized instance cache.
/// `accept_tags`/`expandable` metadata lives implicitly in this table: a
/// tag present here is resolvable, everything else is opaque to the AST
/// layer and only ever seen through `NodeQuery::expand`.
pub struct NodeRegistry {
    constructors: HashMap<&'static str, Constructor>,
    instances: RefCell<HashMap<String, Rc<crate::ast::ASTNode>>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            constructors: constructors(),
            instances: RefCell::new(HashMap::new()),
        }
    }

    pub fn can_resolve(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn constructor(&self, tag: &str) -> Option<Constructor> {
        self.constructors.get(tag).copied()
    }

    pub fn cached(&self, path: &str) -> Option<Rc<crate::ast::ASTNode>> {
        self.instances.borrow().get(path).cloned()
    }

    pub fn cache(&self, path: String, node: Rc<crate::ast::ASTNode>) {
        self.instances.borrow_mut().insert(path, node);
    }

    pub fn clear(&self) {
        self.instances.borrow_mut().clear();
    }
}
