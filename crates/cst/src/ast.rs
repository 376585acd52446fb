//! The polymorphic AST layered on top of the CST.
//!
//! Each [`ASTNode`] is a pure value keyed by its [`FullPath`]; it never
//! holds references to its children directly. Traversal always goes back
//! through [`crate::query::NodeQuery`], which is how the cyclic
//! node-needs-query / query-caches-nodes relationship from the design notes
//! is broken without `Rc<RefCell<_>>` cycles: nodes borrow nothing, they
//! just carry the paths needed to ask for more.

use crate::path::FullPath;

/// Derived from name mangling: leading double-underscore is `Private`,
/// single leading underscore is `Protected`, anything else is `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

/// `__x__` -> public, `__x` -> private, `_x` -> protected, else public.
pub fn access_level(name: &str) -> Visibility {
    if name.starts_with("__") && name.ends_with("__") && name.len() > 4 {
        Visibility::Public
    } else if name.starts_with("__") {
        Visibility::Private
    } else if name.starts_with('_') {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    /// The dunder method looked up on the left operand's class during
    /// binary-operator inference.
    pub fn dunder(self) -> &'static str {
        match self {
            BinaryOperator::Add => "__add__",
            BinaryOperator::Sub => "__sub__",
            BinaryOperator::Mul => "__mul__",
            BinaryOperator::Div => "__truediv__",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Plain,
    Constructor,
    ClassMethod,
    Method,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub kind: FunctionKind,
    pub name: String,
    pub decorators: Vec<String>,
    pub params: Vec<FullPath>,
    pub return_type: Option<FullPath>,
    pub body: FullPath,
    /// The `Class` this function is lexically inside, if any. Set for every
    /// function whose enclosing scope-contributing ancestor is a `Class`;
    /// used to refine `Constructor`/`Method`/`ClassMethod`.
    pub owner_class: Option<FullPath>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenericTypeNode {
    List {
        symbol: FullPath,
        element: FullPath,
    },
    Dict {
        symbol: FullPath,
        key: FullPath,
        value: FullPath,
    },
    Union {
        alternatives: Vec<FullPath>,
    },
    /// A generic type with no specialized shape recognized (e.g. a bare
    /// user-defined generic class reference).
    Plain {
        symbol: FullPath,
        type_args: Vec<FullPath>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignNode {
    Move {
        symbol: FullPath,
        value: FullPath,
    },
    Anno {
        symbol: FullPath,
        var_type: FullPath,
        value: Option<FullPath>,
    },
    Aug {
        symbol: FullPath,
        op: BinaryOperator,
        value: FullPath,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Truthy,
    Falsy,
    List,
    Dict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Module {
        module_path: String,
        statements: Vec<FullPath>,
    },
    Class {
        symbol: String,
        parents: Vec<FullPath>,
        body: FullPath,
    },
    Function(FunctionNode),
    Block {
        statements: Vec<FullPath>,
    },
    Parameter {
        symbol: String,
        var_type: Option<FullPath>,
    },
    Decorator {
        name: String,
    },
    Argument {
        value: FullPath,
    },
    If {
        condition: FullPath,
        body: FullPath,
    },
    ElseIf {
        condition: FullPath,
        body: FullPath,
    },
    While {
        condition: FullPath,
        body: FullPath,
    },
    For {
        target: FullPath,
        iterable: FullPath,
        body: FullPath,
    },
    Assign(AssignNode),
    Return {
        value: Option<FullPath>,
    },
    Import {
        module: String,
    },
    Symbol {
        name: String,
    },
    This,
    ThisVar {
        name: String,
    },
    Indexer {
        container: FullPath,
        key: FullPath,
    },
    GenericType(GenericTypeNode),
    FuncCall {
        callee: FullPath,
        arguments: Vec<FullPath>,
    },
    Super,
    BinaryOp {
        op: BinaryOperator,
        left: FullPath,
        right: FullPath,
    },
    Literal {
        kind: LiteralKind,
        elements: Vec<FullPath>,
    },
    /// A CST tag the registry has no constructor for; inference never
    /// targets these directly but `NodeQuery::expand` can fall through to
    /// them when nothing resolvable sits underneath.
    Terminal {
        value: Option<String>,
    },
}

impl NodeKind {
    /// Module, Class, and Function are the scope-contributing variants: a
    /// node's `scope` is built by folding these, not every ancestor, the
    /// way spec's scope rule is stated.
    pub fn contributes_scope(&self) -> bool {
        matches!(
            self,
            NodeKind::Module { .. } | NodeKind::Class { .. } | NodeKind::Function(_)
        )
    }

    /// The name this node contributes to its children's scope chain.
    pub fn scope_contribution(&self) -> Option<&str> {
        match self {
            NodeKind::Module { module_path, .. } => Some(module_path.as_str()),
            NodeKind::Class { symbol, .. } => Some(symbol.as_str()),
            NodeKind::Function(f) => Some(f.name.as_str()),
            _ => None,
        }
    }
}

/// A realized AST node: identity (`full_path`), the scope/namespace it was
/// built in, and its variant payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub full_path: FullPath,
    /// Dotted scope this node is declared *in* (module + enclosing
    /// class/function chain, not including itself).
    pub scope: String,
    /// Dotted namespace this node is declared in — module + enclosing
    /// class chain only, functions don't nest the C++-facing namespace.
    pub namespace: String,
    pub kind: NodeKind,
}

impl ASTNode {
    pub fn new(full_path: FullPath, scope: String, namespace: String, kind: NodeKind) -> Self {
        Self {
            full_path,
            scope,
            namespace,
            kind,
        }
    }

    /// The node's own declared name, for variants that have one.
    pub fn own_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Class { symbol, .. } => Some(symbol.as_str()),
            NodeKind::Function(f) => Some(f.name.as_str()),
            NodeKind::Parameter { symbol, .. } => Some(symbol.as_str()),
            NodeKind::Symbol { name } => Some(name.as_str()),
            NodeKind::ThisVar { name } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn access_level(&self) -> Option<Visibility> {
        self.own_name().map(access_level)
    }
}
