//! CST navigation and on-demand AST realization.
//!
//! Four collaborators, each named after the role it plays in turning an
//! opaque concrete syntax tree into addressable, typed nodes:
//!
//! - [`path`] — dotted-path algebra (`domain_path`) plus indexed full-path
//!   addressing (`FullPath`).
//! - [`entry`] / [`navigator`] — the CST itself (`Entry`) and the
//!   full-path index built over it (`EntryNavigator`).
//! - [`registry`] — tag-to-node-class mapping and the instance cache
//!   (`NodeRegistry`).
//! - [`query`] / [`ast`] — the AST surface: realized nodes (`ASTNode`) and
//!   the query operations that produce and relate them (`NodeQuery`).

pub mod ast;
pub mod entry;
pub mod error;
pub mod navigator;
pub mod path;
pub mod query;
pub mod registry;

pub use ast::{
    access_level, ASTNode, AssignNode, BinaryOperator, FunctionKind, FunctionNode, GenericTypeNode,
    LiteralKind, NodeKind, Visibility,
};
pub use entry::{Entry, EntryProxy};
pub use error::{CstError, Result};
pub use navigator::EntryNavigator;
pub use path::{FullPath, Segment, EMPTY_TAG};
pub use query::NodeQuery;
pub use registry::{literal_class_alias, NodeRegistry};

/// Dotted-string algebra over symbol domain ids (`scope.symbol`), kept
/// under its own name since `crates/semantic` leans on it heavily for
/// `join`/`left`/`right` without caring about indexed CST paths.
pub mod domain_path {
    pub use crate::path::{elements, join, left, parent, right, root};
}
