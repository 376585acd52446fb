use thiserror::Error;

/// Errors surfaced by the CST/AST layer.
///
/// Every lookup that walks a full path (navigator, registry, query) ends up
/// here if the path doesn't resolve; there is exactly one failure mode at
/// this layer, matching how far down the stack a missing entry can get
/// before it is someone else's problem (the semantic layer turns `NotFound`
/// into its own richer error variants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CstError {
    #[error("no entry at path `{path}`")]
    NotFound { path: String },
}

pub type Result<T> = std::result::Result<T, CstError>;
