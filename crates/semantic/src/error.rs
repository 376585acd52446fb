use py2cpp_cst::CstError;
use thiserror::Error;

/// Errors surfaced by symbol-table building, symbol-path resolution, and
/// expression inference. All are fatal: there is no retry and no partial
/// result once one of these is raised mid-operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("symbol `{symbol}` does not resolve in scope `{scope}`")]
    SymbolUnresolved { scope: String, symbol: String },

    #[error("`{op}` not allowed between `{left}` and `{right}` (at `{node}`)")]
    OperationNotAllowed {
        node: String,
        left: String,
        right: String,
        op: String,
    },

    #[error("operation unsupported on `{node}`")]
    OperationUnsupported { node: String },

    #[error("logic error: {0}")]
    Logic(String),

    #[error(transparent)]
    Cst(#[from] CstError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
