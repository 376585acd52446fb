//! Configuration surface for the analysis core.

use serde::Deserialize;
use std::path::Path;

/// How a lookup that falls through every candidate (including the
/// primitive/library table) should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedSymbolMode {
    /// Return the `Unknown` sentinel row instead of failing.
    Sentinel,
    /// Raise `AnalysisError::SymbolUnresolved`.
    Error,
}

impl Default for UnresolvedSymbolMode {
    fn default() -> Self {
        UnresolvedSymbolMode::Sentinel
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Extra module search roots consulted when resolving imports into
    /// library symbols; empty by default since the core ships with the
    /// primitive module already registered.
    pub library_paths: Vec<String>,
    pub unresolved_symbol_mode: UnresolvedSymbolMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            library_paths: Vec::new(),
            unresolved_symbol_mode: UnresolvedSymbolMode::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
