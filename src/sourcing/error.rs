//! Errors raised by the sourcing pipeline

use std::path::PathBuf;
use thiserror::Error;

use crate::yaml::YamlError;

/// Errors from loading catalogs, building orders and writing their artifacts
#[derive(Debug, Error, miette::Diagnostic)]
pub enum SourcingError {
    #[error("Unknown vendor '{vendor}' (line {ident})")]
    UnknownVendor { vendor: String, ident: String },

    #[error("Vendor '{0}' is defined more than once")]
    DuplicateVendor(String),

    #[error("Vendor directory not found: {0}")]
    MissingVendorDir(PathBuf),

    #[error("Sourcing lookup failed for {ident}: {message}")]
    Lookup { ident: String, message: String },

    #[error("Invalid requirement on line {line}: {message}")]
    InvalidRequirement { line: u64, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
