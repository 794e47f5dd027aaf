//! Requirement lists - what a build needs, read from CSV
//!
//! ```text
//! ident,required,shortage
//! RES SMD 10K 0603,120,80
//! IC NE555 DIP8,4,
//! ```
//!
//! An empty or missing shortage means nothing is in stock.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::sourcing::error::SourcingError;

/// One required ident
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Requirement {
    pub ident: String,

    pub required: u32,

    #[serde(default)]
    pub shortage: Option<u32>,
}

impl Requirement {
    /// Shortage, defaulting to the full requirement
    pub fn shortage(&self) -> u32 {
        self.shortage.unwrap_or(self.required)
    }
}

/// Read requirements from a CSV file
pub fn read_requirements(path: &Path) -> Result<Vec<Requirement>, SourcingError> {
    let file = std::fs::File::open(path)?;
    parse_requirements(file)
}

/// Parse requirements from CSV with an `ident,required[,shortage]` header
pub fn parse_requirements<R: Read>(reader: R) -> Result<Vec<Requirement>, SourcingError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| SourcingError::InvalidRequirement {
            line: 1,
            message: e.to_string(),
        })?
        .clone();

    let mut requirements = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| SourcingError::InvalidRequirement {
            line: e.position().map_or(idx as u64 + 2, |p| p.line()),
            message: e.to_string(),
        })?;
        // Comment lines count, so this can run ahead of the record index
        let line = record.position().map_or(idx as u64 + 2, |p| p.line());
        let req: Requirement = record
            .deserialize(Some(&headers))
            .map_err(|e| SourcingError::InvalidRequirement {
                line,
                message: e.to_string(),
            })?;
        if req.ident.is_empty() {
            return Err(SourcingError::InvalidRequirement {
                line,
                message: "ident is empty".to_string(),
            });
        }
        if req.shortage() > req.required {
            return Err(SourcingError::InvalidRequirement {
                line,
                message: format!(
                    "shortage {} exceeds required quantity {}",
                    req.shortage(),
                    req.required
                ),
            });
        }
        requirements.push(req);
    }
    Ok(requirements)
}
