//! tsrc: Plain-text electronics sourcing toolkit
//!
//! Prices requirement lists against vendor price lists kept as YAML files,
//! consolidates orders onto fewer vendors, writes sourcing reports and vendor
//! orders, and assesses import duties on vendor invoices.

pub mod cli;
pub mod core;
pub mod entities;
pub mod sourcing;
pub mod yaml;
