//! Core module - configuration, currency, duties, logging and project discovery

pub mod config;
pub mod currency;
pub mod duties;
pub mod logging;
pub mod project;

pub use config::{Config, ConfigError};
pub use currency::{CurrencyDefinition, CurrencyValue};
pub use duties::{assess, InvoiceAssessment};
pub use project::{Project, ProjectError};
