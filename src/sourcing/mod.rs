//! Sourcing - vendor offers, composite orders and vendor consolidation

pub mod error;
pub mod info;
pub mod line;
pub mod order;
pub mod provider;
pub mod rebalance;
pub mod report;
pub mod requirements;
pub mod vendor_order;

pub use error::SourcingError;
pub use info::SourceInfo;
pub use line::OrderLine;
pub use order::CompositeOrder;
pub use provider::{Catalog, SourcingProvider};
pub use rebalance::{LineMove, RebalanceOutcome};
pub use requirements::{read_requirements, Requirement};
pub use vendor_order::VendorOrder;
