//! Entity type definitions

pub mod customs;
pub mod guideline;
pub mod vendor;

pub use customs::{CustomsInvoice, HsClassifier, HsSection};
pub use guideline::{QtyGuidelines, QtyRule};
pub use vendor::{Vendor, VendorPart, VendorPrice, VendorStatus};
