//! Sourcing providers - where offers for an ident come from
//!
//! [`SourcingProvider`] is the seam between orders and vendor data. The
//! [`Catalog`] implementation serves offers from price-list vendors loaded
//! out of a project, and owns every lookup cache the pipeline needs.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::config::Config;
use crate::core::currency::CurrencyDefinition;
use crate::core::project::Project;
use crate::entities::guideline::QtyGuidelines;
use crate::entities::vendor::Vendor;
use crate::sourcing::error::SourcingError;
use crate::sourcing::info::SourceInfo;

/// Supplies vendor offers and vendor details to orders
pub trait SourcingProvider {
    /// Every allowed vendor's offer for `qty` units of `ident`, in vendor order
    ///
    /// An ident nobody offers yields an empty list.
    fn sourcing_information(&self, ident: &str, qty: u32) -> Result<Vec<SourceInfo>, SourcingError>;

    /// Look up a vendor by key
    fn vendor(&self, name: &str) -> Option<&Vendor>;

    /// Vendors allowed for sourcing, in order
    fn vendors(&self) -> Vec<&Vendor>;

    /// Currency prices are compared in
    fn native_currency(&self) -> &CurrencyDefinition;

    /// Buy quantity for a shortage after applying quantity guidelines
    fn compliant_qty(&self, _ident: &str, qty: u32) -> u32 {
        qty
    }

    /// Whether any allowed vendor lists the ident at all
    fn is_known_ident(&self, ident: &str) -> bool {
        self.vendors().iter().any(|v| v.carries(ident))
    }
}

/// Price-list vendors plus quantity guidelines
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    vendors: Vec<Vendor>,
    /// Indices of vendors offered for sourcing
    allowed: Vec<usize>,
    /// Vendor key to index
    by_name: HashMap<String, usize>,
    guidelines: QtyGuidelines,
    native_currency: CurrencyDefinition,
}

impl Catalog {
    /// Build a catalog; every active vendor is allowed
    pub fn new(vendors: Vec<Vendor>) -> Result<Self, SourcingError> {
        let mut by_name = HashMap::new();
        for (idx, vendor) in vendors.iter().enumerate() {
            if by_name.insert(vendor.name.clone(), idx).is_some() {
                return Err(SourcingError::DuplicateVendor(vendor.name.clone()));
            }
        }
        let allowed = vendors
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .map(|(idx, _)| idx)
            .collect();

        Ok(Self {
            vendors,
            allowed,
            by_name,
            guidelines: QtyGuidelines::default(),
            native_currency: CurrencyDefinition::default(),
        })
    }

    pub fn with_guidelines(mut self, guidelines: QtyGuidelines) -> Self {
        self.guidelines = guidelines;
        self
    }

    pub fn with_native_currency(mut self, currency: CurrencyDefinition) -> Self {
        self.native_currency = currency;
        self
    }

    /// Restrict sourcing to the named vendors, in the given order
    ///
    /// An empty list keeps every active vendor. Unknown and suspended names
    /// are skipped with a warning.
    pub fn with_allowed_vendors(mut self, names: &[String]) -> Self {
        if names.is_empty() {
            return self;
        }
        self.allowed = names
            .iter()
            .filter_map(|name| match self.by_name.get(name) {
                Some(&idx) if self.vendors[idx].is_active() => Some(idx),
                Some(_) => {
                    warn!(vendor = %name, "Allowed vendor is suspended, skipping");
                    None
                }
                None => {
                    warn!(vendor = %name, "Allowed vendor not found in catalog");
                    None
                }
            })
            .collect();
        self
    }

    /// Load every vendor price list and the guidelines of a project
    pub fn load(project: &Project, config: &Config) -> Result<Self, SourcingError> {
        let vendors = Self::load_vendors(&config.vendors_path(project))?;

        let guidelines_path = config.guidelines_path(project);
        let guidelines = if guidelines_path.is_file() {
            QtyGuidelines::load(&guidelines_path)?
        } else {
            debug!(path = %guidelines_path.display(), "No quantity guidelines found");
            QtyGuidelines::default()
        };

        Ok(Self::new(vendors)?
            .with_guidelines(guidelines)
            .with_native_currency(config.native_currency.clone())
            .with_allowed_vendors(&config.allowed_vendors))
    }

    /// Read `*.yaml` / `*.yml` vendor files from a directory, sorted by file name
    pub fn load_vendors(dir: &Path) -> Result<Vec<Vendor>, SourcingError> {
        if !dir.is_dir() {
            return Err(SourcingError::MissingVendorDir(dir.to_path_buf()));
        }

        let mut vendors = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !entry.file_type().is_file() || !is_yaml {
                continue;
            }
            let vendor = Vendor::load(path)?;
            debug!(vendor = %vendor.name, parts = vendor.parts.len(), "Loaded vendor price list");
            vendors.push(vendor);
        }
        info!(count = vendors.len(), dir = %dir.display(), "Loaded vendors");
        Ok(vendors)
    }

    /// Every vendor, allowed or not
    pub fn all_vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    pub fn guidelines(&self) -> &QtyGuidelines {
        &self.guidelines
    }
}

impl SourcingProvider for Catalog {
    fn sourcing_information(&self, ident: &str, qty: u32) -> Result<Vec<SourceInfo>, SourcingError> {
        let ident = ident.trim();
        Ok(self
            .allowed
            .iter()
            .filter_map(|&idx| self.vendors[idx].optimal_pricing(ident, qty))
            .collect())
    }

    fn vendor(&self, name: &str) -> Option<&Vendor> {
        self.by_name.get(name).map(|&idx| &self.vendors[idx])
    }

    fn vendors(&self) -> Vec<&Vendor> {
        self.allowed.iter().map(|&idx| &self.vendors[idx]).collect()
    }

    fn native_currency(&self) -> &CurrencyDefinition {
        &self.native_currency
    }

    fn compliant_qty(&self, ident: &str, qty: u32) -> u32 {
        match self.guidelines.compliant_qty(ident, qty, false) {
            Ok(oqty) => oqty,
            Err(e) => {
                warn!(ident, qty, error = %e, "Guideline not applied, buying the shortage as is");
                qty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::guideline::QtyRule;
    use crate::entities::vendor::{VendorPart, VendorStatus};
    use std::fs;
    use tempfile::tempdir;

    fn vendor(name: &str, price: f64) -> Vendor {
        Vendor::new(name, CurrencyDefinition::default())
            .with_part(VendorPart::new("RES SMD 10K 0603", format!("{}-10K", name)).with_price(1, price))
    }

    #[test]
    fn test_sourcing_information_in_vendor_order() {
        let catalog = Catalog::new(vec![vendor("beta", 0.2), vendor("alpha", 0.1)]).unwrap();
        let sources = catalog
            .sourcing_information(" RES SMD 10K 0603 ", 10)
            .unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.vendor.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
    }

    #[test]
    fn test_unknown_ident_gives_empty_list() {
        let catalog = Catalog::new(vec![vendor("alpha", 0.1)]).unwrap();
        assert!(catalog.sourcing_information("IC NE555 DIP8", 1).unwrap().is_empty());
        assert!(!catalog.is_known_ident("IC NE555 DIP8"));
        assert!(catalog.is_known_ident("RES SMD 10K 0603"));
    }

    #[test]
    fn test_duplicate_vendor_rejected() {
        let result = Catalog::new(vec![vendor("alpha", 0.1), vendor("alpha", 0.2)]);
        assert!(matches!(result, Err(SourcingError::DuplicateVendor(name)) if name == "alpha"));
    }

    #[test]
    fn test_suspended_vendor_not_offered_but_resolvable() {
        let mut suspended = vendor("beta", 0.05);
        suspended.status = VendorStatus::Suspended;
        let catalog = Catalog::new(vec![vendor("alpha", 0.1), suspended]).unwrap();

        let sources = catalog.sourcing_information("RES SMD 10K 0603", 10).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(catalog.vendors().len(), 1);
        assert!(catalog.vendor("beta").is_some());
    }

    #[test]
    fn test_allowed_vendors_filter_and_order() {
        let catalog = Catalog::new(vec![vendor("alpha", 0.1), vendor("beta", 0.2), vendor("gamma", 0.3)])
            .unwrap()
            .with_allowed_vendors(&["gamma".to_string(), "nope".to_string(), "alpha".to_string()]);
        let names: Vec<_> = catalog.vendors().iter().map(|v| v.name.clone()).collect();
        assert_eq!(names, vec!["gamma", "alpha"]);
    }

    #[test]
    fn test_compliant_qty_uses_guidelines() {
        let mut guidelines = QtyGuidelines::default();
        guidelines.default = Some(QtyRule {
            oqty_min: 25,
            ..QtyRule::default()
        });
        let catalog = Catalog::new(vec![]).unwrap().with_guidelines(guidelines);
        assert_eq!(catalog.compliant_qty("RES SMD 10K 0603", 3), 25);
    }

    #[test]
    fn test_compliant_qty_falls_back_on_overflow() {
        let mut guidelines = QtyGuidelines::default();
        guidelines.default = Some(QtyRule {
            oqty_min: 4_000_000_000,
            excess_min_pc: 10.0,
            ..QtyRule::default()
        });
        let catalog = Catalog::new(vec![]).unwrap().with_guidelines(guidelines);
        assert_eq!(catalog.compliant_qty("RES SMD 10K 0603", 4_100_000_000), 4_100_000_000);
    }

    #[test]
    fn test_load_vendors_from_directory() {
        let tmp = tempdir().unwrap();
        fs::write(
            tmp.path().join("b-vendor.yaml"),
            "name: bvend\nparts:\n  - ident: X\n    vpno: X-1\n    prices:\n      - moq: 1\n        unit_price: 1.0\n",
        )
        .unwrap();
        fs::write(tmp.path().join("a-vendor.yml"), "name: avend\n").unwrap();
        fs::write(tmp.path().join("README.txt"), "not a vendor").unwrap();

        let vendors = Catalog::load_vendors(tmp.path()).unwrap();
        let names: Vec<_> = vendors.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["avend", "bvend"]);
    }

    #[test]
    fn test_load_vendors_missing_dir() {
        let result = Catalog::load_vendors(Path::new("/nonexistent/tsrc/vendors"));
        assert!(matches!(result, Err(SourcingError::MissingVendorDir(_))));
    }
}
