//! Composite orders - every line of a build's purchase, across vendors

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::sourcing::error::SourcingError;
use crate::sourcing::line::OrderLine;
use crate::sourcing::provider::SourcingProvider;
use crate::sourcing::vendor_order::VendorOrder;

/// A purchase spanning many vendors
///
/// Lines are resolved against the provider as they are added. See
/// [`CompositeOrder::rebalance`] for vendor consolidation and
/// [`CompositeOrder::dump_to_file`] for the sourcing report.
pub struct CompositeOrder<'p, P: SourcingProvider + ?Sized> {
    provider: &'p P,
    order_ref: Option<String>,
    lines: Vec<OrderLine>,
}

impl<'p, P: SourcingProvider + ?Sized> CompositeOrder<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            order_ref: None,
            lines: Vec::new(),
        }
    }

    pub fn with_order_ref(mut self, order_ref: impl Into<String>) -> Self {
        self.order_ref = Some(order_ref.into());
        self
    }

    /// Add a line for `ident`, returning whether any vendor can source it
    ///
    /// The order reference is always replaced by `order_ref`, last write wins.
    pub fn add(&mut self, ident: &str, required_qty: u32, shortage: u32, order_ref: Option<&str>) -> bool {
        let new_ref = order_ref.map(str::to_string);
        if let Some(current) = &self.order_ref {
            if new_ref.as_ref() != Some(current) {
                warn!(
                    from = %current,
                    to = new_ref.as_deref().unwrap_or("<none>"),
                    "Overwriting order reference"
                );
            }
        }
        self.order_ref = new_ref;

        let line = OrderLine::new(self.provider, ident, required_qty, shortage);
        let sourceable = line.is_sourceable();
        if !sourceable {
            warn!(ident, "No vendor can source ident");
        }
        self.lines.push(line);
        sourceable
    }

    pub fn provider(&self) -> &'p P {
        self.provider
    }

    pub fn order_ref(&self) -> Option<&str> {
        self.order_ref.as_deref()
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub(crate) fn lines_mut(&mut self) -> &mut [OrderLine] {
        &mut self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines no vendor offered
    pub fn unsourceable(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|l| !l.is_sourceable())
    }

    /// Distinct vendors of the selected sources, in first-use order
    pub fn vendors_in_use(&self) -> Vec<&str> {
        let mut vendors: Vec<&str> = Vec::new();
        for vendor in self.lines.iter().filter_map(OrderLine::selected_vendor) {
            if !vendors.contains(&vendor) {
                vendors.push(vendor);
            }
        }
        vendors
    }

    /// Native cost of the selected sources plus each used vendor's base cost
    pub fn total_cost(&self) -> Result<f64, SourcingError> {
        let lines: f64 = self
            .lines
            .iter()
            .filter_map(OrderLine::selected_source)
            .map(|s| s.effective_extended_native())
            .sum();
        let mut base = 0.0;
        for name in self.vendors_in_use() {
            base += self.vendor_base_cost(name)?;
        }
        Ok(lines + base)
    }

    pub(crate) fn vendor_base_cost(&self, name: &str) -> Result<f64, SourcingError> {
        self.provider
            .vendor(name)
            .map(|v| v.order_base_cost())
            .ok_or_else(|| SourcingError::UnknownVendor {
                vendor: name.to_string(),
                ident: self
                    .lines
                    .iter()
                    .find(|l| l.selected_vendor() == Some(name))
                    .map(|l| l.ident().to_string())
                    .unwrap_or_default(),
            })
    }

    /// Commit every sourceable line to its vendor and write the vendor orders
    ///
    /// Orders are written in provider vendor order; vendors with nothing to
    /// order write no file.
    pub fn generate_orders(&self, dir: &Path) -> Result<Vec<PathBuf>, SourcingError> {
        let mut orders: HashMap<&str, VendorOrder> = HashMap::new();
        for line in self.lines.iter().filter(|l| l.is_sourceable()) {
            let Some(source) = line.selected_source() else {
                continue;
            };
            orders
                .entry(source.vendor.as_str())
                .or_insert_with(|| VendorOrder::new(source.vendor.clone(), self.order_ref.clone()))
                .add(line.ident(), source.clone());
        }

        let vendors = self.provider.vendors();
        if let Some((name, order)) = orders
            .iter()
            .find(|(name, _)| !vendors.iter().any(|v| v.name == **name))
        {
            return Err(SourcingError::UnknownVendor {
                vendor: name.to_string(),
                ident: order
                    .lines()
                    .first()
                    .map(|l| l.ident.clone())
                    .unwrap_or_default(),
            });
        }

        std::fs::create_dir_all(dir)?;
        let native = self.provider.native_currency();
        let mut written = Vec::new();
        for vendor in vendors {
            let Some(order) = orders.remove(vendor.name.as_str()) else {
                continue;
            };
            if let Some(path) = order.finalize(vendor, native, dir)? {
                written.push(path);
            }
        }
        info!(count = written.len(), dir = %dir.display(), "Generated vendor orders");
        Ok(written)
    }
}
