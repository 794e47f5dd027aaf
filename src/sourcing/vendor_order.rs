//! Per-vendor running orders and their CSV artifacts

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::currency::CurrencyDefinition;
use crate::entities::vendor::Vendor;
use crate::sourcing::error::SourcingError;
use crate::sourcing::info::SourceInfo;

/// One ident committed to a vendor
#[derive(Debug, Clone)]
pub struct VendorOrderLine {
    pub ident: String,
    pub source: SourceInfo,
}

/// Lines committed to a single vendor for one order reference
#[derive(Debug, Clone)]
pub struct VendorOrder {
    vendor: String,
    order_ref: Option<String>,
    lines: Vec<VendorOrderLine>,
}

impl VendorOrder {
    pub fn new(vendor: impl Into<String>, order_ref: Option<String>) -> Self {
        Self {
            vendor: vendor.into(),
            order_ref,
            lines: Vec::new(),
        }
    }

    pub fn add(&mut self, ident: impl Into<String>, source: SourceInfo) {
        let ident = ident.into();
        info!(vendor = %self.vendor, ident = %ident, qty = source.order_qty, "Adding to vendor order");
        self.lines.push(VendorOrderLine { ident, source });
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn order_ref(&self) -> Option<&str> {
        self.order_ref.as_deref()
    }

    pub fn lines(&self) -> &[VendorOrderLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Effective native total of all lines, without base costs
    pub fn lines_total(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.source.effective_extended_native())
            .sum()
    }

    /// File name the order is written to inside the output directory
    pub fn file_name(&self) -> String {
        format!("{}-order.csv", self.vendor)
    }

    /// Write `<vendor>-order.csv` into `dir`
    ///
    /// Empty orders write nothing and return `None`.
    pub fn finalize(
        &self,
        vendor: &Vendor,
        native: &CurrencyDefinition,
        dir: &Path,
    ) -> Result<Option<PathBuf>, SourcingError> {
        if self.is_empty() {
            debug!(vendor = %self.vendor, "Nothing in the order, not generating order file");
            return Ok(None);
        }

        let path = dir.join(self.file_name());
        info!(vendor = %vendor.display_name(), path = %path.display(), "Writing vendor order");

        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)?;

        let timestamp = Local::now().format("%c").to_string();
        wtr.write_record([
            format!("{} Order", vendor.display_name()),
            self.order_ref.clone().unwrap_or_default(),
            String::new(),
            String::new(),
            String::new(),
            timestamp,
        ])?;

        let symbol = &vendor.currency.symbol;
        wtr.write_record([
            "Ident".to_string(),
            "Vendor Part No".to_string(),
            "Quantity".to_string(),
            format!("Unit Price ({})", symbol),
            format!("Extended Price ({})", symbol),
            format!("Effective Price ({})", native.symbol),
        ])?;

        for line in &self.lines {
            let src = &line.source;
            let unit = src.used_break.unit_price().source_value();
            wtr.write_record([
                line.ident.clone(),
                src.vpno.clone(),
                src.order_qty.to_string(),
                format!("{:.4}", unit),
                format!("{:.4}", unit * src.order_qty as f64),
                format!("{:.2}", src.effective_extended_native()),
            ])?;
        }

        for cost in &vendor.base_costs {
            let source_value = if cost.native {
                String::new()
            } else {
                format!("{:.4}", cost.amount)
            };
            wtr.write_record([
                String::new(),
                cost.description.clone(),
                String::new(),
                String::new(),
                source_value,
                format!("{:.2}", vendor.base_cost_native(cost)),
            ])?;
        }

        wtr.flush()?;
        Ok(Some(path))
    }
}
