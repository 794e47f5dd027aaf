//! Sourcing information - one vendor's offer for an ident

use crate::entities::vendor::VendorPrice;

/// A vendor's offer for a required quantity of an ident
///
/// Snapshot taken when the provider is queried; never updated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    /// Vendor key
    pub vendor: String,

    /// Vendor part number
    pub vpno: String,

    /// Quantity to order, possibly bumped past the requirement
    pub order_qty: u32,

    /// The break above the one used, if any
    pub next_break: Option<VendorPrice>,

    /// The break the order quantity falls in
    pub used_break: VendorPrice,

    /// Used break including the vendor's additional costs
    pub effective_price: VendorPrice,

    /// Why the order quantity was bumped
    pub excess_rationale: Option<String>,

    /// The break that applied before the bump
    pub lower_break: Option<VendorPrice>,
}

impl SourceInfo {
    /// Effective unit price in the native currency
    pub fn effective_unit_native(&self) -> f64 {
        self.effective_price.unit_price().native_value()
    }

    /// Effective price of the full order quantity in the native currency
    pub fn effective_extended_native(&self) -> f64 {
        self.effective_unit_native() * self.order_qty as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyDefinition;

    #[test]
    fn test_effective_extended_native() {
        let eur = CurrencyDefinition::new("EUR", "€").with_exchange_rate(1.5);
        let info = SourceInfo {
            vendor: "mouse".to_string(),
            vpno: "MX-1".to_string(),
            order_qty: 10,
            next_break: None,
            used_break: VendorPrice::new(1, 2.0, eur.clone()),
            effective_price: VendorPrice::new(1, 2.2, eur),
            excess_rationale: None,
            lower_break: None,
        };
        assert!((info.effective_unit_native() - 3.3).abs() < 1e-9);
        assert!((info.effective_extended_native() - 33.0).abs() < 1e-9);
    }
}
