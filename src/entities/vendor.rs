//! Vendor entity type - Price-list vendors and the parts they carry

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::currency::{CurrencyDefinition, CurrencyValue};
use crate::sourcing::info::SourceInfo;
use crate::yaml::{parse_yaml_file, YamlError};

/// Total cost may grow by less than this factor when bumping to the next break
const NEXT_BREAK_TOTAL_COST_FACTOR: f64 = 1.4;

/// Unit price must drop below this fraction to bump to the next break regardless of total cost
const NEXT_BREAK_UNIT_PRICE_FACTOR: f64 = 0.5;

/// Vendor status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum VendorStatus {
    /// Vendor is used for sourcing
    #[default]
    Active,
    /// Vendor is kept for reference but never offered
    Suspended,
}

impl std::fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VendorStatus::Active => write!(f, "active"),
            VendorStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for VendorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(VendorStatus::Active),
            "suspended" => Ok(VendorStatus::Suspended),
            _ => Err(format!(
                "Invalid vendor status: {}. Use active or suspended",
                s
            )),
        }
    }
}

/// Errors from price computations
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("Quantity {qty} is below the minimum order quantity {moq}")]
    BelowMoq { qty: u32, moq: u32 },
}

/// Price break for quantity-based pricing, as written in the price list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBreak {
    /// Minimum quantity for this price
    pub moq: u32,

    /// Unit price at this quantity, in the vendor's currency
    pub unit_price: f64,
}

/// A price break bound to a currency
#[derive(Debug, Clone, PartialEq)]
pub struct VendorPrice {
    moq: u32,
    unit_price: CurrencyValue,
}

impl VendorPrice {
    pub fn new(moq: u32, unit_price: f64, currency: CurrencyDefinition) -> Self {
        Self {
            moq,
            unit_price: CurrencyValue::new(unit_price, currency),
        }
    }

    pub fn moq(&self) -> u32 {
        self.moq
    }

    pub fn unit_price(&self) -> &CurrencyValue {
        &self.unit_price
    }

    /// Price of `qty` units at this break
    pub fn extended_price(&self, qty: u32) -> Result<CurrencyValue, PricingError> {
        if qty < self.moq {
            return Err(PricingError::BelowMoq { qty, moq: self.moq });
        }
        Ok(self.unit_price.scaled(qty as f64))
    }
}

impl std::fmt::Display for VendorPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @{}", self.unit_price, self.moq)
    }
}

/// A part as listed by a vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorPart {
    /// Canonical ident this part satisfies
    pub ident: String,

    /// Vendor part number
    pub vpno: String,

    /// Manufacturer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Manufacturer part number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpn: Option<String>,

    /// Vendor description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Quantity the vendor has in stock, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,

    /// Whether the stock figure has been confirmed by the vendor
    #[serde(default = "default_true")]
    pub stock_confirmed: bool,

    /// Price breaks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<PriceBreak>,
}

fn default_true() -> bool {
    true
}

impl VendorPart {
    pub fn new(ident: impl Into<String>, vpno: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            vpno: vpno.into(),
            manufacturer: None,
            mpn: None,
            description: None,
            stock: None,
            stock_confirmed: true,
            prices: Vec::new(),
        }
    }

    /// Add a price break
    pub fn with_price(mut self, moq: u32, unit_price: f64) -> Self {
        self.prices.push(PriceBreak { moq, unit_price });
        self
    }

    /// Smallest quantity the vendor will sell at all
    pub fn abs_moq(&self) -> Option<u32> {
        self.prices.iter().map(|p| p.moq).min()
    }

    /// Whether stock allows ordering `qty`
    ///
    /// Unknown and unconfirmed stock are both accepted.
    pub fn is_available_for(&self, qty: u32) -> bool {
        if !self.stock_confirmed {
            return true;
        }
        self.stock.is_none_or(|stock| stock >= qty)
    }

    /// The break used for `qty` and the next higher break, if any
    pub fn breaks_for(&self, qty: u32) -> (Option<&PriceBreak>, Option<&PriceBreak>) {
        let used = self
            .prices
            .iter()
            .filter(|p| p.moq <= qty)
            .max_by_key(|p| p.moq);
        let next = self
            .prices
            .iter()
            .filter(|p| p.moq > qty)
            .min_by_key(|p| p.moq);
        (used, next)
    }
}

/// A fixed cost charged once per order (shipping, handling minimums)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseCost {
    pub description: String,

    pub amount: f64,

    /// The amount is already in the native currency
    #[serde(default)]
    pub native: bool,
}

/// A percentage surcharge applied to every unit price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalCost {
    pub description: String,

    pub percent: f64,
}

/// A price-list vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    /// Short name used as the vendor key (e.g., "acme")
    pub name: String,

    /// Name for display and order files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub status: VendorStatus,

    /// Currency of the price list
    #[serde(default)]
    pub currency: CurrencyDefinition,

    /// Fixed per-order costs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_costs: Vec<BaseCost>,

    /// Percentage surcharges (duties, bank charges)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_costs: Vec<AdditionalCost>,

    /// Parts carried
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<VendorPart>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Vendor {
    /// Create an empty vendor with a price list in `currency`
    pub fn new(name: impl Into<String>, currency: CurrencyDefinition) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            status: VendorStatus::default(),
            currency,
            base_costs: Vec::new(),
            additional_costs: Vec::new(),
            parts: Vec::new(),
            notes: None,
        }
    }

    /// Load a vendor price list from a YAML file
    pub fn load(path: &Path) -> Result<Self, YamlError> {
        parse_yaml_file(path)
    }

    pub fn with_base_cost(mut self, description: impl Into<String>, amount: f64) -> Self {
        self.base_costs.push(BaseCost {
            description: description.into(),
            amount,
            native: false,
        });
        self
    }

    pub fn with_additional_cost(mut self, description: impl Into<String>, percent: f64) -> Self {
        self.additional_costs.push(AdditionalCost {
            description: description.into(),
            percent,
        });
        self
    }

    pub fn with_part(mut self, part: VendorPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_active(&self) -> bool {
        self.status == VendorStatus::Active
    }

    /// Parts mapped to an ident, in price-list order
    pub fn parts_for<'a>(&'a self, ident: &'a str) -> impl Iterator<Item = &'a VendorPart> + 'a {
        self.parts.iter().filter(move |p| p.ident == ident)
    }

    pub fn carries(&self, ident: &str) -> bool {
        self.parts_for(ident).next().is_some()
    }

    /// Look up a part by vendor part number
    pub fn part(&self, vpno: &str) -> Option<&VendorPart> {
        self.parts.iter().find(|p| p.vpno == vpno)
    }

    /// Bind a price break to this vendor's currency
    pub fn price(&self, brk: &PriceBreak) -> VendorPrice {
        VendorPrice::new(brk.moq, brk.unit_price, self.currency.clone())
    }

    /// Price including the vendor's additional cost percentages
    pub fn effective_price(&self, price: &VendorPrice) -> VendorPrice {
        let base = price.unit_price().source_value();
        let surcharge: f64 = self
            .additional_costs
            .iter()
            .map(|c| base * c.percent / 100.0)
            .sum();
        VendorPrice::new(price.moq(), base + surcharge, self.currency.clone())
    }

    /// Native value of one base cost component
    pub fn base_cost_native(&self, cost: &BaseCost) -> f64 {
        if cost.native {
            cost.amount
        } else {
            cost.amount * self.currency.exchange_rate
        }
    }

    /// Fixed cost of placing an order with this vendor, in the native currency
    pub fn order_base_cost(&self) -> f64 {
        self.base_costs.iter().map(|c| self.base_cost_native(c)).sum()
    }

    /// Best offer this vendor can make for `rqty` units of `ident`
    ///
    /// Picks the cheapest eligible part at `rqty`, then bumps the order
    /// quantity to the next price break when that is cheap enough.
    pub fn optimal_pricing(&self, ident: &str, rqty: u32) -> Option<SourceInfo> {
        let mut selected: Option<(&VendorPart, f64)> = None;
        for candidate in self.parts_for(ident) {
            if candidate.abs_moq().is_none_or(|moq| moq > rqty) {
                continue;
            }
            if !candidate.is_available_for(rqty) {
                continue;
            }
            let (Some(used), _) = candidate.breaks_for(rqty) else {
                continue;
            };
            let cost = self
                .effective_price(&self.price(used))
                .unit_price()
                .native_value()
                * rqty as f64;
            if selected.is_none_or(|(_, best)| cost < best) {
                selected = Some((candidate, cost));
            }
        }
        let (part, total_cost) = selected?;

        if !part.stock_confirmed {
            warn!(
                vendor = %self.name,
                vpno = %part.vpno,
                "Vendor available quantity could not be confirmed, verify manually"
            );
        }

        let (used, next) = part.breaks_for(rqty);
        let mut order_qty = rqty;
        let mut used_break = self.price(used?);
        let mut next_break = next.map(|b| self.price(b));
        let mut effective = self.effective_price(&used_break);
        let mut rationale = None;
        let mut lower_break = None;

        if let Some(candidate_next) = next_break.clone() {
            let (bumped_used, bumped_next) = part.breaks_for(candidate_next.moq());
            if let Some(bumped_used) = bumped_used {
                let bumped_price = self.price(bumped_used);
                let bumped_effective = self.effective_price(&bumped_price);
                let bumped_cost =
                    bumped_effective.unit_price().native_value() * candidate_next.moq() as f64;

                let reason = if bumped_cost < total_cost * NEXT_BREAK_TOTAL_COST_FACTOR {
                    Some("TC Increase < 40%")
                } else if bumped_price.unit_price().native_value()
                    < used_break.unit_price().native_value() * NEXT_BREAK_UNIT_PRICE_FACTOR
                {
                    Some("UP Decrease > 50%")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    rationale = Some(reason.to_string());
                    order_qty = candidate_next.moq();
                    lower_break = Some(used_break);
                    used_break = bumped_price;
                    next_break = bumped_next.map(|b| self.price(b));
                    effective = bumped_effective;
                }
            }
        }

        Some(SourceInfo {
            vendor: self.name.clone(),
            vpno: part.vpno.clone(),
            order_qty,
            next_break,
            used_break,
            effective_price: effective,
            excess_rationale: rationale,
            lower_break,
        })
    }
}
